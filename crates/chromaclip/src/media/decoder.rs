//! The decoder capability consumed by playback.
//!
//! Any decoder that can take a seekable byte range, prepare asynchronously,
//! and deliver frames plus lifecycle events satisfies the contract; the
//! playback machinery does not care which codec is behind it.

use std::sync::Arc;

use super::sync::FrameMailbox;
use super::types::DecodedFrame;
use crate::assets::ClipSource;
use crate::error::ClipError;

/// A video decoder instance living on the media runtime.
///
/// Calls arrive from the playback controller; events flow back through the
/// [`crate::media::LifecycleSink`] handed to the decoder's factory, and
/// decoded frames through the [`FrameSink`] bound via `set_sink`. Event
/// delivery is serialized — the decoder never invokes the sink concurrently
/// with itself — and must not happen from inside `prepare_async` itself.
pub trait ClipDecoder: Send {
    /// Return to idle, discarding any bound source and in-flight preparation.
    fn reset(&mut self);

    /// Bind the sink that receives decoded frames.
    fn set_sink(&mut self, sink: FrameSink);

    /// Bind the media source. Synchronous rejection (unreadable container,
    /// unsupported stream layout) surfaces here; decode errors found during
    /// preparation arrive asynchronously instead.
    fn set_source(&mut self, source: ClipSource) -> Result<(), ClipError>;

    /// Issue a non-blocking prepare request. Completion arrives as
    /// `LifecycleEvent::Prepared`.
    fn prepare_async(&mut self);

    /// Begin frame delivery. Only meaningful after `Prepared`.
    fn start(&mut self);
}

/// Decoder-facing half of the frame mailbox.
#[derive(Clone)]
pub struct FrameSink {
    mailbox: Arc<FrameMailbox>,
}

impl FrameSink {
    pub(crate) fn new(mailbox: Arc<FrameMailbox>) -> Self {
        Self { mailbox }
    }

    /// Publish a decoded frame for the render loop to pick up. Overwrites any
    /// frame not yet consumed.
    pub fn deliver(&self, frame: DecodedFrame) {
        self.mailbox.publish(frame);
    }
}
