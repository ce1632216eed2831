use thiserror::Error;

/// Errors surfaced synchronously by clip playback.
///
/// Asynchronous decoder failures are not represented here; they arrive as
/// [`crate::media::types::LifecycleEvent::Error`] and park the session in
/// [`crate::media::types::PlaybackState::Failed`].
#[derive(Debug, Error)]
pub enum ClipError {
    /// The named clip source could not be located or opened.
    #[error("failed to open clip source: {0}")]
    Io(#[from] std::io::Error),

    /// The wait for the decoder instance was interrupted (poisoned guard).
    #[error("interrupted while waiting for the decoder instance")]
    Interrupted,

    /// The decoder rejected the bound source synchronously.
    #[error("decoder rejected source: {0}")]
    Decoder(String),
}
