//! Chroma-keyed video clip compositing onto a pose-tracked quad.
//!
//! Two independently-clocked producers meet here: a decoder delivering frames
//! on its own schedule, and a render loop that must draw at refresh rate
//! without blocking. The pieces:
//!
//! - [`transform`]: pose + scale → model matrix → MVP.
//! - [`media`]: the playback lifecycle (decoder creation, prepare, play,
//!   completion/error), the frame mailbox between decoder and render loop,
//!   and the owned media runtime thread.
//! - [`gpu`]: the quad geometry, frame texture, and chroma-key draw pass.
//! - [`renderer`]: the [`ClipRenderer`] facade tying them together.
//!
//! The host supplies a [`ClipDecoder`] implementation, an [`AssetProvider`]
//! for clip lookup, and its wgpu device/queue; the crate supplies everything
//! between "play this clip" and keyed pixels over the host's scene.

pub mod assets;
pub mod error;
pub mod gpu;
pub mod media;
pub mod renderer;
pub mod transform;

pub use assets::{AssetProvider, ClipSource, DirAssets};
pub use error::ClipError;
pub use media::decoder::{ClipDecoder, FrameSink};
pub use media::runtime::MediaRuntime;
pub use media::types::{DecodedFrame, LifecycleEvent, PlaybackState};
pub use media::{LifecycleSink, PlaybackController};
pub use renderer::ClipRenderer;
pub use transform::{Pose, QuadTransform};
