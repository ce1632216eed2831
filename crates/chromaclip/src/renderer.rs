//! The movie-clip renderer: one chroma-keyed clip on a pose-tracked quad.

use std::sync::Arc;

use glam::Mat4;
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};

use crate::assets::AssetProvider;
use crate::error::ClipError;
use crate::gpu::compositor::ChromaCompositor;
use crate::media::decoder::ClipDecoder;
use crate::media::runtime::MediaRuntime;
use crate::media::sync::FrameMailbox;
use crate::media::types::PlaybackState;
use crate::media::{LifecycleSink, PlaybackController};
use crate::transform::{Pose, QuadTransform};

/// Composites a chroma-keyed clip onto a pose-tracked quad inside the host's
/// render loop.
///
/// The render loop calls [`ClipRenderer::update`] when the tracked pose
/// changes and [`ClipRenderer::draw`] every frame; [`ClipRenderer::play`] may
/// be called from any thread and drives the playback lifecycle independently.
pub struct ClipRenderer {
    transform: QuadTransform,
    controller: PlaybackController,
    frames: Arc<FrameMailbox>,
    compositor: Option<ChromaCompositor>,
}

impl ClipRenderer {
    pub fn new() -> Self {
        let frames = Arc::new(FrameMailbox::new());
        Self {
            transform: QuadTransform::new(),
            controller: PlaybackController::new(frames.clone()),
            frames,
            compositor: None,
        }
    }

    /// Recompute the quad's model matrix from the tracked pose.
    pub fn update(&mut self, base: Mat4, scale_factor: f32, pose: &Pose) {
        self.transform.update(base, scale_factor, pose);
    }

    /// Allocate GPU resources and issue the asynchronous decoder-creation
    /// request. Must run on the thread owning the GPU context.
    ///
    /// Shader or pipeline validation failure aborts setup; it is a
    /// configuration defect, not a runtime condition.
    pub fn create_on_context<F>(
        &mut self,
        device: &Device,
        queue: &Queue,
        target_format: TextureFormat,
        runtime: &MediaRuntime,
        decoder_factory: F,
    ) -> anyhow::Result<()>
    where
        F: FnOnce(LifecycleSink) -> Box<dyn ClipDecoder> + Send + 'static,
    {
        self.compositor = Some(ChromaCompositor::new(device, queue, target_format)?);
        self.controller.request_decoder(runtime, decoder_factory);
        Ok(())
    }

    /// Bind the named clip and issue a prepare request.
    pub fn play(&self, source: &str, assets: &dyn AssetProvider) -> Result<(), ClipError> {
        self.controller.play(source, assets)
    }

    /// True once a `play` call has issued a prepare request.
    pub fn is_started(&self) -> bool {
        self.controller.is_started()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.transform.model()
    }

    /// Draw the clip quad over `target`.
    ///
    /// A no-op until playback is live (prepared and playing) and GPU
    /// resources exist — the render loop never blocks on decoder state.
    /// Pulls the latest decoded frame into the texture if one is pending.
    pub fn draw(
        &mut self,
        pose: &Pose,
        camera_view: Mat4,
        camera_projection: Mat4,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        target: &TextureView,
    ) {
        if !self.controller.is_drawable() {
            return;
        }
        let Some(compositor) = self.compositor.as_mut() else {
            return;
        };

        if let Some(frame) = self.frames.take() {
            compositor.upload_frame(device, queue, &frame);
        }

        log::trace!("drawing clip quad at {:?}", pose.position);
        let mvp = self
            .transform
            .model_view_projection(camera_view, camera_projection);
        compositor.draw(device, queue, encoder, target, mvp);
    }
}

impl Default for ClipRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    #[test]
    fn fresh_renderer_is_idle() {
        let renderer = ClipRenderer::new();
        assert!(!renderer.is_started());
        assert_eq!(renderer.playback_state(), PlaybackState::Uninitialized);
    }

    #[test]
    fn update_feeds_the_owned_model_matrix() {
        let mut renderer = ClipRenderer::new();
        renderer.update(
            Mat4::IDENTITY,
            2.0,
            &Pose::from_translation(Vec3::new(1.0, 2.0, 3.0)),
        );
        let model = renderer.model_matrix();
        assert_eq!(model.w_axis, Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(model.x_axis.x, 2.0);
    }
}
