//! GPU rendering module using wgpu
//!
//! Provides the device/surface context, the two-pass Gaussian blur, the
//! pipeline that composites a texture onto the back buffer, and the text
//! overlay.

pub mod blur;
pub mod context;
pub mod pipelines;
pub mod text;

use thiserror::Error;

pub use blur::{BlurPass, SourceTexture};
pub use context::GpuContext;
pub use pipelines::DisplayPipeline;
pub use text::TextOverlay;

/// Failures while setting up or driving the GPU
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to find a suitable GPU adapter")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("failed to prepare text: {0}")]
    TextPrepare(#[from] glyphon::PrepareError),
    #[error("failed to render text: {0}")]
    TextRender(#[from] glyphon::RenderError),
}
