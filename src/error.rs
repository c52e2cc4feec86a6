//! Crate-level error type

use thiserror::Error;

use crate::gpu::GpuError;
use crate::kernel::KernelError;

/// Errors that stop the demo
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("invalid blur configuration: {0}")]
    Kernel(#[from] KernelError),
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}
