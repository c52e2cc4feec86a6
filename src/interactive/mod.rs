//! Interactive blur demo: window, event loop and keyboard controls

pub mod demo;
pub mod input;

pub use demo::{DemoConfig, run_blur_demo};
