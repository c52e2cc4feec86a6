//! Frame rate counting and the text shown in the top-left corner

use std::time::Duration;

use crate::kernel::Kernel;

/// Counts rendered frames and publishes a frames-per-second value once
/// every full second of elapsed time.
#[derive(Debug, Default)]
pub struct FrameCounter {
    elapsed: Duration,
    frames: u32,
    frames_per_second: u32,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by one update's worth of time
    pub fn update(&mut self, delta: Duration) {
        self.elapsed += delta;

        if self.elapsed > Duration::from_secs(1) {
            self.elapsed -= Duration::from_secs(1);
            self.frames_per_second = self.frames;
            self.frames = 0;
        }
    }

    /// Call once per presented frame
    pub fn frame_rendered(&mut self) {
        self.frames += 1;
    }

    pub fn frames_per_second(&self) -> u32 {
        self.frames_per_second
    }
}

/// Overlay text: key help, or frame rate and kernel parameters
pub fn overlay_text(display_help: bool, frames_per_second: u32, kernel: &Kernel) -> String {
    let mut text = String::new();

    if display_help {
        text.push_str("Press SPACE to enable/disable Gaussian blur\n");
        text.push_str("Press ALT and ENTER to toggle full screen\n");
        text.push_str("Press I to change the image size\n");
        text.push_str("Press ESCAPE to exit\n");
        text.push('\n');
        text.push_str("Press H to hide help\n");
    } else {
        text.push_str(&format!("FPS: {}\n", frames_per_second));
        text.push('\n');
        text.push_str(&format!("Radius: {}\n", kernel.radius()));
        text.push_str(&format!("Sigma: {:.2}\n", kernel.sigma()));
        text.push('\n');
        text.push_str("Press H to display help\n");
    }

    text
}
