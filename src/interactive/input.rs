//! Keyboard handling for the blur demo

use winit::keyboard::KeyCode;

/// What the demo does in response to a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoAction {
    ToggleBlur,
    ToggleHelp,
    ToggleFullscreen,
    /// Switch the source image to the next configured size
    CycleImageSize,
    Exit,
}

/// Map a fresh key press to an action.
///
/// Auto-repeated presses are ignored so every toggle flips once per press.
pub fn action_for_key(key: KeyCode, alt_held: bool, repeat: bool) -> Option<DemoAction> {
    if repeat {
        return None;
    }

    match key {
        KeyCode::Escape => Some(DemoAction::Exit),
        KeyCode::Space => Some(DemoAction::ToggleBlur),
        KeyCode::KeyH => Some(DemoAction::ToggleHelp),
        KeyCode::KeyI => Some(DemoAction::CycleImageSize),
        KeyCode::Enter | KeyCode::NumpadEnter if alt_held => Some(DemoAction::ToggleFullscreen),
        _ => None,
    }
}

/// On/off switches driven by the keyboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoToggles {
    pub blur_enabled: bool,
    pub display_help: bool,
    pub fullscreen: bool,
}

impl DemoToggles {
    /// Apply a toggle action. Returns `false` for actions that are not
    /// toggles.
    pub fn apply(&mut self, action: DemoAction) -> bool {
        match action {
            DemoAction::ToggleBlur => self.blur_enabled = !self.blur_enabled,
            DemoAction::ToggleHelp => self.display_help = !self.display_help,
            DemoAction::ToggleFullscreen => self.fullscreen = !self.fullscreen,
            DemoAction::CycleImageSize | DemoAction::Exit => return false,
        }
        true
    }
}
