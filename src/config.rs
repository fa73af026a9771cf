//! Presentation constants for the overlay.

use std::time::Duration;

/// Name of the text file searched for at startup.
pub const TEXT_FILE_NAME: &str = "demo_texts.txt";

/// Shown when no text file is found or it has no lines.
pub const PLACEHOLDER_TEXT: &str = "No texts loaded - create demo_texts.txt";

/// Window geometry, typography and animation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    /// Window size in logical points.
    pub window_size: [f32; 2],
    /// Distance from the top edge of the monitor.
    pub top_margin: f32,
    /// Horizontal padding inside the window before wrapping.
    pub padding: f32,
    pub font_size: f32,
    /// Rows shown before the rest of the line is elided.
    pub max_rows: usize,
    /// Offset of the outline copies drawn around the text.
    pub outline_width: f32,
    /// Drop shadow offset, down and to the right.
    pub shadow_offset: [f32; 2],
    /// Opacity of outline and shadow at full fade.
    pub shadow_alpha: f32,
    pub fade_duration: Duration,
    /// Opacity the text starts from when it changes.
    pub fade_from: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            window_size: [800.0, 100.0],
            top_margin: 50.0,
            padding: 16.0,
            font_size: 42.0,
            max_rows: 3,
            outline_width: 1.5,
            shadow_offset: [2.0, 2.0],
            shadow_alpha: 0.8,
            fade_duration: Duration::from_millis(150),
            fade_from: 0.3,
        }
    }
}
