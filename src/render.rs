//! Outlined text and the fade-in played when it changes.

use crate::config::OverlayConfig;
use eframe::egui;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Horizontal offset of the second fill pass that thickens the strokes.
const FAUX_BOLD_OFFSET: f32 = 0.6;

fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Opacity `elapsed` into a fade from `from` to fully opaque.
pub fn fade_opacity(elapsed: Duration, duration: Duration, from: f32) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    let t = (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0);
    if t >= 1.0 {
        return 1.0;
    }
    from + (1.0 - from) * ease_in_out(t)
}

/// Fade-in state of the displayed text.
#[derive(Debug, Clone)]
pub struct Fade {
    started: Option<Instant>,
    duration: Duration,
    from: f32,
}

impl Fade {
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            started: None,
            duration: config.fade_duration,
            from: config.fade_from,
        }
    }

    /// Dim the text and start fading it back in.
    pub fn restart(&mut self, now: Instant) {
        self.started = Some(now);
    }

    pub fn opacity(&self, now: Instant) -> f32 {
        match self.started {
            Some(start) => fade_opacity(now.saturating_duration_since(start), self.duration, self.from),
            None => 1.0,
        }
    }

    pub fn is_running(&self, now: Instant) -> bool {
        self.started
            .map(|start| now.saturating_duration_since(start) < self.duration)
            .unwrap_or(false)
    }
}

/// Offsets of the outline copies, clockwise from the right.
pub fn outline_offsets(width: f32) -> [egui::Vec2; 8] {
    let d = width * std::f32::consts::FRAC_1_SQRT_2;
    [
        egui::vec2(width, 0.0),
        egui::vec2(d, d),
        egui::vec2(0.0, width),
        egui::vec2(-d, d),
        egui::vec2(-width, 0.0),
        egui::vec2(-d, -d),
        egui::vec2(0.0, -width),
        egui::vec2(d, -d),
    ]
}

fn layout(
    painter: &egui::Painter,
    text: &str,
    config: &OverlayConfig,
    wrap_width: f32,
    color: egui::Color32,
) -> Arc<egui::Galley> {
    let format = egui::TextFormat {
        font_id: egui::FontId::proportional(config.font_size),
        color,
        ..Default::default()
    };
    let mut job = egui::text::LayoutJob::single_section(text.to_owned(), format);
    job.wrap.max_width = wrap_width;
    job.wrap.max_rows = config.max_rows;
    job.wrap.break_anywhere = false;
    job.halign = egui::Align::Center;
    painter.layout_job(job)
}

/// Paint `text` centered in `rect` with an outline and drop shadow.
pub fn paint_outlined_text(
    painter: &egui::Painter,
    rect: egui::Rect,
    text: &str,
    config: &OverlayConfig,
    opacity: f32,
) {
    let wrap_width = (rect.width() - 2.0 * config.padding).max(config.font_size);
    let shade = egui::Color32::from_black_alpha((config.shadow_alpha * opacity * 255.0) as u8);
    let fill = egui::Color32::from_white_alpha((opacity * 255.0) as u8);

    let shadow = layout(painter, text, config, wrap_width, shade);
    let body = layout(painter, text, config, wrap_width, fill);
    let pos = rect.center() - body.rect.center().to_vec2();

    let [dx, dy] = config.shadow_offset;
    painter.galley(pos + egui::vec2(dx, dy), shadow.clone(), shade);
    for offset in outline_offsets(config.outline_width) {
        painter.galley(pos + offset, shadow.clone(), shade);
    }
    painter.galley(pos, body.clone(), fill);
    painter.galley(pos + egui::vec2(FAUX_BOLD_OFFSET, 0.0), body, fill);
}

#[cfg(test)]
mod tests {
    use super::*;

    const DURATION: Duration = Duration::from_millis(150);

    #[test]
    fn test_fade_endpoints() {
        assert_eq!(fade_opacity(Duration::ZERO, DURATION, 0.3), 0.3);
        assert_eq!(fade_opacity(DURATION, DURATION, 0.3), 1.0);
        assert_eq!(fade_opacity(Duration::from_secs(5), DURATION, 0.3), 1.0);
    }

    #[test]
    fn test_fade_is_monotonic() {
        let mut last = 0.0;
        for ms in 0..=150 {
            let opacity = fade_opacity(Duration::from_millis(ms), DURATION, 0.3);
            assert!(opacity >= last, "opacity dropped at {ms}ms");
            last = opacity;
        }
    }

    #[test]
    fn test_zero_duration_is_opaque() {
        assert_eq!(fade_opacity(Duration::ZERO, Duration::ZERO, 0.3), 1.0);
    }

    #[test]
    fn test_fade_state() {
        let config = OverlayConfig::default();
        let mut fade = Fade::new(&config);
        let now = Instant::now();
        assert_eq!(fade.opacity(now), 1.0);
        assert!(!fade.is_running(now));

        fade.restart(now);
        assert!(fade.is_running(now));
        assert!((fade.opacity(now) - config.fade_from).abs() < f32::EPSILON);

        let later = now + config.fade_duration;
        assert!(!fade.is_running(later));
        assert_eq!(fade.opacity(later), 1.0);
    }

    #[test]
    fn test_outline_offsets_surround_origin() {
        let offsets = outline_offsets(2.0);
        let sum = offsets.iter().fold(egui::Vec2::ZERO, |acc, v| acc + *v);
        assert!(sum.length() < 1e-4);
        for offset in offsets {
            assert!((offset.length() - 2.0).abs() < 1e-4);
        }
    }
}
