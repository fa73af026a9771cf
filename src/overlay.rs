//! The overlay window.

use crate::config::OverlayConfig;
use crate::cycler::{Cycler, Lifecycle, Step};
use crate::dispatch::{self, ActionQueue, Dispatcher};
use crate::event::Action;
use crate::listener::{CaptureMode, ListenerBuilder, ListenerHandle};
use crate::render::{self, Fade};
use crate::texts::TextList;
use anyhow::{anyhow, Result};
use eframe::egui;
use std::sync::Arc;
use std::time::Instant;

const APP_NAME: &str = "Floating Text";

/// Top-left corner that centers the window horizontally near the top edge.
pub fn window_position(monitor_size: egui::Vec2, config: &OverlayConfig) -> egui::Pos2 {
    let x = ((monitor_size.x - config.window_size[0]) / 2.0).max(0.0);
    egui::pos2(x, config.top_margin)
}

/// Whether clicks should pass through the overlay.
///
/// A foreground-only listener needs the window to be focusable again after
/// it loses focus, so it keeps mouse input.
pub fn mouse_passthrough(mode: CaptureMode) -> bool {
    mode == CaptureMode::SystemWide
}

/// Borderless, transparent, always-on-top, click-through window.
pub fn viewport(config: &OverlayConfig) -> egui::ViewportBuilder {
    egui::ViewportBuilder::default()
        .with_title(APP_NAME)
        .with_inner_size(config.window_size)
        .with_decorations(false)
        .with_transparent(true)
        .with_always_on_top()
        .with_mouse_passthrough(true)
        .with_taskbar(false)
        .with_resizable(false)
}

pub fn native_options(config: &OverlayConfig) -> eframe::NativeOptions {
    #[allow(unused_mut)]
    let mut options = eframe::NativeOptions {
        viewport: viewport(config),
        ..Default::default()
    };

    // Accessory apps get no Dock icon and no menu bar.
    #[cfg(target_os = "macos")]
    {
        options.event_loop_builder = Some(Box::new(|builder| {
            use winit::platform::macos::{ActivationPolicy, EventLoopBuilderExtMacOS};
            builder.with_activation_policy(ActivationPolicy::Accessory);
        }));
    }

    options
}

/// Turn SIGINT/SIGTERM into a quit so the listener is shut down cleanly.
fn install_signal_handler(dispatcher: Dispatcher) {
    let result = ctrlc::set_handler(move || {
        log::warn!("Received termination signal, quitting");
        dispatcher.dispatch(Action::Quit);
    });
    if let Err(e) = result {
        log::warn!("Failed to install termination handler: {}", e);
    }
}

/// Open the overlay and run until quit.
pub fn run(config: OverlayConfig, texts: TextList) -> Result<()> {
    let options = native_options(&config);
    eframe::run_native(
        APP_NAME,
        options,
        Box::new(move |cc| Ok(Box::new(OverlayApp::start(cc, config, texts)))),
    )
    .map_err(|e| anyhow!("Overlay window failed: {}", e))
}

pub struct OverlayApp {
    config: OverlayConfig,
    cycler: Cycler,
    lifecycle: Lifecycle,
    fade: Fade,
    queue: ActionQueue,
    listener: ListenerHandle,
    configured: bool,
    positioned: bool,
}

impl OverlayApp {
    /// Wire the dispatcher to the UI context and start listening for keys.
    fn start(cc: &eframe::CreationContext<'_>, config: OverlayConfig, texts: TextList) -> Self {
        let ctx = cc.egui_ctx.clone();
        let (dispatcher, queue) = dispatch::channel();
        let dispatcher = dispatcher.with_waker(Arc::new(move || ctx.request_repaint()));

        install_signal_handler(dispatcher.clone());
        let listener = ListenerBuilder::new(dispatcher).start();
        log::info!("Hotkey capture: {}", listener.mode());

        Self::new(config, texts, queue, listener)
    }

    pub fn new(
        config: OverlayConfig,
        texts: TextList,
        queue: ActionQueue,
        listener: ListenerHandle,
    ) -> Self {
        let mut fade = Fade::new(&config);
        fade.restart(Instant::now());
        Self {
            cycler: Cycler::new(texts),
            lifecycle: Lifecycle::Idle,
            fade,
            queue,
            listener,
            configured: false,
            positioned: false,
            config,
        }
    }

    pub fn current_text(&self) -> &str {
        self.cycler.current()
    }

    pub fn index(&self) -> usize {
        self.cycler.index()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn listener(&self) -> &ListenerHandle {
        &self.listener
    }

    /// Apply queued actions in order. Returns true once quitting.
    ///
    /// Quit disables the listener before anything else happens, and any
    /// actions queued behind it are dropped.
    pub fn process_actions(&mut self, now: Instant) -> bool {
        for action in self.queue.drain() {
            if self.lifecycle == Lifecycle::Terminating {
                break;
            }
            match self.cycler.apply(action) {
                Step::Moved => {
                    log::debug!(
                        "Showing line {}/{}",
                        self.cycler.index() + 1,
                        self.cycler.len()
                    );
                    self.fade.restart(now);
                }
                Step::Quit => {
                    log::info!("Quit requested");
                    self.listener.stop();
                    self.lifecycle = Lifecycle::Terminating;
                }
            }
        }
        self.lifecycle == Lifecycle::Terminating
    }

    /// One-time window adjustments that need a live window.
    fn configure_window(&mut self, ctx: &egui::Context, frame: &eframe::Frame) {
        if self.configured {
            return;
        }
        self.configured = true;

        if !mouse_passthrough(self.listener.mode()) {
            ctx.send_viewport_cmd(egui::ViewportCommand::MousePassthrough(false));
        }

        #[cfg(target_os = "macos")]
        if let Err(e) = crate::macos::pin_to_all_spaces(frame) {
            log::warn!("Overlay may not show on every Space: {:#}", e);
        }
        #[cfg(not(target_os = "macos"))]
        let _ = frame;
    }

    fn place_window(&mut self, ctx: &egui::Context) {
        if self.positioned {
            return;
        }
        if let Some(monitor) = ctx.input(|i| i.viewport().monitor_size) {
            let pos = window_position(monitor, &self.config);
            ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(pos));
            self.positioned = true;
        }
    }
}

impl eframe::App for OverlayApp {
    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        egui::Rgba::TRANSPARENT.to_array()
    }

    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        self.configure_window(ctx, frame);
        self.place_window(ctx);
        self.listener.pump(ctx);

        let now = Instant::now();
        if self.process_actions(now) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        let opacity = self.fade.opacity(now);
        egui::CentralPanel::default()
            .frame(egui::Frame::new())
            .show(ctx, |ui| {
                render::paint_outlined_text(
                    ui.painter(),
                    ui.max_rect(),
                    self.cycler.current(),
                    &self.config,
                    opacity,
                );
            });

        if self.fade.is_running(now) {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::Modifiers;
    use crate::key::Key;
    use std::time::Duration;

    fn app(content: &str) -> OverlayApp {
        let (dispatcher, queue) = dispatch::channel();
        let listener = ListenerBuilder::new(dispatcher).start_foreground_only();
        OverlayApp::new(
            OverlayConfig::default(),
            TextList::parse(content).unwrap(),
            queue,
            listener,
        )
    }

    #[test]
    fn test_bound_key_advances_once() {
        let mut app = app("one\ntwo\nthree");
        assert!(app.listener().on_key_down(Key::Right, Modifiers::CTRL_ALT));
        assert!(!app.process_actions(Instant::now()));
        assert_eq!(app.index(), 1);
        assert_eq!(app.current_text(), "two");
    }

    #[test]
    fn test_unbound_key_changes_nothing() {
        let mut app = app("one\ntwo");
        assert!(!app.listener().on_key_down(Key::Right, Modifiers::NONE));
        assert!(!app.listener().on_key_down(Key::Q, Modifiers::NONE));
        app.process_actions(Instant::now());
        assert_eq!(app.index(), 0);
    }

    #[test]
    fn test_remote_keys_cycle() {
        let mut app = app("one\ntwo\nthree");
        app.listener().on_key_down(Key::PageUp, Modifiers::NONE);
        app.process_actions(Instant::now());
        assert_eq!(app.current_text(), "three");

        app.listener().on_key_down(Key::PageDown, Modifiers::NONE);
        app.listener().on_key_down(Key::PageDown, Modifiers::NONE);
        app.process_actions(Instant::now());
        assert_eq!(app.current_text(), "two");
    }

    #[test]
    fn test_quit_disables_listener() {
        let mut app = app("one\ntwo");
        assert!(app.listener().on_key_down(Key::Q, Modifiers::CTRL_ALT));
        assert!(app.process_actions(Instant::now()));
        assert_eq!(app.lifecycle(), Lifecycle::Terminating);
        assert!(!app.listener().is_running());

        assert!(!app.listener().on_key_down(Key::Right, Modifiers::CTRL_ALT));
        assert!(app.process_actions(Instant::now()));
        assert_eq!(app.index(), 0);
    }

    #[test]
    fn test_actions_after_quit_are_dropped() {
        let mut app = app("one\ntwo\nthree");
        let listener = app.listener();
        listener.on_key_down(Key::Right, Modifiers::CTRL_ALT);
        listener.on_key_down(Key::Q, Modifiers::CTRL_ALT);
        listener.on_key_down(Key::Right, Modifiers::CTRL_ALT);

        assert!(app.process_actions(Instant::now()));
        assert_eq!(app.index(), 1);
    }

    #[test]
    fn test_passthrough_only_with_system_wide_capture() {
        assert!(mouse_passthrough(CaptureMode::SystemWide));
        assert!(!mouse_passthrough(CaptureMode::ForegroundOnly));
    }

    /// Runs itself in a child process that sends itself SIGTERM.
    #[cfg(target_os = "linux")]
    #[test]
    fn test_sigterm_dispatches_quit() {
        const CHILD_ENV: &str = "FLOATING_TEXT_SIGTERM_CHILD";

        if std::env::var_os(CHILD_ENV).is_some() {
            let (dispatcher, queue) = dispatch::channel();
            install_signal_handler(dispatcher);
            nix::sys::signal::raise(nix::sys::signal::Signal::SIGTERM).unwrap();

            let deadline = Instant::now() + Duration::from_secs(5);
            while Instant::now() < deadline {
                if queue.drain().contains(&Action::Quit) {
                    std::process::exit(0);
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            std::process::exit(1);
        }

        let status = std::process::Command::new(std::env::current_exe().unwrap())
            .args([
                "--exact",
                "overlay::tests::test_sigterm_dispatches_quit",
                "--nocapture",
            ])
            .env(CHILD_ENV, "1")
            .status()
            .unwrap();
        assert!(status.success(), "child status: {status}");
    }

    #[test]
    fn test_window_position() {
        let config = OverlayConfig::default();
        let pos = window_position(egui::vec2(1920.0, 1080.0), &config);
        assert_eq!(pos, egui::pos2(560.0, config.top_margin));

        let narrow = window_position(egui::vec2(640.0, 480.0), &config);
        assert_eq!(narrow.x, 0.0);
    }

    #[test]
    fn test_viewport_is_overlay() {
        let vp = viewport(&OverlayConfig::default());
        assert_eq!(vp.decorations, Some(false));
        assert_eq!(vp.transparent, Some(true));
        assert_eq!(vp.mouse_passthrough, Some(true));
        assert_eq!(vp.taskbar, Some(false));
        assert_eq!(vp.window_level, Some(egui::WindowLevel::AlwaysOnTop));
        assert_eq!(vp.inner_size, Some(egui::vec2(800.0, 100.0)));
    }
}
