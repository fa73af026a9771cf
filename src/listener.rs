//! Key event sources and the routing they share.

use crate::binding::Bindings;
use crate::dispatch::Dispatcher;
use crate::foreground::ForegroundOnlySource;
use crate::hotkey::Modifiers;
use crate::key::Key;
use anyhow::Result;
use eframe::egui;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(target_os = "macos")]
const PERMISSION_HINT: &str = "Grant Accessibility (and Input Monitoring) permission in \
     System Settings -> Privacy & Security, then restart. Until then hotkeys only work \
     while the overlay is focused.";

#[cfg(target_os = "linux")]
const PERMISSION_HINT: &str = "Add your user to the 'input' group (or run as root) so \
     /dev/input/event* is readable, then log in again. Until then hotkeys only work \
     while the overlay is focused.";

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
const PERMISSION_HINT: &str =
    "Global hotkeys could not be installed; hotkeys only work while the overlay is focused.";

/// How key events reach the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Every key-down on the system, regardless of focus.
    SystemWide,
    /// Only key-downs delivered to the overlay window.
    ForegroundOnly,
}

impl std::fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureMode::SystemWide => write!(f, "system-wide"),
            CaptureMode::ForegroundOnly => write!(f, "foreground only"),
        }
    }
}

/// Matches key-downs against the bindings and dispatches the result.
///
/// Shared by every source; clones share the enabled flag, so disabling one
/// disables all.
#[derive(Clone)]
pub struct KeyRouter {
    bindings: Bindings,
    dispatcher: Dispatcher,
    enabled: Arc<AtomicBool>,
}

impl KeyRouter {
    pub fn new(bindings: Bindings, dispatcher: Dispatcher) -> Self {
        Self {
            bindings,
            dispatcher,
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Handle a key-down. Returns true if the event was consumed.
    ///
    /// Unbound combinations, and every event after [`disable`](Self::disable),
    /// are left for the rest of the system.
    pub fn on_key_down(&self, key: Key, modifiers: Modifiers) -> bool {
        if !self.is_enabled() {
            return false;
        }
        match self.bindings.lookup(key, modifiers) {
            Some(action) => {
                log::debug!("Key {:?} with {:?} -> {}", key, modifiers, action);
                self.dispatcher.dispatch(action);
                true
            }
            None => false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }
}

/// A listener running on a background thread with OS-wide access to the
/// keyboard.
pub struct SystemWideSource {
    router: KeyRouter,
    backend: &'static str,
    suppresses: bool,
}

impl SystemWideSource {
    /// `suppresses` is false when the backend can only observe, in which case
    /// handled events are never reported as consumed.
    pub(crate) fn new(router: KeyRouter, backend: &'static str, suppresses: bool) -> Self {
        Self {
            router,
            backend,
            suppresses,
        }
    }

    /// Name of the OS mechanism in use, for diagnostics.
    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// Whether handled key-downs are kept from other applications.
    pub fn suppresses(&self) -> bool {
        self.suppresses
    }

    pub fn on_key_down(&self, key: Key, modifiers: Modifiers) -> bool {
        self.router.on_key_down(key, modifiers) && self.suppresses
    }
}

#[cfg(target_os = "linux")]
fn start_system_wide(router: KeyRouter) -> Result<SystemWideSource> {
    crate::linux::start(router)
}

#[cfg(any(target_os = "macos", target_os = "windows"))]
fn start_system_wide(router: KeyRouter) -> Result<SystemWideSource> {
    crate::grab::start(router)
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn start_system_wide(_router: KeyRouter) -> Result<SystemWideSource> {
    anyhow::bail!("System-wide key capture is not supported on this platform")
}

/// Where key-downs come from.
pub enum KeyEventSource {
    SystemWide(SystemWideSource),
    ForegroundOnly(ForegroundOnlySource),
}

impl KeyEventSource {
    pub fn mode(&self) -> CaptureMode {
        match self {
            KeyEventSource::SystemWide(_) => CaptureMode::SystemWide,
            KeyEventSource::ForegroundOnly(_) => CaptureMode::ForegroundOnly,
        }
    }

    /// Handle a key-down. Returns true if the event was consumed.
    pub fn on_key_down(&self, key: Key, modifiers: Modifiers) -> bool {
        match self {
            KeyEventSource::SystemWide(source) => source.on_key_down(key, modifiers),
            KeyEventSource::ForegroundOnly(source) => source.on_key_down(key, modifiers),
        }
    }
}

/// Builder for the key listener.
pub struct ListenerBuilder {
    bindings: Bindings,
    dispatcher: Dispatcher,
}

impl ListenerBuilder {
    /// Create a builder that sends actions to `dispatcher`.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            bindings: Bindings::default(),
            dispatcher,
        }
    }

    /// Start listening, system-wide if the OS allows it.
    ///
    /// Falls back to foreground-only capture, with a warning, when the
    /// system-wide listener cannot be set up.
    pub fn start(self) -> ListenerHandle {
        let router = self.router();
        let source = match start_system_wide(router.clone()) {
            Ok(source) => {
                log::info!(
                    "Capturing hotkeys system-wide via {} ({})",
                    source.backend(),
                    if source.suppresses() {
                        "consumed keys are swallowed"
                    } else {
                        "observe only"
                    }
                );
                KeyEventSource::SystemWide(source)
            }
            Err(e) => {
                log::warn!("System-wide hotkeys unavailable: {:#}", e);
                log::warn!("{}", PERMISSION_HINT);
                KeyEventSource::ForegroundOnly(ForegroundOnlySource::new(router.clone()))
            }
        };
        ListenerHandle { router, source }
    }

    /// Start with foreground-only capture, without touching OS input.
    pub fn start_foreground_only(self) -> ListenerHandle {
        let router = self.router();
        let source = KeyEventSource::ForegroundOnly(ForegroundOnlySource::new(router.clone()));
        ListenerHandle { router, source }
    }

    fn router(self) -> KeyRouter {
        for binding in self.bindings.iter() {
            log::info!("Hotkey {} -> {}", binding.hotkey, binding.action);
        }
        KeyRouter::new(self.bindings, self.dispatcher)
    }
}

/// Handle to a running key listener.
///
/// The listener is disabled when this handle is dropped: no further actions
/// are dispatched and every key event passes through.
pub struct ListenerHandle {
    router: KeyRouter,
    source: KeyEventSource,
}

impl ListenerHandle {
    pub fn mode(&self) -> CaptureMode {
        self.source.mode()
    }

    pub fn on_key_down(&self, key: Key, modifiers: Modifiers) -> bool {
        self.source.on_key_down(key, modifiers)
    }

    /// Feed the overlay window's own key events to a foreground-only source.
    ///
    /// Does nothing for system-wide sources, which run on their own thread.
    pub fn pump(&self, ctx: &egui::Context) {
        if let KeyEventSource::ForegroundOnly(source) = &self.source {
            source.pump(ctx);
        }
    }

    /// Check if the listener is still running.
    pub fn is_running(&self) -> bool {
        self.router.is_enabled()
    }

    /// Manually stop the listener.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if self.router.is_enabled() {
            log::debug!("Disabling {} key listener", self.mode());
        }
        self.router.disable();
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch;
    use crate::event::Action;

    #[test]
    fn test_router_consumes_bound_keys() {
        let (dispatcher, queue) = dispatch::channel();
        let router = KeyRouter::new(Bindings::default(), dispatcher);

        assert!(router.on_key_down(Key::Right, Modifiers::CTRL_ALT));
        assert!(router.on_key_down(Key::PageUp, Modifiers::NONE));
        assert_eq!(queue.drain(), vec![Action::Next, Action::Previous]);
    }

    #[test]
    fn test_router_passes_unbound_keys() {
        let (dispatcher, queue) = dispatch::channel();
        let router = KeyRouter::new(Bindings::default(), dispatcher);

        assert!(!router.on_key_down(Key::Right, Modifiers::NONE));
        assert!(!router.on_key_down(Key::PageDown, Modifiers::CTRL_ALT));
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_disabled_router_passes_everything() {
        let (dispatcher, queue) = dispatch::channel();
        let router = KeyRouter::new(Bindings::default(), dispatcher);
        let clone = router.clone();

        router.disable();
        assert!(!clone.is_enabled());
        assert!(!clone.on_key_down(Key::Right, Modifiers::CTRL_ALT));
        assert!(!clone.on_key_down(Key::Q, Modifiers::CTRL_ALT));
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_foreground_handle() {
        let (dispatcher, queue) = dispatch::channel();
        let handle = ListenerBuilder::new(dispatcher).start_foreground_only();

        assert_eq!(handle.mode(), CaptureMode::ForegroundOnly);
        assert!(handle.is_running());
        assert!(handle.on_key_down(Key::Q, Modifiers::CTRL_ALT));
        assert_eq!(queue.drain(), vec![Action::Quit]);

        handle.stop();
        assert!(!handle.is_running());
        assert!(!handle.on_key_down(Key::Right, Modifiers::CTRL_ALT));
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_drop_disables_shared_router() {
        let (dispatcher, queue) = dispatch::channel();
        let handle = ListenerBuilder::new(dispatcher).start_foreground_only();
        let router = handle.router.clone();

        drop(handle);
        assert!(!router.on_key_down(Key::Left, Modifiers::CTRL_ALT));
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_observing_source_never_reports_consumption() {
        let (dispatcher, queue) = dispatch::channel();
        let router = KeyRouter::new(Bindings::default(), dispatcher);
        let observing = SystemWideSource::new(router.clone(), "test", false);
        let swallowing = SystemWideSource::new(router, "test", true);

        assert!(!observing.on_key_down(Key::Right, Modifiers::CTRL_ALT));
        assert!(swallowing.on_key_down(Key::Right, Modifiers::CTRL_ALT));
        assert_eq!(queue.drain(), vec![Action::Next, Action::Next]);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(CaptureMode::SystemWide.to_string(), "system-wide");
        assert_eq!(CaptureMode::ForegroundOnly.to_string(), "foreground only");
    }
}
