//! Linux system-wide capture using evdev.
//!
//! Keyboards are grabbed exclusively and every event the router does not
//! consume is re-emitted through a uinput device, so consumed keys never reach
//! other applications. Without write access to /dev/uinput the devices are
//! only observed and consumed keys are delivered as usual.

use crate::hotkey::Modifiers;
use crate::key::{Key, ModifierKey};
use crate::listener::{KeyRouter, SystemWideSource};
use anyhow::{anyhow, Context, Result};
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, Device, InputEvent};
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use std::collections::HashSet;
use std::os::fd::AsRawFd;
use std::thread;
use std::time::{Duration, Instant};

/// Name of the uinput device that re-emits passed-through keys.
const VIRTUAL_DEVICE_NAME: &str = "floating-text passthrough";

/// Minimum interval between keyboard rescans after a read error.
const RESCAN_INTERVAL: Duration = Duration::from_secs(3);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

fn from_evdev_key(key: evdev::Key) -> Option<Key> {
    match key {
        evdev::Key::KEY_LEFT => Some(Key::Left),
        evdev::Key::KEY_RIGHT => Some(Key::Right),
        evdev::Key::KEY_PAGEUP => Some(Key::PageUp),
        evdev::Key::KEY_PAGEDOWN => Some(Key::PageDown),
        evdev::Key::KEY_Q => Some(Key::Q),
        _ => None,
    }
}

fn modifier_key(key: evdev::Key) -> Option<ModifierKey> {
    match key {
        evdev::Key::KEY_LEFTSHIFT | evdev::Key::KEY_RIGHTSHIFT => Some(ModifierKey::Shift),
        evdev::Key::KEY_LEFTCTRL | evdev::Key::KEY_RIGHTCTRL => Some(ModifierKey::Ctrl),
        evdev::Key::KEY_LEFTALT | evdev::Key::KEY_RIGHTALT => Some(ModifierKey::Alt),
        _ => None,
    }
}

/// Find all keyboard devices in /dev/input.
///
/// Presentation remotes register as keyboards too, as long as they report
/// letter keys.
pub fn find_keyboards() -> Result<Vec<Device>> {
    let mut keyboards = Vec::new();

    for entry in std::fs::read_dir("/dev/input").context("Failed to read /dev/input")? {
        let entry = entry?;
        let path = entry.path();

        if !path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("event"))
            .unwrap_or(false)
        {
            continue;
        }

        match Device::open(&path) {
            Ok(device) if device.name() == Some(VIRTUAL_DEVICE_NAME) => {
                log::debug!("Skipping own passthrough device at {:?}", path);
            }
            Ok(device) => {
                let supports_keys = device
                    .supported_keys()
                    .map(|keys| {
                        keys.contains(evdev::Key::KEY_A) || keys.contains(evdev::Key::KEY_PAGEDOWN)
                    })
                    .unwrap_or(false);
                if supports_keys {
                    log::debug!("Found keyboard: {:?} at {:?}", device.name(), path);
                    keyboards.push(device);
                }
            }
            Err(e) => log::debug!("Cannot open {:?}: {}", path, e),
        }
    }

    if keyboards.is_empty() {
        Err(anyhow!(
            "No readable keyboards in /dev/input. Make sure you're in the 'input' group or running as root."
        ))
    } else {
        Ok(keyboards)
    }
}

/// Set non-blocking mode on keyboard devices.
fn set_nonblocking(keyboards: &[Device]) -> Result<()> {
    for device in keyboards {
        let fd = device.as_raw_fd();
        let flags = fcntl(fd, FcntlArg::F_GETFL).context("Failed to get fd flags")?;
        let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
        fcntl(fd, FcntlArg::F_SETFL(flags)).context("Failed to set non-blocking")?;
    }
    Ok(())
}

fn is_would_block(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(libc::EAGAIN) || e.raw_os_error() == Some(libc::EWOULDBLOCK)
}

/// Drain stale events so a reconnected keyboard starts from a clean state.
fn drain_events(keyboards: &mut [Device]) {
    for device in keyboards.iter_mut() {
        let device_name = device.name().map(String::from);
        loop {
            match device.fetch_events() {
                Ok(events) => {
                    let count = events.count();
                    if count == 0 {
                        break;
                    }
                    log::debug!("Drained {} stale events from {:?}", count, device_name);
                }
                Err(e) => {
                    if !is_would_block(&e) {
                        log::debug!("Error draining events from {:?}: {}", device_name, e);
                    }
                    break;
                }
            }
        }
    }
}

/// Decides, per key event, whether it reaches other applications.
#[derive(Default)]
struct KeyFilter {
    mods: Modifiers,
    /// Codes whose key-down was consumed; their repeats and release are
    /// swallowed too.
    swallowed: HashSet<u16>,
}

impl KeyFilter {
    /// Route one key event. Returns true if it should be passed on.
    ///
    /// `value` is the evdev key state: 0 release, 1 press, 2 autorepeat.
    fn handle(&mut self, key: evdev::Key, value: i32, router: &KeyRouter) -> bool {
        if let Some(modifier) = modifier_key(key) {
            self.mods.set(modifier, value != 0);
            return true;
        }

        if value == 0 {
            return !self.swallowed.remove(&key.code());
        }

        let consumed = from_evdev_key(key).is_some_and(|key| router.on_key_down(key, self.mods));
        if consumed {
            self.swallowed.insert(key.code());
            return false;
        }
        !self.swallowed.contains(&key.code())
    }
}

/// Create a uinput device able to emit every key the keyboards report.
fn passthrough_device(keyboards: &[Device]) -> Result<VirtualDevice> {
    let mut keys = AttributeSet::<evdev::Key>::new();
    for device in keyboards {
        if let Some(supported) = device.supported_keys() {
            for key in supported.iter() {
                keys.insert(key);
            }
        }
    }

    let device = VirtualDeviceBuilder::new()
        .context("Failed to open /dev/uinput")?
        .name(VIRTUAL_DEVICE_NAME)
        .with_keys(&keys)
        .context("Failed to register passthrough keys")?
        .build()
        .context("Failed to create passthrough device")?;
    Ok(device)
}

/// Grab every keyboard, releasing the ones already grabbed if any fails.
fn grab_all(keyboards: &mut [Device]) -> Result<()> {
    for i in 0..keyboards.len() {
        if let Err(e) = keyboards[i].grab() {
            for device in keyboards[..i].iter_mut() {
                let _ = device.ungrab();
            }
            return Err(e).with_context(|| format!("Failed to grab {:?}", keyboards[i].name()));
        }
    }
    Ok(())
}

fn ungrab_all(keyboards: &mut [Device]) {
    for device in keyboards.iter_mut() {
        if let Err(e) = device.ungrab() {
            log::debug!("Failed to ungrab {:?}: {}", device.name(), e);
        }
    }
}

/// Take exclusive hold of the keyboards. Returns the device that passes
/// unconsumed events on.
fn suppress(keyboards: &mut [Device]) -> Result<VirtualDevice> {
    let passthrough = passthrough_device(keyboards)?;
    grab_all(keyboards)?;
    Ok(passthrough)
}

/// Like [`suppress`], falling back to observing with a warning.
fn try_suppress(keyboards: &mut [Device]) -> Option<VirtualDevice> {
    match suppress(keyboards) {
        Ok(passthrough) => Some(passthrough),
        Err(e) => {
            log::warn!("Consumed hotkeys will also reach other applications: {:#}", e);
            None
        }
    }
}

/// Open every keyboard and route its key-downs on a background thread.
///
/// Fails when no keyboard can be opened, which on most systems means the
/// process lacks permission to read /dev/input.
pub fn start(router: KeyRouter) -> Result<SystemWideSource> {
    let mut keyboards = find_keyboards()?;
    set_nonblocking(&keyboards)?;
    let passthrough = try_suppress(&mut keyboards);
    let suppresses = passthrough.is_some();
    log::debug!("Listening on {} keyboard device(s)", keyboards.len());

    let thread_router = router.clone();
    thread::Builder::new()
        .name("evdev-keys".to_string())
        .spawn(move || run(keyboards, passthrough, thread_router))
        .context("Failed to spawn keyboard thread")?;

    Ok(SystemWideSource::new(router, "evdev", suppresses))
}

fn run(mut keyboards: Vec<Device>, mut passthrough: Option<VirtualDevice>, router: KeyRouter) {
    let mut filter = KeyFilter::default();
    let mut forward: Vec<InputEvent> = Vec::new();
    let mut last_rescan = Instant::now();
    let mut had_error = false;

    while router.is_enabled() {
        if had_error && last_rescan.elapsed() >= RESCAN_INTERVAL {
            log::info!("Keyboard error detected, rescanning devices...");
            match find_keyboards() {
                Ok(mut new_keyboards) => {
                    // Bluetooth keyboards need a moment before they are readable
                    thread::sleep(Duration::from_millis(100));

                    match set_nonblocking(&new_keyboards) {
                        Ok(()) => {
                            log::info!(
                                "Keyboards reconnected: found {} device(s)",
                                new_keyboards.len()
                            );
                            drain_events(&mut new_keyboards);
                            if passthrough.is_some() {
                                ungrab_all(&mut keyboards);
                                passthrough = try_suppress(&mut new_keyboards);
                            }
                            keyboards = new_keyboards;
                            filter = KeyFilter::default();
                            had_error = false;
                        }
                        Err(e) => {
                            log::warn!("Failed to set non-blocking on new keyboards: {}", e);
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Failed to rescan keyboards: {}", e);
                }
            }
            last_rescan = Instant::now();
        }

        for device in keyboards.iter_mut() {
            match device.fetch_events() {
                Ok(events) => {
                    for event in events {
                        let evdev::InputEventKind::Key(key) = event.kind() else {
                            continue;
                        };
                        if filter.handle(key, event.value(), &router) {
                            forward.push(event);
                        }
                    }
                }
                Err(e) => {
                    if !is_would_block(&e) {
                        log::debug!("Keyboard read error: {}", e);
                        had_error = true;
                    }
                }
            }
        }

        if let Some(device) = passthrough.as_mut() {
            if !forward.is_empty() {
                if let Err(e) = device.emit(&forward) {
                    log::warn!("Failed to pass key events on: {}", e);
                }
            }
        }
        forward.clear();

        thread::sleep(POLL_INTERVAL);
    }

    if passthrough.is_some() {
        ungrab_all(&mut keyboards);
    }
    log::debug!("evdev key listener stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Bindings;
    use crate::dispatch::{self, ActionQueue};
    use crate::event::Action;

    const RELEASE: i32 = 0;
    const PRESS: i32 = 1;
    const REPEAT: i32 = 2;

    fn router() -> (KeyRouter, ActionQueue) {
        let (dispatcher, queue) = dispatch::channel();
        (KeyRouter::new(Bindings::default(), dispatcher), queue)
    }

    #[test]
    fn test_consumed_chord_is_swallowed() {
        let (router, queue) = router();
        let mut filter = KeyFilter::default();

        assert!(filter.handle(evdev::Key::KEY_LEFTCTRL, PRESS, &router));
        assert!(filter.handle(evdev::Key::KEY_LEFTALT, PRESS, &router));
        assert!(!filter.handle(evdev::Key::KEY_RIGHT, PRESS, &router));
        assert!(!filter.handle(evdev::Key::KEY_RIGHT, RELEASE, &router));
        assert!(filter.handle(evdev::Key::KEY_LEFTALT, RELEASE, &router));
        assert!(filter.handle(evdev::Key::KEY_LEFTCTRL, RELEASE, &router));
        assert_eq!(queue.drain(), vec![Action::Next]);
    }

    #[test]
    fn test_unbound_keys_pass_through() {
        let (router, queue) = router();
        let mut filter = KeyFilter::default();

        assert!(filter.handle(evdev::Key::KEY_RIGHT, PRESS, &router));
        assert!(filter.handle(evdev::Key::KEY_RIGHT, RELEASE, &router));
        assert!(filter.handle(evdev::Key::KEY_A, PRESS, &router));
        assert!(filter.handle(evdev::Key::KEY_A, REPEAT, &router));
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_held_remote_key_repeats() {
        let (router, queue) = router();
        let mut filter = KeyFilter::default();

        assert!(!filter.handle(evdev::Key::KEY_PAGEDOWN, PRESS, &router));
        assert!(!filter.handle(evdev::Key::KEY_PAGEDOWN, REPEAT, &router));
        assert!(!filter.handle(evdev::Key::KEY_PAGEDOWN, RELEASE, &router));
        assert_eq!(queue.drain(), vec![Action::Next, Action::Next]);
    }

    #[test]
    fn test_disabled_router_finishes_swallowed_key() {
        let (router, queue) = router();
        let mut filter = KeyFilter::default();

        assert!(!filter.handle(evdev::Key::KEY_PAGEUP, PRESS, &router));
        router.disable();
        // The press never went out, so neither may its repeat or release.
        assert!(!filter.handle(evdev::Key::KEY_PAGEUP, REPEAT, &router));
        assert!(!filter.handle(evdev::Key::KEY_PAGEUP, RELEASE, &router));
        assert!(filter.handle(evdev::Key::KEY_PAGEUP, PRESS, &router));
        assert_eq!(queue.drain(), vec![Action::Previous]);
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(from_evdev_key(evdev::Key::KEY_RIGHT), Some(Key::Right));
        assert_eq!(from_evdev_key(evdev::Key::KEY_PAGEDOWN), Some(Key::PageDown));
        assert_eq!(from_evdev_key(evdev::Key::KEY_Q), Some(Key::Q));
        assert_eq!(from_evdev_key(evdev::Key::KEY_SPACE), None);
    }

    #[test]
    fn test_modifier_mapping() {
        assert_eq!(
            modifier_key(evdev::Key::KEY_RIGHTCTRL),
            Some(ModifierKey::Ctrl)
        );
        assert_eq!(modifier_key(evdev::Key::KEY_LEFTALT), Some(ModifierKey::Alt));
        assert_eq!(modifier_key(evdev::Key::KEY_RIGHT), None);
    }
}
