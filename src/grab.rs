//! macOS and Windows system-wide capture using an rdev event grab.
//!
//! Consumed key-downs are swallowed; everything else is passed on untouched.

use crate::hotkey::Modifiers;
use crate::key::{Key, ModifierKey};
use crate::listener::{KeyRouter, SystemWideSource};
use anyhow::{anyhow, Context, Result};
use rdev::{grab, Event, EventType};
use std::cell::Cell;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// How long to wait for the grab to fail before assuming it is installed.
///
/// A missing permission makes the event tap fail straight away; a working
/// grab blocks forever.
const STARTUP_GRACE: Duration = Duration::from_millis(300);

fn from_rdev_key(key: rdev::Key) -> Option<Key> {
    match key {
        rdev::Key::LeftArrow => Some(Key::Left),
        rdev::Key::RightArrow => Some(Key::Right),
        rdev::Key::PageUp => Some(Key::PageUp),
        rdev::Key::PageDown => Some(Key::PageDown),
        rdev::Key::KeyQ => Some(Key::Q),
        _ => None,
    }
}

fn modifier_key(key: rdev::Key) -> Option<ModifierKey> {
    match key {
        rdev::Key::ShiftLeft | rdev::Key::ShiftRight => Some(ModifierKey::Shift),
        rdev::Key::ControlLeft | rdev::Key::ControlRight => Some(ModifierKey::Ctrl),
        rdev::Key::Alt | rdev::Key::AltGr => Some(ModifierKey::Alt),
        _ => None,
    }
}

/// Tracks modifiers and decides whether an event is swallowed.
struct GrabState {
    router: KeyRouter,
    mods: Cell<Modifiers>,
}

impl GrabState {
    fn filter(&self, event: Event) -> Option<Event> {
        match event.event_type {
            EventType::KeyPress(key) => {
                if let Some(modifier) = modifier_key(key) {
                    self.set_modifier(modifier, true);
                } else if let Some(key) = from_rdev_key(key) {
                    if self.router.on_key_down(key, self.mods.get()) {
                        return None;
                    }
                }
                Some(event)
            }
            EventType::KeyRelease(key) => {
                if let Some(modifier) = modifier_key(key) {
                    self.set_modifier(modifier, false);
                }
                Some(event)
            }
            _ => Some(event),
        }
    }

    fn set_modifier(&self, modifier: ModifierKey, down: bool) {
        let mut mods = self.mods.get();
        mods.set(modifier, down);
        self.mods.set(mods);
    }
}

/// Install the grab on a background thread.
///
/// Fails if the OS refuses the event tap, which on macOS means the process
/// has no Accessibility permission.
pub fn start(router: KeyRouter) -> Result<SystemWideSource> {
    let (status_tx, status_rx) = mpsc::channel::<String>();
    let thread_router = router.clone();

    thread::Builder::new()
        .name("key-grab".to_string())
        .spawn(move || {
            let state = GrabState {
                router: thread_router,
                mods: Cell::new(Modifiers::default()),
            };
            if let Err(e) = grab(move |event| state.filter(event)) {
                log::error!("Error grabbing keyboard events: {:?}", e);
                let _ = status_tx.send(format!("{:?}", e));
            }
        })
        .context("Failed to spawn key grab thread")?;

    match status_rx.recv_timeout(STARTUP_GRACE) {
        Ok(e) => Err(anyhow!("Failed to install keyboard event tap: {}", e)),
        Err(RecvTimeoutError::Timeout) => Ok(SystemWideSource::new(router, "rdev grab", true)),
        Err(RecvTimeoutError::Disconnected) => {
            Err(anyhow!("Keyboard event tap exited during startup"))
        }
    }
}
