//! Fallback listener reading the overlay window's own key events.

use crate::hotkey::Modifiers;
use crate::key::Key;
use crate::listener::KeyRouter;
use eframe::egui;

fn from_egui_key(key: egui::Key) -> Option<Key> {
    match key {
        egui::Key::ArrowLeft => Some(Key::Left),
        egui::Key::ArrowRight => Some(Key::Right),
        egui::Key::PageUp => Some(Key::PageUp),
        egui::Key::PageDown => Some(Key::PageDown),
        egui::Key::Q => Some(Key::Q),
        _ => None,
    }
}

fn from_egui_modifiers(modifiers: egui::Modifiers) -> Modifiers {
    Modifiers {
        shift: modifiers.shift,
        ctrl: modifiers.ctrl,
        alt: modifiers.alt,
    }
}

/// Key-down in our vocabulary, if the event is one we might bind.
fn key_down(event: &egui::Event) -> Option<(Key, Modifiers)> {
    match event {
        egui::Event::Key {
            key,
            pressed: true,
            modifiers,
            ..
        } => Some((from_egui_key(*key)?, from_egui_modifiers(*modifiers))),
        _ => None,
    }
}

/// Hotkeys that only work while the overlay has keyboard focus.
pub struct ForegroundOnlySource {
    router: KeyRouter,
}

impl ForegroundOnlySource {
    pub fn new(router: KeyRouter) -> Self {
        Self { router }
    }

    pub fn on_key_down(&self, key: Key, modifiers: Modifiers) -> bool {
        self.router.on_key_down(key, modifiers)
    }

    /// Route this frame's key-downs.
    pub fn pump(&self, ctx: &egui::Context) {
        let presses: Vec<(Key, Modifiers)> =
            ctx.input(|i| i.events.iter().filter_map(key_down).collect());
        for (key, modifiers) in presses {
            self.on_key_down(key, modifiers);
        }
    }
}
