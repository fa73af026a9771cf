//! Static hotkey table.

use crate::event::Action;
use crate::hotkey::{Hotkey, Modifiers};
use crate::key::Key;

/// One entry of the hotkey table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub hotkey: Hotkey,
    pub action: Action,
}

/// The bindings the overlay ships with.
///
/// Ctrl+Alt+arrows for the keyboard, bare PageUp/PageDown for presentation
/// remotes.
pub const DEFAULT_BINDINGS: &[Binding] = &[
    Binding {
        hotkey: Hotkey::with_modifiers(Key::Right, Modifiers::CTRL_ALT),
        action: Action::Next,
    },
    Binding {
        hotkey: Hotkey::with_modifiers(Key::Left, Modifiers::CTRL_ALT),
        action: Action::Previous,
    },
    Binding {
        hotkey: Hotkey::with_modifiers(Key::Q, Modifiers::CTRL_ALT),
        action: Action::Quit,
    },
    Binding {
        hotkey: Hotkey::new(Key::PageDown),
        action: Action::Next,
    },
    Binding {
        hotkey: Hotkey::new(Key::PageUp),
        action: Action::Previous,
    },
];

/// Lookup table from key combinations to actions.
#[derive(Debug, Clone, Copy)]
pub struct Bindings {
    entries: &'static [Binding],
}

impl Bindings {
    pub fn new(entries: &'static [Binding]) -> Self {
        Self { entries }
    }

    /// The action bound to `key` with exactly `modifiers` held, if any.
    pub fn lookup(&self, key: Key, modifiers: Modifiers) -> Option<Action> {
        self.entries
            .iter()
            .find(|b| b.hotkey.matches(key, modifiers))
            .map(|b| b.action)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.entries.iter()
    }
}

impl Default for Bindings {
    fn default() -> Self {
        Self::new(DEFAULT_BINDINGS)
    }
}
