//! Hotkey definition with optional modifiers.

use crate::key::{Key, ModifierKey};

/// Modifier keys that can be combined with a hotkey.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };

    /// Ctrl and Alt (Option on macOS) held, Shift released.
    pub const CTRL_ALT: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: true,
    };

    /// Record a modifier key going down or up.
    pub fn set(&mut self, key: ModifierKey, down: bool) {
        match key {
            ModifierKey::Shift => self.shift = down,
            ModifierKey::Ctrl => self.ctrl = down,
            ModifierKey::Alt => self.alt = down,
        }
    }
}

/// A hotkey consisting of a key and optional modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hotkey {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl Hotkey {
    /// Create a new hotkey with no modifiers.
    pub const fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    /// Create a new hotkey with the given modifiers.
    pub const fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Whether a key-down of `key` with `modifiers` held triggers this hotkey.
    ///
    /// Modifiers must match exactly: Ctrl+Alt+Shift+Right does not trigger
    /// Ctrl+Alt+Right, and Ctrl+PageDown does not trigger PageDown.
    pub fn matches(&self, key: Key, modifiers: Modifiers) -> bool {
        self.key == key && self.modifiers == modifiers
    }
}

impl std::fmt::Display for Hotkey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if self.modifiers.ctrl {
            parts.push("Ctrl".to_string());
        }
        if self.modifiers.alt {
            parts.push("Alt".to_string());
        }
        if self.modifiers.shift {
            parts.push("Shift".to_string());
        }
        parts.push(self.key.to_string());
        write!(f, "{}", parts.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_tracks_press_and_release() {
        let mut mods = Modifiers::default();
        mods.set(ModifierKey::Ctrl, true);
        mods.set(ModifierKey::Alt, true);
        assert_eq!(mods, Modifiers::CTRL_ALT);

        mods.set(ModifierKey::Ctrl, false);
        assert!(!mods.ctrl);
        assert!(mods.alt);
    }

    #[test]
    fn test_matches_requires_exact_modifiers() {
        let hotkey = Hotkey::with_modifiers(Key::Right, Modifiers::CTRL_ALT);
        assert!(hotkey.matches(Key::Right, Modifiers::CTRL_ALT));
        assert!(!hotkey.matches(Key::Right, Modifiers::NONE));
        assert!(!hotkey.matches(Key::Left, Modifiers::CTRL_ALT));

        let with_shift = Modifiers {
            shift: true,
            ..Modifiers::CTRL_ALT
        };
        assert!(!hotkey.matches(Key::Right, with_shift));
    }

    #[test]
    fn test_plain_key_rejects_modifiers() {
        let hotkey = Hotkey::new(Key::PageDown);
        assert!(hotkey.matches(Key::PageDown, Modifiers::NONE));

        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        assert!(!hotkey.matches(Key::PageDown, ctrl));
    }

    #[test]
    fn test_display() {
        let hotkey = Hotkey::with_modifiers(Key::Q, Modifiers::CTRL_ALT);
        assert_eq!(hotkey.to_string(), "Ctrl+Alt+Q");
        assert_eq!(Hotkey::new(Key::PageUp).to_string(), "PageUp");
    }
}
