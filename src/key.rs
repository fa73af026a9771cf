//! Platform-agnostic key representation.

/// Keys that take part in a binding.
///
/// Platform backends translate their native key codes into this set and drop
/// everything else, so an unknown key can never match a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    PageUp,
    PageDown,
    Q,
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Left => write!(f, "Left"),
            Key::Right => write!(f, "Right"),
            Key::PageUp => write!(f, "PageUp"),
            Key::PageDown => write!(f, "PageDown"),
            Key::Q => write!(f, "Q"),
        }
    }
}

/// Modifier keys tracked by the listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierKey {
    Shift,
    Ctrl,
    Alt,
}
