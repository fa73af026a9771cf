//! Actions emitted by the key listener.

/// What a recognized hotkey asks the overlay to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Show the next line, wrapping to the first.
    Next,
    /// Show the previous line, wrapping to the last.
    Previous,
    /// Disable the listener and close the overlay.
    Quit,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Next => write!(f, "next"),
            Action::Previous => write!(f, "previous"),
            Action::Quit => write!(f, "quit"),
        }
    }
}
