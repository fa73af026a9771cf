//! Position within the text list.

use crate::event::Action;
use crate::texts::TextList;

/// Whether the overlay is still taking actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Terminating,
}

/// Result of applying an action to the cycler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The current line changed.
    Moved,
    /// The application should shut down.
    Quit,
}

/// A fixed list of lines and the index of the one on screen.
#[derive(Debug, Clone)]
pub struct Cycler {
    texts: TextList,
    index: usize,
}

impl Cycler {
    pub fn new(texts: TextList) -> Self {
        Self { texts, index: 0 }
    }

    pub fn current(&self) -> &str {
        self.texts.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Always false: the text list is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Advance one line, wrapping after the last.
    pub fn next(&mut self) -> &str {
        self.index = (self.index + 1) % self.texts.len();
        self.current()
    }

    /// Go back one line, wrapping before the first.
    pub fn previous(&mut self) -> &str {
        let len = self.texts.len();
        self.index = (self.index + len - 1) % len;
        self.current()
    }

    pub fn apply(&mut self, action: Action) -> Step {
        match action {
            Action::Next => {
                self.next();
                Step::Moved
            }
            Action::Previous => {
                self.previous();
                Step::Moved
            }
            Action::Quit => Step::Quit,
        }
    }
}
