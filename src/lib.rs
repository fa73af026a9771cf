//! Always-on-top, click-through overlay that cycles through lines of text.
//!
//! Lines are loaded once from `demo_texts.txt` and shown one at a time in a
//! borderless, transparent window. Global hotkeys step through them:
//!
//! | Hotkey          | Action   |
//! |-----------------|----------|
//! | `Ctrl+Alt+Right`| next     |
//! | `Ctrl+Alt+Left` | previous |
//! | `Ctrl+Alt+Q`    | quit     |
//! | `PageDown`      | next (presentation remotes) |
//! | `PageUp`        | previous (presentation remotes) |
//!
//! # Example
//!
//! ```no_run
//! use floating_text::{overlay, OverlayConfig, TextList};
//!
//! fn main() -> anyhow::Result<()> {
//!     let loaded = TextList::load();
//!     overlay::run(OverlayConfig::default(), loaded.texts)
//! }
//! ```
//!
//! # Permissions
//!
//! System-wide capture needs Accessibility permission on macOS and read
//! access to `/dev/input/event*` on Linux (the `input` group). Without it the
//! overlay still runs, but hotkeys only work while its window has focus.
//! On Linux, keeping consumed hotkeys from other applications also needs
//! write access to `/dev/uinput`; without it they are only observed.

mod binding;
mod config;
mod cycler;
mod dispatch;
mod event;
mod foreground;
mod hotkey;
mod key;
mod listener;
pub mod overlay;
mod render;
mod texts;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(any(target_os = "macos", target_os = "windows"))]
mod grab;

#[cfg(target_os = "macos")]
mod macos;

pub use binding::{Binding, Bindings, DEFAULT_BINDINGS};
pub use config::{OverlayConfig, PLACEHOLDER_TEXT, TEXT_FILE_NAME};
pub use cycler::{Cycler, Lifecycle, Step};
pub use dispatch::{channel, ActionQueue, Dispatcher, Waker};
pub use event::Action;
pub use foreground::ForegroundOnlySource;
pub use hotkey::{Hotkey, Modifiers};
pub use key::{Key, ModifierKey};
pub use listener::{
    CaptureMode, KeyEventSource, KeyRouter, ListenerBuilder, ListenerHandle, SystemWideSource,
};
pub use texts::{candidate_paths, LoadedTexts, TextList};

#[cfg(target_os = "linux")]
pub use linux::find_keyboards;
