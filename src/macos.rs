//! AppKit window settings winit does not expose.

use anyhow::{anyhow, Context, Result};
use objc2::msg_send;
use objc2::runtime::AnyObject;
use raw_window_handle::{HasWindowHandle, RawWindowHandle};

/// `NSScreenSaverWindowLevel`: above full-screen apps and the menu bar.
pub const SCREEN_SAVER_WINDOW_LEVEL: isize = 1000;

const CAN_JOIN_ALL_SPACES: usize = 1 << 0;
const STATIONARY: usize = 1 << 4;
const FULL_SCREEN_AUXILIARY: usize = 1 << 8;

/// Show on every Space, stay put during Exposé, and allow sharing a Space
/// with a full-screen window.
pub const OVERLAY_COLLECTION_BEHAVIOR: usize =
    CAN_JOIN_ALL_SPACES | STATIONARY | FULL_SCREEN_AUXILIARY;

/// Raise the overlay to screen-saver level on every Space.
///
/// Must be called on the main thread once the window exists.
pub fn pin_to_all_spaces(window: &impl HasWindowHandle) -> Result<()> {
    let handle = window
        .window_handle()
        .map_err(|e| anyhow!("No window handle: {}", e))?;
    let RawWindowHandle::AppKit(appkit) = handle.as_raw() else {
        anyhow::bail!("Window handle is not an AppKit handle");
    };

    let view = appkit.ns_view.as_ptr().cast::<AnyObject>();
    // SAFETY: ns_view is a live NSView owned by winit, and eframe calls us on
    // the main thread.
    let ns_window: *mut AnyObject = unsafe { msg_send![view, window] };
    let ns_window = unsafe { ns_window.as_ref() }.context("View is not in a window")?;

    unsafe {
        let _: () = msg_send![ns_window, setLevel: SCREEN_SAVER_WINDOW_LEVEL];
        let _: () = msg_send![ns_window, setCollectionBehavior: OVERLAY_COLLECTION_BEHAVIOR];
    }
    log::debug!("Overlay pinned to all Spaces at screen-saver level");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_behavior_bits() {
        assert_eq!(OVERLAY_COLLECTION_BEHAVIOR, 0x111);
        assert_ne!(OVERLAY_COLLECTION_BEHAVIOR & CAN_JOIN_ALL_SPACES, 0);
        assert_ne!(OVERLAY_COLLECTION_BEHAVIOR & FULL_SCREEN_AUXILIARY, 0);
    }

    #[test]
    fn test_level_above_floating() {
        // NSFloatingWindowLevel is 3, NSPopUpMenuWindowLevel is 101
        assert!(SCREEN_SAVER_WINDOW_LEVEL > 101);
    }
}
