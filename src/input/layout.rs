//! Keyboard layout switching for the foreground window.
//!
//! Typed text is mapped to keys on a US layout, so the target window has to
//! be switched to English input before typing, otherwise an IME swallows the
//! keystrokes.

use anyhow::Result;

/// Input layouts the lessons switch between.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyboardLayout {
    /// en-US
    English,
    /// zh-CN
    Chinese,
}

impl KeyboardLayout {
    /// Keyboard layout identifier as accepted by `LoadKeyboardLayoutW`.
    pub fn klid(self) -> &'static str {
        match self {
            KeyboardLayout::English => "00000409",
            KeyboardLayout::Chinese => "00000804",
        }
    }
}

/// Loads `layout` if needed and asks the foreground window to switch to it.
#[cfg(windows)]
pub fn switch_keyboard_layout(layout: KeyboardLayout) -> Result<()> {
    use anyhow::Context;
    use windows::core::HSTRING;
    use windows::Win32::Foundation::{LPARAM, WPARAM};
    use windows::Win32::UI::Input::KeyboardAndMouse::{LoadKeyboardLayoutW, KLF_ACTIVATE};
    use windows::Win32::UI::WindowsAndMessaging::{
        GetForegroundWindow, PostMessageW, WM_INPUTLANGCHANGEREQUEST,
    };

    let klid = HSTRING::from(layout.klid());
    let hkl = unsafe { LoadKeyboardLayoutW(&klid, KLF_ACTIVATE) }
        .with_context(|| format!("Failed to load keyboard layout {}", layout.klid()))?;

    let hwnd = unsafe { GetForegroundWindow() };
    unsafe { PostMessageW(hwnd, WM_INPUTLANGCHANGEREQUEST, WPARAM(0), LPARAM(hkl.0 as isize)) }
        .context("Failed to request input language change")?;

    crate::log(&format!("Switched keyboard layout to {:?}", layout));
    Ok(())
}

/// Loads `layout` if needed and asks the foreground window to switch to it.
#[cfg(not(windows))]
pub fn switch_keyboard_layout(layout: KeyboardLayout) -> Result<()> {
    Err(anyhow::anyhow!(
        "Switching to {:?} layout is only supported on Windows",
        layout
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_identifiers() {
        assert_eq!(KeyboardLayout::English.klid(), "00000409");
        assert_eq!(KeyboardLayout::Chinese.klid(), "00000804");
    }

    #[cfg(not(windows))]
    #[test]
    fn test_switch_unsupported_off_windows() {
        assert!(switch_keyboard_layout(KeyboardLayout::English).is_err());
    }
}
