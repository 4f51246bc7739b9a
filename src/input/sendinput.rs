//! SendInput-backed actuator.
//!
//! Injects hardware-level mouse and keyboard events. Pointer moves are
//! relative (no MOUSEEVENTF_ABSOLUTE), so a drag starts wherever the cursor
//! currently is.

use anyhow::{anyhow, Result};
use std::time::Duration;

use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, VkKeyScanW, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT,
    KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
    MOUSEEVENTF_MOVE, MOUSEINPUT, MOUSE_EVENT_FLAGS, VIRTUAL_KEY, VK_SHIFT,
};

use super::{InputActuator, Key};

pub struct SendInputActuator;

impl SendInputActuator {
    pub fn new() -> Self {
        crate::log("Using SendInput actuator");
        Self
    }

    fn send(&self, input: INPUT, what: &str) -> Result<()> {
        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        if sent != 1 {
            return Err(anyhow!("SendInput rejected {}", what));
        }
        Ok(())
    }

    fn mouse(&self, dx: i32, dy: i32, flags: MOUSE_EVENT_FLAGS, what: &str) -> Result<()> {
        let input = INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx,
                    dy,
                    dwFlags: flags,
                    ..Default::default()
                },
            },
        };
        self.send(input, what)
    }

    fn keyboard(&self, key: Key, flags: KEYBD_EVENT_FLAGS) -> Result<()> {
        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: virtual_key(key)?,
                    dwFlags: flags,
                    ..Default::default()
                },
            },
        };
        self.send(input, &format!("{:?}", key))
    }
}

impl Default for SendInputActuator {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves a key to its virtual-key code on the active layout.
fn virtual_key(key: Key) -> Result<VIRTUAL_KEY> {
    match key {
        Key::Shift => Ok(VK_SHIFT),
        Key::Char(c) => {
            let mut buf = [0u16; 2];
            let units = c.encode_utf16(&mut buf);
            if units.len() != 1 {
                return Err(anyhow!("No virtual key for {:?}", c));
            }
            let scan = unsafe { VkKeyScanW(units[0]) };
            if scan == -1 {
                return Err(anyhow!("No virtual key for {:?} on the active layout", c));
            }
            // Low byte is the key code, high byte the shift state.
            Ok(VIRTUAL_KEY((scan as u16) & 0xff))
        }
    }
}

impl InputActuator for SendInputActuator {
    fn pointer_down(&mut self) -> Result<()> {
        self.mouse(0, 0, MOUSEEVENTF_LEFTDOWN, "left button down")
    }

    fn pointer_up(&mut self) -> Result<()> {
        self.mouse(0, 0, MOUSEEVENTF_LEFTUP, "left button up")
    }

    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<()> {
        self.mouse(dx, dy, MOUSEEVENTF_MOVE, "relative move")
    }

    fn key_down(&mut self, key: Key) -> Result<()> {
        self.keyboard(key, KEYBD_EVENT_FLAGS(0))
    }

    fn key_up(&mut self, key: Key) -> Result<()> {
        self.keyboard(key, KEYEVENTF_KEYUP)
    }

    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
