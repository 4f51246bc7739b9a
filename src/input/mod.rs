//! Pointer and keyboard input synthesis.
//!
//! This module provides:
//! - The `InputActuator` trait, the seam between planned input and the device
//! - A scoped `InputSession` that drags along a trajectory or types text with
//!   randomized pauses and always releases held buttons and keys
//! - A recording actuator for dry runs and tests
//! - A SendInput-backed actuator and keyboard layout switching on Windows

pub mod keys;
pub mod layout;
pub mod recording;
pub mod session;
#[cfg(windows)]
pub mod sendinput;

use anyhow::Result;
use std::time::Duration;

pub use keys::{strokes_for, KeyStroke};
pub use layout::{switch_keyboard_layout, KeyboardLayout};
pub use recording::{InputEvent, RecordingActuator};
pub use session::InputSession;

/// A key the actuator can press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Shift,
    /// An unshifted character key, e.g. `'a'` or `'1'`
    Char(char),
}

/// Executes low-level input events.
pub trait InputActuator {
    fn pointer_down(&mut self) -> Result<()>;
    fn pointer_up(&mut self) -> Result<()>;
    /// Moves the pointer relative to its current position.
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<()>;
    fn key_down(&mut self, key: Key) -> Result<()>;
    fn key_up(&mut self, key: Key) -> Result<()>;
    fn pause(&mut self, duration: Duration);
}

impl<A: InputActuator + ?Sized> InputActuator for Box<A> {
    fn pointer_down(&mut self) -> Result<()> {
        (**self).pointer_down()
    }

    fn pointer_up(&mut self) -> Result<()> {
        (**self).pointer_up()
    }

    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<()> {
        (**self).move_relative(dx, dy)
    }

    fn key_down(&mut self, key: Key) -> Result<()> {
        (**self).key_down(key)
    }

    fn key_up(&mut self, key: Key) -> Result<()> {
        (**self).key_up(key)
    }

    fn pause(&mut self, duration: Duration) {
        (**self).pause(duration)
    }
}

/// Opens the actuator that drives the real pointer and keyboard.
#[cfg(windows)]
pub fn open_system_actuator() -> Result<Box<dyn InputActuator>> {
    Ok(Box::new(sendinput::SendInputActuator::new()))
}

/// Opens the actuator that drives the real pointer and keyboard.
#[cfg(not(windows))]
pub fn open_system_actuator() -> Result<Box<dyn InputActuator>> {
    Err(anyhow::anyhow!(
        "System input injection is only supported on Windows; use --dry-run"
    ))
}
