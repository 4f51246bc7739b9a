//! Actuator that records events instead of injecting them.

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::time::Duration;

use super::{InputActuator, Key};

/// One recorded input event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown,
    PointerUp,
    Move { dx: i32, dy: i32 },
    KeyDown { key: String },
    KeyUp { key: String },
    Pause { ms: u64 },
}

fn key_name(key: Key) -> String {
    match key {
        Key::Shift => "Shift".to_string(),
        Key::Char(c) => c.to_string(),
    }
}

/// Records every event; pauses are recorded, not slept.
#[derive(Debug, Default)]
pub struct RecordingActuator {
    pub events: Vec<InputEvent>,
    fail_after: Option<usize>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every fallible call once `n` events have been recorded.
    pub fn failing_after(n: usize) -> Self {
        Self {
            events: Vec::new(),
            fail_after: Some(n),
        }
    }

    /// Events other than pauses.
    pub fn actions(&self) -> impl Iterator<Item = &InputEvent> {
        self.events
            .iter()
            .filter(|e| !matches!(e, InputEvent::Pause { .. }))
    }

    /// Sum of all recorded pauses.
    pub fn total_pause(&self) -> Duration {
        self.events
            .iter()
            .map(|e| match e {
                InputEvent::Pause { ms } => Duration::from_millis(*ms),
                _ => Duration::ZERO,
            })
            .sum()
    }

    /// Net horizontal pointer displacement.
    pub fn net_dx(&self) -> i32 {
        self.events
            .iter()
            .map(|e| match e {
                InputEvent::Move { dx, .. } => *dx,
                _ => 0,
            })
            .sum()
    }

    fn record(&mut self, event: InputEvent) -> Result<()> {
        // Releases always go through so cleanup stays observable.
        let is_release = matches!(event, InputEvent::PointerUp | InputEvent::KeyUp { .. });
        if let Some(limit) = self.fail_after {
            if self.events.len() >= limit && !is_release {
                return Err(anyhow!("Simulated device failure at {:?}", event));
            }
        }
        self.events.push(event);
        Ok(())
    }
}

impl InputActuator for RecordingActuator {
    fn pointer_down(&mut self) -> Result<()> {
        self.record(InputEvent::PointerDown)
    }

    fn pointer_up(&mut self) -> Result<()> {
        self.record(InputEvent::PointerUp)
    }

    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<()> {
        self.record(InputEvent::Move { dx, dy })
    }

    fn key_down(&mut self, key: Key) -> Result<()> {
        self.record(InputEvent::KeyDown { key: key_name(key) })
    }

    fn key_up(&mut self, key: Key) -> Result<()> {
        self.record(InputEvent::KeyUp { key: key_name(key) })
    }

    fn pause(&mut self, duration: Duration) {
        self.events.push(InputEvent::Pause {
            ms: duration.as_millis() as u64,
        });
    }
}
