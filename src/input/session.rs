//! Scoped input session with randomized pacing.
//!
//! A session borrows an actuator for the duration of one interaction. Every
//! pointer button or key it presses is tracked, and whatever is still held
//! when the session ends (normally or through an error) is released on drop.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use super::keys::strokes_for;
use super::{InputActuator, Key};
use crate::config::{DelayRange, InputConfig};
use crate::slider::TrajectoryPlan;

pub struct InputSession<'a, A: InputActuator + ?Sized> {
    actuator: &'a mut A,
    config: InputConfig,
    rng: StdRng,
    pointer_held: bool,
    held_keys: Vec<Key>,
}

impl<'a, A: InputActuator + ?Sized> InputSession<'a, A> {
    pub fn new(actuator: &'a mut A, config: &InputConfig) -> Self {
        Self::with_rng(actuator, config, StdRng::from_entropy())
    }

    /// Session with reproducible pauses.
    pub fn with_seed(actuator: &'a mut A, config: &InputConfig, seed: u64) -> Self {
        Self::with_rng(actuator, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(actuator: &'a mut A, config: &InputConfig, rng: StdRng) -> Self {
        Self {
            actuator,
            config: config.clone(),
            rng,
            pointer_held: false,
            held_keys: Vec::new(),
        }
    }

    /// Pauses for a fixed number of milliseconds.
    pub fn wait(&mut self, ms: u64) {
        self.actuator.pause(Duration::from_millis(ms));
    }

    /// Pauses for the configured pre-typing settle time.
    pub fn settle(&mut self) {
        self.random_pause(self.config.settle_delay_ms);
    }

    /// Pauses for the configured time after a keyboard layout switch.
    pub fn after_layout_switch(&mut self) {
        self.random_pause(self.config.layout_switch_delay_ms);
    }

    /// Presses the pointer, moves along every forward and back step with a
    /// random pause after each, and releases.
    pub fn drag(&mut self, plan: &TrajectoryPlan) -> Result<()> {
        self.actuator.pointer_down().context("Pointer down failed")?;
        self.pointer_held = true;

        let steps = plan.forward_tracks.iter().chain(&plan.back_tracks);
        for (i, &dx) in steps.enumerate() {
            self.actuator
                .move_relative(dx, 0)
                .with_context(|| format!("Move {} of {} failed", i + 1, plan.len()))?;
            self.random_pause(self.config.step_delay_ms);
        }

        self.actuator.pointer_up().context("Pointer up failed")?;
        self.pointer_held = false;

        crate::log(&format!(
            "Drag complete: {} steps, net {} px",
            plan.len(),
            plan.net_displacement()
        ));
        Ok(())
    }

    /// Types `text` key by key, holding Shift where the layout needs it.
    ///
    /// The whole text is mapped before the first key goes down, so
    /// untypeable input fails without sending anything.
    pub fn type_text(&mut self, text: &str) -> Result<()> {
        let strokes = strokes_for(text)?;

        for stroke in strokes {
            if stroke.shifted {
                self.press(Key::Shift)?;
            }
            self.press(Key::Char(stroke.key))?;
            self.release(Key::Char(stroke.key))?;
            if stroke.shifted {
                self.release(Key::Shift)?;
            }
            self.random_pause(self.config.key_delay_ms);
        }

        crate::log(&format!("Typed {} characters", text.chars().count()));
        Ok(())
    }

    /// Releases the pointer button and all keys still held.
    pub fn release_all(&mut self) -> Result<()> {
        while let Some(key) = self.held_keys.pop() {
            self.actuator
                .key_up(key)
                .with_context(|| format!("Failed to release {:?}", key))?;
        }
        if self.pointer_held {
            self.actuator.pointer_up().context("Failed to release pointer")?;
            self.pointer_held = false;
        }
        Ok(())
    }

    fn press(&mut self, key: Key) -> Result<()> {
        self.actuator
            .key_down(key)
            .with_context(|| format!("Key down {:?} failed", key))?;
        self.held_keys.push(key);
        Ok(())
    }

    fn release(&mut self, key: Key) -> Result<()> {
        self.actuator
            .key_up(key)
            .with_context(|| format!("Key up {:?} failed", key))?;
        if let Some(pos) = self.held_keys.iter().rposition(|&k| k == key) {
            self.held_keys.remove(pos);
        }
        Ok(())
    }

    fn random_pause(&mut self, range: DelayRange) {
        let range = range.ordered();
        let ms = self.rng.gen_range(range.min..=range.max);
        self.actuator.pause(Duration::from_millis(ms));
    }
}

impl<A: InputActuator + ?Sized> Drop for InputSession<'_, A> {
    fn drop(&mut self) {
        if !self.pointer_held && self.held_keys.is_empty() {
            return;
        }
        crate::log("Input session ended with input held, releasing");
        if let Err(e) = self.release_all() {
            crate::log(&format!("Release on drop failed: {:#}", e));
        }
    }
}
