//! Keyboard state
//!
//! Browser key events update a [`KeyState`]; the frame driver takes one
//! [`TickInput`] snapshot per tick so a tick never sees input change mid-way.

use crate::sim::TickInput;

/// Game actions bound to keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    RotateLeft,
    RotateRight,
    Thrust,
    Fire,
    /// Toggle sound
    Mute,
}

impl Key {
    /// Map a `KeyboardEvent.key` value to an action
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "ArrowLeft" | "a" | "A" => Some(Key::RotateLeft),
            "ArrowRight" | "d" | "D" => Some(Key::RotateRight),
            "ArrowUp" | "w" | "W" => Some(Key::Thrust),
            " " | "Spacebar" => Some(Key::Fire),
            "m" | "M" => Some(Key::Mute),
            _ => None,
        }
    }
}

/// Held keys plus the one-shot fire latch
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    rotate_left: bool,
    rotate_right: bool,
    thrust: bool,
    fire_held: bool,
    fire_pending: bool,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press; returns the action so the host can suppress the
    /// browser default (scrolling on arrows and space)
    ///
    /// Auto-repeat never re-arms fire: one projectile per physical press.
    pub fn key_down(&mut self, name: &str, repeat: bool) -> Option<Key> {
        let key = Key::from_key_name(name)?;
        match key {
            Key::RotateLeft => self.rotate_left = true,
            Key::RotateRight => self.rotate_right = true,
            Key::Thrust => self.thrust = true,
            Key::Fire => {
                if !repeat && !self.fire_held {
                    self.fire_pending = true;
                }
                self.fire_held = true;
            }
            Key::Mute => {
                if repeat {
                    return None;
                }
            }
        }
        Some(key)
    }

    pub fn key_up(&mut self, name: &str) -> Option<Key> {
        let key = Key::from_key_name(name)?;
        match key {
            Key::RotateLeft => self.rotate_left = false,
            Key::RotateRight => self.rotate_right = false,
            Key::Thrust => self.thrust = false,
            Key::Fire => self.fire_held = false,
            Key::Mute => {}
        }
        Some(key)
    }

    /// Window lost focus: key-up events will never arrive
    pub fn release_all(&mut self) {
        *self = Self::default();
    }

    /// Snapshot for the next tick; consumes a pending shot
    pub fn take_tick_input(&mut self) -> TickInput {
        let input = TickInput {
            rotate_left: self.rotate_left,
            rotate_right: self.rotate_right,
            thrust: self.thrust,
            fire: self.fire_pending,
        };
        self.fire_pending = false;
        input
    }
}
