//! Sound effects and the custom fire sound
//!
//! The simulation only reports what happened ([`GameEvent`]); this module
//! decides what it sounds like. On the web the effects are synthesized with
//! Web Audio oscillators, and the fire sound can be replaced by audio returned
//! from an external sound service.

#[cfg(target_arch = "wasm32")]
pub mod service;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

use crate::error::SoundServiceError;
use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Projectile fired
    Fire,
    /// Saucer or small asteroid destroyed
    Explosion,
    /// Asteroid broke in two
    Split,
    LevelUp,
    GameOver,
    /// Final score made the leaderboard
    HighScore,
}

impl SoundEffect {
    /// Effect for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Fired => Some(SoundEffect::Fire),
            GameEvent::TargetDestroyed { .. } => Some(SoundEffect::Explosion),
            GameEvent::AsteroidSplit { .. } => Some(SoundEffect::Split),
            GameEvent::LevelChanged { .. } => Some(SoundEffect::LevelUp),
            GameEvent::GameOver { .. } => Some(SoundEffect::GameOver),
            GameEvent::ScoreChanged { .. } => None,
        }
    }
}

/// What to send to the sound service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundRequest {
    /// Recorded audio (e.g. a voice description of the sound)
    Clip(Vec<u8>),
    /// Text description of the sound
    Text(String),
}

impl SoundRequest {
    /// Multipart field the service reads
    pub fn field_name(&self) -> &'static str {
        match self {
            SoundRequest::Clip(_) => "audio",
            SoundRequest::Text(_) => "text",
        }
    }

    /// Reject requests the service would refuse anyway
    pub fn validate(self) -> Result<Self, SoundServiceError> {
        let empty = match &self {
            SoundRequest::Clip(bytes) => bytes.is_empty(),
            SoundRequest::Text(text) => text.trim().is_empty(),
        };
        if empty {
            Err(SoundServiceError::EmptyRequest)
        } else {
            Ok(self)
        }
    }
}

/// Which fire sound is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireSound<'a, B> {
    /// Built-in synthesized shot
    Default,
    Custom(&'a B),
}

/// Holds the custom fire sound and applies service results to it
///
/// A failed request never disturbs the sound already in place: the player
/// keeps hearing the previous custom sound, or the default if there is none.
#[derive(Debug)]
pub struct FireSoundSlot<B> {
    custom: Option<B>,
    pending: u32,
}

impl<B> Default for FireSoundSlot<B> {
    fn default() -> Self {
        Self {
            custom: None,
            pending: 0,
        }
    }
}

impl<B> FireSoundSlot<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> FireSound<'_, B> {
        match &self.custom {
            Some(buffer) => FireSound::Custom(buffer),
            None => FireSound::Default,
        }
    }

    /// A request was sent
    pub fn begin_request(&mut self) {
        self.pending += 1;
    }

    /// Requests still in flight
    pub fn is_pending(&self) -> bool {
        self.pending > 0
    }

    /// Apply a finished request; returns whether the sound changed
    pub fn complete(&mut self, result: Result<B, SoundServiceError>) -> bool {
        self.pending = self.pending.saturating_sub(1);
        match result {
            Ok(buffer) => {
                log::info!("Custom fire sound installed");
                self.custom = Some(buffer);
                true
            }
            Err(e) => {
                let keeping = if self.custom.is_some() {
                    "previous custom"
                } else {
                    "default"
                };
                log::warn!("Fire sound request failed ({}), keeping {} sound", e, keeping);
                false
            }
        }
    }

    /// Back to the built-in sound
    pub fn reset(&mut self) {
        self.custom = None;
    }
}
