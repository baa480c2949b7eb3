//! Space Defender - A browser arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, movement, collisions, session state)
//! - `tuning`: Data-driven game balance
//! - `platform`: Browser input and session lifecycle
//! - `renderer`: WebGPU rendering of frame snapshots
//! - `audio`: Sound effects and the custom fire-sound boundary

pub mod audio;
pub mod error;
pub mod highscores;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{SoundServiceError, TuningError};
pub use highscores::HighScores;
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one tick per 60 Hz frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Logical canvas dimensions
    pub const CANVAS_WIDTH: f32 = 800.0;
    pub const CANVAS_HEIGHT: f32 = 600.0;

    /// Player craft radius at scale 1.0
    pub const PLAYER_BASE_RADIUS: f32 = 30.0;
    /// Player craft facing at session start (straight up, screen y grows down)
    pub const PLAYER_START_ANGLE: f32 = -std::f32::consts::FRAC_PI_2;

    /// Points awarded per destroyed target
    pub const SCORE_PER_TARGET: u64 = 10;

    /// Rejection-sampling cap for spawn placement
    pub const MAX_SPAWN_ATTEMPTS: u32 = 64;
}

/// Normalized angle to [-π, π)
///
/// Constant time for any finite input; `rem_euclid` may round up to `TAU`,
/// which folds back to `-π`.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped >= PI { -PI } else { wrapped }
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Wrap a coordinate into [0, extent)
///
/// `rem_euclid` can round tiny negative inputs up to exactly `extent`, so that
/// case folds back to zero.
#[inline]
pub fn wrap_coordinate(value: f32, extent: f32) -> f32 {
    let wrapped = value.rem_euclid(extent);
    if wrapped >= extent { 0.0 } else { wrapped }
}

/// Format elapsed seconds as `mm:ss`
pub fn format_elapsed(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
