//! Data-driven game balance
//!
//! Every gameplay constant the simulation reads lives in [`Tuning`]. Missing
//! keys in a JSON override fall back to the defaults below, so a page can
//! override just the values it cares about.

use serde::{Deserialize, Serialize};

use crate::error::TuningError;

/// Minimum spawn distance between a new target and the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SafeDistance {
    /// Fixed distance in pixels
    Fixed(f32),
    /// Fraction of the smaller canvas dimension
    FractionOfMinDimension(f32),
}

impl SafeDistance {
    /// Resolve to pixels for a given canvas
    pub fn resolve(&self, width: f32, height: f32) -> f32 {
        match *self {
            SafeDistance::Fixed(px) => px,
            SafeDistance::FractionOfMinDimension(fraction) => fraction * width.min(height),
        }
    }
}

/// Whether forward thrust changes the craft's velocity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ThrustPolicy {
    /// Rotation only; the craft keeps whatever velocity it has (zero at start)
    Disabled,
    /// Thrust adds `acceleration` px/tick² along the facing while held
    Enabled { acceleration: f32 },
}

/// Gameplay tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Player ===
    /// Visual scale of the craft (radius = 30 × scale)
    pub player_scale: f32,
    /// Nominal craft speed scalar
    pub player_speed: f32,
    /// Radians turned per tick while a rotate key is held
    pub rotation_step: f32,
    pub thrust: ThrustPolicy,

    // === Projectiles ===
    pub projectile_speed: f32,
    pub projectile_radius: f32,

    // === Targets ===
    /// Live-target cap
    pub max_targets: usize,
    /// Targets placed by the spawner when a session starts
    pub initial_targets: usize,
    /// Per-tick probability of a spawn while below the cap
    pub spawn_chance: f32,
    /// Probability that a spawned target is an asteroid (else a saucer)
    pub asteroid_ratio: f32,
    pub asteroid_radius_min: f32,
    pub asteroid_radius_max: f32,
    /// Asteroids at or below this radius are destroyed instead of split
    pub split_min_radius: f32,
    pub saucer_radius: f32,
    /// Target speed before level scaling (px/tick)
    pub target_base_speed: f32,
    /// Speed multiplier gained per level (`1 + level × k`)
    pub level_speed_factor: f32,
    /// Upper bound of the random speed added to each new target
    pub speed_jitter: f32,

    // === Arena ===
    /// Distance outside the canvas edge at which targets appear
    pub spawn_offset: f32,
    /// Targets beyond the canvas plus this margin are culled
    pub cull_margin: f32,
    /// Projectiles beyond the canvas plus this margin are culled
    pub projectile_cull_margin: f32,
    pub safe_distance: SafeDistance,

    // === Progression ===
    /// Seconds between level increments
    pub level_interval_secs: u32,
    pub max_level: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_scale: 1.0,
            player_speed: 3.0,
            rotation_step: 0.1,
            thrust: ThrustPolicy::Enabled { acceleration: 0.1 },

            projectile_speed: 5.0,
            projectile_radius: 3.0,

            max_targets: 5,
            initial_targets: 3,
            spawn_chance: 0.02,
            asteroid_ratio: 0.7,
            asteroid_radius_min: 20.0,
            asteroid_radius_max: 40.0,
            split_min_radius: 20.0,
            saucer_radius: 25.0,
            target_base_speed: 2.0,
            level_speed_factor: 0.1,
            speed_jitter: 0.5,

            spawn_offset: 40.0,
            cull_margin: 50.0,
            projectile_cull_margin: 0.0,
            safe_distance: SafeDistance::Fixed(100.0),

            level_interval_secs: 30,
            max_level: 10,
        }
    }
}

fn check(name: &'static str, value: f32, ok: bool, expected: &'static str) -> Result<(), TuningError> {
    if ok {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            name,
            value,
            expected,
        })
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would break simulation invariants
    pub fn validate(&self) -> Result<(), TuningError> {
        check("player_scale", self.player_scale, self.player_scale > 0.0, "(0, ∞)")?;
        check("player_speed", self.player_speed, self.player_speed >= 0.0, "[0, ∞)")?;
        check(
            "rotation_step",
            self.rotation_step,
            (0.0..=std::f32::consts::PI).contains(&self.rotation_step),
            "[0, π]",
        )?;
        if let ThrustPolicy::Enabled { acceleration } = self.thrust {
            check("thrust.acceleration", acceleration, acceleration >= 0.0, "[0, ∞)")?;
        }
        check("projectile_speed", self.projectile_speed, self.projectile_speed >= 0.0, "[0, ∞)")?;
        check("projectile_radius", self.projectile_radius, self.projectile_radius > 0.0, "(0, ∞)")?;
        check("spawn_chance", self.spawn_chance, (0.0..=1.0).contains(&self.spawn_chance), "[0, 1]")?;
        check(
            "asteroid_ratio",
            self.asteroid_ratio,
            (0.0..=1.0).contains(&self.asteroid_ratio),
            "[0, 1]",
        )?;
        check(
            "asteroid_radius_min",
            self.asteroid_radius_min,
            self.asteroid_radius_min > 0.0,
            "(0, ∞)",
        )?;
        check(
            "asteroid_radius_max",
            self.asteroid_radius_max,
            self.asteroid_radius_max >= self.asteroid_radius_min,
            "[asteroid_radius_min, ∞)",
        )?;
        check("split_min_radius", self.split_min_radius, self.split_min_radius > 0.0, "(0, ∞)")?;
        check("saucer_radius", self.saucer_radius, self.saucer_radius > 0.0, "(0, ∞)")?;
        check(
            "target_base_speed",
            self.target_base_speed,
            self.target_base_speed >= 0.0,
            "[0, ∞)",
        )?;
        check(
            "level_speed_factor",
            self.level_speed_factor,
            self.level_speed_factor >= 0.0,
            "[0, ∞)",
        )?;
        check("speed_jitter", self.speed_jitter, self.speed_jitter >= 0.0, "[0, ∞)")?;
        check("cull_margin", self.cull_margin, self.cull_margin > 0.0, "(0, ∞)")?;
        check(
            "projectile_cull_margin",
            self.projectile_cull_margin,
            self.projectile_cull_margin >= 0.0,
            "[0, ∞)",
        )?;
        check(
            "initial_targets",
            self.initial_targets as f32,
            self.initial_targets <= self.max_targets,
            "[0, max_targets]",
        )?;
        check(
            "spawn_offset",
            self.spawn_offset,
            self.spawn_offset >= 0.0 && self.spawn_offset < self.cull_margin,
            "[0, cull_margin)",
        )?;
        let safe = match self.safe_distance {
            SafeDistance::Fixed(px) => px,
            SafeDistance::FractionOfMinDimension(fraction) => fraction,
        };
        check("safe_distance", safe, safe >= 0.0, "[0, ∞)")?;
        check(
            "level_interval_secs",
            self.level_interval_secs as f32,
            self.level_interval_secs > 0,
            "[1, ∞)",
        )?;
        check("max_level", self.max_level as f32, self.max_level >= 1, "[1, ∞)")?;
        Ok(())
    }

    /// Player craft collision radius
    pub fn player_radius(&self) -> f32 {
        crate::consts::PLAYER_BASE_RADIUS * self.player_scale
    }

    /// Element id of the inline JSON override
    #[allow(dead_code)]
    const ELEMENT_ID: &'static str = "tuning";

    /// Load tuning from the page's inline `<script id="tuning">` JSON (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let text = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::ELEMENT_ID))
            .and_then(|el| el.text_content());

        match text {
            Some(json) if !json.trim().is_empty() => match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning overrides from page");
                    tuning
                }
                Err(e) => {
                    log::warn!("Ignoring tuning overrides: {}", e);
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
