//! Game state and core simulation types
//!
//! The frame driver owns one [`GameState`] per session and is the only thing
//! that mutates the player and the entity collections.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Running,
    /// Player was hit; frozen until restart
    GameOver,
}

/// Shared kinematic record for every entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Collision and draw extent
    pub radius: f32,
    /// Nominal speed scalar
    pub speed: f32,
}

impl Body {
    pub fn new(pos: Vec2, radius: f32, speed: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
            speed,
        }
    }

    /// Advance position by one tick of velocity
    #[inline]
    pub fn advance(&mut self) {
        self.pos += self.vel;
    }
}

/// The player's craft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    /// Facing (radians, screen space: 0 = right, -π/2 = up)
    pub angle: f32,
    pub scale: f32,
}

impl Player {
    /// Unit vector along the current facing
    #[inline]
    pub fn facing(&self) -> Vec2 {
        Vec2::new(self.angle.cos(), self.angle.sin())
    }

    /// Point where projectiles leave the craft
    #[inline]
    pub fn nose(&self) -> Vec2 {
        self.body.pos + self.facing() * self.body.radius
    }
}

/// Target types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    /// Splits into two halves when shot (above the split radius)
    Asteroid,
    /// Fixed size, destroyed outright
    Saucer,
}

impl TargetKind {
    /// Whether a target of this kind and radius breaks into two when shot
    pub fn splits_at(&self, radius: f32, split_min_radius: f32) -> bool {
        match self {
            TargetKind::Asteroid => radius > split_min_radius,
            TargetKind::Saucer => false,
        }
    }
}

/// A destructible obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: u32,
    pub kind: TargetKind,
    pub body: Body,
    pub scale: f32,
}

/// A shot fired by the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub body: Body,
}

/// Notifications for presentation (HUD, audio)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreChanged { score: u64 },
    LevelChanged { level: u32 },
    GameOver { final_score: u64, elapsed_secs: u32 },
    /// A projectile left the craft
    Fired,
    TargetDestroyed { kind: TargetKind, pos: Vec2 },
    /// An asteroid broke into two smaller ones
    AsteroidSplit { pos: Vec2 },
}

/// Subscriber for session callbacks
///
/// All methods default to no-ops so presentation layers only implement what
/// they display.
pub trait SessionObserver {
    fn on_score_change(&mut self, _score: u64) {}
    fn on_level_change(&mut self, _level: u32) {}
    fn on_game_over(&mut self, _final_score: u64, _elapsed_secs: u32) {}
    fn on_fire(&mut self) {}
    fn on_target_destroyed(&mut self, _kind: TargetKind, _split: bool) {}
}

/// Canvas extent the session plays in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
        }
    }
}

impl Arena {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// True if `pos` lies beyond the canvas plus `margin` on any side
    pub fn is_outside(&self, pos: Vec2, margin: f32) -> bool {
        pos.x < -margin
            || pos.x > self.width + margin
            || pos.y < -margin
            || pos.y > self.height + margin
    }
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub arena: Arena,
    pub phase: GamePhase,
    pub score: u64,
    /// Wall-clock seconds survived
    pub elapsed_secs: u32,
    pub level: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub player: Player,
    /// Live targets (insertion order)
    pub targets: Vec<Target>,
    /// Live projectiles (insertion order)
    pub projectiles: Vec<Projectile>,
    /// Pending notifications, drained by the host
    pub events: Vec<GameEvent>,
    pub(crate) rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// Create a new session with the given seed
    pub fn new(seed: u64, arena: Arena, tuning: Tuning) -> Self {
        let player = super::factory::create_player(arena.center(), &tuning);
        let mut state = Self {
            seed,
            tuning,
            arena,
            phase: GamePhase::Running,
            score: 0,
            elapsed_secs: 0,
            level: 1,
            time_ticks: 0,
            player,
            targets: Vec::new(),
            projectiles: Vec::new(),
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        };

        // Never start above the live-target cap
        let initial = state.tuning.initial_targets.min(state.tuning.max_targets);
        for _ in 0..initial {
            if let Some(target) = super::spawner::spawn_target(&mut state) {
                state.targets.push(target);
            }
        }

        state
    }

    /// Reset everything for a fresh session, keeping arena and tuning
    pub fn restart(&mut self, seed: u64) {
        *self = Self::new(seed, self.arena, self.tuning.clone());
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    /// One wall-clock second passed (host interval timer)
    pub fn on_second_elapsed(&mut self) {
        if self.is_running() {
            self.elapsed_secs += 1;
        }
    }

    /// Level cadence fired (host interval timer)
    pub fn on_level_timer(&mut self) {
        if self.is_running() && self.level < self.tuning.max_level {
            self.level += 1;
            log::info!("Level up: {}", self.level);
            self.events.push(GameEvent::LevelChanged { level: self.level });
        }
    }

    /// Add the per-target reward
    pub(crate) fn award_target(&mut self) {
        self.score += SCORE_PER_TARGET;
        self.events.push(GameEvent::ScoreChanged { score: self.score });
    }

    /// Enter the terminal phase
    pub(crate) fn end_session(&mut self) {
        if self.is_running() {
            self.phase = GamePhase::GameOver;
            log::info!(
                "Game over: score {} after {}s (level {})",
                self.score,
                self.elapsed_secs,
                self.level
            );
            self.events.push(GameEvent::GameOver {
                final_score: self.score,
                elapsed_secs: self.elapsed_secs,
            });
        }
    }

    /// Hand queued events to an observer, oldest first
    pub fn dispatch_events(&mut self, observer: &mut impl SessionObserver) {
        for event in self.events.drain(..) {
            match event {
                GameEvent::ScoreChanged { score } => observer.on_score_change(score),
                GameEvent::LevelChanged { level } => observer.on_level_change(level),
                GameEvent::GameOver {
                    final_score,
                    elapsed_secs,
                } => observer.on_game_over(final_score, elapsed_secs),
                GameEvent::Fired => observer.on_fire(),
                GameEvent::TargetDestroyed { kind, .. } => observer.on_target_destroyed(kind, false),
                GameEvent::AsteroidSplit { .. } => {
                    observer.on_target_destroyed(TargetKind::Asteroid, true)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_state() -> GameState {
        let tuning = Tuning {
            initial_targets: 0,
            spawn_chance: 0.0,
            ..Default::default()
        };
        GameState::new(7, Arena::default(), tuning)
    }

    #[test]
    fn test_new_session() {
        let state = GameState::new(42, Arena::default(), Tuning::default());
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 0);
        assert_eq!(state.level, 1);
        assert_eq!(state.player.body.pos, Vec2::new(400.0, 300.0));
        assert_eq!(state.player.body.radius, 30.0);
        assert!(state.targets.len() <= state.tuning.initial_targets);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_initial_targets_respect_cap() {
        let tuning = Tuning {
            initial_targets: 12,
            max_targets: 5,
            ..Default::default()
        };
        let state = GameState::new(3, Arena::default(), tuning);
        assert!(state.targets.len() <= 5);
    }

    #[test]
    fn test_level_timer_clamps() {
        let mut state = quiet_state();
        for _ in 0..50 {
            state.on_level_timer();
        }
        assert_eq!(state.level, state.tuning.max_level);
        let level_events = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::LevelChanged { .. }))
            .count();
        assert_eq!(level_events as u32, state.tuning.max_level - 1);
    }

    #[test]
    fn test_timers_freeze_after_game_over() {
        let mut state = quiet_state();
        state.on_second_elapsed();
        state.end_session();
        state.on_second_elapsed();
        state.on_level_timer();
        assert_eq!(state.elapsed_secs, 1);
        assert_eq!(state.level, 1);
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut state = quiet_state();
        state.award_target();
        state.on_level_timer();
        state.on_second_elapsed();
        state.end_session();

        state.restart(99);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 0);
        assert_eq!(state.level, 1);
        assert_eq!(state.elapsed_secs, 0);
        assert_eq!(state.seed, 99);
        assert!(state.events.is_empty());
    }

    #[derive(Default)]
    struct Recorder {
        scores: Vec<u64>,
        game_over: Option<(u64, u32)>,
    }

    impl SessionObserver for Recorder {
        fn on_score_change(&mut self, score: u64) {
            self.scores.push(score);
        }
        fn on_game_over(&mut self, final_score: u64, elapsed_secs: u32) {
            self.game_over = Some((final_score, elapsed_secs));
        }
    }

    #[test]
    fn test_dispatch_events_drains_in_order() {
        let mut state = quiet_state();
        state.award_target();
        state.award_target();
        state.on_second_elapsed();
        state.end_session();
        state.end_session();

        let mut recorder = Recorder::default();
        state.dispatch_events(&mut recorder);
        assert_eq!(recorder.scores, vec![10, 20]);
        assert_eq!(recorder.game_over, Some((20, 1)));
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_only_large_asteroids_split() {
        assert!(TargetKind::Asteroid.splits_at(30.0, 20.0));
        assert!(!TargetKind::Asteroid.splits_at(20.0, 20.0));
        assert!(!TargetKind::Saucer.splits_at(40.0, 20.0));
    }
}
