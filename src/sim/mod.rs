//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (velocities are px/tick)
//! - Seeded RNG only
//! - Stable iteration order (insertion order, reverse scans for removal)
//! - No rendering or platform dependencies

pub mod collision;
pub mod factory;
pub mod frame;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::{circles_overlap, cull_offscreen, player_collision, resolve_projectile_hits};
pub use factory::{create_player, create_projectile, create_target, level_speed, split_asteroid};
pub use frame::{FrameSnapshot, FrameView, RenderSink};
pub use spawner::{maybe_spawn, spawn_position, spawn_target};
pub use state::{
    Arena, Body, GameEvent, GamePhase, GameState, Player, Projectile, SessionObserver, Target,
    TargetKind,
};
pub use tick::{TickInput, integrate, tick};
