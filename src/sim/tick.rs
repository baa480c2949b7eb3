//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Velocities are
//! in pixels per tick, so the host must call [`tick`] at a fixed rate.

use super::collision::{cull_offscreen, player_collision, resolve_projectile_hits};
use super::factory::create_projectile;
use super::frame::RenderSink;
use super::spawner::maybe_spawn;
use super::state::{GameEvent, GameState};
use crate::tuning::ThrustPolicy;
use crate::{normalize_angle, wrap_coordinate};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Rotate counter-clockwise (held)
    pub rotate_left: bool,
    /// Rotate clockwise (held)
    pub rotate_right: bool,
    /// Accelerate along the facing (held)
    pub thrust: bool,
    /// Fire one projectile (edge-triggered by the input layer)
    pub fire: bool,
}

/// Advance the game state by one fixed timestep
///
/// Order: steer and fire, integrate, present, projectile hits, player hit,
/// cull, spawn. Nothing happens once the session is over.
pub fn tick(state: &mut GameState, input: &TickInput, sink: &mut impl RenderSink) {
    if !state.is_running() {
        return;
    }
    state.time_ticks += 1;

    let thrusting = steer(state, input);

    if input.fire {
        let id = state.next_entity_id();
        let shot = create_projectile(id, &state.player, &state.tuning);
        state.projectiles.push(shot);
        state.events.push(GameEvent::Fired);
    }

    integrate(state);

    let mut frame = state.frame();
    frame.thrusting = thrusting;
    sink.present(&frame);

    resolve_projectile_hits(state);

    if let Some(index) = player_collision(&state.player, &state.targets) {
        log::info!(
            "Player hit by {:?} #{}",
            state.targets[index].kind,
            state.targets[index].id
        );
        state.end_session();
        return;
    }

    cull_offscreen(state);
    maybe_spawn(state);
}

/// Apply rotation and thrust; returns whether thrust was applied
fn steer(state: &mut GameState, input: &TickInput) -> bool {
    let player = &mut state.player;
    let step = state.tuning.rotation_step;
    if input.rotate_left {
        player.angle = normalize_angle(player.angle - step);
    }
    if input.rotate_right {
        player.angle = normalize_angle(player.angle + step);
    }

    match state.tuning.thrust {
        ThrustPolicy::Enabled { acceleration } if input.thrust => {
            let facing = player.facing();
            player.body.vel =
                (player.body.vel + facing * acceleration).clamp_length_max(player.body.speed);
            true
        }
        _ => false,
    }
}

/// Move every entity by its velocity; the player wraps around the canvas
pub fn integrate(state: &mut GameState) {
    let arena = state.arena;

    let body = &mut state.player.body;
    body.advance();
    body.pos.x = wrap_coordinate(body.pos.x, arena.width);
    body.pos.y = wrap_coordinate(body.pos.y, arena.height);

    for target in &mut state.targets {
        target.body.advance();
    }
    for shot in &mut state.projectiles {
        shot.body.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::factory::create_target;
    use crate::sim::frame::FrameSnapshot;
    use crate::sim::state::{Arena, GamePhase, TargetKind};
    use crate::tuning::Tuning;
    use glam::Vec2;

    fn quiet_state() -> GameState {
        let tuning = Tuning {
            initial_targets: 0,
            spawn_chance: 0.0,
            ..Default::default()
        };
        GameState::new(12345, Arena::default(), tuning)
    }

    fn push_target(state: &mut GameState, kind: TargetKind, pos: Vec2, radius: f32, vel: Vec2) {
        let id = state.next_entity_id();
        let mut target = create_target(id, kind, pos, 1, &state.tuning, &mut state.rng);
        target.body.radius = radius;
        target.body.vel = vel;
        target.body.speed = vel.length();
        state.targets.push(target);
    }

    #[test]
    fn test_idle_tick_leaves_player_at_rest() {
        let mut state = quiet_state();
        tick(&mut state, &TickInput::default(), &mut ());
        assert_eq!(state.time_ticks, 1);
        assert_eq!(state.player.body.pos, Vec2::new(400.0, 300.0));
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_rotation_steps() {
        let mut state = quiet_state();
        let start = state.player.angle;
        let right = TickInput {
            rotate_right: true,
            ..Default::default()
        };
        for _ in 0..5 {
            tick(&mut state, &right, &mut ());
        }
        assert!((state.player.angle - (start + 0.5)).abs() < 1e-5);

        let both = TickInput {
            rotate_left: true,
            rotate_right: true,
            ..Default::default()
        };
        tick(&mut state, &both, &mut ());
        assert!((state.player.angle - (start + 0.5)).abs() < 1e-5);
    }

    #[test]
    fn test_thrust_accelerates_along_facing() {
        let mut state = quiet_state();
        let thrust = TickInput {
            thrust: true,
            ..Default::default()
        };
        tick(&mut state, &thrust, &mut ());
        assert!((state.player.body.vel - Vec2::new(0.0, -0.1)).length() < 1e-5);

        for _ in 0..200 {
            tick(&mut state, &thrust, &mut ());
        }
        assert!(state.player.body.vel.length() <= state.tuning.player_speed + 1e-4);
    }

    #[test]
    fn test_thrust_disabled_keeps_player_still() {
        let mut state = GameState::new(
            1,
            Arena::default(),
            Tuning {
                thrust: ThrustPolicy::Disabled,
                initial_targets: 0,
                spawn_chance: 0.0,
                ..Default::default()
            },
        );
        let thrust = TickInput {
            thrust: true,
            ..Default::default()
        };
        for _ in 0..10 {
            tick(&mut state, &thrust, &mut ());
        }
        assert_eq!(state.player.body.pos, Vec2::new(400.0, 300.0));
    }

    #[test]
    fn test_fire_spawns_projectile_and_event() {
        let mut state = quiet_state();
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &fire, &mut ());
        assert_eq!(state.projectiles.len(), 1);
        // Spawned at the nose (y = 270) then integrated once
        assert!((state.projectiles[0].body.pos - Vec2::new(400.0, 265.0)).length() < 1e-4);
        assert!(state.events.contains(&GameEvent::Fired));
    }

    #[test]
    fn test_projectile_culled_after_leaving_canvas() {
        let mut state = quiet_state();
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &fire, &mut ());
        // From y=265 moving 5/tick, sits on the top edge after 53 more ticks
        for _ in 0..53 {
            tick(&mut state, &TickInput::default(), &mut ());
        }
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.projectiles[0].body.pos.y, 0.0);
        tick(&mut state, &TickInput::default(), &mut ());
        assert!(state.projectiles.is_empty());
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_player_wraps() {
        let mut state = quiet_state();
        state.player.body.pos = Vec2::new(799.0, 1.0);
        state.player.body.vel = Vec2::new(2.0, -2.0);
        tick(&mut state, &TickInput::default(), &mut ());
        assert!((state.player.body.pos - Vec2::new(1.0, 599.0)).length() < 1e-4);
    }

    #[test]
    fn test_game_over_on_first_overlapping_tick() {
        let mut state = quiet_state();
        // Distance 100, closing 2 px/tick, radius sum 55: overlap first at tick 23
        push_target(
            &mut state,
            TargetKind::Saucer,
            Vec2::new(500.0, 300.0),
            25.0,
            Vec2::new(-2.0, 0.0),
        );

        for n in 1..=22 {
            tick(&mut state, &TickInput::default(), &mut ());
            assert_eq!(state.phase, GamePhase::Running, "tick {}", n);
        }
        tick(&mut state, &TickInput::default(), &mut ());
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.score, 0);
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::GameOver { .. })));

        // Frozen afterwards
        let ticks = state.time_ticks;
        let pos = state.targets[0].body.pos;
        tick(&mut state, &TickInput { fire: true, ..Default::default() }, &mut ());
        assert_eq!(state.time_ticks, ticks);
        assert_eq!(state.targets[0].body.pos, pos);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_falling_asteroid_ends_session() {
        let mut state = quiet_state();
        // Straight above the craft and dropping onto it
        push_target(
            &mut state,
            TargetKind::Asteroid,
            Vec2::new(400.0, 200.0),
            25.0,
            Vec2::new(0.0, 2.0),
        );

        for _ in 0..22 {
            tick(&mut state, &TickInput::default(), &mut ());
        }
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.targets[0].body.pos, Vec2::new(400.0, 244.0));

        tick(&mut state, &TickInput::default(), &mut ());
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.score, 0);
        assert_eq!(state.targets.len(), 1);
    }

    #[test]
    fn test_shooting_a_saucer_scores() {
        let mut state = quiet_state();
        // Straight above the craft, stationary
        push_target(&mut state, TargetKind::Saucer, Vec2::new(400.0, 150.0), 25.0, Vec2::ZERO);

        tick(&mut state, &TickInput { fire: true, ..Default::default() }, &mut ());
        for _ in 0..40 {
            tick(&mut state, &TickInput::default(), &mut ());
        }
        assert_eq!(state.score, 10);
        assert!(state.targets.is_empty());
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_sink_sees_integrated_frame() {
        let mut state = quiet_state();
        let mut snapshot = FrameSnapshot::new(&state);
        tick(
            &mut state,
            &TickInput {
                thrust: true,
                ..Default::default()
            },
            &mut snapshot,
        );
        assert_eq!(snapshot.presented, 1);
        assert!(snapshot.thrusting);
        assert_eq!(snapshot.player.body.pos, state.player.body.pos);
        assert_eq!(snapshot.time_ticks, 1);
    }

    #[test]
    fn test_determinism() {
        let tuning = Tuning {
            spawn_chance: 0.2,
            ..Default::default()
        };
        let mut state1 = GameState::new(99999, Arena::default(), tuning.clone());
        let mut state2 = GameState::new(99999, Arena::default(), tuning);

        let inputs = [
            TickInput {
                rotate_left: true,
                fire: true,
                ..Default::default()
            },
            TickInput {
                thrust: true,
                ..Default::default()
            },
            TickInput {
                rotate_right: true,
                fire: true,
                ..Default::default()
            },
            TickInput::default(),
        ];

        for _ in 0..50 {
            for input in &inputs {
                tick(&mut state1, input, &mut ());
                tick(&mut state2, input, &mut ());
            }
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.phase, state2.phase);
        assert_eq!(state1.targets.len(), state2.targets.len());
        for (a, b) in state1.targets.iter().zip(&state2.targets) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.body, b.body);
        }
        assert_eq!(state1.player.body, state2.player.body);
    }
}
