//! Target spawning
//!
//! New targets appear just outside a random canvas edge and never within the
//! safe distance of the player.

use glam::Vec2;
use rand::Rng;

use super::factory::create_target;
use super::state::{Arena, GameState, Target, TargetKind};
use crate::consts::MAX_SPAWN_ATTEMPTS;
use crate::tuning::Tuning;

/// Random point on the spawn band, `offset` px outside one of the four edges
fn edge_point(rng: &mut impl Rng, arena: Arena, offset: f32) -> Vec2 {
    let along_x = rng.random_range(0.0..=arena.width);
    let along_y = rng.random_range(0.0..=arena.height);
    match rng.random_range(0..4) {
        0 => Vec2::new(along_x, -offset),
        1 => Vec2::new(arena.width + offset, along_y),
        2 => Vec2::new(along_x, arena.height + offset),
        _ => Vec2::new(-offset, along_y),
    }
}

/// Corner of the spawn band farthest from `from`
fn farthest_corner(arena: Arena, offset: f32, from: Vec2) -> Vec2 {
    let (lo_x, hi_x) = (-offset, arena.width + offset);
    let (lo_y, hi_y) = (-offset, arena.height + offset);
    [
        Vec2::new(lo_x, lo_y),
        Vec2::new(hi_x, lo_y),
        Vec2::new(lo_x, hi_y),
        Vec2::new(hi_x, hi_y),
    ]
    .into_iter()
    .max_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
    .unwrap_or(Vec2::new(lo_x, lo_y))
}

/// Pick a spawn point strictly farther than the safe distance from `player_pos`
///
/// Rejection-samples up to [`MAX_SPAWN_ATTEMPTS`] edge points, then tries the
/// farthest band corner. Returns `None` if no valid point exists.
pub fn spawn_position(
    rng: &mut impl Rng,
    arena: Arena,
    player_pos: Vec2,
    tuning: &Tuning,
) -> Option<Vec2> {
    let safe = tuning.safe_distance.resolve(arena.width, arena.height);

    for _ in 0..MAX_SPAWN_ATTEMPTS {
        let candidate = edge_point(rng, arena, tuning.spawn_offset);
        if candidate.distance(player_pos) > safe {
            return Some(candidate);
        }
    }

    let corner = farthest_corner(arena, tuning.spawn_offset, player_pos);
    if corner.distance(player_pos) > safe {
        log::debug!("Spawn fell back to corner {:?}", corner);
        Some(corner)
    } else {
        log::debug!("No spawn point clears safe distance {}", safe);
        None
    }
}

/// Build one target at a valid spawn point (not yet added to the state)
pub fn spawn_target(state: &mut GameState) -> Option<Target> {
    let kind = if state.rng.random::<f32>() < state.tuning.asteroid_ratio {
        TargetKind::Asteroid
    } else {
        TargetKind::Saucer
    };

    let pos = spawn_position(
        &mut state.rng,
        state.arena,
        state.player.body.pos,
        &state.tuning,
    )?;
    let id = state.next_entity_id();
    let target = create_target(id, kind, pos, state.level, &state.tuning, &mut state.rng);
    log::debug!(
        "Spawned {:?} #{} at ({:.0}, {:.0}) r={:.1}",
        kind,
        id,
        pos.x,
        pos.y,
        target.body.radius
    );
    Some(target)
}

/// Per-tick spawn roll: below the cap and under `spawn_chance`, add a target
pub fn maybe_spawn(state: &mut GameState) {
    if state.targets.len() >= state.tuning.max_targets {
        return;
    }
    if state.rng.random::<f32>() >= state.tuning.spawn_chance {
        return;
    }
    if let Some(target) = spawn_target(state) {
        state.targets.push(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::SafeDistance;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn on_spawn_band(pos: Vec2, arena: Arena, offset: f32) -> bool {
        let eps = 1e-3;
        let x_band = (pos.x + offset).abs() < eps || (pos.x - arena.width - offset).abs() < eps;
        let y_band = (pos.y + offset).abs() < eps || (pos.y - arena.height - offset).abs() < eps;
        x_band || y_band
    }

    #[test]
    fn test_spawn_points_respect_safe_distance() {
        let tuning = Tuning::default();
        let arena = Arena::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let player = Vec2::new(20.0, 20.0);

        for _ in 0..500 {
            let pos = spawn_position(&mut rng, arena, player, &tuning).unwrap();
            assert!(pos.distance(player) > 100.0);
            assert!(on_spawn_band(pos, arena, tuning.spawn_offset));
            assert!(!arena.is_outside(pos, tuning.cull_margin));
        }
    }

    #[test]
    fn test_corner_fallback_when_sampling_fails() {
        // Safe distance so large that only the far corner clears it
        let arena = Arena::default();
        let player = Vec2::new(0.0, 0.0);
        let far = Vec2::new(arena.width + 40.0, arena.height + 40.0);
        let tuning = Tuning {
            safe_distance: SafeDistance::Fixed(far.length() - 1.0),
            ..Default::default()
        };
        let mut rng = Pcg32::seed_from_u64(5);
        let pos = spawn_position(&mut rng, arena, player, &tuning).unwrap();
        assert!(pos.distance(player) > far.length() - 1.0);
    }

    #[test]
    fn test_skip_when_nothing_is_safe() {
        let tuning = Tuning {
            safe_distance: SafeDistance::Fixed(10_000.0),
            ..Default::default()
        };
        let mut rng = Pcg32::seed_from_u64(6);
        assert!(spawn_position(&mut rng, Arena::default(), Vec2::new(400.0, 300.0), &tuning).is_none());
    }

    #[test]
    fn test_maybe_spawn_respects_cap() {
        let tuning = Tuning {
            spawn_chance: 1.0,
            ..Default::default()
        };
        let mut state = GameState::new(3, Arena::default(), tuning);
        for _ in 0..100 {
            maybe_spawn(&mut state);
        }
        assert_eq!(state.targets.len(), 5);
    }

    #[test]
    fn test_maybe_spawn_zero_chance_never_spawns() {
        let tuning = Tuning {
            initial_targets: 0,
            spawn_chance: 0.0,
            ..Default::default()
        };
        let mut state = GameState::new(3, Arena::default(), tuning);
        for _ in 0..1000 {
            maybe_spawn(&mut state);
        }
        assert!(state.targets.is_empty());
    }

    #[test]
    fn test_kind_ratio_extremes() {
        let all_saucers = Tuning {
            asteroid_ratio: 0.0,
            initial_targets: 5,
            ..Default::default()
        };
        let state = GameState::new(8, Arena::default(), all_saucers);
        assert!(state.targets.iter().all(|t| t.kind == TargetKind::Saucer));

        let all_asteroids = Tuning {
            asteroid_ratio: 1.0,
            initial_targets: 5,
            ..Default::default()
        };
        let state = GameState::new(8, Arena::default(), all_asteroids);
        assert!(state.targets.iter().all(|t| t.kind == TargetKind::Asteroid));
    }

    #[test]
    fn test_ids_are_unique() {
        let tuning = Tuning {
            initial_targets: 5,
            ..Default::default()
        };
        let state = GameState::new(12, Arena::default(), tuning);
        let mut ids: Vec<u32> = state.targets.iter().map(|t| t.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), state.targets.len());
    }
}
