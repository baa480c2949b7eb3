//! Entity construction
//!
//! All randomness comes from the caller's RNG so a seeded session reproduces
//! the same targets.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::state::{Body, Player, Projectile, Target, TargetKind};
use crate::consts::PLAYER_START_ANGLE;
use crate::polar_to_cartesian;
use crate::tuning::Tuning;

/// Player craft at `center`, facing up, at rest
pub fn create_player(center: Vec2, tuning: &Tuning) -> Player {
    Player {
        body: Body::new(center, tuning.player_radius(), tuning.player_speed),
        angle: PLAYER_START_ANGLE,
        scale: tuning.player_scale,
    }
}

/// Target speed for a level: `base × (1 + level × k)`, before jitter
pub fn level_speed(level: u32, tuning: &Tuning) -> f32 {
    tuning.target_base_speed * (1.0 + level as f32 * tuning.level_speed_factor)
}

fn random_heading(rng: &mut impl Rng, speed: f32) -> Vec2 {
    polar_to_cartesian(speed, rng.random_range(0.0..TAU))
}

/// New target of `kind` at `pos`, moving in a random direction
pub fn create_target(
    id: u32,
    kind: TargetKind,
    pos: Vec2,
    level: u32,
    tuning: &Tuning,
    rng: &mut impl Rng,
) -> Target {
    let radius = match kind {
        TargetKind::Asteroid => {
            rng.random_range(tuning.asteroid_radius_min..=tuning.asteroid_radius_max)
        }
        TargetKind::Saucer => tuning.saucer_radius,
    };

    let jitter = if tuning.speed_jitter > 0.0 {
        rng.random_range(0.0..tuning.speed_jitter)
    } else {
        0.0
    };
    let speed = level_speed(level, tuning) + jitter;

    let mut body = Body::new(pos, radius, speed);
    body.vel = random_heading(rng, speed);

    let base_scale = if rng.random_bool(0.5) { 1.5 } else { 1.0 };
    let scale = match kind {
        TargetKind::Asteroid => base_scale,
        TargetKind::Saucer => base_scale * 1.25,
    };

    Target {
        id,
        kind,
        body,
        scale,
    }
}

/// Projectile leaving the craft's nose along its facing
pub fn create_projectile(id: u32, player: &Player, tuning: &Tuning) -> Projectile {
    let mut body = Body::new(player.nose(), tuning.projectile_radius, tuning.projectile_speed);
    body.vel = player.facing() * tuning.projectile_speed;
    Projectile { id, body }
}

/// Break a shot asteroid into two halves
///
/// Returns `None` when the parent is too small to split (or is a saucer).
/// Children keep the parent's speed and get independent headings.
pub fn split_asteroid(
    parent: &Target,
    ids: [u32; 2],
    tuning: &Tuning,
    rng: &mut impl Rng,
) -> Option<[Target; 2]> {
    if !parent.kind.splits_at(parent.body.radius, tuning.split_min_radius) {
        return None;
    }

    let radius = parent.body.radius / 2.0;
    let speed = parent.body.speed;
    let mut child = |id: u32| {
        let mut body = Body::new(parent.body.pos, radius, speed);
        body.vel = random_heading(rng, speed);
        Target {
            id,
            kind: TargetKind::Asteroid,
            body,
            scale: parent.scale / 2.0,
        }
    };

    Some([child(ids[0]), child(ids[1])])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_player_starts_centered_facing_up() {
        let player = create_player(Vec2::new(400.0, 300.0), &Tuning::default());
        assert_eq!(player.body.pos, Vec2::new(400.0, 300.0));
        assert_eq!(player.body.vel, Vec2::ZERO);
        assert_eq!(player.body.radius, 30.0);
        assert!((player.facing() - Vec2::new(0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn test_asteroid_radius_and_speed_ranges() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        for level in 1..=10 {
            for i in 0..50 {
                let t = create_target(i, TargetKind::Asteroid, Vec2::ZERO, level, &tuning, &mut rng);
                assert!((20.0..=40.0).contains(&t.body.radius));
                let base = level_speed(level, &tuning);
                assert!(t.body.speed >= base && t.body.speed < base + tuning.speed_jitter);
                assert!((t.body.vel.length() - t.body.speed).abs() < 1e-3);
                assert!(t.scale == 1.0 || t.scale == 1.5);
            }
        }
    }

    #[test]
    fn test_saucer_has_fixed_radius() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(2);
        let t = create_target(1, TargetKind::Saucer, Vec2::ZERO, 1, &tuning, &mut rng);
        assert_eq!(t.body.radius, 25.0);
        assert!(t.scale == 1.25 || t.scale == 1.875);
    }

    #[test]
    fn test_speed_rises_with_level() {
        let tuning = Tuning::default();
        assert!((level_speed(1, &tuning) - 2.2).abs() < 1e-5);
        assert!((level_speed(10, &tuning) - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_projectile_leaves_nose() {
        let tuning = Tuning::default();
        let player = create_player(Vec2::new(400.0, 300.0), &tuning);
        let p = create_projectile(9, &player, &tuning);
        assert!((p.body.pos - Vec2::new(400.0, 270.0)).length() < 1e-4);
        assert!((p.body.vel - Vec2::new(0.0, -5.0)).length() < 1e-4);
        assert_eq!(p.body.radius, 3.0);
    }

    #[test]
    fn test_split_halves_radius_and_keeps_speed() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut parent = create_target(1, TargetKind::Asteroid, Vec2::new(50.0, 50.0), 1, &tuning, &mut rng);
        parent.body.radius = 36.0;

        let [a, b] = split_asteroid(&parent, [2, 3], &tuning, &mut rng).unwrap();
        for child in [&a, &b] {
            assert_eq!(child.body.radius, 18.0);
            assert_eq!(child.body.pos, parent.body.pos);
            assert!((child.body.vel.length() - parent.body.speed).abs() < 1e-3);
            assert_eq!(child.scale, parent.scale / 2.0);
        }
        assert_eq!((a.id, b.id), (2, 3));

        // Children at 18 are below the split radius
        assert!(split_asteroid(&a, [4, 5], &tuning, &mut rng).is_none());
    }

    #[test]
    fn test_saucer_never_splits() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(4);
        let saucer = create_target(1, TargetKind::Saucer, Vec2::ZERO, 1, &tuning, &mut rng);
        assert!(split_asteroid(&saucer, [2, 3], &tuning, &mut rng).is_none());
    }
}
