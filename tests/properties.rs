//! Property tests for the simulation

use glam::Vec2;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use space_defender::sim::{
    Arena, Body, FrameView, GamePhase, GameState, Projectile, RenderSink, TickInput,
    circles_overlap, resolve_projectile_hits, spawn_position, tick,
};
use space_defender::tuning::{SafeDistance, Tuning};
use space_defender::wrap_coordinate;

fn input_from_bits(bits: u8) -> TickInput {
    TickInput {
        rotate_left: bits & 1 != 0,
        rotate_right: bits & 2 != 0,
        thrust: bits & 4 != 0,
        fire: bits & 8 != 0,
    }
}

fn target_positions(state: &GameState) -> Vec<Vec2> {
    state.targets.iter().map(|t| t.body.pos).collect()
}

/// Records every (projectile, target) id pair touching in the presented frame
#[derive(Default)]
struct OverlapRecorder {
    pairs: Vec<(u32, u32)>,
}

impl RenderSink for OverlapRecorder {
    fn present(&mut self, frame: &FrameView<'_>) {
        self.pairs.clear();
        for shot in frame.projectiles {
            for target in frame.targets {
                if circles_overlap(shot.body.pos, shot.body.radius, target.body.pos, target.body.radius) {
                    self.pairs.push((shot.id, target.id));
                }
            }
        }
    }
}

proptest! {
    #[test]
    fn wrap_stays_in_range(value in -10_000.0f32..10_000.0, extent in 1.0f32..2_000.0) {
        let wrapped = wrap_coordinate(value, extent);
        prop_assert!(wrapped >= 0.0 && wrapped < extent);
    }

    #[test]
    fn spawns_clear_safe_distance(
        seed in any::<u64>(),
        x in 0.0f32..800.0,
        y in 0.0f32..600.0,
        safe in 0.0f32..700.0,
    ) {
        let tuning = Tuning {
            safe_distance: SafeDistance::Fixed(safe),
            ..Tuning::default()
        };
        let mut rng = Pcg32::seed_from_u64(seed);
        let player = Vec2::new(x, y);
        if let Some(pos) = spawn_position(&mut rng, Arena::default(), player, &tuning) {
            prop_assert!(pos.distance(player) > safe);
        }
    }

    #[test]
    fn saucer_only_sessions_respect_cap(seed in any::<u64>(), inputs in prop::collection::vec(any::<u8>(), 1..400)) {
        let tuning = Tuning {
            asteroid_ratio: 0.0,
            spawn_chance: 1.0,
            ..Tuning::default()
        };
        let cap = tuning.max_targets;
        let mut state = GameState::new(seed, Arena::default(), tuning);
        for bits in inputs {
            tick(&mut state, &input_from_bits(bits), &mut ());
            prop_assert!(state.targets.len() <= cap);
        }
    }

    #[test]
    fn splitting_sessions_respect_cap(seed in any::<u64>(), inputs in prop::collection::vec(any::<u8>(), 1..600)) {
        let tuning = Tuning {
            asteroid_ratio: 1.0,
            spawn_chance: 1.0,
            ..Tuning::default()
        };
        let cap = tuning.max_targets;
        let mut state = GameState::new(seed, Arena::default(), tuning);
        for bits in inputs {
            // Keep firing so big asteroids get split
            let input = TickInput {
                fire: true,
                ..input_from_bits(bits)
            };
            tick(&mut state, &input, &mut ());
            prop_assert!(state.targets.len() <= cap);
        }
    }

    #[test]
    fn touching_pairs_never_both_survive(seed in any::<u64>(), inputs in prop::collection::vec(any::<u8>(), 1..400)) {
        let mut state = GameState::new(seed, Arena::default(), Tuning::default());
        let mut recorder = OverlapRecorder::default();
        for bits in inputs {
            if state.phase == GamePhase::GameOver {
                break;
            }
            tick(&mut state, &input_from_bits(bits), &mut recorder);
            for &(shot_id, target_id) in &recorder.pairs {
                let shot_alive = state.projectiles.iter().any(|p| p.id == shot_id);
                let target_alive = state.targets.iter().any(|t| t.id == target_id);
                prop_assert!(!(shot_alive && target_alive), "pair {:?} survived", (shot_id, target_id));
            }
        }
    }

    #[test]
    fn score_never_decreases(seed in any::<u64>(), inputs in prop::collection::vec(any::<u8>(), 1..600)) {
        let mut state = GameState::new(seed, Arena::default(), Tuning::default());
        let mut last = state.score;
        for bits in inputs {
            tick(&mut state, &input_from_bits(bits), &mut ());
            prop_assert!(state.score >= last);
            prop_assert_eq!(state.score % 10, 0);
            last = state.score;
        }
    }

    #[test]
    fn game_over_is_terminal(seed in any::<u64>(), extra in prop::collection::vec(any::<u8>(), 1..50)) {
        let mut state = GameState::new(seed, Arena::default(), Tuning::default());
        prop_assume!(!state.targets.is_empty());
        // Park a target on the craft
        state.targets[0].body.pos = state.player.body.pos;
        tick(&mut state, &TickInput::default(), &mut ());
        prop_assert_eq!(state.phase, GamePhase::GameOver);
        state.events.clear();

        let before = (state.score, state.elapsed_secs, state.level, state.time_ticks);
        let positions = target_positions(&state);
        let shots = state.projectiles.len();
        for bits in extra {
            tick(&mut state, &input_from_bits(bits), &mut ());
            state.on_second_elapsed();
            state.on_level_timer();
        }

        prop_assert_eq!((state.score, state.elapsed_secs, state.level, state.time_ticks), before);
        prop_assert_eq!(target_positions(&state), positions);
        prop_assert_eq!(state.projectiles.len(), shots);
        prop_assert!(state.events.is_empty());
    }

    #[test]
    fn same_seed_same_session(seed in any::<u64>(), inputs in prop::collection::vec(any::<u8>(), 1..300)) {
        let mut a = GameState::new(seed, Arena::default(), Tuning::default());
        let mut b = GameState::new(seed, Arena::default(), Tuning::default());
        for (n, bits) in inputs.into_iter().enumerate() {
            let input = input_from_bits(bits);
            tick(&mut a, &input, &mut ());
            tick(&mut b, &input, &mut ());
            if n % 60 == 59 {
                a.on_second_elapsed();
                b.on_second_elapsed();
            }
        }
        prop_assert_eq!(a.phase, b.phase);
        prop_assert_eq!(a.score, b.score);
        prop_assert_eq!(a.player.body.pos, b.player.body.pos);
        prop_assert_eq!(target_positions(&a), target_positions(&b));
        prop_assert_eq!(a.events, b.events);
    }

    #[test]
    fn each_consumed_target_scores_once(seed in any::<u64>()) {
        let mut state = GameState::new(seed, Arena::default(), Tuning::default());
        let spots: Vec<Vec2> = target_positions(&state);
        for pos in spots {
            let id = state.next_entity_id();
            state.projectiles.push(Projectile {
                id,
                body: Body::new(pos, 3.0, 0.0),
            });
        }
        let shots = state.projectiles.len();

        let consumed = resolve_projectile_hits(&mut state);

        prop_assert!(consumed >= 1 || shots == 0);
        prop_assert!(consumed <= shots);
        prop_assert_eq!(state.score, 10 * consumed as u64);
        prop_assert_eq!(state.projectiles.len(), shots - consumed);
    }
}
