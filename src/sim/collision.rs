//! Circle overlap tests and the per-tick hit pass
//!
//! Everything in the arena is a circle, so every check reduces to comparing
//! center distance with the sum of radii.

use glam::Vec2;

use super::factory::split_asteroid;
use super::state::{Body, GameEvent, GameState, Player, Target};

/// Strict overlap: touching circles do not collide
#[inline]
pub fn circles_overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    a.distance(b) < a_radius + b_radius
}

#[inline]
fn bodies_overlap(a: &Body, b: &Body) -> bool {
    circles_overlap(a.pos, a.radius, b.pos, b.radius)
}

/// Resolve projectile-versus-target hits for one tick
///
/// Both lists are scanned from the back so removals never skip an entry. Each
/// projectile consumes at most one target. Split fragments are held back until
/// the scan finishes, so a fragment cannot be hit in the pass that created it,
/// and are then added only while the live count stays within `max_targets`.
///
/// Returns the number of targets consumed.
pub fn resolve_projectile_hits(state: &mut GameState) -> usize {
    let mut fragments: Vec<Target> = Vec::new();
    let mut consumed = 0;

    let mut i = state.projectiles.len();
    while i > 0 {
        i -= 1;
        let shot = state.projectiles[i].body;
        let Some(j) = (0..state.targets.len())
            .rev()
            .find(|&j| bodies_overlap(&shot, &state.targets[j].body))
        else {
            continue;
        };

        state.projectiles.remove(i);
        let target = state.targets.remove(j);
        consumed += 1;
        state.award_target();

        let pos = target.body.pos;
        if target
            .kind
            .splits_at(target.body.radius, state.tuning.split_min_radius)
        {
            let ids = [state.next_entity_id(), state.next_entity_id()];
            if let Some(children) = split_asteroid(&target, ids, &state.tuning, &mut state.rng) {
                fragments.extend(children);
            }
            state.events.push(GameEvent::AsteroidSplit { pos });
        } else {
            state.events.push(GameEvent::TargetDestroyed {
                kind: target.kind,
                pos,
            });
        }
    }

    // Fragments only fill free slots under the cap
    let room = state.tuning.max_targets.saturating_sub(state.targets.len());
    if fragments.len() > room {
        log::debug!("Dropping {} split fragments at the cap", fragments.len() - room);
        fragments.truncate(room);
    }
    state.targets.append(&mut fragments);
    consumed
}

/// Index of the first target touching the player, if any
pub fn player_collision(player: &Player, targets: &[Target]) -> Option<usize> {
    targets
        .iter()
        .position(|t| bodies_overlap(&player.body, &t.body))
}

/// Drop targets and projectiles beyond the canvas plus their cull margins
///
/// Projectiles default to no margin: one step past an edge and it is gone.
pub fn cull_offscreen(state: &mut GameState) {
    let arena = state.arena;
    let shot_margin = state.tuning.projectile_cull_margin;
    let target_margin = state.tuning.cull_margin;
    state
        .projectiles
        .retain(|p| !arena.is_outside(p.body.pos, shot_margin));
    state
        .targets
        .retain(|t| !arena.is_outside(t.body.pos, target_margin));
}
