use super::*;

use crate::constants::{
    get_decay_rate, get_star_base_lifetime_ms, get_star_occupancy_penalty_ms,
    MIN_STAR_LIFETIME_MS, PICKUP_RADIUS,
};
use crate::events::modifier_for;
use crate::types::{ModifierField, Zone, ZoneKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectOutcome {
    Collected { score: u32 },
    UnknownPlayer,
    UnknownStar,
    OutOfRange,
}

struct SpawnPlan {
    zone_id: String,
    kind: ZoneKind,
    x: f64,
    y: f64,
    lifetime_ms: u64,
}

impl GameEngine {
    pub(super) fn spawn_stars(&mut self) {
        let now_ms = self.now_ms;
        let active = self.scheduler.active();
        let mut plans = Vec::new();

        for zone in self.zones.zones() {
            let spawn_modifier = modifier_for(Some(zone.kind), active, ModifierField::SpawnRate);
            let adjusted_rate = zone.spawn_rate * spawn_modifier;
            if !self.rng.bool(adjusted_rate / 100.0) {
                continue;
            }
            if !self.rng.bool(get_decay_rate(zone.occupancy)) {
                continue;
            }
            let x = self.rng.range_f64(zone.x, zone.x + zone.width);
            let y = self.rng.range_f64(zone.y, zone.y + zone.height);
            plans.push(SpawnPlan {
                zone_id: zone.id.clone(),
                kind: zone.kind,
                x,
                y,
                lifetime_ms: star_lifetime_ms(zone, active),
            });
        }

        for plan in plans {
            debug_assert!(
                self.zones
                    .get(&plan.zone_id)
                    .is_some_and(|zone| zone.contains(plan.x, plan.y)),
                "star spawned outside zone {}",
                plan.zone_id
            );
            let id = self.make_id("star");
            tracing::debug!(star_id = %id, zone = %plan.zone_id, lifetime_ms = plan.lifetime_ms, "star spawned");
            self.stars.push(Star {
                id,
                x: plan.x,
                y: plan.y,
                zone_id: plan.zone_id,
                kind: plan.kind,
                created_at_ms: now_ms,
                lifetime_ms: plan.lifetime_ms,
            });
        }
    }

    pub(super) fn expire_stars(&mut self) {
        let now_ms = self.now_ms;
        self.stars.retain(|star| !star.is_expired(now_ms));
    }

    /// Removes the star and credits the player exactly once. A second call with the same id,
    /// or a call racing expiry, finds no star and changes nothing.
    pub fn collect(&mut self, player_id: &str, star_id: &str) -> CollectOutcome {
        let Some(player_idx) = self.player_index(player_id) else {
            return CollectOutcome::UnknownPlayer;
        };
        let Some(star_idx) = self
            .stars
            .iter()
            .position(|star| star.id == star_id && !star.is_expired(self.now_ms))
        else {
            return CollectOutcome::UnknownStar;
        };
        let position = self.players[player_idx].position();
        if position.distance(self.stars[star_idx].position()) > PICKUP_RADIUS {
            return CollectOutcome::OutOfRange;
        }

        self.take_star(player_idx, star_idx);
        CollectOutcome::Collected {
            score: self.players[player_idx].score,
        }
    }

    pub(super) fn collect_in_reach(&mut self, player_idx: usize) -> Vec<String> {
        let position = self.players[player_idx].position();
        let mut collected = Vec::new();
        while let Some(star_idx) = self.stars.iter().position(|star| {
            !star.is_expired(self.now_ms) && position.distance(star.position()) <= PICKUP_RADIUS
        }) {
            collected.push(self.take_star(player_idx, star_idx));
        }
        collected
    }

    fn take_star(&mut self, player_idx: usize, star_idx: usize) -> String {
        let star = self.stars.remove(star_idx);
        let player = &mut self.players[player_idx];
        player.score = player.score.saturating_add(1);
        tracing::debug!(player_id = %player.id, star_id = %star.id, score = player.score, "star collected");
        self.events.push(RuntimeEvent::StarCollected {
            star_id: star.id.clone(),
            by: player.id.clone(),
        });
        star.id
    }
}

pub(super) fn star_lifetime_ms(zone: &Zone, active: &[ActiveEvent]) -> u64 {
    let base = get_star_base_lifetime_ms(zone.kind)
        * modifier_for(Some(zone.kind), active, ModifierField::Lifetime);
    let penalised = base - zone.occupancy as f64 * get_star_occupancy_penalty_ms(zone.kind);
    penalised.max(MIN_STAR_LIFETIME_MS as f64).round() as u64
}
