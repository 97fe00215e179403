use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::constants::{
    get_max_events_for_round, EVENT_DURATION_JITTER_SECS, MAX_EVENT_DELAY_MS,
    MIN_EVENT_DURATION_SECS,
};
use crate::rng::Rng;
use crate::types::{
    ActiveEvent, EventEffect, EventKind, EventTarget, GameEvent, ModifierField, ScheduledEvent,
    ZoneKind,
};

pub fn event_catalog() -> Vec<GameEvent> {
    vec![
        template(
            "public_scarcity",
            "Public Scarcity",
            "Stars became rare in public zones",
            EventKind::StarScarcity,
            EventTarget::Public,
            EventEffect {
                spawn_rate: Some(0.3),
                ..EventEffect::default()
            },
            180,
        ),
        template(
            "private_abundance",
            "Private Abundance",
            "A shower of stars over the private zones",
            EventKind::StarAbundance,
            EventTarget::Private,
            EventEffect {
                spawn_rate: Some(2.5),
                ..EventEffect::default()
            },
            120,
        ),
        template(
            "public_boost",
            "Public Boost",
            "Stars last longer in public zones",
            EventKind::ZoneBoost,
            EventTarget::Public,
            EventEffect {
                lifetime: Some(1.5),
                ..EventEffect::default()
            },
            150,
        ),
        template(
            "private_scarcity",
            "Private Drought",
            "Stars have almost vanished from private zones",
            EventKind::StarScarcity,
            EventTarget::Private,
            EventEffect {
                spawn_rate: Some(0.2),
                ..EventEffect::default()
            },
            90,
        ),
        template(
            "speed_surge",
            "Speed Surge",
            "Every player moves faster",
            EventKind::SpeedBoost,
            EventTarget::All,
            EventEffect {
                speed: Some(1.5),
                ..EventEffect::default()
            },
            60,
        ),
        template(
            "golden_hour",
            "Golden Hour",
            "Stars appear everywhere",
            EventKind::StarAbundance,
            EventTarget::All,
            EventEffect {
                spawn_rate: Some(1.8),
                ..EventEffect::default()
            },
            100,
        ),
    ]
}

fn template(
    id: &str,
    name: &str,
    description: &str,
    kind: EventKind,
    target: EventTarget,
    effect: EventEffect,
    duration_secs: u64,
) -> GameEvent {
    GameEvent {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        kind,
        target,
        effect,
        duration_ms: duration_secs * 1_000,
    }
}

/// Draws the events for one round without replacement, jittering each duration and assigning
/// an activation delay in `[0, MAX_EVENT_DELAY_MS)`.
pub fn plan_round(round_number: u32, rng: &mut Rng) -> Vec<ScheduledEvent> {
    let max_events = get_max_events_for_round(round_number);
    let count = rng.int(1, max_events as i64) as usize;
    let mut available = event_catalog();
    let mut planned = Vec::with_capacity(count);

    while planned.len() < count && !available.is_empty() {
        let mut event = available.remove(rng.pick_index(available.len()));
        let jitter_secs = (rng.next_f64() - 0.5) * 2.0 * EVENT_DURATION_JITTER_SECS;
        let duration_secs =
            (event.duration_ms as f64 / 1_000.0 + jitter_secs).max(MIN_EVENT_DURATION_SECS);
        event.duration_ms = (duration_secs * 1_000.0).round() as u64;
        let activation_delay_ms = (rng.next_f64() * MAX_EVENT_DELAY_MS as f64).floor() as u64;
        planned.push(ScheduledEvent {
            event,
            activation_delay_ms,
        });
    }
    planned
}

/// Product of every matching multiplier for `field`. `kind == None` means the wilderness,
/// where only `all`-scoped events apply.
pub fn modifier_for(kind: Option<ZoneKind>, active: &[ActiveEvent], field: ModifierField) -> f64 {
    active
        .iter()
        .filter(|active| active.event.target.applies_to(kind))
        .filter_map(|active| active.event.effect.get(field))
        .product()
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventTransition {
    Activated(ActiveEvent),
    Deactivated(ActiveEvent),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum TransitionKind {
    Activate,
    Deactivate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct QueueEntry {
    fire_at_ms: u64,
    seq: u64,
    slot: usize,
    kind: TransitionKind,
}

/// Per-round schedule of activation/deactivation transitions keyed off the engine clock.
///
/// An event scheduled at `start + delay` is active exactly over
/// `[start + delay, start + delay + duration)`; each one activates and deactivates once.
#[derive(Clone, Debug, Default)]
pub struct EventScheduler {
    scheduled: Vec<ScheduledEvent>,
    queue: BinaryHeap<Reverse<QueueEntry>>,
    active: Vec<ActiveEvent>,
    next_seq: u64,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the schedule with a new round's events. Events still active from the previous
    /// round are returned as deactivated.
    pub fn arm(
        &mut self,
        round_started_at_ms: u64,
        scheduled: Vec<ScheduledEvent>,
    ) -> Vec<EventTransition> {
        let ended = self.clear();
        for (slot, entry) in scheduled.iter().enumerate() {
            let activate_at = round_started_at_ms + entry.activation_delay_ms;
            self.push(activate_at, slot, TransitionKind::Activate);
            self.push(
                activate_at + entry.event.duration_ms,
                slot,
                TransitionKind::Deactivate,
            );
        }
        self.scheduled = scheduled;
        ended
    }

    pub fn clear(&mut self) -> Vec<EventTransition> {
        self.queue.clear();
        self.scheduled.clear();
        self.active
            .drain(..)
            .map(EventTransition::Deactivated)
            .collect()
    }

    pub fn advance(&mut self, now_ms: u64) -> Vec<EventTransition> {
        let mut fired = Vec::new();
        while let Some(Reverse(entry)) = self.queue.peek().copied() {
            if entry.fire_at_ms > now_ms {
                break;
            }
            self.queue.pop();
            let Some(scheduled) = self.scheduled.get(entry.slot) else {
                continue;
            };
            let event_id = scheduled.event.id.clone();
            let position = self.active.iter().position(|a| a.event.id == event_id);
            match (entry.kind, position) {
                (TransitionKind::Activate, None) => {
                    let activated = ActiveEvent {
                        event: scheduled.event.clone(),
                        activated_at_ms: entry.fire_at_ms,
                    };
                    self.active.push(activated.clone());
                    fired.push(EventTransition::Activated(activated));
                }
                (TransitionKind::Deactivate, Some(idx)) => {
                    fired.push(EventTransition::Deactivated(self.active.remove(idx)));
                }
                _ => {}
            }
        }
        fired
    }

    pub fn active(&self) -> &[ActiveEvent] {
        &self.active
    }

    pub fn scheduled(&self) -> &[ScheduledEvent] {
        &self.scheduled
    }

    pub fn pending_transitions(&self) -> usize {
        self.queue.len()
    }

    fn push(&mut self, fire_at_ms: u64, slot: usize, kind: TransitionKind) {
        self.queue.push(Reverse(QueueEntry {
            fire_at_ms,
            seq: self.next_seq,
            slot,
            kind,
        }));
        self.next_seq += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn active_with(target: EventTarget, effect: EventEffect, id: &str) -> ActiveEvent {
        ActiveEvent {
            event: template(id, id, "", EventKind::StarScarcity, target, effect, 60),
            activated_at_ms: 0,
        }
    }

    fn scheduled(id: &str, delay_ms: u64, duration_ms: u64) -> ScheduledEvent {
        let mut event = event_catalog()
            .into_iter()
            .find(|event| event.id == id)
            .expect("catalog entry");
        event.duration_ms = duration_ms;
        ScheduledEvent {
            event,
            activation_delay_ms: delay_ms,
        }
    }

    #[test]
    fn catalog_has_six_distinct_templates() {
        let catalog = event_catalog();
        assert_eq!(catalog.len(), 6);
        let ids: HashSet<&str> = catalog.iter().map(|event| event.id.as_str()).collect();
        assert_eq!(ids.len(), 6);
        assert_eq!(
            catalog
                .iter()
                .filter(|event| event.kind == EventKind::StarScarcity)
                .count(),
            2
        );
    }

    #[test]
    fn round_one_always_schedules_exactly_one_event() {
        for seed in 1..=500u32 {
            let mut rng = Rng::new(seed);
            assert_eq!(plan_round(1, &mut rng).len(), 1);
        }
    }

    #[test]
    fn round_four_schedules_one_or_two_distinct_events() {
        let mut counts = HashSet::new();
        for seed in 1..=500u32 {
            let mut rng = Rng::new(seed);
            let planned = plan_round(4, &mut rng);
            assert!((1..=2).contains(&planned.len()));
            let ids: HashSet<&str> = planned.iter().map(|s| s.event.id.as_str()).collect();
            assert_eq!(ids.len(), planned.len());
            counts.insert(planned.len());
        }
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn planned_durations_and_delays_stay_in_range() {
        let catalog = event_catalog();
        for seed in 1..=500u32 {
            let mut rng = Rng::new(seed);
            for entry in plan_round(6, &mut rng) {
                let base = catalog
                    .iter()
                    .find(|event| event.id == entry.event.id)
                    .map(|event| event.duration_ms)
                    .expect("drawn from catalog");
                assert!(entry.event.duration_ms >= 30_000);
                assert!(entry.event.duration_ms <= base + 30_000);
                assert!(entry.event.duration_ms + 30_000 >= base.max(30_000));
                assert!(entry.activation_delay_ms < MAX_EVENT_DELAY_MS);
            }
        }
    }

    #[test]
    fn modifiers_compose_multiplicatively() {
        let half = EventEffect {
            spawn_rate: Some(0.5),
            ..EventEffect::default()
        };
        let active = vec![
            active_with(EventTarget::Public, half, "a"),
            active_with(EventTarget::All, half, "b"),
        ];
        let combined = modifier_for(Some(ZoneKind::Public), &active, ModifierField::SpawnRate);
        assert!((combined - 0.25).abs() < 1e-12);

        let private = modifier_for(Some(ZoneKind::Private), &active, ModifierField::SpawnRate);
        assert!((private - 0.5).abs() < 1e-12);
    }

    #[test]
    fn absent_field_is_identity() {
        let active = vec![active_with(
            EventTarget::All,
            EventEffect {
                speed: Some(1.5),
                ..EventEffect::default()
            },
            "s",
        )];
        assert_eq!(
            modifier_for(Some(ZoneKind::Public), &active, ModifierField::Lifetime),
            1.0
        );
        assert_eq!(modifier_for(None, &[], ModifierField::SpawnRate), 1.0);
        assert_eq!(modifier_for(None, &active, ModifierField::Speed), 1.5);
    }

    #[test]
    fn wilderness_only_sees_global_events() {
        let active = vec![active_with(
            EventTarget::Private,
            EventEffect {
                speed: Some(2.0),
                ..EventEffect::default()
            },
            "p",
        )];
        assert_eq!(modifier_for(None, &active, ModifierField::Speed), 1.0);
    }

    #[test]
    fn scheduler_window_is_half_open() {
        let mut scheduler = EventScheduler::new();
        scheduler.arm(1_000, vec![scheduled("golden_hour", 5_000, 30_000)]);
        assert_eq!(scheduler.pending_transitions(), 2);

        assert!(scheduler.advance(5_999).is_empty());
        let fired = scheduler.advance(6_000);
        assert!(matches!(
            fired.as_slice(),
            [EventTransition::Activated(active)] if active.activated_at_ms == 6_000
        ));
        assert!(scheduler.advance(35_999).is_empty());
        assert_eq!(scheduler.active().len(), 1);

        let fired = scheduler.advance(36_000);
        assert!(matches!(fired.as_slice(), [EventTransition::Deactivated(_)]));
        assert!(scheduler.active().is_empty());
        assert!(scheduler.advance(1_000_000).is_empty());
    }

    #[test]
    fn late_advance_still_emits_each_transition_once() {
        let mut scheduler = EventScheduler::new();
        scheduler.arm(0, vec![scheduled("speed_surge", 0, 30_000)]);
        let fired = scheduler.advance(100_000);
        assert_eq!(fired.len(), 2);
        assert!(matches!(fired[0], EventTransition::Activated(_)));
        assert!(matches!(fired[1], EventTransition::Deactivated(_)));
        assert!(scheduler.advance(200_000).is_empty());
    }

    #[test]
    fn rearming_deactivates_running_events_and_drops_pending() {
        let mut scheduler = EventScheduler::new();
        scheduler.arm(
            0,
            vec![
                scheduled("golden_hour", 0, 60_000),
                scheduled("public_boost", 50_000, 60_000),
            ],
        );
        scheduler.advance(1_000);
        assert_eq!(scheduler.active().len(), 1);

        let ended = scheduler.arm(2_000, Vec::new());
        assert!(matches!(ended.as_slice(), [EventTransition::Deactivated(_)]));
        assert!(scheduler.active().is_empty());
        assert_eq!(scheduler.pending_transitions(), 0);
        assert!(scheduler.advance(500_000).is_empty());
    }
}
