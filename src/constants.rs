use crate::types::ZoneKind;

pub const TICK_MS: u64 = 1_000;

pub const WORLD_WIDTH: f64 = 800.0;
pub const WORLD_HEIGHT: f64 = 600.0;
pub const ENTRY_POINT: (f64, f64) = (300.0, 300.0);

pub const MOVE_STEP: f64 = 10.0;
pub const PICKUP_RADIUS: f64 = 30.0;

pub const ROUND_DURATION_SECS: u64 = 300;
pub const TOTAL_ROUNDS: u32 = 6;
pub const MAX_ROUND_DURATION_SECS: u64 = 86_400;
pub const MAX_TOTAL_ROUNDS: u32 = 100;

pub const MAX_EVENT_DELAY_MS: u64 = 150_000;
pub const EVENT_DURATION_JITTER_SECS: f64 = 30.0;
pub const MIN_EVENT_DURATION_SECS: f64 = 30.0;

pub const MIN_STAR_LIFETIME_MS: u64 = 5_000;
pub const OCCUPANCY_DECAY_STEP: f64 = 0.2;
pub const MIN_DECAY_RATE: f64 = 0.1;

pub const CHAT_HISTORY_LIMIT: usize = 50;
pub const CHAT_MESSAGE_MAX_CHARS: usize = 200;

pub const WILDERNESS: &str = "wilderness";

pub const PLAYER_COLORS: [&str; 7] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8",
];

pub fn get_star_base_lifetime_ms(kind: ZoneKind) -> f64 {
    match kind {
        ZoneKind::Public => 15_000.0,
        ZoneKind::Private => 25_000.0,
    }
}

/// Lifetime lost per player standing in the zone at spawn time.
pub fn get_star_occupancy_penalty_ms(kind: ZoneKind) -> f64 {
    match kind {
        ZoneKind::Public => 2_000.0,
        ZoneKind::Private => 0.0,
    }
}

pub fn get_decay_rate(occupancy: usize) -> f64 {
    (1.0 - occupancy as f64 * OCCUPANCY_DECAY_STEP).max(MIN_DECAY_RATE)
}

pub fn get_max_events_for_round(round_number: u32) -> usize {
    (round_number as usize / 2 + 1).min(2)
}
