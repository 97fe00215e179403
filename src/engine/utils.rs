use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::{WORLD_HEIGHT, WORLD_WIDTH};
use crate::types::Direction;

pub(super) fn now_ms() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    now as u64
}

pub(super) fn offset(dir: Direction, step: f64) -> (f64, f64) {
    match dir {
        Direction::Up => (0.0, -step),
        Direction::Down => (0.0, step),
        Direction::Left => (-step, 0.0),
        Direction::Right => (step, 0.0),
    }
}

pub(super) fn clamp_to_world(x: f64, y: f64) -> (f64, f64) {
    (x.clamp(0.0, WORLD_WIDTH), y.clamp(0.0, WORLD_HEIGHT))
}

/// Whole seconds left, rounded up so the last partial second still shows as 1.
pub(super) fn seconds_left(duration_ms: u64, elapsed_ms: u64) -> u64 {
    duration_ms.saturating_sub(elapsed_ms).div_ceil(1_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_holds_world_bounds() {
        assert_eq!(clamp_to_world(-5.0, 700.0), (0.0, WORLD_HEIGHT));
        assert_eq!(clamp_to_world(900.0, -1.0), (WORLD_WIDTH, 0.0));
        assert_eq!(clamp_to_world(12.5, 40.0), (12.5, 40.0));
    }

    #[test]
    fn offset_moves_along_one_axis() {
        assert_eq!(offset(Direction::Up, 10.0), (0.0, -10.0));
        assert_eq!(offset(Direction::Right, 15.0), (15.0, 0.0));
    }

    #[test]
    fn seconds_left_never_goes_negative() {
        assert_eq!(seconds_left(300_000, 0), 300);
        assert_eq!(seconds_left(300_000, 299_500), 1);
        assert_eq!(seconds_left(300_000, 300_000), 0);
        assert_eq!(seconds_left(300_000, 400_000), 0);
    }
}
