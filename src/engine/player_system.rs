use super::*;

use crate::constants::{ENTRY_POINT, MOVE_STEP, PLAYER_COLORS};
use crate::events::modifier_for;
use crate::server_utils::sanitize_name;
use crate::types::{Direction, ModifierField};

use super::utils::{clamp_to_world, offset};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { collected: Vec<String> },
    NotPlaying,
    UnknownPlayer,
}

impl GameEngine {
    pub fn join(&mut self, name: &str) -> PlayerView {
        let id = self.make_id("player");
        let (x, y) = ENTRY_POINT;
        let color = PLAYER_COLORS[self.rng.pick_index(PLAYER_COLORS.len())].to_string();
        let player = PlayerView {
            id: id.clone(),
            name: sanitize_name(name),
            x,
            y,
            score: 0,
            color,
            zone: self.zones.resolve(x, y).to_string(),
            online: true,
        };
        tracing::info!(player_id = %id, name = %player.name, zone = %player.zone, "player joined");
        self.players.push(player.clone());
        self.events.push(RuntimeEvent::PlayerJoined { player_id: id });
        player
    }

    pub fn move_player(&mut self, player_id: &str, dir: Direction) -> MoveOutcome {
        let Some(idx) = self.player_index(player_id) else {
            return MoveOutcome::UnknownPlayer;
        };
        if self.status != GameStatus::Playing {
            return MoveOutcome::NotPlaying;
        }

        let kind = self.zones.kind_of(&self.players[idx].zone);
        let step = MOVE_STEP * modifier_for(kind, self.scheduler.active(), ModifierField::Speed);
        let (dx, dy) = offset(dir, step);
        let (x, y) = clamp_to_world(self.players[idx].x + dx, self.players[idx].y + dy);
        let zone = self.zones.resolve(x, y).to_string();

        let player = &mut self.players[idx];
        player.x = x;
        player.y = y;
        if player.zone != zone {
            tracing::debug!(player_id = %player.id, from = %player.zone, to = %zone, "zone changed");
            player.zone = zone;
        }

        let collected = if self.options.auto_collect_on_move {
            self.collect_in_reach(idx)
        } else {
            Vec::new()
        };
        MoveOutcome::Moved { collected }
    }

    pub fn remove_player(&mut self, player_id: &str) -> Option<PlayerView> {
        let idx = self.player_index(player_id)?;
        let player = self.players.remove(idx);
        tracing::info!(player_id = %player.id, score = player.score, "player left");
        self.events.push(RuntimeEvent::PlayerLeft {
            player_id: player.id.clone(),
        });
        Some(player)
    }

    pub(super) fn player_index(&self, player_id: &str) -> Option<usize> {
        self.players.iter().position(|player| player.id == player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{WORLD_HEIGHT, WORLD_WIDTH};
    use crate::engine::tests::make_engine;
    use crate::events::event_catalog;
    use crate::types::{ScheduledEvent, ZoneKind};

    fn playing_engine(seed: u32) -> GameEngine {
        let mut engine = make_engine(seed);
        engine.start();
        engine.scheduler.clear();
        engine
    }

    #[test]
    fn join_places_player_at_entry_point() {
        let mut engine = make_engine(1);
        let player = engine.join("  Alice  ");
        assert_eq!(player.name, "Alice");
        assert_eq!((player.x, player.y), ENTRY_POINT);
        assert_eq!(player.zone, "central-plaza");
        assert_eq!(player.score, 0);
        assert!(PLAYER_COLORS.contains(&player.color.as_str()));
        assert_eq!(engine.players().len(), 1);
    }

    #[test]
    fn five_steps_right_stay_in_plaza() {
        let mut engine = playing_engine(2);
        let player = engine.join("Mover");
        for _ in 0..5 {
            assert!(matches!(
                engine.move_player(&player.id, Direction::Right),
                MoveOutcome::Moved { .. }
            ));
        }
        let moved = engine.player(&player.id).expect("player");
        assert_eq!((moved.x, moved.y), (350.0, 300.0));
        assert_eq!(moved.zone, "central-plaza");
    }

    #[test]
    fn moves_are_clamped_to_world_bounds() {
        let mut engine = playing_engine(3);
        let player = engine.join("Edge");
        for _ in 0..100 {
            engine.move_player(&player.id, Direction::Left);
            engine.move_player(&player.id, Direction::Down);
        }
        let moved = engine.player(&player.id).expect("player");
        assert_eq!((moved.x, moved.y), (0.0, WORLD_HEIGHT));
        assert_eq!(moved.zone, "wilderness");

        for _ in 0..100 {
            engine.move_player(&player.id, Direction::Right);
            engine.move_player(&player.id, Direction::Up);
        }
        let moved = engine.player(&player.id).expect("player");
        assert_eq!((moved.x, moved.y), (WORLD_WIDTH, 0.0));
    }

    #[test]
    fn moves_are_ignored_outside_playing() {
        let mut engine = make_engine(4);
        let player = engine.join("Idle");
        assert_eq!(
            engine.move_player(&player.id, Direction::Up),
            MoveOutcome::NotPlaying
        );
        assert_eq!(engine.player(&player.id).map(|p| (p.x, p.y)), Some(ENTRY_POINT));
        assert_eq!(
            engine.move_player("player_404", Direction::Up),
            MoveOutcome::UnknownPlayer
        );
    }

    #[test]
    fn speed_surge_lengthens_the_step() {
        let mut engine = playing_engine(5);
        let player = engine.join("Fast");
        let surge = event_catalog()
            .into_iter()
            .find(|event| event.id == "speed_surge")
            .expect("catalog entry");
        engine.scheduler.arm(
            engine.now_ms,
            vec![ScheduledEvent {
                event: surge,
                activation_delay_ms: 0,
            }],
        );
        engine.scheduler.advance(engine.now_ms);

        engine.move_player(&player.id, Direction::Up);
        let moved = engine.player(&player.id).expect("player");
        assert_eq!((moved.x, moved.y), (300.0, 285.0));
    }

    #[test]
    fn moving_onto_a_star_collects_it() {
        let mut engine = playing_engine(6);
        let player = engine.join("Picker");
        engine.stars.push(Star {
            id: "star_near".to_string(),
            x: 330.0,
            y: 300.0,
            zone_id: "central-plaza".to_string(),
            kind: ZoneKind::Public,
            created_at_ms: engine.now_ms,
            lifetime_ms: 10_000,
        });

        let outcome = engine.move_player(&player.id, Direction::Right);
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                collected: vec!["star_near".to_string()]
            }
        );
        assert_eq!(engine.player(&player.id).map(|p| p.score), Some(1));
        assert!(engine.stars().is_empty());
    }

    #[test]
    fn remove_player_drops_them_and_emits_left() {
        let mut engine = make_engine(7);
        let a = engine.join("A");
        let b = engine.join("B");
        engine.build_snapshot(true);

        assert_eq!(engine.remove_player(&a.id).map(|p| p.id), Some(a.id.clone()));
        assert!(engine.remove_player(&a.id).is_none());
        assert_eq!(engine.players().len(), 1);
        assert_eq!(engine.players()[0].id, b.id);
        assert_eq!(
            engine.build_snapshot(true).events,
            vec![RuntimeEvent::PlayerLeft { player_id: a.id }]
        );
    }
}
