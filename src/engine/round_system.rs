use super::*;

use crate::events::plan_round;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    Restarted,
    AlreadyPlaying,
}

impl GameEngine {
    pub fn start(&mut self) -> StartOutcome {
        let outcome = match self.status {
            GameStatus::Playing => return StartOutcome::AlreadyPlaying,
            GameStatus::Waiting => StartOutcome::Started,
            GameStatus::Ended => {
                for player in &mut self.players {
                    player.score = 0;
                }
                StartOutcome::Restarted
            }
        };

        self.stars.clear();
        self.rounds_played = 0;
        self.status = GameStatus::Playing;
        tracing::info!(
            players = self.players.len(),
            total_rounds = self.options.total_rounds,
            "game started"
        );
        self.begin_round(1);
        outcome
    }

    pub(super) fn advance_events(&mut self) {
        let transitions = self.scheduler.advance(self.now_ms);
        self.record_transitions(transitions);
    }

    pub(super) fn advance_round(&mut self) -> StepReport {
        let Some(round) = self.round.clone() else {
            return StepReport::default();
        };
        debug_assert!(
            self.now_ms >= round.started_at_ms,
            "round clock ran backwards"
        );
        let elapsed_ms = self.now_ms.saturating_sub(round.started_at_ms);
        if elapsed_ms < self.options.round_duration_secs.saturating_mul(1_000) {
            return StepReport::default();
        }

        if round.number < self.options.total_rounds {
            let next = round.number + 1;
            self.begin_round(next);
            return StepReport {
                round_started: Some(next),
                game_over: None,
            };
        }

        StepReport {
            round_started: None,
            game_over: Some(self.end_game()),
        }
    }

    fn begin_round(&mut self, number: u32) {
        debug_assert!((1..=self.options.total_rounds).contains(&number));
        let started_at_ms = self.now_ms;
        let planned = plan_round(number, &mut self.rng);
        let event_ids: Vec<&str> = planned.iter().map(|s| s.event.id.as_str()).collect();
        tracing::info!(round = number, events = ?event_ids, "round started");
        let ended = self.scheduler.arm(started_at_ms, planned);
        self.record_transitions(ended);
        self.round = Some(RoundState {
            number,
            started_at_ms,
        });
        self.rounds_played = number;
        self.events.push(RuntimeEvent::RoundStarted { number });
        self.advance_events();
    }

    fn end_game(&mut self) -> GameSummary {
        let ended = self.scheduler.clear();
        self.record_transitions(ended);
        self.round = None;
        self.stars.clear();
        self.status = GameStatus::Ended;
        self.events.push(RuntimeEvent::GameEnded);
        let summary = self.build_summary();
        tracing::info!(
            rounds = summary.rounds_played,
            winner = summary.ranking.first().map(|entry| entry.name.as_str()),
            "game ended"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::make_engine;

    fn short_engine(rounds: u32) -> GameEngine {
        GameEngine::new(
            ZoneIndex::default_layout(),
            17,
            GameEngineOptions {
                total_rounds: rounds,
                round_duration_secs: 10,
                clock_start_ms: Some(0),
                ..GameEngineOptions::default()
            },
        )
    }

    #[test]
    fn start_is_idempotent_while_playing() {
        let mut engine = make_engine(1);
        assert_eq!(engine.start(), StartOutcome::Started);
        engine.step(1_000);
        assert_eq!(engine.start(), StartOutcome::AlreadyPlaying);
        assert_eq!(engine.round_number(), Some(1));
    }

    #[test]
    fn rounds_advance_then_game_ends_and_stays_ended() {
        let mut engine = short_engine(3);
        engine.start();
        let mut seen_rounds = vec![1];
        let mut summaries = 0;
        for _ in 0..100 {
            let report = engine.step(1_000);
            if let Some(number) = report.round_started {
                seen_rounds.push(number);
            }
            if report.game_over.is_some() {
                summaries += 1;
            }
            if let Some(number) = engine.round_number() {
                assert!(number <= 3);
            }
        }
        assert_eq!(seen_rounds, vec![1, 2, 3]);
        assert_eq!(summaries, 1);
        assert_eq!(engine.status(), GameStatus::Ended);
        assert_eq!(engine.round_number(), None);
        assert!(engine.stars().is_empty());
        assert!(engine.active_events().is_empty());
    }

    #[test]
    fn round_rolls_over_exactly_at_duration() {
        let mut engine = short_engine(2);
        engine.start();
        for _ in 0..9 {
            assert_eq!(engine.step(1_000).round_started, None);
        }
        assert_eq!(engine.step(1_000).round_started, Some(2));
        let snapshot = engine.build_snapshot(false);
        assert_eq!(snapshot.game_time, 10);
    }

    #[test]
    fn restart_from_ended_resets_scores_and_round() {
        let mut engine = short_engine(1);
        let player = engine.join("A");
        engine.start();
        engine.players[0].score = 7;
        for _ in 0..10 {
            engine.step(1_000);
        }
        assert_eq!(engine.status(), GameStatus::Ended);
        assert_eq!(engine.build_summary().ranking[0].score, 7);

        assert_eq!(engine.start(), StartOutcome::Restarted);
        assert_eq!(engine.status(), GameStatus::Playing);
        assert_eq!(engine.round_number(), Some(1));
        assert_eq!(engine.player(&player.id).map(|p| p.score), Some(0));
    }

    #[test]
    fn every_event_activation_is_paired_with_one_deactivation() {
        let mut engine = GameEngine::new(
            ZoneIndex::default_layout(),
            31,
            GameEngineOptions {
                total_rounds: 6,
                round_duration_secs: 300,
                clock_start_ms: Some(0),
                ..GameEngineOptions::default()
            },
        );
        engine.start();
        let mut started = Vec::new();
        let mut ended = Vec::new();
        for _ in 0..2_000 {
            engine.step(1_000);
            for event in engine.build_snapshot(true).events {
                match event {
                    RuntimeEvent::EventStarted { event_id, .. } => started.push(event_id),
                    RuntimeEvent::EventEnded { event_id } => ended.push(event_id),
                    _ => {}
                }
            }
        }
        assert_eq!(engine.status(), GameStatus::Ended);
        assert!(!started.is_empty());
        started.sort();
        ended.sort();
        assert_eq!(started, ended);
    }

    #[test]
    fn waiting_engine_ignores_round_clock() {
        let mut engine = short_engine(1);
        for _ in 0..50 {
            assert!(engine.step(1_000).game_over.is_none());
        }
        assert_eq!(engine.status(), GameStatus::Waiting);
    }
}
