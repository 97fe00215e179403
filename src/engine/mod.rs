use std::collections::HashMap;

use crate::chat::{ChatLog, ChatLogOptions, PostChatInput};
use crate::constants::{
    MAX_ROUND_DURATION_SECS, MAX_TOTAL_ROUNDS, ROUND_DURATION_SECS, TOTAL_ROUNDS,
};
use crate::events::{EventScheduler, EventTransition};
use crate::rng::Rng;
use crate::server_utils::session_order_key;
use crate::types::{
    ActiveEvent, ChatMessage, ChatScope, GameStatus, GameSummary, PlayerView, RoundView,
    RuntimeEvent, ScoreEntry, Snapshot, Star,
};
use crate::zones::ZoneIndex;

mod player_system;
mod round_system;
mod star_system;
mod utils;

pub use self::player_system::MoveOutcome;
pub use self::round_system::StartOutcome;
pub use self::star_system::CollectOutcome;

use self::utils::{now_ms, seconds_left};

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    pub total_rounds: u32,
    pub round_duration_secs: u64,
    /// Pick up every star in reach after each move, not only on explicit collect.
    pub auto_collect_on_move: bool,
    pub clock_start_ms: Option<u64>,
}

impl Default for GameEngineOptions {
    fn default() -> Self {
        Self {
            total_rounds: TOTAL_ROUNDS,
            round_duration_secs: ROUND_DURATION_SECS,
            auto_collect_on_move: true,
            clock_start_ms: None,
        }
    }
}

#[derive(Clone, Debug)]
struct RoundState {
    number: u32,
    started_at_ms: u64,
}

#[derive(Clone, Debug, Default)]
pub struct StepReport {
    pub round_started: Option<u32>,
    pub game_over: Option<GameSummary>,
}

/// The single authoritative game state. Every command and every tick goes through `&mut self`,
/// so callers serialise access by owning the engine (or holding the one lock around it).
#[derive(Clone, Debug)]
pub struct GameEngine {
    options: GameEngineOptions,
    seed: u32,
    rng: Rng,
    zones: ZoneIndex,
    players: Vec<PlayerView>,
    stars: Vec<Star>,
    scheduler: EventScheduler,
    round: Option<RoundState>,
    rounds_played: u32,
    status: GameStatus,
    chat: ChatLog,
    events: Vec<RuntimeEvent>,

    now_ms: u64,
    tick_counter: u64,
    next_id_counter: u64,
}

impl GameEngine {
    pub fn new(zones: ZoneIndex, seed: u32, options: GameEngineOptions) -> Self {
        let options = GameEngineOptions {
            total_rounds: options.total_rounds.clamp(1, MAX_TOTAL_ROUNDS),
            round_duration_secs: options.round_duration_secs.clamp(1, MAX_ROUND_DURATION_SECS),
            ..options
        };
        let now_ms = options.clock_start_ms.unwrap_or_else(now_ms);
        Self {
            options,
            seed,
            rng: Rng::new(seed),
            zones,
            players: Vec::new(),
            stars: Vec::new(),
            scheduler: EventScheduler::new(),
            round: None,
            rounds_played: 0,
            status: GameStatus::Waiting,
            chat: ChatLog::new(ChatLogOptions::default()),
            events: Vec::new(),
            now_ms,
            tick_counter: 0,
            next_id_counter: 1,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn options(&self) -> &GameEngineOptions {
        &self.options
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn zones(&self) -> &ZoneIndex {
        &self.zones
    }

    pub fn players(&self) -> &[PlayerView] {
        &self.players
    }

    pub fn player(&self, player_id: &str) -> Option<&PlayerView> {
        self.players.iter().find(|player| player.id == player_id)
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn active_events(&self) -> &[ActiveEvent] {
        self.scheduler.active()
    }

    pub fn round_number(&self) -> Option<u32> {
        self.round.as_ref().map(|round| round.number)
    }

    pub fn chat_history(&self) -> Vec<ChatMessage> {
        self.chat.history()
    }

    /// Outside `playing` only the logical clock moves.
    pub fn step(&mut self, dt_ms: u64) -> StepReport {
        self.tick_counter += 1;
        self.now_ms = self.now_ms.saturating_add(dt_ms);
        if self.status != GameStatus::Playing {
            return StepReport::default();
        }

        self.refresh_occupancy();
        self.advance_events();
        self.spawn_stars();
        self.expire_stars();
        self.advance_round()
    }

    pub fn post_chat(
        &mut self,
        player_id: &str,
        message: &str,
        scope: ChatScope,
    ) -> Option<ChatMessage> {
        let player = self.player(player_id)?;
        let input = PostChatInput {
            player_id: player.id.clone(),
            player_name: player.name.clone(),
            message: message.to_string(),
            scope,
            zone_id: Some(player.zone.clone()),
            now_ms: self.now_ms,
        };
        self.chat.post(input)
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let round = self.round.as_ref().map(|round| {
            let duration_ms = self.options.round_duration_secs.saturating_mul(1_000);
            let elapsed_ms = self.now_ms.saturating_sub(round.started_at_ms);
            RoundView {
                number: round.number,
                total_rounds: self.options.total_rounds,
                duration_secs: self.options.round_duration_secs,
                started_at_ms: round.started_at_ms,
                time_left_secs: seconds_left(duration_ms, elapsed_ms),
                events: self.scheduler.scheduled().to_vec(),
            }
        });
        Snapshot {
            tick: self.tick_counter,
            now_ms: self.now_ms,
            status: self.status,
            game_time: round.as_ref().map(|r| r.time_left_secs).unwrap_or(0),
            round,
            total_rounds: self.options.total_rounds,
            players: self.players.clone(),
            stars: self.stars.clone(),
            zones: self.zones.zones().to_vec(),
            active_events: self.scheduler.active().to_vec(),
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
        }
    }

    pub fn scoreboard(&self) -> Vec<ScoreEntry> {
        let mut ranking: Vec<ScoreEntry> = self
            .players
            .iter()
            .map(|player| ScoreEntry {
                player_id: player.id.clone(),
                name: player.name.clone(),
                score: player.score,
                color: player.color.clone(),
            })
            .collect();
        ranking.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| session_order_key(&a.player_id).cmp(&session_order_key(&b.player_id)))
        });
        ranking
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            rounds_played: self.rounds_played,
            ranking: self.scoreboard(),
        }
    }

    fn refresh_occupancy(&mut self) {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for player in &self.players {
            *counts.entry(player.zone.clone()).or_insert(0) += 1;
        }
        self.zones.set_occupancy(&counts);
    }

    fn record_transitions(&mut self, transitions: Vec<EventTransition>) {
        for transition in transitions {
            match transition {
                EventTransition::Activated(active) => {
                    tracing::info!(event_id = %active.event.id, at_ms = active.activated_at_ms, "event started");
                    self.events.push(RuntimeEvent::EventStarted {
                        event_id: active.event.id,
                        name: active.event.name,
                    });
                }
                EventTransition::Deactivated(active) => {
                    tracing::info!(event_id = %active.event.id, "event ended");
                    self.events.push(RuntimeEvent::EventEnded {
                        event_id: active.event.id,
                    });
                }
            }
        }
    }

    fn make_id(&mut self, prefix: &str) -> String {
        let id = format!("{}_{}", prefix, self.next_id_counter);
        self.next_id_counter = self.next_id_counter.saturating_add(1);
        id
    }
}

#[cfg(test)]
impl GameEngine {
    pub(crate) fn insert_star(&mut self, star: Star) {
        self.stars.push(star);
    }

    pub(crate) fn clear_events(&mut self) {
        self.scheduler.clear();
    }
}
