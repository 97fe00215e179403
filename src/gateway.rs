use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::engine::{CollectOutcome, GameEngine, MoveOutcome, StartOutcome, StepReport};
use crate::server_protocol::{parse_client_message, ParsedClientMessage};
use crate::server_utils::normalize_scoreboard_limit;
use crate::types::{ChatScope, Direction, ScoreboardResponse};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

#[derive(Clone)]
struct Session {
    tx: mpsc::Sender<OutboundMessage>,
    player_id: Option<String>,
}

/// Translates client frames into engine calls and engine state into outbound frames.
/// Holds no game rules of its own; the server wraps it in the one shared lock.
pub struct SessionGateway {
    engine: GameEngine,
    sessions: HashMap<String, Session>,
    next_session_id: u64,
}

impl SessionGateway {
    pub fn new(engine: GameEngine) -> Self {
        Self {
            engine,
            sessions: HashMap::new(),
            next_session_id: 1,
        }
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn player_for(&self, session_id: &str) -> Option<&str> {
        self.sessions
            .get(session_id)
            .and_then(|session| session.player_id.as_deref())
    }

    pub fn connect(&mut self, tx: mpsc::Sender<OutboundMessage>) -> String {
        let session_id = format!("session_{}", self.next_session_id);
        self.next_session_id += 1;
        self.sessions.insert(
            session_id.clone(),
            Session {
                tx,
                player_id: None,
            },
        );
        tracing::debug!(session_id = %session_id, sessions = self.sessions.len(), "session connected");

        let message = self.state_message(false);
        self.send_to(&session_id, &message, QueuePolicy::DropOnFull);
        session_id
    }

    pub fn handle_raw(&mut self, session_id: &str, raw: &str) {
        let Some(message) = parse_client_message(raw) else {
            tracing::debug!(session_id = %session_id, "rejected malformed frame");
            self.send_error(session_id, "invalid message");
            return;
        };

        match message {
            ParsedClientMessage::Join { name } => self.on_join(session_id, &name),
            ParsedClientMessage::Move { dir } => self.on_move(session_id, dir),
            ParsedClientMessage::Collect { star_id } => self.on_collect(session_id, &star_id),
            ParsedClientMessage::Chat { message, scope } => {
                self.on_chat(session_id, &message, scope)
            }
            ParsedClientMessage::Start => self.on_start_game(session_id),
        }
    }

    pub fn on_join(&mut self, session_id: &str, name: &str) {
        let Some(session) = self.sessions.get(session_id) else {
            return;
        };
        if let Some(player_id) = session.player_id.clone() {
            // Second join on the same socket re-sends the identity it already has.
            if let Some(player) = self.engine.player(&player_id).cloned() {
                self.send_to(
                    session_id,
                    &json!({ "type": "self", "player": player }),
                    QueuePolicy::DisconnectOnFull,
                );
            }
            return;
        }

        let player = self.engine.join(name);
        if let Some(session) = self.sessions.get_mut(session_id) {
            session.player_id = Some(player.id.clone());
        }
        self.send_to(
            session_id,
            &json!({ "type": "self", "player": player }),
            QueuePolicy::DisconnectOnFull,
        );
        let history = self.engine.chat_history();
        if !history.is_empty() {
            self.send_to(
                session_id,
                &json!({ "type": "chat_history", "messages": history }),
                QueuePolicy::DisconnectOnFull,
            );
        }
        self.broadcast_state();
    }

    pub fn on_move(&mut self, session_id: &str, dir: Direction) {
        let Some(player_id) = self.player_for(session_id).map(str::to_string) else {
            return;
        };
        if let MoveOutcome::Moved { .. } = self.engine.move_player(&player_id, dir) {
            self.broadcast_state();
        }
    }

    pub fn on_collect(&mut self, session_id: &str, star_id: &str) {
        let Some(player_id) = self.player_for(session_id).map(str::to_string) else {
            return;
        };
        match self.engine.collect(&player_id, star_id) {
            CollectOutcome::Collected { .. } => self.broadcast_state(),
            outcome => {
                tracing::debug!(player_id = %player_id, star_id = %star_id, ?outcome, "collect ignored");
            }
        }
    }

    pub fn on_chat(&mut self, session_id: &str, message: &str, scope: ChatScope) {
        let Some(player_id) = self.player_for(session_id).map(str::to_string) else {
            return;
        };
        let Some(record) = self.engine.post_chat(&player_id, message, scope) else {
            return;
        };
        self.broadcast(
            &json!({ "type": "chat", "message": record }),
            QueuePolicy::DisconnectOnFull,
        );
    }

    pub fn on_start_game(&mut self, session_id: &str) {
        if !self.sessions.contains_key(session_id) {
            return;
        }
        match self.engine.start() {
            StartOutcome::AlreadyPlaying => {}
            outcome => {
                tracing::info!(session_id = %session_id, ?outcome, "start requested");
                self.broadcast_state();
            }
        }
    }

    pub fn on_disconnect(&mut self, session_id: &str) {
        let Some(session) = self.sessions.remove(session_id) else {
            return;
        };
        tracing::debug!(session_id = %session_id, sessions = self.sessions.len(), "session closed");
        if let Some(player_id) = session.player_id {
            if self.engine.remove_player(&player_id).is_some() {
                self.broadcast_state();
            }
        }
    }

    pub fn tick(&mut self, dt_ms: u64) -> StepReport {
        let report = self.engine.step(dt_ms);
        let message = self.state_message(true);
        self.broadcast(&message, QueuePolicy::DropOnFull);

        if let Some(summary) = report.game_over.as_ref() {
            self.broadcast(
                &json!({ "type": "game_over", "summary": summary }),
                QueuePolicy::DisconnectOnFull,
            );
        }
        report
    }

    pub fn scoreboard(&self, limit: Option<usize>) -> ScoreboardResponse {
        let limit = normalize_scoreboard_limit(limit);
        let mut entries = self.engine.scoreboard();
        entries.truncate(limit);
        ScoreboardResponse {
            generated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            status: self.engine.status(),
            entries,
        }
    }

    fn state_message(&mut self, include_events: bool) -> Value {
        let snapshot = self.engine.build_snapshot(include_events);
        json!({ "type": "state", "snapshot": snapshot })
    }

    fn broadcast_state(&mut self) {
        let message = self.state_message(false);
        self.broadcast(&message, QueuePolicy::DropOnFull);
    }

    fn send_error(&mut self, session_id: &str, message: &str) {
        self.send_to(
            session_id,
            &json!({ "type": "error", "message": message }),
            QueuePolicy::DisconnectOnFull,
        );
    }

    fn send_to(&mut self, session_id: &str, message: &Value, policy: QueuePolicy) {
        let send_failed = self.sessions.get(session_id).is_some_and(|session| {
            session
                .tx
                .try_send(OutboundMessage::Text(message.to_string()))
                .is_err()
        });
        if send_failed && policy == QueuePolicy::DisconnectOnFull {
            self.drop_session(session_id);
        }
    }

    fn broadcast(&mut self, message: &Value, policy: QueuePolicy) {
        let payload = message.to_string();
        let mut failed_sessions = Vec::new();
        for (session_id, session) in &self.sessions {
            if session
                .tx
                .try_send(OutboundMessage::Text(payload.clone()))
                .is_err()
                && policy == QueuePolicy::DisconnectOnFull
            {
                failed_sessions.push(session_id.clone());
            }
        }
        for session_id in failed_sessions {
            self.drop_session(&session_id);
        }
    }

    fn drop_session(&mut self, session_id: &str) {
        let Some(session) = self.sessions.remove(session_id) else {
            return;
        };
        tracing::warn!(session_id = %session_id, "outbound queue full, closing session");
        let _ = session.tx.try_send(OutboundMessage::Close {
            code: 1013,
            reason: "outbound queue full".to_string(),
        });
        if let Some(player_id) = session.player_id {
            self.engine.remove_player(&player_id);
        }
    }
}
