use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Public,
    Private,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    Playing,
    Ended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatScope {
    Global,
    Zone,
}

impl ChatScope {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "global" => Some(Self::Global),
            "zone" => Some(Self::Zone),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StarScarcity,
    StarAbundance,
    ZoneBoost,
    SpeedBoost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTarget {
    Public,
    Private,
    All,
}

impl EventTarget {
    /// `None` stands for a position outside every zone, where only `All` applies.
    pub fn applies_to(self, kind: Option<ZoneKind>) -> bool {
        match (self, kind) {
            (Self::All, _) => true,
            (Self::Public, Some(ZoneKind::Public)) => true,
            (Self::Private, Some(ZoneKind::Private)) => true,
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModifierField {
    SpawnRate,
    Lifetime,
    Speed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct EventEffect {
    #[serde(rename = "spawnRate", skip_serializing_if = "Option::is_none")]
    pub spawn_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl EventEffect {
    pub fn get(&self, field: ModifierField) -> Option<f64> {
        match field {
            ModifierField::SpawnRate => self.spawn_rate,
            ModifierField::Lifetime => self.lifetime,
            ModifierField::Speed => self.speed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn distance(self, other: Vec2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "type")]
    pub kind: ZoneKind,
    #[serde(rename = "playerCount")]
    pub occupancy: usize,
    #[serde(rename = "starSpawnRate")]
    pub spawn_rate: f64,
    pub color: String,
}

impl Zone {
    /// Inclusive on all four edges.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Star {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "zone")]
    pub zone_id: String,
    #[serde(rename = "type")]
    pub kind: ZoneKind,
    #[serde(rename = "createdAt")]
    pub created_at_ms: u64,
    #[serde(rename = "lifetime")]
    pub lifetime_ms: u64,
}

impl Star {
    pub fn position(&self) -> Vec2 {
        Vec2 {
            x: self.x,
            y: self.y,
        }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) >= self.lifetime_ms
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub score: u32,
    pub color: String,
    pub zone: String,
    #[serde(rename = "isOnline")]
    pub online: bool,
}

impl PlayerView {
    pub fn position(&self) -> Vec2 {
        Vec2 {
            x: self.x,
            y: self.y,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameEvent {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub target: EventTarget,
    pub effect: EventEffect,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScheduledEvent {
    pub event: GameEvent,
    #[serde(rename = "activationDelayMs")]
    pub activation_delay_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActiveEvent {
    pub event: GameEvent,
    #[serde(rename = "activatedAtMs")]
    pub activated_at_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct RoundView {
    pub number: u32,
    #[serde(rename = "totalRounds")]
    pub total_rounds: u32,
    #[serde(rename = "durationSecs")]
    pub duration_secs: u64,
    #[serde(rename = "startTime")]
    pub started_at_ms: u64,
    #[serde(rename = "timeLeftSecs")]
    pub time_left_secs: u64,
    pub events: Vec<ScheduledEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(rename = "playerId")]
    pub player_id: String,
    #[serde(rename = "playerName")]
    pub player_name: String,
    pub message: String,
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub scope: ChatScope,
    #[serde(rename = "zoneId", skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PlayerJoined {
        #[serde(rename = "playerId")]
        player_id: String,
    },
    PlayerLeft {
        #[serde(rename = "playerId")]
        player_id: String,
    },
    StarCollected {
        #[serde(rename = "starId")]
        star_id: String,
        by: String,
    },
    EventStarted {
        #[serde(rename = "eventId")]
        event_id: String,
        name: String,
    },
    EventEnded {
        #[serde(rename = "eventId")]
        event_id: String,
    },
    RoundStarted {
        number: u32,
    },
    GameEnded,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "nowMs")]
    pub now_ms: u64,
    #[serde(rename = "gameStatus")]
    pub status: GameStatus,
    #[serde(rename = "gameTime")]
    pub game_time: u64,
    #[serde(rename = "currentRound")]
    pub round: Option<RoundView>,
    #[serde(rename = "totalRounds")]
    pub total_rounds: u32,
    pub players: Vec<PlayerView>,
    pub stars: Vec<Star>,
    pub zones: Vec<Zone>,
    #[serde(rename = "activeEvents")]
    pub active_events: Vec<ActiveEvent>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoreEntry {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub name: String,
    pub score: u32,
    pub color: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    #[serde(rename = "roundsPlayed")]
    pub rounds_played: u32,
    pub ranking: Vec<ScoreEntry>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ScoreboardResponse {
    #[serde(rename = "generatedAtIso")]
    pub generated_at_iso: String,
    pub status: GameStatus,
    pub entries: Vec<ScoreEntry>,
}
