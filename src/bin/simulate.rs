use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Serialize;
use serde_json::json;
use star_rush_server::constants::{
    MAX_ROUND_DURATION_SECS, MAX_TOTAL_ROUNDS, TICK_MS, WORLD_HEIGHT, WORLD_WIDTH,
};
use star_rush_server::engine::{GameEngine, GameEngineOptions, MoveOutcome};
use star_rush_server::logging::init_tracing;
use star_rush_server::map_loader::load_zone_index_or_default;
use star_rush_server::rng::Rng;
use star_rush_server::types::{
    Direction, GameStatus, RuntimeEvent, ScoreEntry, Snapshot, Vec2,
};

/// Headless games with greedy bots; prints one JSON line per run.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, default_value_t = 4)]
    players: usize,
    #[arg(
        long,
        default_value_t = 6,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_TOTAL_ROUNDS))
    )]
    rounds: u32,
    #[arg(
        long,
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..=MAX_ROUND_DURATION_SECS)
    )]
    round_seconds: u64,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = 1)]
    runs: u32,
    #[arg(long)]
    map: Option<PathBuf>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct RunResultLine {
    seed: u32,
    players: usize,
    #[serde(rename = "roundsPlayed")]
    rounds_played: u32,
    ticks: u64,
    #[serde(rename = "starsCollected")]
    stars_collected: usize,
    #[serde(rename = "eventsStarted")]
    events_started: usize,
    #[serde(rename = "peakStars")]
    peak_stars: usize,
    ranking: Vec<ScoreEntry>,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct RoundLine {
    seed: u32,
    round: u32,
    #[serde(rename = "starsCollected")]
    stars_collected: usize,
    #[serde(rename = "eventsStarted")]
    events_started: usize,
    #[serde(rename = "leaderScore")]
    leader_score: u32,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runCount")]
    run_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageStarsCollected")]
    average_stars_collected: f64,
    runs: Vec<RunResultLine>,
}

fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();
    let base_seed = cli.seed.unwrap_or_else(|| rand::random::<u32>());
    let options = GameEngineOptions {
        total_rounds: cli.rounds,
        round_duration_secs: cli.round_seconds,
        clock_start_ms: Some(0),
        ..GameEngineOptions::default()
    };

    let mut results = Vec::new();
    let mut total_anomalies = 0;
    for run in 0..cli.runs.max(1) {
        let seed = base_seed.wrapping_add(run);
        let span = tracing::info_span!("run", seed);
        let _entered = span.enter();

        let engine = GameEngine::new(
            load_zone_index_or_default(cli.map.as_deref()),
            seed,
            options.clone(),
        );
        let (result, rounds, records) = run_game(engine, cli.players);
        for round in &rounds {
            print_json_line(round);
        }
        for record in &records {
            tracing::warn!(tick = record.tick, message = %record.message, "anomaly detected");
        }
        total_anomalies += records.len();
        tracing::info!(
            ticks = result.ticks,
            stars = result.stars_collected,
            events = result.events_started,
            "run finished"
        );

        print_json_line(&result);
        results.push(result);
    }

    let summary = build_run_summary(results, total_anomalies);
    print_json_line(&json!({
        "runCount": summary.run_count,
        "anomalyCount": summary.anomaly_count,
        "averageStarsCollected": summary.average_stars_collected,
    }));
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            tracing::error!(path = %path.display(), %error, "failed to write summary");
            std::process::exit(2);
        }
    }
    if summary.anomaly_count > 0 {
        std::process::exit(1);
    }
}

fn print_json_line<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(error) => tracing::error!(%error, "failed to serialize output line"),
    }
}

fn run_game(
    mut engine: GameEngine,
    player_count: usize,
) -> (RunResultLine, Vec<RoundLine>, Vec<AnomalyRecord>) {
    let mut bot_rng = Rng::new(engine.seed() ^ 0x9E37_79B9);
    let bots: Vec<String> = (0..player_count.max(1))
        .map(|idx| engine.join(&format!("Bot-{:02}", idx + 1)).id)
        .collect();
    engine.start();

    let tick_limit =
        u64::from(engine.options().total_rounds) * engine.options().round_duration_secs + 5;
    let mut anomalies = Vec::new();
    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut stars_collected = 0;
    let mut events_started = 0;
    let mut peak_stars = 0;
    let mut ticks = 0;
    let mut rounds = Vec::new();
    let mut round_number = engine.round_number().unwrap_or(1);
    let mut round_stars = 0;
    let mut round_events = 0;

    while engine.status() == GameStatus::Playing {
        for bot in &bots {
            let dir = choose_direction(&engine, bot, &mut bot_rng);
            if let MoveOutcome::UnknownPlayer = engine.move_player(bot, dir) {
                push_anomaly(
                    &mut anomalies,
                    &mut records,
                    &mut seen,
                    ticks,
                    format!("bot vanished: {bot}"),
                );
            }
        }

        let report = engine.step(TICK_MS);
        ticks += 1;
        let snapshot = engine.build_snapshot(true);
        peak_stars = peak_stars.max(snapshot.stars.len());
        for event in &snapshot.events {
            match event {
                RuntimeEvent::StarCollected { .. } => {
                    stars_collected += 1;
                    round_stars += 1;
                }
                RuntimeEvent::EventStarted { .. } => {
                    events_started += 1;
                    round_events += 1;
                }
                _ => {}
            }
        }
        if report.round_started.is_some() || report.game_over.is_some() {
            rounds.push(RoundLine {
                seed: engine.seed(),
                round: round_number,
                stars_collected: round_stars,
                events_started: round_events,
                leader_score: engine.scoreboard().first().map_or(0, |entry| entry.score),
            });
            round_number = report.round_started.unwrap_or(round_number);
            round_stars = 0;
            round_events = 0;
        }
        for message in collect_snapshot_anomalies(&snapshot) {
            push_anomaly(&mut anomalies, &mut records, &mut seen, ticks, message);
        }

        if ticks > tick_limit {
            push_anomaly(
                &mut anomalies,
                &mut records,
                &mut seen,
                ticks,
                "tick safety limit exceeded".to_string(),
            );
            break;
        }
    }

    let summary = engine.build_summary();
    let awarded: u32 = summary.ranking.iter().map(|entry| entry.score).sum();
    if awarded as usize != stars_collected {
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            ticks,
            format!("score total {awarded} != collected {stars_collected}"),
        );
    }

    let result = RunResultLine {
        seed: engine.seed(),
        players: bots.len(),
        rounds_played: summary.rounds_played,
        ticks,
        stars_collected,
        events_started,
        peak_stars,
        ranking: summary.ranking,
        anomalies,
    };
    (result, rounds, records)
}

/// Head for the nearest star along the longer axis; wander when the field is empty.
fn choose_direction(engine: &GameEngine, player_id: &str, rng: &mut Rng) -> Direction {
    const WANDER: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    let Some(player) = engine.player(player_id) else {
        return WANDER[rng.pick_index(WANDER.len())];
    };
    let position = player.position();
    let nearest = engine.stars().iter().min_by(|a, b| {
        position
            .distance(a.position())
            .total_cmp(&position.distance(b.position()))
    });
    let Some(star) = nearest else {
        return WANDER[rng.pick_index(WANDER.len())];
    };

    direction_toward(position, star.position())
}

fn direction_toward(from: Vec2, to: Vec2) -> Direction {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx.abs() >= dy.abs() {
        if dx >= 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy >= 0.0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();

    for star in &snapshot.stars {
        let inside = snapshot
            .zones
            .iter()
            .find(|zone| zone.id == star.zone_id)
            .is_some_and(|zone| zone.contains(star.x, star.y));
        if !inside {
            anomalies.push(format!("star outside its zone: {}", star.id));
        }
        if snapshot.now_ms.saturating_sub(star.created_at_ms) >= star.lifetime_ms {
            anomalies.push(format!("expired star still listed: {}", star.id));
        }
    }

    for player in &snapshot.players {
        if !(0.0..=WORLD_WIDTH).contains(&player.x) || !(0.0..=WORLD_HEIGHT).contains(&player.y) {
            anomalies.push(format!("player out of bounds: {}", player.id));
        }
    }

    let occupied: usize = snapshot.zones.iter().map(|zone| zone.occupancy).sum();
    if occupied > snapshot.players.len() {
        anomalies.push(format!(
            "occupancy {occupied} exceeds player count {}",
            snapshot.players.len()
        ));
    }

    if let Some(round) = snapshot.round.as_ref() {
        if round.number > snapshot.total_rounds {
            anomalies.push(format!("round {} past total {}", round.number, snapshot.total_rounds));
        }
        if round.time_left_secs > round.duration_secs {
            anomalies.push(format!("timer above duration: {}", round.time_left_secs));
        }
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    records: &mut Vec<AnomalyRecord>,
    seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn build_run_summary(runs: Vec<RunResultLine>, anomaly_count: usize) -> RunSummary {
    let run_count = runs.len();
    let average_stars_collected = if run_count == 0 {
        0.0
    } else {
        runs.iter().map(|run| run.stars_collected).sum::<usize>() as f64 / run_count as f64
    };
    RunSummary {
        run_count,
        anomaly_count,
        average_stars_collected,
        runs,
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use star_rush_server::zones::ZoneIndex;

    fn short_engine(seed: u32) -> GameEngine {
        GameEngine::new(
            ZoneIndex::default_layout(),
            seed,
            GameEngineOptions {
                total_rounds: 2,
                round_duration_secs: 60,
                clock_start_ms: Some(0),
                ..GameEngineOptions::default()
            },
        )
    }

    #[test]
    fn short_game_runs_clean() {
        let (result, rounds, records) = run_game(short_engine(42), 3);
        assert!(records.is_empty(), "anomalies: {:?}", result.anomalies);
        assert_eq!(result.rounds_played, 2);
        assert_eq!(rounds.iter().map(|line| line.round).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(
            rounds.iter().map(|line| line.stars_collected).sum::<usize>(),
            result.stars_collected
        );
        assert_eq!(result.ticks, 120);
        assert_eq!(result.players, 3);
    }

    #[test]
    fn cli_bounds_round_settings() {
        assert!(Cli::try_parse_from(["simulate", "--round-seconds", "0"]).is_err());
        assert!(Cli::try_parse_from(["simulate", "--round-seconds", "100000"]).is_err());
        assert!(Cli::try_parse_from(["simulate", "--rounds", "0"]).is_err());
        let cli = Cli::try_parse_from(["simulate", "--rounds", "2", "--round-seconds", "60"])
            .expect("valid flags");
        assert_eq!((cli.rounds, cli.round_seconds), (2, 60));
    }

    #[test]
    fn direction_follows_the_longer_axis() {
        let origin = Vec2 { x: 100.0, y: 100.0 };
        assert_eq!(direction_toward(origin, Vec2 { x: 150.0, y: 120.0 }), Direction::Right);
        assert_eq!(direction_toward(origin, Vec2 { x: 90.0, y: 40.0 }), Direction::Up);
        assert_eq!(direction_toward(origin, Vec2 { x: 100.0, y: 130.0 }), Direction::Down);
        assert_eq!(direction_toward(origin, Vec2 { x: 20.0, y: 100.0 }), Direction::Left);
    }

    #[test]
    fn build_run_summary_averages_collections() {
        let line = |stars| RunResultLine {
            seed: 1,
            players: 2,
            rounds_played: 1,
            ticks: 10,
            stars_collected: stars,
            events_started: 1,
            peak_stars: 3,
            ranking: Vec::new(),
            anomalies: Vec::new(),
        };
        let summary = build_run_summary(vec![line(4), line(6)], 0);
        assert_eq!(summary.run_count, 2);
        assert_eq!(summary.average_stars_collected, 5.0);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = std::env::temp_dir()
            .join(format!("star-rush-missing-{}", std::process::id()))
            .join("summary.json");
        let summary = build_run_summary(Vec::new(), 0);
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 10, "same".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 11, "same".to_string());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tick, 11);
    }
}
