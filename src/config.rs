use std::path::PathBuf;

use clap::Parser;

use crate::constants::{
    MAX_ROUND_DURATION_SECS, MAX_TOTAL_ROUNDS, ROUND_DURATION_SECS, TOTAL_ROUNDS,
};
use crate::engine::GameEngineOptions;

/// Server settings. Every flag can also come from the environment (or a `.env` file).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Star-Rush multiplayer session server")]
pub struct ServerConfig {
    #[arg(long, env = "PORT", default_value_t = 4000)]
    pub port: u16,

    /// JSON zone layout; the built-in layout is used when missing or invalid.
    #[arg(long = "map", env = "MAP_PATH")]
    pub map_path: Option<PathBuf>,

    /// Directory with a built client to serve at `/`.
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "TOTAL_ROUNDS",
        default_value_t = TOTAL_ROUNDS,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_TOTAL_ROUNDS))
    )]
    pub total_rounds: u32,

    /// Round length in seconds, at most one day.
    #[arg(
        long,
        env = "ROUND_SECONDS",
        default_value_t = ROUND_DURATION_SECS,
        value_parser = clap::value_parser!(u64).range(1..=MAX_ROUND_DURATION_SECS)
    )]
    pub round_seconds: u64,

    /// Fixed RNG seed; drawn from OS entropy when omitted.
    #[arg(long, env = "GAME_SEED")]
    pub seed: Option<u32>,
}

impl ServerConfig {
    pub fn engine_options(&self) -> GameEngineOptions {
        GameEngineOptions {
            total_rounds: self.total_rounds,
            round_duration_secs: self.round_seconds,
            ..GameEngineOptions::default()
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "server",
            "--port",
            "9001",
            "--map",
            "maps/arena.json",
            "--total-rounds",
            "2",
            "--round-seconds",
            "30",
            "--seed",
            "42",
        ])
        .expect("valid flags");
        assert_eq!(config.port, 9001);
        assert_eq!(config.map_path, Some(PathBuf::from("maps/arena.json")));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.bind_addr(), "0.0.0.0:9001");

        let options = config.engine_options();
        assert_eq!(options.total_rounds, 2);
        assert_eq!(options.round_duration_secs, 30);
        assert!(options.auto_collect_on_move);
    }

    #[test]
    fn round_settings_are_bounded() {
        for args in [
            ["server", "--round-seconds", "0"],
            ["server", "--round-seconds", "86401"],
            ["server", "--round-seconds", "18446744073709551615"],
            ["server", "--total-rounds", "0"],
            ["server", "--total-rounds", "101"],
        ] {
            assert!(ServerConfig::try_parse_from(args).is_err(), "accepted {args:?}");
        }

        let config = ServerConfig::try_parse_from(["server", "--round-seconds", "86400"])
            .expect("one day is allowed");
        assert_eq!(config.round_seconds, MAX_ROUND_DURATION_SECS);
        assert_eq!(config.total_rounds, TOTAL_ROUNDS);
    }

    #[test]
    fn rejects_non_numeric_seed() {
        assert!(ServerConfig::try_parse_from(["server", "--seed", "abc"]).is_err());
    }
}
