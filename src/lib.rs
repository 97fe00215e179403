pub mod chat;
pub mod config;
pub mod constants;
pub mod engine;
pub mod events;
pub mod gateway;
pub mod logging;
pub mod map_loader;
pub mod rng;
pub mod server_protocol;
pub mod server_utils;
pub mod types;
pub mod zones;
