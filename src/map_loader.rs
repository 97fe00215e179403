use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants::{WILDERNESS, WORLD_HEIGHT, WORLD_WIDTH};
use crate::types::{Zone, ZoneKind};
use crate::zones::ZoneIndex;

const DEFAULT_SPAWN_RATE: f64 = 5.0;
const PUBLIC_COLOR: &str = "rgba(59, 130, 246, 0.3)";
const PRIVATE_COLOR: &str = "rgba(168, 85, 247, 0.3)";

#[derive(Debug, thiserror::Error)]
pub enum MapLoadError {
    #[error("failed to read map file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse map file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid map: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapFile {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
    zones: Vec<ZoneRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoneRecord {
    id: String,
    #[serde(default)]
    name: Option<String>,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    #[serde(default, alias = "type")]
    kind: Option<ZoneKind>,
    #[serde(default)]
    spawn_rate: Option<f64>,
    #[serde(default)]
    color: Option<String>,
}

pub fn load_zones(path: &Path) -> Result<Vec<Zone>, MapLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| MapLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_zones(&raw)
}

/// Parses and validates a map document. Zone order is preserved; it decides overlap resolution.
pub fn parse_zones(raw: &str) -> Result<Vec<Zone>, MapLoadError> {
    let map: MapFile = serde_json::from_str(raw)?;
    let width = map.width.unwrap_or(WORLD_WIDTH);
    let height = map.height.unwrap_or(WORLD_HEIGHT);
    if width != WORLD_WIDTH || height != WORLD_HEIGHT {
        return Err(MapLoadError::Invalid(format!(
            "map size {width}x{height} does not match the {WORLD_WIDTH}x{WORLD_HEIGHT} arena"
        )));
    }
    if map.zones.is_empty() {
        return Err(MapLoadError::Invalid("map has no zones".to_string()));
    }

    let mut seen = HashSet::new();
    let mut zones = Vec::with_capacity(map.zones.len());
    for (index, record) in map.zones.into_iter().enumerate() {
        validate_record(&record)?;
        if !seen.insert(record.id.clone()) {
            return Err(MapLoadError::Invalid(format!("duplicate zone id {}", record.id)));
        }
        let kind = record.kind.unwrap_or(ZoneKind::Public);
        zones.push(Zone {
            name: record.name.unwrap_or_else(|| format!("Area {}", index + 1)),
            id: record.id,
            x: record.x,
            y: record.y,
            width: record.width,
            height: record.height,
            kind,
            occupancy: 0,
            spawn_rate: record.spawn_rate.unwrap_or(DEFAULT_SPAWN_RATE),
            color: record.color.unwrap_or_else(|| default_color(kind).to_string()),
        });
    }

    tracing::debug!(
        map_id = map.id.as_deref().unwrap_or("unnamed"),
        map_name = map.name.as_deref().unwrap_or(""),
        zones = zones.len(),
        "map parsed"
    );
    Ok(zones)
}

/// Zones from `path`, or the built-in layout when no path is given or the file is unusable.
pub fn load_zone_index_or_default(path: Option<&Path>) -> ZoneIndex {
    let Some(path) = path else {
        return ZoneIndex::default_layout();
    };
    match load_zones(path) {
        Ok(zones) => {
            tracing::info!(path = %path.display(), zones = zones.len(), "loaded map");
            ZoneIndex::new(zones)
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "falling back to default map");
            ZoneIndex::default_layout()
        }
    }
}

fn validate_record(record: &ZoneRecord) -> Result<(), MapLoadError> {
    let id = record.id.trim();
    if id.is_empty() {
        return Err(MapLoadError::Invalid("zone id must not be empty".to_string()));
    }
    if id == WILDERNESS {
        return Err(MapLoadError::Invalid(format!("zone id {WILDERNESS} is reserved")));
    }

    let numbers = [record.x, record.y, record.width, record.height];
    if numbers.iter().any(|value| !value.is_finite()) {
        return Err(MapLoadError::Invalid(format!("zone {id} has non-finite geometry")));
    }
    if record.width <= 0.0 || record.height <= 0.0 {
        return Err(MapLoadError::Invalid(format!("zone {id} has non-positive size")));
    }
    if record.x < 0.0
        || record.y < 0.0
        || record.x + record.width > WORLD_WIDTH
        || record.y + record.height > WORLD_HEIGHT
    {
        return Err(MapLoadError::Invalid(format!("zone {id} leaves the arena")));
    }
    if let Some(rate) = record.spawn_rate {
        if !rate.is_finite() || rate < 0.0 {
            return Err(MapLoadError::Invalid(format!("zone {id} has invalid spawnRate {rate}")));
        }
    }
    Ok(())
}

fn default_color(kind: ZoneKind) -> &'static str {
    match kind {
        ZoneKind::Public => PUBLIC_COLOR,
        ZoneKind::Private => PRIVATE_COLOR,
    }
}
