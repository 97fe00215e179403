use std::collections::HashMap;

use crate::constants::WILDERNESS;
use crate::types::{Zone, ZoneKind};

/// Ordered zone list with first-match point lookup.
///
/// Zones keep the order they were loaded in. When rectangles overlap, the earlier zone wins;
/// area and nesting play no part. Only `occupancy` ever changes after construction.
#[derive(Clone, Debug)]
pub struct ZoneIndex {
    zones: Vec<Zone>,
}

impl ZoneIndex {
    pub fn new(zones: Vec<Zone>) -> Self {
        if zones.is_empty() {
            tracing::warn!("empty zone list supplied, using built-in layout");
            return Self::default_layout();
        }
        Self { zones }
    }

    pub fn default_layout() -> Self {
        Self {
            zones: default_zones(),
        }
    }

    pub fn resolve(&self, x: f64, y: f64) -> &str {
        self.zone_at(x, y)
            .map(|zone| zone.id.as_str())
            .unwrap_or(WILDERNESS)
    }

    pub fn zone_at(&self, x: f64, y: f64) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.contains(x, y))
    }

    pub fn get(&self, zone_id: &str) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.id == zone_id)
    }

    pub fn kind_of(&self, zone_id: &str) -> Option<ZoneKind> {
        self.get(zone_id).map(|zone| zone.kind)
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Overwrites every zone's occupancy; zones absent from `counts` drop to zero.
    pub(crate) fn set_occupancy(&mut self, counts: &HashMap<String, usize>) {
        for zone in &mut self.zones {
            zone.occupancy = counts.get(&zone.id).copied().unwrap_or(0);
        }
    }
}

pub fn default_zones() -> Vec<Zone> {
    vec![
        zone(
            "central-plaza",
            "Central Plaza",
            (200.0, 200.0, 200.0, 200.0),
            ZoneKind::Public,
            5.0,
            "rgba(255, 215, 0, 0.3)",
        ),
        zone(
            "north-gardens",
            "North Gardens",
            (100.0, 50.0, 150.0, 120.0),
            ZoneKind::Public,
            3.0,
            "rgba(0, 255, 127, 0.3)",
        ),
        zone(
            "east-caverns",
            "East Caverns",
            (450.0, 150.0, 120.0, 180.0),
            ZoneKind::Private,
            2.0,
            "rgba(138, 43, 226, 0.3)",
        ),
        zone(
            "south-fields",
            "South Fields",
            (150.0, 450.0, 180.0, 100.0),
            ZoneKind::Public,
            4.0,
            "rgba(255, 69, 0, 0.3)",
        ),
        zone(
            "west-woods",
            "West Woods",
            (50.0, 250.0, 120.0, 150.0),
            ZoneKind::Private,
            2.0,
            "rgba(34, 139, 34, 0.3)",
        ),
    ]
}

fn zone(
    id: &str,
    name: &str,
    rect: (f64, f64, f64, f64),
    kind: ZoneKind,
    spawn_rate: f64,
    color: &str,
) -> Zone {
    let (x, y, width, height) = rect;
    Zone {
        id: id.to_string(),
        name: name.to_string(),
        x,
        y,
        width,
        height,
        kind,
        occupancy: 0,
        spawn_rate,
        color: color.to_string(),
    }
}

#[cfg(test)]
pub(crate) fn test_zone(id: &str, rect: (f64, f64, f64, f64), kind: ZoneKind, rate: f64) -> Zone {
    zone(id, id, rect, kind, rate, "#000")
}
