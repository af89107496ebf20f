#![forbid(unsafe_code)]

use super::StoreError;
use super::markers::insert_last;
use super::search_history::SearchHistory;
use mk_core::model::{LatLon, NewMarker, Partition};
use rusqlite::Connection;
use serde::Deserialize;
use std::path::Path;

/// Markers kept by the flat settings lists that predate the database.
///
/// The three vectors are parallel by index. `descriptions` and `colors` may be
/// shorter than `points`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct LegacyMarkerList {
    #[serde(default)]
    pub points: Vec<LegacyPoint>,
    #[serde(default)]
    pub descriptions: Vec<String>,
    #[serde(default)]
    pub colors: Vec<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct LegacyPoint {
    pub lat: f64,
    pub lon: f64,
}

impl From<LegacyPoint> for LatLon {
    fn from(value: LegacyPoint) -> Self {
        LatLon::new(value.lat, value.lon)
    }
}

/// Read side of the legacy settings, consulted once when the database is
/// first created.
pub trait LegacyMarkerSource: Send + Sync {
    fn active_markers(&self) -> LegacyMarkerList;
    fn history_markers(&self) -> LegacyMarkerList;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoLegacyMarkers;

impl LegacyMarkerSource for NoLegacyMarkers {
    fn active_markers(&self) -> LegacyMarkerList {
        LegacyMarkerList::default()
    }

    fn history_markers(&self) -> LegacyMarkerList {
        LegacyMarkerList::default()
    }
}

/// Legacy lists exported to a JSON document of the form
/// `{"active": {...}, "history": {...}}`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct JsonLegacyMarkers {
    #[serde(default)]
    active: LegacyMarkerList,
    #[serde(default)]
    history: LegacyMarkerList,
}

impl JsonLegacyMarkers {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no legacy markers export");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl LegacyMarkerSource for JsonLegacyMarkers {
    fn active_markers(&self) -> LegacyMarkerList {
        self.active.clone()
    }

    fn history_markers(&self) -> LegacyMarkerList {
        self.history.clone()
    }
}

/// Copies the legacy lists into a freshly created schema, active list first,
/// each in list order.
///
/// A missing description becomes the empty string. A missing color repeats
/// the last color seen, carried over from the active list into the history
/// list.
pub(super) fn import_legacy_markers(
    conn: &Connection,
    source: &dyn LegacyMarkerSource,
    search_history: &dyn SearchHistory,
) -> Result<usize, StoreError> {
    let mut color_index = 0;
    let mut imported = 0;

    for (partition, list) in [
        (Partition::Active, source.active_markers()),
        (Partition::History, source.history_markers()),
    ] {
        for (index, point) in list.points.iter().enumerate() {
            if let Some(color) = list.colors.get(index) {
                color_index = *color;
            }
            let description = list.descriptions.get(index).cloned().unwrap_or_default();
            let marker = NewMarker::active((*point).into(), description)
                .with_partition(partition)
                .with_color(color_index);
            insert_last(conn, marker, true, search_history)?;
            imported += 1;
        }
    }

    Ok(imported)
}
