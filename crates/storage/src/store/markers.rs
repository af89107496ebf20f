#![forbid(unsafe_code)]

use super::error::is_constraint_violation;
use super::search_history::{SearchHistory, notify};
use super::support::{now_ms, one_month_before, synthesize_marker_id};
use super::{AccessMode, MarkersDb, StoreError};
use mk_core::chain::{inspect_chain, order_chain};
use mk_core::ids::MarkerId;
use mk_core::model::{LatLon, Marker, NewMarker, Partition};
use mk_core::{HISTORY_NEXT, TAIL_NEXT};
use rusqlite::{Connection, OptionalExtension, Row, params};

const MARKERS_SELECT: &str = "SELECT marker_id, marker_lat, marker_lon, marker_description, \
     marker_active, marker_added, marker_visited, group_name, group_key, marker_color, marker_next_key \
     FROM map_markers";

const MAX_ID_DRAWS: usize = 8;

impl MarkersDb {
    /// Appends `marker` to the end of the active chain, or stores it straight
    /// into history.
    ///
    /// Returns the stored row, or `None` when the database is unavailable.
    pub fn add_marker(&self, marker: NewMarker) -> Result<Option<Marker>, StoreError> {
        self.with_connection(AccessMode::ReadWrite, "add_marker", |conn| {
            insert_last(conn, marker, false, self.search_history.as_ref()).map(Some)
        })
    }

    /// Rewrites position, description and color. Chain and partition are left
    /// alone.
    pub fn update_marker(&self, marker: &Marker) -> Result<bool, StoreError> {
        self.with_connection(AccessMode::ReadWrite, "update_marker", |conn| {
            let updated = conn.execute(
                "UPDATE map_markers \
                 SET marker_lat = ?1, marker_lon = ?2, marker_description = ?3, marker_color = ?4 \
                 WHERE marker_id = ?5",
                params![
                    marker.position.latitude,
                    marker.position.longitude,
                    marker.description,
                    marker.color_index,
                    marker.id,
                ],
            )?;
            Ok(updated > 0)
        })
    }

    /// Points `moved_id` at `next_id`, or makes it the tail when `next_id` is
    /// `None`.
    ///
    /// No validation happens here: the caller keeps the chain a single path,
    /// usually by also repointing the old and new predecessors.
    pub fn change_active_marker_position(
        &self,
        moved_id: &str,
        next_id: Option<&str>,
    ) -> Result<bool, StoreError> {
        let next = next_id.unwrap_or(TAIL_NEXT);
        self.with_connection(AccessMode::ReadWrite, "change_active_marker_position", |conn| {
            let updated = conn.execute(
                "UPDATE map_markers SET marker_next_key = ?1 WHERE marker_id = ?2",
                params![next, moved_id],
            )?;
            tracing::debug!(marker_id = moved_id, next, updated, "marker repointed");
            Ok(updated > 0)
        })
    }

    /// Moves one marker to history. Its predecessor keeps pointing at it;
    /// the dangling link is absorbed when the active chain is ordered.
    pub fn move_marker_to_history(&self, id: &str) -> Result<bool, StoreError> {
        self.with_connection(AccessMode::ReadWrite, "move_marker_to_history", |conn| {
            let updated = conn.execute(
                "UPDATE map_markers SET marker_active = ?1, marker_visited = ?2, marker_next_key = ?3 \
                 WHERE marker_id = ?4",
                params![Partition::History.flag(), now_ms(), HISTORY_NEXT, id],
            )?;
            tracing::debug!(marker_id = id, updated, "marker moved to history");
            Ok(updated > 0)
        })
    }

    pub fn move_all_active_markers_to_history(&self) -> Result<usize, StoreError> {
        self.with_connection(
            AccessMode::ReadWrite,
            "move_all_active_markers_to_history",
            |conn| {
                let updated = conn.execute(
                    "UPDATE map_markers SET marker_active = ?1, marker_visited = ?2, marker_next_key = ?3 \
                     WHERE marker_active = ?4",
                    params![
                        Partition::History.flag(),
                        now_ms(),
                        HISTORY_NEXT,
                        Partition::Active.flag(),
                    ],
                )?;
                tracing::debug!(updated, "all active markers moved to history");
                Ok(updated)
            },
        )
    }

    /// Flips a history row back to active. Its successor stays
    /// [`HISTORY_NEXT`] until the caller repoints it with
    /// [`MarkersDb::change_active_marker_position`].
    pub fn restore_marker_from_history(&self, id: &str) -> Result<bool, StoreError> {
        self.with_connection(AccessMode::ReadWrite, "restore_marker_from_history", |conn| {
            let updated = conn.execute(
                "UPDATE map_markers SET marker_active = ?1 WHERE marker_id = ?2 AND marker_active = ?3",
                params![Partition::Active.flag(), id, Partition::History.flag()],
            )?;
            tracing::debug!(marker_id = id, updated, "marker restored from history");
            Ok(updated > 0)
        })
    }

    pub fn remove_marker_from_history(&self, id: &str) -> Result<bool, StoreError> {
        self.with_connection(AccessMode::ReadWrite, "remove_marker_from_history", |conn| {
            let deleted = conn.execute(
                "DELETE FROM map_markers WHERE marker_id = ?1 AND marker_active = ?2",
                params![id, Partition::History.flag()],
            )?;
            Ok(deleted > 0)
        })
    }

    pub fn clear_markers_history(&self) -> Result<usize, StoreError> {
        self.with_connection(AccessMode::ReadWrite, "clear_markers_history", |conn| {
            let deleted = conn.execute(
                "DELETE FROM map_markers WHERE marker_active = ?1",
                params![Partition::History.flag()],
            )?;
            tracing::debug!(deleted, "markers history cleared");
            Ok(deleted)
        })
    }

    /// Active markers in visiting order.
    pub fn active_markers(&self) -> Result<Vec<Marker>, StoreError> {
        self.with_connection(AccessMode::ReadOnly, "active_markers", |conn| {
            let rows = select_markers(conn, Partition::Active)?;
            let defects = inspect_chain(&rows);
            if !defects.is_clean(rows.len()) {
                tracing::warn!(
                    rows = rows.len(),
                    tail_rows = defects.tail_rows,
                    dangling = ?defects.dangling,
                    branching = ?defects.branching,
                    "active marker chain is malformed, ordering best-effort"
                );
            }
            Ok(order_chain(rows))
        })
    }

    /// History markers in storage order.
    pub fn markers_history(&self) -> Result<Vec<Marker>, StoreError> {
        self.with_connection(AccessMode::ReadOnly, "markers_history", |conn| {
            select_markers(conn, Partition::History)
        })
    }
}

/// Inserts `marker` as the new tail (or as a history row).
///
/// The current tail is repointed before the new row exists, so at no point do
/// two rows claim the tail. The two statements are not wrapped in a
/// transaction.
pub(super) fn insert_last(
    conn: &Connection,
    marker: NewMarker,
    legacy_import: bool,
    search_history: &dyn SearchHistory,
) -> Result<Marker, StoreError> {
    insert_last_at(conn, marker, legacy_import, search_history, now_ms())
}

fn insert_last_at(
    conn: &Connection,
    marker: NewMarker,
    legacy_import: bool,
    search_history: &dyn SearchHistory,
    now: i64,
) -> Result<Marker, StoreError> {
    let created_at_ms = if legacy_import {
        one_month_before(now)
    } else {
        now
    };
    let id = resolve_marker_id(conn, marker.id, created_at_ms)?;
    let visited_at_ms = if legacy_import && marker.partition == Partition::History {
        created_at_ms
    } else {
        0
    };

    notify(search_history, marker.position, &marker.description);

    if marker.partition == Partition::Active {
        conn.execute(
            "UPDATE map_markers SET marker_next_key = ?1 WHERE marker_next_key = ?2",
            params![id, TAIL_NEXT],
        )?;
    }

    let stored = Marker {
        id,
        position: marker.position,
        description: marker.description,
        partition: marker.partition,
        created_at_ms,
        visited_at_ms,
        group_name: marker.group_name,
        group_key: marker.group_key,
        color_index: marker.color_index,
        next_id: marker.partition.initial_next().to_string(),
    };

    let insert = conn.execute(
        "INSERT INTO map_markers(marker_id, marker_lat, marker_lon, marker_description, marker_active, \
         marker_added, marker_visited, group_name, group_key, marker_color, marker_next_key) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            stored.id,
            stored.position.latitude,
            stored.position.longitude,
            stored.description,
            stored.partition.flag(),
            stored.created_at_ms,
            stored.visited_at_ms,
            stored.group_name,
            stored.group_key,
            stored.color_index,
            stored.next_id,
        ],
    );

    match insert {
        Ok(_) => {
            tracing::debug!(
                marker_id = %stored.id,
                partition = ?stored.partition,
                legacy_import,
                "marker added"
            );
            Ok(stored)
        }
        Err(err) if is_constraint_violation(&err) => {
            Err(StoreError::DuplicateMarker { id: stored.id })
        }
        Err(err) => Err(err.into()),
    }
}

/// Validates a caller-supplied id, or draws a fresh one.
///
/// Existing ids are refused before any row is touched, so a rejected insert
/// never leaves the old tail pointing at a row that was not written. The same
/// holds when every draw collides.
fn resolve_marker_id(
    conn: &Connection,
    requested: Option<String>,
    created_at_ms: i64,
) -> Result<String, StoreError> {
    if let Some(requested) = requested {
        let id = MarkerId::try_new(requested)
            .map_err(|err| StoreError::InvalidInput(err.message()))?
            .into_string();
        if marker_exists(conn, &id)? {
            return Err(StoreError::DuplicateMarker { id });
        }
        return Ok(id);
    }

    let mut id = synthesize_marker_id(created_at_ms);
    for _ in 1..MAX_ID_DRAWS {
        if !marker_exists(conn, &id)? {
            break;
        }
        id = synthesize_marker_id(created_at_ms);
    }
    if marker_exists(conn, &id)? {
        tracing::warn!(marker_id = %id, draws = MAX_ID_DRAWS, "no free marker id");
        return Err(StoreError::DuplicateMarker { id });
    }
    Ok(id)
}

fn marker_exists(conn: &Connection, id: &str) -> Result<bool, StoreError> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM map_markers WHERE marker_id = ?1",
            params![id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some())
}

fn select_markers(conn: &Connection, partition: Partition) -> Result<Vec<Marker>, StoreError> {
    let mut stmt = conn.prepare(&format!("{MARKERS_SELECT} WHERE marker_active = ?1"))?;
    let mut rows = stmt.query(params![partition.flag()])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(read_marker(row)?);
    }
    Ok(out)
}

fn read_marker(row: &Row<'_>) -> Result<Marker, StoreError> {
    Ok(Marker {
        id: row.get::<_, String>(0)?,
        position: LatLon::new(
            row.get::<_, Option<f64>>(1)?.unwrap_or_default(),
            row.get::<_, Option<f64>>(2)?.unwrap_or_default(),
        ),
        description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        partition: Partition::from_flag(row.get::<_, Option<i64>>(4)?.unwrap_or_default()),
        created_at_ms: row.get::<_, Option<i64>>(5)?.unwrap_or_default(),
        visited_at_ms: row.get::<_, Option<i64>>(6)?.unwrap_or_default(),
        group_name: row.get::<_, Option<String>>(7)?,
        group_key: row.get::<_, Option<String>>(8)?,
        color_index: row.get::<_, Option<i64>>(9)?.unwrap_or_default(),
        next_id: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
    })
}
