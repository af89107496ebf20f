#![forbid(unsafe_code)]

use super::error::is_constraint_violation;
use super::{AccessMode, MarkersDb, StoreError};
use mk_core::model::{SyncGroup, SyncGroupKind};
use rusqlite::{OptionalExtension, params};

impl MarkersDb {
    /// Fails with [`StoreError::DuplicateGroup`] when `id` is already taken.
    pub fn add_group(&self, id: &str, name: &str, kind: SyncGroupKind) -> Result<(), StoreError> {
        if id.trim().is_empty() {
            return Err(StoreError::InvalidInput("group id must not be empty"));
        }

        self.with_connection(AccessMode::ReadWrite, "add_group", |conn| {
            let insert = conn.execute(
                "INSERT INTO map_markers_groups(group_id, group_name, group_type) VALUES (?1, ?2, ?3)",
                params![id, name, kind.as_i64()],
            );
            match insert {
                Ok(_) => {
                    tracing::debug!(group_id = id, kind = kind.as_i64(), "sync group added");
                    Ok(())
                }
                Err(err) if is_constraint_violation(&err) => Err(StoreError::DuplicateGroup {
                    id: id.to_string(),
                }),
                Err(err) => Err(err.into()),
            }
        })
    }

    pub fn get_group(&self, id: &str) -> Result<Option<SyncGroup>, StoreError> {
        self.with_connection(AccessMode::ReadOnly, "get_group", |conn| {
            Ok(conn
                .query_row(
                    "SELECT group_id, group_name, group_type FROM map_markers_groups WHERE group_id = ?1",
                    params![id],
                    |row| {
                        Ok(SyncGroup {
                            id: row.get::<_, String>(0)?,
                            name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                            kind: SyncGroupKind::from_i64(row.get::<_, Option<i64>>(2)?.unwrap_or(0)),
                        })
                    },
                )
                .optional()?)
        })
    }
}
