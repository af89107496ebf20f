#![forbid(unsafe_code)]

mod config;
mod error;
mod groups;
mod legacy;
mod markers;
mod search_history;
mod support;

pub use config::*;
pub use error::StoreError;
pub use legacy::*;
pub use search_history::*;

use rusqlite::{Connection, OpenFlags};
use std::sync::Arc;

/// Bumping this drops every stored marker and group on next open.
pub const SCHEMA_VERSION: i64 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// Handle to the markers database.
///
/// Holds no open connection: every operation opens its own, runs one or more
/// statements on it and closes it before returning. Mutations are expected to
/// come from a single writer.
pub struct MarkersDb {
    config: StoreConfig,
    legacy: Arc<dyn LegacyMarkerSource>,
    search_history: Arc<dyn SearchHistory>,
}

impl std::fmt::Debug for MarkersDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkersDb")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MarkersDb {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            legacy: Arc::new(NoLegacyMarkers),
            search_history: Arc::new(NoSearchHistory),
        }
    }

    pub fn with_legacy_source(mut self, legacy: Arc<dyn LegacyMarkerSource>) -> Self {
        self.legacy = legacy;
        self
    }

    pub fn with_search_history(mut self, search_history: Arc<dyn SearchHistory>) -> Self {
        self.search_history = search_history;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Opens a connection with the schema at [`SCHEMA_VERSION`].
    ///
    /// A missing or outdated schema is rebuilt from scratch, which needs a
    /// writable handle: a read-only request then gets a read-write
    /// connection. Legacy markers are imported only when no version was ever
    /// recorded.
    pub fn open_connection(&self, mode: AccessMode) -> Result<Connection, StoreError> {
        self.open_checked(mode).map_err(OpenFailure::into_inner)
    }

    fn open_checked(&self, mode: AccessMode) -> Result<Connection, OpenFailure> {
        let mode = if self.config.db_path().exists() {
            mode
        } else {
            AccessMode::ReadWrite
        };

        let mut conn = self.connect(mode).map_err(OpenFailure::Unavailable)?;
        if support::schema_version(&conn).map_err(OpenFailure::Schema)? == SCHEMA_VERSION {
            return Ok(conn);
        }

        if mode == AccessMode::ReadOnly {
            close_quietly(conn, "reopen_for_rebuild");
            conn = self
                .connect(AccessMode::ReadWrite)
                .map_err(OpenFailure::Unavailable)?;
        }

        let previous = support::schema_version(&conn).map_err(OpenFailure::Schema)?;
        if previous != SCHEMA_VERSION {
            if let Err(err) = self.rebuild_schema(&conn, previous) {
                close_quietly(conn, "rebuild_schema");
                return Err(OpenFailure::Schema(err));
            }
        }
        Ok(conn)
    }

    fn connect(&self, mode: AccessMode) -> Result<Connection, StoreError> {
        let db_path = self.config.db_path();
        let conn = match mode {
            AccessMode::ReadOnly => Connection::open_with_flags(
                &db_path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?,
            AccessMode::ReadWrite => {
                std::fs::create_dir_all(&self.config.storage_dir)?;
                Connection::open(&db_path)?
            }
        };
        conn.busy_timeout(self.config.busy_timeout())?;
        Ok(conn)
    }

    fn rebuild_schema(&self, conn: &Connection, previous: i64) -> Result<(), StoreError> {
        tracing::info!(
            previous_version = previous,
            version = SCHEMA_VERSION,
            "rebuilding markers schema"
        );

        // Recorded first so an interrupted import is never repeated.
        support::set_schema_version(conn, SCHEMA_VERSION)?;
        support::recreate_tables(conn)?;

        if previous == 0 {
            let imported = legacy::import_legacy_markers(
                conn,
                self.legacy.as_ref(),
                self.search_history.as_ref(),
            )?;
            tracing::info!(imported, "imported legacy markers");
        }
        Ok(())
    }

    /// Runs `op` on a fresh connection and closes it afterwards.
    ///
    /// When the database cannot be opened the call is skipped and `T::default()`
    /// is returned, so callers cannot tell "unavailable" from "nothing there".
    /// Failures after the open, schema rebuild included, are returned.
    fn with_connection<T: Default>(
        &self,
        mode: AccessMode,
        op_name: &'static str,
        op: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conn = match self.open_checked(mode) {
            Ok(conn) => conn,
            Err(OpenFailure::Unavailable(err)) => {
                tracing::warn!(op = op_name, error = %err, "markers db unavailable, skipping");
                return Ok(T::default());
            }
            Err(OpenFailure::Schema(err)) => {
                tracing::warn!(op = op_name, error = %err, "markers schema setup failed");
                return Err(err);
            }
        };

        let result = op(&conn);
        close_quietly(conn, op_name);
        result
    }
}

enum OpenFailure {
    /// The database file could not be opened at all.
    Unavailable(StoreError),
    /// Opened, but reading the version or rebuilding the schema failed.
    Schema(StoreError),
}

impl OpenFailure {
    fn into_inner(self) -> StoreError {
        match self {
            Self::Unavailable(err) | Self::Schema(err) => err,
        }
    }
}

fn close_quietly(conn: Connection, op_name: &'static str) {
    if let Err((_, err)) = conn.close() {
        tracing::warn!(op = op_name, error = %err, "failed to close markers db");
    }
}
