#![forbid(unsafe_code)]

mod sql;

use super::super::StoreError;
use rusqlite::Connection;

pub(in crate::store) fn schema_version(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))?)
}

pub(in crate::store) fn set_schema_version(
    conn: &Connection,
    version: i64,
) -> Result<(), StoreError> {
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}

/// Drops both tables (if present) and creates them empty. Rows are never
/// carried across a schema change.
pub(in crate::store) fn recreate_tables(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(sql::DROP_ALL)?;
    conn.execute_batch(&sql::full_schema_sql())?;
    Ok(())
}
