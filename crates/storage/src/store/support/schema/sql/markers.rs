#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        -- `marker_active`: 1 = active, 0 = history.
        -- `marker_next_key`: successor id, 'tail_next' on the last active row,
        -- 'history_next' on every history row.
        CREATE TABLE IF NOT EXISTS map_markers (
          marker_id TEXT PRIMARY KEY,
          marker_lat DOUBLE,
          marker_lon DOUBLE,
          marker_description TEXT,
          marker_active INTEGER,
          marker_added INTEGER,
          marker_visited INTEGER,
          group_name TEXT,
          group_key TEXT,
          marker_color INTEGER,
          marker_next_key TEXT
        );
"#;
