#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS map_markers_groups (
          group_id TEXT PRIMARY KEY,
          group_name TEXT,
          group_type INTEGER
        );
"#;
