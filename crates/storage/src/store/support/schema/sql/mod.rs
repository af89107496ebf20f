#![forbid(unsafe_code)]

mod groups;
mod markers;

pub(super) const DROP_ALL: &str = r#"
        DROP TABLE IF EXISTS map_markers;
        DROP TABLE IF EXISTS map_markers_groups;
"#;

pub(super) fn full_schema_sql() -> String {
    let mut sql = String::new();
    sql.push_str(markers::SQL);
    sql.push_str(groups::SQL);
    sql
}
