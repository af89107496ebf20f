#![forbid(unsafe_code)]

use mk_core::model::{LatLon, Marker, NewMarker, Partition};
use mk_core::{HISTORY_NEXT, TAIL_NEXT};
use mk_storage::{MarkersDb, SearchHistory, StoreConfig, StoreError};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn open_db() -> (TempDir, MarkersDb) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let db = MarkersDb::new(StoreConfig::new(dir.path()));
    (dir, db)
}

fn add(db: &MarkersDb, id: &str, lat: f64) -> Marker {
    db.add_marker(NewMarker::active(LatLon::new(lat, 10.0), format!("marker {id}")).with_id(id))
        .expect("add marker")
        .expect("store is available")
}

fn active_ids(db: &MarkersDb) -> Vec<String> {
    db.active_markers()
        .expect("active markers")
        .into_iter()
        .map(|marker| marker.id)
        .collect()
}

fn history_ids(db: &MarkersDb) -> Vec<String> {
    db.markers_history()
        .expect("markers history")
        .into_iter()
        .map(|marker| marker.id)
        .collect()
}

fn find<'a>(markers: &'a [Marker], id: &str) -> &'a Marker {
    markers
        .iter()
        .find(|marker| marker.id == id)
        .expect("marker present")
}

#[test]
fn inserts_build_a_chain_in_insertion_order() {
    let (_dir, db) = open_db();
    add(&db, "a", 1.0);
    add(&db, "b", 2.0);
    add(&db, "c", 3.0);

    let active = db.active_markers().expect("active markers");
    let ids: Vec<&str> = active.iter().map(|marker| marker.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(find(&active, "a").next_id, "b");
    assert_eq!(find(&active, "b").next_id, "c");
    assert_eq!(find(&active, "c").next_id, TAIL_NEXT);
    assert!(active.iter().all(|marker| marker.partition == Partition::Active));
    assert!(active.iter().all(|marker| marker.visited_at_ms == 0));
}

#[test]
fn many_inserts_keep_exact_order() {
    let (_dir, db) = open_db();
    let expected: Vec<String> = (0..25).map(|i| format!("m{i:02}")).collect();
    for (index, id) in expected.iter().enumerate() {
        add(&db, id, index as f64);
    }
    assert_eq!(active_ids(&db), expected);
}

#[test]
fn added_marker_round_trips_all_fields() {
    let (_dir, db) = open_db();
    let stored = db
        .add_marker(
            NewMarker::active(LatLon::new(52.52, 13.405), "pt#Alexanderplatz")
                .with_id("berlin")
                .with_color(4)
                .with_group("Trip", "trip-gpx"),
        )
        .expect("add marker")
        .expect("store is available");

    let active = db.active_markers().expect("active markers");
    assert_eq!(active, vec![stored.clone()]);
    assert_eq!(stored.position, LatLon::new(52.52, 13.405));
    assert_eq!(stored.description, "pt#Alexanderplatz");
    assert_eq!(stored.color_index, 4);
    assert_eq!(stored.group_name.as_deref(), Some("Trip"));
    assert_eq!(stored.group_key.as_deref(), Some("trip-gpx"));
    assert!(stored.created_at_ms > 0);
}

#[test]
fn synthesized_id_starts_with_creation_time() {
    let (_dir, db) = open_db();
    let stored = db
        .add_marker(NewMarker::active(LatLon::new(1.0, 2.0), "x"))
        .expect("add marker")
        .expect("store is available");

    let created = stored.created_at_ms.to_string();
    let suffix = stored
        .id
        .strip_prefix(created.as_str())
        .expect("id starts with creation time");
    assert_eq!(suffix.len(), 3);
    assert!((100..1000).contains(&suffix.parse::<u16>().expect("numeric suffix")));
}

#[test]
fn reserved_and_duplicate_ids_are_rejected_without_touching_the_chain() {
    let (_dir, db) = open_db();
    add(&db, "a", 1.0);
    add(&db, "b", 2.0);

    let err = db
        .add_marker(NewMarker::active(LatLon::new(0.0, 0.0), "dup").with_id("a"))
        .expect_err("duplicate id must fail");
    assert_eq!(err.code(), "DUPLICATE_MARKER");
    assert!(matches!(err, StoreError::DuplicateMarker { ref id } if id == "a"));

    let err = db
        .add_marker(NewMarker::active(LatLon::new(0.0, 0.0), "bad").with_id(TAIL_NEXT))
        .expect_err("sentinel id must fail");
    assert!(matches!(err, StoreError::InvalidInput(_)));

    let active = db.active_markers().expect("active markers");
    let ids: Vec<&str> = active.iter().map(|marker| marker.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(find(&active, "b").next_id, TAIL_NEXT);
}

#[test]
fn caller_side_move_places_marker_before_successor() {
    let (_dir, db) = open_db();
    for (index, id) in ["a", "b", "c", "d"].iter().enumerate() {
        add(&db, id, index as f64);
    }

    // Move "d" between "a" and "b".
    assert!(db.change_active_marker_position("c", None).expect("repoint c"));
    assert!(db.change_active_marker_position("a", Some("d")).expect("repoint a"));
    assert!(db.change_active_marker_position("d", Some("b")).expect("repoint d"));

    assert_eq!(active_ids(&db), vec!["a", "d", "b", "c"]);
}

#[test]
fn reorder_without_successor_makes_marker_the_tail() {
    let (_dir, db) = open_db();
    add(&db, "a", 1.0);
    add(&db, "b", 2.0);
    add(&db, "c", 3.0);

    db.change_active_marker_position("a", None).expect("repoint a");
    db.change_active_marker_position("c", Some("a")).expect("repoint c");

    assert_eq!(active_ids(&db), vec!["b", "c", "a"]);
    assert!(
        !db.change_active_marker_position("missing", None)
            .expect("repoint missing")
    );
}

#[test]
fn promoted_marker_leaves_active_chain_and_enters_history() {
    let (_dir, db) = open_db();
    add(&db, "a", 1.0);
    add(&db, "b", 2.0);
    add(&db, "c", 3.0);

    assert!(db.move_marker_to_history("b").expect("promote b"));

    let mut active = active_ids(&db);
    active.sort();
    assert_eq!(active, vec!["a", "c"]);

    let history = db.markers_history().expect("markers history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, "b");
    assert_eq!(history[0].partition, Partition::History);
    assert_eq!(history[0].next_id, HISTORY_NEXT);
    assert!(!history[0].is_active());
    assert!(history[0].visited_at_ms > 0);

    // The predecessor still points at "b" until the caller repairs it.
    let raw = db.active_markers().expect("active markers");
    assert_eq!(find(&raw, "a").next_id, "b");
    assert!(find(&raw, "c").is_tail());
    db.change_active_marker_position("a", Some("c"))
        .expect("repair predecessor");
    assert_eq!(active_ids(&db), vec!["a", "c"]);
}

#[test]
fn restored_marker_is_active_but_detached_until_repointed() {
    let (_dir, db) = open_db();
    add(&db, "a", 1.0);
    add(&db, "b", 2.0);
    add(&db, "c", 3.0);
    db.move_marker_to_history("b").expect("promote b");

    assert!(db.restore_marker_from_history("b").expect("restore b"));
    assert!(
        !db.restore_marker_from_history("b").expect("second restore"),
        "restoring an active marker is a no-op"
    );
    assert!(history_ids(&db).is_empty());

    let active = db.active_markers().expect("active markers");
    assert_eq!(active.len(), 3);
    assert_eq!(find(&active, "b").next_id, HISTORY_NEXT);

    db.change_active_marker_position("b", Some("c"))
        .expect("reattach b");
    assert_eq!(active_ids(&db), vec!["a", "b", "c"]);
}

#[test]
fn promote_all_empties_the_active_chain() {
    let (_dir, db) = open_db();
    add(&db, "a", 1.0);
    add(&db, "b", 2.0);
    add(&db, "c", 3.0);

    assert_eq!(db.move_all_active_markers_to_history().expect("promote all"), 3);
    assert!(active_ids(&db).is_empty());

    let history = db.markers_history().expect("markers history");
    let mut ids: Vec<&str> = history.iter().map(|marker| marker.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert!(history.iter().all(|marker| marker.next_id == HISTORY_NEXT));
    assert!(history.iter().all(|marker| marker.visited_at_ms > 0));

    // A fresh chain starts cleanly after the bulk move.
    add(&db, "d", 4.0);
    add(&db, "e", 5.0);
    assert_eq!(active_ids(&db), vec!["d", "e"]);
}

#[test]
fn history_deletes_only_touch_history_rows() {
    let (_dir, db) = open_db();
    add(&db, "a", 1.0);
    add(&db, "b", 2.0);
    add(&db, "c", 3.0);
    db.move_marker_to_history("a").expect("promote a");
    db.move_marker_to_history("b").expect("promote b");

    assert!(
        !db.remove_marker_from_history("c").expect("remove active"),
        "active markers are never hard-deleted"
    );
    assert_eq!(active_ids(&db), vec!["c"]);

    assert!(db.remove_marker_from_history("a").expect("remove a"));
    assert_eq!(history_ids(&db), vec!["b"]);

    assert_eq!(db.clear_markers_history().expect("clear history"), 1);
    assert!(history_ids(&db).is_empty());
    assert_eq!(active_ids(&db), vec!["c"]);
}

#[test]
fn marker_can_be_inserted_straight_into_history() {
    let (_dir, db) = open_db();
    add(&db, "a", 1.0);
    let stored = db
        .add_marker(
            NewMarker::active(LatLon::new(5.0, 5.0), "old")
                .with_id("h")
                .with_partition(Partition::History),
        )
        .expect("add history marker")
        .expect("store is available");

    assert_eq!(stored.next_id, HISTORY_NEXT);
    assert_eq!(stored.visited_at_ms, 0);
    assert_eq!(history_ids(&db), vec!["h"]);

    let active = db.active_markers().expect("active markers");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].next_id, TAIL_NEXT, "tail untouched by history insert");
}

#[test]
fn update_changes_fields_but_not_the_chain() {
    let (_dir, db) = open_db();
    let mut a = add(&db, "a", 1.0);
    add(&db, "b", 2.0);

    a.position = LatLon::new(48.85, 2.35);
    a.description = "pt#Paris".to_string();
    a.color_index = 7;
    a.next_id = "ignored".to_string();
    assert!(db.update_marker(&a).expect("update a"));

    let active = db.active_markers().expect("active markers");
    let stored = find(&active, "a");
    assert_eq!(stored.position, LatLon::new(48.85, 2.35));
    assert_eq!(stored.description, "pt#Paris");
    assert_eq!(stored.color_index, 7);
    assert_eq!(stored.next_id, "b");
    assert_eq!(active_ids(&db), vec!["a", "b"]);
}

#[derive(Default)]
struct RecordingHistory {
    entries: Mutex<Vec<(LatLon, String)>>,
}

impl SearchHistory for RecordingHistory {
    fn record(&self, position: LatLon, description: &str) {
        self.entries
            .lock()
            .expect("history lock")
            .push((position, description.to_string()));
    }

    fn is_address_lookup_pending(&self, description: &str) -> bool {
        description.starts_with("searching:")
    }
}

#[test]
fn insert_records_search_history_unless_address_is_pending() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let history = Arc::new(RecordingHistory::default());
    let db = MarkersDb::new(StoreConfig::new(dir.path())).with_search_history(history.clone());

    db.add_marker(NewMarker::active(LatLon::new(1.0, 1.0), "pt#Cafe"))
        .expect("add cafe");
    db.add_marker(NewMarker::active(LatLon::new(2.0, 2.0), "searching:address"))
        .expect("add pending");
    db.add_marker(NewMarker::active(LatLon::new(3.0, 3.0), ""))
        .expect("add blank");

    let entries = history.entries.lock().expect("history lock");
    assert_eq!(
        *entries,
        vec![(LatLon::new(1.0, 1.0), "pt#Cafe".to_string())]
    );
    assert_eq!(active_ids(&db).len(), 3);
}
