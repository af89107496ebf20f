#![forbid(unsafe_code)]

pub mod chain;

/// Successor value carried by the last active marker.
pub const TAIL_NEXT: &str = "tail_next";
/// Successor value carried by every marker in the history partition.
pub const HISTORY_NEXT: &str = "history_next";

pub fn is_sentinel(value: &str) -> bool {
    value == TAIL_NEXT || value == HISTORY_NEXT
}

pub mod ids {
    use super::is_sentinel;

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct MarkerId(String);

    impl MarkerId {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, MarkerIdError> {
            let value = value.into();
            validate_marker_id(&value)?;
            Ok(Self(value))
        }
    }

    impl std::fmt::Display for MarkerId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum MarkerIdError {
        Empty,
        TooLong,
        Reserved,
        ContainsControl,
    }

    impl MarkerIdError {
        pub fn message(&self) -> &'static str {
            match self {
                Self::Empty => "marker id must not be empty",
                Self::TooLong => "marker id is too long",
                Self::Reserved => "marker id must not equal a chain sentinel",
                Self::ContainsControl => "marker id contains control characters",
            }
        }
    }

    fn validate_marker_id(value: &str) -> Result<(), MarkerIdError> {
        if value.trim().is_empty() {
            return Err(MarkerIdError::Empty);
        }
        if value.len() > 256 {
            return Err(MarkerIdError::TooLong);
        }
        if is_sentinel(value) {
            return Err(MarkerIdError::Reserved);
        }
        if value.chars().any(|c| c.is_control()) {
            return Err(MarkerIdError::ContainsControl);
        }
        Ok(())
    }
}

pub mod model {
    use super::{HISTORY_NEXT, TAIL_NEXT};

    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct LatLon {
        pub latitude: f64,
        pub longitude: f64,
    }

    impl LatLon {
        pub fn new(latitude: f64, longitude: f64) -> Self {
            Self {
                latitude,
                longitude,
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum Partition {
        Active,
        History,
    }

    impl Partition {
        /// Persisted `marker_active` column value.
        pub fn flag(self) -> i64 {
            match self {
                Partition::Active => 1,
                Partition::History => 0,
            }
        }

        pub fn from_flag(value: i64) -> Self {
            if value == 1 {
                Partition::Active
            } else {
                Partition::History
            }
        }

        /// Successor written for a freshly inserted row of this partition.
        pub fn initial_next(self) -> &'static str {
            match self {
                Partition::Active => TAIL_NEXT,
                Partition::History => HISTORY_NEXT,
            }
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct Marker {
        pub id: String,
        pub position: LatLon,
        /// Serialized point description, opaque to the store.
        pub description: String,
        pub partition: Partition,
        pub created_at_ms: i64,
        pub visited_at_ms: i64,
        pub group_name: Option<String>,
        pub group_key: Option<String>,
        pub color_index: i64,
        pub next_id: String,
    }

    impl Marker {
        pub fn is_active(&self) -> bool {
            self.partition == Partition::Active
        }

        pub fn is_tail(&self) -> bool {
            self.next_id == TAIL_NEXT
        }
    }

    /// Insert payload. A missing `id` is synthesized by the store.
    #[derive(Clone, Debug, PartialEq)]
    pub struct NewMarker {
        pub id: Option<String>,
        pub position: LatLon,
        pub description: String,
        pub partition: Partition,
        pub group_name: Option<String>,
        pub group_key: Option<String>,
        pub color_index: i64,
    }

    impl NewMarker {
        pub fn active(position: LatLon, description: impl Into<String>) -> Self {
            Self {
                id: None,
                position,
                description: description.into(),
                partition: Partition::Active,
                group_name: None,
                group_key: None,
                color_index: 0,
            }
        }

        pub fn with_id(mut self, id: impl Into<String>) -> Self {
            self.id = Some(id.into());
            self
        }

        pub fn with_partition(mut self, partition: Partition) -> Self {
            self.partition = partition;
            self
        }

        pub fn with_color(mut self, color_index: i64) -> Self {
            self.color_index = color_index;
            self
        }

        pub fn with_group(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
            self.group_name = Some(name.into());
            self.group_key = Some(key.into());
            self
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum SyncGroupKind {
        Favorites,
        Gpx,
        Other(i64),
    }

    impl SyncGroupKind {
        pub fn as_i64(self) -> i64 {
            match self {
                SyncGroupKind::Favorites => 0,
                SyncGroupKind::Gpx => 1,
                SyncGroupKind::Other(value) => value,
            }
        }

        pub fn from_i64(value: i64) -> Self {
            match value {
                0 => SyncGroupKind::Favorites,
                1 => SyncGroupKind::Gpx,
                other => SyncGroupKind::Other(other),
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct SyncGroup {
        pub id: String,
        pub name: String,
        pub kind: SyncGroupKind,
    }
}
