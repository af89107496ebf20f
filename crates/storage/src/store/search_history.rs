#![forbid(unsafe_code)]

use mk_core::model::LatLon;

/// Sink notified synchronously whenever a marker is inserted.
pub trait SearchHistory: Send + Sync {
    fn record(&self, position: LatLon, description: &str);

    /// True while `description` is still a placeholder for a pending address
    /// lookup. Such markers are not recorded.
    fn is_address_lookup_pending(&self, _description: &str) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoSearchHistory;

impl SearchHistory for NoSearchHistory {
    fn record(&self, _position: LatLon, _description: &str) {}
}

pub(crate) fn notify(history: &dyn SearchHistory, position: LatLon, description: &str) {
    if description.is_empty() || history.is_address_lookup_pending(description) {
        return;
    }
    history.record(position, description);
}
