#![forbid(unsafe_code)]

//! Recovery of the user-visible marker order from successor links.
//!
//! Active rows are persisted unordered; each row names the id of the row that
//! follows it and the last one names [`crate::TAIL_NEXT`]. Everything here is a
//! pure function over a snapshot of rows and never touches storage.

mod defects;
mod order;

pub use defects::*;
pub use order::*;

use crate::model::Marker;

/// A row that participates in a successor chain.
pub trait ChainLink {
    fn link_id(&self) -> &str;
    fn next_link(&self) -> &str;
}

impl ChainLink for Marker {
    fn link_id(&self) -> &str {
        &self.id
    }

    fn next_link(&self) -> &str {
        &self.next_id
    }
}

impl ChainLink for (String, String) {
    fn link_id(&self) -> &str {
        &self.0
    }

    fn next_link(&self) -> &str {
        &self.1
    }
}
