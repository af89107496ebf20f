#![forbid(unsafe_code)]

mod clock;
mod ids;
mod schema;

pub(super) use clock::{now_ms, one_month_before};
pub(super) use ids::synthesize_marker_id;
pub(super) use schema::*;
