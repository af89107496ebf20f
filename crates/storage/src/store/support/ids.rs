#![forbid(unsafe_code)]

use rand::Rng;

/// Creation timestamp followed by a random three-digit suffix.
///
/// Two markers created in the same millisecond can collide; the insert then
/// fails on the primary key.
pub(crate) fn synthesize_marker_id(created_at_ms: i64) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(100..1000);
    format!("{created_at_ms}{suffix}")
}
