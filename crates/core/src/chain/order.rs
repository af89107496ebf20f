#![forbid(unsafe_code)]

use super::ChainLink;
use std::collections::{HashSet, VecDeque};

/// Orders `rows` from first to last by peeling tails off the candidate set.
///
/// A candidate is the current tail when its successor is not the id of any
/// other remaining candidate. Candidates are examined in input order and the
/// first match wins; when nothing matches (a cycle), the last candidate
/// examined is taken as-is. Every step removes exactly one row, so the result
/// is always a permutation of the input, even for dangling or branching
/// chains.
///
/// Ids are expected to be unique, as they are when rows come from a keyed scan.
pub fn order_chain<T: ChainLink>(rows: Vec<T>) -> Vec<T> {
    let mut remaining_ids: HashSet<String> =
        rows.iter().map(|row| row.link_id().to_string()).collect();
    let mut candidates = rows;
    let mut ordered = VecDeque::with_capacity(candidates.len());

    while !candidates.is_empty() {
        let last = candidates.len() - 1;
        let tail_index = candidates
            .iter()
            .position(|row| !remaining_ids.contains(row.next_link()))
            .unwrap_or(last);

        let tail = candidates.remove(tail_index);
        remaining_ids.remove(tail.link_id());
        ordered.push_front(tail);
    }

    ordered.into()
}
