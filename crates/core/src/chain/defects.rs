#![forbid(unsafe_code)]

use super::ChainLink;
use crate::is_sentinel;
use std::collections::{BTreeMap, BTreeSet};

/// Structural problems observed in a snapshot of active rows.
///
/// Purely informational: [`super::order_chain`] produces a total order for any
/// input, so these are only worth logging.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainDefects {
    /// Rows whose successor is the tail sentinel. A well-formed non-empty
    /// chain has exactly one.
    pub tail_rows: usize,
    /// Ids of rows pointing at something that is neither a sentinel nor a
    /// present row.
    pub dangling: Vec<String>,
    /// Ids targeted as successor by more than one row.
    pub branching: Vec<String>,
}

impl ChainDefects {
    pub fn is_clean(&self, row_count: usize) -> bool {
        let expected_tails = usize::from(row_count > 0);
        self.tail_rows == expected_tails && self.dangling.is_empty() && self.branching.is_empty()
    }
}

pub fn inspect_chain<T: ChainLink>(rows: &[T]) -> ChainDefects {
    let ids: BTreeSet<&str> = rows.iter().map(ChainLink::link_id).collect();
    let mut incoming: BTreeMap<&str, usize> = BTreeMap::new();
    let mut defects = ChainDefects::default();

    for row in rows {
        let next = row.next_link();
        if next == crate::TAIL_NEXT {
            defects.tail_rows += 1;
            continue;
        }
        if is_sentinel(next) || !ids.contains(next) {
            defects.dangling.push(row.link_id().to_string());
            continue;
        }
        *incoming.entry(next).or_default() += 1;
    }

    defects.branching = incoming
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id.to_string())
        .collect();
    defects
}
