//! Ranked candidates and the total orders used to compare them.
//!
//! A [`Hit`] is one candidate produced by the ranking traversal: a document
//! id, its weight under the active ranking function, and the byte-string
//! annotations (sort key, collapse key) read from value slots. [`SortOrder`]
//! is the strict total order injected into the match: it decides which of
//! two hits ranks first for the active sort mode, with ties always broken
//! by document id so the order is deterministic.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A ranked candidate document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// The document ID (global unless stated otherwise).
    pub doc_id: u64,
    /// The relevance weight.
    pub weight: f64,
    /// The serialized sort key for value-ordered sorts (empty if unused).
    pub sort_key: Vec<u8>,
    /// The collapse key this hit was grouped under (empty if none).
    pub collapse_key: Vec<u8>,
}

impl Hit {
    /// Create a new hit with empty sort and collapse keys.
    pub fn new(doc_id: u64, weight: f64) -> Self {
        Hit {
            doc_id,
            weight,
            sort_key: Vec::new(),
            collapse_key: Vec::new(),
        }
    }

    /// Set the sort key.
    pub fn with_sort_key(mut self, sort_key: Vec<u8>) -> Self {
        self.sort_key = sort_key;
        self
    }
}

/// The sort mode for a match, acting as a strict total order over hits.
///
/// `reverse` flips the direction of the value comparison only; relevance
/// always ranks higher weights first, and document id always breaks ties
/// in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Order by weight, highest first.
    Relevance,
    /// Order by sort key alone.
    Value { reverse: bool },
    /// Order by sort key, then weight.
    ValueThenRelevance { reverse: bool },
    /// Order by weight, then sort key.
    RelevanceThenValue { reverse: bool },
}

impl SortOrder {
    /// Compare two hits; `Less` means `a` ranks before `b`.
    pub fn compare(&self, a: &Hit, b: &Hit) -> Ordering {
        let ord = match *self {
            SortOrder::Relevance => cmp_weight(a, b),
            SortOrder::Value { reverse } => cmp_sort_key(a, b, reverse),
            SortOrder::ValueThenRelevance { reverse } => {
                cmp_sort_key(a, b, reverse).then_with(|| cmp_weight(a, b))
            }
            SortOrder::RelevanceThenValue { reverse } => {
                cmp_weight(a, b).then_with(|| cmp_sort_key(a, b, reverse))
            }
        };
        ord.then_with(|| a.doc_id.cmp(&b.doc_id))
    }

    /// Return true if `a` ranks strictly before `b`.
    pub fn ranks_before(&self, a: &Hit, b: &Hit) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}

fn cmp_weight(a: &Hit, b: &Hit) -> Ordering {
    // Higher weights rank first.
    b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal)
}

fn cmp_sort_key(a: &Hit, b: &Hit, reverse: bool) -> Ordering {
    if reverse {
        b.sort_key.cmp(&a.sort_key)
    } else {
        a.sort_key.cmp(&b.sort_key)
    }
}
