//! Collapse candidates sharing a key, keeping only the best few per key.
//!
//! Collapsing runs on every candidate the ranking traversal produces, so
//! the per-candidate cost matters: a candidate either opens a new key
//! group, joins one below capacity, or goes through a single heap-root
//! comparison (plus an O(log max) re-sift when it wins). Alongside the
//! retained sets, per-key rejection statistics are tracked so the engine
//! can report sound lower bounds and corrected estimates for the total
//! match count without ever computing it exactly.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hit::{Hit, SortOrder};
use crate::matcher::value_stream::ValueSource;

/// How a candidate was handled by the [`Collapser`].
///
/// `Replaced` carries the evicted hit inline; it belongs to the caller,
/// which typically removes it from its own result set.
#[derive(Debug, Clone, PartialEq)]
pub enum CollapseOutcome {
    /// The candidate has no collapse key and is kept uncollapsed.
    Empty,
    /// The candidate was retained.
    Added,
    /// The candidate lost to the retained set and was discarded.
    Rejected,
    /// The candidate displaced a retained hit, returned here.
    Replaced(Hit),
}

/// Collapsing configuration for one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseConfig {
    /// The value slot collapse keys are read from.
    pub slot: u32,
    /// Maximum hits retained per key; 0 disables collapsing.
    pub collapse_max: usize,
}

impl CollapseConfig {
    /// Create a configuration collapsing on the given slot.
    pub fn new(slot: u32, collapse_max: usize) -> Self {
        CollapseConfig { slot, collapse_max }
    }
}

impl Default for CollapseConfig {
    fn default() -> Self {
        // Collapsing is off unless asked for.
        CollapseConfig {
            slot: 0,
            collapse_max: 0,
        }
    }
}

/// The retained hits and rejection statistics for one collapse key value.
#[derive(Debug, Clone)]
pub struct CollapseData {
    /// Currently retained hits for this key.
    ///
    /// Once `items.len()` reaches the configured max this is kept as a
    /// heap under the injected order with the weakest hit at the root, so
    /// the next candidate is answered by one comparison against the root.
    items: Vec<Hit>,
    /// The highest weight among hits rejected for this key.
    next_best_weight: f64,
    /// How many hits have been rejected for this key.
    collapse_count: u64,
}

impl CollapseData {
    /// Create the group for a key's first hit.
    fn new(hit: &Hit) -> Self {
        CollapseData {
            items: vec![strip_key(hit)],
            next_best_weight: 0.0,
            collapse_count: 0,
        }
    }

    /// Handle a further hit with this collapse key value.
    pub(crate) fn add_item(
        &mut self,
        hit: &Hit,
        collapse_max: usize,
        order: &SortOrder,
    ) -> CollapseOutcome {
        debug_assert!(self.items.len() <= collapse_max);
        if self.items.len() < collapse_max {
            self.items.push(strip_key(hit));
            if self.items.len() == collapse_max {
                // Just reached capacity: heap the retained set.
                heapify(&mut self.items, order);
            }
            return CollapseOutcome::Added;
        }

        // At capacity; the root is the weakest retained hit.
        if !order.ranks_before(hit, &self.items[0]) {
            if hit.weight > self.next_best_weight {
                self.next_best_weight = hit.weight;
            }
            self.collapse_count += 1;
            return CollapseOutcome::Rejected;
        }

        // The candidate beats the weakest retained hit; evict it. Its
        // disposition is the caller's, so the rejection statistics stay
        // untouched here.
        let evicted = std::mem::replace(&mut self.items[0], strip_key(hit));
        sift_down(&mut self.items, 0, order);
        CollapseOutcome::Replaced(evicted)
    }

    /// The retained hits, in heap order (not sorted).
    pub fn items(&self) -> &[Hit] {
        &self.items
    }

    /// The highest weight among hits rejected for this key.
    pub fn next_best_weight(&self) -> f64 {
        self.next_best_weight
    }

    /// How many hits have been rejected for this key.
    pub fn collapse_count(&self) -> u64 {
        self.collapse_count
    }
}

/// Stored copies drop their collapse key; the table key already holds it.
fn strip_key(hit: &Hit) -> Hit {
    let mut stored = hit.clone();
    stored.collapse_key.clear();
    stored
}

/// Return true if `a` ranks strictly after `b` under `order`.
fn ranks_after(order: &SortOrder, a: &Hit, b: &Hit) -> bool {
    order.ranks_before(b, a)
}

fn heapify(items: &mut [Hit], order: &SortOrder) {
    for pos in (0..items.len() / 2).rev() {
        sift_down(items, pos, order);
    }
}

/// Restore the weakest-at-root heap property from `pos` downwards.
fn sift_down(items: &mut [Hit], mut pos: usize, order: &SortOrder) {
    let len = items.len();
    loop {
        let left = 2 * pos + 1;
        if left >= len {
            break;
        }
        let mut worst = pos;
        if ranks_after(order, &items[left], &items[worst]) {
            worst = left;
        }
        let right = left + 1;
        if right < len && ranks_after(order, &items[right], &items[worst]) {
            worst = right;
        }
        if worst == pos {
            break;
        }
        items.swap(pos, worst);
        pos = worst;
    }
}

/// A point-in-time snapshot of the collapser's counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseStats {
    /// Distinct collapse key values seen.
    pub entries: u64,
    /// Candidates seen without a collapse key.
    pub no_collapse_key: u64,
    /// Candidates discarded as duplicates of a retained hit.
    pub dups_ignored: u64,
    /// Candidates that carried a collapse key.
    pub docs_considered: u64,
    /// Guaranteed minimum number of surviving matches.
    pub matches_lower_bound: u64,
}

/// Tracks collapse keys and the candidates retained for each.
///
/// One collapser is built per match and fed every candidate in turn; all
/// state lives in the key table and counters, never in the per-candidate
/// outcome.
#[derive(Debug)]
pub struct Collapser {
    /// Map from collapse key value to the hits retained for it.
    table: AHashMap<Vec<u8>, CollapseData>,
    config: CollapseConfig,
    /// Candidates seen without a collapse key. Improves the lower bound.
    no_collapse_key: u64,
    /// Duplicates discarded. Improves the estimate and upper bound.
    dups_ignored: u64,
    /// Candidates considered for collapsing. Feeds the collapse rate.
    docs_considered: u64,
}

impl Collapser {
    /// Create a collapser for one match.
    pub fn new(config: CollapseConfig) -> Self {
        Collapser {
            table: AHashMap::new(),
            config,
            no_collapse_key: 0,
            dups_ignored: 0,
            docs_considered: 0,
        }
    }

    /// Return true if collapsing is active for this match.
    pub fn is_active(&self) -> bool {
        self.config.collapse_max != 0
    }

    /// Route one candidate.
    ///
    /// `external_key` is used verbatim when supplied (a remote stage has
    /// already computed it); otherwise the key is read from the configured
    /// slot of `values`, which must be positioned on the candidate. The
    /// candidate's own `collapse_key` annotation is set to the resolved
    /// key.
    pub fn process(
        &mut self,
        hit: &mut Hit,
        external_key: Option<&[u8]>,
        values: &mut dyn ValueSource,
        order: &SortOrder,
    ) -> Result<CollapseOutcome> {
        if !self.is_active() {
            return Ok(CollapseOutcome::Added);
        }

        let key = match external_key {
            Some(key) => key.to_vec(),
            None => values.value(self.config.slot)?,
        };
        if key.is_empty() {
            // Keyless candidates are always kept, uncollapsed.
            self.no_collapse_key += 1;
            return Ok(CollapseOutcome::Empty);
        }

        self.docs_considered += 1;
        hit.collapse_key = key.clone();

        use std::collections::hash_map::Entry;
        match self.table.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(CollapseData::new(hit));
                Ok(CollapseOutcome::Added)
            }
            Entry::Occupied(mut entry) => {
                let outcome = entry
                    .get_mut()
                    .add_item(hit, self.config.collapse_max, order);
                if matches!(outcome, CollapseOutcome::Rejected) {
                    self.dups_ignored += 1;
                }
                Ok(outcome)
            }
        }
    }

    /// Number of distinct collapse key values seen.
    pub fn entries(&self) -> u64 {
        self.table.len() as u64
    }

    /// Return true if no key group exists yet.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Candidates considered for collapsing so far.
    pub fn docs_considered(&self) -> u64 {
        self.docs_considered
    }

    /// Candidates discarded as duplicates so far.
    pub fn dups_ignored(&self) -> u64 {
        self.dups_ignored
    }

    /// Candidates seen without a collapse key so far.
    pub fn no_collapse_key(&self) -> u64 {
        self.no_collapse_key
    }

    /// A guaranteed minimum for the total number of surviving matches.
    ///
    /// Every key group keeps at least one hit and every keyless candidate
    /// survives, however many duplicates were discarded.
    pub fn matches_lower_bound(&self) -> u64 {
        self.entries() + self.no_collapse_key
    }

    /// Rejection count for a key, gated by the engine's cutoff.
    ///
    /// With a percentage cutoff active, a key's rejections only count when
    /// the best rejected weight clears `min_weight`; then all of them
    /// count, assuming every rejected hit would also have cleared the
    /// cutoff. That is a deliberate over-estimate, used only to correct
    /// displayed estimated/upper-bound match counts, never the result set
    /// itself.
    pub fn collapse_count_for(&self, key: &[u8], percent_cutoff: u32, min_weight: f64) -> u64 {
        let Some(data) = self.table.get(key) else {
            return 0;
        };
        if percent_cutoff > 0 && data.next_best_weight < min_weight {
            return 0;
        }
        data.collapse_count
    }

    /// The retained group for a key, if any candidate carried it.
    pub fn collapse_data(&self, key: &[u8]) -> Option<&CollapseData> {
        self.table.get(key)
    }

    /// Snapshot the counters for the engine's bound estimation.
    pub fn stats(&self) -> CollapseStats {
        CollapseStats {
            entries: self.entries(),
            no_collapse_key: self.no_collapse_key,
            dups_ignored: self.dups_ignored,
            docs_considered: self.docs_considered,
            matches_lower_bound: self.matches_lower_bound(),
        }
    }
}
