//! Lazy, cache-safe value access for the current candidate document.

use std::sync::Arc;

use ahash::AHashMap;

use crate::error::{FalcataError, Result};
use crate::shard;
use crate::storage::{ShardReader, StoredDocument, ValueList};

/// Supplies per-slot attribute values for the current candidate document.
///
/// This is the seam the [`Collapser`](crate::matcher::Collapser) reads
/// collapse keys through; tests substitute their own implementations.
pub trait ValueSource {
    /// The current document's value in the given slot (empty if none).
    fn value(&mut self, slot: u32) -> Result<Vec<u8>>;
}

/// A view of "the current candidate document" over a sharded store.
///
/// Value-list handles are created lazily, one per slot actually queried,
/// and reused across documents of the same shard; every read seeks them
/// explicitly, so only the handle is cached, never a position. The stored
/// document handle is likewise created lazily and survives repeated
/// payload/value queries for the same candidate. Switching shards drops
/// both caches unconditionally: a handle opened on one shard must never
/// answer for another.
#[derive(Debug)]
pub struct ValueStreamDocument<'a> {
    /// The shards of the store, indexed by shard number.
    shards: &'a [Arc<dyn ShardReader>],
    /// Which shard the view is currently positioned on.
    current_shard: usize,
    /// The shard-local id of the current document, if one is set.
    local_doc_id: Option<u64>,
    /// Lazily created value lists for the current shard, by slot.
    value_lists: AHashMap<u32, Box<dyn ValueList>>,
    /// Lazily created handle onto the current document.
    doc: Option<Box<dyn StoredDocument>>,
}

impl<'a> ValueStreamDocument<'a> {
    /// Create a view over the given shards, positioned on shard 0.
    pub fn new(shards: &'a [Arc<dyn ShardReader>]) -> Self {
        debug_assert!(!shards.is_empty());
        ValueStreamDocument {
            shards,
            current_shard: 0,
            local_doc_id: None,
            value_lists: AHashMap::new(),
            doc: None,
        }
    }

    /// The number of shards in the underlying store.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// The shard the view is currently positioned on.
    pub fn current_shard(&self) -> usize {
        self.current_shard
    }

    /// Move the view to another shard, dropping every cached handle.
    pub fn switch_shard(&mut self, index: usize) {
        debug_assert!(index < self.shards.len());
        self.current_shard = index;
        self.local_doc_id = None;
        self.value_lists.clear();
        self.doc = None;
    }

    /// Position the view on a document by shard-local id.
    ///
    /// A no-op when the id is unchanged, which keeps the cached document
    /// handle alive across repeated slot and payload queries for the same
    /// candidate.
    pub fn set_shard_document(&mut self, local_id: u64) {
        if self.local_doc_id != Some(local_id) {
            self.local_doc_id = Some(local_id);
            self.doc = None;
        }
    }

    /// Position the view on a document by global id.
    ///
    /// The id must belong to the shard the view is currently on; the
    /// caller is responsible for calling [`switch_shard`] first.
    ///
    /// [`switch_shard`]: ValueStreamDocument::switch_shard
    pub fn set_document(&mut self, global_id: u64) {
        let (shard_index, local_id) = shard::split(global_id, self.shards.len());
        debug_assert_eq!(
            shard_index, self.current_shard,
            "document {global_id} does not belong to shard {}",
            self.current_shard
        );
        self.set_shard_document(local_id);
    }

    /// The current document's value in the given slot (empty if none).
    ///
    /// The value list for the slot is created on first use and reused for
    /// later documents on the same shard; the seek happens on every call.
    pub fn value(&mut self, slot: u32) -> Result<Vec<u8>> {
        let local_id = self.current_local_id()?;
        let list = match self.value_lists.entry(slot) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(self.shards[self.current_shard].value_list(slot)?)
            }
        };
        Ok(list.seek(local_id)?.unwrap_or_default())
    }

    /// All slot values stored for the current document.
    ///
    /// Goes through the stored-document handle rather than opening a value
    /// list per slot, which is cheaper when most reads touch only one or
    /// two slots.
    pub fn all_values(&mut self) -> Result<AHashMap<u32, Vec<u8>>> {
        self.stored_document()?.all_values()
    }

    /// The current document's opaque stored payload.
    pub fn data(&mut self) -> Result<Vec<u8>> {
        self.stored_document()?.payload()
    }

    fn current_local_id(&self) -> Result<u64> {
        self.local_doc_id
            .ok_or_else(|| FalcataError::invalid_operation("no current document"))
    }

    fn stored_document(&mut self) -> Result<&dyn StoredDocument> {
        let local_id = self.current_local_id()?;
        if self.doc.is_none() {
            self.doc = Some(self.shards[self.current_shard].document(local_id)?);
        }
        match &self.doc {
            Some(doc) => Ok(doc.as_ref()),
            None => Err(FalcataError::invalid_operation(
                "document handle unavailable",
            )),
        }
    }
}

impl ValueSource for ValueStreamDocument<'_> {
    fn value(&mut self, slot: u32) -> Result<Vec<u8>> {
        ValueStreamDocument::value(self, slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryShard;

    fn two_shards() -> Vec<Arc<dyn ShardReader>> {
        let shard0 = MemoryShard::new();
        shard0.set_value(0, 1, b"s0-doc0".as_slice());
        shard0.set_payload(0, b"payload-s0".as_slice());

        let shard1 = MemoryShard::new();
        shard1.set_value(0, 1, b"s1-doc0".as_slice());
        shard1.set_payload(0, b"payload-s1".as_slice());

        vec![Arc::new(shard0), Arc::new(shard1)]
    }

    #[test]
    fn test_value_for_current_document() {
        let shards = two_shards();
        let mut view = ValueStreamDocument::new(&shards);

        view.set_document(0);
        assert_eq!(view.value(1).unwrap(), b"s0-doc0".to_vec());
    }

    #[test]
    fn test_missing_slot_is_empty() {
        let shards = two_shards();
        let mut view = ValueStreamDocument::new(&shards);

        view.set_document(0);
        assert!(view.value(42).unwrap().is_empty());
    }

    #[test]
    fn test_value_without_document_is_error() {
        let shards = two_shards();
        let mut view = ValueStreamDocument::new(&shards);

        assert!(view.value(1).is_err());
    }

    #[test]
    fn test_shard_switch_invalidates_value_lists() {
        let shards = two_shards();
        let mut view = ValueStreamDocument::new(&shards);

        view.set_document(0);
        assert_eq!(view.value(1).unwrap(), b"s0-doc0".to_vec());

        // Same local id on the other shard must read that shard's data.
        view.switch_shard(1);
        view.set_document(1);
        assert_eq!(view.value(1).unwrap(), b"s1-doc0".to_vec());

        // And back again.
        view.switch_shard(0);
        view.set_document(0);
        assert_eq!(view.value(1).unwrap(), b"s0-doc0".to_vec());
    }

    #[test]
    fn test_payload_and_all_values() {
        let shards = two_shards();
        let mut view = ValueStreamDocument::new(&shards);

        view.switch_shard(1);
        view.set_document(1);
        assert_eq!(view.data().unwrap(), b"payload-s1".to_vec());

        let values = view.all_values().unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values.get(&1), Some(&b"s1-doc0".to_vec()));
    }

    #[test]
    #[should_panic(expected = "does not belong to shard")]
    fn test_set_document_on_wrong_shard_panics() {
        let shards = two_shards();
        let mut view = ValueStreamDocument::new(&shards);

        // Global id 1 lives on shard 1, but the view is still on shard 0.
        view.set_document(1);
    }

    #[test]
    fn test_set_same_document_is_noop() {
        let shards = two_shards();
        let mut view = ValueStreamDocument::new(&shards);

        view.set_document(0);
        let first = view.data().unwrap();
        view.set_document(0);
        assert_eq!(view.data().unwrap(), first);
    }
}
