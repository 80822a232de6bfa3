//! In-memory shard implementation for testing and embedding.

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::error::Result;
use crate::storage::traits::{ShardReader, StoredDocument, ValueList};

/// An in-memory shard of the document store.
///
/// This is useful for tests and for driving the matcher without an on-disk
/// backend. Values are kept as per-slot columns keyed by shard-local
/// document id; payloads are kept alongside. Handles opened from a shard
/// share its data, so documents added after a handle was opened are still
/// visible through it.
#[derive(Debug, Default)]
pub struct MemoryShard {
    data: Arc<RwLock<ShardData>>,
}

#[derive(Debug, Default)]
struct ShardData {
    /// Per-slot columns: slot -> local doc id -> value bytes.
    columns: AHashMap<u32, BTreeMap<u64, Vec<u8>>>,
    /// Stored payloads: local doc id -> bytes.
    payloads: AHashMap<u64, Vec<u8>>,
}

impl MemoryShard {
    /// Create a new empty shard.
    pub fn new() -> Self {
        MemoryShard::default()
    }

    /// Store a value for a document in the given slot.
    pub fn set_value(&self, local_id: u64, slot: u32, value: impl Into<Vec<u8>>) {
        let mut data = self.data.write();
        data.columns
            .entry(slot)
            .or_default()
            .insert(local_id, value.into());
    }

    /// Store a document's payload.
    pub fn set_payload(&self, local_id: u64, payload: impl Into<Vec<u8>>) {
        let mut data = self.data.write();
        data.payloads.insert(local_id, payload.into());
    }

    /// Remove all values and payloads from the shard.
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.columns.clear();
        data.payloads.clear();
    }

    /// Number of slots that hold at least one value.
    pub fn slot_count(&self) -> usize {
        self.data.read().columns.len()
    }
}

impl ShardReader for MemoryShard {
    fn value_list(&self, slot: u32) -> Result<Box<dyn ValueList>> {
        Ok(Box::new(MemoryValueList {
            slot,
            data: Arc::clone(&self.data),
        }))
    }

    fn document(&self, local_id: u64) -> Result<Box<dyn StoredDocument>> {
        Ok(Box::new(MemoryDocument {
            local_id,
            data: Arc::clone(&self.data),
        }))
    }
}

/// A value list over one slot of a [`MemoryShard`].
#[derive(Debug)]
struct MemoryValueList {
    slot: u32,
    data: Arc<RwLock<ShardData>>,
}

impl ValueList for MemoryValueList {
    fn slot(&self) -> u32 {
        self.slot
    }

    fn seek(&mut self, local_id: u64) -> Result<Option<Vec<u8>>> {
        let data = self.data.read();
        Ok(data
            .columns
            .get(&self.slot)
            .and_then(|column| column.get(&local_id))
            .cloned())
    }
}

/// A document handle onto a [`MemoryShard`].
#[derive(Debug)]
struct MemoryDocument {
    local_id: u64,
    data: Arc<RwLock<ShardData>>,
}

impl StoredDocument for MemoryDocument {
    fn payload(&self) -> Result<Vec<u8>> {
        let data = self.data.read();
        Ok(data
            .payloads
            .get(&self.local_id)
            .cloned()
            .unwrap_or_default())
    }

    fn all_values(&self) -> Result<AHashMap<u32, Vec<u8>>> {
        let data = self.data.read();
        let mut values = AHashMap::new();
        for (&slot, column) in &data.columns {
            if let Some(value) = column.get(&self.local_id) {
                values.insert(slot, value.clone());
            }
        }
        Ok(values)
    }
}
