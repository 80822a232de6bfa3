//! Backend traits the matcher reads through.

use std::fmt::Debug;

use ahash::AHashMap;

use crate::error::Result;

/// A positioned reader over one value slot of one shard.
///
/// A value list is opened for a fixed slot and then sought to whichever
/// shard-local document the matcher is currently looking at. The handle
/// itself may be reused across documents; every read seeks explicitly.
pub trait ValueList: Debug {
    /// The slot this list was opened for.
    fn slot(&self) -> u32;

    /// Seek to a shard-local document and return its value in this slot.
    ///
    /// Returns `Ok(None)` when the document stores nothing in the slot;
    /// that is a normal outcome, not an error.
    fn seek(&mut self, local_id: u64) -> Result<Option<Vec<u8>>>;
}

/// A handle onto one stored document of one shard.
pub trait StoredDocument: Debug {
    /// The document's opaque stored payload (empty if none).
    fn payload(&self) -> Result<Vec<u8>>;

    /// All slot values stored for the document.
    fn all_values(&self) -> Result<AHashMap<u32, Vec<u8>>>;
}

/// Read access to one shard of the partitioned document store.
///
/// All document ids passed through this trait are shard-local.
pub trait ShardReader: Send + Sync + Debug {
    /// Open a value list for the given slot.
    fn value_list(&self, slot: u32) -> Result<Box<dyn ValueList>>;

    /// Open a handle onto the given document.
    fn document(&self, local_id: u64) -> Result<Box<dyn StoredDocument>>;
}
