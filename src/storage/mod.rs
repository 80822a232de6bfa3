//! Storage abstraction layer for Falcata.
//!
//! This module provides the pluggable backend seam the matcher reads
//! through: per-shard value lists, stored documents, and the shard reader
//! that opens both. Implementations may be backed by files, memory, or
//! remote stores; the matcher only ever sees these traits.

pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use memory::*;
pub use traits::*;
