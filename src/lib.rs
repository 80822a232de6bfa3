//! # Falcata
//!
//! The matching core of a search engine: result collapsing and lazy
//! multi-shard value access.
//!
//! ## Features
//!
//! - Pure Rust implementation
//! - Streaming top-k-per-key result collapsing with match-count bounds
//! - Lazy, cache-safe value access over horizontally sharded stores
//! - Pluggable storage backends
//! - Injected sort orders (relevance, value, and combined modes)

pub mod error;
pub mod hit;
pub mod matcher;
pub mod shard;
pub mod storage;
pub mod value;

pub mod prelude {
    pub use crate::error::{FalcataError, Result};
    pub use crate::hit::{Hit, SortOrder};
    pub use crate::matcher::{
        CollapseConfig, CollapseOutcome, Collapser, ValueSource, ValueStreamDocument,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
