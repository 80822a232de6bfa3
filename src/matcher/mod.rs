//! The matching core: result collapsing and lazy shard-backed value access.
//!
//! The ranking traversal drives both halves of this module for every
//! candidate it produces: it positions a [`ValueStreamDocument`] on the
//! candidate, then asks the [`Collapser`] how the candidate should be
//! handled, using the returned [`CollapseOutcome`] to decide what enters
//! or leaves the final result set.

pub mod collapser;
pub mod value_stream;

pub use self::collapser::{CollapseConfig, CollapseData, CollapseOutcome, CollapseStats, Collapser};
pub use self::value_stream::{ValueSource, ValueStreamDocument};
