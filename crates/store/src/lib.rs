//! Ordered key-value store abstraction for the Tideflow settlement engine.
//!
//! The engine never talks to a database directly: all reads and writes go
//! through the [`KvStore`] trait, which the surrounding runtime implements on
//! top of its versioned ledger store. This crate ships two implementations:
//!
//! - [`MemStore`] - a `BTreeMap`-backed store for tests and embedding
//! - [`Overlay`] - a shadow store buffering writes over any parent until an
//!   explicit [`Overlay::commit`]
//!
//! Prefix iteration is lexicographic on raw key bytes everywhere. Replicated
//! determinism depends on that ordering, so implementations must not relax it.

mod kv;
mod overlay;

pub use kv::{KvStore, MemStore};
pub use overlay::Overlay;
