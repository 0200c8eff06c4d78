//! Archive gateway for tickvault
//!
//! The archive is the persistent, per-symbol trade store. This crate fixes
//! its contract as the [`ArchiveStore`] trait and ships two implementations:
//!
//! - [`MemoryArchive`]: sharded in-memory store; the substrate for tests and
//!   ephemeral runs.
//! - [`FileArchive`]: append-only per-series frame files over a
//!   `MemoryArchive`, replayed on open.
//!
//! A remote document-store driver would implement the same trait; nothing in
//! the engine depends on more than this contract.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod file;
mod memory;
mod store;

pub use file::FileArchive;
pub use memory::MemoryArchive;
pub use store::{ArchiveStore, SeriesSummary, UpsertReport};
