//! Topograph Storage - Storage backends for the inventory graph
//!
//! This crate persists vertices and edges so a [`topograph_core::Graph`]
//! can be loaded into memory for querying and written back afterwards.

#![allow(clippy::result_large_err)]

pub mod error;
pub mod traits;

#[cfg(feature = "redb")]
pub mod redb;

pub mod memory;

pub use error::{StorageError, StorageResult};
pub use traits::StorageBackend;

#[cfg(feature = "redb")]
pub use redb::RedbStorage;

pub use memory::MemoryStorage;
