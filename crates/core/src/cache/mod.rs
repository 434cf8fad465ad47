//! Read-through caching for filtered, paginated list views.
//!
//! - Deterministic key derivation from a cache name and a parameter bag
//! - A facade that computes on miss and degrades to computing when the
//!   store is down
//! - Prefix invalidation, native (SQLite), by enumeration (files, memory) or
//!   by flushing when the store cannot list keys
//! - A registry that maps data mutations to the cache names they stale

pub mod connection;
pub mod entries;
pub mod facade;
pub mod file;
pub mod keys;
pub mod memory;
pub mod migrations;
pub mod names;
pub mod params;
pub mod registry;
pub mod store;

pub use connection::CacheDb;
pub use facade::{CacheFacade, CacheStats, InvalidationOutcome};
pub use file::FileStore;
pub use keys::KeyDeriver;
pub use memory::MemoryStore;
pub use names::CacheName;
pub use params::{ParamBag, ParamValue};
pub use registry::{InvalidationRegistry, MutationEvent};
pub use store::{CacheStore, EnumerableStore, PrefixStore, StoreHandle, StoredValue};
