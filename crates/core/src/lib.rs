//! Core types and shared functionality for shelf.
//!
//! This crate provides:
//! - Deterministic cache-key derivation over filter/sort/pagination parameters
//! - A read-through cache facade with prefix-scoped invalidation
//! - File, SQLite and in-memory store backends
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{
    CacheFacade, CacheName, CacheStats, InvalidationOutcome, InvalidationRegistry, KeyDeriver, MutationEvent,
    ParamBag, ParamValue, StoreHandle,
};
pub use config::{AppConfig, CacheBackend, ConfigError};
pub use error::Error;
