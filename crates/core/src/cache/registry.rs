//! Declarative mapping from data mutations to the caches they stale.
//!
//! Mutation paths never name caches directly. They report a
//! [`MutationEvent`] and the registry decides which cache names to
//! invalidate, so a new cached view only needs a registry entry.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::names::CacheName;

/// A write to one of the cached resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationEvent {
    /// A product was created, updated, deleted, restored or toggled.
    ProductWritten,
    /// A category was created, updated, deleted or restored.
    CategoryWritten,
    /// An order's status changed.
    OrderWritten,
    /// An order was placed or deleted, changing product stock.
    OrderPlaced,
    /// A user record changed.
    UserWritten,
}

impl MutationEvent {
    pub const ALL: [MutationEvent; 5] = [
        MutationEvent::ProductWritten,
        MutationEvent::CategoryWritten,
        MutationEvent::OrderWritten,
        MutationEvent::OrderPlaced,
        MutationEvent::UserWritten,
    ];
}

impl fmt::Display for MutationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationEvent::ProductWritten => "product_written",
            MutationEvent::CategoryWritten => "category_written",
            MutationEvent::OrderWritten => "order_written",
            MutationEvent::OrderPlaced => "order_placed",
            MutationEvent::UserWritten => "user_written",
        };
        f.write_str(name)
    }
}

const PRODUCT_CACHES: [CacheName; 3] =
    [CacheName::ProductsList, CacheName::ProductsFiltered, CacheName::ProductDetail];

const ORDER_CACHES: [CacheName; 2] = [CacheName::OrdersList, CacheName::UserOrders];

/// Event to cache-name association table.
#[derive(Debug, Clone, Default)]
pub struct InvalidationRegistry {
    entries: HashMap<MutationEvent, Vec<CacheName>>,
}

impl InvalidationRegistry {
    /// An empty registry. Events without an entry invalidate nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// The storefront's associations.
    ///
    /// Order lists embed product and category data, so writes to either
    /// also stale them.
    pub fn standard() -> Self {
        Self::new()
            .register(MutationEvent::ProductWritten, PRODUCT_CACHES.iter().chain(&ORDER_CACHES).copied())
            .register(
                MutationEvent::CategoryWritten,
                std::iter::once(CacheName::CategoriesList)
                    .chain(PRODUCT_CACHES)
                    .chain(ORDER_CACHES),
            )
            .register(MutationEvent::OrderWritten, ORDER_CACHES)
            .register(MutationEvent::OrderPlaced, ORDER_CACHES.iter().chain(&PRODUCT_CACHES).copied())
            .register(MutationEvent::UserWritten, ORDER_CACHES)
    }

    /// Add `names` to the set invalidated by `event`. Duplicates are ignored.
    pub fn register(mut self, event: MutationEvent, names: impl IntoIterator<Item = CacheName>) -> Self {
        let list = self.entries.entry(event).or_default();
        for name in names {
            if !list.contains(&name) {
                list.push(name);
            }
        }
        self
    }

    /// Cache names to invalidate for `event`.
    pub fn names_for(&self, event: MutationEvent) -> &[CacheName] {
        self.entries.get(&event).map(Vec::as_slice).unwrap_or_default()
    }
}
