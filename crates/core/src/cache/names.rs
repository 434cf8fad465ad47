//! Closed set of logical cache names.
//!
//! Every cache key starts with one of these prefixes. Invalidation deletes by
//! prefix, so no name may be a starts-with prefix of another.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A family of cached list/detail results for one logical resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CacheName {
    ProductsList,
    ProductsFiltered,
    ProductDetail,
    CategoriesList,
    OrdersList,
    UserOrders,
}

impl CacheName {
    /// Every cache name, in declaration order.
    pub const ALL: [CacheName; 6] = [
        CacheName::ProductsList,
        CacheName::ProductsFiltered,
        CacheName::ProductDetail,
        CacheName::CategoriesList,
        CacheName::OrdersList,
        CacheName::UserOrders,
    ];

    /// The stable key prefix for this name.
    pub const fn prefix(self) -> &'static str {
        match self {
            CacheName::ProductsList => "products_list",
            CacheName::ProductsFiltered => "products_filtered",
            CacheName::ProductDetail => "product_detail",
            CacheName::CategoriesList => "categories_list",
            CacheName::OrdersList => "orders_list",
            CacheName::UserOrders => "user_orders",
        }
    }

    /// All prefixes as strings.
    pub fn values() -> Vec<&'static str> {
        Self::ALL.iter().map(|name| name.prefix()).collect()
    }

    /// Whether `key` belongs to this name's family.
    pub fn owns(self, key: &str) -> bool {
        key.starts_with(self.prefix())
    }

    /// Check that no prefix starts another one.
    ///
    /// Returns the first offending pair, if any.
    pub fn overlapping_prefixes() -> Option<(CacheName, CacheName)> {
        for a in Self::ALL {
            for b in Self::ALL {
                if a != b && b.prefix().starts_with(a.prefix()) {
                    return Some((a, b));
                }
            }
        }
        None
    }

    pub fn prefixes_are_disjoint() -> bool {
        Self::overlapping_prefixes().is_none()
    }
}

impl fmt::Display for CacheName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for CacheName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.prefix() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown cache name: {s}")))
    }
}
