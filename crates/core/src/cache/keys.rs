//! Content-addressed cache key generation.
//!
//! A key is either the bare cache-name prefix (no parameters) or
//! `prefix_<digest>`, where the digest is the first 128 bits of the SHA-256
//! of the bag's canonical query string, hex encoded.

use sha2::{Digest, Sha256};

use super::names::CacheName;
use super::params::ParamBag;

/// Hex length of the parameter digest (128 bits).
pub const DIGEST_HEX_LEN: usize = 32;

/// Default sort column merged into paginated keys.
pub const DEFAULT_SORT_COLUMN: &str = "id";

/// Default sort direction merged into paginated keys.
pub const DEFAULT_SORT_DIRECTION: &str = "DESC";

/// Compute the 128-bit hex digest of a canonical parameter string.
pub fn digest(canonical: &str) -> String {
    let hash = Sha256::digest(canonical.as_bytes());
    hex::encode(&hash[..DIGEST_HEX_LEN / 2])
}

/// Derives cache keys from a cache name and a parameter bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDeriver {
    per_page: u32,
}

impl KeyDeriver {
    /// Create a deriver whose paginated keys default to `per_page`.
    pub fn new(per_page: u32) -> Self {
        Self { per_page }
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Key for `name` and `params`.
    ///
    /// An empty bag yields the bare prefix so the zero-filter entry can be
    /// targeted directly.
    pub fn key(&self, name: CacheName, params: &ParamBag) -> String {
        if params.is_empty() {
            return name.prefix().to_string();
        }

        format!("{}_{}", name.prefix(), digest(&params.to_query_string()))
    }

    /// Key with pagination and sort defaults merged in as explicit params.
    ///
    /// Omitted `page`, `per_page`, `sort_column` and `sort_direction` become
    /// `1`, the configured page size, `"id"` and `"DESC"`, so a request that
    /// spells out a default hashes the same as one that leaves it out.
    pub fn paginated_key(&self, name: CacheName, params: &ParamBag) -> String {
        let mut merged = params.clone();
        merged
            .insert_default("page", 1)
            .insert_default("per_page", self.per_page)
            .insert_default("sort_column", DEFAULT_SORT_COLUMN)
            .insert_default("sort_direction", DEFAULT_SORT_DIRECTION);

        self.key(name, &merged)
    }

    /// Key scoped to one user, so entries never leak across users.
    pub fn user_key(&self, name: CacheName, user_id: i64, params: &ParamBag) -> String {
        let mut scoped = params.clone();
        scoped.insert("user_id", user_id);

        self.key(name, &scoped)
    }

    /// Paginated key scoped to one user.
    pub fn user_paginated_key(&self, name: CacheName, user_id: i64, params: &ParamBag) -> String {
        let mut scoped = params.clone();
        scoped.insert("user_id", user_id);

        self.paginated_key(name, &scoped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::params::ParamValue;

    fn deriver() -> KeyDeriver {
        KeyDeriver::new(20)
    }

    #[test]
    fn test_empty_bag_is_bare_prefix() {
        for name in CacheName::ALL {
            assert_eq!(deriver().key(name, &ParamBag::new()), name.prefix());
        }
    }

    #[test]
    fn test_key_format() {
        let params = ParamBag::new().with("category", "electronics").with("price", 100);
        let key = deriver().key(CacheName::ProductsList, &params);

        assert!(key.starts_with("products_list_"));
        assert_eq!(key.len(), "products_list_".len() + DIGEST_HEX_LEN);
        assert!(key["products_list_".len()..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_digest_is_stable() {
        // Fixed vector: must never change across releases or restarts.
        assert_eq!(digest("category=electronics&price=100"), digest("category=electronics&price=100"));
        assert_eq!(digest(""), "e3b0c44298fc1c149afbf4c8996fb924");
    }

    #[test]
    fn test_insertion_order_does_not_affect_key() {
        let a = ParamBag::new().with("category", "electronics").with("price", 100);
        let b = ParamBag::new().with("price", 100).with("category", "electronics");
        assert_eq!(deriver().key(CacheName::ProductsList, &a), deriver().key(CacheName::ProductsList, &b));
    }

    #[test]
    fn test_different_params_give_different_keys() {
        let a = ParamBag::new().with("category", "electronics");
        let b = ParamBag::new().with("category", "clothing");
        let c = ParamBag::new().with("category_name", "electronics");
        let keys = [
            deriver().key(CacheName::ProductsList, &a),
            deriver().key(CacheName::ProductsList, &b),
            deriver().key(CacheName::ProductsList, &c),
        ];
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[0], keys[2]);
        assert_ne!(keys[1], keys[2]);
    }

    #[test]
    fn test_null_filter_does_not_fragment() {
        let mut with_null = ParamBag::new();
        with_null.insert_opt("price", None::<f64>);
        assert_eq!(
            deriver().key(CacheName::ProductsList, &with_null),
            deriver().key(CacheName::ProductsList, &ParamBag::new())
        );
    }

    #[test]
    fn test_paginated_defaults_are_explicit() {
        let implicit = deriver().paginated_key(CacheName::ProductsList, &ParamBag::new());
        let explicit = deriver().paginated_key(
            CacheName::ProductsList,
            &ParamBag::new()
                .with("page", 1)
                .with("per_page", 20)
                .with("sort_column", "id")
                .with("sort_direction", "DESC"),
        );
        assert_eq!(implicit, explicit);
        assert_ne!(implicit, CacheName::ProductsList.prefix());
    }

    #[test]
    fn test_paginated_key_matches_manual_merge() {
        let params = ParamBag::new().with("category", "electronics");
        let expected = ParamBag::new()
            .with("category", "electronics")
            .with("page", 1)
            .with("per_page", 15)
            .with("sort_column", "id")
            .with("sort_direction", "DESC");

        let deriver = KeyDeriver::new(15);
        assert_eq!(
            deriver.paginated_key(CacheName::ProductsList, &params),
            format!("products_list_{}", digest(&expected.to_query_string()))
        );
    }

    #[test]
    fn test_paginated_key_caller_values_win() {
        let page_two = ParamBag::new().with("page", 2);
        assert_ne!(
            deriver().paginated_key(CacheName::ProductsList, &page_two),
            deriver().paginated_key(CacheName::ProductsList, &ParamBag::new())
        );
        // Merging defaults must not mutate the caller's bag.
        assert_eq!(page_two.get("page"), Some(&ParamValue::Int(2)));
        assert_eq!(page_two.len(), 1);
    }

    #[test]
    fn test_paginated_key_order_scenario() {
        let a = ParamBag::new().with("page", 2).with("category_name", "Shoes");
        let b = ParamBag::new().with("category_name", "Shoes").with("page", 2);
        let first = deriver().paginated_key(CacheName::ProductsList, &a);
        let second = deriver().paginated_key(CacheName::ProductsList, &b);
        assert_eq!(first, second);
    }

    #[test]
    fn test_page_size_changes_paginated_key() {
        let params = ParamBag::new();
        assert_ne!(
            KeyDeriver::new(20).paginated_key(CacheName::ProductsList, &params),
            KeyDeriver::new(50).paginated_key(CacheName::ProductsList, &params)
        );
    }

    #[test]
    fn test_user_scoping() {
        let params = ParamBag::new().with("status", "pending");
        let seven = deriver().user_key(CacheName::UserOrders, 7, &params);
        let eight = deriver().user_key(CacheName::UserOrders, 8, &params);
        assert_ne!(seven, eight);
        assert!(seven.starts_with("user_orders_"));

        // An empty bag still hashes once the user id is injected.
        assert_ne!(deriver().user_key(CacheName::UserOrders, 7, &ParamBag::new()), "user_orders");
    }

    #[test]
    fn test_user_paginated_scoping() {
        let params = ParamBag::new();
        assert_ne!(
            deriver().user_paginated_key(CacheName::UserOrders, 7, &params),
            deriver().user_paginated_key(CacheName::UserOrders, 8, &params)
        );
        assert_eq!(
            deriver().user_paginated_key(CacheName::UserOrders, 7, &params),
            deriver().paginated_key(CacheName::UserOrders, &ParamBag::new().with("user_id", 7))
        );
    }
}
