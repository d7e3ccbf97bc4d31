//! # Inventory Filters and Fingerprints
//!
//! Filters for inventory list queries and the canonical fingerprint used as
//! the cache key.
//!
//! Two filters that normalize to the same shape must produce the same
//! fingerprint, so cache lookups coalesce regardless of caller formatting
//! (surrounding whitespace, `Some("")` vs `None`).

use serde::{Deserialize, Serialize};

/// Optional filtering for inventory list queries.
///
/// An empty filter selects the full inventory. Category and product-code
/// constraints combine conjunctively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFilter {
    /// Restrict results to a category.
    pub category_id: Option<String>,

    /// Restrict results to a product code (SKU / barcode).
    pub product_code: Option<String>,
}

impl ItemFilter {
    /// The unfiltered query.
    pub fn all() -> Self {
        ItemFilter::default()
    }

    /// Filter by category id.
    pub fn by_category(category_id: impl Into<String>) -> Self {
        ItemFilter {
            category_id: Some(category_id.into()),
            product_code: None,
        }
    }

    /// Filter by product code.
    pub fn by_product_code(product_code: impl Into<String>) -> Self {
        ItemFilter {
            category_id: None,
            product_code: Some(product_code.into()),
        }
    }

    /// Returns the normalized form: fields trimmed, blanks dropped to `None`.
    pub fn normalized(&self) -> ItemFilter {
        fn norm(field: &Option<String>) -> Option<String> {
            field
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }

        ItemFilter {
            category_id: norm(&self.category_id),
            product_code: norm(&self.product_code),
        }
    }

    /// Computes the canonical fingerprint for this filter.
    ///
    /// The fingerprint is derived from the normalized form, so all filters
    /// equal after normalization share one cache entry. `*` marks an
    /// unconstrained dimension.
    pub fn fingerprint(&self) -> String {
        let normalized = self.normalized();
        format!(
            "category={}|code={}",
            normalized.category_id.as_deref().unwrap_or("*"),
            normalized.product_code.as_deref().unwrap_or("*"),
        )
    }
}
