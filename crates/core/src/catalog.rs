//! Product catalog: the static mapping from Kiwify product identifiers to
//! the MailerLite groups and tags that mirror a purchase lifecycle.
//!
//! The catalog is built once at startup and shared read-only for the life of
//! the process. Resolution is total: identifiers without a configured entry
//! resolve to the single unknown-product fallback, and the caller decides
//! whether fallback traffic is processed or suppressed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`ProductTable`].
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Two entries share the same product id.
    #[error("duplicate product id in catalog: {0}")]
    DuplicateProduct(String),
    /// No entry is flagged as the unknown-product fallback.
    #[error("catalog has no unknown-product fallback entry")]
    MissingFallback,
    /// More than one entry is flagged as the unknown-product fallback.
    #[error("catalog has more than one unknown-product fallback entry")]
    MultipleFallbacks,
}

/// Group and tag configuration for one sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductConfig {
    /// Kiwify product identifier this entry is keyed by.
    pub product_id: String,
    /// Human-readable product name, used only for logging.
    pub display_name: String,
    /// Group denoting an active customer of this product.
    pub group_client: String,
    /// Group denoting an abandoned-cart lead for this product.
    pub group_cart_recovery: String,
    /// Tag applied on a completed purchase.
    pub tag_bought: String,
    /// Tag applied on refund, chargeback, or cancellation.
    pub tag_refund: String,
    /// Tag applied on an abandoned checkout.
    pub tag_abandoned_cart: String,
    /// Marks the entry used for product ids the catalog does not know.
    #[serde(default)]
    pub unknown_fallback: bool,
}

/// Immutable product lookup table.
///
/// Holds one [`ProductConfig`] per known product id plus exactly one
/// fallback entry for unrecognized ids.
#[derive(Debug, Clone)]
pub struct ProductTable {
    by_id: HashMap<String, ProductConfig>,
    fallback: ProductConfig,
}

impl ProductTable {
    /// Build a table from catalog entries.
    ///
    /// # Errors
    ///
    /// Returns an error if two entries share a product id, or if the entry
    /// set does not contain exactly one fallback.
    pub fn from_entries(entries: Vec<ProductConfig>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::new();
        let mut fallback: Option<ProductConfig> = None;

        for entry in entries {
            if entry.unknown_fallback {
                if fallback.is_some() {
                    return Err(CatalogError::MultipleFallbacks);
                }
                fallback = Some(entry);
                continue;
            }

            if by_id.contains_key(&entry.product_id) {
                return Err(CatalogError::DuplicateProduct(entry.product_id));
            }
            by_id.insert(entry.product_id.clone(), entry);
        }

        let fallback = fallback.ok_or(CatalogError::MissingFallback)?;

        Ok(Self { by_id, fallback })
    }

    /// Resolve a product id to its configuration.
    ///
    /// Total: ids without a configured entry resolve to the fallback entry,
    /// whose `unknown_fallback` flag is set.
    #[must_use]
    pub fn resolve(&self, product_id: &str) -> &ProductConfig {
        self.by_id.get(product_id).unwrap_or(&self.fallback)
    }

    /// Number of configured products, excluding the fallback.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the table holds no configured products (only the fallback).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
