//! Product catalog loading.
//!
//! The built-in catalog covers the products currently sold through Kiwify.
//! `RELAY_PRODUCT_CATALOG` may point at a JSON file (an array of product
//! entries) that replaces it without a rebuild. Either way the table is
//! guaranteed an unknown-product fallback entry, so resolution stays total.

use std::path::Path;

use kiwi_relay_core::{CatalogError, ProductConfig, ProductTable};
use thiserror::Error;

/// Errors that can occur while loading the product catalog.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    /// The catalog file could not be read.
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The catalog file is not a JSON array of product entries.
    #[error("catalog file {path} is not a valid catalog: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// The entries do not form a valid table.
    #[error(transparent)]
    Invalid(#[from] CatalogError),
}

/// Load the product table, from a JSON file when a path is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the entries
/// do not form a valid table (duplicate ids, multiple fallbacks).
pub fn load(path: Option<&Path>) -> Result<ProductTable, CatalogLoadError> {
    let mut entries = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
                path: path.display().to_string(),
                source,
            })?;
            parse_entries(&raw).map_err(|source| CatalogLoadError::Parse {
                path: path.display().to_string(),
                source,
            })?
        }
        None => builtin_entries(),
    };

    // A file may omit the fallback; resolution must stay total regardless.
    if !entries.iter().any(|entry| entry.unknown_fallback) {
        entries.push(fallback_entry());
    }

    Ok(ProductTable::from_entries(entries)?)
}

/// Parse catalog entries from a JSON array.
///
/// # Errors
///
/// Returns the serde error when the input is not an array of entries.
pub fn parse_entries(raw: &str) -> Result<Vec<ProductConfig>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// The products currently sold through Kiwify.
fn builtin_entries() -> Vec<ProductConfig> {
    vec![
        ProductConfig {
            product_id: "3421876".to_string(),
            display_name: "Glow Academy".to_string(),
            group_client: "Glow Academy Students".to_string(),
            group_cart_recovery: "Glow Academy Cart Recovery".to_string(),
            tag_bought: "glow-academy-bought".to_string(),
            tag_refund: "glow-academy-refund".to_string(),
            tag_abandoned_cart: "glow-academy-abandoned".to_string(),
            unknown_fallback: false,
        },
        ProductConfig {
            product_id: "5107233".to_string(),
            display_name: "Skin Ritual Masterclass".to_string(),
            group_client: "Skin Ritual Students".to_string(),
            group_cart_recovery: "Skin Ritual Cart Recovery".to_string(),
            tag_bought: "skin-ritual-bought".to_string(),
            tag_refund: "skin-ritual-refund".to_string(),
            tag_abandoned_cart: "skin-ritual-abandoned".to_string(),
            unknown_fallback: false,
        },
        fallback_entry(),
    ]
}

/// Generic entry used for product ids the catalog does not know.
fn fallback_entry() -> ProductConfig {
    ProductConfig {
        product_id: String::new(),
        display_name: "Unknown Product".to_string(),
        group_client: "Customers".to_string(),
        group_cart_recovery: "Cart Recovery".to_string(),
        tag_bought: "bought".to_string(),
        tag_refund: "refunded".to_string(),
        tag_abandoned_cart: "abandoned-cart".to_string(),
        unknown_fallback: true,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let table = load(None).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve("3421876").display_name, "Glow Academy");
        assert!(table.resolve("unknown-id").unknown_fallback);
    }

    #[test]
    fn test_parse_entries_accepts_catalog_json() {
        let raw = r#"[
            {
                "product_id": "42",
                "display_name": "Course",
                "group_client": "Course Students",
                "group_cart_recovery": "Course Cart Recovery",
                "tag_bought": "course-bought",
                "tag_refund": "course-refund",
                "tag_abandoned_cart": "course-abandoned"
            }
        ]"#;

        let entries = parse_entries(raw).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = entries.first().unwrap();
        assert_eq!(entry.product_id, "42");
        assert!(!entry.unknown_fallback);
    }

    #[test]
    fn test_parse_entries_rejects_non_array() {
        assert!(parse_entries("{}").is_err());
        assert!(parse_entries("not json").is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load(Some(Path::new("/definitely/not/here.json")));
        assert!(matches!(result, Err(CatalogLoadError::Io { .. })));
    }

    #[test]
    fn test_fallback_entry_is_flagged() {
        assert!(fallback_entry().unknown_fallback);
    }
}
