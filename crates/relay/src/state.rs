//! Application state shared across handlers.

use std::sync::Arc;

use kiwi_relay_core::{ClassifyOptions, ProductTable};

use crate::config::RelayConfig;
use crate::directory::{DirectoryError, MailerLiteClient};
use crate::reconcile::ReconcileOptions;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Everything inside is immutable for the life
/// of the process: the relay keeps no state between invocations.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RelayConfig,
    products: ProductTable,
    directory: MailerLiteClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the MailerLite client cannot be built from the
    /// configured API key.
    pub fn new(config: RelayConfig, products: ProductTable) -> Result<Self, DirectoryError> {
        let directory = MailerLiteClient::new(&config.mailerlite_api_key)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                products,
                directory,
            }),
        })
    }

    /// Get a reference to the relay configuration.
    #[must_use]
    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }

    /// Get a reference to the product table.
    #[must_use]
    pub fn products(&self) -> &ProductTable {
        &self.inner.products
    }

    /// Get a reference to the MailerLite client.
    #[must_use]
    pub fn directory(&self) -> &MailerLiteClient {
        &self.inner.directory
    }

    /// Classification switches derived from the configuration.
    #[must_use]
    pub fn classify_options(&self) -> ClassifyOptions {
        ClassifyOptions {
            process_unknown_products: self.inner.config.process_unknown_products,
        }
    }

    /// Reconciliation switches derived from the configuration.
    #[must_use]
    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            dry_run: self.inner.config.dry_run,
            tags_enabled: self.inner.config.tags_enabled,
        }
    }
}
