//! Narrow product-catalog lookup seam.
//!
//! The catalog itself lives in a remote service; this crate only needs to
//! ask "does this product exist, and what is it". The remote client is
//! injected behind this trait and its failures surface to the caller.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::ProductId;
use domain::Money;
use thiserror::Error;
use tokio::sync::RwLock;

/// A product as described by the catalog service.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
}

/// Errors from the catalog lookup.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog service is unreachable.
    #[error("Product catalog unavailable: {0}")]
    Unavailable(String),
}

/// Product existence/description lookup.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Looks a product up by id; `None` means the catalog does not know it.
    async fn lookup_product(&self, id: ProductId) -> Result<Option<Product>, CatalogError>;
}

#[derive(Debug, Default)]
struct CatalogState {
    products: HashMap<ProductId, Product>,
    fail_lookups: bool,
}

/// In-memory catalog used in tests and as the placeholder wiring until the
/// remote catalog client is configured.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a product.
    pub async fn insert(&self, product: Product) {
        self.state.write().await.products.insert(product.id, product);
    }

    /// Configures lookups to fail as if the catalog were unreachable.
    pub async fn set_fail_lookups(&self, fail: bool) {
        self.state.write().await.fail_lookups = fail;
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn lookup_product(&self, id: ProductId) -> Result<Option<Product>, CatalogError> {
        let state = self.state.read().await;
        if state.fail_lookups {
            return Err(CatalogError::Unavailable("catalog down".to_string()));
        }
        Ok(state.products.get(&id).cloned())
    }
}
