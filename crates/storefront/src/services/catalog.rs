//! Product catalog.

use std::sync::Arc;

use doghouse_core::{LineItem, ProductId, Quantity};

use crate::api::{ApiClient, ApiError, Product};

/// Read access to the product list. Backed by the client's product cache.
#[derive(Clone)]
pub struct Catalog {
    client: ApiClient,
}

impl Catalog {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// All products, in server order.
    ///
    /// # Errors
    ///
    /// Returns error if the product list cannot be fetched.
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        self.client.products().await
    }

    /// Look up one product.
    ///
    /// # Errors
    ///
    /// Returns error if the product list cannot be fetched.
    pub async fn find(&self, id: ProductId) -> Result<Option<Product>, ApiError> {
        let products = self.products().await?;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    /// A cart line for `quantity` units of product `id`, if it exists.
    ///
    /// # Errors
    ///
    /// Returns error if the product list cannot be fetched.
    pub async fn line_item(
        &self,
        id: ProductId,
        quantity: Quantity,
    ) -> Result<Option<LineItem>, ApiError> {
        Ok(self
            .find(id)
            .await?
            .map(|product| product.to_line_item(quantity)))
    }

    /// Force the next call to refetch the product list.
    pub async fn refresh(&self) {
        self.client.invalidate_products().await;
    }
}
