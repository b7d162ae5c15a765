//! Product lookups, cached for 5 minutes.

use reqwest::Method;
use tracing::{debug, instrument};

use shopfront_core::Product;

use super::ApiError;
use super::client::ApiClient;

impl ApiClient {
    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown slugs, or a transport error.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Product, ApiError> {
        let slug = slug.trim();
        if slug.is_empty() || slug.contains('/') {
            return Err(ApiError::InvalidRequest(format!("invalid product slug '{slug}'")));
        }

        if let Some(product) = self.product_cache().get(slug).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let path = format!("products/products/{slug}/");
        let product: Product = self.send_json(Method::GET, &path, None).await?;

        self.product_cache()
            .insert(slug.to_string(), product.clone())
            .await;

        Ok(product)
    }

    /// Drop all cached products.
    pub fn invalidate_products(&self) {
        self.product_cache().invalidate_all();
    }
}
