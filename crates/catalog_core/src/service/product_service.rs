//! Product use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points for core callers.
//! - Delegate persistence to repository implementations.
//! - Emit metadata-only log events for every write.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.
//! - Product text never reaches the log; only ids, counts and field names do.

use crate::model::product::{Product, ProductDraft, ProductId, ProductPatch, UpdateOptions};
use crate::repo::product_repo::{
    ProductFilter, ProductListQuery, ProductRepository, RepoError, RepoResult,
};
use log::{debug, info, warn};
use std::time::Instant;

/// Use-case service wrapper for product CRUD operations.
pub struct ProductService<R: ProductRepository> {
    repo: R,
}

impl<R: ProductRepository> ProductService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and stores a new product.
    pub fn create_product(&self, draft: &ProductDraft) -> RepoResult<Product> {
        let started_at = Instant::now();
        let result = self.repo.create_product(draft);
        match &result {
            Ok(product) => info!(
                "event=product_create module=service status=ok product_id={} duration_ms={}",
                product.id,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_write_error("product_create", None, err),
        }
        result
    }

    /// Convenience wrapper over [`Self::create_product`] for complete input.
    pub fn add_product(
        &self,
        name: impl Into<String>,
        price: f64,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> RepoResult<Product> {
        self.create_product(&ProductDraft::new(name, price, description, category))
    }

    /// Gets one product by id.
    pub fn get_product(&self, id: ProductId) -> RepoResult<Option<Product>> {
        let product = self.repo.get_product(id)?;
        debug!(
            "event=product_get module=service status=ok product_id={id} found={}",
            product.is_some()
        );
        Ok(product)
    }

    /// Applies a partial update without re-running required-field checks.
    pub fn update_product(&self, id: ProductId, patch: &ProductPatch) -> RepoResult<Product> {
        self.update_product_with(id, patch, UpdateOptions::default())
    }

    /// Applies a partial update and validates the merged record.
    pub fn update_product_validated(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> RepoResult<Product> {
        self.update_product_with(id, patch, UpdateOptions::validated())
    }

    /// Applies a partial update with explicit options.
    ///
    /// Returns repository-level not-found or validation errors unchanged.
    pub fn update_product_with(
        &self,
        id: ProductId,
        patch: &ProductPatch,
        options: UpdateOptions,
    ) -> RepoResult<Product> {
        let started_at = Instant::now();
        let result = self.repo.update_product(id, patch, options);
        match &result {
            Ok(product) => info!(
                "event=product_update module=service status=ok product_id={id} fields={} validated={} updated_at={} duration_ms={}",
                field_list(patch),
                options.run_validators,
                product.updated_at,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_write_error("product_update", Some(id), err),
        }
        result
    }

    /// Deletes one product. Returns whether it existed.
    pub fn delete_product(&self, id: ProductId) -> RepoResult<bool> {
        let removed = self.repo.delete_product(id)?;
        info!("event=product_delete module=service status=ok product_id={id} removed={removed}");
        Ok(removed)
    }

    /// Deletes every product matching `filter`.
    pub fn delete_products(&self, filter: &ProductFilter) -> RepoResult<usize> {
        let removed = self.repo.delete_products(filter)?;
        info!(
            "event=product_delete_many module=service status=ok filtered={} removed={removed}",
            !filter.is_empty()
        );
        Ok(removed)
    }

    /// Removes every stored product.
    pub fn clear(&self) -> RepoResult<usize> {
        self.delete_products(&ProductFilter::all())
    }

    /// Lists products by equality filter and pagination options.
    pub fn find_products(&self, query: &ProductListQuery) -> RepoResult<Vec<Product>> {
        self.repo.find_products(query)
    }

    /// Lists every product in a category.
    pub fn list_by_category(&self, category: &str) -> RepoResult<Vec<Product>> {
        self.repo
            .find_products(&ProductListQuery::new(ProductFilter::by_category(category)))
    }

    pub fn count_products(&self, filter: &ProductFilter) -> RepoResult<u64> {
        self.repo.count_products(filter)
    }
}

fn field_list(patch: &ProductPatch) -> String {
    let fields = patch.touched_fields();
    if fields.is_empty() {
        return "none".to_string();
    }
    fields
        .iter()
        .map(|field| field.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn log_write_error(event: &str, id: Option<ProductId>, err: &RepoError) {
    let id = id.map_or_else(|| "-".to_string(), |id| id.to_string());
    match err {
        RepoError::Validation(validation) => {
            let fields = validation
                .fields()
                .iter()
                .map(|field| field.as_str())
                .collect::<Vec<_>>()
                .join(",");
            warn!(
                "event={event} module=service status=rejected product_id={id} error_code=validation_failed fields={fields}"
            );
        }
        RepoError::NotFound(_) => warn!(
            "event={event} module=service status=rejected product_id={id} error_code=not_found"
        ),
        other => warn!(
            "event={event} module=service status=error product_id={id} error_code=store_failed error={other}"
        ),
    }
}
