//! Core domain logic for the product catalog.
//! This crate is the single source of truth for product invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{CatalogConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::product::{
    FieldViolation, PriceInput, Product, ProductDraft, ProductField, ProductId, ProductPatch,
    ProductValidationError, UpdateOptions,
};
pub use repo::product_repo::{
    ProductFilter, ProductListQuery, ProductRepository, RepoError, RepoResult,
    SqliteProductRepository,
};
pub use search::fts::{search_products, SearchError, SearchHit, SearchMode, SearchQuery};
pub use service::product_service::ProductService;

/// Minimal health-check API for smoke probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
