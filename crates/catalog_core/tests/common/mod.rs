//! Helpers shared by integration tests.
#![allow(dead_code)]

use catalog_core::{Product, ProductDraft, ProductRepository, SqliteProductRepository};

/// Five products: one named "iPhone", two mentioning "Apple".
pub fn search_fixture() -> Vec<ProductDraft> {
    vec![
        ProductDraft::new("iPhone 14", 999.0, "Latest Apple smartphone", "Phones"),
        ProductDraft::new("MacBook Pro", 2499.0, "Powerful Apple laptop", "Laptops"),
        ProductDraft::new("Galaxy S23", 899.0, "Samsung flagship phone", "Phones"),
        ProductDraft::new(
            "Pixel 7",
            599.0,
            "Google smartphone with a great camera",
            "Phones",
        ),
        ProductDraft::new("ThinkPad X1", 1899.0, "Lenovo business laptop", "Laptops"),
    ]
}

/// Stores every draft of [`search_fixture`] and returns the stored records.
pub fn seed_search_fixture(repo: &SqliteProductRepository<'_>) -> Vec<Product> {
    search_fixture()
        .iter()
        .map(|draft| repo.create_product(draft).expect("seed fixture product"))
        .collect()
}

pub fn sample_draft() -> ProductDraft {
    ProductDraft::new("Test Product", 19.99, "A product used in tests", "Testing")
}
