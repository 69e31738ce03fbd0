//! Product domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by catalog business logic.
//! - Keep validation rules next to the data they guard.
//!
//! # Invariants
//! - Every product is identified by a stable `ProductId`.
//! - Write-side inputs are validated before they reach storage.

pub mod product;
