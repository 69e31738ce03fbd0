//! Full-text search entry points.
//!
//! # Responsibility
//! - Expose product search backed by the SQLite FTS5 index.
//! - Keep result shaping and ranking inside core.

pub mod fts;
