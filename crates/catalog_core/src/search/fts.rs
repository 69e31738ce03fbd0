//! SQLite FTS5-based product search.
//!
//! # Responsibility
//! - Provide keyword search over product `name` and `description`.
//! - Return full product records with a relevance score.
//!
//! # Invariants
//! - Matching is case-insensitive and prefix-based per query token;
//!   one-character tokens only match whole words.
//! - No match is an empty result, never an error.
//! - Ordering is by score only when ranking is requested; otherwise it is
//!   deterministic by `created_at` and insertion order.

use crate::db::DbError;
use crate::model::product::Product;
use crate::repo::product_repo::{parse_product_row, RepoError};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

static QUERY_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("valid query token regex"));

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for query parsing, DB interaction and result decoding.
#[derive(Debug)]
pub enum SearchError {
    /// Raw FTS5 expression could not be parsed.
    InvalidQuery {
        query: String,
        message: String,
    },
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid full-text query `{query}`: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidQuery { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

/// How multiple query tokens combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// A product matches when any token matches.
    #[default]
    AnyTerm,
    /// A product matches only when every token matches.
    AllTerms,
}

/// Search options for full-text query behavior.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// User query text.
    pub text: String,
    pub mode: SearchMode,
    /// Sort hits by relevance, best first.
    pub sort_by_score: bool,
    /// Maximum number of hits. `None` returns every match.
    pub limit: Option<u32>,
    /// Whether to pass text directly as a raw FTS5 expression.
    ///
    /// Default is `false` so punctuation in user input never fails a query.
    pub raw_fts_syntax: bool,
}

impl SearchQuery {
    /// Creates an unranked, unlimited any-term query.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: SearchMode::AnyTerm,
            sort_by_score: false,
            limit: None,
            raw_fts_syntax: false,
        }
    }

    /// Same query with relevance ordering enabled.
    pub fn ranked(mut self) -> Self {
        self.sort_by_score = true;
        self
    }
}

/// Single product returned by [`search_products`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub product: Product,
    /// Negated BM25 rank; higher means more relevant.
    pub score: f64,
}

/// Searches products by name and description.
///
/// Returns an empty list for blank queries, token-free queries and
/// `limit == Some(0)`.
///
/// # Errors
/// - [`SearchError::InvalidQuery`] when a raw FTS5 expression is malformed.
/// - [`SearchError::Db`] on storage failures.
pub fn search_products(conn: &Connection, query: &SearchQuery) -> SearchResult<Vec<SearchHit>> {
    let Some(match_expr) = build_match_expression(query) else {
        return Ok(Vec::new());
    };

    if query.limit == Some(0) {
        return Ok(Vec::new());
    }

    let mut sql = String::from(
        "SELECT
            products.id AS id,
            products.name AS name,
            products.price AS price,
            products.description AS description,
            products.category AS category,
            products.created_at AS created_at,
            products.updated_at AS updated_at,
            bm25(products_fts) AS bm25_rank
         FROM products_fts
         JOIN products ON products.row_id = products_fts.rowid
         WHERE products_fts MATCH ?",
    );
    let mut bind_values: Vec<Value> = vec![Value::Text(match_expr.clone())];

    if query.sort_by_score {
        sql.push_str(" ORDER BY bm25_rank ASC, products.created_at ASC, products.row_id ASC");
    } else {
        sql.push_str(" ORDER BY products.created_at ASC, products.row_id ASC");
    }

    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query(params_from_iter(bind_values))
        .map_err(|err| map_query_error(err, &match_expr))?;
    let mut hits = Vec::new();

    while let Some(row) = rows
        .next()
        .map_err(|err| map_query_error(err, &match_expr))?
    {
        let rank: f64 = row.get("bm25_rank")?;
        hits.push(SearchHit {
            product: parse_product_row(row)?,
            score: -rank,
        });
    }

    Ok(hits)
}

fn build_match_expression(query: &SearchQuery) -> Option<String> {
    let text = query.text.trim();
    if text.is_empty() {
        return None;
    }

    if query.raw_fts_syntax {
        return Some(text.to_string());
    }

    let tokens: Vec<&str> = QUERY_TOKEN_RE
        .find_iter(text)
        .map(|token| token.as_str())
        .collect();
    if tokens.is_empty() {
        return None;
    }

    // One-character tokens ("s" in "iPhone's") would prefix-match most of the
    // catalog. They are dropped next to longer tokens and matched as whole
    // words when nothing else is left.
    let has_long_token = tokens.iter().any(|token| !is_short_token(token));
    let terms = tokens
        .into_iter()
        .filter_map(|token| match (is_short_token(token), has_long_token) {
            (false, _) => Some(prefix_term(token)),
            (true, false) => Some(exact_term(token)),
            (true, true) => None,
        })
        .collect::<Vec<_>>();

    let joiner = match query.mode {
        SearchMode::AnyTerm => " OR ",
        SearchMode::AllTerms => " AND ",
    };
    Some(terms.join(joiner))
}

fn is_short_token(token: &str) -> bool {
    token.chars().nth(1).is_none()
}

// Tokens only contain letters and digits, so no quote escaping is needed.
fn prefix_term(token: &str) -> String {
    format!("\"{token}\"*")
}

fn exact_term(token: &str) -> String {
    format!("\"{token}\"")
}

fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return SearchError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }

    SearchError::Db(DbError::Sqlite(err))
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
                || msg.contains("no such column")
        }
        _ => false,
    }
}
