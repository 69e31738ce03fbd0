//! Product repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD and equality-lookup APIs over `products` storage.
//! - Own identity and timestamp assignment.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Create paths validate the full draft before any SQL mutation.
//! - Updates run inside an immediate transaction and only write the columns
//!   named by the patch plus `updated_at`.
//! - `updated_at` strictly advances on every successful update.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::product::{
    next_updated_at, now_epoch_ms, Product, ProductDraft, ProductField, ProductId, ProductPatch,
    ProductValidationError, UpdateOptions,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PRODUCT_SELECT_SQL: &str = "SELECT
    id,
    name,
    price,
    description,
    category,
    created_at,
    updated_at
FROM products";

const REQUIRED_TABLES: &[&str] = &["products", "products_fts"];
const REQUIRED_PRODUCT_COLUMNS: &[&str] = &[
    "row_id",
    "id",
    "name",
    "price",
    "description",
    "category",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for product persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Field-keyed rejection of a create or validated update.
    Validation(ProductValidationError),
    /// Opaque storage failure.
    Db(DbError),
    NotFound(ProductId),
    /// A stored row could not be decoded.
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Returns the validation failure when this is a validation error.
    pub fn as_validation(&self) -> Option<&ProductValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "product not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted product data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is behind required {expected_version}; open it with open_db first"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProductValidationError> for RepoError {
    fn from(value: ProductValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Equality filter over product columns. Empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub name: Option<String>,
    pub category: Option<String>,
}

impl ProductFilter {
    /// Filter matching every product.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn by_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.category.is_none()
    }

    fn push_conditions(&self, sql: &mut String, bind_values: &mut Vec<Value>) {
        if let Some(name) = &self.name {
            sql.push_str(" AND name = ?");
            bind_values.push(Value::Text(name.clone()));
        }
        if let Some(category) = &self.category {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.clone()));
        }
    }
}

/// Query options for equality lookups.
#[derive(Debug, Clone, Default)]
pub struct ProductListQuery {
    pub filter: ProductFilter,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl ProductListQuery {
    pub fn new(filter: ProductFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }
}

/// Repository interface for product CRUD operations.
pub trait ProductRepository {
    /// Validates `draft`, assigns identity and timestamps, and stores it.
    fn create_product(&self, draft: &ProductDraft) -> RepoResult<Product>;
    fn get_product(&self, id: ProductId) -> RepoResult<Option<Product>>;
    /// Applies `patch` and returns the post-update record.
    fn update_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
        options: UpdateOptions,
    ) -> RepoResult<Product>;
    /// Returns whether a row was removed.
    fn delete_product(&self, id: ProductId) -> RepoResult<bool>;
    /// Removes every row matching `filter` and returns how many were removed.
    fn delete_products(&self, filter: &ProductFilter) -> RepoResult<usize>;
    fn find_products(&self, query: &ProductListQuery) -> RepoResult<Vec<Product>>;
    fn count_products(&self, filter: &ProductFilter) -> RepoResult<u64>;
}

/// SQLite-backed product repository.
pub struct SqliteProductRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProductRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - Rejects connections whose schema is behind, or that lack the
    ///   product table, the search index or a required column.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProductRepository for SqliteProductRepository<'_> {
    fn create_product(&self, draft: &ProductDraft) -> RepoResult<Product> {
        let valid = draft.validate()?;
        let now = now_epoch_ms();
        let product = Product {
            id: Uuid::new_v4(),
            name: valid.name,
            price: valid.price,
            description: valid.description,
            category: valid.category,
            created_at: now,
            updated_at: now,
        };

        self.conn.execute(
            "INSERT INTO products (
                id,
                name,
                price,
                description,
                category,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                product.id.to_string(),
                product.name.as_str(),
                product.price,
                product.description.as_str(),
                product.category.as_str(),
                product.created_at,
                product.updated_at,
            ],
        )?;

        Ok(product)
    }

    fn get_product(&self, id: ProductId) -> RepoResult<Option<Product>> {
        load_product(self.conn, id)
    }

    fn update_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
        options: UpdateOptions,
    ) -> RepoResult<Product> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = load_product(&tx, id)?.ok_or(RepoError::NotFound(id))?;

        let mut updated = patch.apply_to(&current, options)?;
        updated.updated_at = next_updated_at(current.updated_at, now_epoch_ms());

        let mut assignments = vec!["updated_at = ?"];
        let mut bind_values = vec![Value::Integer(updated.updated_at)];
        for field in patch.touched_fields() {
            match field {
                ProductField::Name => {
                    assignments.push("name = ?");
                    bind_values.push(Value::Text(updated.name.clone()));
                }
                ProductField::Price => {
                    assignments.push("price = ?");
                    bind_values.push(Value::Real(updated.price));
                }
                ProductField::Description => {
                    assignments.push("description = ?");
                    bind_values.push(Value::Text(updated.description.clone()));
                }
                ProductField::Category => {
                    assignments.push("category = ?");
                    bind_values.push(Value::Text(updated.category.clone()));
                }
            }
        }
        bind_values.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE products SET {} WHERE id = ?;",
            assignments.join(", ")
        );
        tx.execute(&sql, params_from_iter(bind_values))?;
        tx.commit()?;

        Ok(updated)
    }

    fn delete_product(&self, id: ProductId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM products WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn delete_products(&self, filter: &ProductFilter) -> RepoResult<usize> {
        let mut sql = String::from("DELETE FROM products WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        filter.push_conditions(&mut sql, &mut bind_values);

        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(changed)
    }

    fn find_products(&self, query: &ProductListQuery) -> RepoResult<Vec<Product>> {
        let mut sql = format!("{PRODUCT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        query.filter.push_conditions(&mut sql, &mut bind_values);

        sql.push_str(" ORDER BY created_at ASC, row_id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut products = Vec::new();

        while let Some(row) = rows.next()? {
            products.push(parse_product_row(row)?);
        }

        Ok(products)
    }

    fn count_products(&self, filter: &ProductFilter) -> RepoResult<u64> {
        let mut sql = String::from("SELECT COUNT(*) FROM products WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        filter.push_conditions(&mut sql, &mut bind_values);

        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(bind_values), |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }
}

fn load_product(conn: &Connection, id: ProductId) -> RepoResult<Option<Product>> {
    let mut stmt = conn.prepare(&format!("{PRODUCT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_product_row(row)?));
    }

    Ok(None)
}

/// Decodes one row selected with the product column list.
pub(crate) fn parse_product_row(row: &Row<'_>) -> RepoResult<Product> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in products.id"))
    })?;

    let created_at: i64 = row.get("created_at")?;
    let updated_at: i64 = row.get("updated_at")?;
    if updated_at < created_at {
        return Err(RepoError::InvalidData(format!(
            "products.updated_at ({updated_at}) is earlier than created_at ({created_at}) for {id}"
        )));
    }

    Ok(Product {
        id,
        name: row.get("name")?,
        price: row.get("price")?,
        description: row.get("description")?,
        category: row.get("category")?,
        created_at,
        updated_at,
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    if actual_version > expected_version {
        return Err(RepoError::Db(DbError::UnsupportedSchemaVersion {
            db_version: actual_version,
            latest_supported: expected_version,
        }));
    }

    for table in REQUIRED_TABLES {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepoError::MissingRequiredTable(*table));
        }
    }

    let mut stmt = conn.prepare("PRAGMA table_info(products);")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<HashSet<_>, _>>()?;
    for column in REQUIRED_PRODUCT_COLUMNS {
        if !columns.contains(*column) {
            return Err(RepoError::MissingRequiredColumn {
                table: "products",
                column: *column,
            });
        }
    }

    Ok(())
}
