//! Product domain model.
//!
//! # Responsibility
//! - Define the canonical product record and its write-side inputs.
//! - Own field-level validation and price coercion rules.
//!
//! # Invariants
//! - `id` is stable and never reused for another product.
//! - `created_at == updated_at` on a freshly created product.
//! - `name`, `price`, `description` and `category` are required; text fields
//!   must be non-empty after trimming.
//! - `price` accepts any finite number, including negatives and numeric text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier assigned to every stored product.
pub type ProductId = Uuid;

/// Persisted product record.
///
/// Serialized with camelCase keys:
/// `{ id, name, price, description, category, createdAt, updatedAt }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    /// Unix epoch milliseconds. Never changes after insert.
    pub created_at: i64,
    /// Unix epoch milliseconds. Strictly increases on every update.
    pub updated_at: i64,
}

/// Addressable product field used to key validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductField {
    Name,
    Price,
    Description,
    Category,
}

impl ProductField {
    /// All fields that must be present on a valid product.
    pub const REQUIRED: [ProductField; 4] = [
        ProductField::Name,
        ProductField::Price,
        ProductField::Description,
        ProductField::Category,
    ];

    /// Field name as it appears in the persisted document.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::Description => "description",
            Self::Category => "category",
        }
    }
}

impl Display for ProductField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            "description" => Ok(Self::Description),
            "category" => Ok(Self::Category),
            other => Err(format!("unknown product field `{other}`")),
        }
    }
}

/// Reason a single field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldViolation {
    /// The field was not supplied at all.
    Missing,
    /// The field was supplied but is empty or whitespace-only.
    Empty,
    /// The price could not be coerced into a finite number.
    NotANumber { value: String },
}

impl Display for FieldViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("is required"),
            Self::Empty => f.write_str("cannot be empty"),
            Self::NotANumber { value } => write!(f, "`{value}` is not a number"),
        }
    }
}

/// Field-keyed validation failure for one product candidate.
///
/// Collects every violated field, not only the first one encountered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductValidationError {
    violations: BTreeMap<ProductField, FieldViolation>,
}

impl ProductValidationError {
    /// Creates an error holding a single violation.
    pub fn single(field: ProductField, violation: FieldViolation) -> Self {
        let mut error = Self::default();
        error.insert(field, violation);
        error
    }

    fn insert(&mut self, field: ProductField, violation: FieldViolation) {
        self.violations.entry(field).or_insert(violation);
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.violations.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    /// Returns the violation recorded for `field`, if any.
    pub fn violation(&self, field: ProductField) -> Option<&FieldViolation> {
        self.violations.get(&field)
    }

    /// Returns whether `field` failed validation.
    pub fn has_violation(&self, field: ProductField) -> bool {
        self.violations.contains_key(&field)
    }

    /// Looks up a violation by persisted field name.
    ///
    /// Unknown names return `None` rather than an error.
    pub fn violation_by_name(&self, name: &str) -> Option<&FieldViolation> {
        let field = name.parse::<ProductField>().ok()?;
        self.violation(field)
    }

    /// Iterates violations in stable field order.
    pub fn violations(&self) -> impl Iterator<Item = (ProductField, &FieldViolation)> {
        self.violations
            .iter()
            .map(|(field, violation)| (*field, violation))
    }

    /// Names of all failed fields in stable order.
    pub fn fields(&self) -> Vec<ProductField> {
        self.violations.keys().copied().collect()
    }
}

impl Display for ProductValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("product validation failed")?;
        let mut separator = ": ";
        for (field, violation) in &self.violations {
            write!(f, "{separator}{field} {violation}")?;
            separator = "; ";
        }
        Ok(())
    }
}

impl Error for ProductValidationError {}

/// Caller-supplied price, either numeric or numeric text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

impl PriceInput {
    /// Coerces the input into a finite `f64`.
    ///
    /// Text is trimmed before parsing. Negative values are accepted.
    pub fn coerce(&self) -> Result<f64, FieldViolation> {
        let (value, raw) = match self {
            Self::Number(value) => (*value, None),
            Self::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(FieldViolation::Empty);
                }
                let parsed = trimmed
                    .parse::<f64>()
                    .map_err(|_| FieldViolation::NotANumber {
                        value: trimmed.to_string(),
                    })?;
                (parsed, Some(trimmed))
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(FieldViolation::NotANumber {
                value: raw.map_or_else(|| value.to_string(), str::to_string),
            })
        }
    }
}

impl From<f64> for PriceInput {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for PriceInput {
    fn from(value: i64) -> Self {
        // Prices are stored as REAL; precision loss above 2^53 is accepted.
        Self::Number(value as f64)
    }
}

impl From<&str> for PriceInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PriceInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Candidate record submitted for creation.
///
/// Every field is optional so that absence can be reported per field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: Option<String>,
    pub price: Option<PriceInput>,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// Field set that passed validation and is ready for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidProduct {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub category: String,
}

impl ProductDraft {
    /// Creates a fully populated draft.
    pub fn new(
        name: impl Into<String>,
        price: impl Into<PriceInput>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            price: Some(price.into()),
            description: Some(description.into()),
            category: Some(category.into()),
        }
    }

    /// Validates every field and returns the normalized values.
    ///
    /// # Errors
    /// - Returns every missing, empty or non-numeric field at once.
    pub fn validate(&self) -> Result<ValidProduct, ProductValidationError> {
        let mut error = ProductValidationError::default();

        let name = required_text(&mut error, ProductField::Name, self.name.as_deref());
        let description = required_text(
            &mut error,
            ProductField::Description,
            self.description.as_deref(),
        );
        let category = required_text(&mut error, ProductField::Category, self.category.as_deref());
        let price = match &self.price {
            None => {
                error.insert(ProductField::Price, FieldViolation::Missing);
                0.0
            }
            Some(input) => input.coerce().unwrap_or_else(|violation| {
                error.insert(ProductField::Price, violation);
                0.0
            }),
        };

        error.into_result(ValidProduct {
            name,
            price,
            description,
            category,
        })
    }
}

fn required_text(
    error: &mut ProductValidationError,
    field: ProductField,
    value: Option<&str>,
) -> String {
    match value.map(str::trim) {
        None => {
            error.insert(field, FieldViolation::Missing);
            String::new()
        }
        Some("") => {
            error.insert(field, FieldViolation::Empty);
            String::new()
        }
        Some(trimmed) => trimmed.to_string(),
    }
}

/// Partial field set for updates. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<PriceInput>,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// Update behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Re-run required/empty checks on the merged record.
    ///
    /// Off by default; price coercion runs regardless.
    pub run_validators: bool,
}

impl UpdateOptions {
    /// Options with validators enabled.
    pub fn validated() -> Self {
        Self {
            run_validators: true,
        }
    }
}

impl ProductPatch {
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = Some(value.into());
        self
    }

    pub fn price(mut self, value: impl Into<PriceInput>) -> Self {
        self.price = Some(value.into());
        self
    }

    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    pub fn category(mut self, value: impl Into<String>) -> Self {
        self.category = Some(value.into());
        self
    }

    /// Returns whether the patch touches no field.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.category.is_none()
    }

    /// Fields this patch writes, in stable order.
    pub fn touched_fields(&self) -> Vec<ProductField> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push(ProductField::Name);
        }
        if self.price.is_some() {
            fields.push(ProductField::Price);
        }
        if self.description.is_some() {
            fields.push(ProductField::Description);
        }
        if self.category.is_some() {
            fields.push(ProductField::Category);
        }
        fields
    }

    /// Merges this patch into a copy of `current`.
    ///
    /// Identity and timestamps are carried over unchanged; the caller owns the
    /// `updated_at` refresh.
    ///
    /// # Errors
    /// - `price` that cannot be coerced always fails.
    /// - With `run_validators`, empty text fields on the merged record fail.
    pub fn apply_to(
        &self,
        current: &Product,
        options: UpdateOptions,
    ) -> Result<Product, ProductValidationError> {
        let mut error = ProductValidationError::default();
        let mut merged = current.clone();

        if let Some(name) = &self.name {
            merged.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            merged.description = description.trim().to_string();
        }
        if let Some(category) = &self.category {
            merged.category = category.trim().to_string();
        }
        if let Some(price) = &self.price {
            match price.coerce() {
                Ok(value) => merged.price = value,
                Err(violation) => error.insert(ProductField::Price, violation),
            }
        }

        if options.run_validators {
            for (field, value) in [
                (ProductField::Name, merged.name.as_str()),
                (ProductField::Description, merged.description.as_str()),
                (ProductField::Category, merged.category.as_str()),
            ] {
                if value.is_empty() {
                    error.insert(field, FieldViolation::Empty);
                }
            }
        }

        error.into_result(merged)
    }
}

/// Current wall clock in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

/// Next `updated_at` value that is strictly greater than `previous`.
pub fn next_updated_at(previous: i64, now: i64) -> i64 {
    if now > previous {
        now
    } else {
        previous.saturating_add(1)
    }
}
