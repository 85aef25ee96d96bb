//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Deterministic business failures (validation, invariants, conflicts), plus
/// the one `Storage` escape hatch the repository ports funnel adapter
/// failures through.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A movement quantity was out of range for its kind.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// A stock-out exceeded the on-hand quantity.
    ///
    /// `available` is the quantity observed at decision time, so callers can
    /// surface "only N available" messages.
    #[error("insufficient stock: only {available} available")]
    InsufficientStock { available: i64 },

    /// A unique identifier (sku, username, provider link) is already taken.
    #[error("duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A conflict occurred (e.g. concurrent update lost the race).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Authorization failure at the domain boundary.
    #[error("unauthorized")]
    Unauthorized,

    /// The storage adapter failed (connection, query, mapping). Carried as a
    /// message because the port surface stays driver-agnostic.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_quantity(msg: impl Into<String>) -> Self {
        Self::InvalidQuantity(msg.into())
    }

    pub fn insufficient_stock(available: i64) -> Self {
        Self::InsufficientStock { available }
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::DuplicateIdentifier(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
