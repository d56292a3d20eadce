//! Store error types.

use common::ProductId;
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional stock decrement matched no row: the product is gone
    /// or its stock dropped below the requested quantity after the
    /// pre-validation pass.
    #[error("stock update conflict for product {product_id}")]
    StockConflict { product_id: ProductId },

    /// A unique constraint was violated.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
