//! Domain error types.

use store::StoreError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The addressed entity does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The request failed a validation rule.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The request would create a duplicate.
    #[error("{0}")]
    Duplicate(String),

    /// One or more products cannot cover the requested quantities. Names
    /// every offending product, not just the first.
    #[error(
        "the following products are out of stock or have insufficient stock: {}",
        .product_names.join(", ")
    )]
    InsufficientStock { product_names: Vec<String> },

    /// Checkout was attempted with no cart or an empty cart.
    #[error("cart not found or is empty")]
    EmptyCart,

    /// The principal is not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// No valid principal was supplied.
    #[error("authentication required")]
    Auth,

    /// An error occurred in the store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DomainError {
    /// Creates a `NotFound` error for an entity/id pair.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_names_every_product() {
        let err = DomainError::InsufficientStock {
            product_names: vec!["Widget".to_string(), "Gadget".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("Widget"));
        assert!(message.contains("Gadget"));
    }

    #[test]
    fn not_found_formats_entity_and_id() {
        let err = DomainError::not_found("Product", "abc-123");
        assert_eq!(err.to_string(), "Product with id abc-123 not found");
    }
}
