//! Inventory ledger: the only writer of product stock.
//!
//! Checkout calls [`check_availability`] for every line before any stock
//! mutates, then [`consume`] for every line. Both run inside the caller's
//! transaction; the availability flag is maintained by the store's
//! decrement/restock updates.

use common::ProductId;
use store::{Product, Store, StoreTx};

use crate::DomainError;

/// A requested stock reservation for one product.
#[derive(Debug, Clone, Copy)]
pub struct StockRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A line that failed the availability check.
#[derive(Debug, Clone)]
pub struct StockViolation {
    pub product_id: ProductId,
    /// Product title, used to name the offender in the error message.
    pub title: String,
}

/// Checks stock for *all* requested lines before anything mutates.
///
/// Locks each product row for the remainder of the transaction and
/// collects every violation rather than short-circuiting on the first,
/// so the caller can report the complete set. Fails with `NotFound` if
/// any referenced product no longer exists.
pub async fn check_availability<T: StoreTx>(
    tx: &mut T,
    requests: &[StockRequest],
) -> Result<Vec<StockViolation>, DomainError> {
    let mut violations = Vec::new();
    for request in requests {
        let product = tx
            .product_for_update(request.product_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", request.product_id))?;
        if product.stock < request.quantity as i32 {
            violations.push(StockViolation {
                product_id: product.id,
                title: product.title,
            });
        }
    }
    Ok(violations)
}

/// Applies the stock decrement for every requested line.
///
/// Must only run after [`check_availability`] returned no violations
/// within the same transaction. The store's conditional update still
/// refuses to persist negative stock if that contract is broken.
pub async fn consume<T: StoreTx>(
    tx: &mut T,
    requests: &[StockRequest],
) -> Result<(), DomainError> {
    for request in requests {
        tx.apply_stock_decrement(request.product_id, request.quantity)
            .await?;
    }
    Ok(())
}

/// Admin-facing restock operations.
pub struct InventoryService<S: Store> {
    store: S,
}

impl<S: Store> InventoryService<S> {
    /// Creates a new inventory service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Raises a product's stock by `quantity`. Availability flips back
    /// to true as soon as stock rises above zero.
    #[tracing::instrument(skip(self))]
    pub async fn restock(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Product, DomainError> {
        let mut tx = self.store.begin().await?;
        let product = tx
            .restock(product_id, quantity)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", product_id))?;
        tx.commit().await?;
        Ok(product)
    }
}
