//! Cart aggregate: pre-checkout item selection.

use common::{Money, ProductId, UserId};
use serde::Deserialize;
use store::{CartWithItems, NewCartItem, Store, StoreTx};

use crate::{CartPolicy, DomainError};

/// A requested cart line: product and quantity.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Service for managing carts.
///
/// Line subtotals are computed once from the product's price and
/// discount at the moment of addition and frozen; replacing the items
/// recomputes them from current product state and swaps the whole
/// collection (full-replace, not merge).
pub struct CartService<S: Store> {
    store: S,
    policy: CartPolicy,
}

impl<S: Store> CartService<S> {
    /// Creates a new cart service with the given store and line policy.
    pub fn new(store: S, policy: CartPolicy) -> Self {
        Self { store, policy }
    }

    /// Returns the user's cart, creating an empty one on first access.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user_id: UserId) -> Result<CartWithItems, DomainError> {
        let mut tx = self.store.begin().await?;
        if let Some(cart) = tx.cart_with_items(user_id).await? {
            return Ok(cart);
        }
        let cart = tx.insert_cart(user_id).await?;
        tx.commit().await?;
        Ok(CartWithItems {
            cart,
            items: Vec::new(),
        })
    }

    /// Replaces the user's cart lines with the requested items, creating
    /// the cart lazily if it does not exist yet.
    ///
    /// Every requested quantity must pass the line policy; every product
    /// must exist. Subtotals are frozen from the current discounted
    /// price, and the cart total becomes their sum.
    #[tracing::instrument(skip(self, items))]
    pub async fn put_items(
        &self,
        user_id: UserId,
        items: Vec<ItemRequest>,
    ) -> Result<CartWithItems, DomainError> {
        for item in &items {
            self.policy.check_quantity(item.quantity)?;
        }

        let mut tx = self.store.begin().await?;
        let cart = match tx.cart_for_user(user_id).await? {
            Some(cart) => cart,
            None => tx.insert_cart(user_id).await?,
        };

        let mut lines = Vec::with_capacity(items.len());
        let mut total = Money::zero();
        for item in &items {
            let product = tx
                .product(item.product_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Product", item.product_id))?;
            let subtotal = product.discounted_price().multiply(item.quantity);
            total += subtotal;
            lines.push(NewCartItem {
                product_id: item.product_id,
                quantity: item.quantity,
                subtotal,
            });
        }

        tx.replace_cart_items(cart.id, lines, total).await?;
        let result = tx
            .cart_with_items(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Cart", cart.id))?;
        tx.commit().await?;
        Ok(result)
    }

    /// Removes all lines from the user's cart. The cart row persists
    /// for reuse.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<CartWithItems, DomainError> {
        let mut tx = self.store.begin().await?;
        let cart = tx
            .cart_for_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Cart for user", user_id))?;
        tx.clear_cart(cart.id).await?;
        let result = tx
            .cart_with_items(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Cart", cart.id))?;
        tx.commit().await?;
        Ok(result)
    }
}
