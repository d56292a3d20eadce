//! Checkout engine: converts a cart into an order atomically.

use common::{Money, UserId};
use serde::Deserialize;
use store::{NewOrder, NewOrderItem, OrderStatus, OrderWithItems, Store, StoreTx};

use crate::{
    DomainError, TAX_RATE_PERCENT,
    inventory::{self, StockRequest},
};

/// Shipping and payment details supplied by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub address: String,
    /// Opaque string; payment processing is out of scope.
    pub payment_method: String,
}

/// Service converting carts into orders.
///
/// The whole conversion runs in a single store transaction: the order
/// row, its line snapshots, the stock decrements, and the cart clear
/// all commit together or not at all. Stock is checked for every line
/// before any line mutates it.
pub struct CheckoutService<S: Store> {
    store: S,
}

impl<S: Store> CheckoutService<S> {
    /// Creates a new checkout service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Converts the user's cart into an order.
    ///
    /// Fails with `EmptyCart` if the user has no cart or no cart lines,
    /// and with `InsufficientStock` naming every offending product if
    /// any line exceeds available stock. On success the cart is left
    /// empty and each ordered product's stock is reduced by exactly the
    /// ordered quantity.
    #[tracing::instrument(skip(self, request))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        request: CheckoutRequest,
    ) -> Result<OrderWithItems, DomainError> {
        let mut tx = self.store.begin().await?;

        // 1. Load the cart with its lines.
        let cart = match tx.cart_with_items(user_id).await? {
            Some(cart) if !cart.is_empty() => cart,
            _ => return Err(DomainError::EmptyCart),
        };

        // 2. Totals from the frozen line subtotals; checkout does not
        // reprice against current product state.
        let subtotal: Money = cart.items.iter().map(|item| item.subtotal).sum();
        let tax = subtotal.percent(TAX_RATE_PERCENT);
        let total = subtotal + tax;

        // 3. Insert the order row inside the open transaction so the
        // line snapshots can reference its id before anything commits.
        let order_id = tx
            .insert_order(NewOrder {
                user_id,
                total_amount: total,
                status: OrderStatus::Pending,
                address: request.address,
                payment_method: request.payment_method,
            })
            .await?;

        // 4. Pre-validation pass: lock and check stock for every line
        // before mutating any of it, collecting all violations.
        let requests: Vec<StockRequest> = cart
            .items
            .iter()
            .map(|item| StockRequest {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect();
        let violations = inventory::check_availability(&mut tx, &requests).await?;
        if !violations.is_empty() {
            metrics::counter!("checkout_insufficient_stock_total").increment(1);
            // Dropping the transaction rolls back the provisional order.
            return Err(DomainError::InsufficientStock {
                product_names: violations.into_iter().map(|v| v.title).collect(),
            });
        }

        // 5. Commit pass: snapshot every line verbatim, then decrement.
        for item in &cart.items {
            tx.insert_order_item(NewOrderItem {
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                subtotal: item.subtotal,
            })
            .await?;
        }
        inventory::consume(&mut tx, &requests).await?;

        // 6. Empty the cart; the cart row persists for reuse.
        tx.clear_cart(cart.cart.id).await?;

        let order = tx
            .order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", order_id))?;
        let items = tx.order_items(order_id).await?;

        // 7. One atomic unit: order, snapshots, decrements, cart clear.
        tx.commit().await?;

        metrics::counter!("checkout_completed_total").increment(1);
        tracing::info!(%order_id, total_cents = total.cents(), "checkout completed");

        Ok(OrderWithItems { order, items })
    }
}
