//! Order aggregate: post-checkout order management.

use common::{OrderId, Page, UserId};
use store::{Order, OrderStatus, OrderWithItems, Store, StoreTx};

use crate::DomainError;

/// Service for managing placed orders.
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn check_page(page: Page) -> Result<(), DomainError> {
        if !page.is_valid() {
            return Err(DomainError::Validation(format!(
                "page must be >= 1 and limit within 1..={}",
                Page::MAX_LIMIT
            )));
        }
        Ok(())
    }

    /// Lists a user's own orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        page: Page,
    ) -> Result<Vec<Order>, DomainError> {
        Self::check_page(page)?;
        let mut tx = self.store.begin().await?;
        Ok(tx.orders_for_user(user_id, page).await?)
    }

    /// Lists all orders, newest first. Callers gate this to admins.
    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self, page: Page) -> Result<Vec<Order>, DomainError> {
        Self::check_page(page)?;
        let mut tx = self.store.begin().await?;
        Ok(tx.all_orders(page).await?)
    }

    /// Fetches an order with its snapshot lines.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, order_id: OrderId) -> Result<OrderWithItems, DomainError> {
        let mut tx = self.store.begin().await?;
        let order = tx
            .order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", order_id))?;
        let items = tx.order_items(order_id).await?;
        Ok(OrderWithItems { order, items })
    }

    /// Sets an order's status from its string name.
    ///
    /// Unknown names are rejected. Any known status may be set from any
    /// other; administrators are not constrained by a transition graph.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(
        &self,
        order_id: OrderId,
        new_status: &str,
    ) -> Result<Order, DomainError> {
        let status = OrderStatus::parse(new_status).ok_or_else(|| {
            DomainError::Validation(format!("unknown order status: {new_status}"))
        })?;

        let mut tx = self.store.begin().await?;
        let order = tx
            .set_order_status(order_id, status)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", order_id))?;
        tx.commit().await?;
        tracing::info!(%order_id, status = %status, "order status updated");
        Ok(order)
    }

    /// Deletes an order owned by the requesting user.
    ///
    /// An ownership check, not an admin bypass: the order must belong
    /// to `user_id` or the delete reports not-found.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, order_id: OrderId, user_id: UserId) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_order(order_id, user_id).await? {
            return Err(DomainError::not_found("Order", order_id));
        }
        tx.commit().await?;
        Ok(())
    }
}
