//! HTTP route handlers and shared application state.

pub mod carts;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod reviews;
pub mod wishlist;

use std::sync::Arc;

use domain::{CartService, CheckoutService, OrderService, ReviewService, WishlistService};
use store::Store;

use crate::auth::Authenticator;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub carts: CartService<S>,
    pub checkout: CheckoutService<S>,
    pub orders: OrderService<S>,
    pub reviews: ReviewService<S>,
    pub wishlists: WishlistService<S>,
    pub authenticator: Arc<dyn Authenticator>,
}
