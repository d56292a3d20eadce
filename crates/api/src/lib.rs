//! HTTP API server for the storefront backend.
//!
//! Provides REST endpoints for carts, checkout, orders, reviews, and
//! wishlists, with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use domain::{
    CartPolicy, CartService, CheckoutService, OrderService, ReviewService, WishlistService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use auth::{AdminUser, AuthUser, Authenticator, TokenTable};
pub use config::Config;
pub use error::ApiError;
pub use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/cart",
            get(routes::carts::get_cart::<S>)
                .put(routes::carts::put_cart::<S>)
                .delete(routes::carts::clear_cart::<S>),
        )
        .route(
            "/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route("/orders/all", get(routes::orders::list_all::<S>))
        .route("/orders/{id}/status", put(routes::orders::set_status::<S>))
        .route("/orders/{id}", axum::routing::delete(routes::orders::delete::<S>))
        .route(
            "/reviews",
            post(routes::reviews::create::<S>).get(routes::reviews::list_all::<S>),
        )
        .route("/reviews/product/{id}", get(routes::reviews::for_product::<S>))
        .route("/reviews/user/{id}", get(routes::reviews::by_user::<S>))
        .route(
            "/wishlist",
            get(routes::wishlist::get_wishlist::<S>).post(routes::wishlist::add::<S>),
        )
        .route(
            "/wishlist/{product_id}",
            axum::routing::delete(routes::wishlist::remove::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a store, cart policy, and
/// authentication collaborator.
pub fn create_state<S: Store>(
    store: S,
    policy: CartPolicy,
    authenticator: Arc<dyn Authenticator>,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        carts: CartService::new(store.clone(), policy),
        checkout: CheckoutService::new(store.clone()),
        orders: OrderService::new(store.clone()),
        reviews: ReviewService::new(store.clone()),
        wishlists: WishlistService::new(store),
        authenticator,
    })
}
