//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::ItemRequest;
use serde::{Deserialize, Serialize};
use store::{CartItem, CartWithItems, Store};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct PutCartRequest {
    pub items: Vec<ItemRequest>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartItemResponse {
    pub product_id: String,
    pub quantity: u32,
    pub subtotal_cents: i64,
}

impl From<&CartItem> for CartItemResponse {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            quantity: item.quantity,
            subtotal_cents: item.subtotal.cents(),
        }
    }
}

#[derive(Serialize)]
pub struct CartResponse {
    pub id: String,
    pub user_id: String,
    pub total_cents: i64,
    pub items: Vec<CartItemResponse>,
}

impl From<CartWithItems> for CartResponse {
    fn from(cart: CartWithItems) -> Self {
        Self {
            id: cart.cart.id.to_string(),
            user_id: cart.cart.user_id.to_string(),
            total_cents: cart.cart.total_amount.cents(),
            items: cart.items.iter().map(CartItemResponse::from).collect(),
        }
    }
}

// -- Handlers --

/// GET /cart — the caller's cart, created lazily on first access.
#[tracing::instrument(skip(state))]
pub async fn get_cart<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.get(user.0.id).await?;
    Ok(Json(cart.into()))
}

/// PUT /cart — replace the caller's cart lines wholesale.
#[tracing::instrument(skip(state, req))]
pub async fn put_cart<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Json(req): Json<PutCartRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.put_items(user.0.id, req.items).await?;
    Ok(Json(cart.into()))
}

/// DELETE /cart — remove all lines from the caller's cart.
#[tracing::instrument(skip(state))]
pub async fn clear_cart<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.clear(user.0.id).await?;
    Ok(Json(cart.into()))
}
