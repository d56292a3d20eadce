//! Wishlist endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ProductId;
use serde::{Deserialize, Serialize};
use store::{Store, Wishlist};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct AddWishlistRequest {
    pub product_id: Uuid,
}

// -- Response types --

#[derive(Serialize)]
pub struct WishlistResponse {
    pub id: String,
    pub user_id: String,
    pub product_ids: Vec<String>,
}

impl From<Wishlist> for WishlistResponse {
    fn from(wishlist: Wishlist) -> Self {
        Self {
            id: wishlist.id.to_string(),
            user_id: wishlist.user_id.to_string(),
            product_ids: wishlist
                .product_ids
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

// -- Handlers --

/// GET /wishlist — the caller's wishlist, created lazily.
#[tracing::instrument(skip(state))]
pub async fn get_wishlist<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
) -> Result<Json<WishlistResponse>, ApiError> {
    let wishlist = state.wishlists.get(user.0.id).await?;
    Ok(Json(wishlist.into()))
}

/// POST /wishlist — save a product to the caller's wishlist.
#[tracing::instrument(skip(state, req))]
pub async fn add<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Json(req): Json<AddWishlistRequest>,
) -> Result<(StatusCode, Json<WishlistResponse>), ApiError> {
    let wishlist = state
        .wishlists
        .add(user.0.id, ProductId::from_uuid(req.product_id))
        .await?;
    Ok((StatusCode::CREATED, Json(wishlist.into())))
}

/// DELETE /wishlist/:product_id — remove a saved product.
#[tracing::instrument(skip(state))]
pub async fn remove<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<WishlistResponse>, ApiError> {
    let wishlist = state
        .wishlists
        .remove(user.0.id, ProductId::from_uuid(product_id))
        .await?;
    Ok(Json(wishlist.into()))
}
