//! Order endpoints: checkout, listings, status, deletion.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{OrderId, Page};
use domain::CheckoutRequest;
use serde::{Deserialize, Serialize};
use store::{Order, OrderItem, OrderWithItems, Store};
use uuid::Uuid;

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiError;
use crate::routes::AppState;

// -- Request types --

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl From<PageParams> for Page {
    fn from(params: PageParams) -> Self {
        Page::new(params.page, params.limit)
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub new_status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub total_cents: i64,
    pub address: String,
    pub payment_method: String,
    pub created_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            user_id: order.user_id.to_string(),
            status: order.status.to_string(),
            total_cents: order.total_amount.cents(),
            address: order.address,
            payment_method: order.payment_method,
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub quantity: u32,
    pub subtotal_cents: i64,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            quantity: item.quantity,
            subtotal_cents: item.subtotal.cents(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderDetailResponse {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub total_cents: i64,
    pub address: String,
    pub payment_method: String,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderWithItems> for OrderDetailResponse {
    fn from(placed: OrderWithItems) -> Self {
        let items = placed.items.iter().map(OrderItemResponse::from).collect();
        let order = OrderResponse::from(placed.order);
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total_cents: order.total_cents,
            address: order.address,
            payment_method: order.payment_method,
            created_at: order.created_at,
            items,
        }
    }
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// -- Handlers --

/// POST /orders — convert the caller's cart into an order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderDetailResponse>), ApiError> {
    let placed = state.checkout.checkout(user.0.id, req).await?;
    Ok((StatusCode::CREATED, Json(placed.into())))
}

/// GET /orders — the caller's own orders, paginated.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_for_user(user.0.id, params.into()).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /orders/all — every order, paginated. Admin only.
#[tracing::instrument(skip(state))]
pub async fn list_all<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_all(params.into()).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// PUT /orders/:id/status — set an order's status. Admin only.
#[tracing::instrument(skip(state))]
pub async fn set_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Query(params): Query<StatusParams>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .set_status(OrderId::from_uuid(id), &params.new_status)
        .await?;
    Ok(Json(order.into()))
}

/// DELETE /orders/:id — delete an order the caller owns.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let order_id = OrderId::from_uuid(id);
    state.orders.delete(order_id, user.0.id).await?;
    Ok(Json(MessageResponse {
        message: format!("order {order_id} deleted"),
    }))
}
