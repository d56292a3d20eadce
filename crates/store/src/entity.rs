//! Entity records for the storefront schema.
//!
//! Records are fully-materialized rows; nothing is lazily loaded. Insert
//! payloads are separate `New*` types so callers cannot forge derived
//! fields like `is_available` or `average_rating`.

use chrono::{DateTime, Utc};
use common::{CartId, Money, OrderId, ProductId, ReviewId, UserId, WishlistId};
use serde::{Deserialize, Serialize};

/// A catalog product with its denormalized stock and rating fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    /// Unit price before discount.
    pub price: Money,
    /// Flat percentage discount in `[0, 100]`.
    pub discount_percentage: f64,
    pub stock: i32,
    /// Derived: true while `stock > 0`. Maintained by the store's
    /// decrement/restock updates, never set directly by callers.
    pub is_available: bool,
    /// Derived: arithmetic mean of review ratings.
    pub average_rating: f64,
    /// Derived: number of reviews.
    pub review_count: i32,
    /// Retrievable URL produced by the blob-storage collaborator.
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price with the product's discount applied.
    pub fn discounted_price(&self) -> Money {
        self.price.with_discount(self.discount_percentage)
    }
}

/// Payload for inserting a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: Money,
    pub discount_percentage: f64,
    pub stock: i32,
    pub thumbnail: Option<String>,
}

/// A user's cart. One active cart per user, created lazily.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    /// Derived: sum of the item subtotals. Zero for an empty cart.
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
}

/// A line in a cart. The subtotal is frozen at the time the line was
/// added and is not recomputed against the current product price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub subtotal: Money,
}

/// Payload for a cart line insert.
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub subtotal: Money,
}

/// A cart together with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartWithItems {
    pub cart: Cart,
    pub items: Vec<CartItem>,
}

impl CartWithItems {
    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Status of an order.
///
/// Any status may be set by an administrator; there is no enforced
/// transition graph. Unknown strings are rejected at the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Parses a status name, returning `None` for unknown strings.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A placed order. Items are a frozen snapshot of the cart at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Fixed at creation: sum of item subtotals plus tax.
    pub total_amount: Money,
    pub status: OrderStatus,
    pub address: String,
    /// Opaque string; payment processing is out of scope.
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for the order row insert performed by checkout.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub address: String,
    pub payment_method: String,
}

/// A line in an order: a point-in-time copy of a cart line.
///
/// `product_id` is a weak reference; later catalog changes do not alter
/// the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub subtotal: Money,
}

/// Payload for an order line insert.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub subtotal: Money,
}

/// An order together with its snapshot lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// A product review. At most one review per (product, user) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// Star rating in `[1, 5]`.
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for a review insert.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: i32,
    pub comment: Option<String>,
}

/// A user's saved-product set. One per user, created lazily.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wishlist {
    pub id: WishlistId,
    pub user_id: UserId,
    pub product_ids: Vec<ProductId>,
}

impl Wishlist {
    /// Returns true if the wishlist contains the product.
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.product_ids.contains(&product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_parse_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn order_status_rejects_unknown() {
        assert_eq!(OrderStatus::parse("refunded"), None);
        assert_eq!(OrderStatus::parse("Pending"), None);
        assert_eq!(OrderStatus::parse(""), None);
    }

    #[test]
    fn order_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Shipped).unwrap(),
            "\"shipped\""
        );
    }

    #[test]
    fn discounted_price_uses_percentage() {
        let product = Product {
            id: ProductId::new(),
            title: "Widget".to_string(),
            description: String::new(),
            price: Money::from_cents(1000),
            discount_percentage: 20.0,
            stock: 5,
            is_available: true,
            average_rating: 0.0,
            review_count: 0,
            thumbnail: None,
            created_at: Utc::now(),
        };
        assert_eq!(product.discounted_price().cents(), 800);
    }
}
