//! Transactional relational store for the storefront backend.
//!
//! This crate provides:
//! - Entity records for the storefront schema (products, carts, orders,
//!   reviews, wishlists)
//! - The [`Store`] / [`StoreTx`] traits: explicit, dependency-injected
//!   transaction handles passed into each aggregate operation
//! - [`InMemoryStore`], a serializable in-memory implementation for tests
//! - [`PostgresStore`], the sqlx-backed production implementation

pub mod entity;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use entity::{
    Cart, CartItem, CartWithItems, NewCartItem, NewOrder, NewOrderItem, NewProduct, NewReview,
    Order, OrderItem, OrderStatus, OrderWithItems, Product, Review, Wishlist,
};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{Store, StoreTx};
