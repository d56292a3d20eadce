//! Shared vocabulary for the storefront backend: typed identifiers,
//! money amounts, principals, and pagination parameters.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{
    CartId, OrderId, Page, Principal, ProductId, ReviewId, Role, UserId, WishlistId,
};
