//! Core traits for transactional store implementations.

use async_trait::async_trait;
use common::{CartId, Money, OrderId, Page, ProductId, UserId, WishlistId};

use crate::{
    Cart, CartWithItems, NewCartItem, NewOrder, NewOrderItem, NewProduct, NewReview, Order,
    OrderItem, OrderStatus, Product, Result, Review, Wishlist,
};

/// A handle to a relational store that can open transactions.
///
/// All aggregate operations receive a [`StoreTx`] explicitly; there is no
/// process-wide singleton and no hidden session state.
#[async_trait]
pub trait Store: Send + Sync + Clone + 'static {
    /// Transaction type produced by this store.
    type Tx: StoreTx;

    /// Opens a new transaction.
    async fn begin(&self) -> Result<Self::Tx>;
}

/// An open transaction against the storefront schema.
///
/// Writes become visible to other transactions only after [`commit`];
/// dropping the transaction without committing rolls everything back.
/// Reads return fully-materialized rows; there is no lazy loading.
///
/// [`commit`]: StoreTx::commit
#[async_trait]
pub trait StoreTx: Send {
    // -- Products --

    /// Fetches a product by id.
    async fn product(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Fetches a product by id, locking its row for the remainder of the
    /// transaction (`SELECT ... FOR UPDATE` semantics). Used by checkout's
    /// pre-validation pass to serialize concurrent stock checks.
    async fn product_for_update(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Inserts a product and returns the stored row.
    async fn insert_product(&mut self, new: NewProduct) -> Result<Product>;

    /// Decrements a product's stock by `quantity`, flipping
    /// `is_available` to false when the remaining stock reaches zero.
    ///
    /// The update is conditional on `stock >= quantity`; if no row
    /// matches, the decrement fails with [`StoreError::StockConflict`]
    /// and negative stock is never persisted.
    ///
    /// [`StoreError::StockConflict`]: crate::StoreError::StockConflict
    async fn apply_stock_decrement(&mut self, id: ProductId, quantity: u32) -> Result<()>;

    /// Raises a product's stock by `quantity`, re-flipping
    /// `is_available` to true when stock rises above zero.
    async fn restock(&mut self, id: ProductId, quantity: u32) -> Result<Option<Product>>;

    /// Updates a product's price and discount. Returns the updated row,
    /// or `None` if no such product exists. Frozen cart/order subtotals
    /// are unaffected.
    async fn set_product_price(
        &mut self,
        id: ProductId,
        price: Money,
        discount_percentage: f64,
    ) -> Result<Option<Product>>;

    /// Persists recomputed review statistics on a product.
    async fn set_product_rating(
        &mut self,
        id: ProductId,
        average_rating: f64,
        review_count: i32,
    ) -> Result<()>;

    /// Deletes a product. Cascades to its cart lines, order lines,
    /// reviews, and wishlist entries. Returns false if no row matched.
    async fn delete_product(&mut self, id: ProductId) -> Result<bool>;

    // -- Carts --

    /// Fetches a user's cart without its lines.
    async fn cart_for_user(&mut self, user_id: UserId) -> Result<Option<Cart>>;

    /// Fetches a user's cart together with all of its lines.
    async fn cart_with_items(&mut self, user_id: UserId) -> Result<Option<CartWithItems>>;

    /// Inserts an empty cart for a user.
    async fn insert_cart(&mut self, user_id: UserId) -> Result<Cart>;

    /// Replaces a cart's entire line collection and stored total.
    async fn replace_cart_items(
        &mut self,
        cart_id: CartId,
        items: Vec<NewCartItem>,
        total_amount: Money,
    ) -> Result<()>;

    /// Deletes all lines of a cart and zeroes its stored total. The cart
    /// row itself persists for reuse.
    async fn clear_cart(&mut self, cart_id: CartId) -> Result<()>;

    // -- Orders --

    /// Inserts an order row and returns its id. The id is usable for
    /// line inserts within the same open transaction.
    async fn insert_order(&mut self, new: NewOrder) -> Result<OrderId>;

    /// Inserts an order line.
    async fn insert_order_item(&mut self, new: NewOrderItem) -> Result<()>;

    /// Fetches an order by id.
    async fn order(&mut self, id: OrderId) -> Result<Option<Order>>;

    /// Fetches the snapshot lines of an order.
    async fn order_items(&mut self, id: OrderId) -> Result<Vec<OrderItem>>;

    /// Lists a user's orders, newest first.
    async fn orders_for_user(&mut self, user_id: UserId, page: Page) -> Result<Vec<Order>>;

    /// Lists all orders, newest first.
    async fn all_orders(&mut self, page: Page) -> Result<Vec<Order>>;

    /// Sets an order's status, returning the updated row. Returns `None`
    /// if no such order exists.
    async fn set_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>>;

    /// Deletes an order owned by `user_id`. Returns false if no row
    /// matched the (id, owner) pair.
    async fn delete_order(&mut self, id: OrderId, user_id: UserId) -> Result<bool>;

    // -- Reviews --

    /// Fetches the review a user left on a product, if any.
    async fn review_for(
        &mut self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<Option<Review>>;

    /// Inserts a review. Fails with a unique violation if the (product,
    /// user) pair already has one.
    async fn insert_review(&mut self, new: NewReview) -> Result<Review>;

    /// Lists a product's reviews, oldest first.
    async fn reviews_for_product(&mut self, product_id: ProductId) -> Result<Vec<Review>>;

    /// Lists a user's reviews, oldest first.
    async fn reviews_for_user(&mut self, user_id: UserId) -> Result<Vec<Review>>;

    /// Lists every review, oldest first.
    async fn all_reviews(&mut self) -> Result<Vec<Review>>;

    /// Returns `(review_count, average_rating)` over all reviews of a
    /// product, computed from the review rows.
    async fn rating_stats(&mut self, product_id: ProductId) -> Result<(i32, f64)>;

    // -- Wishlists --

    /// Fetches a user's wishlist with its product ids.
    async fn wishlist_for_user(&mut self, user_id: UserId) -> Result<Option<Wishlist>>;

    /// Inserts an empty wishlist for a user.
    async fn insert_wishlist(&mut self, user_id: UserId) -> Result<Wishlist>;

    /// Adds a product to a wishlist. Fails with a unique violation if
    /// the product is already present.
    async fn add_wishlist_product(
        &mut self,
        wishlist_id: WishlistId,
        product_id: ProductId,
    ) -> Result<()>;

    /// Removes a product from a wishlist. Returns false if the product
    /// was not present.
    async fn remove_wishlist_product(
        &mut self,
        wishlist_id: WishlistId,
        product_id: ProductId,
    ) -> Result<bool>;

    // -- Transaction control --

    /// Commits the transaction, making all writes durable atomically.
    async fn commit(self) -> Result<()>
    where
        Self: Sized;
}
