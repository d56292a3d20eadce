//! In-memory store implementation for testing.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CartId, Money, OrderId, Page, ProductId, ReviewId, UserId, WishlistId};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::{
    Cart, CartItem, CartWithItems, NewCartItem, NewOrder, NewOrderItem, NewProduct, NewReview,
    Order, OrderItem, OrderStatus, Product, Result, Review, StoreError, Wishlist,
    store::{Store, StoreTx},
};

#[derive(Debug, Clone, Default)]
struct State {
    products: Vec<Product>,
    carts: Vec<Cart>,
    cart_items: Vec<CartItem>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    reviews: Vec<Review>,
    wishlists: Vec<Wishlist>,
}

/// In-memory store implementation.
///
/// Provides the same interface as the PostgreSQL implementation.
/// Transactions take the whole-store write lock for their duration, so
/// they are fully serializable; writes go to a staged copy that replaces
/// the shared state on commit and is discarded on drop.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all stored rows.
    pub async fn clear(&self) {
        *self.state.write().await = State::default();
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        let guard = self.state.clone().write_owned().await;
        let work = guard.clone();
        Ok(MemoryTx { guard, work })
    }
}

/// An open transaction against an [`InMemoryStore`].
pub struct MemoryTx {
    guard: OwnedRwLockWriteGuard<State>,
    work: State,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn product(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.work.products.iter().find(|p| p.id == id).cloned())
    }

    async fn product_for_update(&mut self, id: ProductId) -> Result<Option<Product>> {
        // The whole-store write lock already serializes transactions, so
        // a plain read gives FOR UPDATE semantics here.
        self.product(id).await
    }

    async fn insert_product(&mut self, new: NewProduct) -> Result<Product> {
        let product = Product {
            id: ProductId::new(),
            title: new.title,
            description: new.description,
            price: new.price,
            discount_percentage: new.discount_percentage,
            stock: new.stock,
            is_available: new.stock > 0,
            average_rating: 0.0,
            review_count: 0,
            thumbnail: new.thumbnail,
            created_at: Utc::now(),
        };
        self.work.products.push(product.clone());
        Ok(product)
    }

    async fn apply_stock_decrement(&mut self, id: ProductId, quantity: u32) -> Result<()> {
        let quantity = quantity as i32;
        match self.work.products.iter_mut().find(|p| p.id == id) {
            Some(product) if product.stock >= quantity => {
                product.stock -= quantity;
                product.is_available = product.stock > 0;
                Ok(())
            }
            _ => Err(StoreError::StockConflict { product_id: id }),
        }
    }

    async fn restock(&mut self, id: ProductId, quantity: u32) -> Result<Option<Product>> {
        Ok(self.work.products.iter_mut().find(|p| p.id == id).map(|p| {
            p.stock += quantity as i32;
            p.is_available = p.stock > 0;
            p.clone()
        }))
    }

    async fn set_product_price(
        &mut self,
        id: ProductId,
        price: Money,
        discount_percentage: f64,
    ) -> Result<Option<Product>> {
        Ok(self.work.products.iter_mut().find(|p| p.id == id).map(|p| {
            p.price = price;
            p.discount_percentage = discount_percentage;
            p.clone()
        }))
    }

    async fn set_product_rating(
        &mut self,
        id: ProductId,
        average_rating: f64,
        review_count: i32,
    ) -> Result<()> {
        if let Some(product) = self.work.products.iter_mut().find(|p| p.id == id) {
            product.average_rating = average_rating;
            product.review_count = review_count;
        }
        Ok(())
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<bool> {
        let before = self.work.products.len();
        self.work.products.retain(|p| p.id != id);
        if self.work.products.len() == before {
            return Ok(false);
        }
        // Cascades, mirroring the schema's ON DELETE rules.
        self.work.cart_items.retain(|i| i.product_id != id);
        self.work.order_items.retain(|i| i.product_id != id);
        self.work.reviews.retain(|r| r.product_id != id);
        for wishlist in &mut self.work.wishlists {
            wishlist.product_ids.retain(|p| *p != id);
        }
        Ok(true)
    }

    async fn cart_for_user(&mut self, user_id: UserId) -> Result<Option<Cart>> {
        Ok(self
            .work
            .carts
            .iter()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn cart_with_items(&mut self, user_id: UserId) -> Result<Option<CartWithItems>> {
        let Some(cart) = self.cart_for_user(user_id).await? else {
            return Ok(None);
        };
        let items = self
            .work
            .cart_items
            .iter()
            .filter(|i| i.cart_id == cart.id)
            .cloned()
            .collect();
        Ok(Some(CartWithItems { cart, items }))
    }

    async fn insert_cart(&mut self, user_id: UserId) -> Result<Cart> {
        if self.work.carts.iter().any(|c| c.user_id == user_id) {
            return Err(StoreError::UniqueViolation("carts_user_id_key".to_string()));
        }
        let cart = Cart {
            id: CartId::new(),
            user_id,
            total_amount: Money::zero(),
            created_at: Utc::now(),
        };
        self.work.carts.push(cart.clone());
        Ok(cart)
    }

    async fn replace_cart_items(
        &mut self,
        cart_id: CartId,
        items: Vec<NewCartItem>,
        total_amount: Money,
    ) -> Result<()> {
        self.work.cart_items.retain(|i| i.cart_id != cart_id);
        self.work
            .cart_items
            .extend(items.into_iter().map(|i| CartItem {
                cart_id,
                product_id: i.product_id,
                quantity: i.quantity,
                subtotal: i.subtotal,
            }));
        if let Some(cart) = self.work.carts.iter_mut().find(|c| c.id == cart_id) {
            cart.total_amount = total_amount;
        }
        Ok(())
    }

    async fn clear_cart(&mut self, cart_id: CartId) -> Result<()> {
        self.work.cart_items.retain(|i| i.cart_id != cart_id);
        if let Some(cart) = self.work.carts.iter_mut().find(|c| c.id == cart_id) {
            cart.total_amount = Money::zero();
        }
        Ok(())
    }

    async fn insert_order(&mut self, new: NewOrder) -> Result<OrderId> {
        let order = Order {
            id: OrderId::new(),
            user_id: new.user_id,
            total_amount: new.total_amount,
            status: new.status,
            address: new.address,
            payment_method: new.payment_method,
            created_at: Utc::now(),
        };
        let id = order.id;
        self.work.orders.push(order);
        Ok(id)
    }

    async fn insert_order_item(&mut self, new: NewOrderItem) -> Result<()> {
        self.work.order_items.push(OrderItem {
            order_id: new.order_id,
            product_id: new.product_id,
            quantity: new.quantity,
            subtotal: new.subtotal,
        });
        Ok(())
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.work.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn order_items(&mut self, id: OrderId) -> Result<Vec<OrderItem>> {
        Ok(self
            .work
            .order_items
            .iter()
            .filter(|i| i.order_id == id)
            .cloned()
            .collect())
    }

    async fn orders_for_user(&mut self, user_id: UserId, page: Page) -> Result<Vec<Order>> {
        Ok(self
            .work
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn all_orders(&mut self, page: Page) -> Result<Vec<Order>> {
        Ok(self
            .work
            .orders
            .iter()
            .rev()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn set_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>> {
        Ok(self.work.orders.iter_mut().find(|o| o.id == id).map(|o| {
            o.status = status;
            o.clone()
        }))
    }

    async fn delete_order(&mut self, id: OrderId, user_id: UserId) -> Result<bool> {
        let before = self.work.orders.len();
        self.work
            .orders
            .retain(|o| !(o.id == id && o.user_id == user_id));
        if self.work.orders.len() == before {
            return Ok(false);
        }
        self.work.order_items.retain(|i| i.order_id != id);
        Ok(true)
    }

    async fn review_for(
        &mut self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<Option<Review>> {
        Ok(self
            .work
            .reviews
            .iter()
            .find(|r| r.product_id == product_id && r.user_id == user_id)
            .cloned())
    }

    async fn insert_review(&mut self, new: NewReview) -> Result<Review> {
        if self
            .work
            .reviews
            .iter()
            .any(|r| r.product_id == new.product_id && r.user_id == new.user_id)
        {
            return Err(StoreError::UniqueViolation(
                "reviews_product_user_unique".to_string(),
            ));
        }
        let review = Review {
            id: ReviewId::new(),
            product_id: new.product_id,
            user_id: new.user_id,
            rating: new.rating,
            comment: new.comment,
            created_at: Utc::now(),
        };
        self.work.reviews.push(review.clone());
        Ok(review)
    }

    async fn reviews_for_product(&mut self, product_id: ProductId) -> Result<Vec<Review>> {
        Ok(self
            .work
            .reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn reviews_for_user(&mut self, user_id: UserId) -> Result<Vec<Review>> {
        Ok(self
            .work
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn all_reviews(&mut self) -> Result<Vec<Review>> {
        Ok(self.work.reviews.clone())
    }

    async fn rating_stats(&mut self, product_id: ProductId) -> Result<(i32, f64)> {
        let ratings: Vec<i32> = self
            .work
            .reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .map(|r| r.rating)
            .collect();
        if ratings.is_empty() {
            return Ok((0, 0.0));
        }
        let count = ratings.len() as i32;
        let average = f64::from(ratings.iter().sum::<i32>()) / f64::from(count);
        Ok((count, average))
    }

    async fn wishlist_for_user(&mut self, user_id: UserId) -> Result<Option<Wishlist>> {
        Ok(self
            .work
            .wishlists
            .iter()
            .find(|w| w.user_id == user_id)
            .cloned())
    }

    async fn insert_wishlist(&mut self, user_id: UserId) -> Result<Wishlist> {
        if self.work.wishlists.iter().any(|w| w.user_id == user_id) {
            return Err(StoreError::UniqueViolation(
                "wishlists_user_id_key".to_string(),
            ));
        }
        let wishlist = Wishlist {
            id: WishlistId::new(),
            user_id,
            product_ids: Vec::new(),
        };
        self.work.wishlists.push(wishlist.clone());
        Ok(wishlist)
    }

    async fn add_wishlist_product(
        &mut self,
        wishlist_id: WishlistId,
        product_id: ProductId,
    ) -> Result<()> {
        let Some(wishlist) = self.work.wishlists.iter_mut().find(|w| w.id == wishlist_id) else {
            return Ok(());
        };
        if wishlist.product_ids.contains(&product_id) {
            return Err(StoreError::UniqueViolation(
                "wishlist_items_pkey".to_string(),
            ));
        }
        wishlist.product_ids.push(product_id);
        Ok(())
    }

    async fn remove_wishlist_product(
        &mut self,
        wishlist_id: WishlistId,
        product_id: ProductId,
    ) -> Result<bool> {
        let Some(wishlist) = self.work.wishlists.iter_mut().find(|w| w.id == wishlist_id) else {
            return Ok(false);
        };
        let before = wishlist.product_ids.len();
        wishlist.product_ids.retain(|p| *p != product_id);
        Ok(wishlist.product_ids.len() != before)
    }

    async fn commit(self) -> Result<()> {
        let mut tx = self;
        *tx.guard = tx.work;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(stock: i32) -> NewProduct {
        NewProduct {
            title: "Widget".to_string(),
            description: "A widget".to_string(),
            price: Money::from_cents(1000),
            discount_percentage: 0.0,
            stock,
            thumbnail: None,
        }
    }

    #[tokio::test]
    async fn writes_are_invisible_until_commit() {
        let store = InMemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let product = tx.insert_product(widget(3)).await.unwrap();
        drop(tx); // rollback

        let mut tx = store.begin().await.unwrap();
        assert!(tx.product(product.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let store = InMemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let product = tx.insert_product(widget(3)).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let found = tx.product(product.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Widget");
        assert!(found.is_available);
    }

    #[tokio::test]
    async fn decrement_is_conditional_on_stock() {
        let store = InMemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let product = tx.insert_product(widget(2)).await.unwrap();

        tx.apply_stock_decrement(product.id, 2).await.unwrap();
        let updated = tx.product(product.id).await.unwrap().unwrap();
        assert_eq!(updated.stock, 0);
        assert!(!updated.is_available);

        let err = tx.apply_stock_decrement(product.id, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::StockConflict { .. }));
    }

    #[tokio::test]
    async fn restock_reflips_availability() {
        let store = InMemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let product = tx.insert_product(widget(1)).await.unwrap();
        tx.apply_stock_decrement(product.id, 1).await.unwrap();

        let restocked = tx.restock(product.id, 5).await.unwrap().unwrap();
        assert_eq!(restocked.stock, 5);
        assert!(restocked.is_available);
    }

    #[tokio::test]
    async fn duplicate_review_is_a_unique_violation() {
        let store = InMemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let product = tx.insert_product(widget(1)).await.unwrap();
        let user = UserId::new();

        let review = NewReview {
            product_id: product.id,
            user_id: user,
            rating: 5,
            comment: None,
        };
        tx.insert_review(review.clone()).await.unwrap();
        let err = tx.insert_review(review).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn delete_product_cascades() {
        let store = InMemoryStore::new();
        let user = UserId::new();

        let mut tx = store.begin().await.unwrap();
        let product = tx.insert_product(widget(5)).await.unwrap();
        let cart = tx.insert_cart(user).await.unwrap();
        tx.replace_cart_items(
            cart.id,
            vec![NewCartItem {
                product_id: product.id,
                quantity: 1,
                subtotal: Money::from_cents(1000),
            }],
            Money::from_cents(1000),
        )
        .await
        .unwrap();

        assert!(tx.delete_product(product.id).await.unwrap());
        let cart = tx.cart_with_items(user).await.unwrap().unwrap();
        assert!(cart.items.is_empty());
    }
}
