//! PostgreSQL-backed store implementation.

use async_trait::async_trait;
use chrono::Utc;
use common::{CartId, Money, OrderId, Page, ProductId, ReviewId, UserId, WishlistId};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Cart, CartItem, CartWithItems, NewCartItem, NewOrder, NewOrderItem, NewProduct, NewReview,
    Order, OrderItem, OrderStatus, Product, Result, Review, StoreError, Wishlist,
    store::{Store, StoreTx},
};

/// PostgreSQL store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url` with a small pool.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::debug!("migrations applied");
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx> {
        Ok(PgTx {
            tx: self.pool.begin().await?,
        })
    }
}

/// An open transaction against a [`PostgresStore`].
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

const PRODUCT_COLUMNS: &str = "id, title, description, price_cents, discount_percentage, stock, \
     is_available, average_rating, review_count, thumbnail, created_at";

fn row_to_product(row: PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        discount_percentage: row.try_get("discount_percentage")?,
        stock: row.try_get("stock")?,
        is_available: row.try_get("is_available")?,
        average_rating: row.try_get("average_rating")?,
        review_count: row.try_get("review_count")?,
        thumbnail: row.try_get("thumbnail")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_cart(row: PgRow) -> Result<Cart> {
    Ok(Cart {
        id: CartId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_cart_item(row: PgRow) -> Result<CartItem> {
    Ok(CartItem {
        cart_id: CartId::from_uuid(row.try_get::<Uuid, _>("cart_id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        quantity: row.try_get::<i32, _>("quantity")? as u32,
        subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
    })
}

fn row_to_order(row: PgRow) -> Result<Order> {
    let status: String = row.try_get("status")?;
    let status = OrderStatus::parse(&status)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown order status: {status}").into()))?;
    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
        status,
        address: row.try_get("address")?,
        payment_method: row.try_get("payment_method")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_order_item(row: PgRow) -> Result<OrderItem> {
    Ok(OrderItem {
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        quantity: row.try_get::<i32, _>("quantity")? as u32,
        subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
    })
}

fn row_to_review(row: PgRow) -> Result<Review> {
    Ok(Review {
        id: ReviewId::from_uuid(row.try_get::<Uuid, _>("id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        rating: row.try_get("rating")?,
        comment: row.try_get("comment")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Maps a database error to [`StoreError::UniqueViolation`] when it was
/// caused by the named constraint.
fn map_unique(err: sqlx::Error, constraint: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.constraint() == Some(constraint)
    {
        return StoreError::UniqueViolation(constraint.to_string());
    }
    StoreError::Database(err)
}

#[async_trait]
impl StoreTx for PgTx {
    async fn product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(row_to_product).transpose()
    }

    async fn product_for_update(&mut self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(row_to_product).transpose()
    }

    async fn insert_product(&mut self, new: NewProduct) -> Result<Product> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products
                (id, title, description, price_cents, discount_percentage, stock,
                 is_available, thumbnail, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(ProductId::new().as_uuid())
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.price.cents())
        .bind(new.discount_percentage)
        .bind(new.stock)
        .bind(new.stock > 0)
        .bind(&new.thumbnail)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await?;
        row_to_product(row)
    }

    async fn apply_stock_decrement(&mut self, id: ProductId, quantity: u32) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $2, is_available = stock - $2 > 0
            WHERE id = $1 AND stock >= $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(quantity as i32)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(product_id = %id, quantity, "stock decrement matched no row");
            return Err(StoreError::StockConflict { product_id: id });
        }
        Ok(())
    }

    async fn restock(&mut self, id: ProductId, quantity: u32) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET stock = stock + $2, is_available = stock + $2 > 0
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(quantity as i32)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(row_to_product).transpose()
    }

    async fn set_product_price(
        &mut self,
        id: ProductId,
        price: Money,
        discount_percentage: f64,
    ) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET price_cents = $2, discount_percentage = $3
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(price.cents())
        .bind(discount_percentage)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(row_to_product).transpose()
    }

    async fn set_product_rating(
        &mut self,
        id: ProductId,
        average_rating: f64,
        review_count: i32,
    ) -> Result<()> {
        sqlx::query("UPDATE products SET average_rating = $2, review_count = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(average_rating)
            .bind(review_count)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn cart_for_user(&mut self, user_id: UserId) -> Result<Option<Cart>> {
        let row = sqlx::query(
            "SELECT id, user_id, total_amount_cents, created_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(row_to_cart).transpose()
    }

    async fn cart_with_items(&mut self, user_id: UserId) -> Result<Option<CartWithItems>> {
        let Some(cart) = self.cart_for_user(user_id).await? else {
            return Ok(None);
        };
        let rows = sqlx::query(
            r#"
            SELECT cart_id, product_id, quantity, subtotal_cents
            FROM cart_items
            WHERE cart_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(cart.id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;
        let items = rows
            .into_iter()
            .map(row_to_cart_item)
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(CartWithItems { cart, items }))
    }

    async fn insert_cart(&mut self, user_id: UserId) -> Result<Cart> {
        let row = sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, total_amount_cents, created_at)
            VALUES ($1, $2, 0, $3)
            RETURNING id, user_id, total_amount_cents, created_at
            "#,
        )
        .bind(CartId::new().as_uuid())
        .bind(user_id.as_uuid())
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_unique(e, "carts_user_id_key"))?;
        row_to_cart(row)
    }

    async fn replace_cart_items(
        &mut self,
        cart_id: CartId,
        items: Vec<NewCartItem>,
        total_amount: Money,
    ) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO cart_items (id, cart_id, product_id, quantity, subtotal_cents)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(cart_id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(item.quantity as i32)
            .bind(item.subtotal.cents())
            .execute(&mut *self.tx)
            .await?;
        }

        sqlx::query("UPDATE carts SET total_amount_cents = $2 WHERE id = $1")
            .bind(cart_id.as_uuid())
            .bind(total_amount.cents())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn clear_cart(&mut self, cart_id: CartId) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        sqlx::query("UPDATE carts SET total_amount_cents = 0 WHERE id = $1")
            .bind(cart_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_order(&mut self, new: NewOrder) -> Result<OrderId> {
        let id = OrderId::new();
        sqlx::query(
            r#"
            INSERT INTO orders
                (id, user_id, total_amount_cents, status, address, payment_method, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id.as_uuid())
        .bind(new.user_id.as_uuid())
        .bind(new.total_amount.cents())
        .bind(new.status.as_str())
        .bind(&new.address)
        .bind(&new.payment_method)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn insert_order_item(&mut self, new: NewOrderItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, quantity, subtotal_cents)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.order_id.as_uuid())
        .bind(new.product_id.as_uuid())
        .bind(new.quantity as i32)
        .bind(new.subtotal.cents())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, total_amount_cents, status, address, payment_method, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(row_to_order).transpose()
    }

    async fn order_items(&mut self, id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, quantity, subtotal_cents
            FROM order_items
            WHERE order_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;
        rows.into_iter().map(row_to_order_item).collect()
    }

    async fn orders_for_user(&mut self, user_id: UserId, page: Page) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, total_amount_cents, status, address, payment_method, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(page.offset())
        .bind(i64::from(page.limit))
        .fetch_all(&mut *self.tx)
        .await?;
        rows.into_iter().map(row_to_order).collect()
    }

    async fn all_orders(&mut self, page: Page) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, total_amount_cents, status, address, payment_method, created_at
            FROM orders
            ORDER BY created_at DESC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(page.offset())
        .bind(i64::from(page.limit))
        .fetch_all(&mut *self.tx)
        .await?;
        rows.into_iter().map(row_to_order).collect()
    }

    async fn set_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2
            WHERE id = $1
            RETURNING id, user_id, total_amount_cents, status, address, payment_method, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(row_to_order).transpose()
    }

    async fn delete_order(&mut self, id: OrderId, user_id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND user_id = $2")
            .bind(id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn review_for(
        &mut self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<Option<Review>> {
        let row = sqlx::query(
            r#"
            SELECT id, product_id, user_id, rating, comment, created_at
            FROM reviews
            WHERE product_id = $1 AND user_id = $2
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(row_to_review).transpose()
    }

    async fn insert_review(&mut self, new: NewReview) -> Result<Review> {
        let row = sqlx::query(
            r#"
            INSERT INTO reviews (id, product_id, user_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, product_id, user_id, rating, comment, created_at
            "#,
        )
        .bind(ReviewId::new().as_uuid())
        .bind(new.product_id.as_uuid())
        .bind(new.user_id.as_uuid())
        .bind(new.rating)
        .bind(&new.comment)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_unique(e, "reviews_product_user_unique"))?;
        row_to_review(row)
    }

    async fn reviews_for_product(&mut self, product_id: ProductId) -> Result<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, user_id, rating, comment, created_at
            FROM reviews
            WHERE product_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;
        rows.into_iter().map(row_to_review).collect()
    }

    async fn reviews_for_user(&mut self, user_id: UserId) -> Result<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, user_id, rating, comment, created_at
            FROM reviews
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;
        rows.into_iter().map(row_to_review).collect()
    }

    async fn all_reviews(&mut self) -> Result<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, user_id, rating, comment, created_at
            FROM reviews
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await?;
        rows.into_iter().map(row_to_review).collect()
    }

    async fn rating_stats(&mut self, product_id: ProductId) -> Result<(i32, f64)> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS review_count,
                   COALESCE(AVG(rating), 0)::DOUBLE PRECISION AS average_rating
            FROM reviews
            WHERE product_id = $1
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await?;
        let count: i64 = row.try_get("review_count")?;
        let average: f64 = row.try_get("average_rating")?;
        Ok((count as i32, average))
    }

    async fn wishlist_for_user(&mut self, user_id: UserId) -> Result<Option<Wishlist>> {
        let Some(row) = sqlx::query("SELECT id, user_id FROM wishlists WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?
        else {
            return Ok(None);
        };
        let id = WishlistId::from_uuid(row.try_get::<Uuid, _>("id")?);

        let product_rows =
            sqlx::query("SELECT product_id FROM wishlist_items WHERE wishlist_id = $1")
                .bind(id.as_uuid())
                .fetch_all(&mut *self.tx)
                .await?;
        let product_ids = product_rows
            .into_iter()
            .map(|row| {
                Ok(ProductId::from_uuid(
                    row.try_get::<Uuid, _>("product_id")?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Wishlist {
            id,
            user_id,
            product_ids,
        }))
    }

    async fn insert_wishlist(&mut self, user_id: UserId) -> Result<Wishlist> {
        let id = WishlistId::new();
        sqlx::query("INSERT INTO wishlists (id, user_id, created_at) VALUES ($1, $2, $3)")
            .bind(id.as_uuid())
            .bind(user_id.as_uuid())
            .bind(Utc::now())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_unique(e, "wishlists_user_id_key"))?;
        Ok(Wishlist {
            id,
            user_id,
            product_ids: Vec::new(),
        })
    }

    async fn add_wishlist_product(
        &mut self,
        wishlist_id: WishlistId,
        product_id: ProductId,
    ) -> Result<()> {
        sqlx::query("INSERT INTO wishlist_items (wishlist_id, product_id) VALUES ($1, $2)")
            .bind(wishlist_id.as_uuid())
            .bind(product_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_unique(e, "wishlist_items_pkey"))?;
        Ok(())
    }

    async fn remove_wishlist_product(
        &mut self,
        wishlist_id: WishlistId,
        product_id: ProductId,
    ) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM wishlist_items WHERE wishlist_id = $1 AND product_id = $2",
        )
        .bind(wishlist_id.as_uuid())
        .bind(product_id.as_uuid())
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
