//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::{Money, Page, UserId};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    NewCartItem, NewOrder, NewOrderItem, NewProduct, NewReview, OrderStatus, PostgresStore, Store,
    StoreError, StoreTx,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_storefront_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query(
        "TRUNCATE TABLE wishlist_items, wishlists, reviews, order_items, orders, cart_items, \
         carts, products",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresStore::new(pool)
}

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
#[serial]
async fn uncommitted_transaction_rolls_back() {
    let store = get_test_store().await;

    let product_id = {
        let mut tx = store.begin().await.unwrap();
        let product = tx.insert_product(widget(3)).await.unwrap();
        product.id
        // tx dropped without commit
    };

    let mut tx = store.begin().await.unwrap();
    assert!(tx.product(product_id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn conditional_decrement_never_goes_negative() {
    let store = get_test_store().await;

    let mut tx = store.begin().await.unwrap();
    let product = tx.insert_product(widget(2)).await.unwrap();
    tx.apply_stock_decrement(product.id, 2).await.unwrap();

    let err = tx.apply_stock_decrement(product.id, 1).await.unwrap_err();
    assert!(matches!(err, StoreError::StockConflict { .. }));
    drop(tx);

    // Nothing from the failed transaction is visible.
    let mut tx = store.begin().await.unwrap();
    assert!(tx.product(product.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn decrement_to_zero_flips_availability() {
    let store = get_test_store().await;

    let mut tx = store.begin().await.unwrap();
    let product = tx.insert_product(widget(2)).await.unwrap();
    tx.apply_stock_decrement(product.id, 2).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let updated = tx.product(product.id).await.unwrap().unwrap();
    assert_eq!(updated.stock, 0);
    assert!(!updated.is_available);

    let restocked = tx.restock(product.id, 3).await.unwrap().unwrap();
    assert_eq!(restocked.stock, 3);
    assert!(restocked.is_available);
}

#[tokio::test]
#[serial]
async fn order_with_items_commits_atomically() {
    let store = get_test_store().await;
    let user = UserId::new();

    let mut tx = store.begin().await.unwrap();
    let product = tx.insert_product(widget(5)).await.unwrap();
    let order_id = tx
        .insert_order(NewOrder {
            user_id: user,
            total_amount: Money::from_cents(2200),
            status: OrderStatus::Pending,
            address: "1 Main St".to_string(),
            payment_method: "card".to_string(),
        })
        .await
        .unwrap();
    tx.insert_order_item(NewOrderItem {
        order_id,
        product_id: product.id,
        quantity: 2,
        subtotal: Money::from_cents(2000),
    })
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let order = tx.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.user_id, user);
    assert_eq!(order.status, OrderStatus::Pending);
    let items = tx.order_items(order_id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);

    let listed = tx.orders_for_user(user, Page::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
#[serial]
async fn duplicate_review_hits_unique_constraint() {
    let store = get_test_store().await;
    let user = UserId::new();

    let mut tx = store.begin().await.unwrap();
    let product = tx.insert_product(widget(1)).await.unwrap();
    let review = NewReview {
        product_id: product.id,
        user_id: user,
        rating: 4,
        comment: Some("solid".to_string()),
    };
    tx.insert_review(review.clone()).await.unwrap();
    let err = tx.insert_review(review).await.unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation(_)));
}

#[tokio::test]
#[serial]
async fn rating_stats_aggregate_review_rows() {
    let store = get_test_store().await;

    let mut tx = store.begin().await.unwrap();
    let product = tx.insert_product(widget(1)).await.unwrap();
    for rating in [2, 4, 5] {
        tx.insert_review(NewReview {
            product_id: product.id,
            user_id: UserId::new(),
            rating,
            comment: None,
        })
        .await
        .unwrap();
    }

    let (count, average) = tx.rating_stats(product.id).await.unwrap();
    assert_eq!(count, 3);
    assert!((average - 11.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
#[serial]
async fn deleting_a_product_cascades_to_dependents() {
    let store = get_test_store().await;
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
    let wishlist = tx.insert_wishlist(user).await.unwrap();
    tx.add_wishlist_product(wishlist.id, product.id)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    assert!(tx.delete_product(product.id).await.unwrap());
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let cart = tx.cart_with_items(user).await.unwrap().unwrap();
    assert!(cart.items.is_empty());
    let wishlist = tx.wishlist_for_user(user).await.unwrap().unwrap();
    assert!(wishlist.product_ids.is_empty());
}

#[tokio::test]
#[serial]
async fn order_pagination_is_newest_first() {
    let store = get_test_store().await;
    let user = UserId::new();

    let mut tx = store.begin().await.unwrap();
    for i in 0..3 {
        tx.insert_order(NewOrder {
            user_id: user,
            total_amount: Money::from_cents(100 * (i + 1)),
            status: OrderStatus::Pending,
            address: format!("{} Main St", i),
            payment_method: "card".to_string(),
        })
        .await
        .unwrap();
        // Distinct timestamps for a stable sort
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let first_page = tx.orders_for_user(user, Page::new(1, 2)).await.unwrap();
    assert_eq!(first_page.len(), 2);
    assert_eq!(first_page[0].address, "2 Main St");

    let second_page = tx.orders_for_user(user, Page::new(2, 2)).await.unwrap();
    assert_eq!(second_page.len(), 1);
    assert_eq!(second_page[0].address, "0 Main St");
}
