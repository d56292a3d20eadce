//! Review aggregate: per-product user reviews with derived rating stats.

use common::{Principal, ProductId, UserId};
use store::{NewReview, Review, Store, StoreError, StoreTx};

use crate::DomainError;

/// Service for managing product reviews.
///
/// Creating a review recomputes the product's `review_count` and
/// `average_rating` in full from the review rows, in the same
/// transaction as the insert. Recomputation over incremental updates
/// is the documented contract.
pub struct ReviewService<S: Store> {
    store: S,
}

impl<S: Store> ReviewService<S> {
    /// Creates a new review service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a review for a product.
    ///
    /// Fails with `NotFound` if the product does not exist and with
    /// `Duplicate` if the user has already reviewed it.
    #[tracing::instrument(skip(self, comment))]
    pub async fn create(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: i32,
        comment: Option<String>,
    ) -> Result<Review, DomainError> {
        if !(1..=5).contains(&rating) {
            return Err(DomainError::Validation(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }

        let mut tx = self.store.begin().await?;
        let product = tx
            .product(product_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", product_id))?;

        if tx.review_for(product_id, user_id).await?.is_some() {
            return Err(DomainError::Duplicate(
                "user has already reviewed this product".to_string(),
            ));
        }

        let review = tx
            .insert_review(NewReview {
                product_id,
                user_id,
                rating,
                comment,
            })
            .await
            .map_err(|err| match err {
                // Concurrent insert of the same (product, user) pair.
                StoreError::UniqueViolation(_) => DomainError::Duplicate(
                    "user has already reviewed this product".to_string(),
                ),
                other => DomainError::Store(other),
            })?;

        let (review_count, average_rating) = tx.rating_stats(product_id).await?;
        tx.set_product_rating(product.id, average_rating, review_count)
            .await?;
        tx.commit().await?;

        tracing::info!(%product_id, review_count, "review created");
        Ok(review)
    }

    /// Lists a product's reviews. Public.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, DomainError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.reviews_for_product(product_id).await?)
    }

    /// Lists a user's reviews. Only the user themselves or an admin may
    /// call this.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        principal: Principal,
        user_id: UserId,
    ) -> Result<Vec<Review>, DomainError> {
        if principal.id != user_id && !principal.is_admin() {
            return Err(DomainError::Forbidden(
                "not authorized to view these reviews".to_string(),
            ));
        }
        let mut tx = self.store.begin().await?;
        Ok(tx.reviews_for_user(user_id).await?)
    }

    /// Lists every review. Admin only.
    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self, principal: Principal) -> Result<Vec<Review>, DomainError> {
        if !principal.is_admin() {
            return Err(DomainError::Forbidden(
                "only admins can view all reviews".to_string(),
            ));
        }
        let mut tx = self.store.begin().await?;
        Ok(tx.all_reviews().await?)
    }
}
