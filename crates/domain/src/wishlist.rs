//! Wishlist aggregate: a user's saved-product set.

use common::{ProductId, UserId};
use store::{Store, StoreError, StoreTx, Wishlist};

use crate::DomainError;

/// Service for managing wishlists.
pub struct WishlistService<S: Store> {
    store: S,
}

impl<S: Store> WishlistService<S> {
    /// Creates a new wishlist service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn get_or_create<T: StoreTx>(
        tx: &mut T,
        user_id: UserId,
    ) -> Result<Wishlist, DomainError> {
        match tx.wishlist_for_user(user_id).await? {
            Some(wishlist) => Ok(wishlist),
            None => Ok(tx.insert_wishlist(user_id).await?),
        }
    }

    /// Returns the user's wishlist, creating an empty one on first
    /// access.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user_id: UserId) -> Result<Wishlist, DomainError> {
        let mut tx = self.store.begin().await?;
        let wishlist = Self::get_or_create(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(wishlist)
    }

    /// Adds a product to the user's wishlist.
    ///
    /// Fails with `NotFound` if the product does not exist and with
    /// `Duplicate` if it is already saved.
    #[tracing::instrument(skip(self))]
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Wishlist, DomainError> {
        let mut tx = self.store.begin().await?;
        let wishlist = Self::get_or_create(&mut tx, user_id).await?;

        if tx.product(product_id).await?.is_none() {
            return Err(DomainError::not_found("Product", product_id));
        }

        tx.add_wishlist_product(wishlist.id, product_id)
            .await
            .map_err(|err| match err {
                StoreError::UniqueViolation(_) => {
                    DomainError::Duplicate("product already in wishlist".to_string())
                }
                other => DomainError::Store(other),
            })?;

        let wishlist = Self::get_or_create(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(wishlist)
    }

    /// Removes a product from the user's wishlist.
    ///
    /// Fails with `NotFound` if the user has no wishlist or the product
    /// is not saved in it.
    #[tracing::instrument(skip(self))]
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Wishlist, DomainError> {
        let mut tx = self.store.begin().await?;
        let wishlist = tx
            .wishlist_for_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Wishlist for user", user_id))?;

        if !tx.remove_wishlist_product(wishlist.id, product_id).await? {
            return Err(DomainError::not_found("Product in wishlist", product_id));
        }

        let wishlist = tx
            .wishlist_for_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Wishlist for user", user_id))?;
        tx.commit().await?;
        Ok(wishlist)
    }
}
