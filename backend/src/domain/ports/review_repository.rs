//! Port abstraction for review persistence.
use async_trait::async_trait;

use crate::domain::{ItemId, NewReview, Review, ReviewId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by review repository adapters.
    pub enum ReviewRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "review repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "review repository query failed: {message}",
        /// The user already reviewed the item.
        Duplicate => "review already exists for this item and user",
    }
}

/// Port for storing and retrieving reviews.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Fetch a review by identifier.
    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>, ReviewRepositoryError>;

    /// Whether `user_id` has already reviewed `item_id`.
    async fn exists_for(
        &self,
        item_id: ItemId,
        user_id: &UserId,
    ) -> Result<bool, ReviewRepositoryError>;

    /// Insert a review.
    ///
    /// Returns [`ReviewRepositoryError::Duplicate`] when the store's unique
    /// index rejects a second review of the same item by the same user.
    async fn insert_review(&self, review: &NewReview) -> Result<Review, ReviewRepositoryError>;

    /// Persist edited fields, returning whether the review still exists.
    async fn update_review(&self, review: &Review) -> Result<bool, ReviewRepositoryError>;

    /// Delete a review and its comments, returning whether a row was removed.
    async fn delete_review(&self, id: ReviewId) -> Result<bool, ReviewRepositoryError>;

    /// Reviews of an item, newest first.
    async fn reviews_for_item(&self, item_id: ItemId)
    -> Result<Vec<Review>, ReviewRepositoryError>;
}
