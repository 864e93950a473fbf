//! Driving ports for writing and reading reviews.
use async_trait::async_trait;

use crate::domain::{Actor, Error, ItemId, Review, ReviewId};

/// Raw review fields as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewFields {
    /// Headline; must not be blank.
    pub title: String,
    /// Body; must not be blank.
    pub content: String,
    /// Star rating between 1 and 5.
    pub rating: i64,
}

/// Request to review an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReviewRequest {
    /// Item under review.
    pub item_id: ItemId,
    /// Submitted fields.
    pub fields: ReviewFields,
}

/// Domain use-case port for review mutations.
#[async_trait]
pub trait ReviewCommand: Send + Sync {
    /// Create the actor's review of an item. One review per user per item.
    async fn create_review(
        &self,
        request: CreateReviewRequest,
        actor: &Actor,
    ) -> Result<Review, Error>;

    /// Edit a review. Only its author may do so.
    async fn update_review(
        &self,
        review_id: ReviewId,
        actor: &Actor,
        fields: ReviewFields,
    ) -> Result<Review, Error>;

    /// Delete a review. Its author or an administrator may do so.
    async fn delete_review(&self, review_id: ReviewId, actor: &Actor) -> Result<(), Error>;
}

/// Domain use-case port for reading reviews.
#[async_trait]
pub trait ReviewQuery: Send + Sync {
    /// Reviews of an item, newest first.
    async fn reviews_for_item(&self, item_id: ItemId) -> Result<Vec<Review>, Error>;
}
