//! Driving port for comments on reviews.
use async_trait::async_trait;

use crate::domain::{Actor, Comment, CommentId, Error, ReviewId};

/// Domain use-case port for comment mutations and listing.
#[async_trait]
pub trait CommentCommand: Send + Sync {
    /// Comment on a review.
    async fn create_comment(
        &self,
        review_id: ReviewId,
        actor: &Actor,
        content: String,
    ) -> Result<Comment, Error>;

    /// Edit a comment. Only its author may do so.
    async fn update_comment(
        &self,
        comment_id: CommentId,
        actor: &Actor,
        content: String,
    ) -> Result<Comment, Error>;

    /// Delete a comment. Its author, a moderator or an administrator may do so.
    async fn delete_comment(&self, comment_id: CommentId, actor: &Actor) -> Result<(), Error>;

    /// Comments on a review, newest first.
    async fn list_comments(&self, review_id: ReviewId) -> Result<Vec<Comment>, Error>;
}
