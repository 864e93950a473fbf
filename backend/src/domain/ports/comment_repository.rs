//! Port abstraction for comment persistence.
use async_trait::async_trait;

use crate::domain::{Comment, CommentId, NewComment, ReviewId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by comment repository adapters.
    pub enum CommentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "comment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "comment repository query failed: {message}",
    }
}

/// Port for storing and retrieving comments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Fetch a comment by identifier.
    async fn find_comment(&self, id: CommentId) -> Result<Option<Comment>, CommentRepositoryError>;

    /// Insert a comment.
    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, CommentRepositoryError>;

    /// Persist an edited body, returning whether the comment still exists.
    async fn update_comment(&self, comment: &Comment) -> Result<bool, CommentRepositoryError>;

    /// Delete a comment, returning whether a row was removed.
    async fn delete_comment(&self, id: CommentId) -> Result<bool, CommentRepositoryError>;

    /// Comments on a review, newest first.
    async fn comments_for_review(
        &self,
        review_id: ReviewId,
    ) -> Result<Vec<Comment>, CommentRepositoryError>;
}
