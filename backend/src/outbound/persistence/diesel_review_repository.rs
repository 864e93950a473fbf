//! PostgreSQL-backed review and comment adapter.
//!
//! One review per `(item_id, user_id)` is enforced by a unique constraint,
//! which is the final word when two submissions race past the service's
//! pre-check.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    CommentRepository, CommentRepositoryError, ReviewRepository, ReviewRepositoryError,
};
use crate::domain::{
    Comment, CommentId, ItemId, NewComment, NewReview, Review, ReviewContent, ReviewId, UserId,
};

use super::diesel_helpers::{
    collect_rows, is_connection_error, is_unique_violation, map_diesel_error_message,
    map_pool_error_message,
};
use super::models::{CommentRow, NewCommentRow, NewReviewRow, ReviewRow, ReviewUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::{comments, reviews};

/// Diesel-backed implementation of the review and comment ports.
#[derive(Clone)]
pub struct DieselReviewRepository {
    pool: DbPool,
}

impl DieselReviewRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ReviewRepositoryError {
    ReviewRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> ReviewRepositoryError {
    if is_unique_violation(&error) {
        return ReviewRepositoryError::duplicate();
    }
    if is_connection_error(&error) {
        return ReviewRepositoryError::connection(map_diesel_error_message(error, "reviews"));
    }
    ReviewRepositoryError::query(map_diesel_error_message(error, "reviews"))
}

fn map_review_row_error(message: String) -> ReviewRepositoryError {
    ReviewRepositoryError::query(format!("invalid review row: {message}"))
}

fn map_comment_pool_error(error: PoolError) -> CommentRepositoryError {
    CommentRepositoryError::connection(map_pool_error_message(error))
}

fn map_comment_diesel_error(error: diesel::result::Error) -> CommentRepositoryError {
    if is_connection_error(&error) {
        return CommentRepositoryError::connection(map_diesel_error_message(error, "comments"));
    }
    CommentRepositoryError::query(map_diesel_error_message(error, "comments"))
}

fn rating_column(content: &ReviewContent) -> i16 {
    i16::from(content.rating.get())
}

#[async_trait]
impl ReviewRepository for DieselReviewRepository {
    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>, ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ReviewRow> = reviews::table
            .find(id.get())
            .select(ReviewRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Review::try_from)
            .transpose()
            .map_err(map_review_row_error)
    }

    async fn exists_for(
        &self,
        item_id: ItemId,
        user_id: &UserId,
    ) -> Result<bool, ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(exists(
            reviews::table
                .filter(reviews::item_id.eq(item_id.get()))
                .filter(reviews::user_id.eq(*user_id.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn insert_review(&self, review: &NewReview) -> Result<Review, ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: ReviewRow = diesel::insert_into(reviews::table)
            .values(&NewReviewRow {
                item_id: review.item_id.get(),
                user_id: *review.user_id.as_uuid(),
                title: &review.content.title,
                content: &review.content.content,
                rating: rating_column(&review.content),
                created_at: review.created_at,
            })
            .returning(ReviewRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Review::try_from(row).map_err(map_review_row_error)
    }

    async fn update_review(&self, review: &Review) -> Result<bool, ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(reviews::table.find(review.id.get()))
            .set(&ReviewUpdate {
                title: &review.title,
                content: &review.content,
                rating: i16::from(review.rating.get()),
            })
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool, ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // Comments cascade with the review.
        let deleted = diesel::delete(reviews::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn reviews_for_item(
        &self,
        item_id: ItemId,
    ) -> Result<Vec<Review>, ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ReviewRow> = reviews::table
            .filter(reviews::item_id.eq(item_id.get()))
            .order_by((reviews::created_at.desc(), reviews::id.desc()))
            .select(ReviewRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(rows.into_iter().map(Review::try_from), map_review_row_error)
    }
}

#[async_trait]
impl CommentRepository for DieselReviewRepository {
    async fn find_comment(&self, id: CommentId) -> Result<Option<Comment>, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_comment_pool_error)?;
        let row: Option<CommentRow> = comments::table
            .find(id.get())
            .select(CommentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_comment_diesel_error)?;
        Ok(row.map(Comment::from))
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_comment_pool_error)?;
        let row: CommentRow = diesel::insert_into(comments::table)
            .values(&NewCommentRow {
                review_id: comment.review_id.get(),
                user_id: *comment.user_id.as_uuid(),
                content: comment.content.as_ref(),
                created_at: comment.created_at,
            })
            .returning(CommentRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_comment_diesel_error)?;
        Ok(Comment::from(row))
    }

    async fn update_comment(&self, comment: &Comment) -> Result<bool, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_comment_pool_error)?;
        let updated = diesel::update(comments::table.find(comment.id.get()))
            .set(comments::content.eq(&comment.content))
            .execute(&mut conn)
            .await
            .map_err(map_comment_diesel_error)?;
        Ok(updated > 0)
    }

    async fn delete_comment(&self, id: CommentId) -> Result<bool, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_comment_pool_error)?;
        let deleted = diesel::delete(comments::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_comment_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn comments_for_review(
        &self,
        review_id: ReviewId,
    ) -> Result<Vec<Comment>, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_comment_pool_error)?;
        let rows: Vec<CommentRow> = comments::table
            .filter(comments::review_id.eq(review_id.get()))
            .order_by((comments::created_at.desc(), comments::id.desc()))
            .select(CommentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_comment_diesel_error)?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }
}
