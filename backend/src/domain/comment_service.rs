//! Comments attached to reviews.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::port_errors::{map_comment_error, map_review_error};
use crate::domain::ports::{CommentCommand, CommentRepository, ReviewRepository};
use crate::domain::review_service::review_validation_error;
use crate::domain::{
    Actor, Comment, CommentBody, CommentId, Error, MutationPolicy, NewComment, ReviewId,
    sort_comments_newest_first,
};

/// Comment service implementing [`CommentCommand`].
#[derive(Clone)]
pub struct CommentService<M, R> {
    comment_repo: Arc<M>,
    review_repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

fn comment_not_found(id: CommentId) -> Error {
    Error::not_found("comment not found")
        .with_details(json!({ "code": "comment_not_found", "commentId": id }))
}

impl<M, R> CommentService<M, R> {
    /// Create a new service with the given repositories and clock.
    pub fn new(comment_repo: Arc<M>, review_repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            comment_repo,
            review_repo,
            clock,
        }
    }
}

impl<M, R> CommentService<M, R>
where
    M: CommentRepository,
    R: ReviewRepository,
{
    async fn ensure_review_exists(&self, review_id: ReviewId) -> Result<(), Error> {
        let review = self
            .review_repo
            .find_review(review_id)
            .await
            .map_err(map_review_error)?;
        if review.is_none() {
            return Err(Error::not_found("review not found")
                .with_details(json!({ "code": "review_not_found", "reviewId": review_id })));
        }
        Ok(())
    }

    async fn load(&self, comment_id: CommentId) -> Result<Comment, Error> {
        self.comment_repo
            .find_comment(comment_id)
            .await
            .map_err(map_comment_error)?
            .ok_or_else(|| comment_not_found(comment_id))
    }
}

#[async_trait]
impl<M, R> CommentCommand for CommentService<M, R>
where
    M: CommentRepository,
    R: ReviewRepository,
{
    async fn create_comment(
        &self,
        review_id: ReviewId,
        actor: &Actor,
        content: String,
    ) -> Result<Comment, Error> {
        let content = CommentBody::new(content).map_err(|err| review_validation_error(&err))?;
        self.ensure_review_exists(review_id).await?;

        let new_comment = NewComment {
            review_id,
            user_id: actor.user_id().clone(),
            content,
            created_at: self.clock.utc(),
        };
        let comment = self
            .comment_repo
            .insert_comment(&new_comment)
            .await
            .map_err(map_comment_error)?;
        info!(comment_id = %comment.id, %review_id, "created comment");
        Ok(comment)
    }

    async fn update_comment(
        &self,
        comment_id: CommentId,
        actor: &Actor,
        content: String,
    ) -> Result<Comment, Error> {
        let mut comment = self.load(comment_id).await?;
        MutationPolicy::COMMENT_UPDATE.authorise(actor, &comment.user_id)?;
        let content = CommentBody::new(content).map_err(|err| review_validation_error(&err))?;
        comment.content = content.into();

        let still_present = self
            .comment_repo
            .update_comment(&comment)
            .await
            .map_err(map_comment_error)?;
        if !still_present {
            return Err(comment_not_found(comment_id));
        }
        info!(%comment_id, "updated comment");
        Ok(comment)
    }

    async fn delete_comment(&self, comment_id: CommentId, actor: &Actor) -> Result<(), Error> {
        let comment = self.load(comment_id).await?;
        MutationPolicy::COMMENT_DELETE.authorise(actor, &comment.user_id)?;

        let removed = self
            .comment_repo
            .delete_comment(comment_id)
            .await
            .map_err(map_comment_error)?;
        if !removed {
            return Err(comment_not_found(comment_id));
        }
        info!(%comment_id, role = %actor.role(), "deleted comment");
        Ok(())
    }

    async fn list_comments(&self, review_id: ReviewId) -> Result<Vec<Comment>, Error> {
        self.ensure_review_exists(review_id).await?;
        let mut comments = self
            .comment_repo
            .comments_for_review(review_id)
            .await
            .map_err(map_comment_error)?;
        sort_comments_newest_first(&mut comments);
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockCommentRepository, MockReviewRepository};
    use crate::domain::{ErrorCode, ItemId, Rating, Review, Role, UserId};
    use crate::test_support::MutableClock;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 18, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    fn review(id: ReviewId) -> Review {
        Review {
            id,
            item_id: ItemId::new(1),
            user_id: UserId::random(),
            title: "Solid".to_owned(),
            content: "Worth it".to_owned(),
            rating: Rating::new(4).expect("rating"),
            created_at: now(),
        }
    }

    fn comment(id: i64, owner: &UserId, created_at: DateTime<Utc>) -> Comment {
        Comment {
            id: CommentId::new(id),
            review_id: ReviewId::new(1),
            user_id: owner.clone(),
            content: "Agreed".to_owned(),
            created_at,
        }
    }

    fn reviews_present() -> MockReviewRepository {
        let mut reviews = MockReviewRepository::new();
        reviews
            .expect_find_review()
            .returning(|id| Ok(Some(review(id))));
        reviews
    }

    fn service(
        comments: MockCommentRepository,
        reviews: MockReviewRepository,
    ) -> CommentService<MockCommentRepository, MockReviewRepository> {
        CommentService::new(
            Arc::new(comments),
            Arc::new(reviews),
            Arc::new(MutableClock::new(now())),
        )
    }

    #[tokio::test]
    async fn create_comment_on_existing_review() {
        let actor = Actor::new(UserId::random(), Role::User);
        let mut comments = MockCommentRepository::new();
        comments
            .expect_insert_comment()
            .withf(|comment: &NewComment| {
                comment.content.as_ref() == "Agreed" && comment.created_at == now()
            })
            .return_once(|comment| Ok(Comment::from_new(CommentId::new(3), comment.clone())));

        let created = service(comments, reviews_present())
            .create_comment(ReviewId::new(1), &actor, " Agreed ".to_owned())
            .await
            .expect("comment created");
        assert_eq!(created.id, CommentId::new(3));
        assert_eq!(&created.user_id, actor.user_id());
    }

    #[tokio::test]
    async fn commenting_on_missing_review_is_not_found() {
        let actor = Actor::new(UserId::random(), Role::User);
        let mut reviews = MockReviewRepository::new();
        reviews.expect_find_review().return_once(|_| Ok(None));
        let mut comments = MockCommentRepository::new();
        comments.expect_insert_comment().times(0);

        let error = service(comments, reviews)
            .create_comment(ReviewId::new(2), &actor, "hello".to_owned())
            .await
            .expect_err("missing review");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn blank_comments_are_rejected() {
        let actor = Actor::new(UserId::random(), Role::User);
        let error = service(MockCommentRepository::new(), MockReviewRepository::new())
            .create_comment(ReviewId::new(2), &actor, "  ".to_owned())
            .await
            .expect_err("blank");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[case(Role::User, false)]
    #[case(Role::Moderator, true)]
    #[case(Role::Admin, true)]
    #[tokio::test]
    async fn moderators_delete_any_comment(#[case] role: Role, #[case] allowed: bool) {
        let owner = UserId::random();
        let mut comments = MockCommentRepository::new();
        comments
            .expect_find_comment()
            .return_once(move |_| Ok(Some(comment(5, &owner, now()))));
        comments
            .expect_delete_comment()
            .times(usize::from(allowed))
            .returning(|_| Ok(true));

        let actor = Actor::new(UserId::random(), role);
        let result = service(comments, MockReviewRepository::new())
            .delete_comment(CommentId::new(5), &actor)
            .await;
        assert_eq!(result.is_ok(), allowed);
    }

    #[rstest]
    #[case(Role::Moderator)]
    #[case(Role::Admin)]
    #[tokio::test]
    async fn only_the_author_edits_a_comment(#[case] role: Role) {
        let owner = UserId::random();
        let mut comments = MockCommentRepository::new();
        comments
            .expect_find_comment()
            .return_once(move |_| Ok(Some(comment(5, &owner, now()))));
        comments.expect_update_comment().times(0);

        let actor = Actor::new(UserId::random(), role);
        let error = service(comments, MockReviewRepository::new())
            .update_comment(CommentId::new(5), &actor, "edited".to_owned())
            .await
            .expect_err("forbidden");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn author_edits_own_comment() {
        let actor = Actor::new(UserId::random(), Role::User);
        let owner = actor.user_id().clone();
        let mut comments = MockCommentRepository::new();
        comments
            .expect_find_comment()
            .return_once(move |_| Ok(Some(comment(5, &owner, now()))));
        comments
            .expect_update_comment()
            .withf(|comment: &Comment| comment.content == "edited")
            .return_once(|_| Ok(true));

        let updated = service(comments, MockReviewRepository::new())
            .update_comment(CommentId::new(5), &actor, "edited".to_owned())
            .await
            .expect("update succeeds");
        assert_eq!(updated.content, "edited");
    }

    #[tokio::test]
    async fn list_comments_newest_first() {
        let owner = UserId::random();
        let mut comments = MockCommentRepository::new();
        comments.expect_comments_for_review().return_once(move |_| {
            Ok(vec![
                comment(1, &owner, now() - Duration::hours(2)),
                comment(2, &owner, now()),
                comment(3, &owner, now() - Duration::hours(2)),
            ])
        });
        let listed = service(comments, reviews_present())
            .list_comments(ReviewId::new(1))
            .await
            .expect("listing succeeds");
        let ids: Vec<i64> = listed.iter().map(|comment| comment.id.get()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
