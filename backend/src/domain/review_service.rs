//! Review creation, editing and removal.
//!
//! Every mutation of an existing review passes through the ownership gate in
//! [`MutationPolicy`]; creation enforces one review per user per item.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::port_errors::{map_catalogue_error, map_review_error};
use crate::domain::ports::{
    CatalogueRepository, CreateReviewRequest, ReviewCommand, ReviewFields, ReviewQuery,
    ReviewRepository, ReviewRepositoryError,
};
use crate::domain::{
    Actor, Error, ItemId, MutationPolicy, NewReview, Review, ReviewContent, ReviewId,
    ReviewValidationError, sort_newest_first,
};

/// Review service implementing [`ReviewCommand`] and [`ReviewQuery`].
#[derive(Clone)]
pub struct ReviewService<R, C> {
    review_repo: Arc<R>,
    catalogue_repo: Arc<C>,
    clock: Arc<dyn Clock>,
}

pub(crate) fn review_validation_error(err: &ReviewValidationError) -> Error {
    let field = match err {
        ReviewValidationError::RatingOutOfRange { .. } => "rating",
        ReviewValidationError::EmptyField { field } | ReviewValidationError::TooLong { field, .. } => {
            *field
        }
    };
    Error::invalid_request(err.to_string()).with_details(json!({
        "code": "validation_failed",
        "field": field,
    }))
}

fn review_not_found(id: ReviewId) -> Error {
    Error::not_found("review not found")
        .with_details(json!({ "code": "review_not_found", "reviewId": id }))
}

fn parse_fields(fields: ReviewFields) -> Result<ReviewContent, Error> {
    ReviewContent::new(fields.title, fields.content, fields.rating)
        .map_err(|err| review_validation_error(&err))
}

impl<R, C> ReviewService<R, C> {
    /// Create a new service with the given repositories and clock.
    pub fn new(review_repo: Arc<R>, catalogue_repo: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            review_repo,
            catalogue_repo,
            clock,
        }
    }
}

impl<R, C> ReviewService<R, C>
where
    R: ReviewRepository,
    C: CatalogueRepository,
{
    async fn ensure_item_exists(&self, item_id: ItemId) -> Result<(), Error> {
        let item = self
            .catalogue_repo
            .find_item(item_id)
            .await
            .map_err(map_catalogue_error)?;
        if item.is_none() {
            return Err(Error::not_found("item not found")
                .with_details(json!({ "code": "item_not_found", "itemId": item_id })));
        }
        Ok(())
    }

    async fn load(&self, review_id: ReviewId) -> Result<Review, Error> {
        self.review_repo
            .find_review(review_id)
            .await
            .map_err(map_review_error)?
            .ok_or_else(|| review_not_found(review_id))
    }
}

#[async_trait]
impl<R, C> ReviewCommand for ReviewService<R, C>
where
    R: ReviewRepository,
    C: CatalogueRepository,
{
    async fn create_review(
        &self,
        request: CreateReviewRequest,
        actor: &Actor,
    ) -> Result<Review, Error> {
        let content = parse_fields(request.fields)?;
        self.ensure_item_exists(request.item_id).await?;

        let already_reviewed = self
            .review_repo
            .exists_for(request.item_id, actor.user_id())
            .await
            .map_err(map_review_error)?;
        if already_reviewed {
            return Err(map_review_error(ReviewRepositoryError::duplicate()));
        }

        let new_review = NewReview {
            item_id: request.item_id,
            user_id: actor.user_id().clone(),
            content,
            created_at: self.clock.utc(),
        };
        let review = self
            .review_repo
            .insert_review(&new_review)
            .await
            .map_err(map_review_error)?;
        info!(
            review_id = %review.id,
            item_id = %review.item_id,
            user_id = %review.user_id,
            "created review"
        );
        Ok(review)
    }

    async fn update_review(
        &self,
        review_id: ReviewId,
        actor: &Actor,
        fields: ReviewFields,
    ) -> Result<Review, Error> {
        let mut review = self.load(review_id).await?;
        MutationPolicy::REVIEW_UPDATE.authorise(actor, &review.user_id)?;
        review.apply(parse_fields(fields)?);

        let still_present = self
            .review_repo
            .update_review(&review)
            .await
            .map_err(map_review_error)?;
        if !still_present {
            warn!(%review_id, "review vanished during update");
            return Err(review_not_found(review_id));
        }
        info!(%review_id, user_id = %actor.user_id(), "updated review");
        Ok(review)
    }

    async fn delete_review(&self, review_id: ReviewId, actor: &Actor) -> Result<(), Error> {
        let review = self.load(review_id).await?;
        MutationPolicy::REVIEW_DELETE.authorise(actor, &review.user_id)?;

        let removed = self
            .review_repo
            .delete_review(review_id)
            .await
            .map_err(map_review_error)?;
        if !removed {
            return Err(review_not_found(review_id));
        }
        info!(
            %review_id,
            user_id = %actor.user_id(),
            role = %actor.role(),
            "deleted review"
        );
        Ok(())
    }
}

#[async_trait]
impl<R, C> ReviewQuery for ReviewService<R, C>
where
    R: ReviewRepository,
    C: CatalogueRepository,
{
    async fn reviews_for_item(&self, item_id: ItemId) -> Result<Vec<Review>, Error> {
        self.ensure_item_exists(item_id).await?;
        let mut reviews = self
            .review_repo
            .reviews_for_item(item_id)
            .await
            .map_err(map_review_error)?;
        sort_newest_first(&mut reviews);
        Ok(reviews)
    }
}
