//! Reviews and the comments attached to them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CommentId, ItemId, ReviewId, UserId};

/// Longest accepted review title, in characters.
pub const REVIEW_TITLE_MAX: usize = 200;
/// Longest accepted review or comment body, in characters.
pub const BODY_MAX: usize = 10_000;

/// Validation errors for review and comment input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewValidationError {
    RatingOutOfRange { value: i64 },
    EmptyField { field: &'static str },
    TooLong { field: &'static str, max: usize },
}

impl fmt::Display for ReviewValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RatingOutOfRange { value } => {
                write!(f, "rating must be between 1 and 5 (got {value})")
            }
            Self::EmptyField { field } => write!(f, "{field} must not be empty"),
            Self::TooLong { field, max } => write!(f, "{field} must be at most {max} characters"),
        }
    }
}

impl std::error::Error for ReviewValidationError {}

/// Star rating between 1 and 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Lowest permitted rating.
    pub const MIN: u8 = 1;
    /// Highest permitted rating.
    pub const MAX: u8 = 5;

    /// Validate a raw rating.
    pub fn new(value: i64) -> Result<Self, ReviewValidationError> {
        u8::try_from(value)
            .ok()
            .filter(|rating| (Self::MIN..=Self::MAX).contains(rating))
            .map(Self)
            .ok_or(ReviewValidationError::RatingOutOfRange { value })
    }

    /// Numeric value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = ReviewValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

fn required_text(
    value: String,
    field: &'static str,
    max: usize,
) -> Result<String, ReviewValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ReviewValidationError::EmptyField { field });
    }
    if trimmed.chars().count() > max {
        return Err(ReviewValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

/// Validated review fields supplied on create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewContent {
    /// Headline, trimmed.
    pub title: String,
    /// Body text, trimmed.
    pub content: String,
    /// Star rating.
    pub rating: Rating,
}

impl ReviewContent {
    /// Validate raw review fields.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        rating: i64,
    ) -> Result<Self, ReviewValidationError> {
        Ok(Self {
            title: required_text(title.into(), "title", REVIEW_TITLE_MAX)?,
            content: required_text(content.into(), "content", BODY_MAX)?,
            rating: Rating::new(rating)?,
        })
    }
}

/// A review about to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    /// Reviewed item.
    pub item_id: ItemId,
    /// Author.
    pub user_id: UserId,
    /// Validated fields.
    pub content: ReviewContent,
    /// Creation timestamp from the service clock.
    pub created_at: DateTime<Utc>,
}

/// Rated, titled write-up by one user about one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Review identifier.
    pub id: ReviewId,
    /// Reviewed item.
    pub item_id: ItemId,
    /// Author.
    pub user_id: UserId,
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Star rating.
    pub rating: Rating,
    /// When the review was written.
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Store a freshly inserted review under `id`.
    pub fn from_new(id: ReviewId, new_review: NewReview) -> Self {
        let NewReview {
            item_id,
            user_id,
            content,
            created_at,
        } = new_review;
        Self {
            id,
            item_id,
            user_id,
            title: content.title,
            content: content.content,
            rating: content.rating,
            created_at,
        }
    }

    /// Replace the editable fields, keeping identity and timestamp.
    pub fn apply(&mut self, content: ReviewContent) {
        self.title = content.title;
        self.content = content.content;
        self.rating = content.rating;
    }
}

/// Validated comment body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBody(String);

impl CommentBody {
    /// Validate a raw comment body.
    pub fn new(content: impl Into<String>) -> Result<Self, ReviewValidationError> {
        required_text(content.into(), "content", BODY_MAX).map(Self)
    }
}

impl AsRef<str> for CommentBody {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<CommentBody> for String {
    fn from(value: CommentBody) -> Self {
        value.0
    }
}

/// A comment about to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    /// Parent review.
    pub review_id: ReviewId,
    /// Author.
    pub user_id: UserId,
    /// Validated body.
    pub content: CommentBody,
    /// Creation timestamp from the service clock.
    pub created_at: DateTime<Utc>,
}

/// Reply attached to a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment identifier.
    pub id: CommentId,
    /// Parent review.
    pub review_id: ReviewId,
    /// Author.
    pub user_id: UserId,
    /// Body text.
    pub content: String,
    /// When the comment was written.
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Store a freshly inserted comment under `id`.
    pub fn from_new(id: CommentId, new_comment: NewComment) -> Self {
        Self {
            id,
            review_id: new_comment.review_id,
            user_id: new_comment.user_id,
            content: new_comment.content.into(),
            created_at: new_comment.created_at,
        }
    }
}

/// Order reviews newest first, breaking ties by descending id.
pub fn sort_newest_first(reviews: &mut [Review]) {
    reviews.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Order comments newest first, breaking ties by descending id.
pub fn sort_comments_newest_first(comments: &mut [Comment]) {
    comments.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(5)]
    fn accepts_ratings_in_range(#[case] value: i64) {
        assert_eq!(Rating::new(value).map(Rating::get), Ok(u8::try_from(value).expect("u8")));
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(-1)]
    #[case(300)]
    fn rejects_ratings_out_of_range(#[case] value: i64) {
        assert_eq!(
            Rating::new(value),
            Err(ReviewValidationError::RatingOutOfRange { value })
        );
    }

    #[rstest]
    fn review_content_trims_and_requires_fields() {
        let content = ReviewContent::new(" Great ", " Loved it ", 5).expect("valid");
        assert_eq!(content.title, "Great");
        assert_eq!(content.content, "Loved it");
        assert_eq!(
            ReviewContent::new("", "body", 3),
            Err(ReviewValidationError::EmptyField { field: "title" })
        );
        assert_eq!(
            ReviewContent::new("title", "  ", 3),
            Err(ReviewValidationError::EmptyField { field: "content" })
        );
    }

    #[rstest]
    fn comment_body_rejects_overlong_input() {
        let result = CommentBody::new("x".repeat(BODY_MAX + 1));
        assert_eq!(
            result,
            Err(ReviewValidationError::TooLong {
                field: "content",
                max: BODY_MAX
            })
        );
    }

    #[rstest]
    fn rating_deserialisation_validates_range() {
        assert!(serde_json::from_value::<Rating>(serde_json::json!(4)).is_ok());
        assert!(serde_json::from_value::<Rating>(serde_json::json!(9)).is_err());
    }

    #[rstest]
    fn newest_first_breaks_ties_by_descending_id() {
        let base = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        let review = |id: i64, at: DateTime<Utc>| Review {
            id: ReviewId::new(id),
            item_id: ItemId::new(1),
            user_id: UserId::random(),
            title: "t".to_owned(),
            content: "c".to_owned(),
            rating: Rating::new(3).expect("rating"),
            created_at: at,
        };
        let mut reviews = vec![
            review(1, base),
            review(2, base + Duration::minutes(5)),
            review(3, base),
        ];
        sort_newest_first(&mut reviews);
        let ids: Vec<i64> = reviews.iter().map(|review| review.id.get()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
