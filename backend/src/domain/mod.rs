//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed catalogue entities, the ranking and
//! authorisation rules that apply to them, and the services implementing the
//! driving ports in [`ports`]. Nothing here knows about SQL or transport.
//!
//! Public surface:
//! - Error / ErrorCode: typed outcome of every operation.
//! - Catalogue types (`Category`, `Item`, `Tag`, `ItemView`, `ItemFilter`).
//! - Review types (`Review`, `Comment`, `Rating`).
//! - Authorisation (`Role`, `Actor`, `can_mutate`, `MutationPolicy`).
//! - Statistics (`StatsView` and the ranking functions).
//! - Services implementing the driving ports.

pub mod authorisation;
pub mod catalogue;
pub mod error;
pub mod ids;
pub(crate) mod port_errors;
pub mod ports;
pub mod review;
pub mod statistics;
pub mod user;

mod catalogue_admin_service;
mod catalogue_query_service;
mod comment_service;
mod review_service;
mod statistics_service;
mod tag_association_service;

pub use self::authorisation::{Actor, MutationPolicy, Role, UnknownRoleError, can_mutate};
pub use self::catalogue::{
    AverageRating, CATEGORY_NAME_MAX, CatalogueValidationError, Category, ITEM_TITLE_MAX, Item,
    ItemDraft, ItemFilter, ItemListing, ItemPage, ItemPredicate, ItemQuery, ItemSort, ItemView,
    RatingSummary, SortDirection, SortKey, TAG_NAME_MAX, Tag, TagName, TagView, sort_tag_views,
};
pub use self::catalogue_admin_service::CatalogueAdminService;
pub use self::catalogue_query_service::CatalogueQueryService;
pub use self::comment_service::CommentService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{CategoryId, CommentId, ItemId, ReviewId, TagId};
pub use self::review::{
    BODY_MAX, Comment, CommentBody, NewComment, NewReview, REVIEW_TITLE_MAX, Rating, Review,
    ReviewContent, ReviewValidationError, sort_comments_newest_first, sort_newest_first,
};
pub use self::review_service::ReviewService;
pub use self::statistics::{
    ItemRatingRow, ItemStat, LEADERBOARD_SIZE, RecentReviewRow, RecentReviewView, ReviewerRow,
    ReviewerStat, StatisticsSnapshot, StatsView, TOP_RATED_MIN_REVIEWS, most_reviewed,
    recent_reviews, top_rated, top_reviewers,
};
pub use self::statistics_service::StatisticsService;
pub use self::tag_association_service::TagAssociationService;
pub use self::user::{DisplayName, Email, User, UserId, UserValidationError, primary_role};

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use review_catalogue::domain::{DomainResult, Error};
///
/// fn lookup() -> DomainResult<u32> {
///     Err(Error::not_found("no such item"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
