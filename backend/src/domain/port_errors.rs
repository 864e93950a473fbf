//! Translation of driven-port failures into domain errors.
//!
//! Connection failures become `ServiceUnavailable` and query failures become
//! `InternalError`; port-specific variants map to the business outcome they
//! represent.

use serde_json::json;

use super::Error;
use super::ports::{
    CatalogueRepositoryError, CommentRepositoryError, ReviewRepositoryError,
    StatisticsRepositoryError, TagRepositoryError, UserRepositoryError,
};

pub(crate) fn map_catalogue_error(error: CatalogueRepositoryError) -> Error {
    match error {
        CatalogueRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("catalogue repository unavailable: {message}"))
        }
        CatalogueRepositoryError::Query { message } => {
            Error::internal(format!("catalogue repository error: {message}"))
        }
        CatalogueRepositoryError::DuplicateCategory { name } => {
            Error::conflict(format!("category {name} already exists")).with_details(json!({
                "code": "duplicate_category",
                "name": name,
            }))
        }
        CatalogueRepositoryError::CategoryInUse { category_id } => {
            Error::conflict("category still has items").with_details(json!({
                "code": "category_in_use",
                "categoryId": category_id,
            }))
        }
        CatalogueRepositoryError::MissingCategory { category_id } => {
            Error::not_found("category not found").with_details(json!({
                "code": "category_not_found",
                "categoryId": category_id,
            }))
        }
    }
}

pub(crate) fn map_tag_error(error: TagRepositoryError) -> Error {
    match error {
        TagRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("tag repository unavailable: {message}"))
        }
        TagRepositoryError::Query { message } => {
            Error::internal(format!("tag repository error: {message}"))
        }
        TagRepositoryError::DuplicateName { name } => {
            Error::conflict(format!("tag {name} was created concurrently")).with_details(json!({
                "code": "duplicate_tag",
                "tagName": name,
            }))
        }
        TagRepositoryError::AlreadyLinked => Error::already_attached("tag already attached"),
    }
}

pub(crate) fn map_review_error(error: ReviewRepositoryError) -> Error {
    match error {
        ReviewRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("review repository unavailable: {message}"))
        }
        ReviewRepositoryError::Query { message } => {
            Error::internal(format!("review repository error: {message}"))
        }
        ReviewRepositoryError::Duplicate => {
            Error::duplicate_review("you have already reviewed this item")
        }
    }
}

pub(crate) fn map_comment_error(error: CommentRepositoryError) -> Error {
    match error {
        CommentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("comment repository unavailable: {message}"))
        }
        CommentRepositoryError::Query { message } => {
            Error::internal(format!("comment repository error: {message}"))
        }
    }
}

pub(crate) fn map_statistics_error(error: StatisticsRepositoryError) -> Error {
    match error {
        StatisticsRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("statistics repository unavailable: {message}"))
        }
        StatisticsRepositoryError::Query { message } => {
            Error::internal(format!("statistics repository error: {message}"))
        }
    }
}

pub(crate) fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateDisplayName { name } => {
            Error::conflict(format!("display name {name} is already taken"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(CatalogueRepositoryError::connection("down"), ErrorCode::ServiceUnavailable)]
    #[case(CatalogueRepositoryError::query("bad sql"), ErrorCode::InternalError)]
    #[case(CatalogueRepositoryError::duplicate_category("Films"), ErrorCode::Conflict)]
    #[case(CatalogueRepositoryError::category_in_use(3_i64), ErrorCode::Conflict)]
    #[case(CatalogueRepositoryError::missing_category(3_i64), ErrorCode::NotFound)]
    fn catalogue_errors_map_to_codes(
        #[case] error: CatalogueRepositoryError,
        #[case] code: ErrorCode,
    ) {
        assert_eq!(map_catalogue_error(error).code(), code);
    }

    #[rstest]
    #[case(TagRepositoryError::connection("down"), ErrorCode::ServiceUnavailable)]
    #[case(TagRepositoryError::query("bad"), ErrorCode::InternalError)]
    #[case(TagRepositoryError::duplicate_name("drama"), ErrorCode::Conflict)]
    #[case(TagRepositoryError::already_linked(), ErrorCode::AlreadyAttached)]
    fn tag_errors_map_to_codes(#[case] error: TagRepositoryError, #[case] code: ErrorCode) {
        assert_eq!(map_tag_error(error).code(), code);
    }

    #[rstest]
    fn duplicate_reviews_are_business_outcomes() {
        let error = map_review_error(ReviewRepositoryError::duplicate());
        assert_eq!(error.code(), ErrorCode::DuplicateReview);
        assert!(!error.code().is_fault());
    }

    #[rstest]
    fn connection_failures_are_faults() {
        for error in [
            map_comment_error(CommentRepositoryError::connection("x")),
            map_statistics_error(StatisticsRepositoryError::connection("x")),
            map_user_error(UserRepositoryError::connection("x")),
        ] {
            assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
            assert!(error.code().is_fault());
        }
    }
}
