//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types live beside
//! each row so adapters share one validation path.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Category, CategoryId, Comment, CommentId, Item, ItemId, Rating, Review, ReviewId, Tag, TagId,
    TagName, UserId,
};

use super::schema::{
    categories, comments, item_tags, items, reviews, tags, user_roles, users,
};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub display_name: &'a str,
    pub email: &'a str,
}

/// One role assignment.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = user_roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRoleRow {
    pub user_id: Uuid,
    pub role: String,
    pub position: i32,
}

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CategoryRow {
    pub id: i64,
    pub name: String,
}

impl TryFrom<CategoryRow> for Category {
    type Error = String;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Category::new(CategoryId::new(row.id), row.name).map_err(|err| err.to_string())
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = categories)]
pub(crate) struct NewCategoryRow<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ItemRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category_id: i64,
}

impl TryFrom<ItemRow> for Item {
    type Error = String;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Item::new(
            ItemId::new(row.id),
            row.title,
            row.description,
            CategoryId::new(row.category_id),
        )
        .map_err(|err| err.to_string())
    }
}

/// Insertable and changeset form of an item's editable fields.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = items)]
pub(crate) struct ItemFieldsRow<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category_id: i64,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TagRow {
    pub id: i64,
    pub name: String,
}

impl TryFrom<TagRow> for Tag {
    type Error = String;

    fn try_from(row: TagRow) -> Result<Self, Self::Error> {
        let name = TagName::new(row.name).map_err(|err| err.to_string())?;
        Ok(Tag::new(TagId::new(row.id), name))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tags)]
pub(crate) struct NewTagRow<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = item_tags)]
pub(crate) struct ItemTagRow {
    pub item_id: i64,
    pub tag_id: i64,
}

// ---------------------------------------------------------------------------
// Reviews and comments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ReviewRow {
    pub id: i64,
    pub item_id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub rating: i16,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = String;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = Rating::new(i64::from(row.rating)).map_err(|err| err.to_string())?;
        Ok(Review {
            id: ReviewId::new(row.id),
            item_id: ItemId::new(row.item_id),
            user_id: UserId::from_uuid(row.user_id),
            title: row.title,
            content: row.content,
            rating,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reviews)]
pub(crate) struct NewReviewRow<'a> {
    pub item_id: i64,
    pub user_id: Uuid,
    pub title: &'a str,
    pub content: &'a str,
    pub rating: i16,
    pub created_at: DateTime<Utc>,
}

/// Editable review fields.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = reviews)]
pub(crate) struct ReviewUpdate<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub rating: i16,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: i64,
    pub review_id: i64,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: CommentId::new(row.id),
            review_id: ReviewId::new(row.review_id),
            user_id: UserId::from_uuid(row.user_id),
            content: row.content,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
pub(crate) struct NewCommentRow<'a> {
    pub review_id: i64,
    pub user_id: Uuid,
    pub content: &'a str,
    pub created_at: DateTime<Utc>,
}
