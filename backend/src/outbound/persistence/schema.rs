//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// User accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique display name (max 32 characters).
        display_name -> Varchar,
        /// Contact address.
        email -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Role assignments, ordered by `position`.
    user_roles (user_id, role) {
        /// Owning user.
        user_id -> Uuid,
        /// One of `user`, `moderator`, `admin`.
        role -> Varchar,
        /// Assignment order; the lowest position is the primary role.
        position -> Int4,
    }
}

diesel::table! {
    /// Item categories with unique, case-sensitive names.
    categories (id) {
        id -> Int8,
        name -> Varchar,
    }
}

diesel::table! {
    /// Catalogue items.
    items (id) {
        id -> Int8,
        /// Title, collated by code point.
        title -> Varchar,
        description -> Text,
        category_id -> Int8,
    }
}

diesel::table! {
    /// Tags, unique on `lower(name)`.
    tags (id) {
        id -> Int8,
        name -> Varchar,
    }
}

diesel::table! {
    /// Junction between items and tags.
    item_tags (item_id, tag_id) {
        item_id -> Int8,
        tag_id -> Int8,
    }
}

diesel::table! {
    /// Reviews; one per `(item_id, user_id)`.
    reviews (id) {
        id -> Int8,
        item_id -> Int8,
        user_id -> Uuid,
        title -> Varchar,
        content -> Text,
        /// Star rating between 1 and 5.
        rating -> Int2,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Comments on reviews.
    comments (id) {
        id -> Int8,
        review_id -> Int8,
        user_id -> Uuid,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(user_roles -> users (user_id));
diesel::joinable!(items -> categories (category_id));
diesel::joinable!(item_tags -> items (item_id));
diesel::joinable!(item_tags -> tags (tag_id));
diesel::joinable!(reviews -> items (item_id));
diesel::joinable!(reviews -> users (user_id));
diesel::joinable!(comments -> reviews (review_id));
diesel::joinable!(comments -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users, user_roles, categories, items, tags, item_tags, reviews, comments,
);
