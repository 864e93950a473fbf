//! PostgreSQL-backed tag adapter.
//!
//! Case-insensitive uniqueness is enforced by the `lower(name)` index; lookups
//! go through the same expression so they can use it.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{TagRepository, TagRepositoryError};
use crate::domain::{ItemId, Tag, TagId, TagName};

use super::diesel_helpers::{
    collect_rows, is_connection_error, is_unique_violation, map_diesel_error_message,
    map_pool_error_message,
};
use super::models::{ItemTagRow, NewTagRow, TagRow};
use super::pool::{DbPool, PoolError};
use super::schema::{item_tags, tags};

diesel::define_sql_function! {
    /// PostgreSQL `lower(text)`.
    fn lower(value: Text) -> Text;
}

/// Diesel-backed implementation of the tag port.
#[derive(Clone)]
pub struct DieselTagRepository {
    pool: DbPool,
}

impl DieselTagRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TagRepositoryError {
    TagRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> TagRepositoryError {
    if is_connection_error(&error) {
        return TagRepositoryError::connection(map_diesel_error_message(error, "tags"));
    }
    TagRepositoryError::query(map_diesel_error_message(error, "tags"))
}

fn map_insert_error(error: diesel::result::Error, name: &TagName) -> TagRepositoryError {
    if is_unique_violation(&error) {
        return TagRepositoryError::duplicate_name(name.as_ref());
    }
    map_diesel_error(error)
}

fn map_link_error(error: diesel::result::Error) -> TagRepositoryError {
    if is_unique_violation(&error) {
        return TagRepositoryError::already_linked();
    }
    map_diesel_error(error)
}

fn to_tag(row: TagRow) -> Result<Tag, String> {
    Tag::try_from(row)
}

fn map_row_error(message: String) -> TagRepositoryError {
    TagRepositoryError::query(format!("invalid tag row: {message}"))
}

#[async_trait]
impl TagRepository for DieselTagRepository {
    async fn find_by_name(&self, name: &TagName) -> Result<Option<Tag>, TagRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<TagRow> = tags::table
            .filter(lower(tags::name).eq(name.lookup_key()))
            .select(TagRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_tag).transpose().map_err(map_row_error)
    }

    async fn insert(&self, name: &TagName) -> Result<Tag, TagRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: TagRow = diesel::insert_into(tags::table)
            .values(&NewTagRow {
                name: name.as_ref(),
            })
            .returning(TagRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| map_insert_error(error, name))?;
        to_tag(row).map_err(map_row_error)
    }

    async fn is_linked(&self, item_id: ItemId, tag_id: TagId) -> Result<bool, TagRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(exists(
            item_tags::table
                .filter(item_tags::item_id.eq(item_id.get()))
                .filter(item_tags::tag_id.eq(tag_id.get())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn link(&self, item_id: ItemId, tag_id: TagId) -> Result<(), TagRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(item_tags::table)
            .values(&ItemTagRow {
                item_id: item_id.get(),
                tag_id: tag_id.get(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_link_error)
    }

    async fn unlink(&self, item_id: ItemId, tag_id: TagId) -> Result<bool, TagRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(
            item_tags::table
                .filter(item_tags::item_id.eq(item_id.get()))
                .filter(item_tags::tag_id.eq(tag_id.get())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }

    async fn tags_for_items(
        &self,
        item_ids: &[ItemId],
    ) -> Result<Vec<(ItemId, Tag)>, TagRepositoryError> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = item_ids.iter().map(|id| id.get()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(i64, TagRow)> = item_tags::table
            .inner_join(tags::table)
            .filter(item_tags::item_id.eq_any(ids))
            .order_by((item_tags::item_id.asc(), tags::name.asc(), tags::id.asc()))
            .select((item_tags::item_id, TagRow::as_select()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter()
                .map(|(item_id, row)| to_tag(row).map(|tag| (ItemId::new(item_id), tag))),
            map_row_error,
        )
    }
}
