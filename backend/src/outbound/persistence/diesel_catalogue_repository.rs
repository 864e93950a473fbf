//! PostgreSQL-backed catalogue adapter.
//!
//! Item queries translate [`ItemPredicate`] into SQL so narrowing, counting
//! and paging all happen in the database. Rating order uses the same
//! `total / count` average the domain computes, with unreviewed items at zero.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::{count_star, sql, sum};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Double;
use diesel_async::AsyncConnection as _;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{CatalogueListing, CatalogueRepository, CatalogueRepositoryError};
use crate::domain::{
    Category, CategoryId, Item, ItemDraft, ItemId, ItemListing, ItemPredicate, ItemQuery,
    RatingSummary, SortDirection, SortKey,
};

use super::diesel_helpers::{
    collect_rows, contains_pattern, is_connection_error, is_foreign_key_violation,
    is_unique_violation, map_diesel_error_message, map_pool_error_message, to_bigint, to_count,
};
use super::models::{CategoryRow, ItemFieldsRow, ItemRow, NewCategoryRow};
use super::pool::{DbPool, PoolError};
use super::schema::{categories, item_tags, items, reviews};

/// Average rating of the outer `items` row, zero without reviews.
const AVERAGE_RATING_SQL: &str = "COALESCE((SELECT SUM(r.rating)::float8 / COUNT(*)::float8 \
     FROM reviews r WHERE r.item_id = items.id), 0)";

/// Diesel-backed implementation of the catalogue port.
#[derive(Clone)]
pub struct DieselCatalogueRepository {
    pool: DbPool,
}

impl DieselCatalogueRepository {
    /// Create a new repository with the given connection pool.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let config = PoolConfig::new("postgres://localhost/catalogue");
    /// let pool = DbPool::new(config).await?;
    /// let repo = DieselCatalogueRepository::new(pool);
    /// ```
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CatalogueRepositoryError {
    CatalogueRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> CatalogueRepositoryError {
    if is_connection_error(&error) {
        return CatalogueRepositoryError::connection(map_diesel_error_message(
            error,
            "catalogue",
        ));
    }
    CatalogueRepositoryError::query(map_diesel_error_message(error, "catalogue"))
}

fn map_row_error(message: String) -> CatalogueRepositoryError {
    CatalogueRepositoryError::query(format!("invalid catalogue row: {message}"))
}

// ---------------------------------------------------------------------------
// Query construction
// ---------------------------------------------------------------------------

/// Items matching every clause of `predicate`, unordered and unpaged.
fn filtered_items(predicate: &ItemPredicate) -> items::BoxedQuery<'static, Pg> {
    let mut query = items::table.into_boxed();
    if let Some(search) = predicate.search() {
        query = query.filter(items::title.ilike(contains_pattern(search)));
    }
    if let Some(category_id) = predicate.category_id() {
        query = query.filter(items::category_id.eq(category_id.get()));
    }
    if !predicate.tag_ids().is_empty() {
        let tag_ids: Vec<i64> = predicate.tag_ids().iter().map(|id| id.get()).collect();
        query = query.filter(
            items::id.eq_any(
                item_tags::table
                    .filter(item_tags::tag_id.eq_any(tag_ids))
                    .select(item_tags::item_id),
            ),
        );
    }
    query
}

fn ordered(
    query: items::BoxedQuery<'static, Pg>,
    key: SortKey,
    direction: SortDirection,
) -> items::BoxedQuery<'static, Pg> {
    let rating = || sql::<Double>(AVERAGE_RATING_SQL);
    let keyed = match (key, direction) {
        (SortKey::Id, SortDirection::Ascending) => return query.order_by(items::id.asc()),
        (SortKey::Id, SortDirection::Descending) => return query.order_by(items::id.desc()),
        (SortKey::Title, SortDirection::Ascending) => query.order_by(items::title.asc()),
        (SortKey::Title, SortDirection::Descending) => query.order_by(items::title.desc()),
        (SortKey::Rating, SortDirection::Ascending) => query.order_by(rating().asc()),
        (SortKey::Rating, SortDirection::Descending) => query.order_by(rating().desc()),
    };
    keyed.then_order_by(items::id.asc())
}

// ---------------------------------------------------------------------------
// Listing assembly
// ---------------------------------------------------------------------------

type RatingAggregate = (i64, i64, Option<i64>);

struct ListingParts {
    rows: Vec<ItemRow>,
    categories: Vec<CategoryRow>,
    aggregates: Vec<RatingAggregate>,
}

async fn load_listing_parts(
    conn: &mut AsyncPgConnection,
    rows: Vec<ItemRow>,
) -> QueryResult<ListingParts> {
    if rows.is_empty() {
        return Ok(ListingParts {
            rows,
            categories: Vec::new(),
            aggregates: Vec::new(),
        });
    }
    let item_ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let category_ids: Vec<i64> = rows.iter().map(|row| row.category_id).collect();

    let categories = categories::table
        .filter(categories::id.eq_any(category_ids))
        .select(CategoryRow::as_select())
        .load(conn)
        .await?;
    let aggregates = reviews::table
        .filter(reviews::item_id.eq_any(item_ids))
        .group_by(reviews::item_id)
        .select((reviews::item_id, count_star(), sum(reviews::rating)))
        .load::<RatingAggregate>(conn)
        .await?;

    Ok(ListingParts {
        rows,
        categories,
        aggregates,
    })
}

fn rating_summary(aggregate: Option<&RatingAggregate>) -> Result<RatingSummary, String> {
    let Some((_, count, total)) = aggregate else {
        return Ok(RatingSummary::EMPTY);
    };
    Ok(RatingSummary::new(
        to_count(*count, "review_count")?,
        to_count(total.unwrap_or(0), "rating_total")?,
    ))
}

fn assemble_listings(parts: ListingParts) -> Result<Vec<ItemListing>, CatalogueRepositoryError> {
    let names: HashMap<i64, String> = parts
        .categories
        .into_iter()
        .map(|row| (row.id, row.name))
        .collect();
    let aggregates: HashMap<i64, RatingAggregate> = parts
        .aggregates
        .into_iter()
        .map(|aggregate| (aggregate.0, aggregate))
        .collect();

    let listings = parts.rows.into_iter().map(|row| {
        let category_name = names
            .get(&row.category_id)
            .cloned()
            .ok_or_else(|| format!("item {} references missing category", row.id))?;
        let rating = rating_summary(aggregates.get(&row.id))?;
        let item = Item::try_from(row)?;
        Ok(ItemListing {
            item,
            category_name,
            rating,
        })
    });
    collect_rows(listings, map_row_error)
}

fn to_category(row: CategoryRow) -> Result<Category, CatalogueRepositoryError> {
    Category::try_from(row).map_err(map_row_error)
}

fn to_item(row: ItemRow) -> Result<Item, CatalogueRepositoryError> {
    Item::try_from(row).map_err(map_row_error)
}

fn item_fields(draft: &ItemDraft) -> ItemFieldsRow<'_> {
    ItemFieldsRow {
        title: &draft.title,
        description: &draft.description,
        category_id: draft.category_id.get(),
    }
}

fn map_item_write_error(
    error: diesel::result::Error,
    category_id: CategoryId,
) -> CatalogueRepositoryError {
    if is_foreign_key_violation(&error) {
        return CatalogueRepositoryError::missing_category(category_id.get());
    }
    map_diesel_error(error)
}

// ---------------------------------------------------------------------------
// Trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl CatalogueRepository for DieselCatalogueRepository {
    async fn list_items(
        &self,
        query: &ItemQuery,
    ) -> Result<CatalogueListing, CatalogueRepositoryError> {
        let predicate = query.predicate().clone();
        let sort = query.sort();
        let page = query.page();
        let offset = to_bigint(page.offset(), "offset").map_err(map_row_error)?;
        let limit = to_bigint(page.limit(), "limit").map_err(map_row_error)?;

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (total, parts) = conn
            .build_transaction()
            .read_only()
            .repeatable_read()
            .run(|conn| {
                async move {
                    let total: i64 = filtered_items(&predicate)
                        .count()
                        .get_result(conn)
                        .await?;
                    let rows: Vec<ItemRow> =
                        ordered(filtered_items(&predicate), sort.key(), sort.direction())
                            .select(ItemRow::as_select())
                            .offset(offset)
                            .limit(limit)
                            .load(conn)
                            .await?;
                    let parts = load_listing_parts(conn, rows).await?;
                    Ok::<_, diesel::result::Error>((total, parts))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(CatalogueListing {
            items: assemble_listings(parts)?,
            total_count: to_count(total, "total_count").map_err(map_row_error)?,
        })
    }

    async fn find_listing(
        &self,
        id: ItemId,
    ) -> Result<Option<ItemListing>, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let parts = conn
            .transaction(|conn| {
                async move {
                    let rows: Vec<ItemRow> = items::table
                        .find(id.get())
                        .select(ItemRow::as_select())
                        .load(conn)
                        .await?;
                    load_listing_parts(conn, rows).await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Ok(assemble_listings(parts)?.into_iter().next())
    }

    async fn find_item(&self, id: ItemId) -> Result<Option<Item>, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ItemRow> = items::table
            .find(id.get())
            .select(ItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_item).transpose()
    }

    async fn find_category(
        &self,
        id: CategoryId,
    ) -> Result<Option<Category>, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CategoryRow> = categories::table
            .find(id.get())
            .select(CategoryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_category).transpose()
    }

    async fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Category>, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CategoryRow> = categories::table
            .filter(categories::name.eq(name))
            .select(CategoryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_category).transpose()
    }

    async fn insert_category(&self, name: &str) -> Result<Category, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: CategoryRow = diesel::insert_into(categories::table)
            .values(&NewCategoryRow { name })
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| {
                if is_unique_violation(&error) {
                    CatalogueRepositoryError::duplicate_category(name)
                } else {
                    map_diesel_error(error)
                }
            })?;
        to_category(row)
    }

    async fn rename_category(
        &self,
        id: CategoryId,
        name: &str,
    ) -> Result<Option<Category>, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CategoryRow> = diesel::update(categories::table.find(id.get()))
            .set(categories::name.eq(name))
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|error| {
                if is_unique_violation(&error) {
                    CatalogueRepositoryError::duplicate_category(name)
                } else {
                    map_diesel_error(error)
                }
            })?;
        row.map(to_category).transpose()
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(categories::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(|error| {
                if is_foreign_key_violation(&error) {
                    CatalogueRepositoryError::category_in_use(id.get())
                } else {
                    map_diesel_error(error)
                }
            })?;
        Ok(deleted > 0)
    }

    async fn count_items_in_category(
        &self,
        id: CategoryId,
    ) -> Result<u64, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = items::table
            .filter(items::category_id.eq(id.get()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        to_count(count, "item_count").map_err(map_row_error)
    }

    async fn insert_item(&self, draft: &ItemDraft) -> Result<Item, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: ItemRow = diesel::insert_into(items::table)
            .values(&item_fields(draft))
            .returning(ItemRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| map_item_write_error(error, draft.category_id))?;
        to_item(row)
    }

    async fn update_item(
        &self,
        id: ItemId,
        draft: &ItemDraft,
    ) -> Result<Option<Item>, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ItemRow> = diesel::update(items::table.find(id.get()))
            .set(&item_fields(draft))
            .returning(ItemRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|error| map_item_write_error(error, draft.category_id))?;
        row.map(to_item).transpose()
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // Reviews, comments and tag links go with the item via ON DELETE CASCADE.
        let deleted = diesel::delete(items::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
