//! PostgreSQL-backed statistics adapter.
//!
//! Leaderboards are ranked and cut in SQL with the same orderings the domain
//! applies, so each read returns at most `limit` rows per view however large
//! the catalogue grows. Every read runs inside one repeatable-read, read-only
//! transaction so the views describe the same state of the store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text, Uuid as SqlUuid};
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{StatisticsRepository, StatisticsRepositoryError};
use crate::domain::{
    ItemId, ItemRatingRow, Rating, RatingSummary, RecentReviewRow, ReviewId, ReviewerRow, Role,
    StatisticsSnapshot, TOP_RATED_MIN_REVIEWS, UserId,
};

use super::diesel_helpers::{
    is_connection_error, map_diesel_error_message, map_pool_error_message, to_bigint, to_count,
};
use super::models::UserRoleRow;
use super::pool::{DbPool, PoolError};
use super::schema::{items, reviews, user_roles, users};

/// Items with at least `$1` reviews, best average first.
const TOP_RATED_SQL: &str = r#"
SELECT i.id AS item_id, i.title AS title,
       COUNT(r.id) AS review_count,
       COALESCE(SUM(r.rating), 0)::bigint AS rating_total
FROM items i
JOIN reviews r ON r.item_id = i.id
GROUP BY i.id, i.title
HAVING COUNT(r.id) >= $1
ORDER BY SUM(r.rating)::float8 / COUNT(r.id)::float8 DESC, COUNT(r.id) DESC, i.id ASC
LIMIT $2
"#;

/// Items by review count, unreviewed ones included.
const MOST_REVIEWED_SQL: &str = r#"
SELECT i.id AS item_id, i.title AS title,
       COUNT(r.id) AS review_count,
       COALESCE(SUM(r.rating), 0)::bigint AS rating_total
FROM items i
LEFT JOIN reviews r ON r.item_id = i.id
GROUP BY i.id, i.title
ORDER BY COUNT(r.id) DESC, i.id ASC
LIMIT $1
"#;

/// Users by authored review count, ties in byte order of the display name.
const TOP_REVIEWERS_SQL: &str = r#"
SELECT u.id AS user_id, u.display_name AS display_name,
       COUNT(r.id) AS review_count
FROM users u
LEFT JOIN reviews r ON r.user_id = u.id
GROUP BY u.id, u.display_name
ORDER BY COUNT(r.id) DESC, u.display_name COLLATE "C" ASC
LIMIT $1
"#;

/// Diesel-backed implementation of the statistics port.
#[derive(Clone)]
pub struct DieselStatisticsRepository {
    pool: DbPool,
}

impl DieselStatisticsRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> StatisticsRepositoryError {
    StatisticsRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> StatisticsRepositoryError {
    if is_connection_error(&error) {
        return StatisticsRepositoryError::connection(map_diesel_error_message(
            error,
            "statistics",
        ));
    }
    StatisticsRepositoryError::query(map_diesel_error_message(error, "statistics"))
}

fn map_row_error(message: String) -> StatisticsRepositoryError {
    StatisticsRepositoryError::query(format!("invalid statistics row: {message}"))
}

/// One ranked item with its rating aggregate.
#[derive(Debug, QueryableByName)]
struct ItemRankRow {
    #[diesel(sql_type = BigInt)]
    item_id: i64,
    #[diesel(sql_type = Text)]
    title: String,
    #[diesel(sql_type = BigInt)]
    review_count: i64,
    #[diesel(sql_type = BigInt)]
    rating_total: i64,
}

/// One ranked reviewer, roles loaded separately.
#[derive(Debug, QueryableByName)]
struct ReviewerRankRow {
    #[diesel(sql_type = SqlUuid)]
    user_id: Uuid,
    #[diesel(sql_type = Text)]
    display_name: String,
    #[diesel(sql_type = BigInt)]
    review_count: i64,
}

type RecentRow = (i64, i64, String, String, String, i16, DateTime<Utc>);

/// Raw rows read inside the snapshot transaction.
#[derive(Default)]
struct SnapshotRows {
    top_rated: Vec<ItemRankRow>,
    most_reviewed: Vec<ItemRankRow>,
    reviewers: Vec<ReviewerRankRow>,
    roles: Vec<UserRoleRow>,
    recent: Vec<RecentRow>,
}

async fn read_snapshot_rows(
    conn: &mut AsyncPgConnection,
    limit: i64,
    min_reviews: i64,
) -> QueryResult<SnapshotRows> {
    let top_rated = sql_query(TOP_RATED_SQL)
        .bind::<BigInt, _>(min_reviews)
        .bind::<BigInt, _>(limit)
        .load::<ItemRankRow>(conn)
        .await?;
    let most_reviewed = sql_query(MOST_REVIEWED_SQL)
        .bind::<BigInt, _>(limit)
        .load::<ItemRankRow>(conn)
        .await?;
    let reviewers = sql_query(TOP_REVIEWERS_SQL)
        .bind::<BigInt, _>(limit)
        .load::<ReviewerRankRow>(conn)
        .await?;
    let reviewer_ids: Vec<Uuid> = reviewers.iter().map(|row| row.user_id).collect();
    let roles = if reviewer_ids.is_empty() {
        Vec::new()
    } else {
        user_roles::table
            .filter(user_roles::user_id.eq_any(reviewer_ids))
            .order_by((user_roles::user_id.asc(), user_roles::position.asc()))
            .select(UserRoleRow::as_select())
            .load(conn)
            .await?
    };
    let recent = reviews::table
        .inner_join(items::table)
        .inner_join(users::table)
        .order_by((reviews::created_at.desc(), reviews::id.desc()))
        .limit(limit)
        .select((
            reviews::id,
            reviews::item_id,
            items::title,
            users::display_name,
            reviews::title,
            reviews::rating,
            reviews::created_at,
        ))
        .load(conn)
        .await?;

    Ok(SnapshotRows {
        top_rated,
        most_reviewed,
        reviewers,
        roles,
        recent,
    })
}

fn item_ratings(rows: Vec<ItemRankRow>) -> Result<Vec<ItemRatingRow>, String> {
    rows.into_iter()
        .map(|row| {
            Ok(ItemRatingRow {
                item_id: ItemId::new(row.item_id),
                title: row.title,
                rating: RatingSummary::new(
                    to_count(row.review_count, "review_count")?,
                    to_count(row.rating_total, "rating_total")?,
                ),
            })
        })
        .collect()
}

fn reviewers(
    ranked: Vec<ReviewerRankRow>,
    roles: Vec<UserRoleRow>,
) -> Result<Vec<ReviewerRow>, String> {
    let mut roles_by_user: HashMap<Uuid, Vec<Role>> = HashMap::new();
    for row in roles {
        let role = row.role.parse::<Role>().map_err(|err| err.to_string())?;
        roles_by_user.entry(row.user_id).or_default().push(role);
    }

    ranked
        .into_iter()
        .map(|row| {
            Ok(ReviewerRow {
                user_id: UserId::from_uuid(row.user_id),
                display_name: row.display_name,
                roles: roles_by_user.remove(&row.user_id).unwrap_or_default(),
                review_count: to_count(row.review_count, "review_count")?,
            })
        })
        .collect()
}

fn recent_reviews(rows: Vec<RecentRow>) -> Result<Vec<RecentReviewRow>, String> {
    rows.into_iter()
        .map(
            |(review_id, item_id, item_title, author, title, rating, created_at)| {
                Ok(RecentReviewRow {
                    review_id: ReviewId::new(review_id),
                    item_id: ItemId::new(item_id),
                    item_title,
                    author_display_name: author,
                    title,
                    rating: Rating::new(i64::from(rating)).map_err(|err| err.to_string())?,
                    created_at,
                })
            },
        )
        .collect()
}

fn assemble_snapshot(rows: SnapshotRows) -> Result<StatisticsSnapshot, StatisticsRepositoryError> {
    let SnapshotRows {
        top_rated,
        most_reviewed,
        reviewers: ranked,
        roles,
        recent,
    } = rows;
    Ok(StatisticsSnapshot {
        top_rated_candidates: item_ratings(top_rated).map_err(map_row_error)?,
        most_reviewed_candidates: item_ratings(most_reviewed).map_err(map_row_error)?,
        reviewers: reviewers(ranked, roles).map_err(map_row_error)?,
        recent_reviews: recent_reviews(recent).map_err(map_row_error)?,
    })
}

#[async_trait]
impl StatisticsRepository for DieselStatisticsRepository {
    async fn snapshot(&self, limit: usize) -> Result<StatisticsSnapshot, StatisticsRepositoryError> {
        let limit = u64::try_from(limit)
            .map_err(|err| err.to_string())
            .and_then(|limit| to_bigint(limit, "limit"))
            .map_err(map_row_error)?;
        let min_reviews =
            to_bigint(TOP_RATED_MIN_REVIEWS, "min_reviews").map_err(map_row_error)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = conn
            .build_transaction()
            .read_only()
            .repeatable_read()
            .run(|conn| {
                async move { read_snapshot_rows(conn, limit, min_reviews).await }.scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        assemble_snapshot(rows)
    }
}
