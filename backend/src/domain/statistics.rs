//! Leaderboards and recent activity derived from a store snapshot.
//!
//! The store hands over candidate rows per view ([`StatisticsSnapshot`]).
//! Ranking, thresholds and tie-breaks are applied here to whatever the store
//! returns, so a store may either hand over everything or pre-rank in its own
//! query language and send only the leaders.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AverageRating, ItemId, Rating, RatingSummary, ReviewId, Role, UserId, primary_role};

/// Length of every leaderboard.
pub const LEADERBOARD_SIZE: usize = 5;
/// Reviews an item needs before it may appear among the top rated.
pub const TOP_RATED_MIN_REVIEWS: u64 = 3;

/// Rating aggregate for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRatingRow {
    pub item_id: ItemId,
    pub title: String,
    pub rating: RatingSummary,
}

/// Authored review count for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerRow {
    pub user_id: UserId,
    pub display_name: String,
    /// Assigned roles in assignment order.
    pub roles: Vec<Role>,
    pub review_count: u64,
}

/// A recent review joined with its author and item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentReviewRow {
    pub review_id: ReviewId,
    pub item_id: ItemId,
    pub item_title: String,
    pub author_display_name: String,
    pub title: String,
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
}

/// Candidate rows for each view, read from one consistent store state.
///
/// Each list must contain at least the leaders of its view under the
/// orderings below; extra rows are ranked away.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    /// Items that may rank among the top rated.
    pub top_rated_candidates: Vec<ItemRatingRow>,
    /// Items that may rank among the most reviewed, unreviewed ones included.
    pub most_reviewed_candidates: Vec<ItemRatingRow>,
    /// Users that may rank among the top reviewers.
    pub reviewers: Vec<ReviewerRow>,
    /// The newest reviews.
    pub recent_reviews: Vec<RecentReviewRow>,
}

/// Leaderboard entry for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStat {
    pub item_id: ItemId,
    pub title: String,
    pub review_count: u64,
    pub average_rating: AverageRating,
}

impl From<&ItemRatingRow> for ItemStat {
    fn from(row: &ItemRatingRow) -> Self {
        Self {
            item_id: row.item_id,
            title: row.title.clone(),
            review_count: row.rating.review_count(),
            average_rating: row.rating.average(),
        }
    }
}

/// Leaderboard entry for a reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerStat {
    pub user_id: UserId,
    pub display_name: String,
    /// First assigned role, `user` when none.
    pub role: Role,
    pub review_count: u64,
}

/// Recent review as shown on the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentReviewView {
    pub review_id: ReviewId,
    pub item_id: ItemId,
    pub item_title: String,
    pub author: String,
    pub title: String,
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
}

impl From<RecentReviewRow> for RecentReviewView {
    fn from(row: RecentReviewRow) -> Self {
        Self {
            review_id: row.review_id,
            item_id: row.item_id,
            item_title: row.item_title,
            author: row.author_display_name,
            title: row.title,
            rating: row.rating,
            created_at: row.created_at,
        }
    }
}

/// The four platform statistics views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub top_rated_items: Vec<ItemStat>,
    pub most_reviewed_items: Vec<ItemStat>,
    pub top_reviewers: Vec<ReviewerStat>,
    pub recent_reviews: Vec<RecentReviewView>,
}

impl StatsView {
    /// Rank every view from one snapshot.
    pub fn from_snapshot(snapshot: StatisticsSnapshot) -> Self {
        let StatisticsSnapshot {
            top_rated_candidates,
            most_reviewed_candidates,
            reviewers,
            recent_reviews: recent,
        } = snapshot;
        Self {
            top_rated_items: top_rated(&top_rated_candidates),
            most_reviewed_items: most_reviewed(&most_reviewed_candidates),
            top_reviewers: top_reviewers(&reviewers),
            recent_reviews: recent_reviews(recent),
        }
    }
}

fn by_average_then_count(a: &ItemRatingRow, b: &ItemRatingRow) -> Ordering {
    b.rating
        .average()
        .cmp(&a.rating.average())
        .then_with(|| b.rating.review_count().cmp(&a.rating.review_count()))
        .then_with(|| a.item_id.cmp(&b.item_id))
}

/// Items with at least [`TOP_RATED_MIN_REVIEWS`] reviews, best average first.
pub fn top_rated(rows: &[ItemRatingRow]) -> Vec<ItemStat> {
    let mut eligible: Vec<&ItemRatingRow> = rows
        .iter()
        .filter(|row| row.rating.review_count() >= TOP_RATED_MIN_REVIEWS)
        .collect();
    eligible.sort_by(|a, b| by_average_then_count(a, b));
    eligible
        .into_iter()
        .take(LEADERBOARD_SIZE)
        .map(ItemStat::from)
        .collect()
}

/// Items with the most reviews. Unreviewed items are eligible.
pub fn most_reviewed(rows: &[ItemRatingRow]) -> Vec<ItemStat> {
    let mut ranked: Vec<&ItemRatingRow> = rows.iter().collect();
    ranked.sort_by(|a, b| {
        b.rating
            .review_count()
            .cmp(&a.rating.review_count())
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    ranked
        .into_iter()
        .take(LEADERBOARD_SIZE)
        .map(ItemStat::from)
        .collect()
}

/// Users who wrote the most reviews, ties broken by display name.
pub fn top_reviewers(rows: &[ReviewerRow]) -> Vec<ReviewerStat> {
    let mut ranked: Vec<&ReviewerRow> = rows.iter().collect();
    ranked.sort_by(|a, b| {
        b.review_count
            .cmp(&a.review_count)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
    ranked
        .into_iter()
        .take(LEADERBOARD_SIZE)
        .map(|row| ReviewerStat {
            user_id: row.user_id.clone(),
            display_name: row.display_name.clone(),
            role: primary_role(&row.roles),
            review_count: row.review_count,
        })
        .collect()
}

/// The newest reviews platform-wide, ties broken by descending id.
pub fn recent_reviews(mut rows: Vec<RecentReviewRow>) -> Vec<RecentReviewView> {
    rows.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.review_id.cmp(&a.review_id))
    });
    rows.into_iter()
        .take(LEADERBOARD_SIZE)
        .map(RecentReviewView::from)
        .collect()
}
