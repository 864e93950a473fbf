//! Statistics aggregator service.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::port_errors::map_statistics_error;
use crate::domain::ports::{StatisticsQuery, StatisticsRepository};
use crate::domain::{Error, LEADERBOARD_SIZE, StatsView};

/// Statistics service implementing [`StatisticsQuery`].
#[derive(Clone)]
pub struct StatisticsService<S> {
    statistics_repo: Arc<S>,
}

impl<S> StatisticsService<S> {
    /// Create a new service with the given repository.
    pub fn new(statistics_repo: Arc<S>) -> Self {
        Self { statistics_repo }
    }
}

#[async_trait]
impl<S> StatisticsQuery for StatisticsService<S>
where
    S: StatisticsRepository,
{
    async fn get_stats(&self) -> Result<StatsView, Error> {
        let snapshot = self
            .statistics_repo
            .snapshot(LEADERBOARD_SIZE)
            .await
            .map_err(map_statistics_error)?;
        debug!(
            top_rated = snapshot.top_rated_candidates.len(),
            most_reviewed = snapshot.most_reviewed_candidates.len(),
            reviewers = snapshot.reviewers.len(),
            recent = snapshot.recent_reviews.len(),
            "computing statistics"
        );
        Ok(StatsView::from_snapshot(snapshot))
    }
}
