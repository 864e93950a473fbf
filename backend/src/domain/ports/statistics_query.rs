//! Driving port for platform statistics.
use async_trait::async_trait;

use crate::domain::{Error, StatsView};

/// Domain use-case port for the statistics dashboard.
#[async_trait]
pub trait StatisticsQuery: Send + Sync {
    /// Compute all four views afresh.
    async fn get_stats(&self) -> Result<StatsView, Error>;
}
