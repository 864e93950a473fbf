//! Port abstraction for the aggregate reads behind platform statistics.
use async_trait::async_trait;

use crate::domain::StatisticsSnapshot;

use super::define_port_error;

define_port_error! {
    /// Errors raised by statistics repository adapters.
    pub enum StatisticsRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "statistics repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "statistics repository query failed: {message}",
    }
}

/// Port for reading review aggregates.
///
/// Implementations read every part of the snapshot from one consistent state
/// of the store, so the derived views never disagree with each other. Each
/// candidate list may be cut down to its `limit` leaders, provided the cut
/// uses the orderings of [`crate::domain::statistics`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatisticsRepository: Send + Sync {
    /// Read at least the `limit` leading candidates of every view.
    async fn snapshot(
        &self,
        limit: usize,
    ) -> Result<StatisticsSnapshot, StatisticsRepositoryError>;
}
