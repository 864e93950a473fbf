//! Driving port for catalogue browsing.
//!
//! Callers pass raw filter input; implementations validate it, run the
//! narrowed query and return item views with derived ratings and tags.

use async_trait::async_trait;

use crate::domain::{Error, ItemFilter, ItemId, ItemPage, ItemView};

/// Domain use-case port for querying the catalogue.
#[async_trait]
pub trait CatalogueQuery: Send + Sync {
    /// Filter, sort and page items.
    ///
    /// Fails with [`crate::domain::ErrorCode::InvalidRequest`] only for an
    /// unrecognised sort key; paging input is clamped.
    async fn query_items(&self, filter: ItemFilter) -> Result<ItemPage, Error>;

    /// Fetch a single item view.
    async fn get_item(&self, id: ItemId) -> Result<ItemView, Error>;
}
