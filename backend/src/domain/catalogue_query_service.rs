//! Catalogue query engine.
//!
//! Validates caller filters, asks the catalogue repository for one ordered
//! page of listings, then decorates each listing with its tags and derived
//! average rating.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use pagination::Page;
use serde_json::json;
use tracing::debug;

use crate::domain::port_errors::{map_catalogue_error, map_tag_error};
use crate::domain::ports::{CatalogueQuery, CatalogueRepository, TagRepository};
use crate::domain::{Error, ItemFilter, ItemId, ItemListing, ItemPage, ItemView, TagView};

/// Catalogue query service implementing [`CatalogueQuery`].
#[derive(Clone)]
pub struct CatalogueQueryService<C, T> {
    catalogue_repo: Arc<C>,
    tag_repo: Arc<T>,
}

impl<C, T> CatalogueQueryService<C, T> {
    /// Create a new service with the given repositories.
    pub fn new(catalogue_repo: Arc<C>, tag_repo: Arc<T>) -> Self {
        Self {
            catalogue_repo,
            tag_repo,
        }
    }
}

impl<C, T> CatalogueQueryService<C, T>
where
    C: CatalogueRepository,
    T: TagRepository,
{
    async fn decorate(&self, listings: Vec<ItemListing>) -> Result<Vec<ItemView>, Error> {
        if listings.is_empty() {
            return Ok(Vec::new());
        }
        let item_ids: Vec<ItemId> = listings.iter().map(ItemListing::id).collect();
        let mut tags_by_item: HashMap<ItemId, Vec<TagView>> = HashMap::new();
        for (item_id, tag) in self
            .tag_repo
            .tags_for_items(&item_ids)
            .await
            .map_err(map_tag_error)?
        {
            tags_by_item
                .entry(item_id)
                .or_default()
                .push(TagView::from(tag));
        }

        Ok(listings
            .into_iter()
            .map(|listing| {
                let tags = tags_by_item.remove(&listing.id()).unwrap_or_default();
                ItemView::from_listing(listing, tags)
            })
            .collect())
    }
}

#[async_trait]
impl<C, T> CatalogueQuery for CatalogueQueryService<C, T>
where
    C: CatalogueRepository,
    T: TagRepository,
{
    async fn query_items(&self, filter: ItemFilter) -> Result<ItemPage, Error> {
        let query = filter.into_query().map_err(|err| {
            Error::invalid_request(err.to_string()).with_details(json!({
                "code": "invalid_sort",
                "field": "sortBy",
            }))
        })?;
        debug!(
            search = query.predicate().search(),
            category_id = query.predicate().category_id().map(|id| id.get()),
            tag_count = query.predicate().tag_ids().len(),
            sort = ?query.sort(),
            page = query.page().page(),
            page_size = query.page().page_size(),
            "querying catalogue items"
        );

        let listing = self
            .catalogue_repo
            .list_items(&query)
            .await
            .map_err(map_catalogue_error)?;
        let views = self.decorate(listing.items).await?;
        Ok(Page::new(views, listing.total_count, query.page()))
    }

    async fn get_item(&self, id: ItemId) -> Result<ItemView, Error> {
        let listing = self
            .catalogue_repo
            .find_listing(id)
            .await
            .map_err(map_catalogue_error)?
            .ok_or_else(|| {
                Error::not_found("item not found")
                    .with_details(json!({ "code": "item_not_found", "itemId": id }))
            })?;
        let mut views = self.decorate(vec![listing]).await?;
        views
            .pop()
            .ok_or_else(|| Error::internal("item view assembly lost the item"))
    }
}
