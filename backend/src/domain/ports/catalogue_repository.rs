//! Port abstraction for category and item persistence.
//!
//! Adapters evaluate [`ItemQuery`] predicates and orderings themselves; the
//! domain only assembles the resulting listings into views.

use async_trait::async_trait;

use crate::domain::{Category, CategoryId, Item, ItemDraft, ItemId, ItemListing, ItemQuery};

use super::define_port_error;

define_port_error! {
    /// Errors raised by catalogue repository adapters.
    pub enum CatalogueRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "catalogue repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "catalogue repository query failed: {message}",
        /// A category with the same name already exists.
        DuplicateCategory { name: String } => "category already exists: {name}",
        /// The category still owns items.
        CategoryInUse { category_id: i64 } => "category {category_id} still has items",
        /// The referenced category does not exist.
        MissingCategory { category_id: i64 } => "category {category_id} does not exist",
    }
}

/// One page of matching items and the size of the whole narrowed set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogueListing {
    /// Matching items for the requested page, already ordered.
    pub items: Vec<ItemListing>,
    /// Number of matching items before paging.
    pub total_count: u64,
}

/// Port for reading and writing categories and items.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueRepository: Send + Sync {
    /// Narrow, order and page items according to `query`.
    async fn list_items(&self, query: &ItemQuery)
    -> Result<CatalogueListing, CatalogueRepositoryError>;

    /// Fetch one item with its category name and rating aggregate.
    async fn find_listing(
        &self,
        id: ItemId,
    ) -> Result<Option<ItemListing>, CatalogueRepositoryError>;

    /// Fetch an item by identifier.
    async fn find_item(&self, id: ItemId) -> Result<Option<Item>, CatalogueRepositoryError>;

    /// Fetch a category by identifier.
    async fn find_category(
        &self,
        id: CategoryId,
    ) -> Result<Option<Category>, CatalogueRepositoryError>;

    /// Fetch a category by exact, case-sensitive name.
    async fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Category>, CatalogueRepositoryError>;

    /// Insert a category.
    ///
    /// Returns [`CatalogueRepositoryError::DuplicateCategory`] when the name
    /// is taken.
    async fn insert_category(&self, name: &str) -> Result<Category, CatalogueRepositoryError>;

    /// Rename a category, returning `None` when it does not exist.
    async fn rename_category(
        &self,
        id: CategoryId,
        name: &str,
    ) -> Result<Option<Category>, CatalogueRepositoryError>;

    /// Delete a category, returning whether a row was removed.
    ///
    /// Returns [`CatalogueRepositoryError::CategoryInUse`] when items still
    /// reference it.
    async fn delete_category(&self, id: CategoryId) -> Result<bool, CatalogueRepositoryError>;

    /// Number of items owned by a category.
    async fn count_items_in_category(&self, id: CategoryId)
    -> Result<u64, CatalogueRepositoryError>;

    /// Insert an item.
    async fn insert_item(&self, draft: &ItemDraft) -> Result<Item, CatalogueRepositoryError>;

    /// Replace an item's fields, returning `None` when it does not exist.
    async fn update_item(
        &self,
        id: ItemId,
        draft: &ItemDraft,
    ) -> Result<Option<Item>, CatalogueRepositoryError>;

    /// Delete an item with its reviews, comments and tag links.
    async fn delete_item(&self, id: ItemId) -> Result<bool, CatalogueRepositoryError>;
}
