//! Driving port for administrator changes to categories and items.
use async_trait::async_trait;

use crate::domain::{Actor, Category, CategoryId, Error, Item, ItemId};

/// Raw item fields supplied by an administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInput {
    /// Item title; must not be blank.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Owning category; must exist.
    pub category_id: CategoryId,
}

/// Domain use-case port for catalogue administration. Every operation
/// requires the admin role.
#[async_trait]
pub trait CatalogueAdminCommand: Send + Sync {
    /// Create a category with a unique name.
    async fn create_category(&self, actor: &Actor, name: String) -> Result<Category, Error>;

    /// Rename a category.
    async fn rename_category(
        &self,
        actor: &Actor,
        id: CategoryId,
        name: String,
    ) -> Result<Category, Error>;

    /// Delete an empty category.
    async fn delete_category(&self, actor: &Actor, id: CategoryId) -> Result<(), Error>;

    /// Create an item in an existing category.
    async fn create_item(&self, actor: &Actor, input: ItemInput) -> Result<Item, Error>;

    /// Replace an item's fields.
    async fn update_item(&self, actor: &Actor, id: ItemId, input: ItemInput)
    -> Result<Item, Error>;

    /// Delete an item along with its reviews and tag links.
    async fn delete_item(&self, actor: &Actor, id: ItemId) -> Result<(), Error>;
}
