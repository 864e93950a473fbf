//! Port abstraction for tags and their item attachments.
use async_trait::async_trait;

use crate::domain::{ItemId, Tag, TagId, TagName};

use super::define_port_error;

define_port_error! {
    /// Errors raised by tag repository adapters.
    pub enum TagRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "tag repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "tag repository query failed: {message}",
        /// Another tag already uses this name, ignoring case.
        DuplicateName { name: String } => "tag already exists: {name}",
        /// The item and tag are already linked.
        AlreadyLinked => "tag already linked to item",
    }
}

/// Port for tag records and the item/tag junction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Find a tag whose name equals `name` ignoring case.
    async fn find_by_name(&self, name: &TagName) -> Result<Option<Tag>, TagRepositoryError>;

    /// Insert a tag with the given spelling.
    async fn insert(&self, name: &TagName) -> Result<Tag, TagRepositoryError>;

    /// Whether the item carries the tag.
    async fn is_linked(&self, item_id: ItemId, tag_id: TagId) -> Result<bool, TagRepositoryError>;

    /// Attach the tag to the item.
    async fn link(&self, item_id: ItemId, tag_id: TagId) -> Result<(), TagRepositoryError>;

    /// Detach the tag, returning whether a link was removed. The tag survives.
    async fn unlink(&self, item_id: ItemId, tag_id: TagId) -> Result<bool, TagRepositoryError>;

    /// Tags attached to any of `item_ids`, paired with the owning item.
    async fn tags_for_items(
        &self,
        item_ids: &[ItemId],
    ) -> Result<Vec<(ItemId, Tag)>, TagRepositoryError>;
}
