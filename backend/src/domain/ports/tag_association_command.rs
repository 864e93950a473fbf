//! Driving port for attaching and detaching tags.
use async_trait::async_trait;

use crate::domain::{Actor, Error, ItemId, TagView};

/// Domain use-case port for tag management on items.
#[async_trait]
pub trait TagAssociationCommand: Send + Sync {
    /// Attach a tag by name, creating the tag when no spelling of it exists.
    ///
    /// Reports `AlreadyAttached` when the item already carries the tag.
    async fn attach_tag(
        &self,
        item_id: ItemId,
        tag_name: String,
        actor: &Actor,
    ) -> Result<TagView, Error>;

    /// Detach a tag by name. The tag itself is kept.
    ///
    /// Reports `NotFound` with detail code `tag_not_found` for an unknown
    /// name and `NotAttached` when the item does not carry the tag.
    async fn detach_tag(&self, item_id: ItemId, tag_name: String, actor: &Actor)
    -> Result<(), Error>;

    /// Tags attached to an item, ordered by name.
    async fn tags_for_item(&self, item_id: ItemId) -> Result<Vec<TagView>, Error>;
}
