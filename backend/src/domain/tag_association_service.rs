//! Tag association manager.
//!
//! Administrators attach free-form tags to items by name. Names resolve to a
//! single tag case-insensitively; a missing tag is created on first use and
//! reused for every later spelling.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::port_errors::{map_catalogue_error, map_tag_error};
use crate::domain::ports::{
    CatalogueRepository, TagAssociationCommand, TagRepository, TagRepositoryError,
};
use crate::domain::{Actor, Error, ItemId, Tag, TagName, TagView, sort_tag_views};

/// Tag association service implementing [`TagAssociationCommand`].
#[derive(Clone)]
pub struct TagAssociationService<C, T> {
    catalogue_repo: Arc<C>,
    tag_repo: Arc<T>,
}

fn parse_tag_name(raw: String) -> Result<TagName, Error> {
    TagName::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({
            "code": "invalid_tag_name",
            "field": "tagName",
        }))
    })
}

impl<C, T> TagAssociationService<C, T> {
    /// Create a new service with the given repositories.
    pub fn new(catalogue_repo: Arc<C>, tag_repo: Arc<T>) -> Self {
        Self {
            catalogue_repo,
            tag_repo,
        }
    }
}

impl<C, T> TagAssociationService<C, T>
where
    C: CatalogueRepository,
    T: TagRepository,
{
    async fn ensure_item_exists(&self, item_id: ItemId) -> Result<(), Error> {
        let found = self
            .catalogue_repo
            .find_item(item_id)
            .await
            .map_err(map_catalogue_error)?;
        if found.is_none() {
            return Err(Error::not_found("item not found")
                .with_details(json!({ "code": "item_not_found", "itemId": item_id })));
        }
        Ok(())
    }

    /// Resolve `name` to its tag, creating the tag when none matches.
    ///
    /// When a concurrent writer inserts the same name first, the lookup is
    /// repeated once and the winner's tag is returned.
    pub async fn find_or_create_tag(&self, name: &TagName) -> Result<Tag, Error> {
        if let Some(tag) = self
            .tag_repo
            .find_by_name(name)
            .await
            .map_err(map_tag_error)?
        {
            return Ok(tag);
        }

        match self.tag_repo.insert(name).await {
            Ok(tag) => {
                info!(tag_id = %tag.id(), tag_name = %tag.name(), "created tag");
                Ok(tag)
            }
            Err(TagRepositoryError::DuplicateName { .. }) => {
                debug!(tag_name = %name, "tag created concurrently; re-reading");
                self.tag_repo
                    .find_by_name(name)
                    .await
                    .map_err(map_tag_error)?
                    .ok_or_else(|| {
                        map_tag_error(TagRepositoryError::duplicate_name(name.to_string()))
                    })
            }
            Err(other) => Err(map_tag_error(other)),
        }
    }

    /// Link `tag` to `item_id` unless the pair already exists.
    pub async fn link_if_absent(&self, item_id: ItemId, tag: &Tag) -> Result<(), Error> {
        let linked = self
            .tag_repo
            .is_linked(item_id, tag.id())
            .await
            .map_err(map_tag_error)?;
        if linked {
            return Err(already_attached(item_id, tag));
        }
        self.tag_repo
            .link(item_id, tag.id())
            .await
            .map_err(|err| match err {
                TagRepositoryError::AlreadyLinked => already_attached(item_id, tag),
                other => map_tag_error(other),
            })
    }
}

fn already_attached(item_id: ItemId, tag: &Tag) -> Error {
    Error::already_attached(format!("tag {} is already attached", tag.name())).with_details(
        json!({
            "code": "already_attached",
            "itemId": item_id,
            "tagId": tag.id(),
        }),
    )
}

#[async_trait]
impl<C, T> TagAssociationCommand for TagAssociationService<C, T>
where
    C: CatalogueRepository,
    T: TagRepository,
{
    async fn attach_tag(
        &self,
        item_id: ItemId,
        tag_name: String,
        actor: &Actor,
    ) -> Result<TagView, Error> {
        actor.require_admin("attach tag")?;
        let name = parse_tag_name(tag_name)?;
        self.ensure_item_exists(item_id).await?;

        let tag = self.find_or_create_tag(&name).await?;
        self.link_if_absent(item_id, &tag).await?;
        info!(%item_id, tag_id = %tag.id(), "attached tag to item");
        Ok(TagView::from(tag))
    }

    async fn detach_tag(&self, item_id: ItemId, tag_name: String, actor: &Actor) -> Result<(), Error> {
        actor.require_admin("detach tag")?;
        let name = parse_tag_name(tag_name)?;
        self.ensure_item_exists(item_id).await?;

        let tag = self
            .tag_repo
            .find_by_name(&name)
            .await
            .map_err(map_tag_error)?
            .ok_or_else(|| {
                Error::not_found(format!("tag {name} does not exist")).with_details(json!({
                    "code": "tag_not_found",
                    "tagName": name.as_ref(),
                }))
            })?;

        let linked = self
            .tag_repo
            .is_linked(item_id, tag.id())
            .await
            .map_err(map_tag_error)?;
        if !linked {
            return Err(not_attached(item_id, &tag));
        }
        let removed = self
            .tag_repo
            .unlink(item_id, tag.id())
            .await
            .map_err(map_tag_error)?;
        if !removed {
            return Err(not_attached(item_id, &tag));
        }
        info!(%item_id, tag_id = %tag.id(), "detached tag from item");
        Ok(())
    }

    async fn tags_for_item(&self, item_id: ItemId) -> Result<Vec<TagView>, Error> {
        self.ensure_item_exists(item_id).await?;
        let mut views: Vec<TagView> = self
            .tag_repo
            .tags_for_items(&[item_id])
            .await
            .map_err(map_tag_error)?
            .into_iter()
            .map(|(_, tag)| TagView::from(tag))
            .collect();
        sort_tag_views(&mut views);
        Ok(views)
    }
}

fn not_attached(item_id: ItemId, tag: &Tag) -> Error {
    Error::not_attached(format!("tag {} is not attached", tag.name())).with_details(json!({
        "code": "not_attached",
        "itemId": item_id,
        "tagId": tag.id(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockCatalogueRepository, MockTagRepository};
    use crate::domain::{CategoryId, ErrorCode, Item, Role, TagId, UserId};
    use mockall::predicate::eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn admin() -> Actor {
        Actor::new(UserId::random(), Role::Admin)
    }

    fn item(id: i64) -> Item {
        Item::new(ItemId::new(id), "Heat", "", CategoryId::new(1)).expect("valid item")
    }

    fn tag(id: i64, name: &str) -> Tag {
        Tag::new(TagId::new(id), TagName::new(name).expect("valid tag"))
    }

    fn catalogue_with_item(id: i64) -> MockCatalogueRepository {
        let mut catalogue = MockCatalogueRepository::new();
        catalogue
            .expect_find_item()
            .with(eq(ItemId::new(id)))
            .returning(move |_| Ok(Some(item(id))));
        catalogue
    }

    fn service(
        catalogue: MockCatalogueRepository,
        tags: MockTagRepository,
    ) -> TagAssociationService<MockCatalogueRepository, MockTagRepository> {
        TagAssociationService::new(Arc::new(catalogue), Arc::new(tags))
    }

    #[rstest]
    #[tokio::test]
    async fn attach_creates_missing_tag_and_links_it(admin: Actor) {
        let mut tags = MockTagRepository::new();
        tags.expect_find_by_name().times(1).return_once(|_| Ok(None));
        tags.expect_insert()
            .withf(|name: &TagName| name.as_ref() == "Drama")
            .times(1)
            .return_once(|name| Ok(Tag::new(TagId::new(4), name.clone())));
        tags.expect_is_linked().return_once(|_, _| Ok(false));
        tags.expect_link()
            .with(eq(ItemId::new(1)), eq(TagId::new(4)))
            .times(1)
            .return_once(|_, _| Ok(()));

        let view = service(catalogue_with_item(1), tags)
            .attach_tag(ItemId::new(1), " Drama ".to_owned(), &admin)
            .await
            .expect("attach succeeds");
        assert_eq!(view.id, TagId::new(4));
        assert_eq!(view.name, "Drama");
    }

    #[rstest]
    #[tokio::test]
    async fn attach_reuses_existing_tag_regardless_of_case(admin: Actor) {
        let mut tags = MockTagRepository::new();
        tags.expect_find_by_name()
            .return_once(|_| Ok(Some(tag(4, "Drama"))));
        tags.expect_insert().times(0);
        tags.expect_is_linked().return_once(|_, _| Ok(false));
        tags.expect_link().return_once(|_, _| Ok(()));

        let view = service(catalogue_with_item(2), tags)
            .attach_tag(ItemId::new(2), "DRAMA".to_owned(), &admin)
            .await
            .expect("attach succeeds");
        assert_eq!(view.name, "Drama");
    }

    #[rstest]
    #[tokio::test]
    async fn attach_rejects_existing_association(admin: Actor) {
        let mut tags = MockTagRepository::new();
        tags.expect_find_by_name()
            .return_once(|_| Ok(Some(tag(4, "Drama"))));
        tags.expect_is_linked().return_once(|_, _| Ok(true));
        tags.expect_link().times(0);

        let error = service(catalogue_with_item(1), tags)
            .attach_tag(ItemId::new(1), "drama".to_owned(), &admin)
            .await
            .expect_err("duplicate link");
        assert_eq!(error.code(), ErrorCode::AlreadyAttached);
    }

    #[rstest]
    #[tokio::test]
    async fn racing_link_insert_still_reports_already_attached(admin: Actor) {
        let mut tags = MockTagRepository::new();
        tags.expect_find_by_name()
            .return_once(|_| Ok(Some(tag(4, "Drama"))));
        tags.expect_is_linked().return_once(|_, _| Ok(false));
        tags.expect_link()
            .return_once(|_, _| Err(TagRepositoryError::already_linked()));

        let error = service(catalogue_with_item(1), tags)
            .attach_tag(ItemId::new(1), "drama".to_owned(), &admin)
            .await
            .expect_err("duplicate link");
        assert_eq!(error.code(), ErrorCode::AlreadyAttached);
    }

    #[rstest]
    #[tokio::test]
    async fn concurrent_tag_creation_resolves_to_the_winner(admin: Actor) {
        let mut tags = MockTagRepository::new();
        let mut seq = mockall::Sequence::new();
        tags.expect_find_by_name()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| Ok(None));
        tags.expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| Err(TagRepositoryError::duplicate_name("drama")));
        tags.expect_find_by_name()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| Ok(Some(tag(9, "Drama"))));
        tags.expect_is_linked().return_once(|_, _| Ok(false));
        tags.expect_link().return_once(|_, _| Ok(()));

        let view = service(catalogue_with_item(1), tags)
            .attach_tag(ItemId::new(1), "drama".to_owned(), &admin)
            .await
            .expect("attach succeeds");
        assert_eq!(view.id, TagId::new(9));
    }

    #[rstest]
    #[case(Role::User)]
    #[case(Role::Moderator)]
    #[tokio::test]
    async fn only_admins_manage_tags(#[case] role: Role) {
        let actor = Actor::new(UserId::random(), role);
        let mut catalogue = MockCatalogueRepository::new();
        catalogue.expect_find_item().times(0);
        let svc = service(catalogue, MockTagRepository::new());

        let attach = svc
            .attach_tag(ItemId::new(1), "drama".to_owned(), &actor)
            .await
            .expect_err("forbidden");
        assert_eq!(attach.code(), ErrorCode::Forbidden);
        let detach = svc
            .detach_tag(ItemId::new(1), "drama".to_owned(), &actor)
            .await
            .expect_err("forbidden");
        assert_eq!(detach.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn blank_tag_names_are_rejected(admin: Actor) {
        let error = service(MockCatalogueRepository::new(), MockTagRepository::new())
            .attach_tag(ItemId::new(1), "   ".to_owned(), &admin)
            .await
            .expect_err("blank name");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn attach_to_missing_item_is_not_found(admin: Actor) {
        let mut catalogue = MockCatalogueRepository::new();
        catalogue.expect_find_item().return_once(|_| Ok(None));
        let error = service(catalogue, MockTagRepository::new())
            .attach_tag(ItemId::new(8), "drama".to_owned(), &admin)
            .await
            .expect_err("missing item");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn detach_unknown_tag_is_not_found(admin: Actor) {
        let mut tags = MockTagRepository::new();
        tags.expect_find_by_name().return_once(|_| Ok(None));
        tags.expect_insert().times(0);

        let error = service(catalogue_with_item(1), tags)
            .detach_tag(ItemId::new(1), "drama".to_owned(), &admin)
            .await
            .expect_err("unknown tag");
        assert_eq!(error.code(), ErrorCode::NotFound);
        assert_eq!(
            error.details(),
            Some(&json!({ "code": "tag_not_found", "tagName": "drama" }))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn detach_unlinked_tag_is_not_attached(admin: Actor) {
        let mut tags = MockTagRepository::new();
        tags.expect_find_by_name()
            .return_once(|_| Ok(Some(tag(4, "Drama"))));
        tags.expect_is_linked().return_once(|_, _| Ok(false));
        tags.expect_unlink().times(0);

        let error = service(catalogue_with_item(1), tags)
            .detach_tag(ItemId::new(1), "drama".to_owned(), &admin)
            .await
            .expect_err("not attached");
        assert_eq!(error.code(), ErrorCode::NotAttached);
    }

    #[rstest]
    #[tokio::test]
    async fn detach_removes_link_but_keeps_tag(admin: Actor) {
        let mut tags = MockTagRepository::new();
        tags.expect_find_by_name()
            .return_once(|_| Ok(Some(tag(4, "Drama"))));
        tags.expect_is_linked().return_once(|_, _| Ok(true));
        tags.expect_unlink()
            .with(eq(ItemId::new(1)), eq(TagId::new(4)))
            .times(1)
            .return_once(|_, _| Ok(true));

        service(catalogue_with_item(1), tags)
            .detach_tag(ItemId::new(1), "DRAMA".to_owned(), &admin)
            .await
            .expect("detach succeeds");
    }

    #[rstest]
    #[tokio::test]
    async fn tags_for_item_are_sorted_by_name() {
        let mut tags = MockTagRepository::new();
        tags.expect_tags_for_items().return_once(|_| {
            Ok(vec![
                (ItemId::new(1), tag(2, "thriller")),
                (ItemId::new(1), tag(5, "crime")),
            ])
        });
        let views = service(catalogue_with_item(1), tags)
            .tags_for_item(ItemId::new(1))
            .await
            .expect("listing succeeds");
        let names: Vec<&str> = views.iter().map(|view| view.name.as_str()).collect();
        assert_eq!(names, vec!["crime", "thriller"]);
    }
}
