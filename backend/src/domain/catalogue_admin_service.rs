//! Administrator maintenance of categories and items.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::port_errors::map_catalogue_error;
use crate::domain::ports::{CatalogueAdminCommand, CatalogueRepository, ItemInput};
use crate::domain::{
    Actor, CatalogueValidationError, Category, CategoryId, Error, Item, ItemDraft, ItemId,
};

/// Catalogue administration service implementing [`CatalogueAdminCommand`].
#[derive(Clone)]
pub struct CatalogueAdminService<C> {
    catalogue_repo: Arc<C>,
}

fn validation_error(err: &CatalogueValidationError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({ "code": "validation_failed" }))
}

fn category_not_found(id: CategoryId) -> Error {
    Error::not_found("category not found")
        .with_details(json!({ "code": "category_not_found", "categoryId": id }))
}

fn item_not_found(id: ItemId) -> Error {
    Error::not_found("item not found").with_details(json!({ "code": "item_not_found", "itemId": id }))
}

impl<C> CatalogueAdminService<C> {
    /// Create a new service with the given repository.
    pub fn new(catalogue_repo: Arc<C>) -> Self {
        Self { catalogue_repo }
    }
}

impl<C> CatalogueAdminService<C>
where
    C: CatalogueRepository,
{
    async fn draft_for(&self, input: ItemInput) -> Result<ItemDraft, Error> {
        let draft = ItemDraft::new(input.title, input.description, input.category_id)
            .map_err(|err| validation_error(&err))?;
        let category = self
            .catalogue_repo
            .find_category(draft.category_id)
            .await
            .map_err(map_catalogue_error)?;
        if category.is_none() {
            return Err(category_not_found(draft.category_id));
        }
        Ok(draft)
    }

    async fn ensure_name_free(&self, name: &str, except: Option<CategoryId>) -> Result<(), Error> {
        let existing = self
            .catalogue_repo
            .find_category_by_name(name)
            .await
            .map_err(map_catalogue_error)?;
        match existing {
            Some(category) if Some(category.id()) != except => {
                Err(Error::conflict(format!("category {name} already exists"))
                    .with_details(json!({ "code": "duplicate_category", "name": name })))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<C> CatalogueAdminCommand for CatalogueAdminService<C>
where
    C: CatalogueRepository,
{
    async fn create_category(&self, actor: &Actor, name: String) -> Result<Category, Error> {
        actor.require_admin("create category")?;
        let name = Category::validate_name(name).map_err(|err| validation_error(&err))?;
        self.ensure_name_free(&name, None).await?;
        let category = self
            .catalogue_repo
            .insert_category(&name)
            .await
            .map_err(map_catalogue_error)?;
        info!(category_id = %category.id(), name = category.name(), "created category");
        Ok(category)
    }

    async fn rename_category(
        &self,
        actor: &Actor,
        id: CategoryId,
        name: String,
    ) -> Result<Category, Error> {
        actor.require_admin("rename category")?;
        let name = Category::validate_name(name).map_err(|err| validation_error(&err))?;
        self.ensure_name_free(&name, Some(id)).await?;
        let category = self
            .catalogue_repo
            .rename_category(id, &name)
            .await
            .map_err(map_catalogue_error)?
            .ok_or_else(|| category_not_found(id))?;
        info!(category_id = %id, name = category.name(), "renamed category");
        Ok(category)
    }

    async fn delete_category(&self, actor: &Actor, id: CategoryId) -> Result<(), Error> {
        actor.require_admin("delete category")?;
        let items = self
            .catalogue_repo
            .count_items_in_category(id)
            .await
            .map_err(map_catalogue_error)?;
        if items > 0 {
            return Err(Error::conflict("category still has items").with_details(json!({
                "code": "category_in_use",
                "categoryId": id,
                "itemCount": items,
            })));
        }
        let removed = self
            .catalogue_repo
            .delete_category(id)
            .await
            .map_err(map_catalogue_error)?;
        if !removed {
            return Err(category_not_found(id));
        }
        info!(category_id = %id, "deleted category");
        Ok(())
    }

    async fn create_item(&self, actor: &Actor, input: ItemInput) -> Result<Item, Error> {
        actor.require_admin("create item")?;
        let draft = self.draft_for(input).await?;
        let item = self
            .catalogue_repo
            .insert_item(&draft)
            .await
            .map_err(map_catalogue_error)?;
        info!(item_id = %item.id(), category_id = %item.category_id(), "created item");
        Ok(item)
    }

    async fn update_item(&self, actor: &Actor, id: ItemId, input: ItemInput) -> Result<Item, Error> {
        actor.require_admin("update item")?;
        let draft = self.draft_for(input).await?;
        let item = self
            .catalogue_repo
            .update_item(id, &draft)
            .await
            .map_err(map_catalogue_error)?
            .ok_or_else(|| item_not_found(id))?;
        info!(item_id = %id, "updated item");
        Ok(item)
    }

    async fn delete_item(&self, actor: &Actor, id: ItemId) -> Result<(), Error> {
        actor.require_admin("delete item")?;
        let removed = self
            .catalogue_repo
            .delete_item(id)
            .await
            .map_err(map_catalogue_error)?;
        if !removed {
            return Err(item_not_found(id));
        }
        info!(item_id = %id, "deleted item");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{CatalogueRepositoryError, MockCatalogueRepository};
    use crate::domain::{ErrorCode, Role, UserId};
    use rstest::{fixture, rstest};

    #[fixture]
    fn admin() -> Actor {
        Actor::new(UserId::random(), Role::Admin)
    }

    fn category(id: i64, name: &str) -> Category {
        Category::new(CategoryId::new(id), name).expect("valid category")
    }

    fn input(title: &str, category_id: i64) -> ItemInput {
        ItemInput {
            title: title.to_owned(),
            description: "A heist film".to_owned(),
            category_id: CategoryId::new(category_id),
        }
    }

    fn service(repo: MockCatalogueRepository) -> CatalogueAdminService<MockCatalogueRepository> {
        CatalogueAdminService::new(Arc::new(repo))
    }

    #[rstest]
    #[tokio::test]
    async fn create_category_trims_and_inserts(admin: Actor) {
        let mut repo = MockCatalogueRepository::new();
        repo.expect_find_category_by_name()
            .withf(|name: &str| name == "Films")
            .return_once(|_| Ok(None));
        repo.expect_insert_category()
            .withf(|name: &str| name == "Films")
            .times(1)
            .return_once(|name| Ok(category(1, name)));

        let created = service(repo)
            .create_category(&admin, "  Films ".to_owned())
            .await
            .expect("category created");
        assert_eq!(created.name(), "Films");
    }

    #[rstest]
    #[tokio::test]
    async fn create_category_rejects_duplicates(admin: Actor) {
        let mut repo = MockCatalogueRepository::new();
        repo.expect_find_category_by_name()
            .return_once(|_| Ok(Some(category(1, "Films"))));
        repo.expect_insert_category().times(0);

        let error = service(repo)
            .create_category(&admin, "Films".to_owned())
            .await
            .expect_err("duplicate");
        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn racing_category_insert_maps_to_conflict(admin: Actor) {
        let mut repo = MockCatalogueRepository::new();
        repo.expect_find_category_by_name().return_once(|_| Ok(None));
        repo.expect_insert_category()
            .return_once(|name| Err(CatalogueRepositoryError::duplicate_category(name)));

        let error = service(repo)
            .create_category(&admin, "Films".to_owned())
            .await
            .expect_err("duplicate");
        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn renaming_to_own_name_is_allowed(admin: Actor) {
        let mut repo = MockCatalogueRepository::new();
        repo.expect_find_category_by_name()
            .return_once(|_| Ok(Some(category(3, "Films"))));
        repo.expect_rename_category()
            .withf(|id: &CategoryId, name: &str| *id == CategoryId::new(3) && name == "Films")
            .return_once(|id, name| Ok(Some(Category::new(id, name).expect("valid"))));

        let renamed = service(repo)
            .rename_category(&admin, CategoryId::new(3), "Films".to_owned())
            .await
            .expect("rename succeeds");
        assert_eq!(renamed.id(), CategoryId::new(3));
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_category_with_items_is_a_conflict(admin: Actor) {
        let mut repo = MockCatalogueRepository::new();
        repo.expect_count_items_in_category().return_once(|_| Ok(2));
        repo.expect_delete_category().times(0);

        let error = service(repo)
            .delete_category(&admin, CategoryId::new(1))
            .await
            .expect_err("in use");
        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_unknown_category_is_not_found(admin: Actor) {
        let mut repo = MockCatalogueRepository::new();
        repo.expect_count_items_in_category().return_once(|_| Ok(0));
        repo.expect_delete_category().return_once(|_| Ok(false));

        let error = service(repo)
            .delete_category(&admin, CategoryId::new(1))
            .await
            .expect_err("missing");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn create_item_requires_existing_category(admin: Actor) {
        let mut repo = MockCatalogueRepository::new();
        repo.expect_find_category().return_once(|_| Ok(None));
        repo.expect_insert_item().times(0);

        let error = service(repo)
            .create_item(&admin, input("Heat", 9))
            .await
            .expect_err("unknown category");
        assert_eq!(error.code(), ErrorCode::NotFound);
        assert_eq!(
            error.details(),
            Some(&json!({ "code": "category_not_found", "categoryId": 9 }))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn create_item_rejects_blank_titles(admin: Actor) {
        let mut repo = MockCatalogueRepository::new();
        repo.expect_find_category().times(0);

        let error = service(repo)
            .create_item(&admin, input("   ", 1))
            .await
            .expect_err("blank title");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn create_item_inserts_validated_draft(admin: Actor) {
        let mut repo = MockCatalogueRepository::new();
        repo.expect_find_category()
            .return_once(|_| Ok(Some(category(1, "Films"))));
        repo.expect_insert_item()
            .withf(|draft: &ItemDraft| draft.title == "Heat")
            .return_once(|draft| Ok(Item::from_draft(ItemId::new(7), draft.clone())));

        let item = service(repo)
            .create_item(&admin, input(" Heat ", 1))
            .await
            .expect("item created");
        assert_eq!(item.id(), ItemId::new(7));
    }

    #[rstest]
    #[tokio::test]
    async fn update_missing_item_is_not_found(admin: Actor) {
        let mut repo = MockCatalogueRepository::new();
        repo.expect_find_category()
            .return_once(|_| Ok(Some(category(1, "Films"))));
        repo.expect_update_item().return_once(|_, _| Ok(None));

        let error = service(repo)
            .update_item(&admin, ItemId::new(4), input("Heat", 1))
            .await
            .expect_err("missing");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[case(Role::User)]
    #[case(Role::Moderator)]
    #[tokio::test]
    async fn non_admins_are_forbidden(#[case] role: Role) {
        let actor = Actor::new(UserId::random(), role);
        let svc = service(MockCatalogueRepository::new());
        let error = svc
            .delete_item(&actor, ItemId::new(1))
            .await
            .expect_err("forbidden");
        assert_eq!(error.code(), ErrorCode::Forbidden);
        let error = svc
            .create_category(&actor, "Films".to_owned())
            .await
            .expect_err("forbidden");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }
}
