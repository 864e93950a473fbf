//! Behaviour tests for category and item administration.

use std::collections::HashMap;

use review_catalogue::domain::ports::{CatalogueAdminCommand, CatalogueRepository, ItemInput};
use review_catalogue::domain::{CategoryId, Error, ItemId, Role};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};

mod support;

use support::{Harness, assert_fails_with, assert_succeeded};

#[derive(Default, ScenarioState)]
struct AdminWorld {
    harness: Slot<Harness>,
    categories: Slot<HashMap<String, CategoryId>>,
    items: Slot<HashMap<String, ItemId>>,
    outcome: Slot<Result<(), Error>>,
}

impl AdminWorld {
    fn harness(&self) -> Harness {
        if let Some(harness) = self.harness.get() {
            return harness;
        }
        let harness = Harness::new();
        self.harness.set(harness.clone());
        harness
    }

    fn remember_category(&self, name: &str, id: CategoryId) {
        let mut categories = self.categories.get().unwrap_or_default();
        categories.insert(name.to_owned(), id);
        self.categories.set(categories);
    }

    fn remember_item(&self, title: &str, id: ItemId) {
        let mut items = self.items.get().unwrap_or_default();
        items.insert(title.to_owned(), id);
        self.items.set(items);
    }

    fn category(&self, name: &str) -> CategoryId {
        self.categories
            .get()
            .and_then(|categories| categories.get(name).copied())
            .unwrap_or_else(|| panic!("category {name} not created"))
    }

    fn item(&self, title: &str) -> ItemId {
        self.items
            .get()
            .and_then(|items| items.get(title).copied())
            .unwrap_or_else(|| panic!("item {title} not created"))
    }

    fn create_category(&self, user: &str, name: &str) -> Result<CategoryId, Error> {
        let harness = self.harness();
        let actor = harness.actor(user);
        let category = harness.block_on(harness.admin().create_category(&actor, name.to_owned()))?;
        self.remember_category(name, category.id());
        Ok(category.id())
    }

    fn create_item(&self, user: &str, title: &str, category_id: CategoryId) -> Result<(), Error> {
        let harness = self.harness();
        let actor = harness.actor(user);
        let input = ItemInput {
            title: title.to_owned(),
            description: String::new(),
            category_id,
        };
        let item = harness.block_on(harness.admin().create_item(&actor, input))?;
        self.remember_item(title, item.id());
        Ok(())
    }
}

#[fixture]
fn world() -> AdminWorld {
    AdminWorld::default()
}

#[given("an administrator named {name}")]
fn an_administrator_named(world: &AdminWorld, name: String) {
    world.harness().add_user(&name, Role::Admin);
}

#[given("a user named {name}")]
fn a_user_named(world: &AdminWorld, name: String) {
    world.harness().add_user(&name, Role::User);
}

#[given("{user} has created the category {category} holding the item {title}")]
fn has_created_category_with_item(
    world: &AdminWorld,
    user: String,
    category: String,
    title: String,
) {
    let category_id = world
        .create_category(&user, &category)
        .expect("seed category succeeds");
    world
        .create_item(&user, &title, category_id)
        .expect("seed item succeeds");
}

#[given("the item {title} has {count} reviews")]
fn the_item_has_reviews(world: &AdminWorld, title: String, count: usize) {
    let harness = world.harness();
    let item = harness
        .block_on(harness.store().find_item(world.item(&title)))
        .expect("item lookup succeeds")
        .expect("item exists");
    harness.add_ratings(&item, &vec![4_i64; count]);
}

#[when("{user} creates the category {name}")]
fn creates_the_category(world: &AdminWorld, user: String, name: String) {
    world
        .outcome
        .set(world.create_category(&user, &name).map(drop));
}

#[when("{user} creates the item {title} in category {category_id}")]
fn creates_the_item(world: &AdminWorld, user: String, title: String, category_id: i64) {
    world
        .outcome
        .set(world.create_item(&user, &title, CategoryId::new(category_id)));
}

#[when("{user} deletes the category {name}")]
fn deletes_the_category(world: &AdminWorld, user: String, name: String) {
    let harness = world.harness();
    let actor = harness.actor(&user);
    let outcome = harness.block_on(
        harness
            .admin()
            .delete_category(&actor, world.category(&name)),
    );
    world.outcome.set(outcome);
}

#[when("{user} deletes the item {title}")]
fn deletes_the_item(world: &AdminWorld, user: String, title: String) {
    let harness = world.harness();
    let actor = harness.actor(&user);
    let outcome = harness.block_on(harness.admin().delete_item(&actor, world.item(&title)));
    world.outcome.set(outcome);
}

#[then("the command succeeds")]
fn the_command_succeeds(world: &AdminWorld) {
    assert_succeeded(world.outcome.get());
}

#[then("the command fails with {code}")]
fn the_command_fails_with(world: &AdminWorld, code: String) {
    assert_fails_with(world.outcome.get(), &code);
}

#[then("the store holds {count} reviews")]
fn the_store_holds_reviews(world: &AdminWorld, count: usize) {
    assert_eq!(world.harness().store().review_count(), count);
}

#[scenario(
    path = "tests/features/catalogue_admin.feature",
    name = "Category names are unique"
)]
fn category_names_are_unique(world: AdminWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/catalogue_admin.feature",
    name = "Categories with items cannot be deleted"
)]
fn occupied_categories_stay(world: AdminWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/catalogue_admin.feature",
    name = "Items need an existing category"
)]
fn items_need_category(world: AdminWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/catalogue_admin.feature",
    name = "Deleting an item removes its reviews"
)]
fn item_delete_cascades(world: AdminWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/catalogue_admin.feature",
    name = "Regular users cannot curate"
)]
fn users_cannot_curate(world: AdminWorld) {
    drop(world);
}
