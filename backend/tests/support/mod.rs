//! Shared harness for the behavioural suites.
//!
//! Every suite drives the real domain services against one
//! [`InMemoryEntityStore`] and a settable clock, so scenarios read like
//! product behaviour rather than mock choreography.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use mockable::Clock;
use review_catalogue::domain::{
    Actor, CatalogueAdminService, CatalogueQueryService, CategoryId, CommentService, Error,
    ErrorCode, Item, ReviewService, Role, StatisticsService, TagAssociationService, User,
};
use review_catalogue::test_support::{InMemoryEntityStore, MutableClock};
use tokio::runtime::Runtime;

pub type Store = InMemoryEntityStore;

/// Runtime, store and clock shared by the steps of one scenario.
#[derive(Clone)]
pub struct Harness {
    runtime: Arc<Runtime>,
    store: Arc<Store>,
    clock: Arc<MutableClock>,
    category: CategoryId,
    users: Arc<std::sync::Mutex<HashMap<String, User>>>,
}

fn scenario_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("valid scenario start")
}

impl Harness {
    pub fn new() -> Self {
        let store = Store::default();
        let category = store.add_category("General").id();
        Self {
            runtime: Arc::new(Runtime::new().expect("create runtime")),
            store: Arc::new(store),
            clock: Arc::new(MutableClock::new(scenario_start())),
            category,
            users: Arc::default(),
        }
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn clock(&self) -> &MutableClock {
        &self.clock
    }

    fn shared_clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Seed an item in the default category.
    pub fn add_item(&self, title: &str) -> Item {
        self.store.add_item(title, self.category)
    }

    /// Seed one review per rating, each by a fresh reviewer a minute apart.
    pub fn add_ratings(&self, item: &Item, ratings: &[i64]) {
        for rating in ratings {
            let reviewer = self.store.add_user(&self.next_reviewer_name(), vec![Role::User]);
            self.clock.advance_seconds(60);
            self.store
                .add_review(item.id(), reviewer.id(), *rating, self.clock.utc());
        }
    }

    fn next_reviewer_name(&self) -> String {
        format!("rater_{}", self.store.review_count() + 1)
    }

    /// Seed a named user holding `role`.
    pub fn add_user(&self, name: &str, role: Role) -> User {
        let user = self.store.add_user(name, vec![role]);
        self.users
            .lock()
            .expect("users lock")
            .insert(name.to_owned(), user.clone());
        user
    }

    pub fn user(&self, name: &str) -> User {
        self.users
            .lock()
            .expect("users lock")
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("no user named {name}"))
    }

    pub fn actor(&self, name: &str) -> Actor {
        Actor::for_user(&self.user(name))
    }

    pub fn tags(&self) -> TagAssociationService<Store, Store> {
        TagAssociationService::new(self.store.clone(), self.store.clone())
    }

    pub fn catalogue(&self) -> CatalogueQueryService<Store, Store> {
        CatalogueQueryService::new(self.store.clone(), self.store.clone())
    }

    pub fn admin(&self) -> CatalogueAdminService<Store> {
        CatalogueAdminService::new(self.store.clone())
    }

    pub fn reviews(&self) -> ReviewService<Store, Store> {
        ReviewService::new(self.store.clone(), self.store.clone(), self.shared_clock())
    }

    pub fn comments(&self) -> CommentService<Store, Store> {
        CommentService::new(self.store.clone(), self.store.clone(), self.shared_clock())
    }

    pub fn statistics(&self) -> StatisticsService<Store> {
        StatisticsService::new(self.store.clone())
    }
}

/// Split a comma-separated step argument.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Snake-case wire name of an error code, as written in feature files.
pub fn code_name(code: ErrorCode) -> String {
    serde_json::to_value(code)
        .ok()
        .and_then(|value| value.as_str().map(str::to_owned))
        .unwrap_or_else(|| format!("{code:?}"))
}

/// Assert that `outcome` failed with the named error code.
pub fn assert_fails_with(outcome: Option<Result<(), Error>>, expected: &str) {
    let outcome = outcome.expect("a command should have run");
    let error = outcome.expect_err("command should fail");
    assert_eq!(code_name(error.code()), expected, "{error:?}");
}

/// Assert that the last command succeeded.
pub fn assert_succeeded(outcome: Option<Result<(), Error>>) {
    let outcome = outcome.expect("a command should have run");
    if let Err(error) = outcome {
        panic!("command should succeed: {error:?}");
    }
}
