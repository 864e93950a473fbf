//! In-memory entity store implementing every driven port.
//!
//! Behavioural tests run the real services against this store. It follows
//! the same contracts as the PostgreSQL adapters: case-folded tag
//! uniqueness, one review per item and user, cascading deletes and
//! restrictive category deletion.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    CatalogueListing, CatalogueRepository, CatalogueRepositoryError, CommentRepository,
    CommentRepositoryError, ReviewRepository, ReviewRepositoryError, StatisticsRepository,
    StatisticsRepositoryError, TagRepository, TagRepositoryError, UserRepository,
    UserRepositoryError,
};
use crate::domain::{
    Category, CategoryId, Comment, CommentId, DisplayName, Email, Item, ItemDraft, ItemId,
    ItemListing, ItemQuery, ItemRatingRow, NewComment, NewReview, RatingSummary,
    RecentReviewRow, Review, ReviewContent, ReviewId, ReviewerRow, Role, StatisticsSnapshot, Tag,
    TagId, TagName, User, UserId, sort_comments_newest_first, sort_newest_first,
};

const UNAVAILABLE: &str = "in-memory store marked unavailable";

#[derive(Debug, Default)]
struct Sequences {
    category: i64,
    item: i64,
    tag: i64,
    review: i64,
    comment: i64,
}

impl Sequences {
    fn bump(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

#[derive(Debug, Default)]
struct State {
    unavailable: bool,
    sequences: Sequences,
    categories: BTreeMap<CategoryId, Category>,
    items: BTreeMap<ItemId, Item>,
    tags: BTreeMap<TagId, Tag>,
    item_tags: BTreeSet<(ItemId, TagId)>,
    reviews: BTreeMap<ReviewId, Review>,
    comments: BTreeMap<CommentId, Comment>,
    users: Vec<User>,
}

impl State {
    fn tag_ids_of(&self, item_id: ItemId) -> Vec<TagId> {
        self.item_tags
            .iter()
            .filter(|(item, _)| *item == item_id)
            .map(|(_, tag)| *tag)
            .collect()
    }

    fn rating_of(&self, item_id: ItemId) -> RatingSummary {
        RatingSummary::from_ratings(
            self.reviews
                .values()
                .filter(|review| review.item_id == item_id)
                .map(|review| review.rating.get()),
        )
    }

    fn listing(&self, item: &Item) -> Option<ItemListing> {
        let category = self.categories.get(&item.category_id())?;
        Some(ItemListing {
            item: item.clone(),
            category_name: category.name().to_owned(),
            rating: self.rating_of(item.id()),
        })
    }

    fn delete_review_cascade(&mut self, id: ReviewId) -> bool {
        let removed = self.reviews.remove(&id).is_some();
        self.comments.retain(|_, comment| comment.review_id != id);
        removed
    }

    fn user(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|user| user.id() == id)
    }
}

/// Thread-safe in-memory store for tests.
///
/// # Examples
///
/// ```rust
/// use review_catalogue::domain::Role;
/// use review_catalogue::test_support::InMemoryEntityStore;
///
/// let store = InMemoryEntityStore::default();
/// let films = store.add_category("Films");
/// let item = store.add_item("Arrival", films.id());
/// let author = store.add_user("reviewer", vec![Role::User]);
/// assert_eq!(item.category_id(), films.id());
/// assert!(author.has_role(Role::User));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    state: Mutex<State>,
}

impl InMemoryEntityStore {
    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn available(&self) -> Result<MutexGuard<'_, State>, String> {
        let state = self.lock();
        if state.unavailable {
            return Err(UNAVAILABLE.to_owned());
        }
        Ok(state)
    }

    /// Make every port call fail with a connection error until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Seed a category. Panics on an invalid or duplicate name.
    pub fn add_category(&self, name: &str) -> Category {
        let mut state = self.lock();
        assert!(
            !state.categories.values().any(|category| category.name() == name),
            "category {name} already seeded"
        );
        let id = CategoryId::new(Sequences::bump(&mut state.sequences.category));
        let category = match Category::new(id, name) {
            Ok(category) => category,
            Err(error) => panic!("invalid seed category {name}: {error}"),
        };
        state.categories.insert(id, category.clone());
        category
    }

    /// Seed an item with an empty description.
    pub fn add_item(&self, title: &str, category_id: CategoryId) -> Item {
        let mut state = self.lock();
        assert!(
            state.categories.contains_key(&category_id),
            "seed item {title} references unknown category {category_id}"
        );
        let id = ItemId::new(Sequences::bump(&mut state.sequences.item));
        let item = match Item::new(id, title, "", category_id) {
            Ok(item) => item,
            Err(error) => panic!("invalid seed item {title}: {error}"),
        };
        state.items.insert(id, item.clone());
        item
    }

    /// Seed a user holding `roles` in the given order.
    pub fn add_user(&self, display_name: &str, roles: Vec<Role>) -> User {
        let display = match DisplayName::new(display_name) {
            Ok(display) => display,
            Err(error) => panic!("invalid seed display name {display_name}: {error}"),
        };
        let email = match Email::new(format!("{display_name}@example.org")) {
            Ok(email) => email,
            Err(error) => panic!("invalid seed email for {display_name}: {error}"),
        };
        let user = User::new(UserId::random(), display, email, roles);
        self.lock().users.push(user.clone());
        user
    }

    /// Seed a review directly, bypassing the one-per-user check.
    pub fn add_review(
        &self,
        item_id: ItemId,
        user_id: &UserId,
        rating: i64,
        created_at: DateTime<Utc>,
    ) -> Review {
        let content = match ReviewContent::new("Seeded review", "Seeded review body.", rating) {
            Ok(content) => content,
            Err(error) => panic!("invalid seed rating {rating}: {error}"),
        };
        let mut state = self.lock();
        let id = ReviewId::new(Sequences::bump(&mut state.sequences.review));
        let review = Review::from_new(
            id,
            NewReview {
                item_id,
                user_id: user_id.clone(),
                content,
                created_at,
            },
        );
        state.reviews.insert(id, review.clone());
        review
    }

    /// Tag ids currently attached to `item_id`.
    pub fn tag_ids_of(&self, item_id: ItemId) -> Vec<TagId> {
        self.lock().tag_ids_of(item_id)
    }

    /// Number of stored tags.
    pub fn tag_count(&self) -> usize {
        self.lock().tags.len()
    }

    /// Number of stored reviews.
    pub fn review_count(&self) -> usize {
        self.lock().reviews.len()
    }

    /// Number of stored comments.
    pub fn comment_count(&self) -> usize {
        self.lock().comments.len()
    }
}

fn page_window(offset: u64, limit: u64) -> (usize, usize) {
    (
        usize::try_from(offset).unwrap_or(usize::MAX),
        usize::try_from(limit).unwrap_or(usize::MAX),
    )
}

fn len_as_u64(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

#[async_trait]
impl CatalogueRepository for InMemoryEntityStore {
    async fn list_items(
        &self,
        query: &ItemQuery,
    ) -> Result<CatalogueListing, CatalogueRepositoryError> {
        let state = self
            .available()
            .map_err(CatalogueRepositoryError::connection)?;
        let mut matching: Vec<ItemListing> = state
            .items
            .values()
            .filter(|item| query.predicate().matches(item, &state.tag_ids_of(item.id())))
            .filter_map(|item| state.listing(item))
            .collect();
        let sort = query.sort();
        matching.sort_by(|a, b| sort.compare(a, b));

        let total_count = len_as_u64(matching.len());
        let (offset, limit) = page_window(query.page().offset(), query.page().limit());
        Ok(CatalogueListing {
            items: matching.into_iter().skip(offset).take(limit).collect(),
            total_count,
        })
    }

    async fn find_listing(
        &self,
        id: ItemId,
    ) -> Result<Option<ItemListing>, CatalogueRepositoryError> {
        let state = self
            .available()
            .map_err(CatalogueRepositoryError::connection)?;
        Ok(state.items.get(&id).and_then(|item| state.listing(item)))
    }

    async fn find_item(&self, id: ItemId) -> Result<Option<Item>, CatalogueRepositoryError> {
        let state = self
            .available()
            .map_err(CatalogueRepositoryError::connection)?;
        Ok(state.items.get(&id).cloned())
    }

    async fn find_category(
        &self,
        id: CategoryId,
    ) -> Result<Option<Category>, CatalogueRepositoryError> {
        let state = self
            .available()
            .map_err(CatalogueRepositoryError::connection)?;
        Ok(state.categories.get(&id).cloned())
    }

    async fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Category>, CatalogueRepositoryError> {
        let state = self
            .available()
            .map_err(CatalogueRepositoryError::connection)?;
        Ok(state
            .categories
            .values()
            .find(|category| category.name() == name)
            .cloned())
    }

    async fn insert_category(&self, name: &str) -> Result<Category, CatalogueRepositoryError> {
        let mut state = self
            .available()
            .map_err(CatalogueRepositoryError::connection)?;
        if state.categories.values().any(|category| category.name() == name) {
            return Err(CatalogueRepositoryError::duplicate_category(name));
        }
        let id = CategoryId::new(Sequences::bump(&mut state.sequences.category));
        let category =
            Category::new(id, name).map_err(|err| CatalogueRepositoryError::query(err.to_string()))?;
        state.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn rename_category(
        &self,
        id: CategoryId,
        name: &str,
    ) -> Result<Option<Category>, CatalogueRepositoryError> {
        let mut state = self
            .available()
            .map_err(CatalogueRepositoryError::connection)?;
        if !state.categories.contains_key(&id) {
            return Ok(None);
        }
        if state
            .categories
            .values()
            .any(|category| category.id() != id && category.name() == name)
        {
            return Err(CatalogueRepositoryError::duplicate_category(name));
        }
        let category =
            Category::new(id, name).map_err(|err| CatalogueRepositoryError::query(err.to_string()))?;
        state.categories.insert(id, category.clone());
        Ok(Some(category))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, CatalogueRepositoryError> {
        let mut state = self
            .available()
            .map_err(CatalogueRepositoryError::connection)?;
        if state.items.values().any(|item| item.category_id() == id) {
            return Err(CatalogueRepositoryError::category_in_use(id.get()));
        }
        Ok(state.categories.remove(&id).is_some())
    }

    async fn count_items_in_category(
        &self,
        id: CategoryId,
    ) -> Result<u64, CatalogueRepositoryError> {
        let state = self
            .available()
            .map_err(CatalogueRepositoryError::connection)?;
        Ok(len_as_u64(
            state
                .items
                .values()
                .filter(|item| item.category_id() == id)
                .count(),
        ))
    }

    async fn insert_item(&self, draft: &ItemDraft) -> Result<Item, CatalogueRepositoryError> {
        let mut state = self
            .available()
            .map_err(CatalogueRepositoryError::connection)?;
        if !state.categories.contains_key(&draft.category_id) {
            return Err(CatalogueRepositoryError::missing_category(
                draft.category_id.get(),
            ));
        }
        let id = ItemId::new(Sequences::bump(&mut state.sequences.item));
        let item = Item::from_draft(id, draft.clone());
        state.items.insert(id, item.clone());
        Ok(item)
    }

    async fn update_item(
        &self,
        id: ItemId,
        draft: &ItemDraft,
    ) -> Result<Option<Item>, CatalogueRepositoryError> {
        let mut state = self
            .available()
            .map_err(CatalogueRepositoryError::connection)?;
        if !state.items.contains_key(&id) {
            return Ok(None);
        }
        if !state.categories.contains_key(&draft.category_id) {
            return Err(CatalogueRepositoryError::missing_category(
                draft.category_id.get(),
            ));
        }
        let item = Item::from_draft(id, draft.clone());
        state.items.insert(id, item.clone());
        Ok(Some(item))
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool, CatalogueRepositoryError> {
        let mut state = self
            .available()
            .map_err(CatalogueRepositoryError::connection)?;
        if state.items.remove(&id).is_none() {
            return Ok(false);
        }
        state.item_tags.retain(|(item, _)| *item != id);
        let review_ids: Vec<ReviewId> = state
            .reviews
            .values()
            .filter(|review| review.item_id == id)
            .map(|review| review.id)
            .collect();
        for review_id in review_ids {
            state.delete_review_cascade(review_id);
        }
        Ok(true)
    }
}

#[async_trait]
impl TagRepository for InMemoryEntityStore {
    async fn find_by_name(&self, name: &TagName) -> Result<Option<Tag>, TagRepositoryError> {
        let state = self.available().map_err(TagRepositoryError::connection)?;
        Ok(state
            .tags
            .values()
            .find(|tag| tag.name().matches(name))
            .cloned())
    }

    async fn insert(&self, name: &TagName) -> Result<Tag, TagRepositoryError> {
        let mut state = self.available().map_err(TagRepositoryError::connection)?;
        if state.tags.values().any(|tag| tag.name().matches(name)) {
            return Err(TagRepositoryError::duplicate_name(name.as_ref()));
        }
        let id = TagId::new(Sequences::bump(&mut state.sequences.tag));
        let tag = Tag::new(id, name.clone());
        state.tags.insert(id, tag.clone());
        Ok(tag)
    }

    async fn is_linked(&self, item_id: ItemId, tag_id: TagId) -> Result<bool, TagRepositoryError> {
        let state = self.available().map_err(TagRepositoryError::connection)?;
        Ok(state.item_tags.contains(&(item_id, tag_id)))
    }

    async fn link(&self, item_id: ItemId, tag_id: TagId) -> Result<(), TagRepositoryError> {
        let mut state = self.available().map_err(TagRepositoryError::connection)?;
        if !state.items.contains_key(&item_id) || !state.tags.contains_key(&tag_id) {
            return Err(TagRepositoryError::query("link references a missing row"));
        }
        if !state.item_tags.insert((item_id, tag_id)) {
            return Err(TagRepositoryError::already_linked());
        }
        Ok(())
    }

    async fn unlink(&self, item_id: ItemId, tag_id: TagId) -> Result<bool, TagRepositoryError> {
        let mut state = self.available().map_err(TagRepositoryError::connection)?;
        Ok(state.item_tags.remove(&(item_id, tag_id)))
    }

    async fn tags_for_items(
        &self,
        item_ids: &[ItemId],
    ) -> Result<Vec<(ItemId, Tag)>, TagRepositoryError> {
        let state = self.available().map_err(TagRepositoryError::connection)?;
        Ok(state
            .item_tags
            .iter()
            .filter(|(item, _)| item_ids.contains(item))
            .filter_map(|(item, tag)| state.tags.get(tag).map(|tag| (*item, tag.clone())))
            .collect())
    }
}

#[async_trait]
impl ReviewRepository for InMemoryEntityStore {
    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>, ReviewRepositoryError> {
        let state = self.available().map_err(ReviewRepositoryError::connection)?;
        Ok(state.reviews.get(&id).cloned())
    }

    async fn exists_for(
        &self,
        item_id: ItemId,
        user_id: &UserId,
    ) -> Result<bool, ReviewRepositoryError> {
        let state = self.available().map_err(ReviewRepositoryError::connection)?;
        Ok(state
            .reviews
            .values()
            .any(|review| review.item_id == item_id && &review.user_id == user_id))
    }

    async fn insert_review(&self, review: &NewReview) -> Result<Review, ReviewRepositoryError> {
        let mut state = self.available().map_err(ReviewRepositoryError::connection)?;
        if state
            .reviews
            .values()
            .any(|existing| existing.item_id == review.item_id && existing.user_id == review.user_id)
        {
            return Err(ReviewRepositoryError::duplicate());
        }
        let id = ReviewId::new(Sequences::bump(&mut state.sequences.review));
        let stored = Review::from_new(id, review.clone());
        state.reviews.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_review(&self, review: &Review) -> Result<bool, ReviewRepositoryError> {
        let mut state = self.available().map_err(ReviewRepositoryError::connection)?;
        let Some(stored) = state.reviews.get_mut(&review.id) else {
            return Ok(false);
        };
        stored.title.clone_from(&review.title);
        stored.content.clone_from(&review.content);
        stored.rating = review.rating;
        Ok(true)
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool, ReviewRepositoryError> {
        let mut state = self.available().map_err(ReviewRepositoryError::connection)?;
        Ok(state.delete_review_cascade(id))
    }

    async fn reviews_for_item(
        &self,
        item_id: ItemId,
    ) -> Result<Vec<Review>, ReviewRepositoryError> {
        let state = self.available().map_err(ReviewRepositoryError::connection)?;
        let mut reviews: Vec<Review> = state
            .reviews
            .values()
            .filter(|review| review.item_id == item_id)
            .cloned()
            .collect();
        sort_newest_first(&mut reviews);
        Ok(reviews)
    }
}

#[async_trait]
impl CommentRepository for InMemoryEntityStore {
    async fn find_comment(&self, id: CommentId) -> Result<Option<Comment>, CommentRepositoryError> {
        let state = self.available().map_err(CommentRepositoryError::connection)?;
        Ok(state.comments.get(&id).cloned())
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, CommentRepositoryError> {
        let mut state = self.available().map_err(CommentRepositoryError::connection)?;
        if !state.reviews.contains_key(&comment.review_id) {
            return Err(CommentRepositoryError::query("comment references a missing review"));
        }
        let id = CommentId::new(Sequences::bump(&mut state.sequences.comment));
        let stored = Comment::from_new(id, comment.clone());
        state.comments.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_comment(&self, comment: &Comment) -> Result<bool, CommentRepositoryError> {
        let mut state = self.available().map_err(CommentRepositoryError::connection)?;
        let Some(stored) = state.comments.get_mut(&comment.id) else {
            return Ok(false);
        };
        stored.content.clone_from(&comment.content);
        Ok(true)
    }

    async fn delete_comment(&self, id: CommentId) -> Result<bool, CommentRepositoryError> {
        let mut state = self.available().map_err(CommentRepositoryError::connection)?;
        Ok(state.comments.remove(&id).is_some())
    }

    async fn comments_for_review(
        &self,
        review_id: ReviewId,
    ) -> Result<Vec<Comment>, CommentRepositoryError> {
        let state = self.available().map_err(CommentRepositoryError::connection)?;
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|comment| comment.review_id == review_id)
            .cloned()
            .collect();
        sort_comments_newest_first(&mut comments);
        Ok(comments)
    }
}

#[async_trait]
impl StatisticsRepository for InMemoryEntityStore {
    async fn snapshot(
        &self,
        recent_limit: usize,
    ) -> Result<StatisticsSnapshot, StatisticsRepositoryError> {
        let state = self
            .available()
            .map_err(StatisticsRepositoryError::connection)?;
        let item_ratings: Vec<ItemRatingRow> = state
            .items
            .values()
            .map(|item| ItemRatingRow {
                item_id: item.id(),
                title: item.title().to_owned(),
                rating: state.rating_of(item.id()),
            })
            .collect();
        let reviewers = state
            .users
            .iter()
            .map(|user| ReviewerRow {
                user_id: user.id().clone(),
                display_name: user.display_name().to_string(),
                roles: user.roles().to_vec(),
                review_count: len_as_u64(
                    state
                        .reviews
                        .values()
                        .filter(|review| &review.user_id == user.id())
                        .count(),
                ),
            })
            .collect();

        let mut newest: Vec<&Review> = state.reviews.values().collect();
        newest.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        let recent_reviews = newest
            .into_iter()
            .filter_map(|review| {
                let item = state.items.get(&review.item_id)?;
                let author = state.user(&review.user_id)?;
                Some(RecentReviewRow {
                    review_id: review.id,
                    item_id: review.item_id,
                    item_title: item.title().to_owned(),
                    author_display_name: author.display_name().to_string(),
                    title: review.title.clone(),
                    rating: review.rating,
                    created_at: review.created_at,
                })
            })
            .take(recent_limit)
            .collect();

        Ok(StatisticsSnapshot {
            top_rated_candidates: item_ratings.clone(),
            most_reviewed_candidates: item_ratings,
            reviewers,
            recent_reviews,
        })
    }
}

#[async_trait]
impl UserRepository for InMemoryEntityStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let state = self.available().map_err(UserRepositoryError::connection)?;
        Ok(state.user(id).cloned())
    }

    async fn find_by_display_name(
        &self,
        display_name: &DisplayName,
    ) -> Result<Option<User>, UserRepositoryError> {
        let state = self.available().map_err(UserRepositoryError::connection)?;
        Ok(state
            .users
            .iter()
            .find(|user| user.display_name() == display_name)
            .cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut state = self.available().map_err(UserRepositoryError::connection)?;
        if state
            .users
            .iter()
            .any(|existing| existing.display_name() == user.display_name())
        {
            return Err(UserRepositoryError::duplicate_display_name(
                user.display_name().to_string(),
            ));
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn grant_role(&self, id: &UserId, role: Role) -> Result<(), UserRepositoryError> {
        let mut state = self.available().map_err(UserRepositoryError::connection)?;
        let user = state
            .users
            .iter_mut()
            .find(|user| user.id() == id)
            .ok_or_else(|| UserRepositoryError::query(format!("user {id} not found")))?;
        user.grant(role);
        Ok(())
    }
}
