//! Catalogue domain types.
//!
//! Categories group items; tags label them across categories. Ratings are
//! never stored on an item: [`ItemView`] carries an average derived from the
//! item's reviews at read time.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{CategoryId, ItemId, TagId};

mod query;
mod rating;
mod validation;


pub use query::{
    ItemFilter, ItemListing, ItemPage, ItemPredicate, ItemQuery, ItemSort, SortDirection, SortKey,
};
pub use rating::{AverageRating, RatingSummary};

/// Longest accepted tag name, in characters.
pub const TAG_NAME_MAX: usize = 64;
/// Longest accepted category name, in characters.
pub const CATEGORY_NAME_MAX: usize = 100;
/// Longest accepted item title, in characters.
pub const ITEM_TITLE_MAX: usize = 200;

/// Validation errors returned by catalogue constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogueValidationError {
    EmptyField { field: &'static str },
    TooLong { field: &'static str, max: usize },
    UnknownSortKey { value: String },
}

impl fmt::Display for CatalogueValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyField { field } => write!(f, "{field} must not be empty"),
            Self::TooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::UnknownSortKey { value } => {
                write!(f, "sortBy must be \"title\" or \"rating\" (got \"{value}\")")
            }
        }
    }
}

impl std::error::Error for CatalogueValidationError {}

/// Named grouping of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    id: CategoryId,
    name: String,
}

impl Category {
    /// Validate and build a category. The name is trimmed.
    pub fn new(id: CategoryId, name: impl Into<String>) -> Result<Self, CatalogueValidationError> {
        let name = validation::normalise_name(name.into(), "category name", CATEGORY_NAME_MAX)?;
        Ok(Self { id, name })
    }

    /// Validate a category name without an id, returning the trimmed form.
    pub fn validate_name(name: impl Into<String>) -> Result<String, CatalogueValidationError> {
        validation::normalise_name(name.into(), "category name", CATEGORY_NAME_MAX)
    }

    /// Category identifier.
    pub fn id(&self) -> CategoryId {
        self.id
    }

    /// Exact, case-sensitive category name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Validated item fields supplied when creating or replacing an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    /// Item title, trimmed.
    pub title: String,
    /// Free-form description; may be empty.
    pub description: String,
    /// Owning category.
    pub category_id: CategoryId,
}

impl ItemDraft {
    /// Validate raw input into a draft.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category_id: CategoryId,
    ) -> Result<Self, CatalogueValidationError> {
        let title = validation::normalise_name(title.into(), "title", ITEM_TITLE_MAX)?;
        Ok(Self {
            title,
            description: description.into(),
            category_id,
        })
    }
}

/// Catalogue entry rated and tagged by users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    id: ItemId,
    title: String,
    description: String,
    category_id: CategoryId,
}

impl Item {
    /// Attach an identifier to a validated draft.
    pub fn from_draft(id: ItemId, draft: ItemDraft) -> Self {
        let ItemDraft {
            title,
            description,
            category_id,
        } = draft;
        Self {
            id,
            title,
            description,
            category_id,
        }
    }

    /// Rebuild an item from stored fields, revalidating the title.
    pub fn new(
        id: ItemId,
        title: impl Into<String>,
        description: impl Into<String>,
        category_id: CategoryId,
    ) -> Result<Self, CatalogueValidationError> {
        ItemDraft::new(title, description, category_id).map(|draft| Self::from_draft(id, draft))
    }

    /// Item identifier.
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Item title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Item description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Owning category.
    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }
}

/// Trimmed, non-blank tag name.
///
/// Tags are unique case-insensitively; [`TagName::lookup_key`] is the form
/// used for that comparison while the original spelling is kept for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagName(String);

impl TagName {
    /// Validate and trim a tag name.
    ///
    /// # Examples
    /// ```
    /// use review_catalogue::domain::TagName;
    ///
    /// let name = TagName::new("  Drama ").expect("valid tag");
    /// assert_eq!(name.as_ref(), "Drama");
    /// assert_eq!(name.lookup_key(), "drama");
    /// assert!(TagName::new("   ").is_err());
    /// ```
    pub fn new(name: impl Into<String>) -> Result<Self, CatalogueValidationError> {
        validation::normalise_name(name.into(), "tag name", TAG_NAME_MAX).map(Self)
    }

    /// Case-folded key used for uniqueness checks.
    pub fn lookup_key(&self) -> String {
        self.0.to_lowercase()
    }

    /// Whether two names denote the same tag.
    pub fn matches(&self, other: &Self) -> bool {
        self.lookup_key() == other.lookup_key()
    }
}

impl AsRef<str> for TagName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TagName> for String {
    fn from(value: TagName) -> Self {
        value.0
    }
}

impl TryFrom<String> for TagName {
    type Error = CatalogueValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Free-form label attachable to many items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    id: TagId,
    name: TagName,
}

impl Tag {
    /// Build a tag from its parts.
    pub fn new(id: TagId, name: TagName) -> Self {
        Self { id, name }
    }

    /// Tag identifier.
    pub fn id(&self) -> TagId {
        self.id
    }

    /// Stored spelling of the tag name.
    pub fn name(&self) -> &TagName {
        &self.name
    }
}

/// Tag as presented alongside an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagView {
    /// Tag identifier.
    pub id: TagId,
    /// Stored spelling of the name.
    pub name: String,
}

impl From<&Tag> for TagView {
    fn from(tag: &Tag) -> Self {
        Self {
            id: tag.id(),
            name: tag.name().to_string(),
        }
    }
}

impl From<Tag> for TagView {
    fn from(tag: Tag) -> Self {
        Self::from(&tag)
    }
}

/// Order tag views by name, then id.
pub fn sort_tag_views(tags: &mut [TagView]) {
    tags.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
}

/// Read model returned by catalogue queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    /// Item identifier.
    pub id: ItemId,
    /// Item title.
    pub title: String,
    /// Item description.
    pub description: String,
    /// Owning category.
    pub category_id: CategoryId,
    /// Name of the owning category.
    pub category_name: String,
    /// Mean review rating; zero when the item has no reviews.
    pub average_rating: AverageRating,
    /// Number of reviews behind the average.
    pub review_count: u64,
    /// Attached tags ordered by name.
    pub tags: Vec<TagView>,
}

impl ItemView {
    /// Assemble a view from a listing row and its tags.
    pub fn from_listing(listing: ItemListing, mut tags: Vec<TagView>) -> Self {
        sort_tag_views(&mut tags);
        let average_rating = listing.rating.average();
        let ItemListing {
            item,
            category_name,
            rating,
        } = listing;
        Self {
            id: item.id,
            title: item.title,
            description: item.description,
            category_id: item.category_id,
            category_name,
            average_rating,
            review_count: rating.review_count(),
            tags,
        }
    }
}
