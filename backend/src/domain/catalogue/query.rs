//! Filter, sort and page values for catalogue queries.
//!
//! [`ItemFilter`] is the raw caller input. Converting it with
//! [`ItemFilter::into_query`] yields an [`ItemQuery`]: a composable
//! [`ItemPredicate`], an [`ItemSort`] and a clamped page request. Stores either
//! evaluate the predicate directly or translate it into their own query
//! language; both must honour the same ordering rules.

use std::cmp::Ordering;
use std::str::FromStr;

use pagination::{Page, PageRequest};
use serde::{Deserialize, Serialize};

use super::{CatalogueValidationError, Item, ItemView, RatingSummary};
use crate::domain::{CategoryId, ItemId, TagId};

/// A page of item views plus the unpaged result size.
pub type ItemPage = Page<ItemView>;

/// Sort keys accepted by the catalogue query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Ordinal comparison of titles.
    Title,
    /// Derived average rating; unreviewed items rank as zero.
    Rating,
    /// Storage identifier, used when no key is requested.
    Id,
}

impl FromStr for SortKey {
    type Err = CatalogueValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "rating" => Ok(Self::Rating),
            _ => Err(CatalogueValidationError::UnknownSortKey {
                value: value.to_owned(),
            }),
        }
    }
}

/// Direction applied to the chosen sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Sort strategy for catalogue queries.
///
/// The direction inverts the key only; ties always fall back to ascending
/// item id so pages are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemSort {
    key: SortKey,
    direction: SortDirection,
}

impl ItemSort {
    /// Combine a key with a direction.
    pub const fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Chosen key.
    pub const fn key(&self) -> SortKey {
        self.key
    }

    /// Chosen direction.
    pub const fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Compare two listings under this strategy.
    pub fn compare(&self, a: &ItemListing, b: &ItemListing) -> Ordering {
        let keyed = match self.key {
            SortKey::Title => a.item.title().cmp(b.item.title()),
            SortKey::Rating => a.rating.average().cmp(&b.rating.average()),
            SortKey::Id => a.item.id().cmp(&b.item.id()),
        };
        self.direction
            .apply(keyed)
            .then_with(|| a.item.id().cmp(&b.item.id()))
    }
}

impl Default for ItemSort {
    fn default() -> Self {
        Self::new(SortKey::Id, SortDirection::Descending)
    }
}

/// Conjunction of the optional narrowing clauses.
///
/// An empty predicate matches every item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPredicate {
    search: Option<String>,
    category_id: Option<CategoryId>,
    tag_ids: Vec<TagId>,
}

impl ItemPredicate {
    /// Predicate matching every item.
    pub fn all() -> Self {
        Self::default()
    }

    /// Require a case-insensitive title substring. Blank input adds nothing.
    ///
    /// The needle is trimmed and only ASCII letters fold, matching `ILIKE`
    /// on the `"C"`-collated title column: `"Émile"` does not match `"émile"`.
    #[must_use]
    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = search
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);
        self
    }

    /// Require an exact category.
    #[must_use]
    pub fn with_category(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Require at least one of `tag_ids`. An empty set adds nothing.
    #[must_use]
    pub fn with_any_tag(mut self, mut tag_ids: Vec<TagId>) -> Self {
        tag_ids.sort_unstable();
        tag_ids.dedup();
        self.tag_ids = tag_ids;
        self
    }

    /// Trimmed search text, when present.
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Category clause, when present.
    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    /// Tag clause; empty when absent.
    pub fn tag_ids(&self) -> &[TagId] {
        &self.tag_ids
    }

    /// Evaluate the predicate against an item and the ids of its tags.
    pub fn matches(&self, item: &Item, item_tag_ids: &[TagId]) -> bool {
        self.matches_search(item) && self.matches_category(item) && self.matches_tags(item_tag_ids)
    }

    fn matches_search(&self, item: &Item) -> bool {
        self.search.as_deref().is_none_or(|needle| {
            item.title()
                .to_ascii_lowercase()
                .contains(needle.to_ascii_lowercase().as_str())
        })
    }

    fn matches_category(&self, item: &Item) -> bool {
        self.category_id
            .is_none_or(|category_id| item.category_id() == category_id)
    }

    fn matches_tags(&self, item_tag_ids: &[TagId]) -> bool {
        self.tag_ids.is_empty() || self.tag_ids.iter().any(|tag| item_tag_ids.contains(tag))
    }
}

/// Validated catalogue query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemQuery {
    predicate: ItemPredicate,
    sort: ItemSort,
    page: PageRequest,
}

impl ItemQuery {
    /// Assemble a query from validated parts.
    pub fn new(predicate: ItemPredicate, sort: ItemSort, page: PageRequest) -> Self {
        Self {
            predicate,
            sort,
            page,
        }
    }

    /// Narrowing clauses.
    pub fn predicate(&self) -> &ItemPredicate {
        &self.predicate
    }

    /// Sort strategy.
    pub fn sort(&self) -> ItemSort {
        self.sort
    }

    /// Clamped page request.
    pub fn page(&self) -> PageRequest {
        self.page
    }
}

/// Raw catalogue query input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemFilter {
    /// Title substring.
    pub search: Option<String>,
    /// Exact category.
    pub category_id: Option<CategoryId>,
    /// Items carrying any of these tags.
    pub tag_ids: Vec<TagId>,
    /// `"title"` or `"rating"`; id order when absent.
    pub sort_by: Option<String>,
    /// Invert the sort key. Defaults to true.
    pub descending: bool,
    /// One-based page number; values below one are clamped.
    pub page: i64,
    /// Rows per page; values below one are clamped.
    pub page_size: i64,
}

impl Default for ItemFilter {
    fn default() -> Self {
        Self {
            search: None,
            category_id: None,
            tag_ids: Vec::new(),
            sort_by: None,
            descending: true,
            page: 1,
            page_size: i64::from(pagination::DEFAULT_PAGE_SIZE),
        }
    }
}

impl ItemFilter {
    /// Validate the filter. Only an unrecognised sort key is rejected; paging
    /// values are clamped.
    pub fn into_query(self) -> Result<ItemQuery, CatalogueValidationError> {
        let key = match self.sort_by.as_deref().map(str::trim) {
            None | Some("") => SortKey::Id,
            Some(raw) => raw.parse()?,
        };
        let direction = if self.descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        let predicate = ItemPredicate::all()
            .with_search(self.search.as_deref())
            .with_category(self.category_id)
            .with_any_tag(self.tag_ids);
        Ok(ItemQuery::new(
            predicate,
            ItemSort::new(key, direction),
            PageRequest::clamped(self.page, self.page_size),
        ))
    }
}

/// One matching item with the data needed to sort and render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemListing {
    /// The item itself.
    pub item: Item,
    /// Name of its category.
    pub category_name: String,
    /// Aggregate of its review ratings.
    pub rating: RatingSummary,
}

impl ItemListing {
    /// Identifier of the listed item.
    pub fn id(&self) -> ItemId {
        self.item.id()
    }
}
