//! Integer identifiers for catalogue entities.
//!
//! Each entity gets its own newtype so a review id can never be passed where
//! an item id is expected. Values mirror the `BIGSERIAL` keys in storage.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw storage key.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Raw storage key.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_entity_id! {
    /// Identifier of a [`crate::domain::Category`].
    CategoryId
}

define_entity_id! {
    /// Identifier of a catalogue [`crate::domain::Item`].
    ItemId
}

define_entity_id! {
    /// Identifier of a [`crate::domain::Tag`].
    TagId
}

define_entity_id! {
    /// Identifier of a [`crate::domain::Review`].
    ReviewId
}

define_entity_id! {
    /// Identifier of a [`crate::domain::Comment`].
    CommentId
}
