//! Roles, actors and the ownership gate applied before mutations.
//!
//! Reviews and comments may be changed by whoever wrote them. Some actions
//! additionally admit a privileged role; [`MutationPolicy`] names those
//! contracts so services never restate the rule inline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Error, User, UserId};

/// Platform role, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Ordinary authenticated user.
    User,
    /// May remove other users' comments.
    Moderator,
    /// Full control over the catalogue.
    Admin,
}

impl Role {
    /// Storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored role string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRoleError(pub String);

impl FromStr for Role {
    type Err = UnknownRoleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            _ => Err(UnknownRoleError(value.to_owned())),
        }
    }
}

/// The authenticated caller of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    user_id: UserId,
    role: Role,
}

impl Actor {
    /// Build an actor from an already resolved role.
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Build an actor for `user`, authorising with its effective role.
    pub fn for_user(user: &User) -> Self {
        Self::new(user.id().clone(), user.effective_role())
    }

    /// Identifier of the acting user.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Role used for authorisation.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Reject the action unless the actor is an administrator.
    pub fn require_admin(&self, action: &'static str) -> Result<(), Error> {
        if self.role >= Role::Admin {
            return Ok(());
        }
        Err(Error::forbidden(format!("{action} requires the admin role")).with_details(json!({
            "code": "admin_required",
            "action": action,
        })))
    }
}

/// Decide whether an actor may mutate a resource owned by `owner_user_id`.
///
/// Owners are always allowed. Otherwise the actor needs `required_role` (or
/// higher); with no required role only the owner may proceed.
///
/// # Examples
/// ```
/// use review_catalogue::domain::{Role, UserId, can_mutate};
///
/// let owner = UserId::random();
/// let other = UserId::random();
/// assert!(can_mutate(&owner, Role::User, &owner, None));
/// assert!(!can_mutate(&other, Role::Moderator, &owner, Some(Role::Admin)));
/// assert!(can_mutate(&other, Role::Admin, &owner, Some(Role::Admin)));
/// ```
#[must_use]
pub fn can_mutate(
    actor_user_id: &UserId,
    actor_role: Role,
    owner_user_id: &UserId,
    required_role: Option<Role>,
) -> bool {
    if actor_user_id == owner_user_id {
        return true;
    }
    required_role.is_some_and(|required| actor_role >= required)
}

/// Named ownership contract for one kind of mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationPolicy {
    action: &'static str,
    privileged_role: Option<Role>,
}

impl MutationPolicy {
    /// Only the author may edit a review.
    pub const REVIEW_UPDATE: Self = Self::owner_only("update review");
    /// The author or an administrator may delete a review.
    pub const REVIEW_DELETE: Self = Self::owner_or("delete review", Role::Admin);
    /// Only the author may edit a comment.
    pub const COMMENT_UPDATE: Self = Self::owner_only("update comment");
    /// The author, a moderator or an administrator may delete a comment.
    pub const COMMENT_DELETE: Self = Self::owner_or("delete comment", Role::Moderator);

    const fn owner_only(action: &'static str) -> Self {
        Self {
            action,
            privileged_role: None,
        }
    }

    const fn owner_or(action: &'static str, role: Role) -> Self {
        Self {
            action,
            privileged_role: Some(role),
        }
    }

    /// Human-readable action name.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        self.action
    }

    /// Role that may act on resources owned by someone else.
    #[must_use]
    pub const fn privileged_role(&self) -> Option<Role> {
        self.privileged_role
    }

    /// Check the policy, returning [`crate::domain::ErrorCode::Forbidden`]
    /// when the actor is neither owner nor sufficiently privileged.
    pub fn authorise(&self, actor: &Actor, owner_user_id: &UserId) -> Result<(), Error> {
        if can_mutate(
            actor.user_id(),
            actor.role(),
            owner_user_id,
            self.privileged_role,
        ) {
            return Ok(());
        }
        Err(
            Error::forbidden(format!("not permitted to {}", self.action)).with_details(json!({
                "code": "not_owner",
                "action": self.action,
            })),
        )
    }
}
