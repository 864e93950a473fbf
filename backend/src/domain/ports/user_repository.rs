//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{DisplayName, Role, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another user already holds the display name.
        DuplicateDisplayName { name: String } => "display name already taken: {name}",
    }
}

/// Port for user records and role assignments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by identifier, roles in assignment order.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch a user by exact display name.
    async fn find_by_display_name(
        &self,
        display_name: &DisplayName,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Insert a user together with its roles.
    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError>;

    /// Append a role to the user's assignments. Re-granting is a no-op.
    async fn grant_role(&self, id: &UserId, role: Role) -> Result<(), UserRepositoryError>;
}
