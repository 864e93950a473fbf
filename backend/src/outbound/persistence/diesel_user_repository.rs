//! PostgreSQL-backed user adapter.
//!
//! Roles live in `user_roles` with an explicit `position`, so the first role
//! granted stays the primary role however often the account is updated.

use async_trait::async_trait;
use diesel::dsl::max;
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{DisplayName, Role, User, UserId};

use super::diesel_helpers::{
    is_connection_error, is_unique_violation, map_diesel_error_message, map_pool_error_message,
};
use super::models::{NewUserRow, UserRoleRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{user_roles, users};

/// Diesel-backed implementation of the user port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    UserRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    if is_connection_error(&error) {
        return UserRepositoryError::connection(map_diesel_error_message(error, "users"));
    }
    UserRepositoryError::query(map_diesel_error_message(error, "users"))
}

fn map_row_error(message: String) -> UserRepositoryError {
    UserRepositoryError::query(format!("invalid user row: {message}"))
}

fn position(index: usize) -> Result<i32, String> {
    i32::try_from(index).map_err(|_| format!("role position {index} exceeds INTEGER"))
}

fn to_user(row: UserRow, roles: Vec<UserRoleRow>) -> Result<User, String> {
    let roles = roles
        .into_iter()
        .map(|role| role.role.parse::<Role>().map_err(|err| err.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    User::try_from_strings(row.id.to_string(), row.display_name, row.email, roles)
        .map_err(|err| err.to_string())
}

impl DieselUserRepository {
    async fn load_user(
        conn: &mut AsyncPgConnection,
        row: Option<UserRow>,
    ) -> Result<Option<User>, UserRepositoryError> {
        let Some(row) = row else {
            return Ok(None);
        };
        let roles: Vec<UserRoleRow> = user_roles::table
            .filter(user_roles::user_id.eq(row.id))
            .order_by(user_roles::position.asc())
            .select(UserRoleRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error)?;
        to_user(row, roles).map(Some).map_err(map_row_error)
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Self::load_user(&mut conn, row).await
    }

    async fn find_by_display_name(
        &self,
        display_name: &DisplayName,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::display_name.eq(display_name.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Self::load_user(&mut conn, row).await
    }

    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError> {
        let user_id = *user.id().as_uuid();
        let role_rows = user
            .roles()
            .iter()
            .enumerate()
            .map(|(index, role)| {
                Ok(UserRoleRow {
                    user_id,
                    role: role.as_str().to_owned(),
                    position: position(index)?,
                })
            })
            .collect::<Result<Vec<_>, String>>()
            .map_err(map_row_error)?;
        let new_user = NewUserRow {
            id: user_id,
            display_name: user.display_name().as_ref(),
            email: user.email().as_ref(),
        };
        let display_name = user.display_name().to_string();

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                diesel::insert_into(users::table)
                    .values(&new_user)
                    .execute(conn)
                    .await?;
                if !role_rows.is_empty() {
                    diesel::insert_into(user_roles::table)
                        .values(&role_rows)
                        .execute(conn)
                        .await?;
                }
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                UserRepositoryError::duplicate_display_name(display_name)
            } else {
                map_diesel_error(error)
            }
        })
    }

    async fn grant_role(&self, id: &UserId, role: Role) -> Result<(), UserRepositoryError> {
        let user_id = *id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let last: Option<i32> = user_roles::table
                    .filter(user_roles::user_id.eq(user_id))
                    .select(max(user_roles::position))
                    .get_result(conn)
                    .await?;
                diesel::insert_into(user_roles::table)
                    .values(&UserRoleRow {
                        user_id,
                        role: role.as_str().to_owned(),
                        position: last.map_or(0, |position| position + 1),
                    })
                    .on_conflict((user_roles::user_id, user_roles::role))
                    .do_nothing()
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
