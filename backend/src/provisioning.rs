//! One-time administrator bootstrap run at process start.
//!
//! Provisioning is idempotent: it creates the configured administrator when
//! missing, grants the admin role when the account exists without it, and
//! otherwise leaves the store untouched.

use serde_json::json;
use tracing::info;

use crate::config::ProvisioningSettings;
use crate::domain::port_errors::map_user_error;
use crate::domain::ports::UserRepository;
use crate::domain::{DisplayName, Email, Error, Role, User, UserId};

/// What a provisioning run changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningOutcome {
    /// A new administrator account was inserted.
    Created(UserId),
    /// An existing account received the admin role.
    RoleGranted(UserId),
    /// The account already held the admin role.
    AlreadyProvisioned(UserId),
    /// Provisioning is disabled.
    Skipped,
}

fn required_setting<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, Error> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            Error::invalid_request(format!("admin provisioning requires {field}"))
                .with_details(json!({ "code": "missing_setting", "field": field }))
        })
}

fn invalid_setting(field: &'static str, message: impl std::fmt::Display) -> Error {
    Error::invalid_request(format!("invalid {field}: {message}"))
        .with_details(json!({ "code": "invalid_setting", "field": field }))
}

/// Ensure the configured administrator exists and holds [`Role::Admin`].
///
/// # Examples
///
/// ```rust
/// use review_catalogue::config::ProvisioningSettings;
/// use review_catalogue::provisioning::{ProvisioningOutcome, provision_admin};
/// use review_catalogue::test_support::InMemoryEntityStore;
///
/// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
/// let store = InMemoryEntityStore::default();
/// let settings = ProvisioningSettings {
///     enabled: true,
///     display_name: Some("site_admin".to_owned()),
///     email: Some("admin@example.org".to_owned()),
/// };
/// let first = provision_admin(&settings, &store).await.expect("provisioned");
/// assert!(matches!(first, ProvisioningOutcome::Created(_)));
/// let second = provision_admin(&settings, &store).await.expect("provisioned");
/// assert!(matches!(second, ProvisioningOutcome::AlreadyProvisioned(_)));
/// # });
/// ```
pub async fn provision_admin<R>(
    settings: &ProvisioningSettings,
    repo: &R,
) -> Result<ProvisioningOutcome, Error>
where
    R: UserRepository + ?Sized,
{
    if !settings.is_enabled() {
        info!(reason = "disabled", "admin provisioning skipped");
        return Ok(ProvisioningOutcome::Skipped);
    }

    let display_name = required_setting(settings.display_name.as_deref(), "display_name")?;
    let display_name =
        DisplayName::new(display_name).map_err(|err| invalid_setting("display_name", err))?;

    let existing = repo
        .find_by_display_name(&display_name)
        .await
        .map_err(map_user_error)?;

    match existing {
        Some(user) if user.has_role(Role::Admin) => {
            info!(user_id = %user.id(), "administrator already provisioned");
            Ok(ProvisioningOutcome::AlreadyProvisioned(user.id().clone()))
        }
        Some(user) => {
            repo.grant_role(user.id(), Role::Admin)
                .await
                .map_err(map_user_error)?;
            info!(user_id = %user.id(), "granted admin role to existing user");
            Ok(ProvisioningOutcome::RoleGranted(user.id().clone()))
        }
        None => {
            let email = required_setting(settings.email.as_deref(), "email")?;
            let email = Email::new(email).map_err(|err| invalid_setting("email", err))?;
            let user = User::new(UserId::random(), display_name, email, vec![Role::Admin]);
            repo.insert(&user).await.map_err(map_user_error)?;
            info!(user_id = %user.id(), display_name = %user.display_name(), "created administrator");
            Ok(ProvisioningOutcome::Created(user.id().clone()))
        }
    }
}
