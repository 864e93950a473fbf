//! Runtime configuration loaded via OrthoConfig.
//!
//! Values come from CLI arguments, `CATALOGUE_*` / `CATALOGUE_ADMIN_*`
//! environment variables and configuration files, in OrthoConfig's usual
//! precedence order.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::outbound::persistence::PoolConfig;

const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_POOL_MIN_IDLE: u32 = 2;
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Database and pool settings for the catalogue.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CATALOGUE")]
pub struct CatalogueSettings {
    /// PostgreSQL connection URL. `DATABASE_URL` is consulted when unset.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    pub pool_max_size: Option<u32>,
    /// Idle connections kept warm.
    pub pool_min_idle: Option<u32>,
    /// Seconds to wait for a pooled connection.
    pub connection_timeout_secs: Option<u64>,
}

impl CatalogueSettings {
    /// Maximum pooled connections, defaulting to 10.
    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    /// Idle connections kept warm, defaulting to 2.
    pub fn pool_min_idle(&self) -> u32 {
        self.pool_min_idle.unwrap_or(DEFAULT_POOL_MIN_IDLE)
    }

    /// Pool checkout timeout, defaulting to 30 seconds.
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(
            self.connection_timeout_secs
                .unwrap_or(DEFAULT_CONNECTION_TIMEOUT_SECS),
        )
    }

    /// Build a pool configuration for `database_url` from these settings.
    pub fn pool_config(&self, database_url: impl Into<String>) -> PoolConfig {
        PoolConfig::new(database_url)
            .with_max_size(self.pool_max_size())
            .with_min_idle(Some(self.pool_min_idle()))
            .with_connection_timeout(self.connection_timeout())
    }
}

/// Settings for bootstrapping the administrator account.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CATALOGUE_ADMIN")]
pub struct ProvisioningSettings {
    /// Run provisioning at all.
    #[ortho_config(default = false)]
    pub enabled: bool,
    /// Display name of the administrator account.
    pub display_name: Option<String>,
    /// Contact address for a newly created administrator.
    pub email: Option<String>,
}

impl ProvisioningSettings {
    /// Whether provisioning should run.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const CATALOGUE_VARS: [&str; 4] = [
        "CATALOGUE_DATABASE_URL",
        "CATALOGUE_POOL_MAX_SIZE",
        "CATALOGUE_POOL_MIN_IDLE",
        "CATALOGUE_CONNECTION_TIMEOUT_SECS",
    ];

    const ADMIN_VARS: [&str; 3] = [
        "CATALOGUE_ADMIN_ENABLED",
        "CATALOGUE_ADMIN_DISPLAY_NAME",
        "CATALOGUE_ADMIN_EMAIL",
    ];

    fn unset(vars: &[&'static str]) -> Vec<(&'static str, Option<String>)> {
        vars.iter().map(|name| (*name, None)).collect()
    }

    #[rstest]
    fn catalogue_defaults_apply_when_unset() {
        let _guard = lock_env(unset(&CATALOGUE_VARS));

        let settings = CatalogueSettings::load_from_iter([OsString::from("review-catalogue")])
            .expect("config should load");
        assert!(settings.database_url.is_none());
        assert_eq!(settings.pool_max_size(), 10);
        assert_eq!(settings.pool_min_idle(), 2);
        assert_eq!(settings.connection_timeout(), Duration::from_secs(30));
    }

    #[rstest]
    fn catalogue_environment_overrides_are_respected() {
        let _guard = lock_env([
            (
                "CATALOGUE_DATABASE_URL",
                Some("postgres://localhost/catalogue".to_owned()),
            ),
            ("CATALOGUE_POOL_MAX_SIZE", Some("4".to_owned())),
            ("CATALOGUE_POOL_MIN_IDLE", Some("1".to_owned())),
            ("CATALOGUE_CONNECTION_TIMEOUT_SECS", Some("5".to_owned())),
        ]);

        let settings = CatalogueSettings::load_from_iter([OsString::from("review-catalogue")])
            .expect("config should load");
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://localhost/catalogue")
        );
        assert_eq!(settings.pool_max_size(), 4);
        assert_eq!(settings.pool_min_idle(), 1);
        let pool = settings.pool_config("postgres://localhost/catalogue");
        assert_eq!(pool.database_url(), "postgres://localhost/catalogue");
    }

    #[rstest]
    fn provisioning_is_disabled_by_default() {
        let _guard = lock_env(unset(&ADMIN_VARS));

        let settings = ProvisioningSettings::load_from_iter([OsString::from("review-catalogue")])
            .expect("config should load");
        assert!(!settings.is_enabled());
        assert!(settings.display_name.is_none());
        assert!(settings.email.is_none());
    }

    #[rstest]
    fn provisioning_reads_admin_identity() {
        let _guard = lock_env([
            ("CATALOGUE_ADMIN_ENABLED", Some("true".to_owned())),
            ("CATALOGUE_ADMIN_DISPLAY_NAME", Some("site_admin".to_owned())),
            ("CATALOGUE_ADMIN_EMAIL", Some("admin@example.org".to_owned())),
        ]);

        let settings = ProvisioningSettings::load_from_iter([OsString::from("review-catalogue")])
            .expect("config should load");
        assert!(settings.is_enabled());
        assert_eq!(settings.display_name.as_deref(), Some("site_admin"));
        assert_eq!(settings.email.as_deref(), Some("admin@example.org"));
    }
}
