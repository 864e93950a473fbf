//! `review-catalogue` command-line entry point.
//!
//! Runs migrations, bootstraps the administrator account and exposes the
//! read side of the catalogue for operators.

use std::env;
use std::ffi::OsString;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use serde::Serialize;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use review_catalogue::config::{CatalogueSettings, ProvisioningSettings};
use review_catalogue::domain::ports::{CatalogueQuery, StatisticsQuery};
use review_catalogue::domain::{
    CatalogueQueryService, CategoryId, ItemFilter, StatisticsService, TagId,
};
use review_catalogue::outbound::persistence::{
    DbPool, DieselCatalogueRepository, DieselStatisticsRepository, DieselTagRepository,
    DieselUserRepository, run_pending_migrations,
};
use review_catalogue::provisioning::provision_admin;

const PROGRAM_NAME: &str = "review-catalogue";

/// `review-catalogue` command arguments.
#[derive(Debug, Parser)]
#[command(name = PROGRAM_NAME, about = "Review catalogue maintenance and queries", version)]
struct Cli {
    /// Database connection URL. Falls back to `CATALOGUE_DATABASE_URL`, then
    /// `DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending schema migrations.
    Migrate,
    /// Apply migrations, then ensure the configured administrator exists.
    Provision(ProvisionArgs),
    /// Print platform statistics as JSON.
    Stats,
    /// Query catalogue items and print the page as JSON.
    Items(ItemsArgs),
}

#[derive(Debug, Args)]
struct ProvisionArgs {
    /// Administrator display name; overrides `CATALOGUE_ADMIN_DISPLAY_NAME`.
    #[arg(long = "display-name", value_name = "name")]
    display_name: Option<String>,
    /// Administrator email; overrides `CATALOGUE_ADMIN_EMAIL`.
    #[arg(long, value_name = "address")]
    email: Option<String>,
}

#[derive(Debug, Args)]
struct ItemsArgs {
    /// Case-insensitive title substring.
    #[arg(long)]
    search: Option<String>,
    /// Restrict to one category.
    #[arg(long, value_name = "id")]
    category: Option<i64>,
    /// Items carrying any of these tags. Repeatable.
    #[arg(long = "tag", value_name = "id")]
    tags: Vec<i64>,
    /// `title` or `rating`; id order when omitted.
    #[arg(long = "sort", value_name = "key")]
    sort_by: Option<String>,
    /// Sort ascending instead of descending.
    #[arg(long)]
    ascending: bool,
    /// One-based page number.
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    page: i64,
    /// Rows per page; values below one become one.
    #[arg(
        long = "page-size",
        default_value_t = i64::from(pagination::DEFAULT_PAGE_SIZE),
        allow_negative_numbers = true
    )]
    page_size: i64,
}

impl From<ItemsArgs> for ItemFilter {
    fn from(args: ItemsArgs) -> Self {
        Self {
            search: args.search,
            category_id: args.category.map(CategoryId::new),
            tag_ids: args.tags.into_iter().map(TagId::new).collect(),
            sort_by: args.sort_by,
            descending: !args.ascending,
            page: args.page,
            page_size: args.page_size,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(async_main(Cli::parse()))
}

async fn async_main(cli: Cli) -> Result<()> {
    let settings = CatalogueSettings::load_from_iter([OsString::from(PROGRAM_NAME)])
        .wrap_err("load catalogue settings")?;
    let database_url = resolve_database_url(cli.database_url, settings.database_url.clone())?;

    match cli.command {
        Command::Migrate => migrate(&database_url).await,
        Command::Provision(args) => {
            migrate(&database_url).await?;
            provision(&settings, &database_url, args).await
        }
        Command::Stats => {
            let pool = connect(&settings, &database_url).await?;
            let service =
                StatisticsService::new(Arc::new(DieselStatisticsRepository::new(pool)));
            let stats = service.get_stats().await.wrap_err("compute statistics")?;
            print_json(&stats)
        }
        Command::Items(args) => {
            let pool = connect(&settings, &database_url).await?;
            let service = CatalogueQueryService::new(
                Arc::new(DieselCatalogueRepository::new(pool.clone())),
                Arc::new(DieselTagRepository::new(pool)),
            );
            let page = service
                .query_items(ItemFilter::from(args))
                .await
                .wrap_err("query items")?;
            print_json(&page)
        }
    }
}

async fn connect(settings: &CatalogueSettings, database_url: &str) -> Result<DbPool> {
    DbPool::new(settings.pool_config(database_url))
        .await
        .wrap_err("create database pool")
}

async fn migrate(database_url: &str) -> Result<()> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&url))
        .await
        .wrap_err("join migration task")?
        .wrap_err("run migrations")?;
    info!(count = applied.len(), "schema up to date");
    Ok(())
}

async fn provision(
    catalogue: &CatalogueSettings,
    database_url: &str,
    args: ProvisionArgs,
) -> Result<()> {
    let mut settings = ProvisioningSettings::load_from_iter([OsString::from(PROGRAM_NAME)])
        .wrap_err("load provisioning settings")?;
    if args.display_name.is_some() || args.email.is_some() {
        settings.enabled = true;
    }
    if let Some(display_name) = args.display_name {
        settings.display_name = Some(display_name);
    }
    if let Some(email) = args.email {
        settings.email = Some(email);
    }

    let pool = connect(catalogue, database_url).await?;
    let users = DieselUserRepository::new(pool);
    let outcome = provision_admin(&settings, &users)
        .await
        .wrap_err("provision administrator")?;
    info!(?outcome, "provisioning finished");
    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).wrap_err("render JSON")?;
    println!("{rendered}");
    Ok(())
}

fn resolve_database_url(explicit: Option<String>, configured: Option<String>) -> Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(eyre!("--database-url must not be empty when provided"));
        }
        return Ok(value);
    }
    if let Some(value) = configured.filter(|value| !value.trim().is_empty()) {
        return Ok(value);
    }

    let from_env = env::var("DATABASE_URL").map_err(|_| {
        eyre!("database URL missing: set --database-url, CATALOGUE_DATABASE_URL or DATABASE_URL")
    })?;
    if from_env.trim().is_empty() {
        return Err(eyre!("DATABASE_URL must not be empty"));
    }
    Ok(from_env)
}

#[cfg(test)]
mod tests {
    //! Unit tests for CLI parsing helpers.

    use clap::CommandFactory;
    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[rstest]
    fn explicit_url_wins() {
        let url = resolve_database_url(
            Some("postgres://flag/db".to_owned()),
            Some("postgres://config/db".to_owned()),
        )
        .expect("url resolves");
        assert_eq!(url, "postgres://flag/db");
    }

    #[rstest]
    fn configured_url_beats_environment() {
        let _guard = lock_env([("DATABASE_URL", Some("postgres://env/db".to_owned()))]);
        let url = resolve_database_url(None, Some("postgres://config/db".to_owned()))
            .expect("url resolves");
        assert_eq!(url, "postgres://config/db");
    }

    #[rstest]
    fn environment_is_the_last_resort() {
        let _guard = lock_env([("DATABASE_URL", Some("postgres://env/db".to_owned()))]);
        let url = resolve_database_url(None, None).expect("url resolves");
        assert_eq!(url, "postgres://env/db");
    }

    #[rstest]
    fn blank_flag_is_rejected() {
        assert!(resolve_database_url(Some("  ".to_owned()), None).is_err());
    }

    #[rstest]
    fn missing_url_is_an_error() {
        let _guard = lock_env([("DATABASE_URL", None::<String>)]);
        assert!(resolve_database_url(None, None).is_err());
    }

    #[rstest]
    fn item_flags_become_a_filter() {
        let cli = Cli::try_parse_from([
            PROGRAM_NAME,
            "items",
            "--search",
            "ring",
            "--tag",
            "3",
            "--tag",
            "5",
            "--sort",
            "rating",
            "--ascending",
            "--page-size",
            "500",
        ])
        .expect("arguments parse");
        let Command::Items(args) = cli.command else {
            panic!("expected items command");
        };
        let filter = ItemFilter::from(args);
        assert_eq!(filter.search.as_deref(), Some("ring"));
        assert_eq!(filter.tag_ids, vec![TagId::new(3), TagId::new(5)]);
        assert_eq!(filter.sort_by.as_deref(), Some("rating"));
        assert!(!filter.descending);
        assert_eq!(filter.page, 1);
        assert_eq!(filter.page_size, 500);
    }
}
