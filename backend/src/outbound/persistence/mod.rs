//! PostgreSQL persistence adapters using Diesel.
//!
//! Each adapter implements one or more driven ports from
//! [`crate::domain::ports`] on top of a shared [`DbPool`]. Row structs
//! (`models`) and table definitions (`schema`) never leave this module.
//!
//! - **Thin adapters**: adapters translate between rows and domain types and
//!   map database failures onto port errors. Ranking, validation and
//!   authorisation stay in the domain.
//! - **Constraint-backed invariants**: uniqueness of reviews, category names
//!   and case-folded tag names is enforced by the schema, so a race between
//!   two writers still ends in a typed port error.
//!
//! ```ignore
//! use review_catalogue::outbound::persistence::{DbPool, DieselTagRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/catalogue")).await?;
//! let tags = DieselTagRepository::new(pool);
//! ```

mod diesel_catalogue_repository;
mod diesel_helpers;
mod diesel_review_repository;
mod diesel_statistics_repository;
mod diesel_tag_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_catalogue_repository::DieselCatalogueRepository;
pub use diesel_review_repository::DieselReviewRepository;
pub use diesel_statistics_repository::DieselStatisticsRepository;
pub use diesel_tag_repository::DieselTagRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
