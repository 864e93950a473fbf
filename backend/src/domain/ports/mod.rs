//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`) are implemented by storage adapters. Driving
//! ports (`*Command`, `*Query`) are implemented by the domain services and
//! called by whatever sits in front of the core.

mod macros;
pub(crate) use macros::define_port_error;

mod catalogue_admin_command;
mod catalogue_query;
mod catalogue_repository;
mod comment_command;
mod comment_repository;
mod review_command;
mod review_repository;
mod statistics_query;
mod statistics_repository;
mod tag_association_command;
mod tag_repository;
mod user_repository;

pub use catalogue_admin_command::{CatalogueAdminCommand, ItemInput};
pub use catalogue_query::CatalogueQuery;
#[cfg(test)]
pub use catalogue_repository::MockCatalogueRepository;
pub use catalogue_repository::{
    CatalogueListing, CatalogueRepository, CatalogueRepositoryError,
};
pub use comment_command::CommentCommand;
#[cfg(test)]
pub use comment_repository::MockCommentRepository;
pub use comment_repository::{CommentRepository, CommentRepositoryError};
pub use review_command::{CreateReviewRequest, ReviewCommand, ReviewFields, ReviewQuery};
#[cfg(test)]
pub use review_repository::MockReviewRepository;
pub use review_repository::{ReviewRepository, ReviewRepositoryError};
pub use statistics_query::StatisticsQuery;
#[cfg(test)]
pub use statistics_repository::MockStatisticsRepository;
pub use statistics_repository::{StatisticsRepository, StatisticsRepositoryError};
pub use tag_association_command::TagAssociationCommand;
#[cfg(test)]
pub use tag_repository::MockTagRepository;
pub use tag_repository::{TagRepository, TagRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
