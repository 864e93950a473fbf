//! Review catalogue core.
//!
//! Users browse a catalogue of items grouped by category and labelled with
//! tags, write one review per item, and comment on reviews. Administrators
//! curate categories, items and tags. The crate is laid out hexagonally:
//!
//! - [`domain`]: entities, ranking and authorisation rules, and the services
//!   behind the driving ports.
//! - [`outbound`]: Diesel/PostgreSQL adapters for the driven ports.
//! - [`config`] and [`provisioning`]: runtime settings and the administrator
//!   bootstrap run by the binary.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod provisioning;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
