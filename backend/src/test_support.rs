//! Test utilities for the backend crate.
//!
//! Shared by unit tests in `src/` and the behavioural suites in `tests/`.
//! Compiled only for tests or with the `test-support` feature.

mod clock;
mod in_memory;

pub use clock::MutableClock;
pub use in_memory::InMemoryEntityStore;
