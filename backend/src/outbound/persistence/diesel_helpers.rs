//! Shared helpers for the Diesel repository implementations.
//!
//! Adapters keep their own `map_pool_error` / `map_diesel_error` pair so each
//! can pick which database failures deserve a dedicated port variant; the
//! functions here cover the parts they all share.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Extract a readable message from a pool error.
pub fn map_pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

/// Extract a readable message from a Diesel error and emit debug context.
pub fn map_diesel_error_message(error: DieselError, operation: &str) -> String {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), %operation, "diesel operation failed");
        }
        _ => debug!(%error, %operation, "diesel operation failed"),
    }
    error.to_string()
}

/// Whether the store closed the connection underneath the query.
pub fn is_connection_error(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
            | DieselError::BrokenTransactionManager
    )
}

/// Whether a unique index or constraint rejected the write.
pub fn is_unique_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

/// Whether a foreign key rejected the write.
pub fn is_foreign_key_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)
    )
}

/// Collect row conversion results, mapping the first error through `map_err`.
pub fn collect_rows<T, E>(
    results: impl Iterator<Item = Result<T, String>>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    results.collect::<Result<Vec<_>, _>>().map_err(map_err)
}

/// Convert a non-negative database count into the domain's `u64`.
pub fn to_count(value: i64, field: &str) -> Result<u64, String> {
    u64::try_from(value).map_err(|_| format!("{field}: negative count {value}"))
}

/// Convert a domain count or offset into a SQL `BIGINT`.
pub fn to_bigint(value: u64, field: &str) -> Result<i64, String> {
    i64::try_from(value).map_err(|_| format!("{field}: {value} exceeds BIGINT"))
}

/// Build an `ILIKE` pattern matching `search` anywhere in the value.
///
/// `%`, `_` and the escape character itself are matched literally.
pub fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for ch in search.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("drama", "%drama%")]
    #[case("100%", "%100\\%%")]
    #[case("snake_case", "%snake\\_case%")]
    #[case("a\\b", "%a\\\\b%")]
    fn contains_pattern_escapes_wildcards(#[case] search: &str, #[case] expected: &str) {
        assert_eq!(contains_pattern(search), expected);
    }

    #[rstest]
    fn unique_violations_are_recognised() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        );
        assert!(is_unique_violation(&error));
        assert!(!is_foreign_key_violation(&error));
        assert!(!is_connection_error(&error));
    }

    #[rstest]
    fn closed_connections_are_recognised() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_owned()),
        );
        assert!(is_connection_error(&error));
    }

    #[rstest]
    fn negative_counts_are_rejected() {
        assert_eq!(to_count(3, "review_count"), Ok(3));
        assert!(to_count(-1, "review_count").is_err());
        assert_eq!(to_bigint(40, "offset"), Ok(40));
        assert!(to_bigint(u64::MAX, "offset").is_err());
    }

    #[rstest]
    fn pool_messages_are_unwrapped() {
        assert_eq!(
            map_pool_error_message(PoolError::checkout("timed out")),
            "timed out"
        );
    }

    #[rstest]
    fn row_errors_short_circuit() {
        let rows = vec![Ok(1), Err("bad row".to_owned()), Ok(3)];
        let result: Result<Vec<i32>, String> =
            collect_rows(rows.into_iter(), |message| format!("wrapped: {message}"));
        assert_eq!(result, Err("wrapped: bad row".to_owned()));
    }
}
