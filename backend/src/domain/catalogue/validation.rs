//! Validation helpers shared by catalogue entities.

use super::CatalogueValidationError;

pub(super) fn normalise_name(
    value: String,
    field: &'static str,
    max: usize,
) -> Result<String, CatalogueValidationError> {
    let trimmed = validate_non_empty_field(value, field)?.trim().to_owned();
    ensure_max_chars(&trimmed, field, max)?;
    Ok(trimmed)
}

pub(super) fn validate_non_empty_field(
    value: String,
    field: &'static str,
) -> Result<String, CatalogueValidationError> {
    if value.trim().is_empty() {
        return Err(CatalogueValidationError::EmptyField { field });
    }
    Ok(value)
}

fn ensure_max_chars(
    value: &str,
    field: &'static str,
    max: usize,
) -> Result<(), CatalogueValidationError> {
    if value.chars().count() > max {
        return Err(CatalogueValidationError::TooLong { field, max });
    }
    Ok(())
}
