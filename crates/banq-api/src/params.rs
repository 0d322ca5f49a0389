//! Database-name and date parameter validation.
//!
//! The date check is the only sanitisation date values receive: they are
//! never spliced into SQL text, only bound. It is purely syntactic
//! (`YYYY-MM-DD` with ASCII digits), so `2025-02-30` passes and is left
//! to the storage engine's date functions.

/// Length of an ISO `YYYY-MM-DD` date.
const ISO_DATE_LEN: usize = 10;

/// Validation failures. The display text is returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// The database name does not start with the endpoint's prefix.
    #[error("Invalid database name. Must start with {expected}")]
    PrefixMismatch {
        /// The required prefix.
        expected: String,
    },

    /// A required query parameter is absent or empty.
    #[error("Missing required parameter: {0}")]
    MissingParam(String),

    /// A date parameter is not shaped `YYYY-MM-DD`.
    #[error("Invalid {0} date format. Use YYYY-MM-DD")]
    InvalidFormat(String),
}

/// Check that `db_name` starts with `required_prefix` (case-sensitive).
///
/// An empty name never passes.
///
/// # Errors
///
/// Returns [`ParamError::PrefixMismatch`] on mismatch.
pub fn check_prefix(db_name: &str, required_prefix: &str) -> Result<(), ParamError> {
    if db_name.is_empty() || !db_name.starts_with(required_prefix) {
        return Err(ParamError::PrefixMismatch {
            expected: required_prefix.to_owned(),
        });
    }
    Ok(())
}

/// Extract the date parameter `name` from decoded query pairs.
///
/// When a parameter repeats, the first occurrence wins.
///
/// # Errors
///
/// Returns [`ParamError::MissingParam`] if the parameter is absent or
/// empty, and [`ParamError::InvalidFormat`] if it is not `YYYY-MM-DD`.
pub fn extract_date(query: &[(String, String)], name: &str) -> Result<String, ParamError> {
    let value = query
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ParamError::MissingParam(name.to_owned()))?;

    if !is_iso_date(value) {
        return Err(ParamError::InvalidFormat(name.to_owned()));
    }

    Ok(value.to_owned())
}

/// Whether `value` is exactly four digits, `-`, two digits, `-`, two digits.
pub fn is_iso_date(value: &str) -> bool {
    value.len() == ISO_DATE_LEN
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        })
}
