//! Error types for the tax engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while loading rule tables or
//! calculating tax.

use thiserror::Error;

/// The main error type for the tax engine.
///
/// All fallible operations in the engine return this error type, making it
/// easy to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use tax_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/income_tax.yaml".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Configuration file not found: /missing/income_tax.yaml"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A bracket or band table violates its structural invariants.
    #[error("Invalid bracket table: {message}")]
    InvalidBracketTable {
        /// What was wrong with the table.
        message: String,
    },

    /// The requested sub-region has no rules for this tax type.
    #[error("No {tax} rules for '{selector}'")]
    UnsupportedRegion {
        /// The tax type being calculated.
        tax: String,
        /// The country or state that was requested.
        selector: String,
    },

    /// A request field is outside the range the engine accepts.
    #[error("Invalid input field '{field}': {message}")]
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/file.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/file.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_unsupported_region_names_tax_and_selector() {
        let error = EngineError::UnsupportedRegion {
            tax: "national insurance".to_string(),
            selector: "sweden".to_string(),
        };
        assert_eq!(error.to_string(), "No national insurance rules for 'sweden'");
    }

    #[test]
    fn test_invalid_input_displays_field() {
        let error = EngineError::InvalidInput {
            field: "income".to_string(),
            message: "exceeds maximum".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid input field 'income': exceeds maximum"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_invalid_table() -> EngineResult<()> {
            Err(EngineError::InvalidBracketTable {
                message: "no brackets".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_invalid_table()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
