//! Result type alias for v2fhir
//!
//! Provides a Result alias that uses [`ConvertError`] as the error type.

use super::errors::ConvertError;

/// Result type alias for v2fhir operations
///
/// # Examples
///
/// ```
/// use v2fhir::domain::result::Result;
/// use v2fhir::domain::errors::ConvertError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ConvertError::Configuration("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{ParseError, TransformError};

    #[test]
    fn test_result_with_question_mark_converts_parse_error() {
        fn inner() -> std::result::Result<(), ParseError> {
            Err(ParseError::MalformedHeader("no MSH".to_string()))
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }

        let err = outer().unwrap_err();
        assert!(matches!(err, ConvertError::Parse(_)));
    }

    #[test]
    fn test_result_with_question_mark_converts_transform_error() {
        fn inner() -> std::result::Result<(), TransformError> {
            Err(TransformError::UnsupportedEvent {
                event: "ADT^A99".to_string(),
            })
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }

        let err = outer().unwrap_err();
        assert!(matches!(err, ConvertError::Transform(_)));
    }
}
