//! Error context extension trait
//!
//! A context extension trait similar to `anyhow::Context` that works with
//! `Result<T, ConvertError>`, so library code can annotate errors without
//! giving up the typed error.
//!
//! # Examples
//!
//! ```rust
//! use v2fhir::domain::Result;
//! use v2fhir::domain::context::ResultExt;
//!
//! fn read_message(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).context(format!("Failed to read message file: {path}"))
//! }
//! ```

use crate::domain::errors::ConvertError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
///
/// Unlike anyhow, the error stays a [`ConvertError`]. Parse and transform
/// errors are kept as-is so callers can still match on the violated rule;
/// every other variant is folded into [`ConvertError::Other`] with the
/// context prefixed.
pub trait ResultExt<T> {
    /// Add context to an error (evaluated eagerly)
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error using a closure (evaluated only on error)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use v2fhir::domain::Result;
    /// use v2fhir::domain::context::ResultExt;
    ///
    /// fn write_resource(dir: &str, name: &str) -> Result<()> {
    ///     std::fs::write(format!("{dir}/{name}"), b"{}")
    ///         .with_context(|| format!("Failed to write {name} into {dir}"))
    /// }
    /// ```
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ConvertError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| attach(e.into(), context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| attach(e.into(), f()))
    }
}

fn attach(base: ConvertError, context: impl std::fmt::Display) -> ConvertError {
    match base {
        // Rule-carrying errors are reported per message; keep them matchable.
        ConvertError::Parse(_) | ConvertError::Transform(_) => {
            tracing::debug!(context = %context, error = %base, "Error context dropped for rule error");
            base
        }
        other => ConvertError::Other(format!("{context}: {other}")),
    }
}
