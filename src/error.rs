//! Error taxonomy shared by the pattern compiler, router, context and application.

use thiserror::Error;

use crate::router::PlaceholderKind;

/// Convenience alias used throughout the crate.
pub type Result<T, E = PigError> = std::result::Result<T, E>;

/// Every failure the routing core can report.
///
/// Nothing is retried or swallowed inside the core: registration errors come
/// back from `route`, request-time errors come back from
/// [`Application::handle`](crate::Application::handle) and are rendered by
/// [`Application::respond`](crate::Application::respond).
#[derive(Debug, Error)]
pub enum PigError {
    /// A context key or path variable was read but is not defined in this
    /// scope or any parent scope.
    #[error("attribute '{key}' not found")]
    AttributeNotFound { key: String },

    /// The key exists but holds a value of another type.
    #[error("attribute '{key}' is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// A captured path segment could not be converted by its placeholder type.
    #[error("cannot convert '{value}' bound to '{name}' into {kind}")]
    ValueConversion {
        name: String,
        value: String,
        kind: PlaceholderKind,
    },

    /// The typed path variable bag is read-only.
    #[error("path variable '{name}' is read-only")]
    ImmutableWrite { name: String },

    /// No registered router produced a response.
    #[error("no route for {method} {path}")]
    NotFound { method: String, path: String },

    /// A route template declares the same placeholder name twice.
    #[error("placeholder '{name}' appears more than once in '{template}'")]
    DuplicatePlaceholder { name: String, template: String },

    /// The compiled template is not a valid regular expression.
    #[error("invalid route template '{template}': {source}")]
    InvalidPattern {
        template: String,
        #[source]
        source: regex::Error,
    },

    /// Failure raised by user handler or interceptor code.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl PigError {
    /// HTTP status the boundary layer renders for this error.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            PigError::NotFound { .. } => 404,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_renders_404() {
        let err = PigError::NotFound {
            method: "GET".into(),
            path: "/nope".into(),
        };
        assert_eq!(err.status(), 404);
        assert_eq!(err.to_string(), "no route for GET /nope");
    }

    #[test]
    fn test_everything_else_renders_500() {
        let err = PigError::ValueConversion {
            name: "id".into(),
            value: "abc".into(),
            kind: PlaceholderKind::Int,
        };
        assert_eq!(err.status(), 500);
        assert_eq!(err.to_string(), "cannot convert 'abc' bound to 'id' into int");

        let err = PigError::from(anyhow::anyhow!("db down"));
        assert_eq!(err.status(), 500);
        assert_eq!(err.to_string(), "db down");
    }
}
