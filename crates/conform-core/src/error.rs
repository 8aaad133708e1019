//! Error types for component registration and engine configuration.

use std::fmt;

use crate::dispatch::Strategy;

/// Errors raised while resolving a component's shape.
///
/// These surface at registration time only. Nothing in the per-tick path
/// returns them.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// No strategy in the catalog matches the component.
    NoMatchingStrategy {
        component: &'static str,
    },
    /// More than one way to drive the component at the winning priority.
    AmbiguousStrategy {
        component: &'static str,
        candidates: Vec<Strategy>,
        reason: &'static str,
    },
    /// A field descriptor that cannot be bound.
    InvalidField {
        component: &'static str,
        field: &'static str,
        reason: String,
    },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatchingStrategy { component } => {
                write!(f, "component `{component}` matches no dispatch strategy")
            }
            Self::AmbiguousStrategy {
                component,
                candidates,
                reason,
            } => write!(
                f,
                "component `{component}` is ambiguous between {candidates:?}: {reason}"
            ),
            Self::InvalidField {
                component,
                field,
                reason,
            } => write!(f, "component `{component}` field `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for ShapeError {}

/// Errors raised while loading or validating an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration could not be parsed or serialized.
    Json(serde_json::Error),
    /// A value is out of range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "config json error: {err}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Any error the engine can report outside the tick path.
#[derive(Debug)]
pub enum EngineError {
    /// Shape resolution failed.
    Shape(ShapeError),
    /// Configuration failed.
    Config(ConfigError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Shape(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<ShapeError> for EngineError {
    fn from(err: ShapeError) -> Self {
        Self::Shape(err)
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_error_display() {
        let err = ShapeError::NoMatchingStrategy { component: "silent" };
        assert_eq!(err.to_string(), "component `silent` matches no dispatch strategy");
    }

    #[test]
    fn test_engine_error_wraps_sources() {
        let err: EngineError = ConfigError::Invalid("voices must be at least 1".into()).into();
        assert!(err.to_string().contains("voices"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
