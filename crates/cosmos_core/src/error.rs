//! Error types for scene composition and asset upload.

use std::fmt;

/// A descriptor set that violates the scene invariants.
///
/// Raised before any painting or scene construction happens.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// No descriptors were supplied.
    EmptySystem,
    /// No body has an orbit distance of zero.
    MissingAnchor,
    /// More than one body has an orbit distance of zero.
    MultipleAnchors(Vec<String>),
    /// Radius is zero or negative.
    NonPositiveRadius { name: String, radius: f32 },
    /// Orbit distance is negative.
    NegativeOrbitDistance { name: String, distance: f32 },
    /// A numeric field is NaN or infinite.
    NonFinite { name: String, field: &'static str },
    /// Two bodies resolve to the same identifier.
    DuplicateId(String),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::EmptySystem => write!(f, "system has no bodies"),
            ConfigurationError::MissingAnchor => {
                write!(f, "system has no anchor body (orbit distance 0)")
            }
            ConfigurationError::MultipleAnchors(names) => write!(
                f,
                "system has {} anchor bodies, expected exactly one: {}",
                names.len(),
                names.join(", ")
            ),
            ConfigurationError::NonPositiveRadius { name, radius } => {
                write!(f, "body '{}' has non-positive radius {}", name, radius)
            }
            ConfigurationError::NegativeOrbitDistance { name, distance } => {
                write!(f, "body '{}' has negative orbit distance {}", name, distance)
            }
            ConfigurationError::NonFinite { name, field } => {
                write!(f, "body '{}' has a non-finite {}", name, field)
            }
            ConfigurationError::DuplicateId(id) => write!(f, "duplicate body id '{}'", id),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Errors surfaced to the host.
#[derive(Debug)]
pub enum CosmosError {
    /// Descriptor set rejected before scene construction.
    Configuration(ConfigurationError),
    /// Graphics-side resource could not be created or was lost.
    Resource(String),
    /// File system error
    Io(std::io::Error),
    /// JSON (de)serialization error
    Json(serde_json::Error),
    /// PNG encoding error
    Image(image::ImageError),
}

impl fmt::Display for CosmosError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CosmosError::Configuration(e) => write!(f, "Configuration error: {}", e),
            CosmosError::Resource(msg) => write!(f, "Resource error: {}", msg),
            CosmosError::Io(e) => write!(f, "IO error: {}", e),
            CosmosError::Json(e) => write!(f, "JSON error: {}", e),
            CosmosError::Image(e) => write!(f, "Image error: {}", e),
        }
    }
}

impl std::error::Error for CosmosError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CosmosError::Configuration(e) => Some(e),
            CosmosError::Resource(_) => None,
            CosmosError::Io(e) => Some(e),
            CosmosError::Json(e) => Some(e),
            CosmosError::Image(e) => Some(e),
        }
    }
}

impl From<ConfigurationError> for CosmosError {
    fn from(e: ConfigurationError) -> Self {
        CosmosError::Configuration(e)
    }
}

impl From<std::io::Error> for CosmosError {
    fn from(e: std::io::Error) -> Self {
        CosmosError::Io(e)
    }
}

impl From<serde_json::Error> for CosmosError {
    fn from(e: serde_json::Error) -> Self {
        CosmosError::Json(e)
    }
}

impl From<image::ImageError> for CosmosError {
    fn from(e: image::ImageError) -> Self {
        CosmosError::Image(e)
    }
}

/// Result type for fallible core operations.
pub type CosmosResult<T> = Result<T, CosmosError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_anchor_message_lists_names() {
        let err = ConfigurationError::MultipleAnchors(vec!["Sol".into(), "Sirius".into()]);
        let msg = err.to_string();
        assert!(msg.contains("2 anchor bodies"));
        assert!(msg.contains("Sol, Sirius"));
    }

    #[test]
    fn test_configuration_error_converts() {
        let err: CosmosError = ConfigurationError::MissingAnchor.into();
        assert!(matches!(
            err,
            CosmosError::Configuration(ConfigurationError::MissingAnchor)
        ));
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
