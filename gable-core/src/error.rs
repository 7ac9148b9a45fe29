/// Error types for geometry construction and rendering
use std::fmt;

/// Errors raised by the render pipeline.
///
/// Construction errors (`InvalidGeometrySpec`, `EmptyPolygon`, `InvalidPolygon`,
/// `DuplicatePolygonId`) are fatal to the call that produced them. A
/// `DegenerateProjection` is recovered per vertex by the paint stage.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A building dimension is non-finite or not strictly positive.
    InvalidGeometrySpec { field: &'static str, value: f64 },
    /// A polygon was given fewer than three vertices.
    EmptyPolygon { id: String, vertices: usize },
    /// A polygon has a non-finite vertex or an out-of-range style value.
    InvalidPolygon { id: String, reason: String },
    /// Two polygons in one scene share an id.
    DuplicatePolygonId(String),
    /// The projection denominator is zero (or close enough to it) for this point.
    DegenerateProjection { zw: f64 },
    /// Frustum parameters cannot produce a projection matrix.
    InvalidFrustum(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGeometrySpec { field, value } => {
                write!(f, "invalid building spec: {field} must be finite and > 0, got {value}")
            }
            Self::EmptyPolygon { id, vertices } => {
                write!(f, "polygon '{id}' needs at least 3 vertices, got {vertices}")
            }
            Self::InvalidPolygon { id, reason } => write!(f, "polygon '{id}' is invalid: {reason}"),
            Self::DuplicatePolygonId(id) => write!(f, "duplicate polygon id '{id}'"),
            Self::DegenerateProjection { zw } => {
                write!(f, "degenerate projection: depth denominator {zw} is too close to zero")
            }
            Self::InvalidFrustum(reason) => write!(f, "invalid frustum: {reason}"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Errors raised while loading or validating a [`crate::config::ViewerConfig`].
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

impl From<RenderError> for ConfigError {
    fn from(err: RenderError) -> Self {
        Self::Invalid(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_field() {
        let err = RenderError::InvalidGeometrySpec {
            field: "width",
            value: -1.0,
        };
        assert!(err.to_string().contains("width"));
    }

    #[test]
    fn test_config_error_source() {
        let err = ConfigError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(std::error::Error::source(&ConfigError::Invalid("x".into())).is_none());
    }
}
