//! Common error types.

use thiserror::Error;

/// Main error type for scene construction, rendering and encoding.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate layer id: {0}")]
    DuplicateId(String),

    #[error("Cyclic reference through layer: {0}")]
    CyclicReference(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Resource error: {0}")]
    Resource(String),

    #[error("Unsupported export: {0}")]
    UnsupportedExport(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SceneResult<T> = Result<T, SceneError>;

impl SceneError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn duplicate(id: impl Into<String>) -> Self {
        Self::DuplicateId(id.into())
    }

    pub fn cyclic(id: impl Into<String>) -> Self {
        Self::CyclicReference(id.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedExport(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Whether the error was raised before any drawing or registry mutation.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SceneError::duplicate("a").to_string(),
            "Duplicate layer id: a"
        );
        assert!(SceneError::validation("width must be > 0").is_validation());
        assert!(!SceneError::render("boom").is_validation());
    }

    #[test]
    fn test_io_conversion() {
        let err: SceneError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, SceneError::Io(_)));
    }
}
