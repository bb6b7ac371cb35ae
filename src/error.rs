//! Error types for site evaluation

use thiserror::Error;

/// Errors raised by the evaluation core
#[derive(Debug, Error)]
pub enum Error {
    #[error("degenerate geometry in {context}: {reason}")]
    DegenerateGeometry { context: String, reason: String },

    #[error("linear program failed: {reason}")]
    LinearProgram { reason: String },

    #[error("{strategy} clustering failed: {reason}")]
    ClusteringBackend {
        strategy: &'static str,
        reason: String,
    },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("structure '{name}': {source}")]
    Structure {
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn degenerate(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub fn linear_program(reason: impl Into<String>) -> Self {
        Self::LinearProgram {
            reason: reason.into(),
        }
    }

    pub fn clustering(strategy: &'static str, reason: impl Into<String>) -> Self {
        Self::ClusteringBackend {
            strategy,
            reason: reason.into(),
        }
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Attach the name of the structure being evaluated
    pub fn in_structure(self, name: impl Into<String>) -> Self {
        Self::Structure {
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// True for hull failures caused by too few or coplanar points
    pub fn is_degenerate_geometry(&self) -> bool {
        matches!(self, Self::DegenerateGeometry { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
