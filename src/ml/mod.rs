//! Risk model - feature mapping and the trained classifier
//!
//! Mapping is kept apart from inference so the artifact can be swapped
//! without touching the questionnaire code.

pub mod layout;
pub mod encoder;
pub mod features;
pub mod pipeline;
pub mod predictor;

use std::path::PathBuf;

pub use features::{DasScore, FeatureMapper, FeatureVector};
pub use predictor::{Prediction, Predictor};

/// Failures loading the model artifact. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum PredictorError {
    #[error("model artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read model artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed model artifact: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Layout(#[from] layout::LayoutMismatchError),

    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("model predicts unknown class {0}")]
    UnknownClass(i64),
}

#[cfg(test)]
pub(crate) const SHIPPED_MODEL: &str = include_str!("../../model/risk_pipeline.json");
