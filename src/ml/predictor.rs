//! Predictor - loads the pipeline once, classifies submissions
//!
//! Loaded at process start and shared read-only behind an `Arc`.
//! Classification itself cannot fail: every artifact problem is caught at load.

use std::path::Path;

use serde::Serialize;

use super::features::FeatureMapper;
use super::pipeline::{PipelineArtifact, RiskPipeline};
use super::PredictorError;
use crate::models::NewAssessment;
use crate::survey::RiskLevel;

/// Classifier output for one submission
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub risk: RiskLevel,
    /// Highest class probability, 3 decimals
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct Predictor {
    mapper: FeatureMapper,
    pipeline: RiskPipeline,
}

impl Predictor {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PredictorError> {
        let path = path.as_ref();
        tracing::info!("Loading risk model from: {}", path.display());

        if !path.exists() {
            return Err(PredictorError::NotFound(path.to_path_buf()));
        }

        let json = std::fs::read_to_string(path).map_err(|source| PredictorError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let predictor = Self::from_json(&json)?;
        tracing::info!(
            "Risk model loaded: {} v{} ({} classes)",
            predictor.pipeline.name,
            predictor.pipeline.version,
            predictor.pipeline.classes().len()
        );

        Ok(predictor)
    }

    pub fn from_json(json: &str) -> Result<Self, PredictorError> {
        let artifact: PipelineArtifact = serde_json::from_str(json)?;
        let (pipeline, encoder) = RiskPipeline::from_artifact(artifact)?;

        Ok(Self {
            mapper: FeatureMapper::new(encoder),
            pipeline,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.pipeline.name
    }

    pub fn model_version(&self) -> &str {
        &self.pipeline.version
    }

    /// Predicted class only
    pub fn classify(&self, assessment: &NewAssessment) -> RiskLevel {
        let features = self.mapper.map(assessment);
        self.pipeline.predict(&features).0
    }

    /// Predicted class plus the probability the model assigns to it
    pub fn classify_with_confidence(&self, assessment: &NewAssessment) -> Prediction {
        let features = self.mapper.map(assessment);

        if tracing::enabled!(tracing::Level::TRACE) {
            for (name, value) in features.named() {
                tracing::trace!("feature {} = {}", name, value);
            }
        }

        let (risk, probability) = self.pipeline.predict(&features);

        Prediction {
            risk,
            confidence: (probability * 1000.0).round() / 1000.0,
        }
    }
}
