//! Trained classification pipeline
//!
//! The artifact is exported from the training notebook as JSON:
//!
//! ```text
//! features ──► StandardScaler (numeric) ──┐
//!          └─► OneHot (encoded nominal) ──┴─► LogisticRegression ──► class probabilities
//! ```

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::encoder::OrdinalEncoder;
use super::features::FeatureVector;
use super::layout::{feature_index, validate_layout, CATEGORICAL_FEATURES};
use super::PredictorError;
use crate::survey::RiskLevel;

// ============================================================================
// ARTIFACT FORMAT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub name: String,
    pub version: String,
    pub feature_layout: LayoutStamp,
    /// Falls back to the closed survey vocabulary when absent
    #[serde(default)]
    pub encoder: Option<OrdinalEncoder>,
    pub preprocessor: PreprocessorSpec,
    pub classifier: ClassifierSpec,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LayoutStamp {
    pub version: u8,
    pub hash: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessorSpec {
    pub numeric: ScalerSpec,
    pub categorical: OneHotSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerSpec {
    pub features: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotSpec {
    pub features: Vec<String>,
    /// Encoded values seen per feature; anything else one-hots to all zeros
    pub categories: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierSpec {
    LogisticRegression {
        classes: Vec<i64>,
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
    },
}

// ============================================================================
// PIPELINE
// ============================================================================

#[derive(Debug, Clone)]
pub struct RiskPipeline {
    pub name: String,
    pub version: String,
    numeric_index: Vec<usize>,
    mean: Array1<f64>,
    scale: Array1<f64>,
    one_hot: Vec<(usize, Vec<f64>)>,
    classes: Vec<RiskLevel>,
    coef: Array2<f64>,
    intercept: Array1<f64>,
}

fn invalid(msg: impl Into<String>) -> PredictorError {
    PredictorError::InvalidArtifact(msg.into())
}

fn layout_indices(names: &[String]) -> Result<Vec<usize>, PredictorError> {
    names
        .iter()
        .map(|name| feature_index(name).ok_or_else(|| invalid(format!("unknown feature '{}'", name))))
        .collect()
}

impl RiskPipeline {
    /// Check an artifact against the current layout and build the pipeline
    /// plus the encoder it was fitted with
    pub fn from_artifact(artifact: PipelineArtifact) -> Result<(Self, OrdinalEncoder), PredictorError> {
        validate_layout(artifact.feature_layout.version, artifact.feature_layout.hash)?;

        let encoder = artifact.encoder.unwrap_or_else(OrdinalEncoder::from_vocabulary);
        encoder.validate()?;

        let numeric = artifact.preprocessor.numeric;
        if numeric.mean.len() != numeric.features.len() || numeric.scale.len() != numeric.features.len() {
            return Err(invalid(format!(
                "scaler expects {} features but has {} means and {} scales",
                numeric.features.len(),
                numeric.mean.len(),
                numeric.scale.len()
            )));
        }
        let numeric_index = layout_indices(&numeric.features)?;
        if numeric.features.iter().any(|f| CATEGORICAL_FEATURES.contains(&f.as_str())) {
            return Err(invalid("nominal feature listed in numeric scaler"));
        }

        let categorical = artifact.preprocessor.categorical;
        if categorical.categories.len() != categorical.features.len() {
            return Err(invalid("one-hot categories do not match its features"));
        }
        let one_hot: Vec<(usize, Vec<f64>)> = layout_indices(&categorical.features)?
            .into_iter()
            .zip(categorical.categories)
            .collect();

        let ClassifierSpec::LogisticRegression { classes, coef, intercept } = artifact.classifier;

        let classes = classes
            .into_iter()
            .map(|c| RiskLevel::from_class_index(c).ok_or(PredictorError::UnknownClass(c)))
            .collect::<Result<Vec<_>, _>>()?;
        if classes.len() < 2 {
            return Err(invalid("classifier needs at least two classes"));
        }

        // Binary models carry a single row for the positive class
        let expected_rows = if classes.len() == 2 { 1 } else { classes.len() };
        let width = numeric_index.len() + one_hot.iter().map(|(_, c)| c.len()).sum::<usize>();

        if coef.len() != expected_rows || intercept.len() != expected_rows {
            return Err(invalid(format!(
                "expected {} coefficient rows, got {} (intercepts: {})",
                expected_rows,
                coef.len(),
                intercept.len()
            )));
        }
        if let Some(row) = coef.iter().find(|row| row.len() != width) {
            return Err(invalid(format!(
                "coefficient row has {} columns, transformed width is {}",
                row.len(),
                width
            )));
        }

        let coef = Array2::from_shape_vec((expected_rows, width), coef.into_iter().flatten().collect())
            .map_err(|e| invalid(format!("coefficient matrix: {}", e)))?;

        let pipeline = Self {
            name: artifact.name,
            version: artifact.version,
            numeric_index,
            mean: Array1::from(numeric.mean),
            // Constant columns were stored with scale 0; the scaler leaves them unscaled
            scale: Array1::from_iter(numeric.scale.into_iter().map(|s| if s == 0.0 { 1.0 } else { s })),
            one_hot,
            classes,
            coef,
            intercept: Array1::from(intercept),
        };

        Ok((pipeline, encoder))
    }

    pub fn classes(&self) -> &[RiskLevel] {
        &self.classes
    }

    /// Column transformer output: scaled numerics followed by one-hot blocks
    pub fn transform(&self, features: &FeatureVector) -> Array1<f64> {
        let values = features.as_slice();

        let numeric = Array1::from_iter(self.numeric_index.iter().map(|&i| values[i]));
        let scaled = (numeric - &self.mean) / &self.scale;

        let mut row = scaled.to_vec();
        for (index, categories) in &self.one_hot {
            let value = values[*index];
            row.extend(categories.iter().map(|c| if *c == value { 1.0 } else { 0.0 }));
        }

        Array1::from(row)
    }

    /// Probability per class, in the order of [`Self::classes`]
    pub fn predict_proba(&self, features: &FeatureVector) -> Vec<f64> {
        let logits = self.coef.dot(&self.transform(features)) + &self.intercept;

        if self.classes.len() == 2 {
            let positive = 1.0 / (1.0 + (-logits[0]).exp());
            return vec![1.0 - positive, positive];
        }

        softmax(&logits.to_vec())
    }

    /// Most probable class and its probability
    pub fn predict(&self, features: &FeatureVector) -> (RiskLevel, f64) {
        let proba = self.predict_proba(features);

        // First maximum wins on ties
        let (best, p) = proba
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |acc, (i, &p)| if p > acc.1 { (i, p) } else { acc });

        (self.classes[best], p)
    }
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / total).collect()
}
