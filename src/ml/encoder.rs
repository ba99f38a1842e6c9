//! Ordinal encoder for the nominal survey columns
//!
//! Each column maps a category to its position in the fitted category list.
//! Anything the encoder was not fitted on becomes [`UNKNOWN_CATEGORY`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::layout::CATEGORICAL_FEATURES;
use super::PredictorError;
use crate::survey::{Gender, MobileDataPlan, PrimaryDevice};

/// Sentinel for categories outside the fitted vocabulary
pub const UNKNOWN_CATEGORY: f64 = -1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdinalEncoder {
    pub categories: BTreeMap<String, Vec<String>>,
}

impl OrdinalEncoder {
    /// Fit one column the same way the training pipeline does: sorted, unique
    pub fn fit<'a, I>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut fitted: Vec<String> = values.into_iter().map(str::to_string).collect();
        fitted.sort();
        fitted.dedup();
        self.categories.insert(column.to_string(), fitted);
        self
    }

    /// Encoder fitted on the full closed vocabulary of every nominal column
    pub fn from_vocabulary() -> Self {
        Self { categories: BTreeMap::new() }
            .fit("gender", Gender::labels())
            .fit("primary_device", PrimaryDevice::labels())
            .fit("mobile_data_plan", MobileDataPlan::labels())
    }

    pub fn encode(&self, column: &str, value: &str) -> f64 {
        self.categories
            .get(column)
            .and_then(|fitted| fitted.iter().position(|c| c == value))
            .map(|i| i as f64)
            .unwrap_or(UNKNOWN_CATEGORY)
    }

    /// Every nominal column of the layout must have been fitted
    pub fn validate(&self) -> Result<(), PredictorError> {
        for column in CATEGORICAL_FEATURES {
            match self.categories.get(column) {
                Some(fitted) if !fitted.is_empty() => {}
                _ => {
                    return Err(PredictorError::InvalidArtifact(format!(
                        "encoder has no categories for '{}'",
                        column
                    )))
                }
            }
        }
        Ok(())
    }
}
