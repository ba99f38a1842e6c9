//! Data models

pub mod user;
pub mod assessment;

pub use user::*;
pub use assessment::{Assessment, AssessmentDetail, AssessmentPayload, NewAssessment, PredictResponse};
