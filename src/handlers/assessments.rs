//! Assessment handlers

use axum::{extract::{rejection::JsonRejection, Path, State}, Json};

use crate::{AppState, AppResult, AppError};
use crate::models::{Assessment, AssessmentDetail, AssessmentPayload, PredictResponse};
use crate::middleware::auth::UserContext;

/// Validate and store a submission, then classify it
pub async fn predict(
    State(state): State<AppState>,
    user: UserContext,
    payload: Result<Json<AssessmentPayload>, JsonRejection>,
) -> AppResult<Json<PredictResponse>> {
    let Json(payload) = payload?;
    let assessment = payload.into_new_assessment()?;

    let record = Assessment::create(&state.pool, user.user_id, &assessment).await?;

    let prediction = state.predictor.classify_with_confidence(&assessment);

    let record = Assessment::record_prediction(&state.pool, record.id, &prediction)
        .await?
        .ok_or_else(|| {
            AppError::InternalError(format!("Prediction already recorded for assessment {}", record.id))
        })?;

    tracing::info!(
        "Assessment {} classified as {} ({:.3}) for student {}",
        record.id, prediction.risk, prediction.confidence, user.user_id
    );

    Ok(Json(PredictResponse {
        id: record.id,
        risk: prediction.risk,
        confidence: prediction.confidence,
    }))
}

/// The caller's own submissions, newest first
pub async fn list(
    State(state): State<AppState>,
    user: UserContext,
) -> AppResult<Json<Vec<Assessment>>> {
    let mut assessments = Assessment::list_by_student(&state.pool, user.user_id).await?;
    assessments.reverse();
    Ok(Json(assessments))
}

/// Single assessment, owner or staff only
pub async fn get(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<i64>,
) -> AppResult<Json<AssessmentDetail>> {
    let assessment = Assessment::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Assessment not found".to_string()))?;

    if !assessment.is_visible_to(user.user_id, user.is_staff) {
        tracing::warn!("User {} denied access to assessment {}", user.user_id, id);
        return Err(AppError::Forbidden);
    }

    Ok(Json(assessment.into_detail()))
}
