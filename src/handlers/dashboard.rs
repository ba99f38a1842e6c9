//! Dashboard handlers

use axum::{extract::State, Json};

use crate::{AppState, AppResult};
use crate::analytics::{self, Insights, StudentDashboard};
use crate::models::Assessment;
use crate::middleware::auth::{require_staff, UserContext};

/// Metrics and trends over the caller's own submissions
pub async fn student(
    State(state): State<AppState>,
    user: UserContext,
) -> AppResult<Json<StudentDashboard>> {
    let assessments = Assessment::list_by_student(&state.pool, user.user_id).await?;
    Ok(Json(analytics::student_dashboard(&assessments)))
}

/// Aggregate behaviour insights across every submission
pub async fn insights(
    State(state): State<AppState>,
    user: UserContext,
) -> AppResult<Json<Insights>> {
    require_staff(&user)?;

    let assessments = Assessment::list_all(&state.pool).await?;
    Ok(Json(analytics::insights(&assessments)))
}
