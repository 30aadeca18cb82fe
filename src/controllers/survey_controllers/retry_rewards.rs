use axum::{extract::State, Json};

use crate::controllers::survey_controllers::models::RetrySummaryResponse;
use crate::state::AppState;
use crate::utils::error::AppResult;

/// Operator trigger for the settlement retry sweep. Terminal (permanent)
/// failures are reported but never re-attempted.
pub async fn retry_rewards(
    State(state): State<AppState>,
) -> AppResult<Json<RetrySummaryResponse>> {
    let summary = state.settlement.retry_failed_settlements().await?;
    Ok(Json(RetrySummaryResponse {
        retried: summary.retried,
        settled: summary.settled,
        still_failed: summary.still_failed,
        skipped_terminal: summary.skipped_terminal,
    }))
}
