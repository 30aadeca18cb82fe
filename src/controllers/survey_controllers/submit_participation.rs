use axum::{
    extract::{Path, State},
    Json,
};

use crate::controllers::survey_controllers::models::{
    ParticipationResponse, SubmitParticipationRequest,
};
use crate::state::AppState;
use crate::utils::error::AppResult;

pub async fn submit_participation(
    Path(survey_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<SubmitParticipationRequest>,
) -> AppResult<Json<ParticipationResponse>> {
    let participation = state
        .admission
        .submit_participation(&survey_id, &payload.user_id, payload.answers)
        .await?;
    Ok(Json(participation.into()))
}
