use axum::{
    extract::{Path, State},
    Json,
};

use crate::controllers::survey_controllers::models::{ParticipationResponse, SurveyResponse};
use crate::state::AppState;
use crate::utils::error::AppResult;

pub async fn get_surveys_by_user(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<SurveyResponse>>> {
    let surveys = state.lifecycle.list_created_by(&user_id).await?;

    let survey_responses: Vec<SurveyResponse> = surveys
        .into_iter()
        .map(SurveyResponse::from)
        .collect();

    Ok(Json(survey_responses))
}

pub async fn get_user_participations(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ParticipationResponse>>> {
    let participations = state.lifecycle.list_participated_by(&user_id).await?;

    let participation_responses: Vec<ParticipationResponse> = participations
        .into_iter()
        .map(ParticipationResponse::from)
        .collect();

    Ok(Json(participation_responses))
}
