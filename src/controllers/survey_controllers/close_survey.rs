use axum::{
    extract::{Path, State},
    Json,
};

use crate::controllers::survey_controllers::models::{CreatorOnly, SurveyResponse};
use crate::state::AppState;
use crate::utils::error::AppResult;

pub async fn close_survey(
    Path(survey_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<CreatorOnly>,
) -> AppResult<Json<SurveyResponse>> {
    let survey = state
        .lifecycle
        .close_survey(&survey_id, &payload.user_id)
        .await?;
    Ok(Json(survey.into()))
}
