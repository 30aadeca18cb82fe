use axum::{
    extract::{Path, State},
    Json,
};

use crate::controllers::survey_controllers::models::SurveyResponse;
use crate::state::AppState;
use crate::utils::error::AppResult;

pub async fn get_survey(
    Path(survey_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<SurveyResponse>> {
    let survey = state.lifecycle.get_survey(&survey_id).await?;
    Ok(Json(survey.into()))
}
