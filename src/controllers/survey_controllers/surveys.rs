use axum::{
    extract::{Query, State},
    Json,
};

use crate::controllers::survey_controllers::models::{ListSurveysQuery, SurveyResponse};
use crate::state::AppState;
use crate::utils::error::AppResult;

pub async fn get_all_surveys(
    State(state): State<AppState>,
    Query(query): Query<ListSurveysQuery>,
) -> AppResult<Json<Vec<SurveyResponse>>> {
    let surveys = state.lifecycle.list_surveys(query.active).await?;

    let survey_responses: Vec<SurveyResponse> = surveys
        .into_iter()
        .map(SurveyResponse::from)
        .collect();

    Ok(Json(survey_responses))
}
