use axum::{
    extract::{Path, State},
    Json,
};

use crate::controllers::survey_controllers::models::AnalysisResponse;
use crate::core::analytics::{compute_response_breakdown, SurveyBreakdown};
use crate::state::AppState;
use crate::utils::error::AppResult;

pub async fn get_results(
    Path(survey_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<SurveyBreakdown>> {
    let survey = state.lifecycle.get_survey(&survey_id).await?;
    let participations = state.store.list_participations(&survey_id).await?;

    Ok(Json(compute_response_breakdown(&survey, &participations)))
}

pub async fn get_analysis(
    Path(survey_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<AnalysisResponse>> {
    let survey = state.lifecycle.get_survey(&survey_id).await?;
    let participations = state.store.list_participations(&survey_id).await?;
    let breakdown = compute_response_breakdown(&survey, &participations);

    let analysis = match state.analysis.analyze(&breakdown).await {
        Ok(text) => text,
        Err(err) => {
            eprintln!("AI analysis failed for survey {}: {}", survey_id, err);
            "analysis unavailable".to_string()
        }
    };

    Ok(Json(AnalysisResponse {
        survey_id,
        analysis,
    }))
}
