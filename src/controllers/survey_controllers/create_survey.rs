use axum::{extract::State, Json};

use crate::controllers::survey_controllers::models::{CreateSurveyRequest, SurveyResponse};
use crate::core::lifecycle::{CreateSurveySpec, QuestionSpec};
use crate::state::AppState;
use crate::utils::error::AppResult;

pub async fn create_survey(
    State(state): State<AppState>,
    Json(payload): Json<CreateSurveyRequest>,
) -> AppResult<Json<SurveyResponse>> {
    let spec = CreateSurveySpec {
        title: payload.title,
        description: payload.description,
        category: payload.category,
        creator_id: payload.creator_id,
        reward_per_participant: payload.reward_per_participant,
        max_participants: payload.max_participants,
        questions: payload
            .questions
            .into_iter()
            .map(|q| QuestionSpec {
                text: q.text,
                question_type: q.question_type,
                options: q.options,
                required: q.required,
            })
            .collect(),
    };

    let survey = state.lifecycle.create_survey(spec).await?;
    Ok(Json(survey.into()))
}
