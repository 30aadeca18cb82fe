use axum::{
    routing::{get, post},
    Router,
};

use crate::controllers::survey_controllers::{
    close_survey, create_survey, get_results, get_survey, get_user_surveys, retry_rewards,
    submit_participation, surveys,
};
use crate::state::AppState;

pub fn survey_routes(state: AppState) -> Router {
    Router::new()
        .route("/create", post(create_survey::create_survey))
        .route("/", get(surveys::get_all_surveys))
        .route("/:surveyId", get(get_survey::get_survey))
        .route("/:surveyId/close", post(close_survey::close_survey))
        .route(
            "/:surveyId/participations",
            post(submit_participation::submit_participation),
        )
        .route("/:surveyId/results", get(get_results::get_results))
        .route("/:surveyId/analysis", get(get_results::get_analysis))
        .route("/user/:userId", get(get_user_surveys::get_surveys_by_user))
        .route(
            "/participations/user/:userId",
            get(get_user_surveys::get_user_participations),
        )
        .route("/rewards/retry", post(retry_rewards::retry_rewards))
        .with_state(state)
}
