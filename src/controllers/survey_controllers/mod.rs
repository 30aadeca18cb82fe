pub mod close_survey;
pub mod create_survey;
pub mod get_results;
pub mod get_survey;
pub mod get_user_surveys;
pub mod models;
pub mod retry_rewards;
pub mod submit_participation;
pub mod surveys;
