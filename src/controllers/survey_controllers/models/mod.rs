use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::participation_models::{Answer, Participation, RewardState};
use crate::models::survey_models::{Question, QuestionType, Survey, SurveyCategory, SurveyStatus};

fn default_required() -> bool {
    true
}

#[derive(Deserialize, Debug)]
pub struct QuestionInput {
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default = "default_required")]
    pub required: bool,
}

#[derive(Deserialize, Debug)]
pub struct CreateSurveyRequest {
    pub title: String,
    pub description: String,
    pub category: SurveyCategory,
    pub creator_id: String,
    pub reward_per_participant: u64,
    pub max_participants: u32,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SurveyResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: SurveyCategory,
    pub creator_id: String,
    pub reward_per_participant: u64,
    pub max_participants: u32,
    pub participant_count: u32,
    pub questions: Vec<Question>,
    pub status: SurveyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Survey> for SurveyResponse {
    fn from(survey: Survey) -> Self {
        Self {
            id: survey.id,
            title: survey.title,
            description: survey.description,
            category: survey.category,
            creator_id: survey.creator_id,
            reward_per_participant: survey.reward_per_participant,
            max_participants: survey.max_participants,
            participant_count: survey.participant_count,
            questions: survey.questions,
            status: survey.status,
            created_at: survey.created_at,
            updated_at: survey.updated_at,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct SubmitParticipationRequest {
    pub user_id: String,
    pub answers: Vec<Answer>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ParticipationResponse {
    pub id: String,
    pub survey_id: String,
    pub user_id: String,
    pub answers: Vec<Answer>,
    pub completed_at: DateTime<Utc>,
    pub reward_state: RewardState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_ref: Option<String>,
}

impl From<Participation> for ParticipationResponse {
    fn from(participation: Participation) -> Self {
        Self {
            id: participation.id,
            survey_id: participation.survey_id,
            user_id: participation.user_id,
            answers: participation.answers,
            completed_at: participation.completed_at,
            reward_state: participation.reward_state,
            transaction_ref: participation.transaction_ref,
        }
    }
}

#[derive(Deserialize)]
pub struct CreatorOnly {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct ListSurveysQuery {
    #[serde(default)]
    pub active: bool,
}

#[derive(Serialize)]
pub struct AnalysisResponse {
    pub survey_id: String,
    pub analysis: String,
}

#[derive(Serialize)]
pub struct RetrySummaryResponse {
    pub retried: usize,
    pub settled: usize,
    pub still_failed: usize,
    pub skipped_terminal: usize,
}
