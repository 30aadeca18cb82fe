use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::external::QuestionGenerator;
use crate::models::participation_models::Participation;
use crate::models::survey_models::{Question, QuestionType, Survey, SurveyCategory, SurveyStatus};
use crate::store::SurveyStore;
use crate::utils::error::{AppError, AppResult};
use crate::utils::validation::{
    validate_description, validate_max_participants, validate_question, validate_reward,
    validate_title,
};

const GENERATED_QUESTION_COUNT: usize = 3;

#[derive(Debug, Clone)]
pub struct QuestionSpec {
    pub text: String,
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub required: bool,
}

#[derive(Debug, Clone)]
pub struct CreateSurveySpec {
    pub title: String,
    pub description: String,
    pub category: SurveyCategory,
    pub creator_id: String,
    pub reward_per_participant: u64,
    pub max_participants: u32,
    pub questions: Vec<QuestionSpec>,
}

/// Creates surveys and drives the Active → Closed transition requested by
/// creators. Capacity-triggered closure lives in the admission controller.
pub struct SurveyLifecycleManager {
    store: Arc<dyn SurveyStore>,
    question_generator: Arc<dyn QuestionGenerator>,
}

impl SurveyLifecycleManager {
    pub fn new(
        store: Arc<dyn SurveyStore>,
        question_generator: Arc<dyn QuestionGenerator>,
    ) -> Self {
        Self {
            store,
            question_generator,
        }
    }

    pub async fn create_survey(&self, spec: CreateSurveySpec) -> AppResult<Survey> {
        validate_title(&spec.title)?;
        validate_description(&spec.description)?;
        validate_reward(spec.reward_per_participant)?;
        validate_max_participants(spec.max_participants)?;

        let mut questions = spec.questions;
        if questions.is_empty() {
            // Draft questions from the generator collaborator; any failure or
            // empty result just leaves the creator-supplied list in place.
            match self
                .question_generator
                .generate(&spec.title, spec.category, GENERATED_QUESTION_COUNT)
                .await
            {
                Ok(generated) => {
                    questions = generated
                        .into_iter()
                        .map(|q| QuestionSpec {
                            text: q.text,
                            question_type: q.question_type,
                            options: q.options,
                            required: q.required,
                        })
                        .collect();
                }
                Err(err) => {
                    eprintln!("Question generation failed, keeping creator questions: {}", err);
                }
            }
        }

        if questions.is_empty() {
            return Err(AppError::ValidationError(
                "survey must have at least one question".to_string(),
            ));
        }

        for question in &questions {
            validate_question(&question.text, question.question_type, &question.options)?;
        }

        let now = Utc::now();
        let survey = Survey {
            id: Uuid::new_v4().to_string(),
            title: spec.title.trim().to_string(),
            description: spec.description.trim().to_string(),
            category: spec.category,
            creator_id: spec.creator_id,
            reward_per_participant: spec.reward_per_participant,
            max_participants: spec.max_participants,
            participant_count: 0,
            questions: questions
                .into_iter()
                .map(|q| Question {
                    id: Uuid::new_v4().to_string(),
                    text: q.text.trim().to_string(),
                    question_type: q.question_type,
                    options: q.options.into_iter().map(|opt| opt.trim().to_string()).collect(),
                    required: q.required,
                })
                .collect(),
            status: SurveyStatus::Active,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_survey(&survey).await?;
        Ok(survey)
    }

    /// Idempotent: closing an already-closed survey returns it unchanged.
    pub async fn close_survey(&self, survey_id: &str, requester_id: &str) -> AppResult<Survey> {
        let survey = self
            .store
            .find_survey(survey_id)
            .await?
            .ok_or_else(|| AppError::NotFound("The survey id does not exist".to_string()))?;

        if survey.creator_id != requester_id {
            return Err(AppError::Unauthorized(
                "Only the survey creator can close the survey".to_string(),
            ));
        }

        if survey.status == SurveyStatus::Closed {
            return Ok(survey);
        }

        self.store
            .close_survey(survey_id)
            .await?
            .ok_or_else(|| AppError::NotFound("The survey id does not exist".to_string()))
    }

    pub async fn get_survey(&self, survey_id: &str) -> AppResult<Survey> {
        self.store
            .find_survey(survey_id)
            .await?
            .ok_or_else(|| AppError::NotFound("The survey id does not exist".to_string()))
    }

    pub async fn list_surveys(&self, active_only: bool) -> AppResult<Vec<Survey>> {
        let surveys = self.store.list_surveys().await?;
        if active_only {
            Ok(surveys.into_iter().filter(|s| s.is_active()).collect())
        } else {
            Ok(surveys)
        }
    }

    pub async fn list_created_by(&self, creator_id: &str) -> AppResult<Vec<Survey>> {
        self.store.list_surveys_by_creator(creator_id).await
    }

    pub async fn list_participated_by(&self, user_id: &str) -> AppResult<Vec<Participation>> {
        self.store.list_participations_by_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::external::GeneratedQuestion;
    use crate::store::MemoryStore;

    struct NoQuestions;

    #[async_trait]
    impl QuestionGenerator for NoQuestions {
        async fn generate(
            &self,
            _topic: &str,
            _category: SurveyCategory,
            _count: usize,
        ) -> Result<Vec<GeneratedQuestion>, String> {
            Err("generator offline".to_string())
        }
    }

    struct CannedQuestions;

    #[async_trait]
    impl QuestionGenerator for CannedQuestions {
        async fn generate(
            &self,
            topic: &str,
            _category: SurveyCategory,
            _count: usize,
        ) -> Result<Vec<GeneratedQuestion>, String> {
            Ok(vec![GeneratedQuestion {
                text: format!("What do you think about {}?", topic),
                question_type: QuestionType::Text,
                options: Vec::new(),
                required: true,
            }])
        }
    }

    fn manager(generator: Arc<dyn QuestionGenerator>) -> SurveyLifecycleManager {
        SurveyLifecycleManager::new(Arc::new(MemoryStore::new()), generator)
    }

    fn base_spec() -> CreateSurveySpec {
        CreateSurveySpec {
            title: "Crypto wallet habits".to_string(),
            description: "Tell us how you use crypto wallets day to day.".to_string(),
            category: SurveyCategory::Technology,
            creator_id: "creator-1".to_string(),
            reward_per_participant: 10,
            max_participants: 5,
            questions: vec![QuestionSpec {
                text: "Which wallet do you use most?".to_string(),
                question_type: QuestionType::Text,
                options: Vec::new(),
                required: true,
            }],
        }
    }

    #[tokio::test]
    async fn create_survey_assigns_ids_and_starts_active() {
        let manager = manager(Arc::new(NoQuestions));
        let survey = manager.create_survey(base_spec()).await.unwrap();

        assert_eq!(survey.status, SurveyStatus::Active);
        assert_eq!(survey.participant_count, 0);
        assert!(!survey.id.is_empty());
        assert!(!survey.questions[0].id.is_empty());
    }

    #[tokio::test]
    async fn create_survey_rejects_bad_bounds() {
        let manager = manager(Arc::new(NoQuestions));

        let mut spec = base_spec();
        spec.reward_per_participant = 0;
        assert!(matches!(
            manager.create_survey(spec).await,
            Err(AppError::ValidationError(_))
        ));

        let mut spec = base_spec();
        spec.max_participants = 0;
        assert!(matches!(
            manager.create_survey(spec).await,
            Err(AppError::ValidationError(_))
        ));

        let mut spec = base_spec();
        spec.title = "hey".to_string();
        assert!(matches!(
            manager.create_survey(spec).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn empty_questions_fall_back_to_generator() {
        let manager = manager(Arc::new(CannedQuestions));
        let mut spec = base_spec();
        spec.questions = Vec::new();

        let survey = manager.create_survey(spec).await.unwrap();
        assert_eq!(survey.questions.len(), 1);
        assert!(survey.questions[0].text.contains("Crypto wallet habits"));
    }

    #[tokio::test]
    async fn generator_failure_with_no_creator_questions_is_rejected() {
        let manager = manager(Arc::new(NoQuestions));
        let mut spec = base_spec();
        spec.questions = Vec::new();

        assert!(matches!(
            manager.create_survey(spec).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn close_survey_is_idempotent_and_creator_only() {
        let manager = manager(Arc::new(NoQuestions));
        let survey = manager.create_survey(base_spec()).await.unwrap();

        assert!(matches!(
            manager.close_survey(&survey.id, "someone-else").await,
            Err(AppError::Unauthorized(_))
        ));

        let closed = manager.close_survey(&survey.id, "creator-1").await.unwrap();
        assert_eq!(closed.status, SurveyStatus::Closed);

        let closed_again = manager.close_survey(&survey.id, "creator-1").await.unwrap();
        assert_eq!(closed_again.status, SurveyStatus::Closed);
        assert_eq!(closed_again.updated_at, closed.updated_at);
    }

    #[tokio::test]
    async fn close_missing_survey_is_not_found() {
        let manager = manager(Arc::new(NoQuestions));
        assert!(matches!(
            manager.close_survey("missing", "creator-1").await,
            Err(AppError::NotFound(_))
        ));
    }
}
