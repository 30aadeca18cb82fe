use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::ledger_models::LedgerEntry;
use crate::models::participation_models::{Participation, RewardState};
use crate::models::survey_models::{Survey, SurveyStatus};
use crate::store::SurveyStore;
use crate::utils::error::{AppError, AppResult};

/// In-memory store. Backs the engine in tests and in `STORE=memory` mode;
/// participations are kept in insertion order so analytics sees responses in
/// completion order.
pub struct MemoryStore {
    surveys: Arc<RwLock<HashMap<String, Survey>>>,
    participations: Arc<RwLock<Vec<Participation>>>,
    ledger: Arc<RwLock<HashMap<String, LedgerEntry>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            surveys: Arc::new(RwLock::new(HashMap::new())),
            participations: Arc::new(RwLock::new(Vec::new())),
            ledger: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl SurveyStore for MemoryStore {
    async fn insert_survey(&self, survey: &Survey) -> AppResult<()> {
        let mut surveys = self.surveys.write().await;
        surveys.insert(survey.id.clone(), survey.clone());
        Ok(())
    }

    async fn find_survey(&self, survey_id: &str) -> AppResult<Option<Survey>> {
        let surveys = self.surveys.read().await;
        Ok(surveys.get(survey_id).cloned())
    }

    async fn list_surveys(&self) -> AppResult<Vec<Survey>> {
        let surveys = self.surveys.read().await;
        let mut all: Vec<Survey> = surveys.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    async fn list_surveys_by_creator(&self, creator_id: &str) -> AppResult<Vec<Survey>> {
        let surveys = self.surveys.read().await;
        let mut created: Vec<Survey> = surveys
            .values()
            .filter(|survey| survey.creator_id == creator_id)
            .cloned()
            .collect();
        created.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(created)
    }

    async fn close_survey(&self, survey_id: &str) -> AppResult<Option<Survey>> {
        let mut surveys = self.surveys.write().await;
        match surveys.get_mut(survey_id) {
            Some(survey) => {
                survey.status = SurveyStatus::Closed;
                survey.updated_at = Utc::now();
                Ok(Some(survey.clone()))
            }
            None => Ok(None),
        }
    }

    async fn reserve_slot(&self, survey_id: &str) -> AppResult<Option<Survey>> {
        let mut surveys = self.surveys.write().await;
        let survey = match surveys.get_mut(survey_id) {
            Some(survey) => survey,
            None => return Ok(None),
        };

        if survey.status != SurveyStatus::Active
            || survey.participant_count >= survey.max_participants
        {
            return Ok(None);
        }

        survey.participant_count += 1;
        if survey.participant_count >= survey.max_participants {
            survey.status = SurveyStatus::Closed;
        }
        survey.updated_at = Utc::now();
        Ok(Some(survey.clone()))
    }

    async fn release_slot(&self, survey_id: &str, reopen: bool) -> AppResult<()> {
        let mut surveys = self.surveys.write().await;
        let survey = match surveys.get_mut(survey_id) {
            Some(survey) => survey,
            None => return Ok(()),
        };

        survey.participant_count = survey.participant_count.saturating_sub(1);
        if reopen && survey.status == SurveyStatus::Closed {
            survey.status = SurveyStatus::Active;
        }
        survey.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_participation(&self, participation: &Participation) -> AppResult<()> {
        let mut participations = self.participations.write().await;
        let duplicate = participations.iter().any(|p| {
            p.survey_id == participation.survey_id && p.user_id == participation.user_id
        });
        if duplicate {
            return Err(AppError::DuplicateParticipation(
                "user already participated in this survey".to_string(),
            ));
        }
        participations.push(participation.clone());
        Ok(())
    }

    async fn find_participation(
        &self,
        survey_id: &str,
        user_id: &str,
    ) -> AppResult<Option<Participation>> {
        let participations = self.participations.read().await;
        Ok(participations
            .iter()
            .find(|p| p.survey_id == survey_id && p.user_id == user_id)
            .cloned())
    }

    async fn find_participation_by_id(
        &self,
        participation_id: &str,
    ) -> AppResult<Option<Participation>> {
        let participations = self.participations.read().await;
        Ok(participations
            .iter()
            .find(|p| p.id == participation_id)
            .cloned())
    }

    async fn list_participations(&self, survey_id: &str) -> AppResult<Vec<Participation>> {
        let participations = self.participations.read().await;
        Ok(participations
            .iter()
            .filter(|p| p.survey_id == survey_id)
            .cloned()
            .collect())
    }

    async fn list_participations_by_user(&self, user_id: &str) -> AppResult<Vec<Participation>> {
        let participations = self.participations.read().await;
        Ok(participations
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn set_reward_state(
        &self,
        participation_id: &str,
        state: RewardState,
        transaction_ref: Option<&str>,
    ) -> AppResult<()> {
        let mut participations = self.participations.write().await;
        match participations.iter_mut().find(|p| p.id == participation_id) {
            Some(participation) => {
                participation.reward_state = state;
                participation.transaction_ref = transaction_ref.map(|tx| tx.to_string());
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "participation {} does not exist",
                participation_id
            ))),
        }
    }

    async fn list_failed_participations(&self) -> AppResult<Vec<Participation>> {
        let participations = self.participations.read().await;
        Ok(participations
            .iter()
            .filter(|p| p.reward_state == RewardState::Failed)
            .cloned()
            .collect())
    }

    async fn find_ledger_entry(&self, participation_id: &str) -> AppResult<Option<LedgerEntry>> {
        let ledger = self.ledger.read().await;
        Ok(ledger.get(participation_id).cloned())
    }

    async fn upsert_ledger_entry(&self, entry: &LedgerEntry) -> AppResult<()> {
        let mut ledger = self.ledger.write().await;
        ledger.insert(entry.participation_id.clone(), entry.clone());
        Ok(())
    }
}
