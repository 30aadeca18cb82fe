use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::core::settlement::RewardSettlementLedger;
use crate::models::participation_models::{Answer, AnswerValue, Participation, RewardState};
use crate::models::survey_models::{QuestionType, Survey, SurveyStatus};
use crate::store::SurveyStore;
use crate::utils::error::{AppError, AppResult};

/// Admits participations against a survey's remaining capacity.
///
/// Admissions for the same survey id are linearized by a per-survey async
/// mutex around the check-then-insert sequence; different surveys never wait
/// on each other. The reward settlement call runs strictly after the guard is
/// released so a slow or failing transfer cannot stall other admissions, and
/// a failed settlement never rolls the admission back: the participant keeps
/// the slot with reward_state=Failed and the ledger retries later.
pub struct ParticipationAdmissionController {
    store: Arc<dyn SurveyStore>,
    settlement: Arc<RewardSettlementLedger>,
    guards: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ParticipationAdmissionController {
    pub fn new(store: Arc<dyn SurveyStore>, settlement: Arc<RewardSettlementLedger>) -> Self {
        Self {
            store,
            settlement,
            guards: Mutex::new(HashMap::new()),
        }
    }

    fn survey_guard(&self, survey_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut guards = self.guards.lock().unwrap();
        guards
            .entry(survey_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    // Closed surveys admit nothing, so their guard entries are dead weight;
    // pruning on observation keeps the map bounded by the set of surveys
    // still accepting submissions. A submitter that raced the removal gets a
    // fresh mutex, which is harmless: `reserve_slot` stays conditional and
    // the survey is already Closed.
    fn drop_guard(&self, survey_id: &str) {
        self.guards.lock().unwrap().remove(survey_id);
    }

    #[cfg(test)]
    fn tracked_surveys(&self) -> usize {
        self.guards.lock().unwrap().len()
    }

    pub async fn submit_participation(
        &self,
        survey_id: &str,
        user_id: &str,
        answers: Vec<Answer>,
    ) -> AppResult<Participation> {
        let guard = self.survey_guard(survey_id);

        let (mut participation, reward) = {
            let _admission = guard.lock().await;

            let survey = match self.store.find_survey(survey_id).await? {
                Some(survey) => survey,
                None => {
                    self.drop_guard(survey_id);
                    return Err(AppError::NotFound(
                        "The survey id does not exist".to_string(),
                    ));
                }
            };

            if !survey.is_active() {
                self.drop_guard(survey_id);
                return Err(AppError::SurveyClosed(
                    "Survey is closed and no longer accepts participations".to_string(),
                ));
            }

            if self
                .store
                .find_participation(survey_id, user_id)
                .await?
                .is_some()
            {
                return Err(AppError::DuplicateParticipation(
                    "user already participated in this survey".to_string(),
                ));
            }

            validate_answers(&survey, &answers)?;

            let reserved = self.store.reserve_slot(survey_id).await?.ok_or_else(|| {
                AppError::SurveyClosed("Maximum number of participants reached".to_string())
            })?;

            let participation = Participation {
                id: Uuid::new_v4().to_string(),
                survey_id: survey_id.to_string(),
                user_id: user_id.to_string(),
                answers,
                completed_at: Utc::now(),
                reward_state: RewardState::Pending,
                transaction_ref: None,
            };
            if let Err(err) = self.store.insert_participation(&participation).await {
                // The slot was consumed but its participation never landed;
                // hand the slot back so the count keeps matching the stored
                // records, reopening only if this reservation closed the
                // survey.
                let reopen = reserved.status == SurveyStatus::Closed;
                if let Err(release_err) = self.store.release_slot(survey_id, reopen).await {
                    eprintln!(
                        "❌ Failed to release reserved slot for survey {}: {}",
                        survey_id, release_err
                    );
                }
                return Err(err);
            }

            if reserved.status == SurveyStatus::Closed {
                println!(
                    "Survey {} reached capacity ({}) and was closed",
                    survey_id, reserved.max_participants
                );
                self.drop_guard(survey_id);
            }

            (participation, reserved.reward_per_participant)
        };

        // Settlement outcome is reflected in the returned record, but the
        // admission above is final either way.
        match self.settlement.settle(&participation, reward).await {
            Ok(tx) => {
                participation.reward_state = RewardState::Settled;
                participation.transaction_ref = Some(tx);
            }
            Err(err) => {
                eprintln!(
                    "❌ Reward settlement for participation {} failed: {}",
                    participation.id, err
                );
                participation.reward_state = RewardState::Failed;
            }
        }

        Ok(participation)
    }
}

/// Answer validation, in spec order: every answer must reference a declared
/// question exactly once, every required question must be covered, and each
/// value must match its question's type.
fn validate_answers(survey: &Survey, answers: &[Answer]) -> AppResult<()> {
    for (index, answer) in answers.iter().enumerate() {
        let question = survey.question(&answer.question_id).ok_or_else(|| {
            AppError::InvalidAnswer(format!(
                "answer references unknown question {}",
                answer.question_id
            ))
        })?;

        let duplicate = answers[..index]
            .iter()
            .any(|earlier| earlier.question_id == answer.question_id);
        if duplicate {
            return Err(AppError::InvalidAnswer(format!(
                "question {} answered more than once",
                answer.question_id
            )));
        }

        validate_answer_value(question.question_type, &question.options, &answer.value)
            .map_err(|reason| {
                AppError::InvalidAnswer(format!(
                    "invalid answer for question {}: {}",
                    answer.question_id, reason
                ))
            })?;
    }

    for question in &survey.questions {
        if question.required && !answers.iter().any(|a| a.question_id == question.id) {
            return Err(AppError::IncompleteAnswers(format!(
                "required question {} was not answered",
                question.id
            )));
        }
    }

    Ok(())
}

fn validate_answer_value(
    question_type: QuestionType,
    options: &[String],
    value: &AnswerValue,
) -> Result<(), String> {
    match (question_type, value) {
        (QuestionType::Text, AnswerValue::Text(text)) => {
            if text.trim().is_empty() {
                Err("text answer must not be empty".to_string())
            } else {
                Ok(())
            }
        }
        (QuestionType::SingleChoice, AnswerValue::Text(choice)) => {
            if options.iter().any(|option| option == choice) {
                Ok(())
            } else {
                Err(format!("\"{}\" is not a declared option", choice))
            }
        }
        (QuestionType::MultiChoice, AnswerValue::Choices(choices)) => {
            if choices.is_empty() {
                return Err("at least one option must be selected".to_string());
            }
            for (index, choice) in choices.iter().enumerate() {
                if !options.iter().any(|option| option == choice) {
                    return Err(format!("\"{}\" is not a declared option", choice));
                }
                if choices[..index].contains(choice) {
                    return Err(format!("option \"{}\" selected more than once", choice));
                }
            }
            Ok(())
        }
        (QuestionType::Rating, AnswerValue::Rating(rating)) => {
            if (1..=5).contains(rating) {
                Ok(())
            } else {
                Err(format!("rating {} is outside 1-5", rating))
            }
        }
        (QuestionType::Boolean, AnswerValue::Flag(_)) => Ok(()),
        (expected, _) => Err(format!("value does not match question type {:?}", expected)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use crate::core::settlement::test_support::ScriptedTransfer;
    use crate::core::settlement::RetryPolicy;
    use crate::models::ledger_models::LedgerEntry;
    use crate::models::survey_models::{Question, SurveyCategory};
    use crate::store::MemoryStore;
    use crate::utils::error::TransferFailure;

    struct Harness {
        store: Arc<MemoryStore>,
        transfer: Arc<ScriptedTransfer>,
        admission: Arc<ParticipationAdmissionController>,
    }

    fn harness(transfer: ScriptedTransfer) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let transfer = Arc::new(transfer);
        let settlement = Arc::new(RewardSettlementLedger::new(
            store.clone(),
            transfer.clone(),
            RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
            },
        ));
        let admission = Arc::new(ParticipationAdmissionController::new(
            store.clone(),
            settlement,
        ));
        Harness {
            store,
            transfer,
            admission,
        }
    }

    fn text_question(id: &str, required: bool) -> Question {
        Question {
            id: id.to_string(),
            text: format!("Tell us about {}", id),
            question_type: QuestionType::Text,
            options: Vec::new(),
            required,
        }
    }

    async fn seed_survey(store: &MemoryStore, max_participants: u32, questions: Vec<Question>) -> Survey {
        let now = Utc::now();
        let survey = Survey {
            id: "s1".to_string(),
            title: "Crypto wallet habits".to_string(),
            description: "How do you use crypto wallets day to day?".to_string(),
            category: SurveyCategory::Technology,
            creator_id: "creator".to_string(),
            reward_per_participant: 10,
            max_participants,
            participant_count: 0,
            questions,
            status: SurveyStatus::Active,
            created_at: now,
            updated_at: now,
        };
        store.insert_survey(&survey).await.unwrap();
        survey
    }

    fn text_answer(question_id: &str, text: &str) -> Answer {
        Answer {
            question_id: question_id.to_string(),
            value: AnswerValue::Text(text.to_string()),
        }
    }

    #[tokio::test]
    async fn admission_scenario_capacity_two() {
        let h = harness(ScriptedTransfer::always_ok());
        seed_survey(&h.store, 2, vec![text_question("q1", true)]).await;

        let first = h
            .admission
            .submit_participation("s1", "userA", vec![text_answer("q1", "Daily driver")])
            .await
            .unwrap();
        assert_eq!(first.reward_state, RewardState::Settled);

        let survey = h.store.find_survey("s1").await.unwrap().unwrap();
        assert_eq!(survey.participant_count, 1);
        assert_eq!(survey.status, SurveyStatus::Active);

        let duplicate = h
            .admission
            .submit_participation("s1", "userA", vec![text_answer("q1", "Again")])
            .await
            .unwrap_err();
        assert!(matches!(duplicate, AppError::DuplicateParticipation(_)));

        h.admission
            .submit_participation("s1", "userB", vec![text_answer("q1", "Occasionally")])
            .await
            .unwrap();

        let survey = h.store.find_survey("s1").await.unwrap().unwrap();
        assert_eq!(survey.participant_count, 2);
        assert_eq!(survey.status, SurveyStatus::Closed);

        let late = h
            .admission
            .submit_participation("s1", "userC", vec![text_answer("q1", "Too late")])
            .await
            .unwrap_err();
        assert!(matches!(late, AppError::SurveyClosed(_)));
    }

    #[tokio::test]
    async fn concurrent_submissions_never_overrun_capacity() {
        let h = harness(ScriptedTransfer::always_ok());
        seed_survey(&h.store, 3, vec![text_question("q1", true)]).await;

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let admission = h.admission.clone();
                tokio::spawn(async move {
                    admission
                        .submit_participation(
                            "s1",
                            &format!("user-{}", i),
                            vec![text_answer("q1", "Answer")],
                        )
                        .await
                })
            })
            .collect();

        let outcomes = join_all(tasks).await;
        let mut admitted = 0;
        let mut rejected_closed = 0;
        for outcome in outcomes {
            match outcome.unwrap() {
                Ok(_) => admitted += 1,
                Err(AppError::SurveyClosed(_)) => rejected_closed += 1,
                Err(other) => panic!("unexpected failure: {}", other),
            }
        }
        assert_eq!(admitted, 3);
        assert_eq!(rejected_closed, 5);

        let survey = h.store.find_survey("s1").await.unwrap().unwrap();
        assert_eq!(survey.participant_count, 3);
        assert_eq!(survey.status, SurveyStatus::Closed);
        assert_eq!(h.store.list_participations("s1").await.unwrap().len(), 3);
        // One settlement per admitted participation, paid exactly once.
        assert_eq!(h.transfer.call_count(), 3);
    }

    #[tokio::test]
    async fn missing_survey_and_unknown_question_fail_cleanly() {
        let h = harness(ScriptedTransfer::always_ok());
        seed_survey(&h.store, 2, vec![text_question("q1", true)]).await;

        let err = h
            .admission
            .submit_participation("nope", "userA", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = h
            .admission
            .submit_participation("s1", "userA", vec![text_answer("q-x", "hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidAnswer(_)));
    }

    #[tokio::test]
    async fn required_question_must_be_answered_optional_may_be_skipped() {
        let h = harness(ScriptedTransfer::always_ok());
        seed_survey(
            &h.store,
            5,
            vec![text_question("q1", true), text_question("q2", false)],
        )
        .await;

        let err = h
            .admission
            .submit_participation("s1", "userA", vec![text_answer("q2", "Optional only")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IncompleteAnswers(_)));

        let ok = h
            .admission
            .submit_participation("s1", "userA", vec![text_answer("q1", "Required only")])
            .await
            .unwrap();
        assert_eq!(ok.answers.len(), 1);
    }

    #[tokio::test]
    async fn typed_answer_validation() {
        let h = harness(ScriptedTransfer::always_ok());
        let questions = vec![
            Question {
                id: "single".to_string(),
                text: "Pick one wallet".to_string(),
                question_type: QuestionType::SingleChoice,
                options: vec!["Phantom".to_string(), "Solflare".to_string()],
                required: false,
            },
            Question {
                id: "multi".to_string(),
                text: "Pick any features".to_string(),
                question_type: QuestionType::MultiChoice,
                options: vec!["Speed".to_string(), "Fees".to_string()],
                required: false,
            },
            Question {
                id: "rating".to_string(),
                text: "Rate the experience".to_string(),
                question_type: QuestionType::Rating,
                options: Vec::new(),
                required: false,
            },
            Question {
                id: "flag".to_string(),
                text: "Would you recommend us?".to_string(),
                question_type: QuestionType::Boolean,
                options: Vec::new(),
                required: false,
            },
        ];
        seed_survey(&h.store, 20, questions).await;

        let bad_cases = vec![
            text_answer("single", "Ledger"),
            Answer {
                question_id: "multi".to_string(),
                value: AnswerValue::Choices(vec!["Speed".to_string(), "Luck".to_string()]),
            },
            Answer {
                question_id: "multi".to_string(),
                value: AnswerValue::Choices(Vec::new()),
            },
            Answer {
                question_id: "rating".to_string(),
                value: AnswerValue::Rating(6),
            },
            Answer {
                question_id: "flag".to_string(),
                value: AnswerValue::Text("yes".to_string()),
            },
        ];
        for (i, answer) in bad_cases.into_iter().enumerate() {
            let err = h
                .admission
                .submit_participation("s1", &format!("bad-{}", i), vec![answer])
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidAnswer(_)), "case {}", i);
        }

        let good = vec![
            text_answer("single", "Phantom"),
            Answer {
                question_id: "multi".to_string(),
                value: AnswerValue::Choices(vec!["Speed".to_string(), "Fees".to_string()]),
            },
            Answer {
                question_id: "rating".to_string(),
                value: AnswerValue::Rating(5),
            },
            Answer {
                question_id: "flag".to_string(),
                value: AnswerValue::Flag(true),
            },
        ];
        h.admission
            .submit_participation("s1", "good-user", good)
            .await
            .unwrap();
    }

    /// Store double that fails the next participation insert, for exercising
    /// the compensation path between `reserve_slot` and the insert.
    struct FlakyInsertStore {
        inner: MemoryStore,
        fail_next_insert: AtomicBool,
    }

    impl FlakyInsertStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_next_insert: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl SurveyStore for FlakyInsertStore {
        async fn insert_survey(&self, survey: &Survey) -> crate::utils::error::AppResult<()> {
            self.inner.insert_survey(survey).await
        }
        async fn find_survey(
            &self,
            survey_id: &str,
        ) -> crate::utils::error::AppResult<Option<Survey>> {
            self.inner.find_survey(survey_id).await
        }
        async fn list_surveys(&self) -> crate::utils::error::AppResult<Vec<Survey>> {
            self.inner.list_surveys().await
        }
        async fn list_surveys_by_creator(
            &self,
            creator_id: &str,
        ) -> crate::utils::error::AppResult<Vec<Survey>> {
            self.inner.list_surveys_by_creator(creator_id).await
        }
        async fn close_survey(
            &self,
            survey_id: &str,
        ) -> crate::utils::error::AppResult<Option<Survey>> {
            self.inner.close_survey(survey_id).await
        }
        async fn reserve_slot(
            &self,
            survey_id: &str,
        ) -> crate::utils::error::AppResult<Option<Survey>> {
            self.inner.reserve_slot(survey_id).await
        }
        async fn release_slot(
            &self,
            survey_id: &str,
            reopen: bool,
        ) -> crate::utils::error::AppResult<()> {
            self.inner.release_slot(survey_id, reopen).await
        }
        async fn insert_participation(
            &self,
            participation: &Participation,
        ) -> crate::utils::error::AppResult<()> {
            if self.fail_next_insert.swap(false, Ordering::SeqCst) {
                return Err(AppError::DatabaseError("connection reset".to_string()));
            }
            self.inner.insert_participation(participation).await
        }
        async fn find_participation(
            &self,
            survey_id: &str,
            user_id: &str,
        ) -> crate::utils::error::AppResult<Option<Participation>> {
            self.inner.find_participation(survey_id, user_id).await
        }
        async fn find_participation_by_id(
            &self,
            participation_id: &str,
        ) -> crate::utils::error::AppResult<Option<Participation>> {
            self.inner.find_participation_by_id(participation_id).await
        }
        async fn list_participations(
            &self,
            survey_id: &str,
        ) -> crate::utils::error::AppResult<Vec<Participation>> {
            self.inner.list_participations(survey_id).await
        }
        async fn list_participations_by_user(
            &self,
            user_id: &str,
        ) -> crate::utils::error::AppResult<Vec<Participation>> {
            self.inner.list_participations_by_user(user_id).await
        }
        async fn set_reward_state(
            &self,
            participation_id: &str,
            state: RewardState,
            transaction_ref: Option<&str>,
        ) -> crate::utils::error::AppResult<()> {
            self.inner
                .set_reward_state(participation_id, state, transaction_ref)
                .await
        }
        async fn list_failed_participations(
            &self,
        ) -> crate::utils::error::AppResult<Vec<Participation>> {
            self.inner.list_failed_participations().await
        }
        async fn find_ledger_entry(
            &self,
            participation_id: &str,
        ) -> crate::utils::error::AppResult<Option<LedgerEntry>> {
            self.inner.find_ledger_entry(participation_id).await
        }
        async fn upsert_ledger_entry(
            &self,
            entry: &LedgerEntry,
        ) -> crate::utils::error::AppResult<()> {
            self.inner.upsert_ledger_entry(entry).await
        }
    }

    #[tokio::test]
    async fn failed_insert_releases_the_reserved_slot() {
        let store = Arc::new(FlakyInsertStore::new());
        let settlement = Arc::new(RewardSettlementLedger::new(
            store.clone(),
            Arc::new(ScriptedTransfer::always_ok()),
            RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
            },
        ));
        let admission = ParticipationAdmissionController::new(store.clone(), settlement);
        seed_survey(&store.inner, 1, vec![text_question("q1", true)]).await;

        store.fail_next_insert.store(true, Ordering::SeqCst);
        let err = admission
            .submit_participation("s1", "userA", vec![text_answer("q1", "Answer")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));

        // The slot came back, including the capacity closure it triggered.
        let survey = store.find_survey("s1").await.unwrap().unwrap();
        assert_eq!(survey.participant_count, 0);
        assert_eq!(survey.status, SurveyStatus::Active);
        assert!(store.list_participations("s1").await.unwrap().is_empty());

        // The returned slot is usable again.
        admission
            .submit_participation("s1", "userA", vec![text_answer("q1", "Answer")])
            .await
            .unwrap();
        let survey = store.find_survey("s1").await.unwrap().unwrap();
        assert_eq!(survey.participant_count, 1);
        assert_eq!(survey.status, SurveyStatus::Closed);
    }

    #[tokio::test]
    async fn closed_surveys_do_not_accumulate_guards() {
        let h = harness(ScriptedTransfer::always_ok());
        seed_survey(&h.store, 1, vec![text_question("q1", true)]).await;

        h.admission
            .submit_participation("s1", "userA", vec![text_answer("q1", "Answer")])
            .await
            .unwrap();
        assert_eq!(h.admission.tracked_surveys(), 0);

        // A late submission to the closed survey does not leave one behind
        // either.
        let err = h
            .admission
            .submit_participation("s1", "userB", vec![text_answer("q1", "Answer")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SurveyClosed(_)));
        assert_eq!(h.admission.tracked_surveys(), 0);
    }

    #[tokio::test]
    async fn failed_settlement_keeps_the_slot() {
        let h = harness(ScriptedTransfer::with_script(vec![Err(
            TransferFailure::Permanent("malformed recipient".to_string()),
        )]));
        seed_survey(&h.store, 2, vec![text_question("q1", true)]).await;

        let participation = h
            .admission
            .submit_participation("s1", "userA", vec![text_answer("q1", "Answer")])
            .await
            .unwrap();
        assert_eq!(participation.reward_state, RewardState::Failed);
        assert_eq!(participation.transaction_ref, None);

        // The admission stands: capacity is consumed and the record persists.
        let survey = h.store.find_survey("s1").await.unwrap().unwrap();
        assert_eq!(survey.participant_count, 1);
        let stored = h
            .store
            .find_participation("s1", "userA")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.reward_state, RewardState::Failed);

        // Re-submitting is a duplicate, not a fresh chance at the slot.
        let err = h
            .admission
            .submit_participation("s1", "userA", vec![text_answer("q1", "Answer")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateParticipation(_)));
    }
}
