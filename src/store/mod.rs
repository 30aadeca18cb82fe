use async_trait::async_trait;

use crate::models::ledger_models::LedgerEntry;
use crate::models::participation_models::{Participation, RewardState};
use crate::models::survey_models::Survey;
use crate::utils::error::AppResult;

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Storage contract for the survey engine. Constructed once at startup and
/// injected into every component; nothing in the engine reaches for a global.
///
/// `reserve_slot` is the one conditional write: it consumes a capacity slot
/// and flips the survey to Closed in the same operation when the slot was the
/// last one. Both implementations guarantee that single write is atomic; the
/// admission controller layers per-survey serialization on top for the
/// surrounding check-then-insert sequence.
#[async_trait]
pub trait SurveyStore: Send + Sync {
    async fn insert_survey(&self, survey: &Survey) -> AppResult<()>;
    async fn find_survey(&self, survey_id: &str) -> AppResult<Option<Survey>>;
    async fn list_surveys(&self) -> AppResult<Vec<Survey>>;
    async fn list_surveys_by_creator(&self, creator_id: &str) -> AppResult<Vec<Survey>>;

    /// Marks the survey Closed and returns the updated record, or `None` if
    /// no survey has that id.
    async fn close_survey(&self, survey_id: &str) -> AppResult<Option<Survey>>;

    /// Consumes one capacity slot iff the survey is Active and below
    /// `max_participants`, closing it in the same write when the increment
    /// reaches capacity. Returns the updated survey, or `None` when no slot
    /// could be reserved.
    async fn reserve_slot(&self, survey_id: &str) -> AppResult<Option<Survey>>;

    /// Returns a reserved slot that never got its participation written
    /// (compensation for a failed insert). Decrements the count; `reopen`
    /// flips Closed back to Active when the failed reservation was the one
    /// that closed the survey.
    async fn release_slot(&self, survey_id: &str, reopen: bool) -> AppResult<()>;

    /// Fails with `DuplicateParticipation` if a record for the same
    /// `(survey_id, user_id)` already exists.
    async fn insert_participation(&self, participation: &Participation) -> AppResult<()>;
    async fn find_participation(
        &self,
        survey_id: &str,
        user_id: &str,
    ) -> AppResult<Option<Participation>>;
    async fn find_participation_by_id(&self, participation_id: &str)
        -> AppResult<Option<Participation>>;
    /// Participations of a survey in completion order.
    async fn list_participations(&self, survey_id: &str) -> AppResult<Vec<Participation>>;
    async fn list_participations_by_user(&self, user_id: &str) -> AppResult<Vec<Participation>>;
    async fn set_reward_state(
        &self,
        participation_id: &str,
        state: RewardState,
        transaction_ref: Option<&str>,
    ) -> AppResult<()>;
    async fn list_failed_participations(&self) -> AppResult<Vec<Participation>>;

    async fn find_ledger_entry(&self, participation_id: &str) -> AppResult<Option<LedgerEntry>>;
    async fn upsert_ledger_entry(&self, entry: &LedgerEntry) -> AppResult<()>;
}
