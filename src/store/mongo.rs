use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Bson},
    error::{ErrorKind, WriteFailure},
    options::ReturnDocument,
    Collection, Database, IndexModel,
};

use crate::models::ledger_models::LedgerEntry;
use crate::models::participation_models::{Participation, RewardState};
use crate::models::survey_models::Survey;
use crate::store::SurveyStore;
use crate::utils::error::{AppError, AppResult};

const SURVEYS: &str = "surveys";
const PARTICIPATIONS: &str = "participations";
const REWARD_LEDGER: &str = "reward_ledger";

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Unique index on (survey_id, user_id) is the duplicate-participation
    /// backstop; the ledger needs none because the participation id is its
    /// `_id`.
    pub async fn ensure_indexes(&self) -> AppResult<()> {
        let participations = self.participations();
        participations
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "survey_id": 1, "user_id": 1 })
                    .options(
                        mongodb::options::IndexOptions::builder()
                            .unique(true)
                            .build(),
                    )
                    .build(),
            )
            .await?;
        participations
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1 })
                    .build(),
            )
            .await?;
        Ok(())
    }

    fn surveys(&self) -> Collection<Survey> {
        self.db.collection::<Survey>(SURVEYS)
    }

    fn participations(&self) -> Collection<Participation> {
        self.db.collection::<Participation>(PARTICIPATIONS)
    }

    fn ledger(&self) -> Collection<LedgerEntry> {
        self.db.collection::<LedgerEntry>(REWARD_LEDGER)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref write_error)) => write_error.code == 11000,
        _ => false,
    }
}

#[async_trait]
impl SurveyStore for MongoStore {
    async fn insert_survey(&self, survey: &Survey) -> AppResult<()> {
        self.surveys().insert_one(survey).await?;
        Ok(())
    }

    async fn find_survey(&self, survey_id: &str) -> AppResult<Option<Survey>> {
        Ok(self.surveys().find_one(doc! { "_id": survey_id }).await?)
    }

    async fn list_surveys(&self) -> AppResult<Vec<Survey>> {
        let cursor = self
            .surveys()
            .find(doc! {})
            .sort(doc! { "created_at": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list_surveys_by_creator(&self, creator_id: &str) -> AppResult<Vec<Survey>> {
        let cursor = self
            .surveys()
            .find(doc! { "creator_id": creator_id })
            .sort(doc! { "created_at": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn close_survey(&self, survey_id: &str) -> AppResult<Option<Survey>> {
        let now = to_bson(&Utc::now())?;
        let updated = self
            .surveys()
            .find_one_and_update(
                doc! { "_id": survey_id },
                doc! { "$set": { "status": "closed", "updated_at": now } },
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    async fn reserve_slot(&self, survey_id: &str) -> AppResult<Option<Survey>> {
        let now = to_bson(&Utc::now())?;
        // Single conditional pipeline update: consume a slot iff active and
        // below capacity, and close in the same write when the increment
        // fills the last slot.
        let filter = doc! {
            "_id": survey_id,
            "status": "active",
            "$expr": { "$lt": ["$participant_count", "$max_participants"] },
        };
        let update = vec![doc! {
            "$set": {
                "participant_count": { "$add": ["$participant_count", 1] },
                "status": {
                    "$cond": [
                        { "$gte": [
                            { "$add": ["$participant_count", 1] },
                            "$max_participants",
                        ] },
                        "closed",
                        "$status",
                    ]
                },
                "updated_at": now,
            }
        }];
        let updated = self
            .surveys()
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    async fn release_slot(&self, survey_id: &str, reopen: bool) -> AppResult<()> {
        let now = to_bson(&Utc::now())?;
        let mut set = doc! {
            "participant_count": {
                "$max": [{ "$subtract": ["$participant_count", 1] }, 0]
            },
            "updated_at": now,
        };
        if reopen {
            set.insert("status", "active");
        }
        self.surveys()
            .update_one(doc! { "_id": survey_id }, vec![doc! { "$set": set }])
            .await?;
        Ok(())
    }

    async fn insert_participation(&self, participation: &Participation) -> AppResult<()> {
        match self.participations().insert_one(participation).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => Err(AppError::DuplicateParticipation(
                "user already participated in this survey".to_string(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_participation(
        &self,
        survey_id: &str,
        user_id: &str,
    ) -> AppResult<Option<Participation>> {
        Ok(self
            .participations()
            .find_one(doc! { "survey_id": survey_id, "user_id": user_id })
            .await?)
    }

    async fn find_participation_by_id(
        &self,
        participation_id: &str,
    ) -> AppResult<Option<Participation>> {
        Ok(self
            .participations()
            .find_one(doc! { "_id": participation_id })
            .await?)
    }

    async fn list_participations(&self, survey_id: &str) -> AppResult<Vec<Participation>> {
        let cursor = self
            .participations()
            .find(doc! { "survey_id": survey_id })
            .sort(doc! { "completed_at": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list_participations_by_user(&self, user_id: &str) -> AppResult<Vec<Participation>> {
        let cursor = self
            .participations()
            .find(doc! { "user_id": user_id })
            .sort(doc! { "completed_at": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn set_reward_state(
        &self,
        participation_id: &str,
        state: RewardState,
        transaction_ref: Option<&str>,
    ) -> AppResult<()> {
        let state = to_bson(&state)?;
        let transaction_ref = match transaction_ref {
            Some(tx) => Bson::String(tx.to_string()),
            None => Bson::Null,
        };
        self.participations()
            .update_one(
                doc! { "_id": participation_id },
                doc! { "$set": {
                    "reward_state": state,
                    "transaction_ref": transaction_ref,
                } },
            )
            .await?;
        Ok(())
    }

    async fn list_failed_participations(&self) -> AppResult<Vec<Participation>> {
        let cursor = self
            .participations()
            .find(doc! { "reward_state": "failed" })
            .sort(doc! { "completed_at": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_ledger_entry(&self, participation_id: &str) -> AppResult<Option<LedgerEntry>> {
        Ok(self
            .ledger()
            .find_one(doc! { "_id": participation_id })
            .await?)
    }

    async fn upsert_ledger_entry(&self, entry: &LedgerEntry) -> AppResult<()> {
        self.ledger()
            .replace_one(doc! { "_id": &entry.participation_id }, entry)
            .upsert(true)
            .await?;
        Ok(())
    }
}
