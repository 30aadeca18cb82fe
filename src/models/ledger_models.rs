use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

/// Settlement record, keyed uniquely by participation id. The presence of a
/// `transaction_ref` is the proof that the reward was paid; `terminal` marks
/// a permanent failure that must never be auto-retried.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LedgerEntry {
    #[serde(rename = "_id")]
    pub participation_id: String,
    pub survey_id: String,
    pub recipient: String,
    pub amount: u64,
    pub transaction_ref: Option<String>,
    pub attempts: u32,
    pub terminal: bool,
    pub last_error: Option<String>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    pub fn open(participation_id: &str, survey_id: &str, recipient: &str, amount: u64) -> Self {
        Self {
            participation_id: participation_id.to_string(),
            survey_id: survey_id.to_string(),
            recipient: recipient.to_string(),
            amount,
            transaction_ref: None,
            attempts: 0,
            terminal: false,
            last_error: None,
            settled_at: None,
        }
    }
}
