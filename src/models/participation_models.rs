use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RewardState {
    Pending,
    Settled,
    Failed,
}

/// A single answer value, deserialized untagged so clients can send the
/// natural JSON shape for each question type. Type matching against the
/// referenced question happens during admission, not here.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum AnswerValue {
    Flag(bool),
    Rating(i64),
    Text(String),
    Choices(Vec<String>),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Answer {
    pub question_id: String,
    pub value: AnswerValue,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Participation {
    #[serde(rename = "_id")]
    pub id: String,
    pub survey_id: String,
    pub user_id: String,
    pub answers: Vec<Answer>,
    pub completed_at: DateTime<Utc>,
    pub reward_state: RewardState,
    pub transaction_ref: Option<String>,
}
