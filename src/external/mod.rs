use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::analytics::SurveyBreakdown;
use crate::models::survey_models::{QuestionType, SurveyCategory};
use crate::utils::error::TransferFailure;

pub mod mock;

pub use mock::{MockAnalysisGenerator, MockQuestionGenerator, MockTransferClient};

/// Question shape produced by the generator collaborator, before the
/// lifecycle manager assigns ids.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeneratedQuestion {
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    pub required: bool,
}

/// Generates draft questions for a survey topic. Side-effect free; failures
/// or empty results fall back to creator-supplied questions.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(
        &self,
        topic: &str,
        category: SurveyCategory,
        count: usize,
    ) -> Result<Vec<GeneratedQuestion>, String>;
}

/// Produces a free-text summary of aggregated survey results. Never mutates
/// stored data; failures surface as "analysis unavailable".
#[async_trait]
pub trait AnalysisGenerator: Send + Sync {
    async fn analyze(&self, breakdown: &SurveyBreakdown) -> Result<String, String>;
}

/// Token transfer collaborator. At-least-once from the network's point of
/// view; the settlement ledger turns it into an exactly-once settlement
/// record keyed by the idempotency key (the participation id).
#[async_trait]
pub trait RewardTransfer: Send + Sync {
    async fn transfer(
        &self,
        recipient: &str,
        amount: u64,
        idempotency_key: &str,
    ) -> Result<String, TransferFailure>;
}
