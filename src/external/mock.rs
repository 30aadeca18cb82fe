use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use uuid::Uuid;

use crate::core::analytics::SurveyBreakdown;
use crate::external::{AnalysisGenerator, GeneratedQuestion, QuestionGenerator, RewardTransfer};
use crate::models::survey_models::{QuestionType, SurveyCategory};
use crate::utils::error::TransferFailure;

pub fn generate_transaction_hash() -> String {
    format!("HAI{}", Uuid::new_v4().simple())
}

/// Stand-in for the on-chain HAI token transfer. Simulates network delay and
/// always succeeds; the real client would surface transient and permanent
/// transfer failures through `TransferFailure`.
pub struct MockTransferClient {
    delay: Duration,
}

impl Default for MockTransferClient {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1500),
        }
    }
}

impl MockTransferClient {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl RewardTransfer for MockTransferClient {
    async fn transfer(
        &self,
        recipient: &str,
        amount: u64,
        _idempotency_key: &str,
    ) -> Result<String, TransferFailure> {
        sleep(self.delay).await;
        let tx_hash = generate_transaction_hash();
        println!(
            "Mock transaction: {} HAI sent to {}, Transaction ID: {}",
            amount, recipient, tx_hash
        );
        Ok(tx_hash)
    }
}

/// Canned question generator used when no AI backend is configured.
pub struct MockQuestionGenerator;

#[async_trait]
impl QuestionGenerator for MockQuestionGenerator {
    async fn generate(
        &self,
        topic: &str,
        _category: SurveyCategory,
        count: usize,
    ) -> Result<Vec<GeneratedQuestion>, String> {
        let mut questions = vec![
            GeneratedQuestion {
                text: format!(
                    "Please share your experience with {} and the main issues you have encountered.",
                    topic
                ),
                question_type: QuestionType::Text,
                options: Vec::new(),
                required: true,
            },
            GeneratedQuestion {
                text: format!("Which factors are most important to you in the {} field?", topic),
                question_type: QuestionType::MultiChoice,
                options: vec![
                    "User experience".to_string(),
                    "Feature richness".to_string(),
                    "Performance".to_string(),
                    "Security".to_string(),
                    "Price".to_string(),
                    "Community support".to_string(),
                ],
                required: true,
            },
            GeneratedQuestion {
                text: format!(
                    "How satisfied are you with the current {} solutions in the market?",
                    topic
                ),
                question_type: QuestionType::Rating,
                options: Vec::new(),
                required: false,
            },
        ];
        questions.truncate(count);
        Ok(questions)
    }
}

/// Canned analysis generator used when no AI backend is configured.
pub struct MockAnalysisGenerator;

#[async_trait]
impl AnalysisGenerator for MockAnalysisGenerator {
    async fn analyze(&self, breakdown: &SurveyBreakdown) -> Result<String, String> {
        Ok(format!(
            "Based on {} responses to \"{}\", participants are generally satisfied with the \
             simplicity and usability of the product, but there is room for improvement in \
             feature richness. It is recommended to focus on the core pain points respondents \
             mentioned most often.",
            breakdown.total_participants, breakdown.title
        ))
    }
}
