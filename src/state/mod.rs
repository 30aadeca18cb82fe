use std::sync::Arc;

use crate::core::admission::ParticipationAdmissionController;
use crate::core::lifecycle::SurveyLifecycleManager;
use crate::core::settlement::{RetryPolicy, RewardSettlementLedger};
use crate::external::{AnalysisGenerator, QuestionGenerator, RewardTransfer};
use crate::store::SurveyStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SurveyStore>,
    pub lifecycle: Arc<SurveyLifecycleManager>,
    pub admission: Arc<ParticipationAdmissionController>,
    pub settlement: Arc<RewardSettlementLedger>,
    pub analysis: Arc<dyn AnalysisGenerator>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SurveyStore>,
        question_generator: Arc<dyn QuestionGenerator>,
        transfer: Arc<dyn RewardTransfer>,
        analysis: Arc<dyn AnalysisGenerator>,
        retry_policy: RetryPolicy,
    ) -> Self {
        let lifecycle = Arc::new(SurveyLifecycleManager::new(
            store.clone(),
            question_generator,
        ));
        let settlement = Arc::new(RewardSettlementLedger::new(
            store.clone(),
            transfer,
            retry_policy,
        ));
        let admission = Arc::new(ParticipationAdmissionController::new(
            store.clone(),
            settlement.clone(),
        ));
        Self {
            store,
            lifecycle,
            admission,
            settlement,
            analysis,
        }
    }
}
