use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;

use crate::external::RewardTransfer;
use crate::models::ledger_models::LedgerEntry;
use crate::models::participation_models::{Participation, RewardState};
use crate::store::SurveyStore;
use crate::utils::error::{AppError, AppResult, TransferFailure};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RetrySummary {
    pub retried: usize,
    pub settled: usize,
    pub still_failed: usize,
    pub skipped_terminal: usize,
}

/// Turns the at-least-once transfer collaborator into an exactly-once
/// settlement record. The ledger entry is keyed by participation id; once a
/// transaction_ref is recorded, repeated calls return it without touching
/// the transfer client again.
///
/// Settlements for the same participation id are linearized by a
/// per-participation async mutex, the same way admissions serialize per
/// survey id. The admission path, the operator retry endpoint and the
/// background sweep can all reach `settle` concurrently; without the guard,
/// two callers could both miss the ledger entry and pay twice.
pub struct RewardSettlementLedger {
    store: Arc<dyn SurveyStore>,
    transfer: Arc<dyn RewardTransfer>,
    policy: RetryPolicy,
    guards: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl RewardSettlementLedger {
    pub fn new(
        store: Arc<dyn SurveyStore>,
        transfer: Arc<dyn RewardTransfer>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            transfer,
            policy,
            guards: Mutex::new(HashMap::new()),
        }
    }

    fn settlement_guard(&self, participation_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut guards = self.guards.lock().unwrap();
        guards
            .entry(participation_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    // Once the outcome is final (paid, or terminally failed) the guard is no
    // longer needed: late callers hit the ledger short-circuit, which is a
    // read plus an idempotent state repair.
    fn drop_guard(&self, participation_id: &str) {
        self.guards.lock().unwrap().remove(participation_id);
    }

    pub async fn settle(&self, participation: &Participation, amount: u64) -> AppResult<String> {
        let guard = self.settlement_guard(&participation.id);
        let _settling = guard.lock().await;

        let mut entry = match self.store.find_ledger_entry(&participation.id).await? {
            Some(entry) => {
                if let Some(tx) = entry.transaction_ref {
                    // The ledger is the source of truth; repair the
                    // participation record if an earlier state write was lost
                    // after the payment was recorded.
                    if participation.reward_state != RewardState::Settled {
                        self.store
                            .set_reward_state(&participation.id, RewardState::Settled, Some(&tx))
                            .await?;
                    }
                    return Ok(tx);
                }
                if entry.terminal {
                    let reason = entry
                        .last_error
                        .unwrap_or_else(|| "permanent transfer failure".to_string());
                    return Err(AppError::RewardSettlement(TransferFailure::Permanent(reason)));
                }
                entry
            }
            None => LedgerEntry::open(
                &participation.id,
                &participation.survey_id,
                &participation.user_id,
                amount,
            ),
        };

        let mut last_error = String::new();
        for attempt in 1..=self.policy.max_attempts {
            entry.attempts += 1;
            match self
                .transfer
                .transfer(&entry.recipient, entry.amount, &participation.id)
                .await
            {
                Ok(tx) => {
                    entry.transaction_ref = Some(tx.clone());
                    entry.settled_at = Some(Utc::now());
                    entry.last_error = None;
                    self.store.upsert_ledger_entry(&entry).await?;
                    self.store
                        .set_reward_state(&participation.id, RewardState::Settled, Some(&tx))
                        .await?;
                    self.drop_guard(&participation.id);
                    return Ok(tx);
                }
                Err(TransferFailure::Permanent(msg)) => {
                    eprintln!(
                        "❌ Permanent transfer failure for participation {}: {}",
                        participation.id, msg
                    );
                    entry.terminal = true;
                    entry.last_error = Some(msg.clone());
                    self.store.upsert_ledger_entry(&entry).await?;
                    self.store
                        .set_reward_state(&participation.id, RewardState::Failed, None)
                        .await?;
                    self.drop_guard(&participation.id);
                    return Err(AppError::RewardSettlement(TransferFailure::Permanent(msg)));
                }
                Err(TransferFailure::Transient(msg)) => {
                    last_error = msg;
                    if attempt < self.policy.max_attempts {
                        sleep(self.policy.base_delay * attempt).await;
                    }
                }
            }
        }

        entry.last_error = Some(last_error.clone());
        self.store.upsert_ledger_entry(&entry).await?;
        self.store
            .set_reward_state(&participation.id, RewardState::Failed, None)
            .await?;
        Err(AppError::RewardSettlement(TransferFailure::Transient(
            last_error,
        )))
    }

    /// Sweep over Failed participations whose ledger entry is not terminal.
    pub async fn retry_failed_settlements(&self) -> AppResult<RetrySummary> {
        let mut summary = RetrySummary::default();
        for participation in self.store.list_failed_participations().await? {
            if let Some(entry) = self.store.find_ledger_entry(&participation.id).await? {
                if entry.terminal {
                    summary.skipped_terminal += 1;
                    continue;
                }
            }
            let survey = match self.store.find_survey(&participation.survey_id).await? {
                Some(survey) => survey,
                None => continue,
            };
            summary.retried += 1;
            match self
                .settle(&participation, survey.reward_per_participant)
                .await
            {
                Ok(_) => summary.settled += 1,
                Err(_) => summary.still_failed += 1,
            }
        }
        Ok(summary)
    }
}

/// Optional periodic sweep; admission never depends on it.
pub fn spawn_retry_sweep(ledger: Arc<RewardSettlementLedger>, interval: Duration) {
    tokio::spawn(async move {
        loop {
            sleep(interval).await;
            match ledger.retry_failed_settlements().await {
                Ok(summary) if summary.retried > 0 => {
                    println!(
                        "Reward retry sweep: {} retried, {} settled, {} still failed",
                        summary.retried, summary.settled, summary.still_failed
                    );
                }
                Ok(_) => {}
                Err(err) => eprintln!("❌ Reward retry sweep failed: {}", err),
            }
        }
    });
}
