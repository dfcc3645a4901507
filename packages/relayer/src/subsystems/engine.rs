pub mod error;
pub mod generator;

use std::sync::Arc;

use alloy_primitives::{TxHash, U256};
use error::GeneratorError;
use generator::ValueGenerator;
use tracing::instrument;

use crate::subsystems::{
    queue::{BonusPlacement, BonusPolicy, Category, PendingRequest},
    submission::{ChainClient, RandomValue, Submission},
};

/// Number of values in a batch submission
pub const BATCH_SIZE: usize = 10;

/// What happened to the one transaction sent for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Confirmed(TxHash),
    Reverted(TxHash),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// generation attempts, including the successful one
    pub attempts: u32,
    pub submission: Submission,
    pub outcome: SubmissionOutcome,
}

/// Turns one pending request into exactly one submission.
///
/// Generation is retried immediately, up to `max_retries` attempts in total.
/// If every attempt fails the sentinel is submitted instead. The submission
/// itself is never retried: whatever happens to it is logged and the request
/// is done.
#[derive(Clone)]
pub struct RequestExecutor {
    generator: Arc<dyn ValueGenerator>,
    chain: Arc<dyn ChainClient>,
    max_retries: u32,
}

impl RequestExecutor {
    pub fn new(
        generator: Arc<dyn ValueGenerator>,
        chain: Arc<dyn ChainClient>,
        max_retries: u32,
    ) -> Self {
        Self {
            generator,
            chain,
            max_retries,
        }
    }

    #[instrument(skip(self, request), fields(subsys = "Engine", category = %category, request_id = %request.request_id))]
    pub async fn execute(&self, category: Category, request: PendingRequest) -> ExecutionReport {
        let (submission, attempts) = self.prepare(category, &request).await;

        let outcome = match self.chain.submit(&submission).await {
            Ok(receipt) if receipt.success => {
                tracing::info!(
                    "{} for caller {} confirmed in {} (fallback: {})",
                    category.submit_method(),
                    submission.caller,
                    receipt.tx_hash,
                    submission.fallback
                );
                SubmissionOutcome::Confirmed(receipt.tx_hash)
            }
            Ok(receipt) => {
                tracing::warn!(
                    "{} for caller {} failed on-chain in {}",
                    category.submit_method(),
                    submission.caller,
                    receipt.tx_hash
                );
                SubmissionOutcome::Reverted(receipt.tx_hash)
            }
            Err(e) => {
                tracing::error!(
                    "{} for caller {} not submitted: {}",
                    category.submit_method(),
                    submission.caller,
                    e
                );
                SubmissionOutcome::Failed(e.to_string())
            }
        };

        ExecutionReport {
            attempts,
            submission,
            outcome,
        }
    }

    async fn prepare(&self, category: Category, request: &PendingRequest) -> (Submission, u32) {
        let mut attempts = 0;

        while attempts < self.max_retries {
            attempts += 1;
            match self.generate_value(category).await {
                Ok(value) => return (Submission::new(category, request, value), attempts),
                Err(e) => {
                    tracing::warn!(
                        "Generation attempt {}/{} failed: {}",
                        attempts,
                        self.max_retries,
                        e
                    );
                }
            }
        }

        tracing::warn!(
            "Generation failed {} times, submitting fallback value",
            attempts
        );
        (Submission::fallback(category, request), attempts)
    }

    /// One generation attempt. Batch categories need `BATCH_SIZE` successful
    /// draws; any failure fails the attempt.
    pub async fn generate_value(&self, category: Category) -> Result<RandomValue, GeneratorError> {
        let Some(policy) = category.bonus() else {
            return Ok(RandomValue::Single(self.generator.generate().await?));
        };

        let mut values = Vec::with_capacity(BATCH_SIZE);

        if policy.placement == BonusPlacement::First {
            values.push(self.bonus_value(&policy).await?);
        }

        for _ in 0..BATCH_SIZE - 1 {
            values.push(self.generator.generate().await?);
        }

        if policy.placement == BonusPlacement::Last {
            values.push(self.bonus_value(&policy).await?);
        }

        Ok(RandomValue::Batch(values))
    }

    async fn bonus_value(&self, policy: &BonusPolicy) -> Result<U256, GeneratorError> {
        let generated = self.generator.generate().await?;
        Ok(apply_bonus(generated, policy.draw()))
    }
}

/// Appends the two-digit bonus to the decimal digits of `generated`
pub fn apply_bonus(generated: U256, bonus: u64) -> U256 {
    generated
        .saturating_mul(U256::from(100u8))
        .saturating_add(U256::from(bonus))
}
