use thiserror::Error;
use utils::error::EvmClientError;

use crate::subsystems::queue::Category;

#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("EVM client: {0}")]
    EvmClient(#[from] EvmClientError),
    #[error("{category} expects a {expected} value")]
    ValueShape {
        category: Category,
        expected: &'static str,
    },
    #[error("failed to send transaction: {0}")]
    Send(anyhow::Error),
    #[error("failed to get receipt: {0}")]
    Receipt(anyhow::Error),
}
