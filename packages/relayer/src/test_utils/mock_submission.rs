use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex,
};

use alloy_primitives::TxHash;
use async_trait::async_trait;

use crate::subsystems::submission::{
    error::SubmissionError, ChainClient, Submission, SubmissionReceipt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Confirm,
    Revert,
    Fail,
}

/// Records every submission it's asked to send, in order
pub struct MockChainClient {
    inbox: Mutex<Vec<Submission>>,
    mode: Mode,
    nonce: AtomicU64,
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChainClient {
    pub fn new() -> Self {
        Self::with_mode(Mode::Confirm)
    }

    /// Every transaction lands but fails on-chain
    pub fn reverting() -> Self {
        Self::with_mode(Mode::Revert)
    }

    /// Every transaction fails to send
    pub fn failing() -> Self {
        Self::with_mode(Mode::Fail)
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            inbox: Mutex::new(Vec::new()),
            mode,
            nonce: AtomicU64::new(0),
        }
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.inbox.lock().unwrap().clone()
    }

    pub fn submission_count(&self) -> usize {
        self.inbox.lock().unwrap().len()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, SubmissionError> {
        // exercise the encoding path even though nothing is sent
        submission.calldata()?;

        self.inbox.lock().unwrap().push(submission.clone());
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);

        let mut tx_hash = TxHash::ZERO;
        tx_hash[24..].copy_from_slice(&nonce.to_be_bytes());

        match self.mode {
            Mode::Confirm => Ok(SubmissionReceipt {
                tx_hash,
                success: true,
            }),
            Mode::Revert => Ok(SubmissionReceipt {
                tx_hash,
                success: false,
            }),
            Mode::Fail => Err(SubmissionError::Send(anyhow::anyhow!("connection refused"))),
        }
    }
}
