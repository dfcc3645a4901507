pub mod mock_events;
pub mod mock_generator;
pub mod mock_submission;

use alloy_primitives::{Address, U256};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::subsystems::queue::PendingRequest;

/// A request whose caller is derived from the id, so tests can tell them apart
pub fn request(id: u64) -> PendingRequest {
    PendingRequest::new(U256::from(id), mock_caller(id))
}

pub fn mock_caller(id: u64) -> Address {
    let mut bytes = [0u8; 20];
    bytes[12..].copy_from_slice(&id.to_be_bytes());
    Address::from(bytes)
}

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);
const WAIT_POLL: Duration = Duration::from_millis(20);

/// Polls `condition` until it holds or the timeout passes
pub async fn wait_until(
    duration: Option<Duration>,
    mut condition: impl FnMut() -> bool,
) -> Result<(), WaitError> {
    let end = Instant::now() + duration.unwrap_or(WAIT_TIMEOUT);
    while Instant::now() < end {
        if condition() {
            return Ok(());
        }
        tokio::time::sleep(WAIT_POLL).await;
    }
    Err(WaitError::Timeout)
}

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum WaitError {
    #[error("Waiting timed out")]
    Timeout,
}
