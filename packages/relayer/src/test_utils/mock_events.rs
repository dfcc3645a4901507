use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use utils::context::AppContext;

use crate::subsystems::{
    queue::Category,
    trigger::{error::TriggerError, ContractEvent, EventSource},
};

use super::mock_caller;

pub fn mock_event(category: Category, id: u64) -> ContractEvent {
    ContractEvent {
        name: category.event_name().to_string(),
        params: vec![id.to_string(), mock_caller(id).to_string()],
    }
}

pub fn mock_unknown_event() -> ContractEvent {
    ContractEvent {
        name: "UnknownEvent".to_string(),
        params: vec!["1".to_string(), mock_caller(1).to_string()],
    }
}

/// Delivers a fixed backlog on start, then whatever the test sends.
/// Keeps the channel open until dropped.
pub struct MockEventSource {
    backlog: Vec<ContractEvent>,
    sender: Mutex<Option<mpsc::UnboundedSender<ContractEvent>>>,
    fail_start: bool,
}

impl MockEventSource {
    pub fn new(backlog: Vec<ContractEvent>) -> Self {
        Self {
            backlog,
            sender: Mutex::new(None),
            fail_start: false,
        }
    }

    /// `start` fails, as if the subscription could not be opened
    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Self::new(Vec::new())
        }
    }

    /// Returns false if the source hasn't started or the receiver is gone
    pub fn send(&self, event: ContractEvent) -> bool {
        match self.sender.lock().unwrap().as_ref() {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    async fn start(
        &self,
        _ctx: AppContext,
        sender: mpsc::UnboundedSender<ContractEvent>,
    ) -> Result<(), TriggerError> {
        if self.fail_start {
            return Err(TriggerError::EvmSubscription(anyhow::anyhow!(
                "mock subscription refused"
            )));
        }

        for event in &self.backlog {
            let _ = sender.send(event.clone());
        }

        *self.sender.lock().unwrap() = Some(sender);

        Ok(())
    }
}
