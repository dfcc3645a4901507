pub mod error;
pub mod streams;

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use error::TriggerError;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::instrument;
use utils::context::AppContext;

use crate::subsystems::queue::{Category, PendingRequest, RequestQueues};

/// A decoded contract event, as delivered by an `EventSource`.
///
/// `params` are positional: `[request id, caller address]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub name: String,
    pub params: Vec<String>,
}

/// Delivers contract events, in order, until the context is killed.
///
/// `start` returns once the source is running; events arrive on `sender`.
/// Reconnecting after a dropped connection is up to the source.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn start(
        &self,
        ctx: AppContext,
        sender: mpsc::UnboundedSender<ContractEvent>,
    ) -> Result<(), TriggerError>;
}

/// Appends recognized events to their category's queue and ignores the rest
#[derive(Clone)]
pub struct IngestionRouter {
    queues: Arc<RequestQueues>,
}

impl IngestionRouter {
    pub fn new(queues: Arc<RequestQueues>) -> Self {
        Self { queues }
    }

    /// Returns the category the event was queued under, if any
    pub fn route(&self, event: &ContractEvent) -> Option<Category> {
        let Some(category) = Category::from_event_name(&event.name) else {
            tracing::debug!("Ignoring unrecognized event {}", event.name);
            return None;
        };

        let Some(request) = parse_request(&event.params) else {
            tracing::debug!(
                "Ignoring malformed {} event, params: {:?}",
                event.name,
                event.params
            );
            return None;
        };

        tracing::debug!(
            "Queued {} request {} from {}",
            category,
            request.request_id,
            request.caller
        );
        self.queues.push(category, request);

        Some(category)
    }

    /// Routes events until the sender side closes or the context is killed
    #[instrument(skip(self, ctx, receiver), fields(subsys = "TriggerManager"))]
    pub async fn run(
        &self,
        ctx: AppContext,
        mut receiver: mpsc::UnboundedReceiver<ContractEvent>,
    ) {
        let mut kill_receiver = ctx.get_kill_receiver();

        if ctx.killed() {
            return;
        }

        loop {
            tokio::select! {
                biased;
                _ = kill_receiver.recv() => {
                    tracing::info!("Ingestion router received kill signal");
                    break;
                }
                event = receiver.recv() => match event {
                    Some(event) => {
                        self.route(&event);
                    }
                    None => {
                        tracing::info!("Event source closed, ingestion router exiting");
                        break;
                    }
                }
            }
        }
    }
}

fn parse_request(params: &[String]) -> Option<PendingRequest> {
    let [request_id, caller, ..] = params else {
        return None;
    };

    let request_id = U256::from_str_radix(request_id.trim(), 10).ok()?;
    let caller: Address = caller.trim().parse().ok()?;

    Some(PendingRequest { request_id, caller })
}
