use alloy_primitives::Address;
use alloy_provider::Provider;
use alloy_rpc_types_eth::{Filter, Log};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::instrument;
use utils::{
    context::AppContext,
    evm_client::{EvmEndpoint, EvmQueryClient},
};

use crate::contract::IRngOracle;
use crate::subsystems::trigger::{error::TriggerError, ContractEvent, EventSource};

const INITIAL_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 10_000;

/// Watches the oracle contract's logs over a websocket
#[derive(Debug, Clone)]
pub struct EvmEventSource {
    endpoint: EvmEndpoint,
    contract_address: Address,
}

impl EvmEventSource {
    pub fn new(endpoint: EvmEndpoint, contract_address: Address) -> Self {
        Self {
            endpoint,
            contract_address,
        }
    }
}

#[async_trait]
impl EventSource for EvmEventSource {
    #[instrument(skip(self, ctx, sender), fields(subsys = "TriggerManager", endpoint = %self.endpoint))]
    async fn start(
        &self,
        ctx: AppContext,
        sender: mpsc::UnboundedSender<ContractEvent>,
    ) -> Result<(), TriggerError> {
        if !self.endpoint.is_websocket() {
            return Err(TriggerError::EvmMissingWebsocket);
        }

        let query_client = EvmQueryClient::new(self.endpoint.clone()).await?;
        let filter = Filter::new().address(self.contract_address);

        let mut stream = start_evm_stream(query_client, filter, ctx.get_kill_receiver());

        ctx.rt.spawn(async move {
            while let Some(res) = stream.next().await {
                match res {
                    Ok(log) => match decode_log(&log) {
                        Ok(event) => {
                            if sender.send(event).is_err() {
                                tracing::info!("Ingestion closed, dropping EVM log stream");
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::debug!("Dropping undecodable log: {}", e);
                        }
                    },
                    Err(e) => {
                        tracing::warn!("EVM log stream error: {}", e);
                    }
                }
            }
        });

        Ok(())
    }
}

/// Start a resilient EVM log stream that resubscribes with backoff until killed
pub fn start_evm_stream(
    query_client: EvmQueryClient,
    filter: Filter,
    mut kill_receiver: broadcast::Receiver<()>,
) -> Pin<Box<dyn Stream<Item = Result<Log, TriggerError>> + Send>> {
    let provider = query_client.provider.clone();

    let stream = async_stream::stream! {
        let mut backoff_ms = INITIAL_BACKOFF_MS;
        loop {
            tracing::info!("Subscribing to logs with filter: {:?}", filter);
            match provider.subscribe_logs(&filter).await {
                Ok(sub) => {
                    backoff_ms = INITIAL_BACKOFF_MS;
                    let mut inner = sub.into_stream();
                    let mut should_exit = false;
                    loop {
                        tokio::select! {
                            biased;
                            _ = kill_receiver.recv() => {
                                tracing::info!("EVM log subscription received shutdown signal");
                                should_exit = true;
                                break;
                            }
                            maybe_log = inner.next() => {
                                match maybe_log {
                                    Some(log) => {
                                        if log.removed { continue; }
                                        yield Ok(log);
                                    }
                                    None => break,
                                }
                            }
                        }
                    }
                    if should_exit {
                        break;
                    }
                    tracing::warn!("EVM log subscription ended; reconnecting...");
                    yield Err(TriggerError::EvmSubscription(anyhow::anyhow!("log subscription ended")));
                }
                Err(e) => {
                    tracing::error!("EVM subscribe_logs error: {:?}", e);
                    yield Err(TriggerError::EvmSubscription(e.into()));
                }
            }

            tokio::select! {
                _ = kill_receiver.recv() => break,
                _ = tokio::time::sleep(Duration::from_millis(backoff_ms)) => {}
            }
            backoff_ms = backoff_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
        }
    };

    Box::pin(stream)
}

macro_rules! decode_oracle_events {
    ($log_data:expr, $($event:ident),+ $(,)?) => {{
        let log_data = $log_data;
        match log_data.topics().first() {
            $(
                Some(topic) if *topic == IRngOracle::$event::SIGNATURE_HASH => {
                    let decoded = IRngOracle::$event::decode_log_data(log_data)
                        .map_err(|e| TriggerError::DecodeLog(e.to_string()))?;
                    Ok(ContractEvent {
                        name: stringify!($event).to_string(),
                        params: vec![decoded.id.to_string(), decoded.caller.to_string()],
                    })
                }
            )+
            Some(topic) => Err(TriggerError::DecodeLog(format!("unknown event signature {topic}"))),
            None => Err(TriggerError::DecodeLog("log has no topics".to_string())),
        }
    }};
}

/// Turns a raw oracle log into the notification the ingestion router expects
pub fn decode_log(log: &Log) -> Result<ContractEvent, TriggerError> {
    decode_oracle_events!(
        log.data(),
        RequestedH13RandomNumber,
        RequestedH35RandomNumber,
        RequestedG13RandomNumber,
        RequestedG35RandomNumber,
        RequestedHDLRandomNumber,
        RequestedH13BatchRandomNumber,
        RequestedH35BatchRandomNumber,
        RequestedG13BatchRandomNumber,
        RequestedG35BatchRandomNumber,
    )
}
