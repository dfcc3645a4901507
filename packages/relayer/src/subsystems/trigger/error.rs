use thiserror::Error;
use utils::error::EvmClientError;

#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("EVM client: {0}")]
    EvmClient(#[from] EvmClientError),
    #[error("EVM client: missing websocket endpoint")]
    EvmMissingWebsocket,
    #[error("Evm subscription: {0}")]
    EvmSubscription(anyhow::Error),
    #[error("Unable to decode log: {0}")]
    DecodeLog(String),
}
