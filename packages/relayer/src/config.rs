use anyhow::{anyhow, ensure, Context, Result};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utils::{
    config::ConfigExt, credential::Credential, evm_client::EvmEndpoint,
    serde::deserialize_vec_string,
};

/// The fully parsed and validated config struct we use in the application
/// this is built up from the ConfigBuilder which can load from multiple sources (in order of preference):
///
/// 1. cli args
/// 2. environment variables
/// 3. config file
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Requests drained per category per dispatch cycle
    /// Default is `3`
    pub chunk_size: usize,
    /// Generation attempts per request before falling back to the sentinel
    /// Default is `5`
    pub max_retries: u32,
    /// Milliseconds between dispatch cycles
    /// Default is `3000`
    pub sleep_interval_ms: u64,
    /// The log-level to use, in the format of [tracing directives](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html#directives).
    /// Default is `["info"]`
    #[serde(deserialize_with = "deserialize_vec_string")]
    pub log_level: Vec<String>,

    pub credential: Option<Credential>,
    pub contract_address: Option<String>,
    pub ws_endpoint: Option<String>,
    pub http_endpoint: Option<String>,

    /// Wei. When unset, the chain's gas price at startup is used
    pub gas_price: Option<u64>,
    /// Default is `200000`
    pub gas_limit: u64,
}

/// Default values for the config struct
/// these are only used to fill in holes after all the parsing and loading is done
impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: 3,
            max_retries: 5,
            sleep_interval_ms: 3000,
            log_level: vec!["info".to_string()],
            credential: None,
            contract_address: None,
            ws_endpoint: None,
            http_endpoint: None,
            gas_price: None,
            gas_limit: 200_000,
        }
    }
}

impl Config {
    pub fn sleep_interval(&self) -> Duration {
        Duration::from_millis(self.sleep_interval_ms)
    }

    pub fn credential(&self) -> Result<&Credential> {
        self.credential
            .as_ref()
            .ok_or_else(|| anyhow!("No credential configured (set RNG_RELAYER_CREDENTIAL)"))
    }

    pub fn contract_address(&self) -> Result<Address> {
        let address = self
            .contract_address
            .as_deref()
            .ok_or_else(|| anyhow!("No contract address configured"))?;

        address
            .trim()
            .parse()
            .with_context(|| format!("Invalid contract address: {address}"))
    }

    /// Where events are subscribed
    pub fn event_endpoint(&self) -> Result<EvmEndpoint> {
        let endpoint = self
            .ws_endpoint
            .as_deref()
            .ok_or_else(|| anyhow!("No websocket endpoint configured"))?;

        Ok(endpoint.parse()?)
    }

    /// Where transactions are sent, falling back to the websocket endpoint
    pub fn submission_endpoint(&self) -> Result<EvmEndpoint> {
        match self.http_endpoint.as_deref() {
            Some(endpoint) => Ok(endpoint.parse()?),
            None => self.event_endpoint(),
        }
    }

    pub fn gas_price(&self) -> Option<u128> {
        self.gas_price.map(u128::from)
    }
}

impl ConfigExt for Config {
    const FILENAME: &'static str = "rng-relayer.toml";
    const DIRNAME: &'static str = "rng-relayer";

    fn log_levels(&self) -> impl Iterator<Item = &str> {
        self.log_level.iter().map(|s| s.as_str())
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.chunk_size >= 1, "chunk_size must be at least 1");
        ensure!(self.max_retries >= 1, "max_retries must be at least 1");
        ensure!(
            self.sleep_interval_ms >= 1,
            "sleep_interval_ms must be at least 1"
        );
        Ok(())
    }
}
