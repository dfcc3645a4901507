use alloy_primitives::U256;
use alloy_provider::Provider;
use thiserror::Error;
use tracing::instrument;
use utils::evm_client::EvmSigningClient;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("unable to query balance: {0}")]
    Balance(anyhow::Error),
    #[error("unable to query gas price: {0}")]
    GasPrice(anyhow::Error),
}

/// Balance and gas pricing, queried once at startup and reused for every submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkSnapshot {
    pub balance: Option<U256>,
    /// the chain's gas price at startup
    pub min_gas_price: Option<u128>,
    /// the gas price every submission is sent with, `None` leaves it to the provider
    pub gas_price: Option<u128>,
    pub gas_sufficient: bool,
}

impl NetworkSnapshot {
    #[instrument(skip(client), fields(subsys = "Network", address = %client.address()))]
    pub async fn query(
        client: &EvmSigningClient,
        configured_gas_price: Option<u128>,
    ) -> Result<Self, NetworkError> {
        let balance = client
            .provider
            .get_balance(client.address())
            .await
            .map_err(|e| NetworkError::Balance(e.into()))?;

        let min_gas_price = client
            .provider
            .get_gas_price()
            .await
            .map_err(|e| NetworkError::GasPrice(e.into()))?;

        Ok(Self::from_prices(balance, min_gas_price, configured_gas_price))
    }

    /// The configured gas price wins over the chain's
    pub fn from_prices(
        balance: U256,
        min_gas_price: u128,
        configured_gas_price: Option<u128>,
    ) -> Self {
        let gas_price = configured_gas_price.unwrap_or(min_gas_price);

        Self {
            balance: Some(balance),
            min_gas_price: Some(min_gas_price),
            gas_price: Some(gas_price),
            gas_sufficient: gas_price >= min_gas_price,
        }
    }

    /// Used when the startup query failed. Nothing is known about the chain,
    /// so sufficiency can't be claimed.
    pub fn degraded(configured_gas_price: Option<u128>) -> Self {
        Self {
            gas_price: configured_gas_price,
            ..Default::default()
        }
    }

    pub fn log(&self) {
        tracing::info!(
            "Balance: {}, minimum gas price: {}, chosen gas price: {}",
            display_or_unknown(self.balance),
            display_or_unknown(self.min_gas_price),
            display_or_unknown(self.gas_price)
        );

        if self.min_gas_price.is_some() && !self.gas_sufficient {
            tracing::warn!("Chosen gas price is below the chain's current gas price, submissions may stall");
        }
    }
}

fn display_or_unknown(value: Option<impl std::fmt::Display>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
