pub mod signing;

use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_provider::{DynProvider, ProviderBuilder, WsConnect};
use alloy_signer_local::PrivateKeySigner;
use signing::make_signer;
use std::{str::FromStr, sync::Arc};

use crate::{credential::Credential, error::EvmClientError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvmEndpoint {
    WebSocket(url::Url),
    Http(url::Url),
}

impl FromStr for EvmEndpoint {
    type Err = EvmClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = url::Url::parse(s).map_err(|e| EvmClientError::ParseEndpoint(e.to_string()))?;
        match url.scheme() {
            "ws" | "wss" => Ok(EvmEndpoint::WebSocket(url)),
            "http" | "https" => Ok(EvmEndpoint::Http(url)),
            scheme => Err(EvmClientError::ParseEndpoint(format!(
                "could not determine endpoint from scheme {scheme} (full url: {s})"
            ))),
        }
    }
}

impl std::fmt::Display for EvmEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvmEndpoint::WebSocket(url) => write!(f, "{}", url),
            EvmEndpoint::Http(url) => write!(f, "{}", url),
        }
    }
}

impl EvmEndpoint {
    pub fn is_websocket(&self) -> bool {
        matches!(self, EvmEndpoint::WebSocket(_))
    }

    pub async fn to_provider(&self) -> Result<DynProvider, EvmClientError> {
        Ok(match self {
            EvmEndpoint::WebSocket(url) => DynProvider::new(
                ProviderBuilder::new()
                    .connect_ws(WsConnect::new(url.clone()))
                    .await
                    .map_err(|e| EvmClientError::WebSocketProvider(e.into()))?,
            ),
            EvmEndpoint::Http(url) => {
                DynProvider::new(ProviderBuilder::new().connect_http(url.clone()))
            }
        })
    }
}

/// Read-only access, used for log subscriptions
#[derive(Clone)]
pub struct EvmQueryClient {
    pub endpoint: EvmEndpoint,
    pub provider: DynProvider,
}

impl EvmQueryClient {
    pub async fn new(endpoint: EvmEndpoint) -> Result<Self, EvmClientError> {
        Ok(EvmQueryClient {
            provider: endpoint.to_provider().await?,
            endpoint,
        })
    }
}

impl std::fmt::Debug for EvmQueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmQueryClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// A provider that fills nonce, chain id and (unless the transaction sets them) gas
/// and signs with a single key
#[derive(Clone)]
pub struct EvmSigningClient {
    pub endpoint: EvmEndpoint,
    pub provider: DynProvider,
    pub signer: Arc<PrivateKeySigner>,
}

impl EvmSigningClient {
    pub async fn new(endpoint: EvmEndpoint, credential: &Credential) -> Result<Self, EvmClientError> {
        let signer = make_signer(credential, None)?;
        let wallet: EthereumWallet = signer.clone().into();

        let builder = ProviderBuilder::new().wallet(wallet);

        let provider = match &endpoint {
            EvmEndpoint::WebSocket(url) => DynProvider::new(
                builder
                    .connect_ws(WsConnect::new(url.clone()))
                    .await
                    .map_err(|e| EvmClientError::WebSocketProvider(e.into()))?,
            ),
            EvmEndpoint::Http(url) => DynProvider::new(builder.connect_http(url.clone())),
        };

        Ok(Self {
            endpoint,
            provider,
            signer: Arc::new(signer),
        })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

impl std::fmt::Debug for EvmSigningClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmSigningClient")
            .field("endpoint", &self.endpoint)
            .field("address", &self.address())
            .finish()
    }
}
