use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::TransactionRequest;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::instrument;
use utils::{
    credential::Credential,
    error::EvmClientError,
    evm_client::{signing::make_signer, EvmEndpoint, EvmSigningClient},
};

use super::{error::SubmissionError, ChainClient, Submission, SubmissionReceipt};

/// Submits straight to the oracle contract from a single signing key.
///
/// The provider is connected on first use and kept afterwards. Until a
/// connection succeeds every submission fails with `SubmissionError::EvmClient`.
#[derive(Debug)]
pub struct EvmChainClient {
    endpoint: EvmEndpoint,
    credential: Credential,
    address: Address,
    client: Mutex<Option<EvmSigningClient>>,
    contract_address: Address,
    gas_limit: u64,
    gas_price: Option<u128>,
}

impl EvmChainClient {
    /// Fails only if the credential can't produce a signer, no connection is made
    pub fn new(
        endpoint: EvmEndpoint,
        credential: Credential,
        contract_address: Address,
        gas_limit: u64,
    ) -> Result<Self, EvmClientError> {
        let address = make_signer(&credential, None)?.address();

        Ok(Self {
            endpoint,
            credential,
            address,
            client: Mutex::new(None),
            contract_address,
            gas_limit,
            gas_price: None,
        })
    }

    /// `None` leaves pricing to the provider's gas filler
    pub fn with_gas_price(mut self, gas_price: Option<u128>) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn endpoint(&self) -> &EvmEndpoint {
        &self.endpoint
    }

    /// Returns the connected client, connecting first if needed
    pub async fn connect(&self) -> Result<EvmSigningClient, EvmClientError> {
        let mut client = self.client.lock().await;

        if let Some(client) = client.as_ref() {
            return Ok(client.clone());
        }

        let connected = EvmSigningClient::new(self.endpoint.clone(), &self.credential).await?;
        *client = Some(connected.clone());

        Ok(connected)
    }

    fn transaction(&self, submission: &Submission) -> Result<TransactionRequest, SubmissionError> {
        let mut tx = TransactionRequest::default()
            .with_from(self.address)
            .with_to(self.contract_address)
            .with_input(submission.calldata()?)
            .with_value(U256::ZERO)
            .with_gas_limit(self.gas_limit);

        if let Some(gas_price) = self.gas_price {
            tx = tx.with_gas_price(gas_price);
        }

        Ok(tx)
    }
}

#[async_trait]
impl ChainClient for EvmChainClient {
    #[instrument(skip(self, submission), fields(subsys = "Submission", category = %submission.category, request_id = %submission.request_id))]
    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, SubmissionError> {
        let tx = self.transaction(submission)?;
        let client = self.connect().await?;

        tracing::debug!(
            "Sending {} to {}",
            submission.category.submit_method(),
            self.contract_address
        );

        let receipt = client
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| SubmissionError::Send(e.into()))?
            .get_receipt()
            .await
            .map_err(|e| SubmissionError::Receipt(e.into()))?;

        Ok(SubmissionReceipt {
            tx_hash: receipt.transaction_hash,
            success: receipt.status(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::subsystems::{
        queue::{Category, PendingRequest},
        submission::RandomValue,
    };

    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn client(endpoint: &str, credential: &str) -> Result<EvmChainClient, EvmClientError> {
        EvmChainClient::new(
            endpoint.parse().unwrap(),
            Credential::new(credential.to_string()),
            Address::repeat_byte(1),
            200_000,
        )
    }

    #[test]
    fn bad_credential_is_rejected_up_front() {
        assert!(client("ws://127.0.0.1:1", "0xnothex").is_err());
        assert!(client("ws://127.0.0.1:1", "not a mnemonic").is_err());
    }

    #[test]
    fn construction_does_not_connect() {
        let client = client("ws://127.0.0.1:1", ANVIL_KEY).unwrap();
        assert_eq!(
            client.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[tokio::test]
    async fn unreachable_node_fails_each_submission() {
        let client = client("ws://127.0.0.1:1", ANVIL_KEY).unwrap();
        let submission = Submission::new(
            Category::H13,
            &PendingRequest::new(U256::from(1), Address::repeat_byte(2)),
            RandomValue::Single(U256::from(5)),
        );

        for _ in 0..2 {
            assert!(matches!(
                client.submit(&submission).await,
                Err(SubmissionError::EvmClient(_))
            ));
        }
    }
}
