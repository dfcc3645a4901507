pub mod error;
pub mod evm;

use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use error::SubmissionError;

use crate::contract::IRngOracle;
use crate::subsystems::queue::{Category, PendingRequest};

/// What gets written on-chain for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RandomValue {
    Single(U256),
    Batch(Vec<U256>),
}

impl RandomValue {
    /// The fallback written when generation never succeeded: `0`, or `[0]` for batches
    pub fn sentinel(category: Category) -> Self {
        if category.is_batch() {
            RandomValue::Batch(vec![U256::ZERO])
        } else {
            RandomValue::Single(U256::ZERO)
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, RandomValue::Batch(_))
    }
}

impl std::fmt::Display for RandomValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RandomValue::Single(value) => write!(f, "{value}"),
            RandomValue::Batch(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub category: Category,
    pub request_id: U256,
    pub caller: Address,
    pub value: RandomValue,
    /// true when `value` is the sentinel
    pub fallback: bool,
}

impl Submission {
    pub fn new(category: Category, request: &PendingRequest, value: RandomValue) -> Self {
        Self {
            category,
            request_id: request.request_id,
            caller: request.caller,
            value,
            fallback: false,
        }
    }

    pub fn fallback(category: Category, request: &PendingRequest) -> Self {
        Self {
            fallback: true,
            ..Self::new(category, request, RandomValue::sentinel(category))
        }
    }

    /// ABI-encoded call to the category's setter
    pub fn calldata(&self) -> Result<Bytes, SubmissionError> {
        use IRngOracle::*;

        let caller_address = self.caller;
        let id = self.request_id;

        let encoded = match (self.category, &self.value) {
            (Category::H13, RandomValue::Single(random_number)) => setH13RandomNumberCall {
                random_number: *random_number,
                caller_address,
                id,
            }
            .abi_encode(),
            (Category::H35, RandomValue::Single(random_number)) => setH35RandomNumberCall {
                random_number: *random_number,
                caller_address,
                id,
            }
            .abi_encode(),
            (Category::G13, RandomValue::Single(random_number)) => setG13RandomNumberCall {
                random_number: *random_number,
                caller_address,
                id,
            }
            .abi_encode(),
            (Category::G35, RandomValue::Single(random_number)) => setG35RandomNumberCall {
                random_number: *random_number,
                caller_address,
                id,
            }
            .abi_encode(),
            (Category::DL, RandomValue::Single(random_number)) => setHDLRandomNumberCall {
                random_number: *random_number,
                caller_address,
                id,
            }
            .abi_encode(),
            (Category::H13Batch, RandomValue::Batch(random_numbers)) => setH13BatchRandomNumberCall {
                random_numbers: random_numbers.clone(),
                caller_address,
                id,
            }
            .abi_encode(),
            (Category::H35Batch, RandomValue::Batch(random_numbers)) => setH35BatchRandomNumberCall {
                random_numbers: random_numbers.clone(),
                caller_address,
                id,
            }
            .abi_encode(),
            (Category::G13Batch, RandomValue::Batch(random_numbers)) => setG13BatchRandomNumberCall {
                random_numbers: random_numbers.clone(),
                caller_address,
                id,
            }
            .abi_encode(),
            (Category::G35Batch, RandomValue::Batch(random_numbers)) => setG35BatchRandomNumberCall {
                random_numbers: random_numbers.clone(),
                caller_address,
                id,
            }
            .abi_encode(),
            (category, _) => {
                return Err(SubmissionError::ValueShape {
                    category,
                    expected: if category.is_batch() { "batch" } else { "single" },
                })
            }
        };

        Ok(encoded.into())
    }
}

/// The result of a transaction that made it on-chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub tx_hash: TxHash,
    pub success: bool,
}

/// Sends one signed call to the oracle contract and waits for it to land
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, SubmissionError>;
}
