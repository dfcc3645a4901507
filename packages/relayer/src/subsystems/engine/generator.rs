use alloy_primitives::U256;
use async_trait::async_trait;
use rand::Rng;

use super::error::GeneratorError;

/// Produces one value on demand. Implementations may be slow or fail.
#[async_trait]
pub trait ValueGenerator: Send + Sync {
    async fn generate(&self) -> Result<U256, GeneratorError>;
}

/// Concatenates the decimal renderings of `SEGMENTS` uniform draws from
/// `[0, u32::MAX - 1]` and reads the digit string back as one number.
///
/// This is not a secure source: values are predictable to anyone who can
/// observe the process' thread-local RNG state.
#[derive(Debug, Default, Clone, Copy)]
pub struct DigitStringGenerator;

impl DigitStringGenerator {
    pub const SEGMENTS: usize = 5;

    pub fn digits(&self) -> String {
        let mut rng = rand::rng();
        (0..Self::SEGMENTS)
            .map(|_| rng.random_range(0..u32::MAX).to_string())
            .collect()
    }
}

#[async_trait]
impl ValueGenerator for DigitStringGenerator {
    async fn generate(&self) -> Result<U256, GeneratorError> {
        let digits = self.digits();
        U256::from_str_radix(&digits, 10).map_err(|e| GeneratorError::Parse(format!("{digits}: {e}")))
    }
}
