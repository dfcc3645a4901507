use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU32, AtomicU64, Ordering},
        Mutex,
    },
};

use alloy_primitives::U256;
use async_trait::async_trait;

use crate::subsystems::engine::{error::GeneratorError, generator::ValueGenerator};

/// Plays back a script of values and failures. Once the script runs out it
/// either keeps failing or hands out 1, 2, 3, ...
pub struct MockValueGenerator {
    script: Mutex<VecDeque<Option<U256>>>,
    fail_when_empty: bool,
    counter: AtomicU64,
    calls: AtomicU32,
}

impl Default for MockValueGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockValueGenerator {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fail_when_empty: false,
            counter: AtomicU64::new(0),
            calls: AtomicU32::new(0),
        }
    }

    pub fn always_failing() -> Self {
        Self {
            fail_when_empty: true,
            ..Self::new()
        }
    }

    pub fn with_values(values: impl IntoIterator<Item = u64>) -> Self {
        let generator = Self::new();
        for value in values {
            generator.push_value(U256::from(value));
        }
        generator
    }

    pub fn push_value(&self, value: U256) {
        self.script.lock().unwrap().push_back(Some(value));
    }

    pub fn push_failure(&self) {
        self.script.lock().unwrap().push_back(None);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ValueGenerator for MockValueGenerator {
    async fn generate(&self) -> Result<U256, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(GeneratorError::Source("scripted failure".to_string())),
            None if self.fail_when_empty => {
                Err(GeneratorError::Source("generator unavailable".to_string()))
            }
            None => Ok(U256::from(self.counter.fetch_add(1, Ordering::SeqCst) + 1)),
        }
    }
}
