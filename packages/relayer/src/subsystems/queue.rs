mod category;

pub use category::{BonusPlacement, BonusPolicy, Category};

use alloy_primitives::{Address, U256};
use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// A randomness request waiting to be answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: U256,
    pub caller: Address,
}

impl PendingRequest {
    pub fn new(request_id: impl Into<U256>, caller: Address) -> Self {
        Self {
            request_id: request_id.into(),
            caller,
        }
    }
}

/// One unbounded FIFO per category.
///
/// Any task may push. Only the dispatch scheduler pops or drains, and it never
/// runs two cycles at once, so each queue has a single draining writer.
/// There is no deduplication: the same request observed twice is queued twice.
pub struct RequestQueues {
    queues: [Mutex<VecDeque<PendingRequest>>; Category::COUNT],
}

impl Default for RequestQueues {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestQueues {
    pub fn new() -> Self {
        Self {
            queues: std::array::from_fn(|_| Mutex::new(VecDeque::new())),
        }
    }

    pub fn push(&self, category: Category, request: PendingRequest) {
        self.queue(category).push_back(request);
    }

    /// Removes the oldest request, if any
    pub fn pop(&self, category: Category) -> Option<PendingRequest> {
        self.queue(category).pop_front()
    }

    /// Removes and returns up to `max` of the oldest requests, oldest first
    pub fn drain(&self, category: Category, max: usize) -> Vec<PendingRequest> {
        let mut queue = self.queue(category);
        let n = max.min(queue.len());
        queue.drain(..n).collect()
    }

    pub fn len(&self, category: Category) -> usize {
        self.queue(category).len()
    }

    pub fn total_len(&self) -> usize {
        Category::DISPATCH_ORDER
            .into_iter()
            .map(|category| self.len(category))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    // a panic while holding the lock can't leave a VecDeque half-updated,
    // so a poisoned queue is still safe to use
    fn queue(&self, category: Category) -> MutexGuard<'_, VecDeque<PendingRequest>> {
        self.queues[category.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
