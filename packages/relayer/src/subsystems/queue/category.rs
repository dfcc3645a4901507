use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// One of the nine kinds of randomness request the oracle contract emits:
/// a summon tier, either single or batch-of-10 (`DL` has no batch variant)
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    H13,
    H35,
    G13,
    G35,
    DL,
    H13Batch,
    G13Batch,
    H35Batch,
    G35Batch,
}

/// Where the bonus-adjusted value sits in a batch submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusPlacement {
    First,
    Last,
}

/// The inclusive bonus range for a batch category, and where the adjusted value goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusPolicy {
    pub min: u64,
    pub max: u64,
    pub placement: BonusPlacement,
}

impl BonusPolicy {
    pub fn range(&self) -> RangeInclusive<u64> {
        self.min..=self.max
    }

    /// A uniform draw from the whole range, both ends included
    pub fn draw(&self) -> u64 {
        rand::rng().random_range(self.range())
    }
}

impl Category {
    pub const COUNT: usize = 9;

    /// The order a dispatch cycle visits the queues in
    pub const DISPATCH_ORDER: [Category; Category::COUNT] = [
        Category::H13,
        Category::H35,
        Category::G13,
        Category::G35,
        Category::DL,
        Category::H13Batch,
        Category::G13Batch,
        Category::H35Batch,
        Category::G35Batch,
    ];

    /// Position in `DISPATCH_ORDER`, also the slot in the queue registry
    pub const fn index(self) -> usize {
        match self {
            Category::H13 => 0,
            Category::H35 => 1,
            Category::G13 => 2,
            Category::G35 => 3,
            Category::DL => 4,
            Category::H13Batch => 5,
            Category::G13Batch => 6,
            Category::H35Batch => 7,
            Category::G35Batch => 8,
        }
    }

    pub const fn is_batch(self) -> bool {
        matches!(
            self,
            Category::H13Batch | Category::G13Batch | Category::H35Batch | Category::G35Batch
        )
    }

    /// The contract event that requests this category
    pub const fn event_name(self) -> &'static str {
        match self {
            Category::H13 => "RequestedH13RandomNumber",
            Category::H35 => "RequestedH35RandomNumber",
            Category::G13 => "RequestedG13RandomNumber",
            Category::G35 => "RequestedG35RandomNumber",
            Category::DL => "RequestedHDLRandomNumber",
            Category::H13Batch => "RequestedH13BatchRandomNumber",
            Category::G13Batch => "RequestedG13BatchRandomNumber",
            Category::H35Batch => "RequestedH35BatchRandomNumber",
            Category::G35Batch => "RequestedG35BatchRandomNumber",
        }
    }

    pub fn from_event_name(name: &str) -> Option<Self> {
        Self::DISPATCH_ORDER
            .into_iter()
            .find(|category| category.event_name() == name)
    }

    /// The contract method that answers this category
    pub const fn submit_method(self) -> &'static str {
        match self {
            Category::H13 => "setH13RandomNumber",
            Category::H35 => "setH35RandomNumber",
            Category::G13 => "setG13RandomNumber",
            Category::G35 => "setG35RandomNumber",
            Category::DL => "setHDLRandomNumber",
            Category::H13Batch => "setH13BatchRandomNumber",
            Category::G13Batch => "setG13BatchRandomNumber",
            Category::H35Batch => "setH35BatchRandomNumber",
            Category::G35Batch => "setG35BatchRandomNumber",
        }
    }

    /// `None` for single categories
    pub const fn bonus(self) -> Option<BonusPolicy> {
        let (min, max, placement) = match self {
            Category::H13Batch => (95, 99, BonusPlacement::Last),
            Category::H35Batch => (80, 97, BonusPlacement::Last),
            Category::G13Batch => (90, 94, BonusPlacement::Last),
            Category::G35Batch => (80, 97, BonusPlacement::First),
            Category::H13 | Category::H35 | Category::G13 | Category::G35 | Category::DL => {
                return None
            }
        };

        Some(BonusPolicy {
            min,
            max,
            placement,
        })
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Category::H13 => "H13",
            Category::H35 => "H35",
            Category::G13 => "G13",
            Category::G35 => "G35",
            Category::DL => "DL",
            Category::H13Batch => "H13-batch",
            Category::G13Batch => "G13-batch",
            Category::H35Batch => "H35-batch",
            Category::G35Batch => "G35-batch",
        };
        f.write_str(label)
    }
}
