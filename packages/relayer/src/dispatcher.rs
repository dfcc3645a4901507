use std::{sync::Arc, time::Duration};

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::instrument;
use utils::context::AppContext;

use crate::subsystems::{
    engine::{ExecutionReport, RequestExecutor, SubmissionOutcome},
    queue::{Category, RequestQueues},
};

/// Counts from one dispatch cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    processed: [usize; Category::COUNT],
    pub fallbacks: usize,
    pub failed: usize,
}

impl CycleSummary {
    fn record(&mut self, category: Category, report: &ExecutionReport) {
        self.processed[category.index()] += 1;
        if report.submission.fallback {
            self.fallbacks += 1;
        }
        if !matches!(report.outcome, SubmissionOutcome::Confirmed(_)) {
            self.failed += 1;
        }
    }

    pub fn processed(&self, category: Category) -> usize {
        self.processed[category.index()]
    }

    pub fn total(&self) -> usize {
        self.processed.iter().sum()
    }
}

/// Drains the queues on a fixed cadence.
///
/// Each cycle visits the categories in `Category::DISPATCH_ORDER` and pops up
/// to `chunk_size` requests from each, executing every request before popping
/// the next. Cycles never overlap: a slow cycle pushes the next tick back instead.
pub struct DispatchScheduler {
    queues: Arc<RequestQueues>,
    executor: RequestExecutor,
    chunk_size: usize,
    interval: Duration,
}

impl DispatchScheduler {
    pub fn new(
        queues: Arc<RequestQueues>,
        executor: RequestExecutor,
        chunk_size: usize,
        interval: Duration,
    ) -> Self {
        Self {
            queues,
            executor,
            chunk_size,
            interval,
        }
    }

    /// Runs one cycle to completion
    #[instrument(skip(self), fields(subsys = "Dispatcher"))]
    pub async fn run_cycle(&self) -> CycleSummary {
        let mut summary = CycleSummary::default();

        for category in Category::DISPATCH_ORDER {
            // one at a time, so requests arriving mid-chunk can still make this cycle
            for _ in 0..self.chunk_size {
                let Some(request) = self.queues.pop(category) else {
                    break;
                };
                let report = self.executor.execute(category, request).await;
                summary.record(category, &report);
            }
        }

        summary
    }

    /// Runs cycles until the context is killed. A cycle that has started
    /// always finishes, even if the kill arrives halfway through.
    #[instrument(skip(self, ctx), fields(subsys = "Dispatcher"))]
    pub async fn run(&self, ctx: AppContext) {
        let mut kill_receiver = ctx.get_kill_receiver();

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Dispatching every {:?}, up to {} requests per category",
            self.interval,
            self.chunk_size
        );

        loop {
            if ctx.killed() {
                break;
            }

            tokio::select! {
                biased;
                _ = kill_receiver.recv() => {
                    tracing::info!("Dispatcher received kill signal");
                    break;
                }
                _ = ticker.tick() => {
                    let summary = self.run_cycle().await;
                    if summary.total() > 0 {
                        tracing::info!(
                            "Cycle processed {} requests ({} fallbacks, {} not confirmed), {} still queued",
                            summary.total(),
                            summary.fallbacks,
                            summary.failed,
                            self.queues.total_len()
                        );
                    }
                }
            }
        }
    }
}
