use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::instrument;
use utils::context::AppContext;

use crate::{
    config::Config,
    dispatcher::DispatchScheduler,
    network::NetworkSnapshot,
    subsystems::{
        engine::{generator::ValueGenerator, RequestExecutor},
        queue::{Category, RequestQueues},
        submission::ChainClient,
        trigger::{EventSource, IngestionRouter},
    },
};

/// Everything the ingestion and dispatch sides share, built once at startup
pub struct RelayerState {
    pub queues: Arc<RequestQueues>,
    pub network: NetworkSnapshot,
}

impl RelayerState {
    pub fn new(network: NetworkSnapshot) -> Self {
        Self {
            queues: Arc::new(RequestQueues::new()),
            network,
        }
    }
}

/// Wires an event source to the queues, and the queues to the chain
pub struct Relayer {
    state: RelayerState,
    router: IngestionRouter,
    scheduler: DispatchScheduler,
}

impl Relayer {
    pub fn new(
        config: &Config,
        state: RelayerState,
        generator: Arc<dyn ValueGenerator>,
        chain: Arc<dyn ChainClient>,
    ) -> Self {
        let executor = RequestExecutor::new(generator, chain, config.max_retries);

        Self {
            router: IngestionRouter::new(state.queues.clone()),
            scheduler: DispatchScheduler::new(
                state.queues.clone(),
                executor,
                config.chunk_size,
                config.sleep_interval(),
            ),
            state,
        }
    }

    pub fn state(&self) -> &RelayerState {
        &self.state
    }

    pub fn router(&self) -> &IngestionRouter {
        &self.router
    }

    pub fn scheduler(&self) -> &DispatchScheduler {
        &self.scheduler
    }

    /// Runs until the context is killed.
    ///
    /// If the event source can't start, the relayer keeps running without
    /// new requests rather than exiting.
    #[instrument(skip(self, ctx, source), fields(subsys = "Relayer"))]
    pub async fn run(&self, ctx: AppContext, source: Arc<dyn EventSource>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        if let Err(e) = source.start(ctx.clone(), event_tx).await {
            tracing::error!("Event source failed to start, no new requests will be received: {}", e);
        }

        let router_handle = ctx.rt.spawn({
            let router = self.router.clone();
            let ctx = ctx.clone();
            async move { router.run(ctx, event_rx).await }
        });

        self.scheduler.run(ctx).await;

        if let Err(e) = router_handle.await {
            tracing::error!("Ingestion router task failed: {}", e);
        }

        self.log_dropped();
    }

    /// Queues are in-memory only, whatever is left is lost on shutdown
    fn log_dropped(&self) {
        for category in Category::DISPATCH_ORDER {
            let dropped = self.state.queues.drain(category, usize::MAX);
            for request in &dropped {
                tracing::warn!(
                    "Dropping unprocessed {} request {} from {}",
                    category,
                    request.request_id,
                    request.caller
                );
            }
        }
    }
}
