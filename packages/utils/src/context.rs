use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::runtime::{Handle, Runtime};
use tracing::instrument;

/// Shared handle to the async runtime and the process-wide kill switch
#[derive(Clone)]
pub struct AppContext {
    pub rt: AnyRuntime,
    killed: Arc<AtomicBool>,
    kill_sender: tokio::sync::broadcast::Sender<()>,
    // keeps the channel open so `kill` never fails for lack of receivers
    _kill_receiver: Arc<tokio::sync::broadcast::Receiver<()>>,
}

#[derive(Clone)]
pub enum AnyRuntime {
    Tokio(Arc<Runtime>),
    TokioHandle(Handle),
}

impl AnyRuntime {
    pub fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        match self {
            AnyRuntime::Tokio(rt) => rt.block_on(fut),
            AnyRuntime::TokioHandle(handle) => handle.block_on(fut),
        }
    }

    pub fn spawn<F>(&self, fut: F) -> tokio::task::JoinHandle<F::Output>
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match self {
            AnyRuntime::Tokio(rt) => rt.spawn(fut),
            AnyRuntime::TokioHandle(handle) => handle.spawn(fut),
        }
    }
}

impl AppContext {
    /// Owns a fresh multi-threaded runtime. Use from `main` or sync tests.
    pub fn new() -> std::io::Result<Self> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        Ok(Self::new_with_runtime(AnyRuntime::Tokio(Arc::new(rt))))
    }

    /// Borrows the runtime we're already running on, e.g. inside `#[tokio::test]`
    pub fn from_current() -> Self {
        Self::new_with_runtime(AnyRuntime::TokioHandle(Handle::current()))
    }

    pub fn new_with_runtime(rt: AnyRuntime) -> Self {
        let (kill_sender, kill_receiver) = tokio::sync::broadcast::channel(1);

        Self {
            rt,
            kill_sender,
            _kill_receiver: Arc::new(kill_receiver),
            killed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribers are only notified of kills that happen after subscribing,
    /// so long-running loops should also check `killed()` before waiting
    #[instrument(skip(self), fields(subsys = "AppContext"))]
    pub fn get_kill_receiver(&self) -> tokio::sync::broadcast::Receiver<()> {
        self.kill_sender.subscribe()
    }

    /// Signals every running task to stop. Typically only called from main or tests.
    #[instrument(skip(self), fields(subsys = "AppContext"))]
    pub fn kill(&self) {
        self.killed.store(true, Ordering::SeqCst);
        let _ = self.kill_sender.send(());
    }

    pub fn killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}
