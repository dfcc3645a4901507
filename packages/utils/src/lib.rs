#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod context;
pub mod credential;
pub mod error;
pub mod evm_client;
pub mod serde;

// the test version of init_tracing does not take a config
// since config itself is tested and modified from different parallel tests
// therefore, this only uses the default tracing settings
pub fn init_tracing_tests() {
    use std::sync::Once;

    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // try_init, since another harness in the same process may have beaten us to it
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        tracing::debug!("Tracing initialized for tests");
    });
}
