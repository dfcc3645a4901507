#![allow(clippy::uninlined_format_args)]

pub mod args;
pub mod config;
pub mod contract;
pub mod dispatcher;
pub mod network;
pub mod relayer;
pub mod subsystems;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::sync::Arc;

use anyhow::Result;
use config::Config;
use network::NetworkSnapshot;
use relayer::{Relayer, RelayerState};
use subsystems::{
    engine::generator::DigitStringGenerator, submission::evm::EvmChainClient,
    trigger::streams::evm_stream::EvmEventSource,
};
use utils::context::AppContext;

/// Entry point to start up the whole relayer
/// Blocks until ctrl-c or until the context is killed
pub fn run_relayer(ctx: AppContext, config: Config) -> Result<()> {
    let _ = ctrlc::set_handler({
        let ctx = ctx.clone();
        move || {
            ctx.kill();
        }
    });

    ctx.rt.clone().block_on(start_relayer(ctx, config))
}

/// Takes the network snapshot and runs the relayer until killed.
///
/// Missing or invalid settings are errors. An unreachable node is only
/// logged: the snapshot is degraded, the event source stays down and
/// submissions fail until the chain client manages to connect.
pub async fn start_relayer(ctx: AppContext, config: Config) -> Result<()> {
    let contract_address = config.contract_address()?;
    let event_endpoint = config.event_endpoint()?;
    let chain = EvmChainClient::new(
        config.submission_endpoint()?,
        config.credential()?.clone(),
        contract_address,
        config.gas_limit,
    )?;

    tracing::info!(
        "Relaying for {} from {} via {}",
        contract_address,
        chain.address(),
        chain.endpoint()
    );

    let network = match chain.connect().await {
        Ok(client) => match NetworkSnapshot::query(&client, config.gas_price()).await {
            Ok(network) => network,
            Err(e) => {
                tracing::error!("Unable to query network, continuing without a snapshot: {}", e);
                NetworkSnapshot::degraded(config.gas_price())
            }
        },
        Err(e) => {
            tracing::error!("Unable to connect to {}, continuing without a snapshot: {}", chain.endpoint(), e);
            NetworkSnapshot::degraded(config.gas_price())
        }
    };
    network.log();

    let state = RelayerState::new(network);
    let chain = chain.with_gas_price(state.network.gas_price);

    let relayer = Relayer::new(
        &config,
        state,
        Arc::new(DigitStringGenerator),
        Arc::new(chain),
    );

    relayer
        .run(ctx, Arc::new(EvmEventSource::new(event_endpoint, contract_address)))
        .await;

    Ok(())
}
