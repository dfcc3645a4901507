use clap::Parser;
use rng_relayer::{args::CliArgs, config::Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utils::{
    config::{ConfigBuilder, ConfigExt},
    context::AppContext,
};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config: Config = ConfigBuilder::new(args).build()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_target(false),
        )
        .with(config.tracing_env_filter()?)
        .try_init()?;

    let ctx = AppContext::new()?;

    rng_relayer::run_relayer(ctx, config)
}
