use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utils::{config::CliEnvExt, credential::Credential, serde::deserialize_vec_string};

/// This struct is used for both args and environment variables
/// the basic idea is that every env var can be overriden by a cli arg
/// and these override the config file
/// env vars follow the pattern of RNG_RELAYER_{UPPERCASE_ARG_NAME}
#[derive(Debug, Parser, Serialize, Deserialize, Default)]
#[command(version, about, long_about = None)]
#[serde(default)]
pub struct CliArgs {
    /// The home directory of the application, where the rng-relayer.toml configuration file is stored
    /// if not provided here or in an env var, a series of default directories will be tried
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<PathBuf>,

    /// The path to an optional dotenv file to try and load
    /// if not set, will be the current working directory's .env
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dotenv: Option<PathBuf>,

    /// Log level in the format of comma-separated tracing directives.
    #[arg(long, value_delimiter = ',')]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(deserialize_with = "deserialize_vec_string")]
    pub log_level: Vec<String>,

    /// Requests drained per category per cycle
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,

    /// Generation attempts per request before the fallback value is submitted
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Milliseconds between dispatch cycles
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_interval_ms: Option<u64>,

    /// Private key (0x-prefixed hex) or mnemonic used to sign submissions.
    /// Prefer the env var over the cli arg, which is visible to other users
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<Credential>,

    /// Address of the oracle contract
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,

    /// Websocket endpoint the contract's events are subscribed on
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_endpoint: Option<String>,

    /// Endpoint transactions are sent to, defaults to the websocket endpoint
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_endpoint: Option<String>,

    /// Gas price in wei, defaults to the chain's gas price at startup
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u64>,

    /// Gas limit for every submission
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
}

impl CliEnvExt for CliArgs {
    const ENV_VAR_PREFIX: &'static str = "RNG_RELAYER";
    const TOML_IDENTIFIER: &'static str = "relayer";

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn dotenv_path(&self) -> Option<PathBuf> {
        self.dotenv.clone()
    }
}
