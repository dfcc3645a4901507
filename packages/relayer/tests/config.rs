use std::path::{Path, PathBuf};

use rng_relayer::{args::CliArgs, config::Config};
use utils::config::{CliEnvExt, ConfigBuilder, ConfigExt};

const FIELDS: [&str; 12] = [
    "HOME",
    "DOTENV",
    "LOG_LEVEL",
    "CHUNK_SIZE",
    "MAX_RETRIES",
    "SLEEP_INTERVAL_MS",
    "CREDENTIAL",
    "CONTRACT_ADDRESS",
    "WS_ENDPOINT",
    "HTTP_ENDPOINT",
    "GAS_PRICE",
    "GAS_LIMIT",
];

// every relayer env var is listed, so temp_env both isolates the test from the
// outer environment and restores anything a dotenv file sets
fn env(overrides: &[(&str, &str)]) -> Vec<(String, Option<String>)> {
    FIELDS
        .iter()
        .map(|field| {
            let value = overrides
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, value)| value.to_string());
            (format!("{}_{}", CliArgs::ENV_VAR_PREFIX, field), value)
        })
        .collect()
}

fn args(home: &Path) -> CliArgs {
    CliArgs {
        home: Some(home.to_path_buf()),
        ..Default::default()
    }
}

fn build(args: CliArgs) -> anyhow::Result<Config> {
    ConfigBuilder::<Config, CliArgs>::new(args).build()
}

fn write_config(dir: &Path, contents: &str) {
    std::fs::write(dir.join(Config::FILENAME), contents).unwrap();
}

// confirms the user overrides for the filepath, but not the complete list
// of fallbacks, which depends on the platform and global env vars
#[test]
fn config_filepath() {
    fn filepaths(home: Option<PathBuf>) -> Vec<PathBuf> {
        let cli_env_args = CliArgs {
            home,
            ..Default::default()
        }
        .merge_cli_env_args()
        .unwrap();

        ConfigBuilder::<Config, CliArgs>::filepaths_to_try(&cli_env_args)
    }

    temp_env::with_vars(env(&[]), || {
        assert_eq!(
            filepaths(Some("/tmp1".into())).first().unwrap(),
            &PathBuf::from("/tmp1").join(Config::FILENAME)
        );
    });

    // the cli arg beats the env var
    temp_env::with_vars(env(&[("HOME", "/tmp2")]), || {
        assert_eq!(
            filepaths(Some("/tmp1".into())).first().unwrap(),
            &PathBuf::from("/tmp1").join(Config::FILENAME)
        );
        assert_eq!(
            filepaths(None).first().unwrap(),
            &PathBuf::from("/tmp2").join(Config::FILENAME)
        );
    });
}

#[test]
fn config_default_without_file() {
    let home = tempfile::tempdir().unwrap();

    let config = temp_env::with_vars(env(&[]), || build(args(home.path()))).unwrap();
    let defaults = Config::default();

    assert_eq!(config.chunk_size, defaults.chunk_size);
    assert_eq!(config.max_retries, defaults.max_retries);
    assert_eq!(config.sleep_interval_ms, defaults.sleep_interval_ms);
    assert_eq!(config.gas_limit, defaults.gas_limit);
    assert_eq!(config.log_level, ["info"]);
    assert!(config.credential.is_none());
    assert!(config.gas_price.is_none());
}

#[test]
fn config_file_sections() {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        r#"
[default]
chunk_size = 4
max_retries = 2

[relayer]
max_retries = 7
sleep_interval_ms = 250
log_level = ["debug", "rng_relayer=trace"]
contract_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
ws_endpoint = "ws://localhost:8546"
gas_price = 1000000000
"#,
    );

    let config = temp_env::with_vars(env(&[]), || build(args(home.path()))).unwrap();

    assert_eq!(config.chunk_size, 4);
    // [relayer] beats [default]
    assert_eq!(config.max_retries, 7);
    assert_eq!(config.sleep_interval_ms, 250);
    assert_eq!(config.log_level, ["debug", "rng_relayer=trace"]);
    assert_eq!(config.gas_price(), Some(1_000_000_000));
    assert!(config.contract_address().is_ok());
    assert!(config.submission_endpoint().unwrap().is_websocket());
    config.tracing_env_filter().unwrap();
}

#[test]
fn config_precedence() {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        r#"
[relayer]
chunk_size = 4
max_retries = 7
sleep_interval_ms = 250
"#,
    );

    let config = temp_env::with_vars(
        env(&[("MAX_RETRIES", "8"), ("SLEEP_INTERVAL_MS", "500")]),
        || {
            build(CliArgs {
                sleep_interval_ms: Some(750),
                ..args(home.path())
            })
        },
    )
    .unwrap();

    // file only
    assert_eq!(config.chunk_size, 4);
    // env beats file
    assert_eq!(config.max_retries, 8);
    // cli beats env
    assert_eq!(config.sleep_interval_ms, 750);
}

#[test]
fn config_array_string() {
    let home = tempfile::tempdir().unwrap();

    let config = temp_env::with_vars(
        env(&[("LOG_LEVEL", "info, rng_relayer=debug, just_to_confirm_test=debug")]),
        || build(args(home.path())),
    )
    .unwrap();

    assert_eq!(
        config.log_level,
        ["info", "rng_relayer=debug", "just_to_confirm_test=debug"]
    );
}

#[test]
fn config_credential_from_env_is_redacted() {
    let home = tempfile::tempdir().unwrap();
    let key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    let config = temp_env::with_vars(env(&[("CREDENTIAL", key)]), || build(args(home.path())))
        .unwrap();

    assert_eq!(config.credential().unwrap().as_str(), key);
    assert!(!format!("{config:?}").contains(key));
}

#[test]
fn config_dotenv() {
    let home = tempfile::tempdir().unwrap();
    let dotenv = home.path().join("relayer.env");
    std::fs::write(
        &dotenv,
        "RNG_RELAYER_CHUNK_SIZE=9\nRNG_RELAYER_GAS_LIMIT=300000\n",
    )
    .unwrap();

    let config = temp_env::with_vars(env(&[]), || {
        build(CliArgs {
            dotenv: Some(dotenv.clone()),
            ..args(home.path())
        })
    })
    .unwrap();

    assert_eq!(config.chunk_size, 9);
    assert_eq!(config.gas_limit, 300_000);
}

#[test]
fn config_rejects_zero_values() {
    let home = tempfile::tempdir().unwrap();

    for field in ["CHUNK_SIZE", "MAX_RETRIES", "SLEEP_INTERVAL_MS"] {
        let result = temp_env::with_vars(env(&[(field, "0")]), || build(args(home.path())));
        assert!(result.is_err(), "{field} = 0 should be rejected");
    }

    write_config(home.path(), "[relayer]\nchunk_size = 0\n");
    let result = temp_env::with_vars(env(&[]), || build(args(home.path())));
    assert!(result.is_err());
}
