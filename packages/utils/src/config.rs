use anyhow::{bail, Context, Result};
use figment::{providers::Format, Figment};
use serde::{de::DeserializeOwned, Serialize};
use std::{marker::PhantomData, path::PathBuf};

/// The builder we use to build a binary's Config
///
/// Sources are layered in order of preference:
///
/// 1. cli args
/// 2. environment variables (prefixed with `ARG::ENV_VAR_PREFIX`)
/// 3. the `[ARG::TOML_IDENTIFIER]` section of the config file
/// 4. the `[default]` section of the config file
/// 5. `CONFIG::default()`
#[derive(Debug)]
pub struct ConfigBuilder<CONFIG, ARG> {
    pub cli_env_args: ARG,
    _config: PhantomData<CONFIG>,
}

pub trait CliEnvExt: Serialize + DeserializeOwned + Default + std::fmt::Debug {
    // e.g. "RNG_RELAYER"
    const ENV_VAR_PREFIX: &'static str;

    // The section identifier in the TOML file, e.g. "relayer"
    const TOML_IDENTIFIER: &'static str;

    // an optional argument to specify the home directory
    // if not supplied, config will try a series of fallbacks
    fn home_dir(&self) -> Option<PathBuf>;

    // an optional argument to specify a dotenv file
    fn dotenv_path(&self) -> Option<PathBuf>;

    /// Env vars fill in whatever was not passed on the command line
    fn merge_cli_env_args(&self) -> Result<Self> {
        let env_prefix = format!("{}_", Self::ENV_VAR_PREFIX);

        let merged = Figment::new()
            .merge(figment::providers::Env::prefixed(&env_prefix))
            .merge(figment::providers::Serialized::defaults(self))
            .extract()?;

        Ok(merged)
    }

    fn env_var(name: &str) -> Option<String> {
        std::env::var(format!("{}_{name}", Self::ENV_VAR_PREFIX)).ok()
    }
}

pub trait ConfigExt: Serialize + DeserializeOwned + Default + std::fmt::Debug {
    // e.g. "rng-relayer.toml"
    const FILENAME: &'static str;

    // the directory name used in the fallback search, e.g. "rng-relayer"
    const DIRNAME: &'static str;

    fn log_levels(&self) -> impl Iterator<Item = &str>;

    /// Called once all sources are merged, a failure aborts the build
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn tracing_env_filter(&self) -> Result<tracing_subscriber::EnvFilter> {
        let mut filter = tracing_subscriber::EnvFilter::from_default_env();
        for directive in self.log_levels() {
            match directive.parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(err) => bail!("{}: {}", err, directive),
            }
        }

        Ok(filter)
    }
}

impl<CONFIG: ConfigExt, ARG: CliEnvExt> ConfigBuilder<CONFIG, ARG> {
    pub fn new(cli_env_args: ARG) -> Self {
        Self {
            cli_env_args,
            _config: PhantomData,
        }
    }

    pub fn build(self) -> Result<CONFIG> {
        // dotenv goes first, since it may affect the env vars for everything else
        let mut dotenv_paths = Vec::new();

        if let Some(dotenv_path) = self.cli_env_args.dotenv_path() {
            dotenv_paths.push(dotenv_path);
        }

        if let Some(dotenv_path) = ARG::env_var("DOTENV") {
            dotenv_paths.push(PathBuf::from(dotenv_path));
        }

        dotenv_paths.push(std::env::current_dir()?.join(".env"));

        for dotenv_path in dotenv_paths {
            if dotenv_path.exists() {
                if let Err(e) = dotenvy::from_path(&dotenv_path) {
                    bail!("Error loading dotenv file {}: {}", dotenv_path.display(), e);
                }
            }
        }

        let cli_env_args = self.cli_env_args.merge_cli_env_args()?;

        let mut figment =
            Figment::new().merge(figment::providers::Serialized::defaults(CONFIG::default()));

        // the file is optional, everything can be supplied via env
        if let Some(filepath) = Self::filepath(&cli_env_args) {
            tracing::debug!("Loading config from {}", filepath.display());
            figment = figment.merge(figment::providers::Toml::file(&filepath).nested());
        }

        // cli/env args live in the global profile so they override every file section
        let config: CONFIG = figment
            .merge(figment::providers::Serialized::globals(cli_env_args))
            .select(ARG::TOML_IDENTIFIER)
            .extract()
            .context("Error extracting config")?;

        config.validate()?;

        Ok(config)
    }

    /// The first existing config file, if any
    pub fn filepath(cli_env_args: &ARG) -> Option<PathBuf> {
        ConfigFilePath::new(CONFIG::FILENAME, CONFIG::DIRNAME, cli_env_args.home_dir())
            .into_path()
    }

    pub fn filepaths_to_try(cli_env_args: &ARG) -> Vec<PathBuf> {
        ConfigFilePath::new(CONFIG::FILENAME, CONFIG::DIRNAME, cli_env_args.home_dir())
            .into_possible()
    }
}

// a helper to try a series of fallback paths, looking for a config file
#[derive(Clone, Debug)]
pub struct ConfigFilePath {
    // the filename to look for in each directory, e.g. "rng-relayer.toml"
    pub filename: String,
    // the directory name to look for under the system dirs, e.g. "rng-relayer"
    pub dirname: String,
    // the optional directory set via direct args or env
    pub arg_env_dir: Option<PathBuf>,
}

impl ConfigFilePath {
    pub fn new(filename: impl ToString, dirname: impl ToString, arg_env_dir: Option<PathBuf>) -> Self {
        Self {
            filename: filename.to_string(),
            dirname: dirname.to_string(),
            arg_env_dir,
        }
    }

    pub fn into_path(self) -> Option<PathBuf> {
        self.into_possible().into_iter().find(|path| path.exists())
    }

    // the paths returned will be tried in order
    pub fn into_possible(self) -> Vec<PathBuf> {
        let Self {
            filename,
            dirname,
            arg_env_dir,
        } = self;

        let mut dirs = Vec::new();

        // explicit, e.g. --home /foo or RNG_RELAYER_HOME="/foo"
        // i.e. the path in this case will be /foo/{filename}
        if let Some(dir) = arg_env_dir {
            dirs.push(dir);
        }

        // wherever the command is run from
        if let Ok(dir) = std::env::current_dir() {
            dirs.push(dir);
        }

        // ~/.{dirname}/{filename}
        if let Some(dir) = dirs::home_dir().map(|dir| dir.join(format!(".{dirname}"))) {
            dirs.push(dir);
        }

        // Linux: ~/.config/{dirname}
        // macOS: ~/Library/Application Support/{dirname}
        if let Some(dir) = dirs::config_dir().map(|dir| dir.join(&dirname)) {
            dirs.push(dir);
        }

        if let Some(dir) = std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .map(|dir| dir.join(&dirname))
        {
            dirs.push(dir);
        }

        if let Some(dir) = dirs::home_dir().map(|dir| dir.join(".config").join(&dirname)) {
            dirs.push(dir);
        }

        dirs.push(PathBuf::from("/etc").join(&dirname));

        let mut all_files: Vec<PathBuf> = dirs
            .into_iter()
            .map(|dir| {
                shellexpand::tilde(&dir.join(&filename).to_string_lossy())
                    .to_string()
                    .into()
            })
            .collect();

        all_files.dedup();

        all_files
    }
}
