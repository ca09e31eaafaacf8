use std::path::Path;

use serde::de::DeserializeOwned;

use crate::environment::Environment;

/// Directory, relative to the working directory, holding the configuration files.
const CONFIGURATION_DIR: &str = "configuration";

/// File loaded for every environment before the environment-specific one.
const BASE_CONFIG_FILE: &str = "base.yaml";

/// Prefix of environment variables overriding configuration values.
const ENV_PREFIX: &str = "APP";

const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator for nested keys, e.g. `APP_SYNC__INTERVAL_SECS` sets `sync.interval_secs`.
const ENV_SEPARATOR: &str = "__";

/// Loads the configuration of the current environment from `./configuration`.
///
/// Sources are layered in this order, later ones overriding earlier ones:
/// 1. `configuration/base.yaml`
/// 2. `configuration/{environment}.yaml`
/// 3. environment variables prefixed with `APP_`
pub fn load_config<T>() -> Result<T, config::ConfigError>
where
    T: DeserializeOwned,
{
    let base_path = std::env::current_dir().map_err(|err| {
        config::ConfigError::Message(format!("failed to determine the current directory: {err}"))
    })?;
    let environment = Environment::load()
        .map_err(|err| config::ConfigError::Message(format!("invalid APP_ENVIRONMENT: {err}")))?;

    load_config_from(&base_path.join(CONFIGURATION_DIR), environment)
}

/// Loads the configuration for `environment` from the files in `configuration_dir`.
///
/// The environment-specific file is optional, the base file is not.
pub fn load_config_from<T>(
    configuration_dir: &Path,
    environment: Environment,
) -> Result<T, config::ConfigError>
where
    T: DeserializeOwned,
{
    let environment_source = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true);

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_dir.join(BASE_CONFIG_FILE)))
        .add_source(
            config::File::from(configuration_dir.join(environment.config_file_name()))
                .required(false),
        )
        .add_source(environment_source)
        .build()?;

    settings.try_deserialize::<T>()
}
