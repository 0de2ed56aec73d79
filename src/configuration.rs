// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Configuration file handling.

use crate::errors::ServiceError;
use crate::model::{ConfigEntry, Snapshot};
use config::Config;
use log::{error, info, warn};
use serde_with::{DurationSeconds, serde_as};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default configuration file.
pub const DEF_CONFIG_FILE: &str = "configuration.yaml";

/// Prefix of environment variables overriding configuration values.
///
/// Nested keys are separated with `__`, e.g. `STEAM_COORDINATOR__SCAN_INTERVAL_SEC=60`.
pub const ENV_PREFIX: &str = "STEAM";

pub const DEF_SCAN_INTERVAL_SEC: u64 = 30;
const MIN_SCAN_INTERVAL_SEC: u64 = 10;

#[derive(Default, serde::Deserialize, serde::Serialize)]
pub struct Settings {
    pub coordinator: CoordinatorSettings,
    pub storage: StorageSettings,
}

/// Settings handed to the polling coordinator.
#[serde_as]
#[derive(Clone, Copy, serde::Deserialize, serde::Serialize)]
pub struct CoordinatorSettings {
    /// How often the account summaries are refreshed.
    #[serde_as(as = "DurationSeconds")]
    #[serde(rename = "scan_interval_sec")]
    pub scan_interval: Duration,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(DEF_SCAN_INTERVAL_SEC),
        }
    }
}

#[derive(Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct StorageSettings {
    /// JSON file with a config entry and an account snapshot.
    pub fixture: Option<String>,
}

/// Load the configuration settings.
///
/// The application provides default values which can be overriden in the following order:
/// 1. Configuration settings in the yaml or json configuration file specified in `filename`
/// 2. Environment variables with prefix `STEAM_`
pub fn get_configuration(filename: Option<&str>) -> Result<Settings, config::ConfigError> {
    load_configuration(filename, None)
}

/// Load the configuration with an optional replacement of the process environment.
fn load_configuration(
    filename: Option<&str>,
    env_source: Option<config::Map<String, String>>,
) -> Result<Settings, config::ConfigError> {
    // default configuration
    let mut config = Config::builder().add_source(Config::try_from(&Settings::default())?);
    // read optional configuration file to override defaults
    if let Some(filename) = filename {
        info!("Loading configuration file: {filename}");
        config = config.add_source(config::File::with_name(filename));
    }

    let config = config
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .source(env_source),
        )
        .build()?;

    let settings: Settings = config.try_deserialize()?;

    Ok(check_cfg_values(settings))
}

fn check_cfg_values(mut settings: Settings) -> Settings {
    if settings.coordinator.scan_interval.as_secs() < MIN_SCAN_INTERVAL_SEC {
        warn!(
            "Invalid scan interval {:?}, using default.",
            settings.coordinator.scan_interval
        );
        settings.coordinator = Default::default();
    }

    settings
}

/// Recorded integration data: a config entry with the snapshot of its tracked accounts.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct Fixture {
    pub entry: ConfigEntry,
    pub players: Snapshot,
    /// Game id to icon hash.
    #[serde(default)]
    pub game_icons: HashMap<String, String>,
}

/// Load a [`Fixture`] from a json file.
pub fn load_fixture(path: impl AsRef<Path>) -> Result<Fixture, ServiceError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|e| {
        let msg = format!("Error reading fixture {}: {e}", path.display());
        error!("{msg}");
        ServiceError::InvalidConfig(msg)
    })?;

    Ok(serde_json::from_str(&data)?)
}
