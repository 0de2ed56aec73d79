// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Custom application error with conversions from common Rust and 3rd-party errors.

use derive_more::Display;
use log::error;

#[derive(Debug, Display, PartialEq)]
pub enum ServiceError {
    #[display("Device not found: {_0}")]
    DeviceNotFound(String),

    #[display("Config entry not found for device: {_0}")]
    ConfigEntryNotFound(String),

    #[display("No entity of device {device_id} matches primary account {account}")]
    PrimaryEntityNotFound { device_id: String, account: String },

    #[display("Unknown persona state: {_0}")]
    UnknownState(i64),

    #[display("No trigger")]
    MissingTrigger,

    #[display("Invalid configuration: {_0}")]
    InvalidConfig(String),

    #[display("Internal serialization error")]
    SerializationError(String),
}

impl std::error::Error for ServiceError {}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        error!("{:?}", e);
        ServiceError::SerializationError(e.to_string())
    }
}

impl From<config::ConfigError> for ServiceError {
    fn from(e: config::ConfigError) -> Self {
        ServiceError::InvalidConfig(e.to_string())
    }
}
