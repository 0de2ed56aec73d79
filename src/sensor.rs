// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Sensor platform for Steam account status.
//!
//! Every tracked account gets one sensor per [`SteamSensorEntityDescription`]. A description
//! carries the functions to project an [`AccountStatus`] record into the sensor value, its
//! availability and extra state attributes.

use crate::consts::{
    ATTR_GAME_ID, DOMAIN, STEAM_API_URL, STEAM_HEADER_IMAGE_FILE, STEAM_ICON_URL,
    STEAM_MAIN_IMAGE_FILE,
};
use crate::coordinator::SteamDataCoordinator;
use crate::errors::ServiceError;
use crate::model::{AccountStatus, ConfigEntry, PersonaState};
use crate::state::State;
use chrono::{DateTime, SecondsFormat};
use derive_builder::Builder;
use derive_more::Display;
use lazy_static::lazy_static;
use log::debug;
use serde_json::{Map, Value};

pub type ValueFn = fn(&AccountStatus) -> Result<StateType, ServiceError>;
pub type AvailabilityFn = fn(&AccountStatus) -> bool;
pub type AttributesFn = fn(&AccountStatus) -> Option<Map<String, Value>>;

/// Native sensor value.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum StateType {
    #[display("{_0}")]
    Text(&'static str),
    #[display("{_0}")]
    Int(i64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display, strum_macros::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SensorKey {
    PlayerStatus,
    PlayerStatusInt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display, strum_macros::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum EntityCategory {
    Diagnostic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display, strum_macros::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SensorStateClass {
    Measurement,
}

/// Static description of a Steam account sensor.
#[derive(Builder, Clone)]
#[builder(pattern = "owned")]
pub struct SteamSensorEntityDescription {
    pub key: SensorKey,
    #[builder(default, setter(strip_option))]
    pub entity_category: Option<EntityCategory>,
    #[builder(default, setter(strip_option))]
    pub state_class: Option<SensorStateClass>,
    #[builder(default, setter(strip_option))]
    pub unit_of_measurement: Option<&'static str>,
    pub value_fn: ValueFn,
    #[builder(default = "no_attributes")]
    pub attr_fn: AttributesFn,
    #[builder(default = "always_available")]
    pub avabl_fn: AvailabilityFn,
}

impl SteamSensorEntityDescription {
    pub fn value(&self, record: &AccountStatus) -> Result<StateType, ServiceError> {
        (self.value_fn)(record)
    }

    pub fn is_available(&self, record: &AccountStatus) -> bool {
        (self.avabl_fn)(record)
    }

    pub fn attributes(&self, record: &AccountStatus) -> Option<Map<String, Value>> {
        (self.attr_fn)(record)
    }
}

lazy_static! {
    pub static ref SENSOR_DESCRIPTIONS: Vec<SteamSensorEntityDescription> = vec![
        SteamSensorEntityDescriptionBuilder::default()
            .key(SensorKey::PlayerStatus)
            .entity_category(EntityCategory::Diagnostic)
            .value_fn(player_status_value)
            .attr_fn(player_attributes)
            .build()
            .expect("valid player_status description"),
        SteamSensorEntityDescriptionBuilder::default()
            .key(SensorKey::PlayerStatusInt)
            .entity_category(EntityCategory::Diagnostic)
            .state_class(SensorStateClass::Measurement)
            .unit_of_measurement("Status")
            .value_fn(player_status_int_value)
            .attr_fn(player_attributes)
            .build()
            .expect("valid player_status_int description"),
    ];
}

fn player_status_value(record: &AccountStatus) -> Result<StateType, ServiceError> {
    let state = PersonaState::from_raw(record.personastate)?;
    Ok(StateType::Text(state.label()))
}

fn player_status_int_value(record: &AccountStatus) -> Result<StateType, ServiceError> {
    Ok(StateType::Int(record.personastate))
}

fn always_available(_record: &AccountStatus) -> bool {
    true
}

fn no_attributes(_record: &AccountStatus) -> Option<Map<String, Value>> {
    None
}

fn player_attributes(record: &AccountStatus) -> Option<Map<String, Value>> {
    let mut attrs = Map::with_capacity(6);

    if let Some(game) = record.gameextrainfo.as_ref() {
        attrs.insert("game".into(), game.as_str().into());
    }
    if let Some(game_id) = record.game_id() {
        attrs.insert(ATTR_GAME_ID.into(), game_id.into());
        let game_url = format!("{STEAM_API_URL}{game_id}/");
        attrs.insert(
            "game_image_header".into(),
            format!("{game_url}{STEAM_HEADER_IMAGE_FILE}").into(),
        );
        attrs.insert(
            "game_image_main".into(),
            format!("{game_url}{STEAM_MAIN_IMAGE_FILE}").into(),
        );
    }
    if let Some(last_online) = record
        .lastlogoff
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
    {
        attrs.insert(
            "last_online".into(),
            last_online.to_rfc3339_opts(SecondsFormat::Secs, true).into(),
        );
    }
    if let Some(level) = record.level.filter(|v| *v > 0) {
        attrs.insert("level".into(), level.into());
    }

    (!attrs.is_empty()).then_some(attrs)
}

/// Sensor entity of one account for one description.
pub struct SteamSensor {
    pub entity_description: &'static SteamSensorEntityDescription,
    pub account_id: String,
    /// Stable registry identifier, always ends with the account id.
    pub unique_id: String,
    /// State store key.
    pub entity_id: String,
}

impl SteamSensor {
    pub fn new(
        entity_description: &'static SteamSensorEntityDescription,
        account: impl Into<String>,
    ) -> Self {
        let account_id = account.into();
        let key = entity_description.key;
        Self {
            unique_id: format!("{DOMAIN}_{key}_{account_id}"),
            entity_id: format!("sensor.steam_{account_id}_{key}"),
            entity_description,
            account_id,
        }
    }

    /// Sensor is available if the last refresh succeeded and the snapshot contains the account.
    pub fn available(&self, coordinator: &SteamDataCoordinator) -> bool {
        coordinator.last_update_success()
            && coordinator
                .account(&self.account_id)
                .is_some_and(|record| self.entity_description.is_available(record))
    }

    /// Sensor value, `None` if the account is missing from the snapshot.
    pub fn native_value(
        &self,
        coordinator: &SteamDataCoordinator,
    ) -> Result<Option<StateType>, ServiceError> {
        coordinator
            .account(&self.account_id)
            .map(|record| self.entity_description.value(record))
            .transpose()
    }

    /// Description attributes enriched with the game icon and friend flag.
    pub fn extra_state_attributes(
        &self,
        coordinator: &mut SteamDataCoordinator,
        entry: &ConfigEntry,
    ) -> Option<Map<String, Value>> {
        let (mut attrs, game_id) = {
            let record = coordinator.account(&self.account_id)?;
            (
                self.entity_description
                    .attributes(record)
                    .unwrap_or_default(),
                record.game_id().map(String::from),
            )
        };

        if let Some(game_id) = game_id
            && let Some(icon) = coordinator.game_icons.lookup(&game_id)
        {
            attrs.insert(
                "game_icon".into(),
                format!("{STEAM_ICON_URL}{game_id}/{icon}.jpg").into(),
            );
        }
        attrs.insert(
            "is_friend".into(),
            (entry.unique_id.as_deref() != Some(self.account_id.as_str())).into(),
        );

        Some(attrs)
    }

    /// Persona name of the account.
    pub fn name(&self, coordinator: &SteamDataCoordinator) -> Option<String> {
        coordinator
            .account(&self.account_id)
            .and_then(|r| r.personaname.clone())
            .filter(|v| !v.is_empty())
    }

    pub fn entity_picture(&self, coordinator: &SteamDataCoordinator) -> Option<String> {
        coordinator
            .account(&self.account_id)
            .and_then(|r| r.avatarmedium.as_ref())
            .map(|url| url.to_string())
    }

    /// Project the current snapshot into the host state of this sensor.
    pub fn state(
        &self,
        coordinator: &mut SteamDataCoordinator,
        entry: &ConfigEntry,
    ) -> Result<State, ServiceError> {
        if !self.available(coordinator) {
            debug!("[{}] unavailable", self.entity_id);
            return Ok(State::unavailable(&self.entity_id));
        }

        let value = self.native_value(coordinator)?;
        let mut state = State::new(
            &self.entity_id,
            value.map(|v| v.to_string()).unwrap_or_else(|| "unknown".into()),
        );
        if let Some(attrs) = self.extra_state_attributes(coordinator, entry) {
            state.attributes = attrs;
        }

        let attrs = &mut state.attributes;
        if let Some(name) = self.name(coordinator) {
            attrs.insert("friendly_name".into(), name.into());
        }
        if let Some(picture) = self.entity_picture(coordinator) {
            attrs.insert("entity_picture".into(), picture.into());
        }
        if let Some(unit) = self.entity_description.unit_of_measurement {
            attrs.insert("unit_of_measurement".into(), unit.into());
        }
        if let Some(state_class) = self.entity_description.state_class {
            attrs.insert("state_class".into(), state_class.as_ref().into());
        }

        Ok(state)
    }
}

/// Create the sensors of a config entry: one per description and tracked account.
pub fn setup_sensors(entry: &ConfigEntry) -> Vec<SteamSensor> {
    let sensors: Vec<SteamSensor> = SENSOR_DESCRIPTIONS
        .iter()
        .flat_map(|description| {
            entry
                .accounts()
                .map(move |account| SteamSensor::new(description, account))
        })
        .collect();
    debug!("[{}] Created {} sensors", entry.entry_id, sensors.len());
    sensors
}
