// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Host registries and state store used by the integration.
//!
//! The traits describe the read-only lookups the sensors and device conditions need from the
//! home automation host. [`LocalHass`] is a simple in-memory host used by the test tool and
//! unit tests.

use crate::consts::DOMAIN;
use crate::coordinator::SteamDataCoordinator;
use crate::errors::ServiceError;
use crate::model::ConfigEntry;
use crate::sensor::{SteamSensor, setup_sensors};
use crate::state::State;
use log::{debug, error, info};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub struct DeviceEntry {
    pub id: String,
    /// Owning config entry ids, the first one is the primary entry.
    pub config_entries: Vec<String>,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegistryEntry {
    pub entity_id: String,
    pub unique_id: String,
    pub device_id: Option<String>,
    pub platform: String,
}

pub trait DeviceRegistry {
    fn device(&self, device_id: &str) -> Option<&DeviceEntry>;
}

pub trait EntityRegistry {
    /// Registered entities of a device in registration order.
    fn entries_for_device(&self, device_id: &str) -> Vec<&RegistryEntry>;
}

pub trait ConfigEntries {
    fn entry(&self, entry_id: &str) -> Option<&ConfigEntry>;
}

pub trait StateStore {
    fn state(&self, entity_id: &str) -> Option<&State>;
}

#[derive(Default)]
pub struct LocalHass {
    devices: HashMap<String, DeviceEntry>,
    entities: Vec<RegistryEntry>,
    config_entries: HashMap<String, ConfigEntry>,
    states: HashMap<String, State>,
}

impl LocalHass {
    pub fn add_config_entry(&mut self, entry: ConfigEntry) {
        self.config_entries.insert(entry.entry_id.clone(), entry);
    }

    pub fn register_device(&mut self, device: DeviceEntry) {
        self.devices.insert(device.id.clone(), device);
    }

    /// Register an entity. An existing registration with the same unique id is replaced.
    pub fn register_entity(&mut self, entry: RegistryEntry) {
        match self
            .entities
            .iter_mut()
            .find(|e| e.unique_id == entry.unique_id)
        {
            Some(existing) => *existing = entry,
            None => self.entities.push(entry),
        }
    }

    /// Write a state and return the previous one.
    pub fn set_state(&mut self, state: State) -> Option<State> {
        self.states.insert(state.entity_id.clone(), state)
    }

    pub fn remove_state(&mut self, entity_id: &str) -> Option<State> {
        self.states.remove(entity_id)
    }

    /// Set up a config entry: store it, register its device and create the sensor entities.
    ///
    /// returns: device id and the created sensors
    pub fn setup_entry(&mut self, entry: ConfigEntry) -> (String, Vec<SteamSensor>) {
        let device_id = format!("{DOMAIN}_{}", entry.entry_id);
        let sensors = setup_sensors(&entry);

        self.register_device(DeviceEntry {
            id: device_id.clone(),
            config_entries: vec![entry.entry_id.clone()],
            name: entry.options.accounts.get(entry.primary_account()).cloned(),
        });
        for sensor in &sensors {
            self.register_entity(RegistryEntry {
                entity_id: sensor.entity_id.clone(),
                unique_id: sensor.unique_id.clone(),
                device_id: Some(device_id.clone()),
                platform: DOMAIN.into(),
            });
        }
        info!(
            "[{}] Set up device {device_id} with {} sensors",
            entry.entry_id,
            sensors.len()
        );
        self.add_config_entry(entry);

        (device_id, sensors)
    }

    /// Write the projected states of all sensors of a config entry.
    ///
    /// A sensor failing its projection is logged and skipped, its previous state is kept.
    ///
    /// returns: number of updated states
    pub fn refresh(
        &mut self,
        entry_id: &str,
        sensors: &[SteamSensor],
        coordinator: &mut SteamDataCoordinator,
    ) -> Result<usize, ServiceError> {
        let entry = self
            .config_entries
            .get(entry_id)
            .cloned()
            .ok_or_else(|| ServiceError::ConfigEntryNotFound(entry_id.into()))?;

        let mut updated = 0;
        for sensor in sensors {
            match sensor.state(coordinator, &entry) {
                Ok(state) => {
                    debug!("[{}] {}", state.entity_id, state.state);
                    self.set_state(state);
                    updated += 1;
                }
                Err(e) => error!("[{}] Error updating state: {e}", sensor.entity_id),
            }
        }

        Ok(updated)
    }
}

impl DeviceRegistry for LocalHass {
    fn device(&self, device_id: &str) -> Option<&DeviceEntry> {
        self.devices.get(device_id)
    }
}

impl EntityRegistry for LocalHass {
    fn entries_for_device(&self, device_id: &str) -> Vec<&RegistryEntry> {
        self.entities
            .iter()
            .filter(|e| e.device_id.as_deref() == Some(device_id))
            .collect()
    }
}

impl ConfigEntries for LocalHass {
    fn entry(&self, entry_id: &str) -> Option<&ConfigEntry> {
        self.config_entries.get(entry_id)
    }
}

impl StateStore for LocalHass {
    fn state(&self, entity_id: &str) -> Option<&State> {
        self.states.get(entity_id)
    }
}
