// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Device conditions for Steam account devices.
//!
//! The only condition type checks if the account of a state change trigger is playing the same
//! game as the primary account of the config entry.

use crate::consts::DOMAIN;
use crate::errors::ServiceError;
use crate::registry::{ConfigEntries, DeviceRegistry, EntityRegistry, StateStore};
use crate::state::{State, TriggerVariables};
use log::debug;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::IntoEnumIterator;

const CONDITION_DEVICE: &str = "device";

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum ConditionType {
    IsSameGameAsPrimary,
}

/// Validated device condition configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceConditionConfig {
    pub condition: String,
    pub device_id: String,
    pub domain: String,
    #[serde(rename = "type")]
    pub condition_type: String,
}

/// List the device conditions of a Steam device.
pub fn get_conditions(device_id: &str) -> Vec<DeviceConditionConfig> {
    ConditionType::iter()
        .map(|cond| DeviceConditionConfig {
            condition: CONDITION_DEVICE.into(),
            device_id: device_id.into(),
            domain: DOMAIN.into(),
            condition_type: cond.to_string(),
        })
        .collect()
}

/// Validate a raw device condition configuration.
pub fn validate_condition_config(
    config: serde_json::Value,
) -> Result<DeviceConditionConfig, ServiceError> {
    let config: DeviceConditionConfig = serde_json::from_value(config)
        .map_err(|e| ServiceError::InvalidConfig(format!("Invalid device condition: {e}")))?;

    if config.condition != CONDITION_DEVICE {
        return Err(ServiceError::InvalidConfig(format!(
            "Invalid condition: {}",
            config.condition
        )));
    }
    if config.domain != DOMAIN {
        return Err(ServiceError::InvalidConfig(format!(
            "Invalid domain: {}",
            config.domain
        )));
    }
    if config.device_id.is_empty() {
        return Err(ServiceError::InvalidConfig("Missing device_id".into()));
    }
    if ConditionType::from_str(&config.condition_type).is_err() {
        return Err(ServiceError::InvalidConfig(format!(
            "Invalid condition type: {}",
            config.condition_type
        )));
    }

    Ok(config)
}

/// Condition predicate created from a device condition configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum ConditionChecker {
    /// Trigger state has the same game as the current state of the primary entity.
    SameGameAsPrimary { primary_entity_id: String },
    /// Unmatched condition types never pass.
    Never,
}

impl ConditionChecker {
    /// Test the condition for a trigger.
    ///
    /// A missing game id on either side never matches.
    ///
    /// # Arguments
    ///
    /// * `states`: host state store to read the primary entity state from
    /// * `variables`: trigger variables of the automation run
    ///
    /// returns: `ServiceError::MissingTrigger` if the variables don't contain a trigger
    pub fn check(
        &self,
        states: &impl StateStore,
        variables: Option<&TriggerVariables>,
    ) -> Result<bool, ServiceError> {
        let primary_entity_id = match self {
            ConditionChecker::Never => return Ok(false),
            ConditionChecker::SameGameAsPrimary { primary_entity_id } => primary_entity_id,
        };

        let trigger = variables
            .and_then(|v| v.trigger.as_ref())
            .ok_or(ServiceError::MissingTrigger)?;

        let to_game = trigger.to_state.as_ref().and_then(State::game_id);
        let primary_game = states.state(primary_entity_id).and_then(State::game_id);
        debug!("[{primary_entity_id}] primary game: {primary_game:?}, trigger game: {to_game:?}");

        Ok(primary_game.is_some() && primary_game == to_game)
    }
}

/// Create the condition checker for a validated configuration.
///
/// The primary entity is resolved once: the first registered entity of the device whose unique
/// id ends with `_` followed by the primary account id of the device's config entry.
pub fn condition_from_config<H>(
    hass: &H,
    config: &DeviceConditionConfig,
) -> Result<ConditionChecker, ServiceError>
where
    H: DeviceRegistry + EntityRegistry + ConfigEntries,
{
    let device_id = config.device_id.as_str();
    let device = hass
        .device(device_id)
        .ok_or_else(|| ServiceError::DeviceNotFound(device_id.into()))?;

    let config_entry = device
        .config_entries
        .first()
        .and_then(|entry_id| hass.entry(entry_id))
        .ok_or_else(|| ServiceError::ConfigEntryNotFound(device_id.into()))?;

    let primary_account_id = config_entry.primary_account();
    let account_suffix = format!("_{primary_account_id}");
    let primary_entity_id = hass
        .entries_for_device(device_id)
        .into_iter()
        .find(|entity| entity.unique_id.ends_with(&account_suffix))
        .map(|entity| entity.entity_id.clone())
        .ok_or_else(|| ServiceError::PrimaryEntityNotFound {
            device_id: device_id.into(),
            account: primary_account_id.into(),
        })?;

    debug!(
        "[{}] {} condition with primary entity {primary_entity_id}",
        config_entry.entry_id, config.condition_type
    );

    Ok(match ConditionType::from_str(&config.condition_type) {
        Ok(ConditionType::IsSameGameAsPrimary) => {
            ConditionChecker::SameGameAsPrimary { primary_entity_id }
        }
        Err(_) => ConditionChecker::Never,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::CONDITION_PRIMARY_GAME;
    use crate::coordinator::SteamDataCoordinator;
    use crate::model::{AccountStatus, ConfigEntry, ConfigEntryData, ConfigEntryOptions, Snapshot};
    use crate::registry::{DeviceEntry, LocalHass};
    use rstest::rstest;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::time::Duration;

    const PRIMARY_ENTITY: &str = "sensor.steam_A_player_status";

    fn entry(primary: &str) -> ConfigEntry {
        ConfigEntry {
            entry_id: "e1".into(),
            unique_id: Some(primary.into()),
            data: ConfigEntryData {
                account: primary.into(),
                api_key: "key".into(),
            },
            options: ConfigEntryOptions {
                accounts: BTreeMap::from([
                    ("A".to_string(), "Alice".to_string()),
                    ("B".to_string(), "Bob".to_string()),
                ]),
            },
        }
    }

    fn player(id: &str, game: Option<&str>) -> (String, AccountStatus) {
        (
            id.to_string(),
            AccountStatus {
                steamid: id.into(),
                personastate: 1,
                gameid: game.map(String::from),
                ..Default::default()
            },
        )
    }

    fn config(device_id: &str, condition_type: &str) -> DeviceConditionConfig {
        DeviceConditionConfig {
            condition: "device".into(),
            device_id: device_id.into(),
            domain: DOMAIN.into(),
            condition_type: condition_type.into(),
        }
    }

    /// Set up an entry with primary account `A` and refresh the states with the given games.
    fn setup(primary_game: Option<&str>, friend_game: Option<&str>) -> (LocalHass, String) {
        let mut hass = LocalHass::default();
        let (device_id, sensors) = hass.setup_entry(entry("A"));
        let mut coordinator = SteamDataCoordinator::new(Duration::from_secs(30));
        coordinator.set_data(Snapshot::from([
            player("A", primary_game),
            player("B", friend_game),
        ]));
        hass.refresh("e1", &sensors, &mut coordinator)
            .expect("refresh");
        (hass, device_id)
    }

    fn trigger_to_game(game: Option<&str>) -> TriggerVariables {
        let mut to_state = State::new("sensor.steam_B_player_status", "Online");
        if let Some(game) = game {
            to_state.attributes.insert("game_id".into(), game.into());
        }
        TriggerVariables::state_changed(None, to_state)
    }

    #[test]
    fn condition_type_name() {
        assert_eq!(
            CONDITION_PRIMARY_GAME,
            ConditionType::IsSameGameAsPrimary.to_string()
        );
    }

    #[test]
    fn get_conditions_for_device() {
        assert_eq!(
            vec![config("dev1", CONDITION_PRIMARY_GAME)],
            get_conditions("dev1")
        );
    }

    #[test]
    fn validate_valid_config() {
        let cfg = validate_condition_config(json!({
            "condition": "device",
            "device_id": "dev1",
            "domain": "steam_online",
            "type": "is_same_game_as_primary"
        }))
        .expect("valid config");
        assert_eq!(config("dev1", CONDITION_PRIMARY_GAME), cfg);
    }

    #[rstest]
    #[case(json!({"condition": "state", "device_id": "dev1", "domain": "steam_online", "type": "is_same_game_as_primary"}))]
    #[case(json!({"condition": "device", "device_id": "dev1", "domain": "light", "type": "is_same_game_as_primary"}))]
    #[case(json!({"condition": "device", "device_id": "", "domain": "steam_online", "type": "is_same_game_as_primary"}))]
    #[case(json!({"condition": "device", "device_id": "dev1", "domain": "steam_online", "type": "is_online"}))]
    #[case(json!({"condition": "device", "domain": "steam_online", "type": "is_same_game_as_primary"}))]
    fn validate_invalid_config(#[case] cfg: serde_json::Value) {
        assert!(matches!(
            validate_condition_config(cfg),
            Err(ServiceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn checker_resolves_primary_entity() {
        let (hass, device_id) = setup(None, None);
        let checker = condition_from_config(&hass, &config(&device_id, CONDITION_PRIMARY_GAME))
            .expect("checker");
        assert_eq!(
            ConditionChecker::SameGameAsPrimary {
                primary_entity_id: PRIMARY_ENTITY.into()
            },
            checker
        );
    }

    #[rstest]
    #[case(Some("10"), Some("10"), true)]
    #[case(Some("10"), Some("20"), false)]
    #[case(None, Some("10"), false)]
    #[case(Some("10"), None, false)]
    #[case(None, None, false)]
    fn same_game_as_primary(
        #[case] primary_game: Option<&str>,
        #[case] trigger_game: Option<&str>,
        #[case] expected: bool,
    ) {
        let (hass, device_id) = setup(primary_game, Some("10"));
        let checker = condition_from_config(&hass, &config(&device_id, CONDITION_PRIMARY_GAME))
            .expect("checker");

        assert_eq!(
            Ok(expected),
            checker.check(&hass, Some(&trigger_to_game(trigger_game)))
        );
    }

    #[test]
    fn missing_primary_state_never_matches() {
        let (mut hass, device_id) = setup(Some("10"), Some("10"));
        let checker = condition_from_config(&hass, &config(&device_id, CONDITION_PRIMARY_GAME))
            .expect("checker");
        hass.remove_state(PRIMARY_ENTITY);

        assert_eq!(
            Ok(false),
            checker.check(&hass, Some(&trigger_to_game(Some("10"))))
        );
    }

    #[test]
    fn trigger_without_to_state_never_matches() {
        let (hass, device_id) = setup(Some("10"), Some("10"));
        let checker = condition_from_config(&hass, &config(&device_id, CONDITION_PRIMARY_GAME))
            .expect("checker");
        let mut vars = trigger_to_game(Some("10"));
        if let Some(trigger) = vars.trigger.as_mut() {
            trigger.to_state = None;
        }

        assert_eq!(Ok(false), checker.check(&hass, Some(&vars)));
    }

    #[test]
    fn check_without_trigger_fails() {
        let (hass, device_id) = setup(Some("10"), Some("10"));
        let checker = condition_from_config(&hass, &config(&device_id, CONDITION_PRIMARY_GAME))
            .expect("checker");

        assert_eq!(Err(ServiceError::MissingTrigger), checker.check(&hass, None));
        assert_eq!(
            Err(ServiceError::MissingTrigger),
            checker.check(&hass, Some(&TriggerVariables::default()))
        );
    }

    #[test]
    fn unmatched_condition_type_is_always_false() {
        let (hass, device_id) = setup(Some("10"), Some("10"));
        let checker =
            condition_from_config(&hass, &config(&device_id, "is_online")).expect("checker");

        assert_eq!(ConditionChecker::Never, checker);
        assert_eq!(
            Ok(false),
            checker.check(&hass, Some(&trigger_to_game(Some("10"))))
        );
        assert_eq!(Ok(false), checker.check(&hass, None));
    }

    #[test]
    fn unknown_device_fails() {
        let (hass, _) = setup(None, None);
        assert_eq!(
            Err(ServiceError::DeviceNotFound("nope".into())),
            condition_from_config(&hass, &config("nope", CONDITION_PRIMARY_GAME))
        );
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec!["missing".to_string()])]
    fn device_without_config_entry_fails(#[case] config_entries: Vec<String>) {
        let (mut hass, _) = setup(None, None);
        hass.register_device(DeviceEntry {
            id: "orphan".into(),
            config_entries,
            name: None,
        });
        assert_eq!(
            Err(ServiceError::ConfigEntryNotFound("orphan".into())),
            condition_from_config(&hass, &config("orphan", CONDITION_PRIMARY_GAME))
        );
    }

    #[test]
    fn no_entity_for_primary_account_fails() {
        let mut hass = LocalHass::default();
        let (device_id, _) = hass.setup_entry(entry("Z"));
        assert_eq!(
            Err(ServiceError::PrimaryEntityNotFound {
                device_id: device_id.clone(),
                account: "Z".into()
            }),
            condition_from_config(&hass, &config(&device_id, CONDITION_PRIMARY_GAME))
        );
    }

    #[test]
    fn primary_entity_matches_complete_account_id() {
        let mut entry = entry("1");
        entry.options.accounts = BTreeMap::from([
            ("01".to_string(), "Zero One".to_string()),
            ("1".to_string(), "One".to_string()),
        ]);
        let mut hass = LocalHass::default();
        let (device_id, _) = hass.setup_entry(entry);

        assert_eq!(
            Ok(ConditionChecker::SameGameAsPrimary {
                primary_entity_id: "sensor.steam_1_player_status".into()
            }),
            condition_from_config(&hass, &config(&device_id, CONDITION_PRIMARY_GAME))
        );
    }

    #[test]
    fn primary_binding_survives_state_changes() {
        let (mut hass, device_id) = setup(None, Some("10"));
        let checker = condition_from_config(&hass, &config(&device_id, CONDITION_PRIMARY_GAME))
            .expect("checker");
        let vars = trigger_to_game(Some("10"));
        assert_eq!(Ok(false), checker.check(&hass, Some(&vars)));

        let mut primary = hass.state(PRIMARY_ENTITY).cloned().expect("primary state");
        primary.attributes.insert("game_id".into(), "10".into());
        hass.set_state(primary);
        assert_eq!(Ok(true), checker.check(&hass, Some(&vars)));
    }
}
