// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Host state objects: entity states and automation trigger variables.

use crate::consts::ATTR_GAME_ID;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const STATE_UNAVAILABLE: &str = "unavailable";

/// Current display state of an entity in the host's state store.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct State {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl State {
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: Map::new(),
        }
    }

    pub fn unavailable(entity_id: impl Into<String>) -> Self {
        Self::new(entity_id, STATE_UNAVAILABLE)
    }

    /// Game identifier attribute of the state.
    ///
    /// Numbers are accepted as well and normalized to their string form. Empty strings, `null`
    /// and other value types are treated as "not in a game".
    pub fn game_id(&self) -> Option<String> {
        match self.attributes.get(ATTR_GAME_ID)? {
            Value::String(v) if !v.is_empty() => Some(v.clone()),
            Value::Number(v) => Some(v.to_string()),
            _ => None,
        }
    }
}

/// State change trigger data.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Trigger {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub from_state: Option<State>,
    #[serde(default)]
    pub to_state: Option<State>,
}

/// Variables passed to a condition checker by the automation engine.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TriggerVariables {
    #[serde(default)]
    pub trigger: Option<Trigger>,
}

impl TriggerVariables {
    /// Variables of a `state` platform trigger.
    pub fn state_changed(from_state: Option<State>, to_state: State) -> Self {
        Self {
            trigger: Some(Trigger {
                platform: Some("state".into()),
                entity_id: Some(to_state.entity_id.clone()),
                from_state,
                to_state: Some(to_state),
            }),
        }
    }
}
