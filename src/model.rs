// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Steam account and config entry data structures for JSON serialization & deserialization.

use crate::errors::ServiceError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use url::Url;

/// Latest refreshed account status records, keyed by Steam account id.
pub type Snapshot = HashMap<String, AccountStatus>;

/// Steam persona state.
///
/// The `Display` / `FromStr` representation is the human-readable label shown by the
/// `player_status` sensor, the discriminant is the raw `personastate` value.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::IntoStaticStr,
    strum_macros::FromRepr,
    strum_macros::EnumIter,
)]
#[repr(u8)]
pub enum PersonaState {
    Offline = 0,
    Online = 1,
    Busy = 2,
    Away = 3,
    Snooze = 4,
    #[strum(serialize = "Looking to trade")]
    LookingToTrade = 5,
    #[strum(serialize = "Looking to play")]
    LookingToPlay = 6,
}

impl PersonaState {
    /// Look up a raw `personastate` value.
    ///
    /// Returns [`ServiceError::UnknownState`] if the value has no table entry.
    pub fn from_raw(value: i64) -> Result<Self, ServiceError> {
        u8::try_from(value)
            .ok()
            .and_then(Self::from_repr)
            .ok_or(ServiceError::UnknownState(value))
    }

    pub fn label(self) -> &'static str {
        self.into()
    }

    pub fn code(self) -> i64 {
        self as i64
    }
}

/// Player object of the Steam `GetPlayerSummaries` API.
///
/// Only the fields used by the sensors are mapped, everything else is ignored.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct AccountStatus {
    pub steamid: String,
    pub personastate: i64,
    #[serde(default)]
    pub personaname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gameid: Option<String>,
    /// Name of the game currently played.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gameextrainfo: Option<String>,
    #[serde(default)]
    pub avatar: Option<Url>,
    #[serde(default)]
    pub avatarmedium: Option<Url>,
    #[serde(default)]
    pub profileurl: Option<Url>,
    /// Last logoff as epoch seconds.
    #[serde(default)]
    pub lastlogoff: Option<i64>,
    #[serde(default)]
    pub level: Option<u32>,
}

impl AccountStatus {
    /// Game identifier, treating an empty value as "not in a game".
    pub fn game_id(&self) -> Option<&str> {
        self.gameid.as_deref().filter(|v| !v.is_empty())
    }
}

/// Persisted integration configuration, owned by the host's config entry storage.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConfigEntry {
    pub entry_id: String,
    /// Set to the primary account id during the setup flow.
    #[serde(default)]
    pub unique_id: Option<String>,
    pub data: ConfigEntryData,
    #[serde(default)]
    pub options: ConfigEntryOptions,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConfigEntryData {
    /// Primary account id.
    pub account: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ConfigEntryOptions {
    /// Tracked accounts: account id to display name.
    #[serde(default)]
    pub accounts: BTreeMap<String, String>,
}

impl ConfigEntry {
    /// Account ids of all tracked accounts.
    pub fn accounts(&self) -> impl Iterator<Item = &str> {
        self.options.accounts.keys().map(String::as_str)
    }

    pub fn primary_account(&self) -> &str {
        &self.data.account
    }
}
