// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Data holder of the Steam polling coordinator.
//!
//! Polling the Steam Web API is done outside of this crate. The polling engine pushes every
//! refreshed snapshot with [`SteamDataCoordinator::set_data`] and sensors only read from it.

use crate::model::{AccountStatus, Snapshot};
use log::{debug, warn};
use std::collections::HashMap;
use std::time::Duration;

/// Game icon hashes, keyed by game id.
///
/// Eviction policy: a lookup miss clears the complete cache, the coordinator then fetches the
/// icons of all currently played games again on its next refresh.
#[derive(Debug, Default)]
pub struct GameIconCache {
    icons: HashMap<String, String>,
}

impl GameIconCache {
    pub fn insert(&mut self, game_id: impl Into<String>, icon_hash: impl Into<String>) {
        self.icons.insert(game_id.into(), icon_hash.into());
    }

    /// Get the icon hash of a game.
    ///
    /// Returns `None` and resets the cache if the game is unknown.
    pub fn lookup(&mut self, game_id: &str) -> Option<String> {
        if let Some(icon) = self.icons.get(game_id) {
            return Some(icon.clone());
        }
        if !self.icons.is_empty() {
            debug!(
                "No icon for game {game_id}, clearing {} cached icons",
                self.icons.len()
            );
            // TODO evict per missing game id once the coordinator can fetch single game icons
            self.icons.clear();
        }
        None
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

pub struct SteamDataCoordinator {
    update_interval: Duration,
    data: Option<Snapshot>,
    last_update_success: bool,
    pub game_icons: GameIconCache,
}

impl SteamDataCoordinator {
    pub fn new(update_interval: Duration) -> Self {
        Self {
            update_interval,
            data: None,
            last_update_success: false,
            game_icons: GameIconCache::default(),
        }
    }

    /// Replace the snapshot with the result of a successful refresh.
    pub fn set_data(&mut self, snapshot: Snapshot) {
        debug!("Updated snapshot with {} accounts", snapshot.len());
        self.data = Some(snapshot);
        self.last_update_success = true;
    }

    /// Mark the last refresh as failed. The previous snapshot is kept.
    pub fn set_update_failed(&mut self) {
        warn!("Steam account refresh failed");
        self.last_update_success = false;
    }

    pub fn data(&self) -> Option<&Snapshot> {
        self.data.as_ref()
    }

    /// Status record of an account in the current snapshot.
    pub fn account(&self, account_id: &str) -> Option<&AccountStatus> {
        self.data.as_ref().and_then(|d| d.get(account_id))
    }

    pub fn last_update_success(&self) -> bool {
        self.last_update_success
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }
}
