// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Integration wide constants.

use const_format::formatcp;

/// Integration domain, also used as `domain` in device conditions.
pub const DOMAIN: &str = "steam_online";

/// Device condition: triggering account plays the same game as the primary account.
pub const CONDITION_PRIMARY_GAME: &str = "is_same_game_as_primary";

/// State attribute holding the Steam game identifier.
pub const ATTR_GAME_ID: &str = "game_id";

pub const STEAM_API_URL: &str = "https://cdn.akamai.steamstatic.com/steam/apps/";
pub const STEAM_HEADER_IMAGE_FILE: &str = "header.jpg";
pub const STEAM_MAIN_IMAGE_FILE: &str = "capsule_616x353.jpg";
pub const STEAM_ICON_URL: &str =
    formatcp!("{}/steamcommunity/public/images/apps/", STEAM_CDN_HOST);
const STEAM_CDN_HOST: &str = "https://steamcdn-a.akamaihd.net";
