// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use const_format::formatcp;

/// Application version built from the package version and build profile.
pub const APP_VERSION: &str = formatcp!(
    "{}{}",
    env!("CARGO_PKG_VERSION"),
    if cfg!(debug_assertions) { "-debug" } else { "" }
);
