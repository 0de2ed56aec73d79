// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

pub mod configuration;
pub mod consts;
pub mod coordinator;
pub mod device_condition;
pub mod errors;
pub mod model;
pub mod registry;
pub mod sensor;
pub mod startup;
pub mod state;

pub use startup::*;
