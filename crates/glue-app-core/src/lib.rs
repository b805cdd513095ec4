// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for glue tools (config storage, sync prefs).
//! Keeps binaries and adapters thin.

pub mod config;
pub mod prefs;
