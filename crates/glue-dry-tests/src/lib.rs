// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for glue crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`factory`] - Mirror factories that break the batch contract on purpose
//! - [`graphs`] - Canned glue graphs (view models, cycles)

pub mod config;
pub mod factory;
pub mod graphs;

pub use config::InMemoryConfigStore;
pub use factory::ShortBatchFactory;
pub use graphs::{cyclic_pair, person_view_model, CyclicPair, PersonViewModel};
