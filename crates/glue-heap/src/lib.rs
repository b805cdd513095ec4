// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reference script heap for the glue ports.
//!
//! [`ScriptHeap`] stands in for a real script engine: it stores mirror values
//! in an arena addressed by [`MirrorHandle`], implements both
//! [`glue_core::MirrorFactory`] and [`glue_core::BulkUpdater`], and journals
//! every boundary crossing so callers can see exactly what a synchronization
//! cost.
#![forbid(unsafe_code)]

mod heap;
mod render;

pub use heap::{Crossing, HeapConfig, HeapValue, MirrorHandle, ScriptHeap};
