// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Glue core: mirrors a host object graph into a script engine.
//!
//! The host side describes what needs mirroring as a [`GlueGraph`]: an arena
//! of object, array, basic, enum, and command nodes. [`BulkBuilder`] walks the
//! graph from a root, finds every node without a mirror, and builds them with
//! as few engine crossings as possible:
//!
//! - primitives, enums, and commands are built as they are found;
//! - object and array containers are created in one batch per kind;
//! - children are wired onto containers in a final bulk update.
//!
//! The engine and session sit behind the ports in [`port`].
#![forbid(unsafe_code)]

pub mod builder;
pub mod graph;
pub mod host;
pub mod port;
pub mod walker;

pub use builder::{
    BatchKind, BulkBuilder, ChildrenArrayDescriptor, ChildrenPropertyDescriptor, SyncError,
    SyncReport, CAN_EXECUTE_COUNT, CAN_EXECUTE_VALUE,
};
pub use graph::{GlueGraph, GlueId, GlueKind, GlueNode, GraphError};
pub use host::{EnumValue, HostRef, HostValue};
pub use port::{
    ArrayUpdate, BulkUpdater, LocalSessionCache, MirrorFactory, PropertyUpdate, SessionCache,
};
pub use walker::collect_unbuilt;
