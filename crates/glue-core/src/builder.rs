// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Two-phase bulk construction of mirrors.
//!
//! One [`BulkBuilder::synchronize`] pass:
//!
//! 1. walks the graph and asks every unbuilt node to register a request.
//!    Basic, enum, and command nodes are built on the spot since they have no
//!    children to wire.
//! 2. creates all object containers in one factory call and all array
//!    containers in another, assigning them to fathers by request index.
//! 3. hands every father with children to the bulk updater.
//!
//! Wiring happens only after every container of the pass exists, which is
//! what lets forward references and cycles resolve without ordering the
//! graph topologically.
use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::graph::{GlueGraph, GlueId, GlueKind, GraphError};
use crate::host::HostValue;
use crate::port::{ArrayUpdate, BulkUpdater, MirrorFactory, PropertyUpdate, SessionCache};
use crate::walker::collect_unbuilt;

/// Field of a command mirror holding the executability flag.
pub const CAN_EXECUTE_VALUE: &str = "CanExecuteValue";
/// Field of a command mirror holding the publication counter.
pub const CAN_EXECUTE_COUNT: &str = "CanExecuteCount";

/// Which container batch a factory call served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// `create_objects`.
    Objects,
    /// `create_arrays`.
    Arrays,
}

/// Defects detected while synchronizing. All of them abort the pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// A node registered as basic is neither primitive-convertible nor an enum.
    #[error("glue node {node:?} holds a `{type_name}` value that has no basic mirror")]
    Unclassifiable {
        /// Offending node.
        node: GlueId,
        /// Host value type label.
        type_name: String,
    },
    /// The factory returned a batch of the wrong length.
    #[error("{kind:?} batch returned {returned} mirrors for {requested} requests")]
    BatchLength {
        /// Batch that misbehaved.
        kind: BatchKind,
        /// Number of mirrors requested.
        requested: usize,
        /// Number of mirrors returned.
        returned: usize,
    },
    /// A child still had no mirror when its father was wired.
    #[error("glue node {father:?} references unbuilt child {child:?}")]
    MissingChildMirror {
        /// Father being wired.
        father: GlueId,
        /// Child without a mirror.
        child: GlueId,
    },
    /// The graph rejected an operation.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Request for an object mirror plus the children to wire onto it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildrenPropertyDescriptor {
    /// Object node awaiting a container.
    pub father: GlueId,
    /// Property map captured at request time.
    pub children: BTreeMap<String, GlueId>,
}

/// Request for an array mirror plus the elements to wire into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildrenArrayDescriptor {
    /// Array node awaiting a sequence.
    pub father: GlueId,
    /// Elements captured at request time, in order.
    pub children: Vec<GlueId>,
}

/// Counters for one synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Unbuilt nodes found by the walk.
    pub visited: usize,
    /// Object containers created.
    pub objects: usize,
    /// Array containers created.
    pub arrays: usize,
    /// Basic (primitive or null) mirrors created.
    pub basics: usize,
    /// Enum mirrors created.
    pub enums: usize,
    /// Command mirrors created.
    pub commands: usize,
    /// Objects handed to the updater.
    pub property_wirings: usize,
    /// Arrays handed to the updater.
    pub array_wirings: usize,
}

impl SyncReport {
    /// Returns `true` when the pass built nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.visited == 0
    }
}

/// Collects construction requests and drives the two-phase build.
pub struct BulkBuilder<F, C, U> {
    factory: F,
    cache: C,
    updater: U,
    objects: Vec<ChildrenPropertyDescriptor>,
    arrays: Vec<ChildrenArrayDescriptor>,
    report: SyncReport,
}

impl<F, C, U> BulkBuilder<F, C, U>
where
    F: MirrorFactory,
    C: SessionCache,
    U: BulkUpdater<Mirror = F::Mirror>,
{
    /// Creates a builder over the given collaborators.
    pub fn new(factory: F, cache: C, updater: U) -> Self {
        Self {
            factory,
            cache,
            updater,
            objects: Vec::new(),
            arrays: Vec::new(),
            report: SyncReport::default(),
        }
    }

    /// Builds a mirror for every unbuilt node reachable from `root`.
    ///
    /// Running it again on a fully built graph makes no collaborator calls.
    #[instrument(skip_all, fields(root = root.0))]
    pub fn synchronize(
        &mut self,
        graph: &mut GlueGraph<F::Mirror>,
        root: GlueId,
    ) -> Result<SyncReport, SyncError> {
        self.objects.clear();
        self.arrays.clear();
        self.report = SyncReport::default();
        graph.node(root).ok_or(GraphError::UnknownNode(root))?;

        let pending = collect_unbuilt(graph, root);
        self.report.visited = pending.len();
        debug!(unbuilt = pending.len(), "collected unbuilt glue nodes");

        for id in pending {
            self.request_build(graph, id)?;
        }
        self.create_objects(graph)?;
        self.update_dependencies(graph)?;

        debug!(report = ?self.report, "synchronization finished");
        Ok(self.report)
    }

    /// Records an object node and its property map for the two-phase build.
    pub fn request_object_creation(&mut self, node: GlueId, children: BTreeMap<String, GlueId>) {
        trace!(node = node.0, children = children.len(), "object requested");
        self.objects.push(ChildrenPropertyDescriptor {
            father: node,
            children,
        });
    }

    /// Records an array node and its elements for the two-phase build.
    pub fn request_array_creation(&mut self, node: GlueId, children: Vec<GlueId>) {
        trace!(node = node.0, children = children.len(), "array requested");
        self.arrays.push(ChildrenArrayDescriptor {
            father: node,
            children,
        });
    }

    /// Builds the mirror of a basic or enum node immediately.
    ///
    /// Null maps to the factory's null. Anything the factory can convert
    /// becomes a primitive. Enums get an enum mirror and are cached for
    /// later passes. Any other value is a classification defect.
    pub fn request_basic_object_creation(
        &mut self,
        graph: &mut GlueGraph<F::Mirror>,
        node: GlueId,
        value: &HostValue,
    ) -> Result<(), SyncError> {
        if value.is_null() {
            let mirror = self.factory.create_null();
            graph.assign_mirror(node, mirror)?;
            self.report.basics += 1;
            return Ok(());
        }

        if let Some(mirror) = self.factory.try_create_basic(value) {
            graph.assign_mirror(node, mirror)?;
            self.report.basics += 1;
            return Ok(());
        }

        let Some(enum_value) = value.as_enum() else {
            return Err(SyncError::Unclassifiable {
                node,
                type_name: value.type_name().to_owned(),
            });
        };

        let mirror = self.factory.create_enum(enum_value);
        graph.assign_mirror(node, mirror)?;
        self.cache.cache_local(value, node);
        self.report.enums += 1;
        Ok(())
    }

    /// Builds the fixed-shape command mirror immediately.
    ///
    /// The counter always starts at 1 for a fresh registration.
    pub fn request_command_creation(
        &mut self,
        graph: &mut GlueGraph<F::Mirror>,
        node: GlueId,
        can_execute: bool,
    ) -> Result<(), SyncError> {
        let command = self.factory.create_object(true);
        let flag = self.factory.create_bool(can_execute);
        self.factory.set_value(&command, CAN_EXECUTE_VALUE, flag);
        let count = self.factory.create_int(1);
        self.factory.set_value(&command, CAN_EXECUTE_COUNT, count);

        graph.assign_mirror(node, command)?;
        self.report.commands += 1;
        Ok(())
    }

    fn request_build(
        &mut self,
        graph: &mut GlueGraph<F::Mirror>,
        id: GlueId,
    ) -> Result<(), SyncError> {
        let node = graph.node(id).ok_or(GraphError::UnknownNode(id))?;
        trace!(node = id.0, kind = node.kind().label(), "registering");
        match node.kind() {
            GlueKind::Object { properties } => {
                let children = properties.clone();
                self.request_object_creation(id, children);
            }
            GlueKind::Array { items } => {
                let children = items.clone();
                self.request_array_creation(id, children);
            }
            GlueKind::Basic | GlueKind::Enum => {
                let value = node.host().clone();
                self.request_basic_object_creation(graph, id, &value)?;
            }
            GlueKind::Command { can_execute } => {
                let can_execute = *can_execute;
                self.request_command_creation(graph, id, can_execute)?;
            }
        }
        Ok(())
    }

    fn create_objects(&mut self, graph: &mut GlueGraph<F::Mirror>) -> Result<(), SyncError> {
        let fathers: Vec<GlueId> = self.objects.iter().map(|d| d.father).collect();
        let factory = &mut self.factory;
        self.report.objects = bulk_create(graph, &fathers, BatchKind::Objects, |count| {
            factory.create_objects(true, count)
        })?;

        let fathers: Vec<GlueId> = self.arrays.iter().map(|d| d.father).collect();
        let factory = &mut self.factory;
        self.report.arrays = bulk_create(graph, &fathers, BatchKind::Arrays, |count| {
            factory.create_arrays(count)
        })?;
        Ok(())
    }

    fn update_dependencies(&mut self, graph: &GlueGraph<F::Mirror>) -> Result<(), SyncError> {
        let mut properties = Vec::new();
        for descriptor in self.objects.iter().filter(|d| !d.children.is_empty()) {
            let father = built(graph, descriptor.father, descriptor.father)?;
            let mut wired = Vec::with_capacity(descriptor.children.len());
            for (name, child) in &descriptor.children {
                wired.push((name.clone(), built(graph, descriptor.father, *child)?));
            }
            properties.push(PropertyUpdate {
                father,
                properties: wired,
            });
        }

        let mut arrays = Vec::new();
        for descriptor in self.arrays.iter().filter(|d| !d.children.is_empty()) {
            let father = built(graph, descriptor.father, descriptor.father)?;
            let items = descriptor
                .children
                .iter()
                .map(|child| built(graph, descriptor.father, *child))
                .collect::<Result<Vec<_>, _>>()?;
            arrays.push(ArrayUpdate { father, items });
        }

        self.report.property_wirings = properties.len();
        self.report.array_wirings = arrays.len();
        if !properties.is_empty() {
            debug!(fathers = properties.len(), "wiring object properties");
            self.updater.bulk_update_property(&properties);
        }
        if !arrays.is_empty() {
            debug!(fathers = arrays.len(), "wiring array elements");
            self.updater.bulk_update_array(&arrays);
        }
        Ok(())
    }
}

fn built<M: Clone>(graph: &GlueGraph<M>, father: GlueId, child: GlueId) -> Result<M, SyncError> {
    graph
        .mirror(child)
        .cloned()
        .ok_or(SyncError::MissingChildMirror { father, child })
}

/// Creates one container per father in a single call and assigns them by
/// index. Empty batches are never submitted.
fn bulk_create<M>(
    graph: &mut GlueGraph<M>,
    fathers: &[GlueId],
    kind: BatchKind,
    create: impl FnOnce(usize) -> Vec<M>,
) -> Result<usize, SyncError> {
    let requested = fathers.len();
    if requested == 0 {
        return Ok(0);
    }

    debug!(?kind, requested, "creating container batch");
    let mirrors = create(requested);
    if mirrors.len() != requested {
        return Err(SyncError::BatchLength {
            kind,
            requested,
            returned: mirrors.len(),
        });
    }
    for (father, mirror) in fathers.iter().zip(mirrors) {
        graph.assign_mirror(*father, mirror)?;
    }
    Ok(requested)
}
