// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Arena-backed glue graph.
//!
//! Nodes are addressed by [`GlueId`] handles into a flat arena, so object
//! and array nodes can reference each other freely, including cyclically.
//! The graph is assembled upstream (by whatever decides which host values
//! need mirrors); the builder only ever fills in missing mirrors through
//! [`GlueGraph::assign_mirror`].
use std::collections::BTreeMap;

use thiserror::Error;

use crate::host::{EnumValue, HostValue};

/// Stable handle to a node in a [`GlueGraph`].
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct GlueId(pub u32);

impl GlueId {
    /// Arena slot index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Error returned by graph assembly and mirror assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The handle does not belong to this graph.
    #[error("unknown glue node {0:?}")]
    UnknownNode(GlueId),
    /// A property was set on a node that is not an object.
    #[error("glue node {0:?} is not an object")]
    NotAnObject(GlueId),
    /// An item was pushed onto a node that is not an array.
    #[error("glue node {0:?} is not an array")]
    NotAnArray(GlueId),
    /// Mirrors are set once; the node already holds one.
    #[error("glue node {0:?} already has a mirror")]
    MirrorAlreadyAssigned(GlueId),
}

/// Capability tag of a glue node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlueKind {
    /// Host object with named children.
    Object {
        /// Property name to child node.
        properties: BTreeMap<String, GlueId>,
    },
    /// Host collection with ordered children.
    Array {
        /// Child nodes in element order.
        items: Vec<GlueId>,
    },
    /// Primitive host value with no children.
    Basic,
    /// Enum-typed host value; basic, but eligible for identity caching.
    Enum,
    /// Invokable host member.
    Command {
        /// Whether the command can currently execute.
        can_execute: bool,
    },
}

impl GlueKind {
    /// Short label for logs and diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Object { .. } => "object",
            Self::Array { .. } => "array",
            Self::Basic => "basic",
            Self::Enum => "enum",
            Self::Command { .. } => "command",
        }
    }
}

/// One host value and, once built, its mirror.
#[derive(Debug, Clone)]
pub struct GlueNode<M> {
    host: HostValue,
    kind: GlueKind,
    mirror: Option<M>,
}

impl<M> GlueNode<M> {
    /// The wrapped host value.
    pub fn host(&self) -> &HostValue {
        &self.host
    }

    /// The node's capability tag.
    pub fn kind(&self) -> &GlueKind {
        &self.kind
    }

    /// The mirror, if built.
    pub fn mirror(&self) -> Option<&M> {
        self.mirror.as_ref()
    }

    /// Returns `true` once a mirror has been assigned.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.mirror.is_some()
    }

    /// Child handles in traversal order: properties by name, items by index.
    pub fn children(&self) -> Box<dyn Iterator<Item = GlueId> + '_> {
        match &self.kind {
            GlueKind::Object { properties } => Box::new(properties.values().copied()),
            GlueKind::Array { items } => Box::new(items.iter().copied()),
            GlueKind::Basic | GlueKind::Enum | GlueKind::Command { .. } => {
                Box::new(std::iter::empty())
            }
        }
    }
}

/// Arena of glue nodes plus an optional root.
#[derive(Debug, Clone)]
pub struct GlueGraph<M> {
    nodes: Vec<GlueNode<M>>,
    root: Option<GlueId>,
}

impl<M> Default for GlueGraph<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> GlueGraph<M> {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }

    fn push(&mut self, host: HostValue, kind: GlueKind) -> GlueId {
        let id = GlueId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        debug_assert!(id.0 != u32::MAX, "glue arena exhausted");
        self.nodes.push(GlueNode {
            host,
            kind,
            mirror: None,
        });
        id
    }

    /// Adds an object node with no properties yet.
    pub fn add_object(&mut self, host: HostValue) -> GlueId {
        self.push(
            host,
            GlueKind::Object {
                properties: BTreeMap::new(),
            },
        )
    }

    /// Adds an array node with no items yet.
    pub fn add_array(&mut self, host: HostValue) -> GlueId {
        self.push(host, GlueKind::Array { items: Vec::new() })
    }

    /// Adds a basic node wrapping a primitive (or null) host value.
    pub fn add_basic(&mut self, value: impl Into<HostValue>) -> GlueId {
        self.push(value.into(), GlueKind::Basic)
    }

    /// Adds an enum node.
    pub fn add_enum(&mut self, value: EnumValue) -> GlueId {
        self.push(HostValue::Enum(value), GlueKind::Enum)
    }

    /// Adds a command node.
    pub fn add_command(&mut self, host: HostValue, can_execute: bool) -> GlueId {
        self.push(host, GlueKind::Command { can_execute })
    }

    /// Sets (or replaces) property `name` of object `father` to `child`.
    pub fn set_property(
        &mut self,
        father: GlueId,
        name: impl Into<String>,
        child: GlueId,
    ) -> Result<(), GraphError> {
        self.check(child)?;
        match &mut self.node_mut(father)?.kind {
            GlueKind::Object { properties } => {
                properties.insert(name.into(), child);
                Ok(())
            }
            _ => Err(GraphError::NotAnObject(father)),
        }
    }

    /// Appends `child` to array `father`.
    pub fn push_item(&mut self, father: GlueId, child: GlueId) -> Result<(), GraphError> {
        self.check(child)?;
        match &mut self.node_mut(father)?.kind {
            GlueKind::Array { items } => {
                items.push(child);
                Ok(())
            }
            _ => Err(GraphError::NotAnArray(father)),
        }
    }

    /// Marks `id` as the graph root.
    pub fn set_root(&mut self, id: GlueId) -> Result<(), GraphError> {
        self.check(id)?;
        self.root = Some(id);
        Ok(())
    }

    /// The root node, if one was set.
    pub fn root(&self) -> Option<GlueId> {
        self.root
    }

    /// Returns the node for `id`.
    pub fn node(&self, id: GlueId) -> Option<&GlueNode<M>> {
        self.nodes.get(id.index())
    }

    /// Returns the mirror of `id`, if built.
    pub fn mirror(&self, id: GlueId) -> Option<&M> {
        self.node(id).and_then(GlueNode::mirror)
    }

    /// Assigns the mirror of `id`. Mirrors are set once.
    pub fn assign_mirror(&mut self, id: GlueId, mirror: M) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        if node.mirror.is_some() {
            return Err(GraphError::MirrorAlreadyAssigned(id));
        }
        node.mirror = Some(mirror);
        Ok(())
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` when the arena holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes without a mirror, reachable or not.
    #[must_use]
    pub fn unbuilt_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_built()).count()
    }

    fn check(&self, id: GlueId) -> Result<(), GraphError> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(id))
        }
    }

    fn node_mut(&mut self, id: GlueId) -> Result<&mut GlueNode<M>, GraphError> {
        self.nodes
            .get_mut(id.index())
            .ok_or(GraphError::UnknownNode(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostRef;

    #[test]
    fn mirror_is_set_once() {
        let mut graph = GlueGraph::<u8>::new();
        let n = graph.add_basic(1i64);
        graph.assign_mirror(n, 7).unwrap();
        assert_eq!(
            graph.assign_mirror(n, 8),
            Err(GraphError::MirrorAlreadyAssigned(n))
        );
        assert_eq!(graph.mirror(n), Some(&7));
    }

    #[test]
    fn set_property_rejects_non_objects() {
        let mut graph = GlueGraph::<u8>::new();
        let arr = graph.add_array(HostValue::Ref(HostRef(1)));
        let leaf = graph.add_basic("x");
        assert_eq!(
            graph.set_property(arr, "a", leaf),
            Err(GraphError::NotAnObject(arr))
        );
        assert_eq!(graph.push_item(leaf, arr), Err(GraphError::NotAnArray(leaf)));
        assert_eq!(
            graph.push_item(arr, GlueId(99)),
            Err(GraphError::UnknownNode(GlueId(99)))
        );
    }

    #[test]
    fn children_follow_key_then_index_order() {
        let mut graph = GlueGraph::<u8>::new();
        let obj = graph.add_object(HostValue::Ref(HostRef(1)));
        let b = graph.add_basic("b");
        let a = graph.add_basic("a");
        graph.set_property(obj, "zeta", b).unwrap();
        graph.set_property(obj, "alpha", a).unwrap();
        let order: Vec<_> = graph.node(obj).unwrap().children().collect();
        assert_eq!(order, vec![a, b]);
        assert_eq!(graph.unbuilt_count(), 3);
    }
}
