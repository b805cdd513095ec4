// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canned glue graphs.

use glue_core::{GlueGraph, GlueId, HostRef, HostValue};
use glue_heap::MirrorHandle;

/// `{ Name: "Ann", Tags: ["a", "b"] }` with every node unbuilt.
pub struct PersonViewModel {
    /// The graph.
    pub graph: GlueGraph<MirrorHandle>,
    /// Root object.
    pub root: GlueId,
    /// `Name` basic.
    pub name: GlueId,
    /// `Tags` array.
    pub tags: GlueId,
    /// First tag.
    pub a: GlueId,
    /// Second tag.
    pub b: GlueId,
}

/// Builds the [`PersonViewModel`] fixture.
///
/// # Panics
///
/// Never in practice; graph assembly only fails on foreign handles.
#[allow(clippy::unwrap_used)]
pub fn person_view_model() -> PersonViewModel {
    let mut graph = GlueGraph::new();
    let root = graph.add_object(HostValue::Ref(HostRef(1)));
    let name = graph.add_basic("Ann");
    let tags = graph.add_array(HostValue::Ref(HostRef(2)));
    let a = graph.add_basic("a");
    let b = graph.add_basic("b");
    graph.set_property(root, "Name", name).unwrap();
    graph.set_property(root, "Tags", tags).unwrap();
    graph.push_item(tags, a).unwrap();
    graph.push_item(tags, b).unwrap();
    graph.set_root(root).unwrap();
    PersonViewModel {
        graph,
        root,
        name,
        tags,
        a,
        b,
    }
}

/// Two objects pointing at each other, plus an array holding both.
pub struct CyclicPair {
    /// The graph.
    pub graph: GlueGraph<MirrorHandle>,
    /// Root array `[left, right]`.
    pub root: GlueId,
    /// `left.Other == right`.
    pub left: GlueId,
    /// `right.Other == left`.
    pub right: GlueId,
}

/// Builds the [`CyclicPair`] fixture.
///
/// # Panics
///
/// Never in practice; graph assembly only fails on foreign handles.
#[allow(clippy::unwrap_used)]
pub fn cyclic_pair() -> CyclicPair {
    let mut graph = GlueGraph::new();
    let root = graph.add_array(HostValue::Ref(HostRef(10)));
    let left = graph.add_object(HostValue::Ref(HostRef(11)));
    let right = graph.add_object(HostValue::Ref(HostRef(12)));
    graph.push_item(root, left).unwrap();
    graph.push_item(root, right).unwrap();
    graph.set_property(left, "Other", right).unwrap();
    graph.set_property(right, "Other", left).unwrap();
    graph.set_root(root).unwrap();
    CyclicPair {
        graph,
        root,
        left,
        right,
    }
}
