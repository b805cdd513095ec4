// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reachability walk over a glue graph.
use crate::graph::{GlueGraph, GlueId};

/// Collects every node reachable from `root` that still lacks a mirror.
///
/// Built nodes are traversed too, so unbuilt descendants of an existing
/// mirror are found. The walk is an explicit-stack pre-order (properties in
/// name order, items in index order) guarded by a visited bitmap, so it
/// terminates on cycles and yields each node at most once. Handles that do
/// not belong to `graph` are skipped.
pub fn collect_unbuilt<M>(graph: &GlueGraph<M>, root: GlueId) -> Vec<GlueId> {
    let mut visited = vec![false; graph.len()];
    let mut stack = vec![root];
    let mut unbuilt = Vec::new();

    while let Some(id) = stack.pop() {
        let Some(node) = graph.node(id) else {
            continue;
        };
        if std::mem::replace(&mut visited[id.index()], true) {
            continue;
        }
        if !node.is_built() {
            unbuilt.push(id);
        }
        // Reverse so the first child is popped first.
        let children: Vec<GlueId> = node.children().collect();
        stack.extend(
            children
                .into_iter()
                .rev()
                .filter(|child| !visited.get(child.index()).copied().unwrap_or(true)),
        );
    }
    unbuilt
}
