// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property tests: arbitrary (often cyclic) glue graphs always end fully
//! built, fully wired, and stable under a second pass.

use std::collections::VecDeque;

use proptest::prelude::*;

use glue_core::{
    BulkBuilder, EnumValue, GlueGraph, GlueId, GlueKind, HostRef, HostValue, LocalSessionCache,
};
use glue_heap::{HeapConfig, HeapValue, MirrorHandle, ScriptHeap};

/// Node kind codes: object, array, int, enum, command, null.
const KINDS: u8 = 6;

fn build_graph(kinds: &[u8], edges: &[(usize, usize)]) -> GlueGraph<MirrorHandle> {
    let mut graph = GlueGraph::new();
    for (i, kind) in kinds.iter().enumerate() {
        let host = HostValue::Ref(HostRef(i as u64));
        match kind % KINDS {
            0 => graph.add_object(host),
            1 => graph.add_array(host),
            2 => graph.add_basic(i as i64),
            3 => graph.add_enum(EnumValue::new("Suit", "Spade", (i % 2) as i64)),
            4 => graph.add_command(host, i % 2 == 0),
            _ => graph.add_basic(HostValue::Null),
        };
    }
    let n = kinds.len();
    for (from, to) in edges {
        let (from, to) = (GlueId((from % n) as u32), GlueId((to % n) as u32));
        match graph.node(from).map(|node| node.kind().clone()) {
            Some(GlueKind::Object { .. }) => {
                graph.set_property(from, format!("p{}", to.0), to).unwrap();
            }
            Some(GlueKind::Array { .. }) => graph.push_item(from, to).unwrap(),
            _ => {}
        }
    }
    graph
}

fn reachable(graph: &GlueGraph<MirrorHandle>, root: GlueId) -> Vec<GlueId> {
    let mut seen = vec![false; graph.len()];
    let mut queue = VecDeque::from([root]);
    let mut out = Vec::new();
    while let Some(id) = queue.pop_front() {
        if std::mem::replace(&mut seen[id.index()], true) {
            continue;
        }
        out.push(id);
        queue.extend(graph.node(id).unwrap().children());
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn every_reachable_node_is_built_and_wired(
        kinds in prop::collection::vec(0..KINDS, 1..40),
        edges in prop::collection::vec((0usize..64, 0usize..64), 0..80),
        max_batch in 1usize..8,
    ) {
        let mut graph = build_graph(&kinds, &edges);
        let root = GlueId(0);
        let heap = ScriptHeap::new(HeapConfig { max_batch });
        let mut cache = LocalSessionCache::new();
        let mut builder = BulkBuilder::new(heap.clone(), &mut cache, heap.clone());

        builder.synchronize(&mut graph, root).unwrap();

        for id in reachable(&graph, root) {
            let node = graph.node(id).unwrap();
            let mirror = *node.mirror().unwrap();
            match node.kind() {
                GlueKind::Object { properties } => {
                    let Some(HeapValue::Object(fields)) = heap.value(mirror) else {
                        panic!("object mirror expected for {id:?}");
                    };
                    prop_assert_eq!(fields.len(), properties.len());
                    for (name, child) in properties {
                        prop_assert_eq!(fields.get(name).copied(), graph.mirror(*child).copied());
                    }
                }
                GlueKind::Array { items } => {
                    let Some(HeapValue::Array(elements)) = heap.value(mirror) else {
                        panic!("array mirror expected for {id:?}");
                    };
                    let expected: Vec<MirrorHandle> =
                        items.iter().map(|c| *graph.mirror(*c).unwrap()).collect();
                    prop_assert_eq!(elements, expected);
                }
                _ => {}
            }
        }

        heap.take_journal();
        let report = builder.synchronize(&mut graph, root).unwrap();
        prop_assert!(report.is_noop());
        prop_assert_eq!(heap.crossings(), 0);
    }

    #[test]
    fn each_unbuilt_node_is_visited_once(
        kinds in prop::collection::vec(0..KINDS, 1..40),
        edges in prop::collection::vec((0usize..64, 0usize..64), 0..80),
    ) {
        let graph = build_graph(&kinds, &edges);
        let mut found = glue_core::collect_unbuilt(&graph, GlueId(0));
        let mut expected = reachable(&graph, GlueId(0));
        found.sort();
        expected.sort();
        prop_assert_eq!(found, expected);
    }
}
