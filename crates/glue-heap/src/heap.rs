// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Arena-backed heap and its port implementations.
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use glue_core::{ArrayUpdate, BulkUpdater, EnumValue, HostValue, MirrorFactory, PropertyUpdate};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Handle to a value living in a [`ScriptHeap`].
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct MirrorHandle(pub u32);

/// A value stored in the heap.
#[derive(Debug, Clone, PartialEq)]
pub enum HeapValue {
    /// Script null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Number(f64),
    /// String.
    Str(String),
    /// Date, milliseconds since the Unix epoch.
    Date(i64),
    /// Enum mirror.
    Enum(EnumValue),
    /// Container with named fields.
    Object(BTreeMap<String, MirrorHandle>),
    /// Sequence.
    Array(Vec<MirrorHandle>),
}

/// One journaled boundary crossing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Crossing {
    /// `create_null`.
    CreateNull,
    /// `create_bool`.
    CreateBool,
    /// `create_int`.
    CreateInt,
    /// `try_create_basic`, successful or not.
    CreateBasic,
    /// `create_enum`.
    CreateEnum,
    /// `create_object`.
    CreateObject,
    /// `create_objects` with the batch size.
    CreateObjects(usize),
    /// `create_arrays` with the batch size.
    CreateArrays(usize),
    /// `set_value` with the field name.
    SetValue(String),
    /// One chunk of a property bulk update.
    UpdateProperties {
        /// Distinct fathers touched by the chunk.
        fathers: usize,
        /// Properties attached by the chunk.
        entries: usize,
    },
    /// One chunk of an array bulk update.
    UpdateArrays {
        /// Distinct fathers touched by the chunk.
        fathers: usize,
        /// Elements attached by the chunk.
        entries: usize,
    },
}

/// Heap tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeapConfig {
    /// Maximum entries carried by one bulk-update crossing.
    pub max_batch: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self { max_batch: 1024 }
    }
}

#[derive(Debug, Default)]
pub(crate) struct HeapState {
    pub(crate) values: Vec<HeapValue>,
    journal: Vec<Crossing>,
    config: HeapConfig,
}

impl HeapState {
    fn alloc(&mut self, value: HeapValue) -> MirrorHandle {
        let handle = MirrorHandle(u32::try_from(self.values.len()).unwrap_or(u32::MAX));
        self.values.push(value);
        handle
    }

    fn set_field(&mut self, container: MirrorHandle, name: &str, value: MirrorHandle) {
        match self.values.get_mut(container.0 as usize) {
            Some(HeapValue::Object(fields)) => {
                fields.insert(name.to_owned(), value);
            }
            other => warn!(?container, found = ?other, "set_value on a non-object mirror"),
        }
    }

    fn set_element(&mut self, sequence: MirrorHandle, index: usize, value: MirrorHandle) {
        match self.values.get_mut(sequence.0 as usize) {
            Some(HeapValue::Array(items)) if index < items.len() => items[index] = value,
            Some(HeapValue::Array(items)) => items.push(value),
            other => warn!(?sequence, found = ?other, "element update on a non-array mirror"),
        }
    }
}

/// Shared handle to an in-process script heap.
///
/// Clones share state, so one heap can be lent to the builder as factory and
/// updater at the same time.
///
/// # Example
///
/// ```
/// use glue_core::{BulkBuilder, GlueGraph, HostRef, HostValue, LocalSessionCache};
/// use glue_heap::{HeapValue, ScriptHeap};
///
/// let heap = ScriptHeap::default();
/// let mut graph = GlueGraph::new();
/// let root = graph.add_object(HostValue::Ref(HostRef(1)));
/// let name = graph.add_basic("Ann");
/// graph.set_property(root, "Name", name).unwrap();
///
/// let mut cache = LocalSessionCache::new();
/// let mut builder = BulkBuilder::new(heap.clone(), &mut cache, heap.clone());
/// builder.synchronize(&mut graph, root).unwrap();
///
/// let mirror = *graph.mirror(root).unwrap();
/// let field = heap.property(mirror, "Name").unwrap();
/// assert_eq!(heap.value(field), Some(HeapValue::Str("Ann".into())));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptHeap {
    inner: Arc<Mutex<HeapState>>,
}

impl ScriptHeap {
    /// Creates an empty heap with `config`.
    pub fn new(config: HeapConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HeapState {
                config,
                ..HeapState::default()
            })),
        }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, HeapState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Active configuration.
    pub fn config(&self) -> HeapConfig {
        self.state().config
    }

    /// Copy of the value behind `handle`.
    pub fn value(&self, handle: MirrorHandle) -> Option<HeapValue> {
        self.state().values.get(handle.0 as usize).cloned()
    }

    /// Field `name` of the container behind `handle`.
    pub fn property(&self, handle: MirrorHandle, name: &str) -> Option<MirrorHandle> {
        match self.state().values.get(handle.0 as usize) {
            Some(HeapValue::Object(fields)) => fields.get(name).copied(),
            _ => None,
        }
    }

    /// Element `index` of the sequence behind `handle`.
    pub fn element(&self, handle: MirrorHandle, index: usize) -> Option<MirrorHandle> {
        match self.state().values.get(handle.0 as usize) {
            Some(HeapValue::Array(items)) => items.get(index).copied(),
            _ => None,
        }
    }

    /// Number of values allocated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state().values.len()
    }

    /// Returns `true` when nothing has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of crossings journaled since the last [`ScriptHeap::take_journal`].
    #[must_use]
    pub fn crossings(&self) -> usize {
        self.state().journal.len()
    }

    /// Copy of the crossing journal.
    pub fn journal(&self) -> Vec<Crossing> {
        self.state().journal.clone()
    }

    /// Drains the crossing journal.
    pub fn take_journal(&self) -> Vec<Crossing> {
        std::mem::take(&mut self.state().journal)
    }

    fn record(&self, crossing: Crossing) -> MutexGuard<'_, HeapState> {
        let mut state = self.state();
        state.journal.push(crossing);
        state
    }
}

impl MirrorFactory for ScriptHeap {
    type Mirror = MirrorHandle;

    fn create_null(&mut self) -> MirrorHandle {
        self.record(Crossing::CreateNull).alloc(HeapValue::Null)
    }

    fn create_bool(&mut self, value: bool) -> MirrorHandle {
        self.record(Crossing::CreateBool).alloc(HeapValue::Bool(value))
    }

    fn create_int(&mut self, value: i64) -> MirrorHandle {
        self.record(Crossing::CreateInt).alloc(HeapValue::Int(value))
    }

    fn try_create_basic(&mut self, value: &HostValue) -> Option<MirrorHandle> {
        let mut state = self.record(Crossing::CreateBasic);
        let primitive = match value {
            HostValue::Null => HeapValue::Null,
            HostValue::Bool(b) => HeapValue::Bool(*b),
            HostValue::Int(i) => HeapValue::Int(*i),
            HostValue::Number(n) => HeapValue::Number(*n),
            HostValue::Str(s) => HeapValue::Str(s.clone()),
            HostValue::Date(ms) => HeapValue::Date(*ms),
            HostValue::Enum(_) | HostValue::Ref(_) => return None,
        };
        Some(state.alloc(primitive))
    }

    fn create_enum(&mut self, value: &EnumValue) -> MirrorHandle {
        self.record(Crossing::CreateEnum)
            .alloc(HeapValue::Enum(value.clone()))
    }

    fn create_object(&mut self, _blank: bool) -> MirrorHandle {
        self.record(Crossing::CreateObject)
            .alloc(HeapValue::Object(BTreeMap::new()))
    }

    fn create_objects(&mut self, _blank: bool, count: usize) -> Vec<MirrorHandle> {
        let mut state = self.record(Crossing::CreateObjects(count));
        (0..count)
            .map(|_| state.alloc(HeapValue::Object(BTreeMap::new())))
            .collect()
    }

    fn create_arrays(&mut self, count: usize) -> Vec<MirrorHandle> {
        let mut state = self.record(Crossing::CreateArrays(count));
        (0..count)
            .map(|_| state.alloc(HeapValue::Array(Vec::new())))
            .collect()
    }

    fn set_value(&mut self, container: &MirrorHandle, name: &str, value: MirrorHandle) {
        self.record(Crossing::SetValue(name.to_owned()))
            .set_field(*container, name, value);
    }
}

impl BulkUpdater for ScriptHeap {
    type Mirror = MirrorHandle;

    fn bulk_update_property(&mut self, updates: &[PropertyUpdate<MirrorHandle>]) {
        let entries: Vec<(MirrorHandle, &str, MirrorHandle)> = updates
            .iter()
            .flat_map(|u| {
                u.properties
                    .iter()
                    .map(move |(name, child)| (u.father, name.as_str(), *child))
            })
            .collect();

        let mut state = self.state();
        let max_batch = state.config.max_batch.max(1);
        for chunk in entries.chunks(max_batch) {
            state.journal.push(Crossing::UpdateProperties {
                fathers: distinct_fathers(chunk.iter().map(|e| e.0)),
                entries: chunk.len(),
            });
            for (father, name, child) in chunk {
                state.set_field(*father, name, *child);
            }
        }
    }

    fn bulk_update_array(&mut self, updates: &[ArrayUpdate<MirrorHandle>]) {
        let entries: Vec<(MirrorHandle, usize, MirrorHandle)> = updates
            .iter()
            .flat_map(|u| {
                u.items
                    .iter()
                    .enumerate()
                    .map(move |(index, child)| (u.father, index, *child))
            })
            .collect();

        let mut state = self.state();
        let max_batch = state.config.max_batch.max(1);
        for chunk in entries.chunks(max_batch) {
            state.journal.push(Crossing::UpdateArrays {
                fathers: distinct_fathers(chunk.iter().map(|e| e.0)),
                entries: chunk.len(),
            });
            for (father, index, child) in chunk {
                state.set_element(*father, *index, *child);
            }
        }
    }
}

/// Counts runs of equal fathers; entries are grouped per father upstream.
fn distinct_fathers(fathers: impl Iterator<Item = MirrorHandle>) -> usize {
    let mut count = 0;
    let mut last = None;
    for father in fathers {
        if last != Some(father) {
            count += 1;
            last = Some(father);
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_updates_split_by_max_batch() {
        let mut heap = ScriptHeap::new(HeapConfig { max_batch: 2 });
        let seq = heap.create_arrays(1)[0];
        let items: Vec<_> = (0..5).map(|i| heap.create_int(i)).collect();
        heap.take_journal();

        heap.bulk_update_array(&[ArrayUpdate {
            father: seq,
            items: items.clone(),
        }]);

        assert_eq!(
            heap.journal(),
            vec![
                Crossing::UpdateArrays {
                    fathers: 1,
                    entries: 2
                },
                Crossing::UpdateArrays {
                    fathers: 1,
                    entries: 2
                },
                Crossing::UpdateArrays {
                    fathers: 1,
                    entries: 1
                },
            ]
        );
        for (i, item) in items.iter().enumerate() {
            assert_eq!(heap.element(seq, i), Some(*item));
        }
    }

    #[test]
    fn property_chunk_counts_fathers() {
        let mut heap = ScriptHeap::default();
        let objs = heap.create_objects(true, 2);
        let v = heap.create_bool(true);
        heap.take_journal();
        heap.bulk_update_property(&[
            PropertyUpdate {
                father: objs[0],
                properties: vec![("a".into(), v), ("b".into(), v)],
            },
            PropertyUpdate {
                father: objs[1],
                properties: vec![("c".into(), v)],
            },
        ]);
        assert_eq!(
            heap.take_journal(),
            vec![Crossing::UpdateProperties {
                fathers: 2,
                entries: 3
            }]
        );
        assert_eq!(heap.property(objs[0], "b"), Some(v));
        assert_eq!(heap.property(objs[1], "c"), Some(v));
        assert_eq!(heap.property(objs[1], "a"), None);
    }

    #[test]
    fn refs_and_enums_have_no_primitive_form() {
        let mut heap = ScriptHeap::default();
        assert!(heap
            .try_create_basic(&HostValue::Ref(glue_core::HostRef(1)))
            .is_none());
        assert!(heap
            .try_create_basic(&HostValue::Enum(EnumValue::new("E", "A", 0)))
            .is_none());
        assert_eq!(heap.crossings(), 2);
        assert!(heap.is_empty());
    }

    #[test]
    fn zero_max_batch_is_treated_as_one() {
        let mut heap = ScriptHeap::new(HeapConfig { max_batch: 0 });
        let obj = heap.create_object(true);
        let v = heap.create_null();
        heap.take_journal();
        heap.bulk_update_property(&[PropertyUpdate {
            father: obj,
            properties: vec![("x".into(), v), ("y".into(), v)],
        }]);
        assert_eq!(heap.crossings(), 2);
    }
}
