// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mirror factories that break the batch contract on purpose.

use glue_core::{EnumValue, HostValue, MirrorFactory};
use glue_heap::{MirrorHandle, ScriptHeap};

/// Forwards to a [`ScriptHeap`] but drops the last mirror of every
/// container batch.
#[derive(Debug, Clone, Default)]
pub struct ShortBatchFactory {
    heap: ScriptHeap,
}

impl ShortBatchFactory {
    /// Wrap `heap`.
    pub fn new(heap: ScriptHeap) -> Self {
        Self { heap }
    }
}

impl MirrorFactory for ShortBatchFactory {
    type Mirror = MirrorHandle;

    fn create_null(&mut self) -> MirrorHandle {
        self.heap.create_null()
    }

    fn create_bool(&mut self, value: bool) -> MirrorHandle {
        self.heap.create_bool(value)
    }

    fn create_int(&mut self, value: i64) -> MirrorHandle {
        self.heap.create_int(value)
    }

    fn try_create_basic(&mut self, value: &HostValue) -> Option<MirrorHandle> {
        self.heap.try_create_basic(value)
    }

    fn create_enum(&mut self, value: &EnumValue) -> MirrorHandle {
        self.heap.create_enum(value)
    }

    fn create_object(&mut self, blank: bool) -> MirrorHandle {
        self.heap.create_object(blank)
    }

    fn create_objects(&mut self, blank: bool, count: usize) -> Vec<MirrorHandle> {
        let mut batch = self.heap.create_objects(blank, count);
        batch.pop();
        batch
    }

    fn create_arrays(&mut self, count: usize) -> Vec<MirrorHandle> {
        let mut batch = self.heap.create_arrays(count);
        batch.pop();
        batch
    }

    fn set_value(&mut self, container: &MirrorHandle, name: &str, value: MirrorHandle) {
        self.heap.set_value(container, name, value);
    }
}
