// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON rendering of heap values for inspection.
use serde_json::{json, Map, Number, Value};

use crate::heap::{HeapState, HeapValue, MirrorHandle, ScriptHeap};

impl ScriptHeap {
    /// Renders the value graph under `handle` as JSON.
    ///
    /// Containers are expanded the first time they are reached; any later
    /// reference (shared or cyclic) renders as `{"$ref": <handle>}`. Dates and
    /// enums render as `{"$date": ms}` and `{"$enum": "Type.Name"}`.
    pub fn to_json(&self, handle: MirrorHandle) -> Value {
        let state = self.state();
        let mut seen = vec![false; state.values.len()];
        render(&state, handle, &mut seen)
    }
}

fn render(state: &HeapState, handle: MirrorHandle, seen: &mut [bool]) -> Value {
    let index = handle.0 as usize;
    let Some(value) = state.values.get(index) else {
        return Value::Null;
    };
    match value {
        HeapValue::Null => Value::Null,
        HeapValue::Bool(b) => Value::Bool(*b),
        HeapValue::Int(i) => Value::from(*i),
        HeapValue::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
        HeapValue::Str(s) => Value::String(s.clone()),
        HeapValue::Date(ms) => json!({ "$date": ms }),
        HeapValue::Enum(e) => json!({ "$enum": e.to_string() }),
        HeapValue::Object(_) | HeapValue::Array(_) if seen[index] => {
            json!({ "$ref": handle.0 })
        }
        HeapValue::Object(fields) => {
            seen[index] = true;
            let map: Map<String, Value> = fields
                .iter()
                .map(|(name, child)| (name.clone(), render(state, *child, seen)))
                .collect();
            Value::Object(map)
        }
        HeapValue::Array(items) => {
            seen[index] = true;
            Value::Array(
                items
                    .iter()
                    .map(|child| render(state, *child, seen))
                    .collect(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glue_core::{EnumValue, HostValue, MirrorFactory};

    #[test]
    fn cycles_render_as_refs() {
        let mut heap = ScriptHeap::default();
        let obj = heap.create_object(true);
        heap.set_value(&obj, "self", obj);
        let day = heap.try_create_basic(&HostValue::Date(86_400_000)).unwrap();
        heap.set_value(&obj, "day", day);
        let color = heap.create_enum(&EnumValue::new("Color", "Red", 0));
        heap.set_value(&obj, "color", color);

        assert_eq!(
            heap.to_json(obj),
            json!({
                "self": { "$ref": obj.0 },
                "day": { "$date": 86_400_000 },
                "color": { "$enum": "Color.Red" },
            })
        );
    }

    #[test]
    fn nan_renders_as_null() {
        let mut heap = ScriptHeap::default();
        let nan = heap.try_create_basic(&HostValue::Number(f64::NAN)).unwrap();
        assert_eq!(heap.to_json(nan), Value::Null);
        assert_eq!(heap.to_json(MirrorHandle(42)), Value::Null);
    }
}
