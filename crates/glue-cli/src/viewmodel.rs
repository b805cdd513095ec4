// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON view model to glue graph.
//!
//! Plain JSON maps onto object, array, and basic nodes. A few single-key
//! objects are markers:
//!
//! - `{"$enum": "Type.Name", "$ordinal": n}` is an enum (`$ordinal` optional)
//! - `{"$date": millis}` is a date
//! - `{"$command": can_execute}` is a command
//! - `{"$ref": "id"}` points at the object carrying `"$id": "id"`
//!
//! `$id`/`$ref` let a document express shared and cyclic structure. Only
//! plain objects may carry a `$id`, and it must be a string. A marker with
//! any key beyond its payload is rejected rather than partly ingested.
use std::collections::HashMap;

use glue_core::{EnumValue, GlueGraph, GlueId, GraphError, HostRef, HostValue};
use serde_json::{Map, Value};
use thiserror::Error;

const ID: &str = "$id";
const ORDINAL: &str = "$ordinal";
const MARKERS: [&str; 4] = ["$ref", "$enum", "$date", "$command"];

/// Error returned by [`ingest`].
#[derive(Debug, Error)]
pub enum IngestError {
    /// `$ref` names an id no object declares.
    #[error("unknown $ref `{0}`")]
    UnknownRef(String),
    /// Two objects declare the same `$id`.
    #[error("duplicate $id `{0}`")]
    DuplicateId(String),
    /// A marker object has a malformed payload or extra keys.
    #[error("malformed `{0}` marker")]
    BadMarker(&'static str),
    /// Graph assembly failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Builds a glue graph from `doc`. The document's top value becomes the
/// graph root.
pub fn ingest<M>(doc: &Value) -> Result<GlueGraph<M>, IngestError> {
    let mut ingester = Ingester {
        graph: GlueGraph::new(),
        named: HashMap::new(),
        next_ref: 0,
    };
    ingester.declare(doc)?;
    let root = ingester.node(doc)?;
    ingester.graph.set_root(root)?;
    Ok(ingester.graph)
}

/// The marker key present in `map`, if any.
fn marker_key(map: &Map<String, Value>) -> Option<&'static str> {
    MARKERS.into_iter().find(|key| map.contains_key(*key))
}

struct Ingester<M> {
    graph: GlueGraph<M>,
    named: HashMap<String, GlueId>,
    next_ref: u64,
}

impl<M> Ingester<M> {
    fn host_ref(&mut self) -> HostValue {
        self.next_ref += 1;
        HostValue::Ref(HostRef(self.next_ref))
    }

    /// Pre-allocates every `$id` object so `$ref`s can point forward.
    fn declare(&mut self, value: &Value) -> Result<(), IngestError> {
        match value {
            Value::Array(items) => items.iter().try_for_each(|item| self.declare(item)),
            Value::Object(map) => {
                if let Some(id) = map.get(ID) {
                    let id = id.as_str().ok_or(IngestError::BadMarker(ID))?;
                    if marker_key(map).is_some() {
                        return Err(IngestError::BadMarker(ID));
                    }
                    let host = self.host_ref();
                    let node = self.graph.add_object(host);
                    if self.named.insert(id.to_owned(), node).is_some() {
                        return Err(IngestError::DuplicateId(id.to_owned()));
                    }
                }
                map.values().try_for_each(|v| self.declare(v))
            }
            _ => Ok(()),
        }
    }

    fn node(&mut self, value: &Value) -> Result<GlueId, IngestError> {
        Ok(match value {
            Value::Null => self.graph.add_basic(HostValue::Null),
            Value::Bool(b) => self.graph.add_basic(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => self.graph.add_basic(i),
                None => self.graph.add_basic(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => self.graph.add_basic(s.as_str()),
            Value::Array(items) => {
                let host = self.host_ref();
                let array = self.graph.add_array(host);
                for item in items {
                    let child = self.node(item)?;
                    self.graph.push_item(array, child)?;
                }
                array
            }
            Value::Object(map) => match marker_key(map) {
                Some(key) => self.marker(key, map)?,
                None => self.object(map)?,
            },
        })
    }

    fn marker(
        &mut self,
        key: &'static str,
        map: &Map<String, Value>,
    ) -> Result<GlueId, IngestError> {
        let extra = map
            .keys()
            .any(|k| k != key && !(key == "$enum" && k == ORDINAL));
        let payload = match map.get(key) {
            Some(payload) if !extra => payload,
            _ => return Err(IngestError::BadMarker(key)),
        };
        match key {
            "$ref" => {
                let name = payload.as_str().ok_or(IngestError::BadMarker(key))?;
                self.named
                    .get(name)
                    .copied()
                    .ok_or_else(|| IngestError::UnknownRef(name.to_owned()))
            }
            "$enum" => {
                let (type_name, name) = payload
                    .as_str()
                    .and_then(|qualified| qualified.rsplit_once('.'))
                    .ok_or(IngestError::BadMarker(key))?;
                let ordinal = match map.get(ORDINAL) {
                    None => 0,
                    Some(v) => v.as_i64().ok_or(IngestError::BadMarker(ORDINAL))?,
                };
                Ok(self.graph.add_enum(EnumValue::new(type_name, name, ordinal)))
            }
            "$date" => {
                let millis = payload.as_i64().ok_or(IngestError::BadMarker(key))?;
                Ok(self.graph.add_basic(HostValue::Date(millis)))
            }
            _ => {
                let can_execute = payload.as_bool().ok_or(IngestError::BadMarker(key))?;
                let host = self.host_ref();
                Ok(self.graph.add_command(host, can_execute))
            }
        }
    }

    fn object(&mut self, map: &Map<String, Value>) -> Result<GlueId, IngestError> {
        if map.contains_key(ORDINAL) {
            return Err(IngestError::BadMarker(ORDINAL));
        }
        let declared = map
            .get(ID)
            .and_then(Value::as_str)
            .and_then(|id| self.named.get(id).copied());
        let object = match declared {
            Some(object) => object,
            None => {
                let host = self.host_ref();
                self.graph.add_object(host)
            }
        };
        for (name, value) in map.iter().filter(|(name, _)| name.as_str() != ID) {
            let child = self.node(value)?;
            self.graph.set_property(object, name.as_str(), child)?;
        }
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glue_core::GlueKind;
    use serde_json::json;

    fn kind(graph: &GlueGraph<()>, id: GlueId) -> GlueKind {
        graph.node(id).unwrap().kind().clone()
    }

    fn ingest_root(doc: &Value) -> (GlueGraph<()>, GlueId) {
        let graph = ingest::<()>(doc).unwrap();
        let root = graph.root().unwrap();
        (graph, root)
    }

    #[test]
    fn plain_json_maps_to_objects_arrays_and_basics() {
        let (graph, root) =
            ingest_root(&json!({ "Name": "Ann", "Tags": ["a", "b"], "Age": 3.5 }));
        let GlueKind::Object { properties } = kind(&graph, root) else {
            panic!("root should be an object");
        };
        assert_eq!(properties.len(), 3);
        assert!(matches!(
            kind(&graph, properties["Tags"]),
            GlueKind::Array { items } if items.len() == 2
        ));
        assert_eq!(
            graph.node(properties["Age"]).unwrap().host(),
            &HostValue::Number(3.5)
        );
        assert_eq!(graph.len(), 6);
    }

    #[test]
    fn markers_become_enum_date_and_command_nodes() {
        let (graph, root) = ingest_root(&json!([
            { "$enum": "Color.Red", "$ordinal": 2 },
            { "$date": 1000 },
            { "$command": true },
        ]));
        let GlueKind::Array { items } = kind(&graph, root) else {
            panic!("root should be an array");
        };
        assert_eq!(
            graph.node(items[0]).unwrap().host(),
            &HostValue::Enum(EnumValue::new("Color", "Red", 2))
        );
        assert_eq!(graph.node(items[1]).unwrap().host(), &HostValue::Date(1000));
        assert_eq!(
            kind(&graph, items[2]),
            GlueKind::Command { can_execute: true }
        );
    }

    #[test]
    fn refs_resolve_forward_and_cyclically() {
        let (graph, root) = ingest_root(&json!({
            "first": { "$ref": "b" },
            "second": { "$id": "b", "back": { "$ref": "b" } },
        }));
        let GlueKind::Object { properties } = kind(&graph, root) else {
            panic!("root should be an object");
        };
        let b = properties["first"];
        assert_eq!(properties["second"], b);
        let GlueKind::Object { properties: inner } = kind(&graph, b) else {
            panic!("b should be an object");
        };
        assert_eq!(inner["back"], b);
        assert!(!inner.contains_key("$id"));
    }

    #[test]
    fn bad_documents_are_rejected() {
        assert!(matches!(
            ingest::<()>(&json!({ "x": { "$ref": "nope" } })),
            Err(IngestError::UnknownRef(name)) if name == "nope"
        ));
        assert!(matches!(
            ingest::<()>(&json!([{ "$id": "a" }, { "$id": "a" }])),
            Err(IngestError::DuplicateId(_))
        ));
        assert!(matches!(
            ingest::<()>(&json!({ "$enum": "NoDot" })),
            Err(IngestError::BadMarker("$enum"))
        ));
    }

    #[test]
    fn markers_with_extra_keys_are_rejected() {
        for (doc, marker) in [
            (json!({ "$command": true, "Label": "Save" }), "$command"),
            (json!({ "$date": 5, "tz": "UTC" }), "$date"),
            (json!({ "$enum": "E.A", "$ordinal": 1, "x": 0 }), "$enum"),
            (json!({ "a": { "$id": "a" }, "b": { "$ref": "a", "y": 1 } }), "$ref"),
        ] {
            assert!(
                matches!(ingest::<()>(&doc), Err(IngestError::BadMarker(m)) if m == marker),
                "{doc} should be rejected as a `{marker}` marker"
            );
        }
    }

    #[test]
    fn id_on_a_marker_is_rejected() {
        let doc = json!({ "a": { "$id": "x", "$enum": "E.A" }, "b": { "$ref": "x" } });
        assert!(matches!(
            ingest::<()>(&doc),
            Err(IngestError::BadMarker("$id"))
        ));
    }

    #[test]
    fn non_string_id_is_rejected() {
        assert!(matches!(
            ingest::<()>(&json!({ "$id": 7, "Name": "Ann" })),
            Err(IngestError::BadMarker("$id"))
        ));
    }

    #[test]
    fn stray_ordinal_is_rejected() {
        assert!(matches!(
            ingest::<()>(&json!({ "$ordinal": 3 })),
            Err(IngestError::BadMarker("$ordinal"))
        ));
    }
}
