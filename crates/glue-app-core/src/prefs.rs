// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted preferences for synchronization runs.

use glue_heap::HeapConfig;
use serde::{Deserialize, Serialize};

/// Key under which [`SyncPrefs`] are stored.
pub const SYNC_PREFS_KEY: &str = "sync_prefs";

/// Saved preferences for the glue tools.
///
/// Missing fields fall back to their defaults so older documents keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncPrefs {
    /// Script heap tuning, stored inline (`max_batch`).
    #[serde(flatten)]
    pub heap: HeapConfig,
    /// Number of synchronization passes to run over the same graph.
    pub passes: usize,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for SyncPrefs {
    fn default() -> Self {
        Self {
            heap: HeapConfig::default(),
            passes: 1,
            log_filter: "warn".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_fill_defaults() {
        let prefs: SyncPrefs = serde_json::from_str(r#"{"max_batch": 8}"#).unwrap();
        assert_eq!(prefs.heap.max_batch, 8);
        assert_eq!(prefs.passes, 1);
        assert_eq!(prefs.log_filter, "warn");
    }

    #[test]
    fn heap_config_is_stored_inline() {
        let prefs = SyncPrefs {
            heap: HeapConfig { max_batch: 5 },
            passes: 3,
            ..SyncPrefs::default()
        };
        let raw = serde_json::to_value(&prefs).unwrap();
        assert_eq!(raw["max_batch"], 5);
        assert!(raw.get("heap").is_none());

        let back: SyncPrefs = serde_json::from_value(raw).unwrap();
        assert_eq!(back, prefs);
    }

    #[test]
    fn missing_max_batch_uses_heap_default() {
        let prefs: SyncPrefs = serde_json::from_str(r#"{"passes": 2}"#).unwrap();
        assert_eq!(prefs.heap, HeapConfig::default());
        assert_eq!(prefs.passes, 2);
    }
}
