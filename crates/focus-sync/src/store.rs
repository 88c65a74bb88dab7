use focus_core::error::FocusError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// The merged per-user record. Sections are open-schema: the web app owns
/// fields the bot has never heard of, and they must survive round trips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncRecord {
    #[serde(default)]
    pub settings: Map<String, Value>,
    #[serde(default)]
    pub tasks: Vec<Value>,
    #[serde(default)]
    pub stats: Map<String, Value>,
}

/// A partial update from one of the producers. A section that is `None`
/// was omitted from the payload and leaves the stored section untouched —
/// distinct from an empty section, which merges as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncDelta {
    pub settings: Option<Map<String, Value>>,
    pub tasks: Option<Vec<Value>>,
    pub stats: Option<Map<String, Value>>,
}

/// In-memory sync store keyed by user id.
///
/// One mutex guards the whole map; merges are computed in full before the
/// record is overwritten, so a failure never leaves a half-merged record.
#[derive(Debug, Default)]
pub struct SyncStore {
    records: Mutex<HashMap<i64, SyncRecord>>,
}

impl SyncStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a three-way field-independent merge and return the full record.
    ///
    /// Rules per section:
    /// - `settings`: shallow key-wise overwrite, missing keys preserved;
    /// - `tasks`: keyed by `"id"` — same id shallow-merges (incoming wins
    ///   per field), unseen tasks append, absent tasks are never deleted;
    /// - `stats`: numeric-vs-numeric keeps the maximum, anything else is
    ///   overwritten by the incoming value.
    pub fn merge(&self, user_id: i64, delta: SyncDelta) -> Result<SyncRecord, FocusError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| FocusError::Store(format!("sync store lock poisoned: {e}")))?;

        let mut merged = records.get(&user_id).cloned().unwrap_or_default();

        if let Some(settings) = delta.settings {
            merge_settings(&mut merged.settings, settings);
        }
        if let Some(tasks) = delta.tasks {
            merge_tasks(&mut merged.tasks, tasks);
        }
        if let Some(stats) = delta.stats {
            merge_stats(&mut merged.stats, stats);
        }

        records.insert(user_id, merged.clone());
        Ok(merged)
    }

    /// Current record for a user, or an all-empty record if never synced.
    pub fn read(&self, user_id: i64) -> Result<SyncRecord, FocusError> {
        let records = self
            .records
            .lock()
            .map_err(|e| FocusError::Store(format!("sync store lock poisoned: {e}")))?;
        Ok(records.get(&user_id).cloned().unwrap_or_default())
    }
}

/// Shallow key-wise overwrite: incoming keys replace, the rest stay.
fn merge_settings(existing: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        existing.insert(key, value);
    }
}

/// Id-keyed task merge. Existing tasks keep their relative order; tasks
/// with an unseen (or missing) id append in incoming order.
fn merge_tasks(existing: &mut Vec<Value>, incoming: Vec<Value>) {
    for task in incoming {
        let id = task.get("id").filter(|id| !id.is_null()).cloned();

        let position = id
            .as_ref()
            .and_then(|id| existing.iter().position(|t| t.get("id") == Some(id)));

        match position {
            Some(i) => merge_task_fields(&mut existing[i], task),
            None => existing.push(task),
        }
    }
}

/// Shallow field merge of one task: incoming wins per field. A non-object
/// on either side degrades to plain replacement.
fn merge_task_fields(current: &mut Value, incoming: Value) {
    match incoming {
        Value::Object(new_fields) if current.is_object() => {
            if let Some(fields) = current.as_object_mut() {
                for (key, value) in new_fields {
                    fields.insert(key, value);
                }
            }
        }
        other => *current = other,
    }
}

/// Key-wise stats merge. Counters are assumed monotonic: when both sides
/// are numeric the maximum wins; otherwise the incoming value replaces.
fn merge_stats(existing: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        // Ties keep the existing value, matching max() semantics.
        let keep_existing = matches!(
            (existing.get(&key).and_then(numeric), numeric(&value)),
            (Some(old), Some(new)) if old >= new
        );
        if !keep_existing {
            existing.insert(key, value);
        }
    }
}

fn numeric(value: &Value) -> Option<f64> {
    value.as_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            other => panic!("expected object, got {other}"),
        }
    }

    fn settings_delta(value: Value) -> SyncDelta {
        SyncDelta {
            settings: Some(obj(value)),
            ..Default::default()
        }
    }

    fn tasks_delta(value: Value) -> SyncDelta {
        match value {
            Value::Array(tasks) => SyncDelta {
                tasks: Some(tasks),
                ..Default::default()
            },
            other => panic!("expected array, got {other}"),
        }
    }

    fn stats_delta(value: Value) -> SyncDelta {
        SyncDelta {
            stats: Some(obj(value)),
            ..Default::default()
        }
    }

    #[test]
    fn test_read_never_seen_user_is_empty() {
        let store = SyncStore::new();
        let record = store.read(404).unwrap();
        assert!(record.settings.is_empty());
        assert!(record.tasks.is_empty());
        assert!(record.stats.is_empty());
    }

    #[test]
    fn test_settings_shallow_overwrite_preserves_missing_keys() {
        let store = SyncStore::new();
        store
            .merge(1, settings_delta(json!({"theme": "dark", "sound": true})))
            .unwrap();
        let record = store
            .merge(1, settings_delta(json!({"theme": "light"})))
            .unwrap();

        assert_eq!(record.settings["theme"], "light");
        assert_eq!(record.settings["sound"], true);
    }

    #[test]
    fn test_task_merge_by_id_incoming_wins_per_field() {
        let store = SyncStore::new();
        store
            .merge(
                1,
                tasks_delta(json!([
                    {"id": "a", "description": "Report", "progress": 0},
                    {"id": "b", "description": "Slides"}
                ])),
            )
            .unwrap();
        let record = store
            .merge(
                1,
                tasks_delta(json!([{"id": "a", "progress": 3}])),
            )
            .unwrap();

        // Task "a" keeps its untouched fields and its position.
        assert_eq!(record.tasks.len(), 2);
        assert_eq!(record.tasks[0]["id"], "a");
        assert_eq!(record.tasks[0]["description"], "Report");
        assert_eq!(record.tasks[0]["progress"], 3);
        // Task "b" was absent from the payload but is preserved.
        assert_eq!(record.tasks[1]["id"], "b");
    }

    #[test]
    fn test_task_merge_appends_new_ids_in_incoming_order() {
        let store = SyncStore::new();
        store
            .merge(1, tasks_delta(json!([{"id": 1, "description": "one"}])))
            .unwrap();
        let record = store
            .merge(
                1,
                tasks_delta(json!([
                    {"id": 3, "description": "three"},
                    {"id": 2, "description": "two"}
                ])),
            )
            .unwrap();

        let ids: Vec<i64> = record
            .tasks
            .iter()
            .map(|t| t["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn test_task_ids_never_dropped_across_merges() {
        let store = SyncStore::new();
        store
            .merge(1, tasks_delta(json!([{"id": "a"}, {"id": "b"}])))
            .unwrap();
        store
            .merge(1, tasks_delta(json!([{"id": "c"}])))
            .unwrap();
        store.merge(1, tasks_delta(json!([]))).unwrap();
        let record = store
            .merge(1, tasks_delta(json!([{"id": "b", "x": 1}])))
            .unwrap();

        let ids: Vec<&str> = record
            .tasks
            .iter()
            .map(|t| t["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_idless_tasks_append_as_new() {
        let store = SyncStore::new();
        store
            .merge(1, tasks_delta(json!([{"description": "first"}])))
            .unwrap();
        let record = store
            .merge(1, tasks_delta(json!([{"description": "second"}])))
            .unwrap();
        assert_eq!(record.tasks.len(), 2);
    }

    #[test]
    fn test_stats_numeric_max_wins() {
        let store = SyncStore::new();
        store
            .merge(1, stats_delta(json!({"totalSessions": 12, "streak": 4})))
            .unwrap();
        let record = store
            .merge(1, stats_delta(json!({"totalSessions": 7, "streak": 6})))
            .unwrap();

        assert_eq!(record.stats["totalSessions"], 12);
        assert_eq!(record.stats["streak"], 6);
    }

    #[test]
    fn test_stats_non_numeric_incoming_replaces() {
        let store = SyncStore::new();
        store
            .merge(1, stats_delta(json!({"badge": "bronze", "totalSessions": 5})))
            .unwrap();
        let record = store
            .merge(
                1,
                stats_delta(json!({"badge": "silver", "totalSessions": "reset"})),
            )
            .unwrap();

        assert_eq!(record.stats["badge"], "silver");
        // Non-numeric incoming replaces even a numeric existing value.
        assert_eq!(record.stats["totalSessions"], "reset");
    }

    #[test]
    fn test_stats_never_decrease_for_numeric_sequences() {
        let store = SyncStore::new();
        let pushes = [3, 9, 1, 9, 4];
        for v in pushes {
            store
                .merge(1, stats_delta(json!({"totalSessions": v})))
                .unwrap();
        }
        let record = store.read(1).unwrap();
        assert_eq!(record.stats["totalSessions"], 9);
    }

    #[test]
    fn test_omitted_sections_untouched() {
        let store = SyncStore::new();
        store
            .merge(1, settings_delta(json!({"theme": "dark"})))
            .unwrap();
        let record = store
            .merge(1, stats_delta(json!({"totalSessions": 1})))
            .unwrap();

        assert_eq!(record.settings["theme"], "dark");
        assert!(record.tasks.is_empty());
    }

    #[test]
    fn test_merge_sequence_equals_combined_effect() {
        // merge(A) then merge(B) must equal one merge carrying the
        // combined logical effect of A-then-B, per field.
        let a = SyncDelta {
            settings: Some(obj(json!({"theme": "dark", "sound": true}))),
            tasks: Some(vec![json!({"id": "t", "description": "Report", "done": false})]),
            stats: Some(obj(json!({"totalSessions": 5}))),
        };
        let b = SyncDelta {
            settings: Some(obj(json!({"theme": "light"}))),
            tasks: Some(vec![json!({"id": "t", "done": true})]),
            stats: Some(obj(json!({"totalSessions": 3}))),
        };
        let combined = SyncDelta {
            settings: Some(obj(json!({"theme": "light", "sound": true}))),
            tasks: Some(vec![json!({"id": "t", "description": "Report", "done": true})]),
            stats: Some(obj(json!({"totalSessions": 5}))),
        };

        let sequential = SyncStore::new();
        sequential.merge(1, a).unwrap();
        sequential.merge(1, b).unwrap();

        let oneshot = SyncStore::new();
        oneshot.merge(1, combined).unwrap();

        assert_eq!(sequential.read(1).unwrap(), oneshot.read(1).unwrap());
    }

    #[test]
    fn test_users_are_isolated() {
        let store = SyncStore::new();
        store
            .merge(1, settings_delta(json!({"theme": "dark"})))
            .unwrap();
        assert!(store.read(2).unwrap().settings.is_empty());
    }
}
