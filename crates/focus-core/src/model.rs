//! Bot-side task and user-state model.
//!
//! These are the typed records the conversation handlers and the reminder
//! scheduler work with. The sync store keeps its own open-schema view —
//! web-app payloads carry fields this model does not know about.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A single step of a task, sized in Pomodoro sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub title: String,
    /// 25-minute work units. The web app calls this `estimatedPomodoros`.
    #[serde(alias = "estimatedPomodoros")]
    pub pomodoros: u32,
    #[serde(default)]
    pub completed: bool,
}

/// A user task: free-text description, opaque deadline, ordered subtasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub description: String,
    /// Never parsed — "next week" is as valid as an ISO date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    /// A task is incomplete while at least one subtask is not done.
    /// Tasks with no subtasks don't count — there is nothing left to do.
    pub fn is_incomplete(&self) -> bool {
        self.subtasks.iter().any(|s| !s.completed)
    }
}

/// Per-user conversational state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub total_sessions: u32,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub joined_date: String,
    /// Task under construction in the dialogue, not yet saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task: Option<Task>,
}

fn default_level() -> u32 {
    1
}

impl Default for UserData {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            total_sessions: 0,
            level: 1,
            joined_date: Utc::now().to_rfc3339(),
            current_task: None,
        }
    }
}

impl UserData {
    /// Record a finished Pomodoro session. Level goes up every 10th session —
    /// this is the only place the level/sessions relationship is enforced.
    pub fn complete_session(&mut self) {
        self.total_sessions += 1;
        if self.total_sessions % 10 == 0 {
            self.level += 1;
        }
    }

    /// Tasks that still have unfinished subtasks.
    pub fn incomplete_tasks(&self) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| t.is_incomplete())
            .cloned()
            .collect()
    }
}

/// One decomposition result item, serialized the way the web app expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTaskEstimate {
    pub title: String,
    #[serde(rename = "estimatedPomodoros")]
    pub estimated_pomodoros: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_filter_matches_subtask_states() {
        let done = Task {
            description: "done".into(),
            deadline: None,
            subtasks: vec![Subtask {
                title: "a".into(),
                pomodoros: 1,
                completed: true,
            }],
        };
        let open = Task {
            description: "open".into(),
            deadline: None,
            subtasks: vec![Subtask {
                title: "b".into(),
                pomodoros: 1,
                completed: false,
            }],
        };
        let empty = Task {
            description: "empty".into(),
            deadline: None,
            subtasks: vec![],
        };

        let data = UserData {
            tasks: vec![done, open, empty],
            ..Default::default()
        };
        let incomplete = data.incomplete_tasks();
        assert_eq!(incomplete.len(), 1);
        assert_eq!(incomplete[0].description, "open");
    }

    #[test]
    fn test_level_up_every_tenth_session() {
        let mut data = UserData::default();
        for _ in 0..9 {
            data.complete_session();
        }
        assert_eq!(data.total_sessions, 9);
        assert_eq!(data.level, 1);

        data.complete_session();
        assert_eq!(data.total_sessions, 10);
        assert_eq!(data.level, 2);

        for _ in 0..10 {
            data.complete_session();
        }
        assert_eq!(data.level, 3);
    }

    #[test]
    fn test_subtask_accepts_webapp_field_name() {
        let s: Subtask =
            serde_json::from_str(r#"{"title":"Draft","estimatedPomodoros":3}"#).unwrap();
        assert_eq!(s.pomodoros, 3);
        assert!(!s.completed);
    }

    #[test]
    fn test_subtask_estimate_serializes_camel_case() {
        let e = SubTaskEstimate {
            title: "Research".into(),
            estimated_pomodoros: 2,
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["estimatedPomodoros"], 2);
        assert!(json.get("estimated_pomodoros").is_none());
    }
}
