use focus_core::model::UserData;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::warn;

/// Where a user currently is in the bot dialogue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogueState {
    #[default]
    Idle,
    /// The bot asked for a task description.
    AwaitingTaskDescription,
    /// The bot asked for an optional deadline.
    AwaitingDeadline,
    /// The user is chatting with the AI assistant.
    AwaitingAiQuestion,
}

#[derive(Debug, Default)]
struct UserContext {
    state: DialogueState,
    data: Option<UserData>,
}

/// Per-user conversation context store.
///
/// Maps are mutated under a plain mutex and never held across an await —
/// the runtime is multi-threaded, so unguarded maps are not an option here.
#[derive(Debug, Default)]
pub struct ContextStore {
    users: Mutex<HashMap<i64, UserContext>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current user-data snapshot, if the user has any.
    pub fn get_data(&self, chat_id: i64) -> Option<UserData> {
        match self.users.lock() {
            Ok(users) => users.get(&chat_id).and_then(|c| c.data.clone()),
            Err(_) => {
                warn!("context store lock poisoned reading data for {chat_id}");
                None
            }
        }
    }

    /// Overwrite the user-data snapshot.
    pub fn set_data(&self, chat_id: i64, data: UserData) {
        if let Ok(mut users) = self.users.lock() {
            users.entry(chat_id).or_default().data = Some(data);
        }
    }

    /// Mutate the user's data in place, initializing defaults on first touch.
    /// Returns the resulting snapshot.
    pub fn update_data(&self, chat_id: i64, f: impl FnOnce(&mut UserData)) -> UserData {
        match self.users.lock() {
            Ok(mut users) => {
                let ctx = users.entry(chat_id).or_default();
                let data = ctx.data.get_or_insert_with(UserData::default);
                f(data);
                data.clone()
            }
            Err(_) => {
                warn!("context store lock poisoned updating data for {chat_id}");
                let mut data = UserData::default();
                f(&mut data);
                data
            }
        }
    }

    pub fn get_state(&self, chat_id: i64) -> DialogueState {
        match self.users.lock() {
            Ok(users) => users.get(&chat_id).map(|c| c.state).unwrap_or_default(),
            Err(_) => DialogueState::Idle,
        }
    }

    pub fn set_state(&self, chat_id: i64, state: DialogueState) {
        if let Ok(mut users) = self.users.lock() {
            users.entry(chat_id).or_default().state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_core::model::{Subtask, Task};

    #[test]
    fn test_unknown_user_has_no_data_and_idle_state() {
        let store = ContextStore::new();
        assert!(store.get_data(1).is_none());
        assert_eq!(store.get_state(1), DialogueState::Idle);
    }

    #[test]
    fn test_update_initializes_defaults() {
        let store = ContextStore::new();
        let snapshot = store.update_data(7, |d| d.complete_session());
        assert_eq!(snapshot.total_sessions, 1);
        assert_eq!(snapshot.level, 1);
        assert_eq!(store.get_data(7).unwrap().total_sessions, 1);
    }

    #[test]
    fn test_state_transitions_are_per_user() {
        let store = ContextStore::new();
        store.set_state(1, DialogueState::AwaitingTaskDescription);
        store.set_state(2, DialogueState::AwaitingAiQuestion);
        assert_eq!(store.get_state(1), DialogueState::AwaitingTaskDescription);
        assert_eq!(store.get_state(2), DialogueState::AwaitingAiQuestion);
        store.set_state(1, DialogueState::Idle);
        assert_eq!(store.get_state(1), DialogueState::Idle);
    }

    #[test]
    fn test_set_data_overwrites_snapshot() {
        let store = ContextStore::new();
        store.update_data(3, |d| {
            d.tasks.push(Task {
                description: "old".into(),
                deadline: None,
                subtasks: vec![Subtask {
                    title: "s".into(),
                    pomodoros: 1,
                    completed: false,
                }],
            })
        });

        let mut fresh = UserData::default();
        fresh.tasks.push(Task {
            description: "new".into(),
            ..Default::default()
        });
        store.set_data(3, fresh);

        let data = store.get_data(3).unwrap();
        assert_eq!(data.tasks.len(), 1);
        assert_eq!(data.tasks[0].description, "new");
    }
}
