//! Command and dialogue routing for incoming channel events.

use super::Gateway;
use focus_core::{
    error::FocusError,
    message::{ChatMessage, IncomingKind, IncomingMessage, OutgoingMessage},
    model::{Subtask, Task, UserData},
};
use focus_memory::DialogueState;
use focus_providers::decompose;
use focus_sync::SyncDelta;
use serde_json::Map;
use tracing::{info, warn};

const WELCOME_TEXT: &str = "\u{1f3af} Hi! I'm FocusHelper — your Pomodoro productivity buddy.\n\n\
    I can help you:\n\
    \u{2022} Break big tasks into steps\n\
    \u{2022} Focus in 25-minute sessions\n\
    \u{2022} Track progress and stay motivated\n\n\
    \u{23f0} Every morning at 9:00 I'll remind you about unfinished work.\n\n\
    \u{1f4a1} Send /help to see everything I can do.";

const HELP_TEXT: &str = "\u{1f4cb} FocusHelper commands:\n\n\
    /start - Start working with the bot\n\
    /task - Plan a new task\n\
    /tasks - Show your tasks and progress\n\
    /done - Log a finished Pomodoro session\n\
    /ai - Ask the smart assistant\n\
    /cancel - Leave the current dialogue\n\
    /test_reminder - Send the morning reminder now\n\
    /help or /menu - Show this menu";

const AI_INTRO: &str = "\u{1f916} Hi! I'm the smart assistant. Ask me anything and I'll try to help!\n\n\
    For example:\n\
    \u{2022} How do I plan my tasks better?\n\
    \u{2022} What is the Pomodoro technique?\n\
    \u{2022} How can I stay focused?\n\n\
    Send /cancel to leave the chat.";

const ASSISTANT_SYSTEM_PROMPT: &str = "You are a smart assistant inside the FocusHelper bot. \
    Help users with questions about productivity, task planning, the Pomodoro technique, \
    and related topics. Answer briefly and to the point.";

impl Gateway {
    /// Route one incoming event.
    pub(super) async fn handle(&self, msg: IncomingMessage) -> Result<(), FocusError> {
        match msg.kind {
            IncomingKind::BotStarted => self.on_bot_started(msg.chat_id).await,
            IncomingKind::Text => {
                let text = msg.text.trim().to_string();
                if let Some(command) = text.strip_prefix('/') {
                    self.on_command(msg.chat_id, command).await
                } else {
                    self.on_dialogue(msg.chat_id, &text).await
                }
            }
        }
    }

    /// Send a reply, treating a paused dialog as a non-event.
    async fn reply(&self, chat_id: i64, text: impl Into<String>) -> Result<(), FocusError> {
        match self
            .channel
            .send(OutgoingMessage {
                chat_id,
                text: text.into(),
            })
            .await
        {
            Ok(()) => Ok(()),
            Err(FocusError::RecipientUnreachable(e)) => {
                info!("dialog paused, reply dropped for {chat_id}: {e}");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Push the user's snapshot where the other components read it:
    /// the scheduler cache (reminder composition) and the sync store
    /// (stats only — conversational tasks carry no id to merge on).
    fn push_snapshot(&self, chat_id: i64, data: &UserData) {
        self.scheduler.update_cache(chat_id, data.clone());

        let mut stats = Map::new();
        stats.insert("totalSessions".into(), data.total_sessions.into());
        stats.insert("level".into(), data.level.into());
        if let Err(e) = self.sync.merge(
            chat_id,
            SyncDelta {
                stats: Some(stats),
                ..Default::default()
            },
        ) {
            warn!("sync push failed for {chat_id}: {e}");
        }
    }

    async fn on_bot_started(&self, chat_id: i64) -> Result<(), FocusError> {
        self.scheduler.register(chat_id, Some(self.contexts.clone()));
        self.reply(chat_id, WELCOME_TEXT).await
    }

    async fn on_command(&self, chat_id: i64, command: &str) -> Result<(), FocusError> {
        let name = command.split_whitespace().next().unwrap_or("");
        info!("command /{name} from {chat_id}");

        match name {
            "start" => {
                self.scheduler.register(chat_id, Some(self.contexts.clone()));
                let data = self.contexts.update_data(chat_id, |_| {});
                self.push_snapshot(chat_id, &data);
                self.contexts.set_state(chat_id, DialogueState::Idle);
                self.reply(chat_id, WELCOME_TEXT).await
            }
            "help" | "menu" => self.reply(chat_id, HELP_TEXT).await,
            "task" => {
                self.contexts
                    .set_state(chat_id, DialogueState::AwaitingTaskDescription);
                self.reply(
                    chat_id,
                    "Describe your task in one message.\n\n\
                     For example: 'Prepare for the economics exam'",
                )
                .await
            }
            "tasks" => {
                let data = self.contexts.get_data(chat_id).unwrap_or_default();
                self.reply(chat_id, render_task_list(&data)).await
            }
            "done" => {
                let data = self.contexts.update_data(chat_id, UserData::complete_session);
                self.push_snapshot(chat_id, &data);
                let text = if data.total_sessions % 10 == 0 {
                    format!(
                        "\u{1f389} Session finished! You reached level {} — keep it up!",
                        data.level
                    )
                } else {
                    format!(
                        "\u{1f389} Session finished! +10 XP\n\n\
                         Total sessions: {}. Take a break and continue!",
                        data.total_sessions
                    )
                };
                self.reply(chat_id, text).await
            }
            "ai" => {
                self.contexts
                    .set_state(chat_id, DialogueState::AwaitingAiQuestion);
                self.reply(chat_id, AI_INTRO).await
            }
            "cancel" => {
                self.contexts.set_state(chat_id, DialogueState::Idle);
                self.reply(chat_id, "Okay, dialogue cancelled. Send /help for the menu.")
                    .await
            }
            "test_reminder" => {
                self.scheduler.register(chat_id, Some(self.contexts.clone()));
                if let Some(data) = self.contexts.get_data(chat_id) {
                    self.scheduler.update_cache(chat_id, data);
                }
                self.scheduler.send_daily_reminder(chat_id).await;
                self.reply(chat_id, "\u{2705} Morning reminder sent!").await
            }
            other => {
                info!("unknown command /{other} from {chat_id}");
                self.reply(chat_id, "I don't know that command. Send /help for the menu.")
                    .await
            }
        }
    }

    async fn on_dialogue(&self, chat_id: i64, text: &str) -> Result<(), FocusError> {
        match self.contexts.get_state(chat_id) {
            DialogueState::AwaitingTaskDescription => {
                self.contexts.update_data(chat_id, |data| {
                    data.current_task = Some(Task {
                        description: text.to_string(),
                        ..Default::default()
                    });
                });
                self.contexts
                    .set_state(chat_id, DialogueState::AwaitingDeadline);
                self.reply(
                    chat_id,
                    format!(
                        "Task: {text}\n\n\
                         When is it due? Reply with a deadline \
                         (e.g. 'in a week' or 'December 15'), or send - to skip."
                    ),
                )
                .await
            }
            DialogueState::AwaitingDeadline => {
                let deadline = match text {
                    "-" => None,
                    other => Some(other.to_string()),
                };
                self.finish_task_dialogue(chat_id, deadline).await
            }
            DialogueState::AwaitingAiQuestion => self.answer_question(chat_id, text).await,
            DialogueState::Idle => {
                self.reply(
                    chat_id,
                    "Send /task to plan something, or /help to see what I can do.",
                )
                .await
            }
        }
    }

    /// Deadline captured — decompose the task, save it, show the plan.
    async fn finish_task_dialogue(
        &self,
        chat_id: i64,
        deadline: Option<String>,
    ) -> Result<(), FocusError> {
        let Some(mut task) = self
            .contexts
            .get_data(chat_id)
            .and_then(|d| d.current_task)
        else {
            // Deadline arrived without a described task — dialogue state
            // got out of step, restart cleanly.
            self.contexts.set_state(chat_id, DialogueState::Idle);
            return self
                .reply(chat_id, "Let's start over — send /task to plan a task.")
                .await;
        };
        task.deadline = deadline;

        let plan = self.decompose_task(&task).await;
        task.subtasks = plan
            .iter()
            .map(|s| Subtask {
                title: s.title.clone(),
                pomodoros: s.estimated_pomodoros,
                completed: false,
            })
            .collect();

        let data = self.contexts.update_data(chat_id, |data| {
            data.tasks.push(task.clone());
            data.current_task = None;
        });
        self.contexts.set_state(chat_id, DialogueState::Idle);
        self.push_snapshot(chat_id, &data);

        let steps: Vec<String> = task
            .subtasks
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {} — {} Pomodoro(s)", i + 1, s.title, s.pomodoros))
            .collect();
        self.reply(
            chat_id,
            format!(
                "\u{1f9e0} Plan ready!\n\n{}\n\n\
                 \u{2705} Saved to your tasks. Send /done after each finished session!",
                steps.join("\n")
            ),
        )
        .await
    }

    /// Ask the decomposition backend for a plan; any failure falls back to
    /// the fixed plan so the dialogue always completes.
    async fn decompose_task(&self, task: &Task) -> Vec<focus_core::model::SubTaskEstimate> {
        let messages = decompose::build_prompt(&task.description, task.deadline.as_deref());
        match self.decomposer.complete(&messages).await {
            Ok(reply) => {
                let parsed = decompose::parse_subtasks(&reply);
                if parsed.is_empty() {
                    info!("decomposition reply unusable, using fallback plan");
                    decompose::fallback_plan()
                } else {
                    parsed
                }
            }
            Err(e) => {
                warn!("decomposition backend failed, using fallback plan: {e}");
                decompose::fallback_plan()
            }
        }
    }

    async fn answer_question(&self, chat_id: i64, question: &str) -> Result<(), FocusError> {
        if question.is_empty() {
            return self.reply(chat_id, "Please ask your question as text.").await;
        }

        self.reply(chat_id, "\u{1f914} Thinking...").await?;

        let messages = vec![
            ChatMessage::system(ASSISTANT_SYSTEM_PROMPT),
            ChatMessage::user(question),
        ];
        let answer = match self.assistant.complete(&messages).await {
            Ok(text) => text,
            Err(e) => {
                warn!("assistant failed for {chat_id}: {e}");
                "\u{274c} Couldn't reach the AI right now. All models are busy or \
                 unavailable — please try again later."
                    .to_string()
            }
        };
        self.reply(chat_id, answer).await
    }
}

/// Render the task list with per-task subtask progress.
fn render_task_list(data: &UserData) -> String {
    if data.tasks.is_empty() {
        return "No tasks yet. Send /task to plan your first one!".to_string();
    }

    let lines: Vec<String> = data
        .tasks
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let done = t.subtasks.iter().filter(|s| s.completed).count();
            let desc = if t.description.trim().is_empty() {
                "Untitled task"
            } else {
                t.description.trim()
            };
            let deadline = t
                .deadline
                .as_deref()
                .map(|d| format!(" (due: {d})"))
                .unwrap_or_default();
            format!(
                "{}. {desc}{deadline} — {done}/{} steps done",
                i + 1,
                t.subtasks.len()
            )
        })
        .collect();

    format!(
        "\u{1f4cb} Your tasks:\n\n{}\n\n\
         Level {} | {} sessions completed",
        lines.join("\n"),
        data.level,
        data.total_sessions
    )
}
