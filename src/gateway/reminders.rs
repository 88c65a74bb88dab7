//! Daily reminder scheduling and delivery.
//!
//! One state holder owns the active-user set, the per-user task snapshot
//! cache, and a per-user last-reminded date. The date marker is the dedup
//! mechanism: a user gets at most one delivery attempt per local date, no
//! matter how long a cycle takes or how often the loop ticks.

use chrono::{NaiveDateTime, NaiveTime};
use focus_core::{
    config::SchedulerConfig,
    error::FocusError,
    message::OutgoingMessage,
    model::{Task, UserData},
    traits::Channel,
};
use focus_memory::ContextStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// How many task descriptions a reminder lists before truncating.
const REMINDER_TASK_LIMIT: usize = 5;

/// Per-user registration state.
#[derive(Default)]
struct Registration {
    active: bool,
    context: Option<Arc<ContextStore>>,
    cache: Option<UserData>,
    last_reminded: Option<chrono::NaiveDate>,
}

/// Daily reminder scheduler.
///
/// All maps sit behind one mutex that is never held across an await;
/// channel sends happen outside the lock.
pub struct ReminderScheduler {
    channel: Arc<dyn Channel>,
    target: NaiveTime,
    poll_interval_secs: u64,
    running: AtomicBool,
    users: Mutex<HashMap<i64, Registration>>,
}

impl ReminderScheduler {
    pub fn new(channel: Arc<dyn Channel>, config: &SchedulerConfig) -> Self {
        let target = NaiveTime::from_hms_opt(config.reminder_hour, config.reminder_minute, 0)
            .unwrap_or_else(|| {
                warn!(
                    "invalid reminder time {:02}:{:02}, falling back to 09:00",
                    config.reminder_hour, config.reminder_minute
                );
                NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
            });
        Self {
            channel,
            target,
            poll_interval_secs: config.poll_interval_secs,
            running: AtomicBool::new(false),
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Add a user to the reminder list. Safe to call repeatedly; a supplied
    /// context handle overwrites the stored one.
    pub fn register(&self, chat_id: i64, context: Option<Arc<ContextStore>>) {
        if let Ok(mut users) = self.users.lock() {
            let reg = users.entry(chat_id).or_default();
            reg.active = true;
            if let Some(ctx) = context {
                reg.context = Some(ctx);
            }
            info!("user {chat_id} registered for daily reminders");
        }
    }

    /// Remove a user from the active set and drop their context handle.
    /// The snapshot cache and date marker survive a re-register. No error
    /// if absent.
    pub fn unregister(&self, chat_id: i64) {
        if let Ok(mut users) = self.users.lock() {
            if let Some(reg) = users.get_mut(&chat_id) {
                reg.active = false;
                reg.context = None;
                info!("user {chat_id} removed from daily reminders");
            }
        }
    }

    /// Overwrite the cached snapshot for a user. Registration not required.
    pub fn update_cache(&self, chat_id: i64, data: UserData) {
        if let Ok(mut users) = self.users.lock() {
            users.entry(chat_id).or_default().cache = Some(data);
        }
    }

    /// Tasks with unfinished subtasks, resolved cache-first.
    ///
    /// Falls back to a live pull from the user's context store, refreshing
    /// the cache on success. A failed or absent pull yields an empty list —
    /// never an error.
    pub fn incomplete_tasks(&self, chat_id: i64) -> Vec<Task> {
        let (cached, context) = match self.users.lock() {
            Ok(users) => match users.get(&chat_id) {
                Some(reg) => (reg.cache.clone(), reg.context.clone()),
                None => (None, None),
            },
            Err(_) => {
                warn!("scheduler lock poisoned reading tasks for {chat_id}");
                (None, None)
            }
        };

        if let Some(data) = cached {
            return data.incomplete_tasks();
        }

        // Live pull, outside the scheduler lock.
        if let Some(ctx) = context {
            if let Some(data) = ctx.get_data(chat_id) {
                let tasks = data.incomplete_tasks();
                self.update_cache(chat_id, data);
                return tasks;
            }
            warn!("no context data for user {chat_id}, treating as no tasks");
        }

        Vec::new()
    }

    /// Compose and deliver the morning reminder for one user.
    ///
    /// Failures are logged and swallowed: a paused dialog is expected, any
    /// other delivery error is a per-user incident, and neither may affect
    /// the rest of the cycle.
    pub async fn send_daily_reminder(&self, chat_id: i64) {
        let tasks = self.incomplete_tasks(chat_id);
        let text = compose_reminder(&tasks);

        match self
            .channel
            .send(OutgoingMessage { chat_id, text })
            .await
        {
            Ok(()) => info!("morning reminder delivered to {chat_id}"),
            Err(FocusError::RecipientUnreachable(e)) => {
                info!("dialog paused, reminder skipped for {chat_id}: {e}");
            }
            Err(e) => error!("failed to deliver reminder to {chat_id}: {e}"),
        }
    }

    /// Users due a reminder at `now`: active, past the target time, and not
    /// yet reminded today.
    fn due_users(&self, now: NaiveDateTime) -> Vec<i64> {
        if now.time() < self.target {
            return Vec::new();
        }
        let today = now.date();
        match self.users.lock() {
            Ok(users) => {
                let mut due: Vec<i64> = users
                    .iter()
                    .filter(|(_, reg)| reg.active && reg.last_reminded != Some(today))
                    .map(|(id, _)| *id)
                    .collect();
                due.sort_unstable();
                due
            }
            Err(_) => {
                warn!("scheduler lock poisoned computing due users");
                Vec::new()
            }
        }
    }

    /// One scheduler tick at the given local time. Marks each due user as
    /// reminded before the send, so a slow or failing delivery still counts
    /// as that day's single attempt.
    pub async fn run_tick(&self, now: NaiveDateTime) {
        let due = self.due_users(now);
        if due.is_empty() {
            return;
        }

        info!("morning reminder cycle for {} user(s)", due.len());
        let today = now.date();

        for chat_id in due {
            if let Ok(mut users) = self.users.lock() {
                users.entry(chat_id).or_default().last_reminded = Some(today);
            }
            self.send_daily_reminder(chat_id).await;
        }
    }

    /// Spawn the reminder loop as a background task and return immediately.
    pub fn start(self: Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let scheduler = self;
        tokio::spawn(async move {
            info!(
                "daily reminder scheduler started (target {}, poll {}s)",
                scheduler.target, scheduler.poll_interval_secs
            );
            while scheduler.running.load(Ordering::SeqCst) {
                tokio::time::sleep(std::time::Duration::from_secs(
                    scheduler.poll_interval_secs,
                ))
                .await;
                let now = chrono::Local::now().naive_local();
                scheduler.run_tick(now).await;
            }
            info!("daily reminder scheduler stopped");
        });
    }

    /// Flip the running flag. The in-flight sleep finishes before the loop
    /// observes the flag; no new cycle starts after that.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Build the reminder text: up to the first five task descriptions plus a
/// count of the rest, or the no-pending-tasks variant.
fn compose_reminder(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "\u{1f305} Good morning!\n\n\
                Nothing is waiting on you — a great day to start something new.\n\n\
                \u{1f3af} Send /task to plan your next goal!"
            .to_string();
    }

    let mut lines: Vec<String> = tasks
        .iter()
        .take(REMINDER_TASK_LIMIT)
        .map(|t| {
            let desc = if t.description.trim().is_empty() {
                "Untitled task"
            } else {
                t.description.trim()
            };
            format!("\u{2022} {desc}")
        })
        .collect();
    if tasks.len() > REMINDER_TASK_LIMIT {
        lines.push(format!(
            "... and {} more",
            tasks.len() - REMINDER_TASK_LIMIT
        ));
    }

    format!(
        "\u{1f305} Good morning!\n\n\
         Check in — maybe there is unfinished work, or something new to start?\n\n\
         \u{1f4cb} Your unfinished tasks:\n{}\n\n\
         \u{1f3af} Send /tasks to pick one and focus!",
        lines.join("\n")
    )
}
