//! Task decomposition: prompt construction and LLM reply parsing.
//!
//! The model is asked for strict JSON, but replies arrive wrapped in prose,
//! markdown fences, or half-followed instructions. Parsing is therefore
//! forgiving: direct parse first, then the outermost brace-delimited
//! substrings, and a fixed fallback plan when nothing valid survives.

use focus_core::message::ChatMessage;
use focus_core::model::SubTaskEstimate;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Pomodoro estimates are clamped into this range.
pub const MIN_POMODOROS: u32 = 1;
pub const MAX_POMODOROS: u32 = 12;

/// Build the fixed instruction-plus-data prompt for a decomposition request.
pub fn build_prompt(description: &str, deadline: Option<&str>) -> Vec<ChatMessage> {
    let system = "You are a productivity assistant. Break a large task into 3-7 subtasks. \
                  For each subtask add an integer estimatedPomodoros (25-minute sessions). \
                  Return strict JSON with no comments or extra text: \
                  {\"subTasks\":[{\"title\":\"...\", \"estimatedPomodoros\":2}, ...]}";
    let user = format!(
        "Task: {description}\nDeadline: {}\nReturn only JSON.",
        deadline.unwrap_or("not specified")
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

#[derive(Deserialize)]
struct RawPlan {
    #[serde(rename = "subTasks", default)]
    sub_tasks: Vec<RawSubTask>,
}

#[derive(Deserialize)]
struct RawSubTask {
    title: Option<String>,
    #[serde(rename = "estimatedPomodoros")]
    estimated_pomodoros: Option<Value>,
}

/// Parse a model reply into validated subtask estimates.
///
/// Returns an empty vector when the reply is unusable; callers substitute
/// [`fallback_plan`] in that case.
pub fn parse_subtasks(reply: &str) -> Vec<SubTaskEstimate> {
    for candidate in json_candidates(reply) {
        if let Ok(plan) = serde_json::from_str::<RawPlan>(candidate) {
            let subtasks = validate(plan);
            if !subtasks.is_empty() {
                return subtasks;
            }
        }
    }
    debug!("decompose: no usable subtasks in reply ({} bytes)", reply.len());
    Vec::new()
}

/// The fixed three-step plan substituted when parsing yields nothing.
pub fn fallback_plan() -> Vec<SubTaskEstimate> {
    vec![
        SubTaskEstimate {
            title: "Preparation".into(),
            estimated_pomodoros: 1,
        },
        SubTaskEstimate {
            title: "Main work".into(),
            estimated_pomodoros: 3,
        },
        SubTaskEstimate {
            title: "Wrap-up".into(),
            estimated_pomodoros: 1,
        },
    ]
}

/// JSON candidates: the full reply, then substrings delimited by the
/// outermost brace pair (covers prose-wrapped and fenced replies).
fn json_candidates(reply: &str) -> Vec<&str> {
    let mut candidates = vec![reply];
    if let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) {
        if start < end {
            candidates.push(&reply[start..=end]);
        }
    }
    candidates
}

fn validate(plan: RawPlan) -> Vec<SubTaskEstimate> {
    plan.sub_tasks
        .into_iter()
        .filter_map(|st| {
            let title = st.title.unwrap_or_default().trim().to_string();
            if title.is_empty() {
                return None;
            }
            Some(SubTaskEstimate {
                title,
                estimated_pomodoros: clamp_pomodoros(st.estimated_pomodoros.as_ref()),
            })
        })
        .collect()
}

/// Coerce an estimate to an integer in [`MIN_POMODOROS`, `MAX_POMODOROS`].
/// Missing or non-numeric values count as 1.
fn clamp_pomodoros(value: Option<&Value>) -> u32 {
    let est = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(1.0) as i64,
        Some(Value::String(s)) => s.trim().parse().unwrap_or(1),
        _ => 1,
    };
    est.clamp(MIN_POMODOROS as i64, MAX_POMODOROS as i64) as u32
}
