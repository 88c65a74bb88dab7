//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "FocusHelper".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_max_base_url() -> String {
    "https://botapi.max.ru".to_string()
}

pub fn default_assistant_models() -> Vec<String> {
    vec![
        "anthropic/claude-3-haiku".to_string(),
        "meta-llama/llama-3.2-3b-instruct".to_string(),
        "mistralai/mistral-7b-instruct".to_string(),
        "google/gemini-pro".to_string(),
    ]
}

pub fn default_lm_base_url() -> String {
    "http://127.0.0.1:1234/v1".to_string()
}

pub fn default_lm_model() -> String {
    "Qwen3-VL-4B-Instruct-Q4_K_M".to_string()
}

pub fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_api_port() -> u16 {
    8000
}

pub fn default_allowed_origin() -> String {
    "*".to_string()
}

pub fn default_reminder_hour() -> u32 {
    9
}

pub fn default_reminder_minute() -> u32 {
    0
}

pub fn default_poll_interval() -> u64 {
    60
}
