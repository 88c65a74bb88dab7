use super::*;

#[test]
fn test_config_defaults() {
    let cfg = Config::default();
    assert_eq!(cfg.bot.name, "FocusHelper");
    assert_eq!(cfg.bot.log_level, "info");
    assert_eq!(cfg.api.port, 8000);
    assert_eq!(cfg.api.allowed_origin, "*");
    assert_eq!(cfg.scheduler.reminder_hour, 9);
    assert_eq!(cfg.scheduler.reminder_minute, 0);
    assert_eq!(cfg.scheduler.poll_interval_secs, 60);
    assert!(cfg.channel.max.is_none());
}

#[test]
fn test_assistant_models_default_order() {
    let cfg = AssistantConfig::default();
    assert_eq!(cfg.models.len(), 4);
    assert_eq!(cfg.models[0], "anthropic/claude-3-haiku");
    assert_eq!(cfg.models[3], "google/gemini-pro");
}

#[test]
fn test_scheduler_config_from_toml() {
    let toml_str = r#"
        enabled = true
        reminder_hour = 7
        reminder_minute = 30
    "#;
    let sc: SchedulerConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(sc.reminder_hour, 7);
    assert_eq!(sc.reminder_minute, 30);
    assert_eq!(sc.poll_interval_secs, 60);
}

#[test]
fn test_max_config_defaults_when_fields_missing() {
    let toml_str = r#"
        bot_token = "secret"
    "#;
    let mc: MaxConfig = toml::from_str(toml_str).unwrap();
    assert!(mc.enabled);
    assert_eq!(mc.bot_token, "secret");
    assert_eq!(mc.base_url, "https://botapi.max.ru");
    assert!(mc.allowed_users.is_empty());
}

#[test]
fn test_full_config_from_toml() {
    let toml_str = r#"
        [bot]
        name = "TestBot"

        [channel.max]
        bot_token = "tok"
        allowed_users = [42]

        [lm]
        base_url = "https://tunnel.example.com/v1"

        [api]
        port = 9000
        allowed_origin = "https://webapp.example.com"
    "#;
    let cfg: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(cfg.bot.name, "TestBot");
    assert_eq!(cfg.bot.log_level, "info");
    let max = cfg.channel.max.unwrap();
    assert_eq!(max.allowed_users, vec![42]);
    assert_eq!(cfg.lm.base_url, "https://tunnel.example.com/v1");
    assert_eq!(cfg.lm.model, "Qwen3-VL-4B-Instruct-Q4_K_M");
    assert_eq!(cfg.api.port, 9000);
    assert_eq!(cfg.api.allowed_origin, "https://webapp.example.com");
    assert!(cfg.scheduler.enabled);
}
