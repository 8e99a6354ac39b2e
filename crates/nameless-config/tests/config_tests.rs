#[cfg(test)]
mod tests {
    use nameless_config::schema::*;
    use nameless_config::{SettingsCache, SettingsLoader};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    // ── Default tests ──────────────────────────────────────────

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.letta.base_url, "http://localhost:8283");
        assert!(settings.letta.api_key.is_none());
        assert!(settings.letta.password.is_none());
        assert!(settings.agent.agent_id.is_none());
        assert!(settings.bluesky.handle.is_none());
        assert!(settings.discord.bot_token.is_none());
        assert_eq!(settings.triggers.perch_interval_hours, 2);
        assert_eq!(settings.bluesky.service_url, "https://bsky.social");
        assert_eq!(settings.export.file_prefix, "nameless");
    }

    #[test]
    fn test_credential_prefers_api_key() {
        let mut letta = LettaConfig::default();
        assert!(letta.credential().is_none());
        letta.password = Some("pw".into());
        assert_eq!(letta.credential(), Some("pw"));
        letta.api_key = Some("key".into());
        assert_eq!(letta.credential(), Some("key"));
    }

    // ── TOML tests ─────────────────────────────────────────────

    #[test]
    fn test_partial_toml_applies_defaults() {
        let toml_str = r#"
[letta]
base_url = "https://api.letta.com"

[triggers]
perch_interval_hours = 6
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.letta.base_url, "https://api.letta.com");
        assert_eq!(settings.triggers.perch_interval_hours, 6);
        assert_eq!(settings.agent.max_iterations, 25);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_settings_toml_roundtrip() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let restored: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(restored.letta.base_url, settings.letta.base_url);
        assert_eq!(restored.agent.model, settings.agent.model);
    }

    // ── Environment overrides ──────────────────────────────────

    #[test]
    fn test_env_overrides_every_field() {
        let env = env_from(&[
            ("LETTA_BASE_URL", "http://letta:9000"),
            ("LETTA_API_KEY", "key-1"),
            ("LETTA_PASSWORD", "test-password"),
            ("NAMELESS_AGENT_ID", "agent-test-123"),
            ("NAMELESS_MODEL", "claude-opus-4-20250514"),
            ("NAMELESS_SYSTEM_PROMPT", "be brief"),
            ("NAMELESS_MAX_TOKENS", "1024"),
            ("NAMELESS_TEMPERATURE", "0.2"),
            ("NAMELESS_MAX_ITERATIONS", "5"),
            ("BLUESKY_HANDLE", "test.bsky.social"),
            ("BLUESKY_APP_PASSWORD", "app-pw"),
            ("BLUESKY_SERVICE_URL", "https://pds.example"),
            ("DISCORD_BOT_TOKEN", "discord-token"),
            ("DISCORD_GUILD_ID", "42"),
            ("PERCH_INTERVAL_HOURS", "4"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("ANTHROPIC_BASE_URL", "https://gateway.example"),
            ("NAMELESS_EXPORT_DIR", "/tmp/out"),
            ("NAMELESS_EXPORT_PREFIX", "backup"),
            ("NAMELESS_LOG_LEVEL", "debug"),
            ("NAMELESS_LOG_FORMAT", "json"),
        ]);
        let s = SettingsLoader::apply_env_overrides(Settings::default(), env);

        assert_eq!(s.letta.base_url, "http://letta:9000");
        assert_eq!(s.letta.api_key.as_deref(), Some("key-1"));
        assert_eq!(s.letta.password.as_deref(), Some("test-password"));
        assert_eq!(s.agent.agent_id.as_deref(), Some("agent-test-123"));
        assert_eq!(s.agent.model, "claude-opus-4-20250514");
        assert_eq!(s.agent.system_prompt.as_deref(), Some("be brief"));
        assert_eq!(s.agent.max_tokens, 1024);
        assert_eq!(s.agent.temperature, 0.2);
        assert_eq!(s.agent.max_iterations, 5);
        assert_eq!(s.bluesky.handle.as_deref(), Some("test.bsky.social"));
        assert_eq!(s.bluesky.app_password.as_deref(), Some("app-pw"));
        assert_eq!(s.bluesky.service_url, "https://pds.example");
        assert_eq!(s.discord.bot_token.as_deref(), Some("discord-token"));
        assert_eq!(s.discord.guild_id.as_deref(), Some("42"));
        assert_eq!(s.triggers.perch_interval_hours, 4);
        assert_eq!(s.services.anthropic_api_key.as_deref(), Some("sk-ant"));
        assert_eq!(
            s.services.anthropic_base_url.as_deref(),
            Some("https://gateway.example")
        );
        assert_eq!(s.export.output_dir, std::path::PathBuf::from("/tmp/out"));
        assert_eq!(s.export.file_prefix, "backup");
        assert_eq!(s.logging.level, "debug");
        assert_eq!(s.logging.format, "json");
    }

    #[test]
    fn test_unparseable_interval_is_ignored() {
        let env = env_from(&[("PERCH_INTERVAL_HOURS", "soon")]);
        let s = SettingsLoader::apply_env_overrides(Settings::default(), env);
        assert_eq!(s.triggers.perch_interval_hours, 2);
    }

    #[test]
    fn test_unparseable_agent_numbers_are_ignored() {
        let env = env_from(&[
            ("NAMELESS_MAX_TOKENS", "lots"),
            ("NAMELESS_TEMPERATURE", "warm"),
            ("NAMELESS_MAX_ITERATIONS", "-3"),
        ]);
        let s = SettingsLoader::apply_env_overrides(Settings::default(), env);
        assert_eq!(s.agent.max_tokens, 8192);
        assert_eq!(s.agent.temperature, 0.7);
        assert_eq!(s.agent.max_iterations, 25);
    }

    // ── SettingsLoader tests ───────────────────────────────────

    #[test]
    fn test_loader_env_beats_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nameless.toml");
        std::fs::write(
            &path,
            r#"
[letta]
base_url = "http://from-file:8283"
password = "file-password"

[agent]
agent_id = "agent-from-file"
"#,
        )
        .unwrap();

        let env = env_from(&[("NAMELESS_AGENT_ID", "agent-from-env")]);
        let loader = SettingsLoader::load_with_env(Some(path.as_path()), env).unwrap();
        let s = loader.get();
        assert_eq!(s.letta.base_url, "http://from-file:8283");
        assert_eq!(s.letta.password.as_deref(), Some("file-password"));
        assert_eq!(s.agent.agent_id.as_deref(), Some("agent-from-env"));
        assert_eq!(loader.path(), path.as_path());
    }

    #[test]
    fn test_loader_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let loader = SettingsLoader::load_with_env(Some(path.as_path()), no_env).unwrap();
        assert_eq!(loader.get().letta.base_url, "http://localhost:8283");
    }

    #[test]
    fn test_loader_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nameless.toml");
        std::fs::write(&path, "[letta\nbase_url = 3").unwrap();
        let err = SettingsLoader::load_with_env(Some(path.as_path()), no_env);
        assert!(err.is_err());
    }

    #[test]
    fn test_loader_rejects_invalid_settings() {
        let env = env_from(&[("PERCH_INTERVAL_HOURS", "0")]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = SettingsLoader::load_with_env(Some(path.as_path()), env)
            .err()
            .unwrap();
        assert!(err.to_string().contains("perch_interval_hours"));
    }

    #[test]
    fn test_resolve_path_explicit_wins() {
        let p = std::path::Path::new("/etc/nameless/custom.toml");
        assert_eq!(SettingsLoader::resolve_path(Some(p)), p.to_path_buf());
    }

    // ── Cache tests ────────────────────────────────────────────

    #[test]
    fn test_cache_returns_same_instance() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let cache = SettingsCache::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Settings::default()))
        });

        let a = cache.get().unwrap();
        let b = cache.get().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_clear_reloads() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let cache = SettingsCache::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let mut s = Settings::default();
            s.triggers.perch_interval_hours = 2 + n as u64;
            Ok(Arc::new(s))
        });

        let first = cache.get().unwrap();
        cache.clear();
        let second = cache.get().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.triggers.perch_interval_hours, 2);
        assert_eq!(second.triggers.perch_interval_hours, 3);
    }

    // ── Validation tests ───────────────────────────────────────

    #[test]
    fn test_default_settings_validate() {
        let warnings = Settings::default().validate().unwrap();
        assert!(warnings.iter().any(|w| w.field == "agent.agent_id"));
        assert!(
            warnings
                .iter()
                .all(|w| w.severity != WarningSeverity::Error)
        );
    }

    #[test]
    fn test_validation_errors() {
        let mut s = Settings::default();
        s.letta.base_url.clear();
        s.agent.temperature = 1.5;
        let err = s.validate().unwrap_err();
        assert!(err.contains("letta.base_url"));
        assert!(err.contains("agent.temperature"));
    }

    #[test]
    fn test_bluesky_pairing_warning() {
        let mut s = Settings::default();
        s.bluesky.handle = Some("me.bsky.social".into());
        let warnings = s.validate().unwrap();
        let w = warnings.iter().find(|w| w.field == "bluesky").unwrap();
        assert_eq!(w.severity, WarningSeverity::Warning);
        assert!(w.to_string().starts_with("[warning] bluesky:"));
    }
}
