//! Integration tests for layered configuration and settings resolution

use std::fs;
use std::time::Duration;

use insights_relay::config::{ConfigLoader, SettingsResolver};
use insights_relay::ConfigurationError;
use tempfile::TempDir;

use super::test_utils::{env_key, host, no_env};

fn write_workspace(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().unwrap();
    let config_dir = temp.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    for (name, contents) in files {
        fs::write(config_dir.join(name), contents).unwrap();
    }
    temp
}

#[test]
fn test_environment_file_overrides_fields_of_base_file() {
    let workspace = write_workspace(&[
        (
            "insights.toml",
            "[tracing.azure]\nkey = \"base-key\"\nrole = \"orders\"\n\n\
             [tracing.available]\ncron = \"@every 10m\"\n",
        ),
        ("development.toml", "[tracing.azure]\ndetails = true\n"),
    ]);

    let config = ConfigLoader::load_with_global(workspace.path(), None).unwrap();
    let host = host();
    let env = no_env();
    let resolver = SettingsResolver::new(&config, &env, &host);

    let identity = resolver.resolve_identity().unwrap();
    assert_eq!(identity.key, "base-key");
    assert_eq!(identity.role, "orders");
    assert_eq!(identity.version, "3.1.0");
    assert!(identity.verbose_details);

    let availability = resolver.resolve_availability().unwrap();
    assert_eq!(availability.cron, "@every 10m");
    assert_eq!(availability.timeout, Duration::from_secs(5));
    assert_eq!(availability.targets.len(), 1);
    assert_eq!(availability.targets[0].name, "local");
}

#[test]
fn test_environment_key_beats_empty_file_key() {
    let workspace = write_workspace(&[("insights.toml", "[tracing.azure]\nkey = \"\"\n")]);

    let config = ConfigLoader::load_with_global(workspace.path(), None).unwrap();
    let host = host();
    let env = env_key("abc");
    let settings = SettingsResolver::new(&config, &env, &host)
        .resolve_request_monitor()
        .unwrap();

    assert_eq!(settings.identity.key, "abc");
    assert_eq!(settings.identity.role, "orders-api");
}

#[test]
fn test_explicit_file_with_targets() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("relay.toml");
    fs::write(
        &path,
        r#"
[tracing.azure]
key = "11111111-2222-3333-4444-555555555555"

[tracing.available]
cron = "@hourly"
timeout = "750ms"
fail_on_error_status = true
run_location = "eu-west"
tests = [
    { name = "api", target = "https://api.example.com/healthz" },
    { name = "web", target = "http://web.internal:8080/" },
]
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    let host = host();
    let env = no_env();
    let settings = SettingsResolver::new(&config, &env, &host)
        .resolve_availability()
        .unwrap();

    assert_eq!(settings.cron, "@hourly");
    assert_eq!(settings.timeout, Duration::from_millis(750));
    assert!(settings.fail_on_error_status);
    assert_eq!(settings.run_location.as_deref(), Some("eu-west"));
    let names: Vec<_> = settings.targets.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["api", "web"]);
    assert_eq!(settings.targets[1].url, "http://web.internal:8080/");
}

#[test]
fn test_availability_without_identity_is_missing_key() {
    let workspace = write_workspace(&[(
        "insights.toml",
        "[tracing.available]\ncron = \"@every 1m\"\n",
    )]);

    let config = ConfigLoader::load_with_global(workspace.path(), None).unwrap();
    let host = host();
    let env = no_env();
    let err = SettingsResolver::new(&config, &env, &host)
        .resolve_availability()
        .unwrap_err();

    assert!(matches!(err, ConfigurationError::MissingKey { .. }));
}

#[test]
fn test_duplicate_target_names_rejected() {
    let config = ConfigLoader::from_toml_str(
        r#"
[tracing.azure]
key = "k"

[tracing.available]
tests = [
    { name = "api", target = "http://a.example.com/" },
    { name = "api", target = "http://b.example.com/" },
]
"#,
    )
    .unwrap();
    let host = host();
    let env = no_env();
    let err = SettingsResolver::new(&config, &env, &host)
        .resolve_availability()
        .unwrap_err();

    assert!(matches!(err, ConfigurationError::DuplicateTarget(ref name) if name == "api"));
}

#[test]
fn test_empty_workspace_has_no_identity() {
    let temp = TempDir::new().unwrap();
    let config = ConfigLoader::load_with_global(temp.path(), None).unwrap();
    let host = host();
    let env = no_env();

    let err = SettingsResolver::new(&config, &env, &host)
        .resolve_identity()
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::MissingKey { .. }));
}

#[test]
fn test_workspace_file_overrides_global_file() {
    let global_dir = TempDir::new().unwrap();
    let global = global_dir.path().join("config.toml");
    fs::write(
        &global,
        "[tracing.azure]\nkey = \"global-key\"\nrole = \"global-role\"\n",
    )
    .unwrap();
    let workspace = write_workspace(&[("insights.toml", "[tracing.azure]\nrole = \"orders\"\n")]);

    let config = ConfigLoader::load_with_global(workspace.path(), Some(&global)).unwrap();
    let host = host();
    let env = no_env();
    let identity = SettingsResolver::new(&config, &env, &host)
        .resolve_identity()
        .unwrap();

    assert_eq!(identity.key, "global-key");
    assert_eq!(identity.role, "orders");
}

#[test]
fn test_missing_global_file_is_skipped() {
    let global_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let config = ConfigLoader::load_with_global(
        workspace.path(),
        Some(&global_dir.path().join("config.toml")),
    )
    .unwrap();
    let host = host();
    let env = no_env();
    let err = SettingsResolver::new(&config, &env, &host)
        .resolve_identity()
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::MissingKey { .. }));
}
