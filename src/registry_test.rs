use super::*;
use tempfile::TempDir;

fn sample_registry() -> InstalledPlugins {
    InstalledPlugins::from_records(vec![
        InstalledPlugin {
            name: "CustomAlerts".to_string(),
            version: "1.2.0".to_string(),
            activated: true,
            bundled: false,
        },
        InstalledPlugin {
            name: "CoreHome".to_string(),
            version: "5.3.0".to_string(),
            activated: true,
            bundled: true,
        },
        InstalledPlugin {
            name: "LogViewer".to_string(),
            version: "0.9.1".to_string(),
            activated: false,
            bundled: false,
        },
    ])
}

#[test]
fn test_loaded_plugins_returns_all_records() {
    let registry = sample_registry();
    let loaded = registry.loaded_plugins();

    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[0], LoadedPlugin::new("CustomAlerts", "1.2.0"));
}

#[test]
fn test_is_plugin_loaded() {
    let registry = sample_registry();

    assert!(registry.is_plugin_loaded("CustomAlerts"));
    assert!(!registry.is_plugin_loaded("NotInstalled"));
}

#[test]
fn test_is_plugin_activated() {
    let registry = sample_registry();

    assert!(registry.is_plugin_activated("CustomAlerts"));
    assert!(!registry.is_plugin_activated("LogViewer"));
    assert!(!registry.is_plugin_activated("NotInstalled"));
}

#[test]
fn test_is_plugin_bundled_with_core() {
    let registry = sample_registry();

    assert!(registry.is_plugin_bundled_with_core("CoreHome"));
    assert!(!registry.is_plugin_bundled_with_core("CustomAlerts"));
}

#[test]
fn test_load_from_missing_file_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let registry = InstalledPlugins::load_from(temp_dir.path().join("plugins.toml")).unwrap();

    assert!(registry.loaded_plugins().is_empty());
}

#[test]
fn test_load_from_toml_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("plugins.toml");
    std::fs::write(
        &path,
        r#"
[[plugins]]
name = "CustomAlerts"
version = "1.2.0"
activated = true

[[plugins]]
name = "CoreHome"
version = "5.3.0"
activated = true
bundled = true
"#,
    )
    .unwrap();

    let registry = InstalledPlugins::load_from(path).unwrap();

    assert_eq!(registry.loaded_plugins().len(), 2);
    assert!(registry.is_plugin_bundled_with_core("CoreHome"));
    // bundled 未指定は false
    assert!(!registry.is_plugin_bundled_with_core("CustomAlerts"));
}

#[test]
fn test_load_from_invalid_toml_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("plugins.toml");
    std::fs::write(&path, "plugins = 42").unwrap();

    assert!(InstalledPlugins::load_from(path).is_err());
}
