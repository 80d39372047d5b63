use std::fs;

use tempfile::TempDir;

use yamlnode::util::testing;
use yamlnode::{DiagnosticLevel, Node, Settings, Style};

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

#[test]
fn given_config_file_when_loading_then_file_values_override_defaults() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("yamlnode.toml");
    fs::write(
        &path,
        r#"
default_style = "flow"

[dump]
max_depth = 3
"#,
    )
    .expect("write config");

    let settings = Settings::load_from(Some(&path)).expect("load");

    assert_eq!(settings.default_style, Style::Flow);
    assert_eq!(settings.diagnostics, DiagnosticLevel::Warn);
    assert_eq!(settings.dump.max_depth, Some(3));
    assert!(!settings.dump.show_style);
}

#[test]
fn given_missing_config_file_when_loading_then_defaults_are_used() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("absent.toml");

    let settings = Settings::load_from(Some(&path)).expect("load");

    assert_eq!(settings, Settings::default());
}

#[test]
fn given_malformed_config_file_when_loading_then_error_names_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("broken.toml");
    fs::write(&path, "default_style = [unclosed").expect("write config");

    let err = Settings::load_from(Some(&path)).expect_err("must fail");

    assert!(err.to_string().starts_with("config error:"));
    assert!(err.message.contains("broken.toml"));
}

#[test]
fn given_unknown_style_when_parsing_then_error() {
    assert!(Settings::from_toml_str(r#"default_style = "folded""#).is_err());
}

#[test]
fn given_loaded_settings_when_attached_to_tree_then_tree_uses_them() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("yamlnode.toml");
    fs::write(&path, "default_style = \"block\"\ndiagnostics = \"off\"\n").expect("write config");
    let settings = Settings::load_from(Some(&path)).expect("load");

    let mut root = Node::with_settings(settings.clone());
    root.get_or_create("child").push(&1);

    assert_eq!(root.settings(), settings);
    assert_eq!(root.get("child").style(), Style::Block);
    assert_eq!(root.deep_clone().settings(), settings);
}

#[test]
fn given_global_config_path_when_resolved_then_ends_with_file_name() {
    if let Some(path) = yamlnode::config::global_config_path() {
        assert!(path.ends_with("yamlnode/yamlnode.toml") || path.ends_with("yamlnode.toml"));
    }
}
