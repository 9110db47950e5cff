//! Integration tests for Configuration System

use std::sync::Arc;

use statusbar::config::{global_config_path, ConfigLoader};
use statusbar::{
    Alignment, ContextState, FocusArea, HeadlessWidget, ItemOptions, StatusBar, StatusWidget,
};
use tempfile::TempDir;

use crate::integration::with_config_env;

fn write_global(contents: &str) {
    let path = global_config_path().unwrap();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

#[test]
fn test_global_file_lives_under_xdg_config_home() {
    let temp_dir = TempDir::new().unwrap();
    with_config_env(&temp_dir, || {
        let path = global_config_path().unwrap();
        assert_eq!(
            path,
            temp_dir
                .path()
                .join("config")
                .join("statusbar")
                .join("config.toml")
        );
    });
}

#[test]
fn test_load_without_files_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = with_config_env(&temp_dir, || ConfigLoader::load(None).unwrap());

    assert!(config.contexts.global);
    assert_eq!(config.contexts.focus.len(), 4);
    assert_eq!(config.logging.output, "stderr");
}

#[test]
fn test_explicit_file_overrides_global_file() {
    let temp_dir = TempDir::new().unwrap();
    let explicit = temp_dir.path().join("session.toml");
    std::fs::write(
        &explicit,
        r#"
[items.kernel-status]
priority = 7
"#,
    )
    .unwrap();

    let config = with_config_env(&temp_dir, || {
        write_global(
            r#"
[contexts]
global = false

[items.kernel-status]
align = "right"
priority = 1
"#,
        );
        ConfigLoader::load(Some(&explicit)).unwrap()
    });

    assert!(!config.contexts.global);
    let item = &config.items["kernel-status"];
    assert_eq!(item.align, Some(Alignment::Right));
    assert_eq!(item.priority, Some(7));
}

#[test]
fn test_environment_overrides_files() {
    let temp_dir = TempDir::new().unwrap();
    let config = with_config_env(&temp_dir, || {
        write_global("[logging]\nlevel = \"warn\"\n");
        std::env::set_var("STATUSBAR__LOGGING__LEVEL", "debug");
        std::env::set_var("STATUSBAR__CONTEXTS__GLOBAL", "false");
        ConfigLoader::load(None).unwrap()
    });

    assert_eq!(config.logging.level, "debug");
    assert!(!config.contexts.global);
}

#[test]
fn test_invalid_global_file_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let result = with_config_env(&temp_dir, || {
        write_global("[logging]\nformat = \"xml\"\n");
        ConfigLoader::load(None)
    });

    let err = result.unwrap_err();
    assert!(err.to_string().contains("Invalid log format"));
}

#[test]
fn test_config_drives_status_bar_setup() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("statusbar.toml");
    std::fs::write(
        &config_file,
        r#"
[contexts]
global = true

[contexts.focus]
viewer = "pdf"

[items.page-count]
contexts = ["viewer"]
align = "right"
"#,
    )
    .unwrap();
    let config = ConfigLoader::load_from_file(&config_file).unwrap();

    let area = FocusArea::shared();
    let bar = StatusBar::with_config(&config);
    bar.install_contexts(&config.contexts, &area).unwrap();
    assert!(bar.manager().has_context("viewer"));
    assert!(!bar.manager().has_context("notebook"));

    let widget: Arc<HeadlessWidget> = HeadlessWidget::shared();
    let initial = bar
        .register_status_item("page-count", widget.clone(), ItemOptions::default())
        .unwrap();
    assert_eq!(initial, ContextState::Inactive);
    assert_eq!(bar.side_items(Alignment::Right), vec!["page-count"]);

    area.focus("paper.pdf", "pdf");
    assert!(widget.is_visible());
}
