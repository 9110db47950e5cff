//! End-to-end: focus changes in the shell drive status item visibility

use std::sync::Arc;

use statusbar::config::{ContextsConfig, StatusBarConfig};
use statusbar::{
    Alignment, Context, ContextState, FocusArea, HeadlessWidget, ItemOptions, StatusBar, StatusBarError,
    StatusWidget, ToggleContext,
};

fn default_bar(area: &Arc<FocusArea>) -> StatusBar {
    let bar = StatusBar::with_config(&StatusBarConfig::default());
    bar.install_contexts(&ContextsConfig::default(), area).unwrap();
    bar
}

#[test]
fn test_focus_changes_toggle_widgets() {
    let area = FocusArea::shared();
    let bar = default_bar(&area);

    let kernel = HeadlessWidget::shared();
    let line_col = HeadlessWidget::shared();
    let running = HeadlessWidget::shared();
    bar.register_status_item(
        "kernel-status",
        kernel.clone(),
        ItemOptions::new(["notebook", "console"]),
    )
    .unwrap();
    bar.register_status_item(
        "line-col",
        line_col.clone(),
        ItemOptions::new(["notebook", "console", "editor"]).with_align(Alignment::Right),
    )
    .unwrap();
    bar.register_status_item("running", running.clone(), ItemOptions::new(["global"]))
        .unwrap();

    assert!(!kernel.is_visible());
    assert!(!line_col.is_visible());
    assert!(running.is_visible());

    area.focus("Untitled.ipynb", "notebook");
    assert!(kernel.is_visible());
    assert!(line_col.is_visible());

    area.focus("main.py", "editor");
    assert!(!kernel.is_visible());
    assert!(line_col.is_visible());

    area.focus("bash", "terminal");
    assert!(!kernel.is_visible());
    assert!(!line_col.is_visible());
    assert!(running.is_visible());

    assert_eq!(bar.is_visible("kernel-status"), Some(false));
    assert_eq!(bar.is_visible("nope"), None);
}

#[test]
fn test_items_registered_while_focused_start_visible() {
    let area = FocusArea::shared();
    area.focus("Untitled.ipynb", "notebook");
    let bar = default_bar(&area);

    let trust = HeadlessWidget::shared();
    let initial = bar
        .register_status_item("notebook-trust", trust.clone(), ItemOptions::new(["notebook"]))
        .unwrap();

    assert_eq!(initial, ContextState::Active);
    assert!(trust.is_visible());
}

#[test]
fn test_installing_twice_is_a_duplicate_registration() {
    let area = FocusArea::shared();
    let bar = default_bar(&area);

    let err = bar
        .install_contexts(&ContextsConfig::default(), &area)
        .unwrap_err();
    assert_eq!(err, StatusBarError::DuplicateContext("global".to_string()));
}

#[test]
fn test_refresh_resyncs_contexts_with_the_shell() {
    let area = FocusArea::shared();
    let bar = default_bar(&area);
    let widget = HeadlessWidget::shared();
    bar.register_status_item("console-item", widget.clone(), ItemOptions::new(["console"]))
        .unwrap();

    // Listeners were detached while focus moved; refresh picks it back up.
    let listeners = area.current_changed().listener_count();
    area.current_changed().clear();
    area.focus("console-1", "console");
    assert!(!widget.is_visible());
    assert!(listeners > 0);

    bar.manager().refresh().unwrap();
    assert!(widget.is_visible());
}

#[test]
fn test_dispose_stops_updates() {
    let bar = StatusBar::new();
    let console = ToggleContext::shared("console", ContextState::Inactive);
    bar.register_context(console.clone()).unwrap();
    let widget = HeadlessWidget::shared();
    bar.register_status_item("kernel", widget.clone(), ItemOptions::new(["console"]))
        .unwrap();

    bar.dispose();
    bar.dispose();
    console.activate();

    assert!(!widget.is_visible());
    assert!(console.is_disposed());
    assert!(matches!(
        bar.register_status_item("late", HeadlessWidget::shared(), ItemOptions::default()),
        Err(StatusBarError::Context(_))
    ));
}
