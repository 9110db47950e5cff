//! Visibility scenarios for the context manager

use std::sync::Arc;

use statusbar::{
    Context, ContextError, ContextManager, ContextState, GlobalContext, ItemSpec, ItemsChanged,
    ToggleContext,
};

use crate::integration::record_batches;

fn batch(new_state: ContextState, items: &[&str]) -> ItemsChanged {
    ItemsChanged {
        new_state,
        items: items.iter().map(|id| id.to_string()).collect(),
    }
}

#[test]
fn test_global_context_makes_item_active_on_registration() {
    let manager = ContextManager::new();
    manager.add_context(Arc::new(GlobalContext::new())).unwrap();

    let initial = manager.add_item(ItemSpec::new("X", ["global"])).unwrap();

    assert_eq!(initial, ContextState::Active);
    assert_eq!(manager.item_state("X"), Some(ContextState::Active));
}

#[test]
fn test_item_follows_or_of_its_contexts() {
    let manager = ContextManager::new();
    let notebook = ToggleContext::shared("notebook", ContextState::Inactive);
    let console = ToggleContext::shared("console", ContextState::Inactive);
    manager.add_context(notebook.clone()).unwrap();
    manager.add_context(console.clone()).unwrap();
    assert_eq!(
        manager
            .add_item(ItemSpec::new("Y", ["notebook", "console"]))
            .unwrap(),
        ContextState::Inactive
    );
    let seen = record_batches(&manager);

    notebook.activate();
    assert_eq!(
        *seen.lock().unwrap(),
        vec![batch(ContextState::Active, &["Y"])]
    );

    console.activate();
    notebook.deactivate();
    assert_eq!(seen.lock().unwrap().len(), 1);

    console.deactivate();
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            batch(ContextState::Active, &["Y"]),
            batch(ContextState::Inactive, &["Y"]),
        ]
    );
}

#[test]
fn test_missing_context_lookup() {
    let manager = ContextManager::new();
    assert!(!manager.has_context("missing"));
    assert_eq!(
        manager.context("missing").err(),
        Some(ContextError::NotFound("missing".to_string()))
    );
}

#[test]
fn test_shared_context_flips_items_in_one_batch() {
    let manager = ContextManager::new();
    let terminal = ToggleContext::shared("terminal", ContextState::Inactive);
    manager.add_context(terminal.clone()).unwrap();
    manager.add_item(ItemSpec::new("second", ["terminal"])).unwrap();
    manager.add_item(ItemSpec::new("first", ["terminal"])).unwrap();
    manager.add_item(ItemSpec::new("bystander", ["notebook"])).unwrap();
    let seen = record_batches(&manager);

    terminal.activate();
    terminal.deactivate();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            batch(ContextState::Active, &["second", "first"]),
            batch(ContextState::Inactive, &["second", "first"]),
        ]
    );
}

#[test]
fn test_unknown_context_names_keep_item_inactive_until_registered() {
    let manager = ContextManager::new();
    manager.add_item(ItemSpec::new("trust", ["notebook"])).unwrap();
    assert_eq!(manager.item_state("trust"), Some(ContextState::Inactive));
    let seen = record_batches(&manager);

    // Registering an already-active context is an import and flips dependents.
    let notebook = ToggleContext::shared("notebook", ContextState::Active);
    manager.add_context(notebook.clone()).unwrap();

    assert_eq!(manager.item_state("trust"), Some(ContextState::Active));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![batch(ContextState::Active, &["trust"])]
    );
}

#[test]
fn test_inactive_import_emits_nothing() {
    let manager = ContextManager::new();
    manager.add_item(ItemSpec::new("kernel", ["console"])).unwrap();
    let seen = record_batches(&manager);

    manager
        .add_context(ToggleContext::shared("console", ContextState::Inactive))
        .unwrap();

    assert!(seen.lock().unwrap().is_empty());
    assert!(manager.active_contexts().is_empty());
}

#[test]
fn test_re_registration_re_imports_state() {
    let manager = ContextManager::new();
    let old = ToggleContext::shared("notebook", ContextState::Active);
    assert!(!manager.add_context(old.clone()).unwrap());
    manager.add_item(ItemSpec::new("kernel", ["notebook"])).unwrap();
    let seen = record_batches(&manager);

    let replacement = ToggleContext::shared("notebook", ContextState::Inactive);
    assert!(manager.add_context(replacement.clone()).unwrap());

    assert!(old.is_disposed());
    assert_eq!(manager.item_state("kernel"), Some(ContextState::Inactive));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![batch(ContextState::Inactive, &["kernel"])]
    );

    // Only the replacement drives the name from now on.
    old.activate();
    assert_eq!(manager.item_state("kernel"), Some(ContextState::Inactive));
    replacement.activate();
    assert_eq!(manager.item_state("kernel"), Some(ContextState::Active));
}

#[test]
fn test_each_transition_reports_one_direction() {
    let manager = ContextManager::new();
    let editor = ToggleContext::shared("editor", ContextState::Active);
    manager.add_context(editor.clone()).unwrap();
    manager.add_item(ItemSpec::new("line-col", ["editor"])).unwrap();
    manager.add_item(ItemSpec::new("mode", ["editor", "global"])).unwrap();
    let seen = record_batches(&manager);

    editor.deactivate();
    editor.activate();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            batch(ContextState::Inactive, &["line-col", "mode"]),
            batch(ContextState::Active, &["line-col", "mode"]),
        ]
    );
}

#[test]
fn test_removed_item_no_longer_reported() {
    let manager = ContextManager::new();
    let console = ToggleContext::shared("console", ContextState::Inactive);
    manager.add_context(console.clone()).unwrap();
    manager.add_item(ItemSpec::new("a", ["console"])).unwrap();
    manager.add_item(ItemSpec::new("b", ["console"])).unwrap();
    let seen = record_batches(&manager);

    assert!(manager.remove_item("a").unwrap());
    console.activate();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![batch(ContextState::Active, &["b"])]
    );
    assert_eq!(manager.items(), vec!["b"]);
}

#[test]
fn test_import_batches_stay_ordered_under_re_entrant_flip() {
    let manager = ContextManager::new();
    manager.add_item(ItemSpec::new("I", ["nb"])).unwrap();
    let notebook = ToggleContext::shared("nb", ContextState::Active);
    {
        let notebook = notebook.clone();
        manager.items_changed().connect(move |batch: &ItemsChanged| {
            if batch.new_state.is_active() {
                notebook.deactivate();
            }
        });
    }
    let seen = record_batches(&manager);

    manager.add_context(notebook.clone()).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            batch(ContextState::Active, &["I"]),
            batch(ContextState::Inactive, &["I"]),
        ]
    );
    assert_eq!(manager.item_state("I"), Some(ContextState::Inactive));
    assert_eq!(notebook.state(), ContextState::Inactive);
}
