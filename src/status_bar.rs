//! Status bar boundary: owns the display items, feeds their interest sets to
//! the [`ContextManager`], and shows or hides widgets as batches arrive.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{ContextsConfig, ItemOverride, StatusBarConfig};
use crate::context::{
    ConnectionId, Context, ContextState, FocusArea, FocusContext, GlobalContext, SharedContext,
};
use crate::error::StatusBarError;
use crate::manager::{ContextManager, ItemSpec, ItemsChanged};

/// A rendered status item. Rendering itself belongs to the host.
pub trait StatusWidget: Send + Sync {
    fn show(&self);
    fn hide(&self);
    fn is_visible(&self) -> bool;
}

/// Widget that only tracks its visibility; for headless hosts and tests.
#[derive(Debug, Default)]
pub struct HeadlessWidget {
    visible: AtomicBool,
}

impl HeadlessWidget {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl StatusWidget for HeadlessWidget {
    fn show(&self) {
        self.visible.store(true, Ordering::SeqCst);
    }

    fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Right,
}

/// Placement and interest set for a status item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemOptions {
    pub align: Alignment,
    /// Lower priorities sit closer to the start of their side.
    pub priority: i32,
    pub contexts: Vec<String>,
}

impl ItemOptions {
    pub fn new<I, S>(contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            contexts: contexts.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_align(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn apply_override(&mut self, item_override: &ItemOverride) {
        if let Some(contexts) = &item_override.contexts {
            self.contexts = contexts.clone();
        }
        if let Some(align) = item_override.align {
            self.align = align;
        }
        if let Some(priority) = item_override.priority {
            self.priority = priority;
        }
    }
}

struct StatusItem {
    widget: Arc<dyn StatusWidget>,
    align: Alignment,
}

struct RankItem {
    id: String,
    priority: i32,
}

#[derive(Default)]
struct ItemRegistry {
    order: Vec<String>,
    items: HashMap<String, StatusItem>,
    /// Ids claimed by a registration that has not finished yet.
    reserved: HashSet<String>,
    left: Vec<RankItem>,
    right: Vec<RankItem>,
}

impl ItemRegistry {
    /// Claim `id` for a registration in progress; `false` if it is taken.
    fn reserve(&mut self, id: &str) -> bool {
        if self.items.contains_key(id) || self.reserved.contains(id) {
            return false;
        }
        self.reserved.insert(id.to_string())
    }

    fn insert(&mut self, id: String, widget: Arc<dyn StatusWidget>, opts: &ItemOptions) {
        let side = match opts.align {
            Alignment::Left => &mut self.left,
            Alignment::Right => &mut self.right,
        };
        let position = side
            .iter()
            .position(|rank| rank.priority > opts.priority)
            .unwrap_or(side.len());
        side.insert(
            position,
            RankItem {
                id: id.clone(),
                priority: opts.priority,
            },
        );
        self.order.push(id.clone());
        self.items.insert(
            id,
            StatusItem {
                widget,
                align: opts.align,
            },
        );
    }
}

fn apply_batch(registry: &Mutex<ItemRegistry>, batch: &ItemsChanged) {
    let targets: Vec<(&String, Option<Arc<dyn StatusWidget>>)> = {
        let registry = registry.lock();
        batch
            .items
            .iter()
            .map(|id| (id, registry.items.get(id).map(|item| item.widget.clone())))
            .collect()
    };

    for (id, widget) in targets {
        match widget {
            Some(widget) if batch.new_state.is_active() => widget.show(),
            Some(widget) => widget.hide(),
            None => warn!(item = %id, state = %batch.new_state, "Visibility change for unknown status item"),
        }
    }
}

/// The host-facing status bar.
pub struct StatusBar {
    manager: ContextManager,
    registry: Arc<Mutex<ItemRegistry>>,
    overrides: HashMap<String, ItemOverride>,
    connection: ConnectionId,
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBar {
    pub fn new() -> Self {
        Self::with_manager(ContextManager::new(), HashMap::new())
    }

    /// Status bar applying the per-item overrides from `config`.
    pub fn with_config(config: &StatusBarConfig) -> Self {
        Self::with_manager(ContextManager::new(), config.items.clone())
    }

    pub fn with_manager(manager: ContextManager, overrides: HashMap<String, ItemOverride>) -> Self {
        let registry = Arc::new(Mutex::new(ItemRegistry::default()));
        let connection = {
            let registry = registry.clone();
            manager
                .items_changed()
                .connect(move |batch: &ItemsChanged| apply_batch(&registry, batch))
        };
        Self {
            manager,
            registry,
            overrides,
            connection,
        }
    }

    pub fn manager(&self) -> &ContextManager {
        &self.manager
    }

    /// Add a status item. Ids are unique per status bar.
    ///
    /// The widget is shown or hidden immediately according to its initial
    /// effective state, which is also returned.
    pub fn register_status_item(
        &self,
        id: impl Into<String>,
        widget: Arc<dyn StatusWidget>,
        mut opts: ItemOptions,
    ) -> Result<ContextState, StatusBarError> {
        let id = id.into();
        if !self.registry.lock().reserve(&id) {
            return Err(StatusBarError::DuplicateItem(id));
        }
        if let Some(item_override) = self.overrides.get(&id) {
            opts.apply_override(item_override);
        }

        let added = self
            .manager
            .add_item(ItemSpec::new(id.clone(), opts.contexts.iter().cloned()));
        let mut registry = self.registry.lock();
        registry.reserved.remove(&id);
        let initial = added?;
        registry.insert(id.clone(), widget.clone(), &opts);
        drop(registry);

        if initial.is_active() {
            widget.show();
        } else {
            widget.hide();
        }
        info!(item = %id, align = ?opts.align, priority = opts.priority, "Status item registered");
        Ok(initial)
    }

    /// Add a context source. Names are unique per status bar.
    pub fn register_context(&self, context: SharedContext) -> Result<(), StatusBarError> {
        if self.manager.has_context(context.name()) {
            return Err(StatusBarError::DuplicateContext(context.name().to_string()));
        }
        self.manager.add_context(context)?;
        Ok(())
    }

    /// Register the global context and one focus context per configured kind.
    pub fn install_contexts(
        &self,
        config: &ContextsConfig,
        area: &Arc<FocusArea>,
    ) -> Result<(), StatusBarError> {
        if config.global {
            self.register_context(Arc::new(GlobalContext::new()))?;
        }
        for (name, kind) in &config.focus {
            self.register_context(FocusContext::shared_for_kind(
                name.clone(),
                area.clone(),
                kind.clone(),
            ))?;
        }
        Ok(())
    }

    /// Item ids in registration order.
    pub fn list_items(&self) -> Vec<String> {
        self.registry.lock().order.clone()
    }

    pub fn has_item(&self, id: &str) -> bool {
        self.registry.lock().items.contains_key(id)
    }

    pub fn is_visible(&self, id: &str) -> Option<bool> {
        let widget = self
            .registry
            .lock()
            .items
            .get(id)
            .map(|item| item.widget.clone())?;
        Some(widget.is_visible())
    }

    pub fn alignment(&self, id: &str) -> Option<Alignment> {
        self.registry.lock().items.get(id).map(|item| item.align)
    }

    /// Item ids on one side, in display order.
    pub fn side_items(&self, align: Alignment) -> Vec<String> {
        let registry = self.registry.lock();
        let side = match align {
            Alignment::Left => &registry.left,
            Alignment::Right => &registry.right,
        };
        side.iter().map(|rank| rank.id.clone()).collect()
    }

    /// Detach from the manager and dispose it. Idempotent.
    pub fn dispose(&self) {
        if self.manager.is_disposed() {
            return;
        }
        self.manager.items_changed().disconnect(self.connection);
        self.manager.dispose();
    }
}
