//! Statusbar: context-driven visibility for status bar items.
//!
//! Context sources report whether some facet of the shell (a notebook, a
//! console, a terminal, ...) currently has focus. The [`ContextManager`] merges
//! their transitions and tells the [`StatusBar`] which items to show or hide,
//! in batches, so widgets never track focus themselves.

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod manager;
pub mod mux;
pub mod status_bar;

pub use context::{
    Context, ContextState, FocusArea, FocusContext, FocusedWidget, GlobalContext, SharedContext,
    Signal, StateChange, ToggleContext,
};
pub use error::{ApiError, ContextError, StatusBarError};
pub use manager::{ContextManager, ItemSpec, ItemsChanged};
pub use mux::{ContextChange, ContextMultiplexer};
pub use status_bar::{Alignment, HeadlessWidget, ItemOptions, StatusBar, StatusWidget};
