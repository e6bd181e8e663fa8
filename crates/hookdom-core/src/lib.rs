#![doc = r"Reconciliation engine, hook state and render scheduling for a minimal VNode runtime."]

pub mod collections;
pub mod error;
pub mod hooks;
pub mod host;
pub mod identity;
pub mod instance;
pub mod memory;
pub mod platform;
pub mod props;
pub mod reconcile;
pub mod renderer;
pub mod runtime;
mod scheduler;
pub mod vnode;

pub use error::{HostError, RenderError};
pub use hooks::{use_effect, use_effect_with, use_state, EffectResult, StateSetter};
pub use host::{Event, EventHandler, Host, HostNodeId};
pub use identity::{child_path, child_paths, path_of, ROOT_PATH};
pub use instance::{Instance, InstanceId, InstanceKind};
pub use memory::{HostOp, MemoryHost, MemoryNode, MemoryNodeKind};
pub use platform::RuntimeScheduler;
pub use props::event_name;
pub use reconcile::PassStats;
pub use renderer::Renderer;
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle, MAX_IDLE_TURNS};
pub use vnode::{
    Component, Key, NodeType, PropValue, Props, RenderFnPtr, StyleMap, VNode, CHILDREN_PROP,
};

/// Result type of component render functions.
pub type RenderResult = Result<Option<VNode>, RenderError>;

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod reconcile_tests;

#[cfg(test)]
#[path = "tests/hook_tests.rs"]
mod hook_tests;

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod scheduler_tests;
