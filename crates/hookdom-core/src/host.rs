//! The mutation façade the engine drives.
//!
//! The reconciliation engine never touches a rendering surface directly; every
//! structural or attribute change goes through a [`Host`]. Implementations only
//! provide the primitive operations. Prop semantics (listeners, style fields,
//! class names, boolean presence) are layered on top by the provided
//! [`Host::apply_props`] and [`Host::diff_props`] so every host behaves alike.

use std::fmt;
use std::rc::Rc;

use crate::error::HostError;
use crate::props;
use crate::vnode::Props;

pub type HostNodeId = usize;

/// Event delivered to a listener.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub target: HostNodeId,
    pub value: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>, target: HostNodeId) -> Self {
        Self {
            name: name.into(),
            target,
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Listener attached through an `onXxx` prop. Compared by identity.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(handler))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventHandler")
    }
}

pub trait Host {
    fn create_element(&mut self, tag: &str) -> Result<HostNodeId, HostError>;
    fn create_text(&mut self, text: &str) -> Result<HostNodeId, HostError>;
    fn set_text(&mut self, node: HostNodeId, text: &str) -> Result<(), HostError>;

    fn set_attribute(&mut self, node: HostNodeId, name: &str, value: &str)
        -> Result<(), HostError>;
    fn remove_attribute(&mut self, node: HostNodeId, name: &str) -> Result<(), HostError>;
    fn set_style(&mut self, node: HostNodeId, property: &str, value: &str)
        -> Result<(), HostError>;
    fn remove_style(&mut self, node: HostNodeId, property: &str) -> Result<(), HostError>;
    fn add_listener(
        &mut self,
        node: HostNodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<(), HostError>;
    fn remove_listener(
        &mut self,
        node: HostNodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;

    /// Insert `node` into `parent` before `anchor`, or append when `anchor` is
    /// `None`. A node that already has a parent is moved.
    fn insert_before(
        &mut self,
        parent: HostNodeId,
        node: HostNodeId,
        anchor: Option<HostNodeId>,
    ) -> Result<(), HostError>;

    /// Detach `node` from its parent and release it.
    fn remove_node(&mut self, node: HostNodeId) -> Result<(), HostError>;

    /// Remove and release every child of `parent`.
    fn clear_children(&mut self, parent: HostNodeId) -> Result<(), HostError>;

    fn apply_props(&mut self, node: HostNodeId, props: &Props) -> Result<(), HostError> {
        props::apply(self, node, props)
    }

    fn diff_props(
        &mut self,
        node: HostNodeId,
        previous: &Props,
        next: &Props,
    ) -> Result<(), HostError> {
        props::diff(self, node, previous, next)
    }
}
