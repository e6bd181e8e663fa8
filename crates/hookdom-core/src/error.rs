use std::fmt;

use crate::HostNodeId;

/// Failure reported by a [`Host`](crate::Host) implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    Missing { id: HostNodeId },
    NotAnElement { id: HostNodeId },
    AnchorNotChild { parent: HostNodeId, anchor: HostNodeId },
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Missing { id } => write!(f, "host node {id} missing"),
            HostError::NotAnElement { id } => write!(f, "host node {id} is not an element"),
            HostError::AnchorNotChild { parent, anchor } => {
                write!(f, "anchor {anchor} is not a child of host node {parent}")
            }
        }
    }
}

impl std::error::Error for HostError {}

/// Errors that abort a render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A hook primitive ran while no component was being rendered.
    HookOutsideComponent,
    /// The slot at `cursor` holds a different hook kind or value type than requested.
    HookMismatch {
        path: String,
        cursor: usize,
        expected: &'static str,
    },
    /// A hook was requested past the end of the slot list without filling the gap.
    HookCursorGap {
        path: String,
        cursor: usize,
        len: usize,
    },
    /// A render pass was requested while another one was running on the same renderer.
    ReentrantRender,
    /// The renderer has no root installed.
    NotMounted,
    /// The renderer is still referenced elsewhere and cannot be torn down.
    RendererInUse,
    /// A component reported a failure of its own.
    Component { component: String, message: String },
    Host(HostError),
}

impl RenderError {
    pub fn component(component: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::HookOutsideComponent => {
                write!(f, "hook called outside of a component render")
            }
            RenderError::HookMismatch {
                path,
                cursor,
                expected,
            } => write!(
                f,
                "hook slot {cursor} of {path} does not hold {expected}; hooks must be called in the same order on every render"
            ),
            RenderError::HookCursorGap { path, cursor, len } => write!(
                f,
                "hook slot {cursor} of {path} requested but only {len} slots exist"
            ),
            RenderError::ReentrantRender => write!(f, "render pass re-entered synchronously"),
            RenderError::NotMounted => write!(f, "renderer has no mounted root"),
            RenderError::RendererInUse => write!(f, "renderer is still shared"),
            RenderError::Component { component, message } => {
                write!(f, "component {component} failed: {message}")
            }
            RenderError::Host(err) => write!(f, "host mutation failed: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Host(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HostError> for RenderError {
    fn from(err: HostError) -> Self {
        RenderError::Host(err)
    }
}
