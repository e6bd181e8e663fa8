//! The engine's shadow tree of what is currently mounted.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::host::HostNodeId;
use crate::vnode::{Key, NodeType, VNode};

pub type InstanceId = u64;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

fn next_instance_id() -> InstanceId {
    NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InstanceKind {
    Host,
    Text,
    Fragment,
    Component,
}

impl InstanceKind {
    pub fn of(node: &VNode) -> Self {
        match node.node_type() {
            NodeType::Host(_) => InstanceKind::Host,
            NodeType::Text(_) => InstanceKind::Text,
            NodeType::Fragment => InstanceKind::Fragment,
            NodeType::Component(_) => InstanceKind::Component,
        }
    }
}

/// Record of one mounted [`VNode`].
///
/// `Host` and `Text` instances own exactly one host node; `Fragment` and
/// `Component` instances own none themselves and reach the host tree through
/// their children. A component has at most one child.
#[derive(Debug)]
pub struct Instance {
    id: InstanceId,
    kind: InstanceKind,
    node: VNode,
    host: Option<HostNodeId>,
    pub(crate) children: Vec<Instance>,
    path: String,
}

impl Instance {
    pub(crate) fn new(node: &VNode, host: Option<HostNodeId>, path: &str) -> Self {
        Self {
            id: next_instance_id(),
            kind: InstanceKind::of(node),
            node: node.clone(),
            host,
            children: Vec::new(),
            path: path.to_owned(),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn kind(&self) -> InstanceKind {
        self.kind
    }

    pub fn key(&self) -> Option<&Key> {
        self.node.key()
    }

    /// The node applied by the last mount or update.
    pub fn node(&self) -> &VNode {
        &self.node
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn host_node(&self) -> Option<HostNodeId> {
        self.host
    }

    pub fn children(&self) -> &[Instance] {
        &self.children
    }

    /// Swaps in the node and path of an in-place update, returning the previous node.
    pub(crate) fn retarget(&mut self, node: &VNode, path: &str) -> VNode {
        if self.path != path {
            self.path = path.to_owned();
        }
        std::mem::replace(&mut self.node, node.clone())
    }

    pub(crate) fn into_parts(self) -> (Option<HostNodeId>, Vec<Instance>) {
        (self.host, self.children)
    }

    /// First host node in document order owned by this subtree.
    pub fn first_host_node(&self) -> Option<HostNodeId> {
        match self.host {
            Some(id) => Some(id),
            None => self.children.iter().find_map(Instance::first_host_node),
        }
    }

    /// Top-level host nodes of this subtree, in document order.
    pub fn host_nodes(&self) -> Vec<HostNodeId> {
        let mut nodes = Vec::new();
        self.collect_host_nodes(&mut nodes);
        nodes
    }

    fn collect_host_nodes(&self, nodes: &mut Vec<HostNodeId>) {
        match self.host {
            Some(id) => nodes.push(id),
            None => {
                for child in &self.children {
                    child.collect_host_nodes(nodes);
                }
            }
        }
    }

    /// Finds the instance at `path` in this subtree.
    pub fn find(&self, path: &str) -> Option<&Instance> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(path))
    }

    /// Number of instances in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Instance::count).sum::<usize>()
    }

    pub fn dump(&self) -> String {
        let mut output = String::new();
        self.dump_into(&mut output, 0);
        output
    }

    fn dump_into(&self, output: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let label = match self.node.node_type() {
            NodeType::Host(tag) => format!("<{tag}>"),
            NodeType::Text(text) => format!("{text:?}"),
            NodeType::Fragment => "<>".to_owned(),
            NodeType::Component(component) => component.short_name().to_owned(),
        };
        let _ = write!(output, "{indent}#{} {label}", self.id);
        if let Some(key) = self.key() {
            let _ = write!(output, " key={key:?}");
        }
        if let Some(host) = self.host {
            let _ = write!(output, " host={host}");
        }
        let _ = writeln!(output, " @{}", self.path);
        for child in &self.children {
            child.dump_into(output, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_nodes_skip_through_fragments() {
        let fragment = VNode::fragment(Vec::<VNode>::new());
        let mut outer = Instance::new(&fragment, None, "root");
        let mut inner = Instance::new(&fragment, None, "root.c#fragment_0");
        inner
            .children
            .push(Instance::new(&VNode::text("a"), Some(4), "root.c#fragment_0.c#text_0"));
        outer.children.push(Instance::new(&fragment, None, "root.c#fragment_1"));
        outer.children.push(inner);
        outer
            .children
            .push(Instance::new(&VNode::element("b"), Some(9), "root.cb_0"));

        assert_eq!(outer.first_host_node(), Some(4));
        assert_eq!(outer.host_nodes(), vec![4, 9]);
        assert_eq!(outer.count(), 5);
        assert_eq!(outer.find("root.cb_0").and_then(Instance::host_node), Some(9));
    }

    #[test]
    fn ids_are_unique() {
        let node = VNode::element("div");
        let a = Instance::new(&node, Some(1), "root");
        let b = Instance::new(&node, Some(1), "root");
        assert_ne!(a.id(), b.id());
    }
}
