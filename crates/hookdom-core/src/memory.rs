//! Arena-backed [`Host`] that keeps the host tree in memory.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::HostError;
use crate::host::{Event, EventHandler, Host, HostNodeId};

/// One mutation performed on a [`MemoryHost`], recorded in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    CreateElement { node: HostNodeId, tag: String },
    CreateText { node: HostNodeId, text: String },
    SetText { node: HostNodeId, text: String },
    SetAttribute { node: HostNodeId, name: String, value: String },
    RemoveAttribute { node: HostNodeId, name: String },
    SetStyle { node: HostNodeId, property: String, value: String },
    RemoveStyle { node: HostNodeId, property: String },
    AddListener { node: HostNodeId, event: String },
    RemoveListener { node: HostNodeId, event: String },
    Insert { parent: HostNodeId, node: HostNodeId, anchor: Option<HostNodeId> },
    Remove { node: HostNodeId },
    Clear { parent: HostNodeId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryNodeKind {
    Element { tag: String },
    Text { text: String },
}

pub struct MemoryNode {
    kind: MemoryNodeKind,
    parent: Option<HostNodeId>,
    children: Vec<HostNodeId>,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    listeners: Vec<(String, EventHandler)>,
}

impl MemoryNode {
    fn new(kind: MemoryNodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            listeners: Vec::new(),
        }
    }

    pub fn kind(&self) -> &MemoryNodeKind {
        &self.kind
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            MemoryNodeKind::Element { tag } => Some(tag),
            MemoryNodeKind::Text { .. } => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            MemoryNodeKind::Text { text } => Some(text),
            MemoryNodeKind::Element { .. } => None,
        }
    }

    pub fn parent(&self) -> Option<HostNodeId> {
        self.parent
    }

    pub fn children(&self) -> &[HostNodeId] {
        &self.children
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.styles.get(property).map(String::as_str)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.iter().filter(|(name, _)| name == event).count()
    }
}

#[derive(Default)]
pub struct MemoryHost {
    nodes: Vec<Option<MemoryNode>>, // FUTURE(no_std): migrate to arena-backed node storage.
    ops: Vec<HostOp>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached element to mount into. Not recorded in the op log.
    pub fn create_container(&mut self) -> HostNodeId {
        self.alloc(MemoryNodeKind::Element {
            tag: "#root".to_owned(),
        })
    }

    pub fn node(&self, id: HostNodeId) -> Option<&MemoryNode> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    pub fn children(&self, id: HostNodeId) -> &[HostNodeId] {
        self.node(id).map(MemoryNode::children).unwrap_or(&[])
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    /// Finds the first element in document order under `root` whose attribute
    /// `name` equals `value`.
    pub fn find_by_attribute(
        &self,
        root: HostNodeId,
        name: &str,
        value: &str,
    ) -> Option<HostNodeId> {
        let node = self.node(root)?;
        if node.attribute(name) == Some(value) {
            return Some(root);
        }
        node.children
            .iter()
            .find_map(|&child| self.find_by_attribute(child, name, value))
    }

    /// Invokes every listener registered on `event.target` for `event.name`.
    /// Returns whether any listener ran.
    pub fn dispatch(&self, event: &Event) -> Result<bool, HostError> {
        let node = self.get(event.target)?;
        let handlers: Vec<EventHandler> = node
            .listeners
            .iter()
            .filter(|(name, _)| *name == event.name)
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in &handlers {
            handler.call(event);
        }
        Ok(!handlers.is_empty())
    }

    /// Serialises the subtree rooted at `id`. Containers render only their children.
    pub fn markup(&self, id: HostNodeId) -> String {
        let mut output = String::new();
        match self.node(id) {
            Some(node) if node.tag() == Some("#root") => {
                for &child in &node.children {
                    self.write_markup(&mut output, child);
                }
            }
            Some(_) => self.write_markup(&mut output, id),
            None => output.push_str("(missing)"),
        }
        output
    }

    pub fn dump_tree(&self, root: HostNodeId) -> String {
        let mut output = String::new();
        self.dump_node(&mut output, root, 0);
        output
    }

    fn write_markup(&self, output: &mut String, id: HostNodeId) {
        let Some(node) = self.node(id) else {
            output.push_str("(missing)");
            return;
        };
        match &node.kind {
            MemoryNodeKind::Text { text } => output.push_str(text),
            MemoryNodeKind::Element { tag } => {
                let mut attributes = node.attributes.clone();
                if !node.styles.is_empty() {
                    let style = node
                        .styles
                        .iter()
                        .map(|(k, v)| format!("{k}: {v}"))
                        .collect::<Vec<_>>()
                        .join("; ");
                    attributes.insert("style".to_owned(), style);
                }
                let _ = write!(output, "<{tag}");
                for (name, value) in &attributes {
                    let _ = write!(output, " {name}=\"{value}\"");
                }
                output.push('>');
                for &child in &node.children {
                    self.write_markup(output, child);
                }
                let _ = write!(output, "</{tag}>");
            }
        }
    }

    fn dump_node(&self, output: &mut String, id: HostNodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.node(id) {
            Some(node) => {
                let label = match &node.kind {
                    MemoryNodeKind::Element { tag } => format!("<{tag}>"),
                    MemoryNodeKind::Text { text } => format!("{text:?}"),
                };
                let _ = writeln!(output, "{indent}[{id}] {label}");
                for &child in &node.children {
                    self.dump_node(output, child, depth + 1);
                }
            }
            None => {
                let _ = writeln!(output, "{indent}[{id}] (missing)");
            }
        }
    }

    fn alloc(&mut self, kind: MemoryNodeKind) -> HostNodeId {
        let id = self.nodes.len();
        self.nodes.push(Some(MemoryNode::new(kind)));
        id
    }

    fn get(&self, id: HostNodeId) -> Result<&MemoryNode, HostError> {
        self.node(id).ok_or(HostError::Missing { id })
    }

    fn get_mut(&mut self, id: HostNodeId) -> Result<&mut MemoryNode, HostError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(HostError::Missing { id })
    }

    fn element_mut(&mut self, id: HostNodeId) -> Result<&mut MemoryNode, HostError> {
        let node = self.get_mut(id)?;
        match node.kind {
            MemoryNodeKind::Element { .. } => Ok(node),
            MemoryNodeKind::Text { .. } => Err(HostError::NotAnElement { id }),
        }
    }

    fn detach(&mut self, id: HostNodeId) -> Result<(), HostError> {
        let parent = self.get_mut(id)?.parent.take();
        if let Some(parent) = parent {
            if let Ok(parent) = self.get_mut(parent) {
                parent.children.retain(|&child| child != id);
            }
        }
        Ok(())
    }

    fn release(&mut self, id: HostNodeId) {
        let children = match self.nodes.get_mut(id).and_then(Option::take) {
            Some(node) => node.children,
            None => return,
        };
        for child in children {
            self.release(child);
        }
    }
}

impl Host for MemoryHost {
    fn create_element(&mut self, tag: &str) -> Result<HostNodeId, HostError> {
        let node = self.alloc(MemoryNodeKind::Element {
            tag: tag.to_owned(),
        });
        self.ops.push(HostOp::CreateElement {
            node,
            tag: tag.to_owned(),
        });
        Ok(node)
    }

    fn create_text(&mut self, text: &str) -> Result<HostNodeId, HostError> {
        let node = self.alloc(MemoryNodeKind::Text {
            text: text.to_owned(),
        });
        self.ops.push(HostOp::CreateText {
            node,
            text: text.to_owned(),
        });
        Ok(node)
    }

    fn set_text(&mut self, node: HostNodeId, text: &str) -> Result<(), HostError> {
        match &mut self.get_mut(node)?.kind {
            MemoryNodeKind::Text { text: current } => {
                *current = text.to_owned();
            }
            MemoryNodeKind::Element { .. } => return Err(HostError::NotAnElement { id: node }),
        }
        self.ops.push(HostOp::SetText {
            node,
            text: text.to_owned(),
        });
        Ok(())
    }

    fn set_attribute(
        &mut self,
        node: HostNodeId,
        name: &str,
        value: &str,
    ) -> Result<(), HostError> {
        self.element_mut(node)?
            .attributes
            .insert(name.to_owned(), value.to_owned());
        self.ops.push(HostOp::SetAttribute {
            node,
            name: name.to_owned(),
            value: value.to_owned(),
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: HostNodeId, name: &str) -> Result<(), HostError> {
        self.element_mut(node)?.attributes.remove(name);
        self.ops.push(HostOp::RemoveAttribute {
            node,
            name: name.to_owned(),
        });
        Ok(())
    }

    fn set_style(
        &mut self,
        node: HostNodeId,
        property: &str,
        value: &str,
    ) -> Result<(), HostError> {
        self.element_mut(node)?
            .styles
            .insert(property.to_owned(), value.to_owned());
        self.ops.push(HostOp::SetStyle {
            node,
            property: property.to_owned(),
            value: value.to_owned(),
        });
        Ok(())
    }

    fn remove_style(&mut self, node: HostNodeId, property: &str) -> Result<(), HostError> {
        self.element_mut(node)?.styles.remove(property);
        self.ops.push(HostOp::RemoveStyle {
            node,
            property: property.to_owned(),
        });
        Ok(())
    }

    fn add_listener(
        &mut self,
        node: HostNodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<(), HostError> {
        self.element_mut(node)?
            .listeners
            .push((event.to_owned(), handler));
        self.ops.push(HostOp::AddListener {
            node,
            event: event.to_owned(),
        });
        Ok(())
    }

    fn remove_listener(
        &mut self,
        node: HostNodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        let element = self.element_mut(node)?;
        if let Some(index) = element
            .listeners
            .iter()
            .position(|(name, existing)| name == event && existing == handler)
        {
            element.listeners.remove(index);
        }
        self.ops.push(HostOp::RemoveListener {
            node,
            event: event.to_owned(),
        });
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: HostNodeId,
        node: HostNodeId,
        anchor: Option<HostNodeId>,
    ) -> Result<(), HostError> {
        if anchor == Some(node) {
            return Ok(());
        }
        self.element_mut(parent)?;
        self.get(node)?;
        if let Some(anchor) = anchor {
            if self.get(anchor)?.parent != Some(parent) {
                return Err(HostError::AnchorNotChild { parent, anchor });
            }
        }
        self.detach(node)?;
        let parent_node = self.element_mut(parent)?;
        let index = anchor
            .and_then(|anchor| parent_node.children.iter().position(|&c| c == anchor))
            .unwrap_or(parent_node.children.len());
        parent_node.children.insert(index, node);
        self.get_mut(node)?.parent = Some(parent);
        self.ops.push(HostOp::Insert {
            parent,
            node,
            anchor,
        });
        Ok(())
    }

    fn remove_node(&mut self, node: HostNodeId) -> Result<(), HostError> {
        self.detach(node)?;
        self.release(node);
        self.ops.push(HostOp::Remove { node });
        Ok(())
    }

    fn clear_children(&mut self, parent: HostNodeId) -> Result<(), HostError> {
        let children = std::mem::take(&mut self.element_mut(parent)?.children);
        for child in children {
            self.release(child);
        }
        self.ops.push(HostOp::Clear { parent });
        Ok(())
    }
}
