//! Immutable description of what should exist at one tree position.
//!
//! A [`VNode`] is produced fresh on every render and never mutated once it has
//! been shared; cloning one only bumps a reference count. Construction helpers
//! here already produce normalised trees: children are a flat ordered list and
//! text leaves are wrapped as [`NodeType::Text`] nodes.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use crate::collections::map::IndexMap;
use crate::host::EventHandler;
use crate::RenderError;

/// Name of the reserved prop that holds children. Hosts never see it.
pub const CHILDREN_PROP: &str = "children";

/// Stable identity hint supplied by the tree author.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Str(Rc<str>),
    Int(i64),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(value) => f.write_str(value),
            Key::Int(value) => write!(f, "{value}"),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(value) => write!(f, "{value:?}"),
            Key::Int(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(Rc::from(value))
    }
}

impl From<Rc<str>> for Key {
    fn from(value: Rc<str>) -> Self {
        Key::Str(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(i64::from(value))
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Key::Int(i64::from(value))
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key::Int(value as i64)
    }
}

type RenderFn = dyn Fn(&Props) -> Result<Option<VNode>, RenderError>;

/// Plain function pointer form of a component.
pub type RenderFnPtr = fn(&Props) -> Result<Option<VNode>, RenderError>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ComponentId {
    Type(TypeId),
    Pointer(usize),
}

/// A component function together with its identity.
///
/// Identity is the type of the function item or closure, so passing the same
/// function on every render yields the same component and keeps its instance
/// (and hook state) alive. Two closures written at the same source location
/// share a type and are therefore the same component.
///
/// Function pointers all share one type, so a component built from a
/// [`RenderFnPtr`] is identified by the pointer's address instead. A function
/// passed as an item and the same function passed as a pointer are distinct
/// components.
#[derive(Clone)]
pub struct Component {
    id: ComponentId,
    name: Rc<str>,
    render: Rc<RenderFn>,
}

impl Component {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&Props) -> Result<Option<VNode>, RenderError> + 'static,
    {
        if let Some(pointer) = (&render as &dyn Any).downcast_ref::<RenderFnPtr>() {
            return Self::from_fn(*pointer);
        }
        Self {
            id: ComponentId::Type(TypeId::of::<F>()),
            name: Rc::from(std::any::type_name::<F>()),
            render: Rc::new(render),
        }
    }

    /// Component identified by the address of `render`.
    pub fn from_fn(render: RenderFnPtr) -> Self {
        let address = render as usize;
        Self {
            id: ComponentId::Pointer(address),
            name: Rc::from(format!("fn@{address:#x}")),
            render: Rc::new(render),
        }
    }

    /// Type name of the render function, or its address for function pointers.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last path segment of [`Component::name`], for diagnostics.
    pub fn short_name(&self) -> &str {
        let trimmed = self.name.trim_end_matches("::{{closure}}");
        trimmed.rsplit("::").next().unwrap_or(trimmed)
    }

    pub(crate) fn render(&self, props: &Props) -> Result<Option<VNode>, RenderError> {
        (self.render)(props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.short_name()).finish()
    }
}

/// Closed classification of a [`VNode`].
#[derive(Clone, Debug)]
pub enum NodeType {
    Host(Rc<str>),
    Fragment,
    Text(Rc<str>),
    Component(Component),
}

impl NodeType {
    /// Whether two node types describe the same kind of thing. Text content is
    /// not part of the type; host tags compare by name and components by identity.
    pub fn same_type(&self, other: &NodeType) -> bool {
        match (self, other) {
            (NodeType::Host(a), NodeType::Host(b)) => a == b,
            (NodeType::Fragment, NodeType::Fragment) => true,
            (NodeType::Text(_), NodeType::Text(_)) => true,
            (NodeType::Component(a), NodeType::Component(b)) => a == b,
            _ => false,
        }
    }

    /// Name used when deriving identity paths.
    pub fn type_name(&self) -> &str {
        match self {
            NodeType::Host(tag) => tag,
            NodeType::Fragment => "#fragment",
            NodeType::Text(_) => "#text",
            NodeType::Component(component) => component.name(),
        }
    }
}

pub type StyleMap = IndexMap<Rc<str>, Rc<str>>;

/// Value stored under a prop name.
#[derive(Clone)]
pub enum PropValue {
    Str(Rc<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    Style(Rc<StyleMap>),
    Handler(EventHandler),
    /// Arbitrary data handed to components. Hosts ignore it.
    Data(Rc<dyn Any>),
}

impl PropValue {
    pub fn style<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Rc<str>>,
        V: Into<Rc<str>>,
    {
        let map: StyleMap = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        PropValue::Style(Rc::new(map))
    }

    pub fn data<T: 'static>(value: T) -> Self {
        PropValue::Data(Rc::new(value))
    }

    /// Like [`PropValue::data`] but shares an existing allocation, so the
    /// value compares equal across renders.
    pub fn shared<T: 'static>(value: Rc<T>) -> Self {
        PropValue::Data(value)
    }

    /// Stringified form used when a host applies the value as a plain attribute.
    pub fn to_attr_string(&self) -> Option<String> {
        match self {
            PropValue::Str(value) => Some(value.to_string()),
            PropValue::Int(value) => Some(value.to_string()),
            PropValue::Float(value) => Some(value.to_string()),
            PropValue::Bool(value) => Some(value.to_string()),
            PropValue::Style(map) => Some(
                map.iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            PropValue::Handler(_) | PropValue::Data(_) => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a == b,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Style(a), PropValue::Style(b)) => Rc::ptr_eq(a, b) || a == b,
            (PropValue::Handler(a), PropValue::Handler(b)) => a == b,
            (PropValue::Data(a), PropValue::Data(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(value) => write!(f, "{value:?}"),
            PropValue::Int(value) => write!(f, "{value}"),
            PropValue::Float(value) => write!(f, "{value}"),
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Style(map) => f.debug_map().entries(map.iter()).finish(),
            PropValue::Handler(_) => f.write_str("<handler>"),
            PropValue::Data(_) => f.write_str("<data>"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<Rc<str>> for PropValue {
    fn from(value: Rc<str>) -> Self {
        PropValue::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(i64::from(value))
    }
}

impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        PropValue::Int(value as i64)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        PropValue::Handler(value)
    }
}

/// Named values handed to a host node or a component, plus ordered children.
#[derive(Clone, Default)]
pub struct Props {
    values: IndexMap<Rc<str>, PropValue>,
    children: Vec<VNode>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            PropValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            PropValue::Float(value) => Some(*value),
            PropValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            PropValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn handler(&self, name: &str) -> Option<&EventHandler> {
        match self.get(name)? {
            PropValue::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    pub fn data<T: 'static>(&self, name: &str) -> Option<Rc<T>> {
        match self.get(name)? {
            PropValue::Data(data) => Rc::clone(data).downcast::<T>().ok(),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> + '_ {
        self.values.iter().map(|(name, value)| (&**name, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn children(&self) -> &[VNode] {
        &self.children
    }

    pub fn push_child(&mut self, child: VNode) {
        self.children.push(child);
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.iter()).finish()
    }
}

#[derive(Clone)]
struct VNodeData {
    ty: NodeType,
    key: Option<Key>,
    props: Props,
}

#[derive(Clone)]
pub struct VNode {
    inner: Rc<VNodeData>,
}

impl VNode {
    fn new(ty: NodeType) -> Self {
        Self {
            inner: Rc::new(VNodeData {
                ty,
                key: None,
                props: Props::default(),
            }),
        }
    }

    pub fn element(tag: impl Into<Rc<str>>) -> Self {
        Self::new(NodeType::Host(tag.into()))
    }

    pub fn text(text: impl Into<Rc<str>>) -> Self {
        Self::new(NodeType::Text(text.into()))
    }

    pub fn fragment<C: Into<VNode>>(children: impl IntoIterator<Item = C>) -> Self {
        Self::new(NodeType::Fragment).with_children(children)
    }

    pub fn component<F>(render: F) -> Self
    where
        F: Fn(&Props) -> Result<Option<VNode>, RenderError> + 'static,
    {
        Self::new(NodeType::Component(Component::new(render)))
    }

    pub fn from_component(component: Component) -> Self {
        Self::new(NodeType::Component(component))
    }

    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.data_mut().key = Some(key.into());
        self
    }

    pub fn with_prop(mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue>) -> Self {
        self.data_mut().props.insert(name, value);
        self
    }

    pub fn with_child(mut self, child: impl Into<VNode>) -> Self {
        self.data_mut().props.push_child(child.into());
        self
    }

    pub fn with_children<C: Into<VNode>>(mut self, children: impl IntoIterator<Item = C>) -> Self {
        let data = self.data_mut();
        data.props
            .children
            .extend(children.into_iter().map(Into::into));
        self
    }

    pub fn node_type(&self) -> &NodeType {
        &self.inner.ty
    }

    pub fn key(&self) -> Option<&Key> {
        self.inner.key.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.inner.props
    }

    pub fn children(&self) -> &[VNode] {
        &self.inner.props.children
    }

    pub fn type_name(&self) -> &str {
        self.inner.ty.type_name()
    }

    pub fn text_content(&self) -> Option<&str> {
        match &self.inner.ty {
            NodeType::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether `other` can update this node in place: same type and same key.
    pub fn matches(&self, other: &VNode) -> bool {
        self.inner.ty.same_type(&other.inner.ty) && self.inner.key == other.inner.key
    }

    fn data_mut(&mut self) -> &mut VNodeData {
        Rc::make_mut(&mut self.inner)
    }
}

impl From<&str> for VNode {
    fn from(value: &str) -> Self {
        VNode::text(value)
    }
}

impl From<String> for VNode {
    fn from(value: String) -> Self {
        VNode::text(value)
    }
}

impl From<i64> for VNode {
    fn from(value: i64) -> Self {
        VNode::text(value.to_string())
    }
}

impl From<Component> for VNode {
    fn from(value: Component) -> Self {
        VNode::from_component(value)
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("VNode");
        debug.field("type", &self.inner.ty);
        if let Some(key) = &self.inner.key {
            debug.field("key", key);
        }
        if !self.inner.props.is_empty() {
            debug.field("props", &self.inner.props);
        }
        if !self.inner.props.children.is_empty() {
            debug.field("children", &self.inner.props.children);
        }
        debug.finish()
    }
}
