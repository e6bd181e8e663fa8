//! Diffing of [`VNode`] trees against mounted [`Instance`] trees.
//!
//! Every function here consumes the previous instance and returns its
//! successor, emitting the minimal host mutations on the way. Freshly mounted
//! subtrees are built detached; whoever owns the child list inserts them.

use crate::collections::map::{HashMap, HashSet};
use crate::hooks::HookScope;
use crate::host::{Host, HostNodeId};
use crate::identity::{child_paths, path_of};
use crate::instance::Instance;
use crate::vnode::{Component, Key, NodeType, Props, VNode};
use crate::RenderError;

/// Mutation counters for one render pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    pub mounted: usize,
    pub updated: usize,
    pub unmounted: usize,
    pub moved: usize,
}

pub(crate) struct Reconciler<'a, H: Host + ?Sized> {
    host: &'a mut H,
    hooks: &'a HookScope,
    stats: PassStats,
}

impl<'a, H: Host + ?Sized> Reconciler<'a, H> {
    pub(crate) fn new(host: &'a mut H, hooks: &'a HookScope) -> Self {
        Self {
            host,
            hooks,
            stats: PassStats::default(),
        }
    }

    pub(crate) fn stats(&self) -> PassStats {
        self.stats
    }

    /// Reconciles one position.
    ///
    /// `host_parent` and `anchor` describe where the position's host nodes
    /// currently live; they are only consulted by in-place updates of
    /// fragments and components. A returned instance whose id differs from
    /// `previous` is detached and must be inserted by the caller.
    pub(crate) fn reconcile(
        &mut self,
        host_parent: Option<HostNodeId>,
        anchor: Option<HostNodeId>,
        previous: Option<Instance>,
        next: Option<&VNode>,
        path: &str,
    ) -> Result<Option<Instance>, RenderError> {
        match (previous, next) {
            (None, None) => Ok(None),
            (Some(previous), None) => {
                self.unmount(previous)?;
                Ok(None)
            }
            (None, Some(next)) => self.mount(next, path).map(Some),
            (Some(previous), Some(next)) if !previous.node().matches(next) => {
                log::trace!(
                    "replacing {} with {} at {path}",
                    previous.node().type_name(),
                    next.type_name()
                );
                self.unmount(previous)?;
                self.mount(next, path).map(Some)
            }
            (Some(previous), Some(next)) => self
                .update(host_parent, anchor, previous, next, path)
                .map(Some),
        }
    }

    fn mount(&mut self, node: &VNode, path: &str) -> Result<Instance, RenderError> {
        self.stats.mounted += 1;
        match node.node_type() {
            NodeType::Text(text) => {
                let id = self.host.create_text(text)?;
                Ok(Instance::new(node, Some(id), path))
            }
            NodeType::Host(tag) => {
                let id = self.host.create_element(tag)?;
                self.host.apply_props(id, node.props())?;
                let mut instance = Instance::new(node, Some(id), path);
                instance.children =
                    self.reconcile_children(Some(id), None, Vec::new(), node.children(), path)?;
                Ok(instance)
            }
            NodeType::Fragment => {
                let mut instance = Instance::new(node, None, path);
                instance.children =
                    self.reconcile_children(None, None, Vec::new(), node.children(), path)?;
                Ok(instance)
            }
            NodeType::Component(component) => {
                let mut instance = Instance::new(node, None, path);
                let rendered = self.render_component(component, node.props(), path)?;
                if let Some(child) = rendered {
                    let child_path = path_of(path, std::slice::from_ref(&child), 0);
                    instance.children.push(self.mount(&child, &child_path)?);
                }
                Ok(instance)
            }
        }
    }

    fn update(
        &mut self,
        host_parent: Option<HostNodeId>,
        anchor: Option<HostNodeId>,
        mut instance: Instance,
        next: &VNode,
        path: &str,
    ) -> Result<Instance, RenderError> {
        self.stats.updated += 1;
        let previous = instance.retarget(next, path);
        match (next.node_type(), instance.host_node()) {
            (NodeType::Text(text), Some(id)) => {
                if previous.text_content() != Some(&**text) {
                    self.host.set_text(id, text)?;
                }
            }
            (NodeType::Host(_), Some(element)) => {
                self.host.diff_props(element, previous.props(), next.props())?;
                let children = std::mem::take(&mut instance.children);
                instance.children =
                    self.reconcile_children(Some(element), None, children, next.children(), path)?;
            }
            (NodeType::Fragment, _) => {
                let children = std::mem::take(&mut instance.children);
                instance.children =
                    self.reconcile_children(host_parent, anchor, children, next.children(), path)?;
            }
            (NodeType::Component(component), _) => {
                let rendered = self.render_component(component, next.props(), path)?;
                let previous_child = instance.children.pop();
                let previous_id = previous_child.as_ref().map(Instance::id);
                let child_path = match &rendered {
                    Some(child) => path_of(path, std::slice::from_ref(child), 0),
                    None => String::new(),
                };
                let child = self.reconcile(
                    host_parent,
                    anchor,
                    previous_child,
                    rendered.as_ref(),
                    &child_path,
                )?;
                if let Some(child) = child {
                    if previous_id != Some(child.id()) {
                        if let Some(parent) = host_parent {
                            self.insert(parent, &child, anchor)?;
                        }
                    }
                    instance.children.push(child);
                }
            }
            (NodeType::Text(_) | NodeType::Host(_), None) => {
                log::warn!("instance at {path} lost its host node");
            }
        }
        Ok(instance)
    }

    /// Keyed reconciliation of an ordered child list.
    ///
    /// New children are processed left to right. A child is inserted before
    /// the first host node still owned by an unprocessed previous child (or
    /// `outer_anchor` when there is none) if it is new, came from another
    /// index, or an unprocessed earlier sibling still sits in front of it.
    pub(crate) fn reconcile_children(
        &mut self,
        host_parent: Option<HostNodeId>,
        outer_anchor: Option<HostNodeId>,
        previous: Vec<Instance>,
        next: &[VNode],
        parent_path: &str,
    ) -> Result<Vec<Instance>, RenderError> {
        let mut keyed: HashMap<Key, usize> = HashMap::default();
        for (index, child) in previous.iter().enumerate() {
            if let Some(key) = child.key() {
                keyed.entry(key.clone()).or_insert(index);
            }
        }
        let mut slots: Vec<Option<Instance>> = previous.into_iter().map(Some).collect();
        let paths = child_paths(parent_path, next);
        let mut seen: HashSet<&Key> = HashSet::default();
        let mut front = 0;
        let mut result = Vec::with_capacity(next.len());

        for (index, (node, path)) in next.iter().zip(&paths).enumerate() {
            let candidate_index = match node.key() {
                Some(key) => {
                    if !seen.insert(key) {
                        log::warn!("duplicate key {key:?} under {parent_path}; mounting a fresh instance");
                    }
                    keyed.remove(key)
                }
                None => slots
                    .get(index)
                    .and_then(|slot| slot.as_ref())
                    .filter(|candidate| candidate.key().is_none())
                    .map(|_| index),
            };
            let candidate = candidate_index.and_then(|i| slots[i].take());
            let candidate_id = candidate.as_ref().map(Instance::id);

            while front < slots.len()
                && slots[front]
                    .as_ref()
                    .map_or(true, |slot| slot.first_host_node().is_none())
            {
                front += 1;
            }
            // Everything already placed sits before this node; unprocessed
            // previous children have not moved.
            let anchor = slots
                .get(front)
                .and_then(|slot| slot.as_ref())
                .and_then(Instance::first_host_node)
                .or(outer_anchor);

            let child = self.reconcile(host_parent, anchor, candidate, Some(node), path)?;
            let Some(child) = child else {
                continue;
            };

            let fresh = candidate_id != Some(child.id());
            let relocated = candidate_index.is_some_and(|i| i != index);
            let overtaken = candidate_index.is_some_and(|i| front < i);
            if fresh || relocated || overtaken {
                if let Some(parent) = host_parent {
                    self.insert(parent, &child, anchor)?;
                    if !fresh {
                        self.stats.moved += 1;
                    }
                }
            }
            result.push(child);
        }

        for stale in slots.into_iter().flatten() {
            self.unmount(stale)?;
        }
        Ok(result)
    }

    fn insert(
        &mut self,
        parent: HostNodeId,
        instance: &Instance,
        anchor: Option<HostNodeId>,
    ) -> Result<(), RenderError> {
        for node in instance.host_nodes() {
            self.host.insert_before(parent, node, anchor)?;
        }
        Ok(())
    }

    /// Children first, then the instance's own host node.
    pub(crate) fn unmount(&mut self, instance: Instance) -> Result<(), RenderError> {
        self.stats.unmounted += 1;
        let (host, children) = instance.into_parts();
        for child in children {
            self.unmount(child)?;
        }
        if let Some(node) = host {
            self.host.remove_node(node)?;
        }
        Ok(())
    }

    fn render_component(
        &mut self,
        component: &Component,
        props: &Props,
        path: &str,
    ) -> Result<Option<VNode>, RenderError> {
        self.hooks.enter_component(path);
        let rendered = component.render(props);
        self.hooks.exit_component();
        if let Err(err) = &rendered {
            log::debug!("{} failed at {path}: {err}", component.short_name());
        }
        rendered
    }
}
