use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::hooks::{self, HookScope, HookStore};
use crate::host::{Host, HostNodeId};
use crate::identity::ROOT_PATH;
use crate::instance::Instance;
use crate::reconcile::{PassStats, Reconciler};
use crate::runtime::Runtime;
use crate::scheduler::{RenderLatch, RenderRequest};
use crate::vnode::VNode;
use crate::RenderError;

struct RendererInner<H: Host + 'static> {
    host: RefCell<H>,
    root: RefCell<Option<Instance>>,
    root_node: RefCell<Option<VNode>>,
    container: Cell<Option<HostNodeId>>,
    hooks: Rc<RefCell<HookStore>>,
    scope: HookScope,
    runtime: Runtime,
    latch: RenderLatch,
    poisoned: Cell<bool>,
    last_error: RefCell<Option<RenderError>>,
    passes: Cell<u64>,
    last_stats: Cell<PassStats>,
    this: Weak<RendererInner<H>>,
}

impl<H: Host + 'static> RendererInner<H> {
    fn is_mounted(&self) -> bool {
        self.root_node.borrow().is_some() && self.container.get().is_some()
    }

    fn render_pass(&self) -> Result<(), RenderError> {
        let root_node = self
            .root_node
            .borrow()
            .clone()
            .ok_or(RenderError::NotMounted)?;
        let container = self.container.get().ok_or(RenderError::NotMounted)?;
        let mut host = self
            .host
            .try_borrow_mut()
            .map_err(|_| RenderError::ReentrantRender)?;

        let pass = self.passes.get() + 1;
        log::debug!("render pass {pass} starting");

        let previous = self.root.borrow_mut().take();
        let previous = if self.poisoned.get() {
            log::debug!("rebuilding host tree after an aborted pass");
            drop(previous);
            if let Err(err) = host.clear_children(container) {
                return Err(err.into());
            }
            None
        } else {
            previous
        };
        let previous_id = previous.as_ref().map(Instance::id);

        self.hooks.borrow_mut().begin_pass();
        let mut reconciler = Reconciler::new(&mut *host, &self.scope);
        let reconciled = self.scope.install(|| {
            reconciler.reconcile(Some(container), None, previous, Some(&root_node), ROOT_PATH)
        });
        let stats = reconciler.stats();
        let committed = reconciled.and_then(|root| {
            if let Some(root) = &root {
                if previous_id != Some(root.id()) {
                    for node in root.host_nodes() {
                        host.insert_before(container, node, None)?;
                    }
                }
            }
            Ok(root)
        });
        drop(host);

        let root = match committed {
            Ok(root) => root,
            Err(err) => {
                self.poisoned.set(true);
                self.hooks.borrow_mut().abort_pass();
                log::debug!("render pass {pass} aborted: {err}");
                return Err(err);
            }
        };
        self.poisoned.set(false);
        let instances = root.as_ref().map_or(0, Instance::count);
        *self.root.borrow_mut() = root;
        self.passes.set(pass);
        self.last_stats.set(stats);

        let removed = self.hooks.borrow_mut().collect_unvisited();
        if !removed.is_empty() {
            log::debug!("collecting hook slots of {} paths", removed.len());
        }
        hooks::dispose(removed);

        let effects = self.hooks.borrow_mut().take_pending_effects();
        log::debug!(
            "render pass {pass} finished: {instances} instances, {} effects queued",
            effects.len()
        );
        if !effects.is_empty() {
            let store = Rc::downgrade(&self.hooks);
            self.runtime.spawn_task(move || {
                if let Some(store) = store.upgrade() {
                    hooks::flush_effects(&store, effects);
                }
            });
        }
        Ok(())
    }

    fn run_scheduled(&self) {
        self.latch.release();
        if !self.is_mounted() {
            return;
        }
        if let Err(err) = self.render_pass() {
            log::error!("scheduled render pass failed: {err}");
            *self.last_error.borrow_mut() = Some(err);
        }
    }

    fn unmount_root(&self) -> Result<(), RenderError> {
        let mut host = self
            .host
            .try_borrow_mut()
            .map_err(|_| RenderError::ReentrantRender)?;
        let root = self.root.borrow_mut().take();
        let mut result = Ok(());
        if let Some(root) = root {
            result = Reconciler::new(&mut *host, &self.scope).unmount(root);
        }
        if let Some(container) = self.container.get() {
            if result.is_err() || self.poisoned.get() {
                result = host.clear_children(container).map_err(RenderError::from);
            }
        }
        drop(host);

        self.poisoned.set(false);
        self.root_node.borrow_mut().take();
        let removed = self.hooks.borrow_mut().clear();
        hooks::dispose(removed);
        result
    }
}

impl<H: Host + 'static> RenderRequest for RendererInner<H> {
    fn request_render(&self) {
        if !self.latch.try_schedule() {
            return;
        }
        let this = Weak::clone(&self.this);
        self.runtime.spawn_task(move || {
            if let Some(inner) = this.upgrade() {
                inner.run_scheduled();
            }
        });
    }
}

/// Engine context: one root, one host, one hook store, one scheduler.
///
/// State changes never render synchronously. They schedule a pass on the
/// [`Runtime`], which the embedder pumps; effects are flushed on the turn
/// after the pass that queued them.
pub struct Renderer<H: Host + 'static> {
    inner: Rc<RendererInner<H>>,
}

impl<H: Host + 'static> Renderer<H> {
    pub fn new(host: H) -> Self {
        Self::with_runtime(host, Runtime::default())
    }

    pub fn with_runtime(host: H, runtime: Runtime) -> Self {
        let hooks = Rc::new(RefCell::new(HookStore::default()));
        let inner = Rc::new_cyclic(|this: &Weak<RendererInner<H>>| {
            let requester: Weak<dyn RenderRequest> = this.clone();
            RendererInner {
                host: RefCell::new(host),
                root: RefCell::new(None),
                root_node: RefCell::new(None),
                container: Cell::new(None),
                scope: HookScope::new(Rc::clone(&hooks), requester),
                hooks,
                runtime,
                latch: RenderLatch::default(),
                poisoned: Cell::new(false),
                last_error: RefCell::new(None),
                passes: Cell::new(0),
                last_stats: Cell::new(PassStats::default()),
                this: this.clone(),
            }
        });
        Self { inner }
    }

    /// Renders `root` into `container` synchronously.
    ///
    /// Mounting again into the same container reconciles against the current
    /// tree; a different container resets the renderer first.
    pub fn mount(&self, root: VNode, container: HostNodeId) -> Result<(), RenderError> {
        if self
            .inner
            .container
            .get()
            .is_some_and(|current| current != container)
        {
            self.reset_root()?;
        }
        self.inner.container.set(Some(container));
        *self.inner.root_node.borrow_mut() = Some(root);
        self.render_now()
    }

    /// Unmounts the root, runs every stored effect cleanup and drops all hook state.
    pub fn reset_root(&self) -> Result<(), RenderError> {
        let result = self.inner.unmount_root();
        self.inner.container.set(None);
        result
    }

    /// Unmounts everything and hands back the host.
    pub fn teardown(self) -> Result<H, RenderError> {
        self.reset_root()?;
        let inner = Rc::try_unwrap(self.inner).map_err(|_| RenderError::RendererInUse)?;
        Ok(inner.host.into_inner())
    }

    /// Schedules a render pass on the runtime unless one is already pending.
    pub fn request_render(&self) {
        self.inner.request_render();
    }

    /// Runs a render pass immediately.
    pub fn render_now(&self) -> Result<(), RenderError> {
        self.inner.render_pass()
    }

    pub fn with_host<R>(&self, f: impl FnOnce(&H) -> R) -> R {
        f(&self.inner.host.borrow())
    }

    pub fn with_host_mut<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(&mut self.inner.host.borrow_mut())
    }

    pub fn with_root_instance<R>(&self, f: impl FnOnce(Option<&Instance>) -> R) -> R {
        f(self.inner.root.borrow().as_ref())
    }

    pub fn container(&self) -> Option<HostNodeId> {
        self.inner.container.get()
    }

    pub fn dump_tree(&self) -> String {
        self.inner
            .root
            .borrow()
            .as_ref()
            .map(Instance::dump)
            .unwrap_or_default()
    }

    /// The error of the most recent failed scheduled pass, if any.
    pub fn take_error(&self) -> Option<RenderError> {
        self.inner.last_error.borrow_mut().take()
    }

    /// Number of committed render passes.
    pub fn render_count(&self) -> u64 {
        self.inner.passes.get()
    }

    pub fn last_pass_stats(&self) -> PassStats {
        self.inner.last_stats.get()
    }

    pub fn is_render_scheduled(&self) -> bool {
        self.inner.latch.is_scheduled()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }

    /// Number of identity paths currently holding hook slots.
    pub fn hook_path_count(&self) -> usize {
        self.inner.hooks.borrow().path_count()
    }

    /// Number of hook slots stored for `path`.
    pub fn hook_slot_count(&self, path: &str) -> usize {
        self.inner.hooks.borrow().slot_count(path)
    }
}

impl<H: Host + 'static> fmt::Debug for Renderer<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("container", &self.inner.container.get())
            .field("passes", &self.inner.passes.get())
            .field("scheduled", &self.inner.latch.is_scheduled())
            .field("poisoned", &self.inner.poisoned.get())
            .finish()
    }
}
