use hookdom_core::{
    Event, HostError, HostNodeId, HostOp, MemoryHost, RenderError, Renderer, VNode,
};

/// Attribute [`TestRoot`] uses to locate elements.
pub const TEST_ID: &str = "data-testid";

/// Headless harness for exercising component trees in tests.
///
/// `TestRoot` owns a [`Renderer`] over a [`MemoryHost`] with its own
/// container. Nothing renders behind the test's back: scheduled passes and
/// effect flushes only happen inside [`TestRoot::pump_until_idle`] or
/// [`TestRoot::drain_once`].
pub struct TestRoot {
    renderer: Renderer<MemoryHost>,
    container: HostNodeId,
}

impl TestRoot {
    pub fn new() -> Self {
        let mut host = MemoryHost::new();
        let container = host.create_container();
        Self {
            renderer: Renderer::new(host),
            container,
        }
    }

    /// Renders `root` synchronously, reconciling against previous content.
    pub fn set_content(&mut self, root: VNode) -> Result<(), RenderError> {
        self.renderer.mount(root, self.container)
    }

    /// Runs scheduled passes and effect flushes until nothing is queued.
    ///
    /// Surfaces the error of a failed scheduled pass.
    pub fn pump_until_idle(&mut self) -> Result<(), RenderError> {
        self.renderer.runtime().run_until_idle();
        match self.renderer.take_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Runs one cooperative turn.
    pub fn drain_once(&mut self) -> usize {
        self.renderer.runtime().drain_once()
    }

    pub fn markup(&self) -> String {
        self.renderer.with_host(|host| host.markup(self.container))
    }

    pub fn take_ops(&mut self) -> Vec<HostOp> {
        self.renderer.with_host_mut(MemoryHost::take_ops)
    }

    pub fn find(&self, test_id: &str) -> Option<HostNodeId> {
        self.renderer
            .with_host(|host| host.find_by_attribute(self.container, TEST_ID, test_id))
    }

    /// Fires `event` at its target. Returns whether any listener ran.
    pub fn dispatch(&self, event: &Event) -> Result<bool, HostError> {
        self.renderer.with_host(|host| host.dispatch(event))
    }

    /// Fires `click` at the element tagged `test_id`; `false` if it is
    /// missing or has no click listener.
    pub fn click(&self, test_id: &str) -> bool {
        self.fire(test_id, Event::new("click", 0))
    }

    /// Fires `input` carrying `value` at the element tagged `test_id`.
    pub fn input(&self, test_id: &str, value: &str) -> bool {
        self.fire(test_id, Event::new("input", 0).with_value(value))
    }

    fn fire(&self, test_id: &str, mut event: Event) -> bool {
        let Some(target) = self.find(test_id) else {
            return false;
        };
        event.target = target;
        self.dispatch(&event).unwrap_or(false)
    }

    pub fn render_count(&self) -> u64 {
        self.renderer.render_count()
    }

    pub fn container(&self) -> HostNodeId {
        self.container
    }

    pub fn renderer(&self) -> &Renderer<MemoryHost> {
        &self.renderer
    }

    pub fn teardown(self) -> Result<MemoryHost, RenderError> {
        self.renderer.teardown()
    }
}

impl Default for TestRoot {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `TestRoot`.
pub fn run_test_root<R>(f: impl FnOnce(&mut TestRoot) -> R) -> R {
    let mut root = TestRoot::new();
    f(&mut root)
}
