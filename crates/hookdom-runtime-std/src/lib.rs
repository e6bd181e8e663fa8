//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides a concrete implementation of the platform
//! abstraction defined in `hookdom-core`. Applications can construct a
//! [`StdRuntime`] and pass its runtime to [`hookdom_core::Renderer::with_runtime`]
//! so an event loop learns when queued renders and effects need a turn.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use hookdom_core::{Runtime, RuntimeHandle, RuntimeScheduler};

type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Scheduler that records drain requests and forwards them to a waker.
pub struct StdScheduler {
    drain_requested: AtomicBool,
    waker: RwLock<Option<Waker>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            drain_requested: AtomicBool::new(false),
            waker: RwLock::new(None),
        }
    }

    /// Returns whether a drain has been requested since the last call.
    pub fn take_drain_request(&self) -> bool {
        self.drain_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker that will be invoked whenever work is queued on an idle runtime.
    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self.waker.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(waker));
    }

    /// Clears any registered waker.
    pub fn clear_waker(&self) {
        *self.waker.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn wake(&self) {
        let waker = self
            .waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field(
                "drain_requested",
                &self.drain_requested.load(Ordering::SeqCst),
            )
            .finish()
    }
}

impl RuntimeScheduler for StdScheduler {
    fn request_drain(&self) {
        self.drain_requested.store(true, Ordering::SeqCst);
        log::trace!("runtime drain requested");
        self.wake();
    }
}

/// Convenience container bundling the standard scheduler with a runtime.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    runtime: Runtime,
}

impl StdRuntime {
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self { scheduler, runtime }
    }

    /// Returns a [`hookdom_core::Runtime`] configured with the standard scheduler.
    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn take_drain_request(&self) -> bool {
        self.scheduler.take_drain_request()
    }

    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_waker(waker);
    }

    pub fn clear_waker(&self) {
        self.scheduler.clear_waker();
    }

    /// Services pending drain requests until the runtime is idle.
    ///
    /// Returns the number of tasks executed.
    pub fn pump(&self) -> usize {
        let mut executed = 0;
        while self.take_drain_request() || self.runtime.has_pending_tasks() {
            executed += self.runtime.run_until_idle();
            if self.runtime.has_pending_tasks() {
                break;
            }
        }
        executed
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("runtime", &self.runtime)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::AtomicUsize;

    use hookdom_core::{use_state, MemoryHost, Props, Renderer, StateSetter, VNode};

    use super::*;

    #[test]
    fn std_runtime_requests_drain_and_renders_on_state_change() {
        let runtime = StdRuntime::new();
        let wakes = Arc::new(AtomicUsize::new(0));
        {
            let wakes = Arc::clone(&wakes);
            runtime.set_waker(move || {
                wakes.fetch_add(1, Ordering::SeqCst);
            });
        }

        let mut host = MemoryHost::new();
        let container = host.create_container();
        let renderer = Renderer::with_runtime(host, runtime.runtime());
        let slot: Rc<RefCell<Option<StateSetter<i32>>>> = Rc::default();
        let captured = Rc::clone(&slot);
        renderer
            .mount(
                VNode::component(move |_: &Props| {
                    let (value, set_value) = use_state(|| 0)?;
                    *captured.borrow_mut() = Some(set_value);
                    Ok(Some(VNode::text(value.to_string())))
                }),
                container,
            )
            .expect("initial render");
        assert!(!runtime.take_drain_request());

        let setter = slot.borrow().clone().expect("setter captured during render");
        setter.set(1);

        assert!(runtime.take_drain_request(), "state change should request a drain");
        assert_eq!(wakes.load(Ordering::SeqCst), 1);

        assert_eq!(runtime.pump(), 1);
        assert_eq!(renderer.with_host(|host| host.markup(container)), "1");
        assert_eq!(renderer.render_count(), 2);
    }

    #[test]
    fn cleared_waker_is_not_called() {
        let runtime = StdRuntime::new();
        let wakes = Arc::new(AtomicUsize::new(0));
        {
            let wakes = Arc::clone(&wakes);
            runtime.set_waker(move || {
                wakes.fetch_add(1, Ordering::SeqCst);
            });
        }
        runtime.clear_waker();

        runtime.runtime().spawn_task(|| {});

        assert_eq!(wakes.load(Ordering::SeqCst), 0);
        assert!(runtime.take_drain_request());
        assert_eq!(runtime.pump(), 1);
    }
}
