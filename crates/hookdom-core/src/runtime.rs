use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::platform::RuntimeScheduler;

/// Upper bound on the turns [`Runtime::run_until_idle`] will run.
pub const MAX_IDLE_TURNS: usize = 1024;

type Task = Box<dyn FnOnce() + 'static>;

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    pending_tasks: RefCell<VecDeque<Task>>, // FUTURE(no_std): migrate to ring buffer.
    turns: Cell<u64>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            scheduler,
            pending_tasks: RefCell::new(VecDeque::new()),
            turns: Cell::new(0),
        }
    }

    fn enqueue_task(&self, task: Task) {
        let was_idle = {
            let mut pending = self.pending_tasks.borrow_mut();
            let was_idle = pending.is_empty();
            pending.push_back(task);
            was_idle
        };
        if was_idle {
            self.scheduler.request_drain();
        }
    }

    /// Runs the tasks queued before this call; tasks they spawn wait for the next turn.
    fn drain_once(&self) -> usize {
        let tasks: Vec<Task> = {
            // FUTURE(no_std): return stack-allocated smallvec.
            let mut pending = self.pending_tasks.borrow_mut();
            pending.drain(..).collect()
        };
        if tasks.is_empty() {
            return 0;
        }
        self.turns.set(self.turns.get() + 1);
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }

    fn pending_task_count(&self) -> usize {
        self.pending_tasks.borrow().len()
    }
}

/// Single-threaded FIFO task pump.
///
/// Every deferral in the engine (scheduled render passes and effect flushes)
/// is a task on this queue. One call to [`Runtime::drain_once`] is one
/// cooperative turn.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>, // FUTURE(no_std): replace Rc with arena-managed runtime storage.
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn spawn_task(&self, task: impl FnOnce() + 'static) {
        self.inner.enqueue_task(Box::new(task));
    }

    /// Runs one turn and returns the number of tasks executed.
    pub fn drain_once(&self) -> usize {
        self.inner.drain_once()
    }

    /// Runs turns until the queue is empty or [`MAX_IDLE_TURNS`] is reached.
    ///
    /// Returns the number of tasks executed.
    pub fn run_until_idle(&self) -> usize {
        let mut executed = 0;
        for _ in 0..MAX_IDLE_TURNS {
            if !self.has_pending_tasks() {
                return executed;
            }
            executed += self.drain_once();
        }
        if self.has_pending_tasks() {
            log::warn!(
                "runtime still busy after {MAX_IDLE_TURNS} turns; {} tasks pending",
                self.inner.pending_task_count()
            );
        }
        executed
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.inner.pending_task_count() > 0
    }

    pub fn pending_task_count(&self) -> usize {
        self.inner.pending_task_count()
    }

    /// Number of non-empty turns run so far.
    pub fn turns(&self) -> u64 {
        self.inner.turns.get()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(Arc::new(DefaultScheduler))
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("pending_tasks", &self.pending_task_count())
            .field("turns", &self.turns())
            .finish()
    }
}

/// Scheduler for embedders that pump the runtime themselves.
#[derive(Debug, Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn request_drain(&self) {}
}

/// Weak reference to a [`Runtime`].
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    /// Queues `task`, or runs it immediately when the runtime is gone.
    pub fn spawn_task(&self, task: impl FnOnce() + 'static) {
        if let Some(inner) = self.0.upgrade() {
            inner.enqueue_task(Box::new(task));
        } else {
            task();
        }
    }

    pub fn drain_once(&self) -> usize {
        self.0.upgrade().map_or(0, |inner| inner.drain_once())
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.pending_task_count() > 0)
            .unwrap_or(false)
    }

    pub fn upgrade(&self) -> Option<Runtime> {
        self.0.upgrade().map(|inner| Runtime { inner })
    }
}
