//! Render coalescing.

use std::cell::Cell;

/// Entry point a state setter uses to ask for another render pass.
pub(crate) trait RenderRequest {
    fn request_render(&self);
}

/// Boolean latch that admits one scheduled pass per pending period.
///
/// The first [`RenderLatch::try_schedule`] after a release wins; later calls
/// are absorbed until the scheduled pass releases the latch right before it
/// starts, so changes made during that pass schedule a fresh one.
#[derive(Debug, Default)]
pub(crate) struct RenderLatch {
    scheduled: Cell<bool>,
}

impl RenderLatch {
    pub(crate) fn try_schedule(&self) -> bool {
        !self.scheduled.replace(true)
    }

    pub(crate) fn release(&self) {
        self.scheduled.set(false);
    }

    pub(crate) fn is_scheduled(&self) -> bool {
        self.scheduled.get()
    }
}
