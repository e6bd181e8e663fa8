//! Per-path hook slots and the `use_state` / `use_effect` primitives.
//!
//! Every component identity path owns an ordered list of slots addressed by a
//! cursor. The cursor is reset to zero when the component is entered and each
//! hook call advances it by exactly one, so a component must issue the same
//! hook calls in the same order on every render. A slot holding a different
//! hook kind or value type than requested is reported as
//! [`RenderError::HookMismatch`] instead of being reinterpreted.
//!
//! Hooks find their store through the scope installed for the running render
//! pass; calling one outside a component yields
//! [`RenderError::HookOutsideComponent`].

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::collections::map::{HashSet, IndexMap};
use crate::scheduler::RenderRequest;
use crate::RenderError;

type EffectFn = Box<dyn FnOnce() -> EffectResult>;
type CleanupFn = Box<dyn FnOnce()>;

/// Values taken out of the store that must be dropped after its borrow ends,
/// since dropping user data can run arbitrary code.
type Discard = Vec<Box<dyn Any>>;

/// Outcome of an effect: an optional cleanup run before the next invocation
/// of the same effect and when its component goes away.
#[derive(Default)]
pub struct EffectResult {
    cleanup: Option<CleanupFn>,
}

impl EffectResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn cleanup(cleanup: impl FnOnce() + 'static) -> Self {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    fn into_cleanup(self) -> Option<CleanupFn> {
        self.cleanup
    }
}

impl fmt::Debug for EffectResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectResult")
            .field("has_cleanup", &self.cleanup.is_some())
            .finish()
    }
}

/// Reference to an effect slot queued for the next flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EffectRef {
    path: Rc<str>,
    cursor: usize,
}

struct EffectSlot {
    deps: Option<Box<dyn Any>>,
    effect: Option<EffectFn>,
    cleanup: Option<CleanupFn>,
}

enum HookSlot {
    State(Box<dyn Any>),
    Effect(EffectSlot),
}

#[derive(Default)]
pub(crate) struct PathSlots {
    cursor: usize,
    slots: Vec<HookSlot>,
}

impl PathSlots {
    fn into_cleanups(self) -> Vec<CleanupFn> {
        self.slots
            .into_iter()
            .filter_map(|slot| match slot {
                HookSlot::Effect(effect) => effect.cleanup,
                HookSlot::State(_) => None,
            })
            .collect()
    }
}

#[derive(Default)]
pub(crate) struct HookStore {
    paths: IndexMap<Rc<str>, PathSlots>,
    visited: HashSet<Rc<str>>,
    stack: Vec<Rc<str>>, // FUTURE(no_std): replace Vec with fixed-capacity stack storage.
    pending_effects: Vec<EffectRef>,
}

impl HookStore {
    pub(crate) fn begin_pass(&mut self) {
        self.visited.clear();
        self.stack.clear();
    }

    pub(crate) fn abort_pass(&mut self) {
        self.stack.clear();
        self.pending_effects.clear();
    }

    pub(crate) fn enter(&mut self, path: &str) {
        let key: Rc<str> = match self.paths.get_key_value(path) {
            Some((key, _)) => Rc::clone(key),
            None => Rc::from(path),
        };
        self.paths.entry(Rc::clone(&key)).or_default().cursor = 0;
        self.visited.insert(Rc::clone(&key));
        self.stack.push(key);
    }

    pub(crate) fn exit(&mut self) {
        self.stack.pop();
    }

    #[cfg(test)]
    pub(crate) fn contains_path(&self, path: &str) -> bool {
        self.paths.contains_key(path)
    }

    pub(crate) fn slot_count(&self, path: &str) -> usize {
        self.paths.get(path).map_or(0, |entry| entry.slots.len())
    }

    pub(crate) fn path_count(&self) -> usize {
        self.paths.len()
    }

    fn next_slot(&mut self) -> Result<(Rc<str>, usize), RenderError> {
        let path = self
            .stack
            .last()
            .cloned()
            .ok_or(RenderError::HookOutsideComponent)?;
        let entry = self
            .paths
            .get_mut(&*path)
            .ok_or(RenderError::HookOutsideComponent)?;
        let cursor = entry.cursor;
        entry.cursor += 1;
        Ok((path, cursor))
    }

    fn slots(&self, path: &str) -> &[HookSlot] {
        self.paths
            .get(path)
            .map_or(&[][..], |entry| entry.slots.as_slice())
    }

    fn slot_mut(&mut self, path: &str, cursor: usize) -> Option<&mut HookSlot> {
        self.paths.get_mut(path)?.slots.get_mut(cursor)
    }

    fn mismatch<T>(path: &str, cursor: usize) -> RenderError {
        RenderError::HookMismatch {
            path: path.to_owned(),
            cursor,
            expected: std::any::type_name::<T>(),
        }
    }

    fn check_new_slot(&self, path: &str, cursor: usize) -> Result<(), RenderError> {
        let len = self.slots(path).len();
        if cursor > len {
            return Err(RenderError::HookCursorGap {
                path: path.to_owned(),
                cursor,
                len,
            });
        }
        Ok(())
    }

    /// `Ok(None)` means this is the first visit of the slot.
    fn read_state<T: Clone + 'static>(
        &self,
        path: &str,
        cursor: usize,
    ) -> Result<Option<T>, RenderError> {
        match self.slots(path).get(cursor) {
            Some(HookSlot::State(value)) => value
                .downcast_ref::<T>()
                .cloned()
                .map(Some)
                .ok_or_else(|| Self::mismatch::<T>(path, cursor)),
            Some(HookSlot::Effect(_)) => Err(Self::mismatch::<T>(path, cursor)),
            None => self.check_new_slot(path, cursor).map(|()| None),
        }
    }

    fn insert_state<T: 'static>(&mut self, path: &str, cursor: usize, value: T) {
        if let Some(entry) = self.paths.get_mut(path) {
            debug_assert_eq!(entry.slots.len(), cursor);
            entry.slots.push(HookSlot::State(Box::new(value)));
        }
    }

    fn current_state<T: Clone + 'static>(&self, path: &str, cursor: usize) -> Option<T> {
        match self.slots(path).get(cursor)? {
            HookSlot::State(value) => value.downcast_ref::<T>().cloned(),
            HookSlot::Effect(_) => None,
        }
    }

    /// Returns the replaced value, or `None` when the slot no longer exists.
    fn write_state<T: 'static>(
        &mut self,
        path: &str,
        cursor: usize,
        value: T,
    ) -> Option<Box<dyn Any>> {
        match self.slot_mut(path, cursor)? {
            HookSlot::State(current) => Some(std::mem::replace(current, Box::new(value))),
            HookSlot::Effect(_) => None,
        }
    }

    fn check_effect_slot(&self, path: &str, cursor: usize) -> Result<(), RenderError> {
        match self.slots(path).get(cursor) {
            Some(HookSlot::Effect(_)) => Ok(()),
            Some(HookSlot::State(_)) => Err(Self::mismatch::<EffectResult>(path, cursor)),
            None => self.check_new_slot(path, cursor),
        }
    }

    fn record_effect<D: PartialEq + 'static>(
        &mut self,
        path: Rc<str>,
        cursor: usize,
        deps: Option<D>,
        effect: EffectFn,
    ) -> Discard {
        let mut discard: Discard = Vec::new();
        let enqueue = match self.slot_mut(&path, cursor) {
            Some(HookSlot::Effect(slot)) => {
                let changed = match (&slot.deps, &deps) {
                    (Some(previous), Some(next)) => previous
                        .downcast_ref::<D>()
                        .map_or(true, |previous| previous != next),
                    _ => true,
                };
                if changed {
                    if let Some(previous) = slot.deps.take() {
                        discard.push(previous);
                    }
                    slot.deps = deps.map(|deps| Box::new(deps) as Box<dyn Any>);
                    if let Some(stale) = slot.effect.replace(effect) {
                        discard.push(Box::new(stale));
                    }
                    true
                } else {
                    discard.push(Box::new(effect));
                    if let Some(deps) = deps {
                        discard.push(Box::new(deps));
                    }
                    // Still holding an effect that never ran, e.g. after an aborted pass.
                    slot.effect.is_some()
                }
            }
            Some(HookSlot::State(_)) => {
                discard.push(Box::new(effect));
                false
            }
            None => {
                if let Some(entry) = self.paths.get_mut(&*path) {
                    entry.slots.push(HookSlot::Effect(EffectSlot {
                        deps: deps.map(|deps| Box::new(deps) as Box<dyn Any>),
                        effect: Some(effect),
                        cleanup: None,
                    }));
                }
                true
            }
        };
        if enqueue {
            self.pending_effects.push(EffectRef { path, cursor });
        }
        discard
    }

    pub(crate) fn take_pending_effects(&mut self) -> Vec<EffectRef> {
        std::mem::take(&mut self.pending_effects)
    }

    fn take_effect(&mut self, entry: &EffectRef) -> Option<(Option<CleanupFn>, EffectFn)> {
        match self.slot_mut(&entry.path, entry.cursor)? {
            HookSlot::Effect(slot) => {
                let effect = slot.effect.take()?;
                Some((slot.cleanup.take(), effect))
            }
            HookSlot::State(_) => None,
        }
    }

    /// Hands the cleanup back when its slot disappeared while the effect ran.
    fn store_cleanup(&mut self, entry: &EffectRef, cleanup: Option<CleanupFn>) -> Option<CleanupFn> {
        match self.slot_mut(&entry.path, entry.cursor) {
            Some(HookSlot::Effect(slot)) => {
                slot.cleanup = cleanup;
                None
            }
            _ => cleanup,
        }
    }

    /// Removes every path not entered since [`HookStore::begin_pass`].
    pub(crate) fn collect_unvisited(&mut self) -> Vec<(Rc<str>, PathSlots)> {
        let paths = std::mem::take(&mut self.paths);
        let mut removed = Vec::new();
        for (path, slots) in paths {
            if self.visited.contains(&path) {
                self.paths.insert(path, slots);
            } else {
                removed.push((path, slots));
            }
        }
        removed
    }

    pub(crate) fn clear(&mut self) -> Vec<(Rc<str>, PathSlots)> {
        self.visited.clear();
        self.stack.clear();
        self.pending_effects.clear();
        std::mem::take(&mut self.paths).into_iter().collect()
    }
}

/// Runs the effect cleanups of removed paths, in path then slot order.
pub(crate) fn dispose(removed: Vec<(Rc<str>, PathSlots)>) {
    for (path, slots) in removed {
        log::trace!("disposing hook slots of {path}");
        for cleanup in slots.into_cleanups() {
            cleanup();
        }
    }
}

/// Runs queued effects: the previous cleanup first, then the effect itself.
pub(crate) fn flush_effects(store: &RefCell<HookStore>, queue: Vec<EffectRef>) {
    for entry in queue {
        let taken = store.borrow_mut().take_effect(&entry);
        let Some((cleanup, effect)) = taken else {
            continue;
        };
        if let Some(cleanup) = cleanup {
            cleanup();
        }
        let cleanup = effect().into_cleanup();
        let orphaned = store.borrow_mut().store_cleanup(&entry, cleanup);
        if let Some(cleanup) = orphaned {
            cleanup();
        }
    }
}

/// Hook store plus the render entry point of the renderer that owns it.
#[derive(Clone)]
pub(crate) struct HookScope {
    store: Rc<RefCell<HookStore>>,
    requester: Weak<dyn RenderRequest>,
}

thread_local! {
    static ACTIVE_SCOPES: RefCell<Vec<HookScope>> = RefCell::new(Vec::new()); // FUTURE(no_std): move to bounded stack storage.
}

impl HookScope {
    pub(crate) fn new(store: Rc<RefCell<HookStore>>, requester: Weak<dyn RenderRequest>) -> Self {
        Self { store, requester }
    }

    /// Makes this scope the target of hook calls made inside `f`.
    pub(crate) fn install<R>(&self, f: impl FnOnce() -> R) -> R {
        ACTIVE_SCOPES.with(|stack| stack.borrow_mut().push(self.clone()));
        struct Guard;
        impl Drop for Guard {
            fn drop(&mut self) {
                ACTIVE_SCOPES.with(|stack| {
                    stack.borrow_mut().pop();
                });
            }
        }
        let guard = Guard;
        let result = f();
        drop(guard);
        result
    }

    pub(crate) fn enter_component(&self, path: &str) {
        self.store.borrow_mut().enter(path);
    }

    pub(crate) fn exit_component(&self) {
        self.store.borrow_mut().exit();
    }
}

fn active_scope() -> Result<HookScope, RenderError> {
    ACTIVE_SCOPES
        .with(|stack| stack.borrow().last().cloned())
        .ok_or(RenderError::HookOutsideComponent)
}

/// Persistent state for the calling component.
///
/// On the first render `init` provides the value; afterwards the stored value
/// is returned and `init` is not called. The setter schedules a render only
/// when the new value differs from the stored one.
pub fn use_state<T, F>(init: F) -> Result<(T, StateSetter<T>), RenderError>
where
    T: Clone + PartialEq + 'static,
    F: FnOnce() -> T,
{
    let scope = active_scope()?;
    let (path, cursor) = scope.store.borrow_mut().next_slot()?;
    let existing = scope.store.borrow().read_state::<T>(&path, cursor)?;
    let value = match existing {
        Some(value) => value,
        None => {
            let value = init();
            scope
                .store
                .borrow_mut()
                .insert_state(&path, cursor, value.clone());
            value
        }
    };
    let setter = StateSetter {
        store: Rc::downgrade(&scope.store),
        requester: scope.requester.clone(),
        path,
        cursor,
        _marker: PhantomData,
    };
    Ok((value, setter))
}

/// Schedules `effect` after every render of the calling component.
pub fn use_effect<F>(effect: F) -> Result<(), RenderError>
where
    F: FnOnce() -> EffectResult + 'static,
{
    register_effect::<()>(None, Box::new(effect))
}

/// Schedules `effect` on the first render and whenever `deps` changes.
pub fn use_effect_with<D, F>(deps: D, effect: F) -> Result<(), RenderError>
where
    D: PartialEq + 'static,
    F: FnOnce() -> EffectResult + 'static,
{
    register_effect(Some(deps), Box::new(effect))
}

fn register_effect<D: PartialEq + 'static>(
    deps: Option<D>,
    effect: EffectFn,
) -> Result<(), RenderError> {
    let scope = active_scope()?;
    let discard = {
        let mut store = scope.store.borrow_mut();
        let (path, cursor) = store.next_slot()?;
        store.check_effect_slot(&path, cursor)?;
        store.record_effect(path, cursor, deps, effect)
    };
    drop(discard);
    Ok(())
}

/// Writes to one state slot. Cheap to clone; outlives its component safely.
///
/// A new value is compared with the stored one through `PartialEq`. Setting a
/// value equal to the current one is dropped entirely: no render is scheduled,
/// so even a [`use_effect`] without dependencies does not run again. Types
/// that need every write to count should carry a version or use a type whose
/// equality is identity, such as a wrapper comparing `Rc::ptr_eq`.
pub struct StateSetter<T> {
    store: Weak<RefCell<HookStore>>,
    requester: Weak<dyn RenderRequest>,
    path: Rc<str>,
    cursor: usize,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T: Clone + PartialEq + 'static> StateSetter<T> {
    pub fn set(&self, value: T) {
        self.update(move |_| value);
    }

    /// Computes the next value from the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let Some(store) = self.store.upgrade() else {
            return;
        };
        let current = store.borrow().current_state::<T>(&self.path, self.cursor);
        let Some(current) = current else {
            log::trace!(
                "ignoring state update for unmounted {}#{}",
                self.path,
                self.cursor
            );
            return;
        };
        let next = f(&current);
        if next == current {
            return;
        }
        let replaced = store
            .borrow_mut()
            .write_state(&self.path, self.cursor, next);
        if replaced.is_none() {
            return;
        }
        drop(replaced);
        if let Some(requester) = self.requester.upgrade() {
            requester.request_render();
        }
    }
}

impl<T> StateSetter<T> {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            store: Weak::clone(&self.store),
            requester: Weak::clone(&self.requester),
            path: Rc::clone(&self.path),
            cursor: self.cursor,
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for StateSetter<T> {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.store, &other.store)
            && self.path == other.path
            && self.cursor == other.cursor
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("path", &self.path)
            .field("cursor", &self.cursor)
            .finish()
    }
}
