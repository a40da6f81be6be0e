//! State cells and the runtime context they live in.

use crate::identity::{IdentityStore, StateId};
use core::any::Any;
use core::fmt;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Messages sent to the update lane.
pub(crate) enum Message {
    /// Applies a state write on the lane and marks the slot dirty.
    Write {
        id: StateId,
        force: bool,
        apply: Box<dyn FnOnce(&Runtime) + Send>,
    },
    /// Raises a signal for the next pass.
    Signal { id: StateId },
    /// Requests an update pass without writing anything.
    Update { force: bool },
    /// Stops [`Host::run`](crate::Host::run).
    Quit,
}

struct RuntimeInner {
    store: Mutex<IdentityStore>,
    blocked: AtomicBool,
    sender: Sender<Message>,
}

/// Shared context for one UI root: the identity store, the update-blocking flag, and a way to
/// reach the update lane.
///
/// Cheap to clone and usable from any thread. Created by [`Host::new`](crate::Host::new).
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    pub(crate) fn new() -> (Runtime, Receiver<Message>) {
        let (sender, receiver) = channel::unbounded();
        let runtime = Runtime {
            inner: Arc::new(RuntimeInner {
                store: Mutex::new(IdentityStore::new()),
                blocked: AtomicBool::new(false),
                sender,
            }),
        };
        (runtime, receiver)
    }

    /// Locks the identity store.
    ///
    /// Don’t hold on to the guard while calling into views or state cells.
    pub fn store(&self) -> MutexGuard<'_, IdentityStore> {
        self.inner.store.lock()
    }

    /// Creates a state cell with a fresh identity that isn’t bound to any view yet.
    ///
    /// Inside a view body, prefer [`Scope::state`](crate::Scope::state), which keeps the same
    /// identity across passes.
    pub fn state<T>(&self, init: impl Fn() -> T + Send + Sync + 'static) -> State<T>
    where
        T: Any + Clone + Send,
    {
        State::new(self.clone(), StateId::new(), Arc::new(init))
    }

    /// Creates a [`Signal`] that isn’t bound to any view.
    pub fn signal(&self) -> Signal {
        Signal::new(self.state(|| false))
    }

    /// Suppresses all update requests until [`unblock`](Runtime::unblock) is called.
    ///
    /// Writes made while blocked are still applied; they are observed by the next update.
    pub fn block(&self) {
        self.inner.blocked.store(true, Ordering::SeqCst);
    }

    pub fn unblock(&self) {
        self.inner.blocked.store(false, Ordering::SeqCst);
    }

    pub fn is_blocked(&self) -> bool {
        self.inner.blocked.load(Ordering::SeqCst)
    }

    /// Asks the update lane for a pass.
    pub fn request_update(&self, force: bool) {
        self.send(Message::Update { force });
    }

    /// Asks the update lane to stop running.
    pub fn quit(&self) {
        self.send(Message::Quit);
    }

    pub(crate) fn send(&self, message: Message) {
        if self.inner.sender.send(message).is_err() {
            log::warn!("update lane is gone; dropping message");
        }
    }

    /// True if both handles refer to the same runtime.
    pub fn ptr_eq(&self, other: &Runtime) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("slots", &self.store().len())
            .field("blocked", &self.is_blocked())
            .finish()
    }
}

/// A handle to a piece of state that persists across view passes.
///
/// Reading is synchronous. Writing is not: writes are sent to the update lane, applied there,
/// and then trigger an update pass. A value written from a background thread is therefore
/// seen by the next pass, never by the current one.
pub struct State<T> {
    id: StateId,
    force: bool,
    init: Arc<dyn Fn() -> T + Send + Sync>,
    runtime: Runtime,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        State {
            id: self.id,
            force: self.force,
            init: Arc::clone(&self.init),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("State")
            .field("id", &self.id)
            .field("force", &self.force)
            .finish()
    }
}

impl<T: Any + Clone + Send> State<T> {
    pub(crate) fn new(
        runtime: Runtime,
        id: StateId,
        init: Arc<dyn Fn() -> T + Send + Sync>,
    ) -> State<T> {
        State {
            id,
            force: false,
            init,
            runtime,
        }
    }

    /// If set, writes through this cell force a property update of the entire tree.
    pub fn force_updates(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn is_forcing(&self) -> bool {
        self.force
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Returns the current value, initializing the slot if it is empty.
    ///
    /// The initializer runs outside the store lock so it may read other state. If another
    /// thread initializes the slot first, that value wins.
    pub fn get(&self) -> T {
        if let Some(value) = self.runtime.store().get::<T>(self.id) {
            return value;
        }
        let value = (self.init)();
        self.runtime.store().init(self.id, value)
    }

    /// Calls `f` with the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.get())
    }

    /// Replaces the value.
    pub fn set(&self, value: T) {
        let id = self.id;
        self.runtime.send(Message::Write {
            id,
            force: self.force,
            apply: Box::new(move |runtime: &Runtime| runtime.store().set(id, value)),
        });
    }

    /// Modifies the value in place, on the update lane.
    ///
    /// Unlike `set(f(get()))`, concurrent updates don’t overwrite each other.
    pub fn update(&self, f: impl FnOnce(&mut T) + Send + 'static) {
        let id = self.id;
        let init = Arc::clone(&self.init);
        self.runtime.send(Message::Write {
            id,
            force: self.force,
            apply: Box::new(move |runtime: &Runtime| {
                let current = runtime.store().get::<T>(id);
                let mut value = current.unwrap_or_else(|| init());
                f(&mut value);
                runtime.store().set(id, value);
            }),
        });
    }

    /// Returns a binding that reads and writes this cell.
    pub fn binding(&self) -> Binding<T> {
        let get = self.clone();
        let set = self.clone();
        Binding::new(move || get.get(), move |value| set.set(value))
    }
}

/// A one-shot trigger.
///
/// [`fire`](Signal::fire) raises the signal and requests a pass. It reads as active during
/// the first pass that runs afterwards and is lowered again once that pass is done.
#[derive(Clone, Debug)]
pub struct Signal {
    state: State<bool>,
}

impl Signal {
    pub(crate) fn new(state: State<bool>) -> Signal {
        Signal { state }
    }

    pub fn id(&self) -> StateId {
        self.state.id()
    }

    pub fn fire(&self) {
        self.state.runtime().send(Message::Signal { id: self.id() });
    }

    /// True while the pass triggered by [`fire`](Signal::fire) runs.
    pub fn is_active(&self) -> bool {
        self.state.get()
    }
}

/// A read/write view onto a value owned by someone else, usually a parent’s [`State`].
pub struct Binding<T> {
    get: Arc<dyn Fn() -> T + Send + Sync>,
    set: Arc<dyn Fn(T) + Send + Sync>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Binding {
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<T> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Binding")
    }
}

impl<T: 'static> Binding<T> {
    pub fn new(
        get: impl Fn() -> T + Send + Sync + 'static,
        set: impl Fn(T) + Send + Sync + 'static,
    ) -> Binding<T> {
        Binding {
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    /// A binding that always reads `value` and ignores writes.
    pub fn constant(value: T) -> Binding<T>
    where
        T: Clone + Send + Sync,
    {
        Binding::new(move || value.clone(), |_| {})
    }

    pub fn get(&self) -> T {
        (self.get)()
    }

    pub fn set(&self, value: T) {
        (self.set)(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn apply_all(runtime: &Runtime, receiver: &Receiver<Message>) -> Vec<(StateId, bool)> {
        let mut writes = Vec::new();
        while let Ok(message) = receiver.try_recv() {
            if let Message::Write { id, force, apply } = message {
                apply(runtime);
                writes.push((id, force));
            }
        }
        writes
    }

    #[test]
    fn lazy_init_runs_once() {
        let (runtime, _receiver) = Runtime::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let state = runtime.state(move || {
            calls2.fetch_add(1, Ordering::SeqCst);
            10_i32
        });

        assert_eq!(state.get(), 10);
        assert_eq!(state.get(), 10);
        assert_eq!(state.clone().get(), 10);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn writes_are_deferred_to_the_lane() {
        let (runtime, receiver) = Runtime::new();
        let state = runtime.state(|| String::from("a"));
        assert_eq!(state.get(), "a");

        state.set(String::from("b"));
        assert_eq!(state.get(), "a", "write must not land before the lane applies it");

        let writes = apply_all(&runtime, &receiver);
        assert_eq!(writes, vec![(state.id(), false)]);
        assert_eq!(state.get(), "b");
        assert!(!runtime.store().is_dirty(state.id()), "applying does not dirty by itself");
    }

    #[test]
    fn updates_compose() {
        let (runtime, receiver) = Runtime::new();
        let state = runtime.state(|| 1_u64).force_updates(true);
        state.update(|v| *v += 1);
        state.update(|v| *v *= 10);

        let writes = apply_all(&runtime, &receiver);
        assert_eq!(writes.len(), 2);
        assert!(writes.iter().all(|(_, force)| *force));
        assert_eq!(state.get(), 20);
    }

    #[test]
    fn writes_from_other_threads() {
        let (runtime, receiver) = Runtime::new();
        let state = runtime.state(|| 0_usize);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || state.update(|v| *v += 1))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        apply_all(&runtime, &receiver);
        assert_eq!(state.get(), 4);
    }

    #[test]
    fn bindings_write_through() {
        let (runtime, receiver) = Runtime::new();
        let state = runtime.state(|| 1_i64);
        let binding = state.binding();
        assert_eq!(binding.get(), 1);
        binding.set(7);
        apply_all(&runtime, &receiver);
        assert_eq!(binding.get(), 7);

        let constant = Binding::constant("x");
        constant.set("y");
        assert_eq!(constant.get(), "x");
    }

    #[test]
    fn signals_travel_to_the_lane() {
        let (runtime, receiver) = Runtime::new();
        let signal = runtime.signal();
        signal.fire();
        assert!(!signal.is_active(), "raised on the lane, not here");
        match receiver.try_recv() {
            Ok(Message::Signal { id }) => assert_eq!(id, signal.id()),
            _ => panic!("expected a signal message"),
        }
    }

    #[test]
    fn blocking_flag() {
        let (runtime, _receiver) = Runtime::new();
        assert!(!runtime.is_blocked());
        runtime.block();
        assert!(runtime.clone().is_blocked());
        runtime.unblock();
        assert!(!runtime.is_blocked());
    }

    #[test]
    fn sending_without_a_lane_is_harmless() {
        let (runtime, receiver) = Runtime::new();
        drop(receiver);
        let state = runtime.state(|| 0_u8);
        state.set(1);
        runtime.request_update(false);
        assert_eq!(state.get(), 0);
    }
}
