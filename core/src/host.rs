use crate::backend::Backend;
use crate::identity::StateId;
use crate::scheduler::Scheduler;
use crate::state::{Message, Runtime};
use crate::view::View;
use crate::view_tree::ViewTree;
use crossbeam::channel::{Receiver, TryRecvError};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// The update lane: owns the receiving end of the runtime’s channel and performs all state
/// writes and reconciliation passes.
///
/// A host is not `Send`; it stays on the thread that created it. Everything else talks to it
/// through the [`Runtime`].
pub struct Host {
    runtime: Runtime,
    receiver: Receiver<Message>,
    scheduler: Scheduler,
    /// Signals raised since the last pass that ran.
    raised: Vec<StateId>,
}

/// What a batch of messages asked for.
#[derive(Debug, Default)]
struct Pending {
    update: bool,
    force: bool,
    quit: bool,
}

impl Host {
    /// Creates a host with a fresh runtime.
    pub fn new() -> Host {
        let (runtime, receiver) = Runtime::new();
        Host {
            scheduler: Scheduler::new(runtime.clone()),
            runtime,
            receiver,
            raised: Vec::new(),
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Registers a redraw callback with the scheduler.
    pub fn register(&mut self, callback: impl FnMut(bool) + 'static) {
        self.scheduler.register(callback);
    }

    /// Mounts a view tree: runs the first pass right away and re-renders the tree on every
    /// subsequent update.
    pub fn mount<B: Backend>(&mut self, backend: B, root: impl View<B>) -> Mount<B> {
        let tree = ViewTree::new(self.runtime.clone(), backend, root);
        let tree = Rc::new(RefCell::new(tree));
        tree.borrow_mut().render(true);

        let redraw = Rc::clone(&tree);
        self.scheduler
            .register(move |force| redraw.borrow_mut().render(force));
        Mount { tree }
    }

    /// Applies pending writes, then runs an update pass unless updates are blocked.
    ///
    /// The pass is forced if `force` is set or if any pending write was made through a
    /// forcing state cell.
    pub fn request_update(&mut self, force: bool) {
        let mut pending = Pending::default();
        self.drain(&mut pending);
        self.update(force || pending.force);
    }

    /// Handles every queued message without blocking and runs at most one update pass.
    ///
    /// Returns false once a quit message was received.
    pub fn poll(&mut self) -> bool {
        let mut pending = Pending::default();
        self.drain(&mut pending);
        if pending.update {
            self.update(pending.force);
        }
        !pending.quit
    }

    /// Handles messages until [`Runtime::quit`] is called.
    pub fn run(&mut self) {
        log::debug!("update lane running");
        while let Ok(message) = self.receiver.recv() {
            let mut pending = Pending::default();
            self.handle(message, &mut pending);
            self.drain(&mut pending);
            if pending.update {
                self.update(pending.force);
            }
            if pending.quit {
                break;
            }
        }
        log::debug!("update lane stopped");
    }

    fn drain(&mut self, pending: &mut Pending) {
        loop {
            match self.receiver.try_recv() {
                Ok(message) => self.handle(message, pending),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn handle(&mut self, message: Message, pending: &mut Pending) {
        match message {
            Message::Write { id, force, apply } => {
                apply(&self.runtime);
                self.runtime.store().mark_dirty(id);
                pending.update = true;
                pending.force |= force;
            }
            Message::Signal { id } => {
                let mut store = self.runtime.store();
                store.set(id, true);
                store.mark_dirty(id);
                self.raised.push(id);
                pending.update = true;
            }
            Message::Update { force } => {
                pending.update = true;
                pending.force |= force;
            }
            Message::Quit => pending.quit = true,
        }
    }

    fn update(&mut self, force: bool) {
        if !self.scheduler.request_update(force) {
            return;
        }
        let mut store = self.runtime.store();
        let cleared = store.take_dirty();
        if !cleared.is_empty() {
            log::trace!("cleared {} dirty slots", cleared.len());
        }
        for id in self.raised.drain(..) {
            // released while raised
            if store.contains(id) {
                store.set(id, false);
            }
        }
    }
}

impl Default for Host {
    fn default() -> Host {
        Host::new()
    }
}

/// A shared handle to a mounted [`ViewTree`].
///
/// Don’t hold on to a borrow while the host runs an update.
pub struct Mount<B: Backend> {
    tree: Rc<RefCell<ViewTree<B>>>,
}

impl<B: Backend> Clone for Mount<B> {
    fn clone(&self) -> Self {
        Mount {
            tree: Rc::clone(&self.tree),
        }
    }
}

impl<B: Backend> Mount<B> {
    pub fn tree(&self) -> Ref<'_, ViewTree<B>> {
        self.tree.borrow()
    }

    pub fn tree_mut(&self) -> RefMut<'_, ViewTree<B>> {
        self.tree.borrow_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Button, RecordingBackend};
    use std::cell::Cell;

    #[test]
    fn writes_coalesce_into_one_pass() {
        let mut host = Host::new();
        let mount = host.mount(RecordingBackend::new(), Button::new("a"));
        assert_eq!(mount.tree().passes(), 1);

        let state = host.runtime().state(|| 0);
        state.set(1);
        state.set(2);
        state.update(|v| *v += 1);
        assert!(host.poll());
        assert_eq!(mount.tree().passes(), 2);
        assert_eq!(state.get(), 3);
        assert!(!host.runtime().store().is_dirty(state.id()));

        // nothing queued: nothing to do
        assert!(host.poll());
        assert_eq!(mount.tree().passes(), 2);
    }

    #[test]
    fn forcing_writes_force_the_pass() {
        let mut host = Host::new();
        let seen = Rc::new(Cell::new(None));
        let seen2 = Rc::clone(&seen);
        host.register(move |force| seen2.set(Some(force)));

        let state = host.runtime().state(|| 0).force_updates(true);
        state.set(1);
        host.poll();
        assert_eq!(seen.get(), Some(true));

        host.runtime().state(|| 0).set(1);
        host.poll();
        assert_eq!(seen.get(), Some(false));
    }

    #[test]
    fn dirty_flags_survive_blocked_updates() {
        let mut host = Host::new();
        let state = host.runtime().state(|| 0);
        host.runtime().block();
        state.set(5);
        host.poll();
        assert!(host.runtime().store().is_dirty(state.id()));
        host.runtime().unblock();
        host.request_update(false);
        assert!(!host.runtime().store().is_dirty(state.id()));
    }

    #[test]
    fn signals_are_lowered_after_one_pass() {
        let mut host = Host::new();
        let signal = host.runtime().signal();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let observer = signal.clone();
        let seen2 = Rc::clone(&seen);
        host.register(move |_| seen2.borrow_mut().push(observer.is_active()));

        signal.fire();
        host.poll();
        host.request_update(false);
        assert_eq!(*seen.borrow(), [true, false]);
        assert!(!host.runtime().store().is_dirty(signal.id()));
    }

    #[test]
    fn signals_wait_for_blocked_updates() {
        let mut host = Host::new();
        let signal = host.runtime().signal();
        host.runtime().block();
        signal.fire();
        host.poll();
        assert!(signal.is_active());
        host.runtime().unblock();
        host.request_update(false);
        assert!(!signal.is_active());
    }

    #[test]
    fn run_stops_on_quit() {
        let mut host = Host::new();
        let runtime = host.runtime().clone();
        let state = runtime.state(|| 0_u32);
        let writer = std::thread::spawn(move || {
            for _ in 0..10 {
                state.update(|v| *v += 1);
            }
            runtime.quit();
            state
        });
        host.run();
        let state = writer.join().unwrap();
        assert_eq!(state.get(), 10);
    }
}
