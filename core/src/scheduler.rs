use crate::state::Runtime;
use core::fmt;

/// A redraw callback; receives the `force` flag of the update request.
pub type RedrawCallback = Box<dyn FnMut(bool)>;

/// Holds the redraw callbacks of one runtime.
///
/// Lives on the update lane. Callbacks can’t re-enter the scheduler: anything they do to
/// request another update goes through the runtime’s channel and is handled afterwards.
pub struct Scheduler {
    runtime: Runtime,
    callbacks: Vec<RedrawCallback>,
}

impl Scheduler {
    pub fn new(runtime: Runtime) -> Scheduler {
        Scheduler {
            runtime,
            callbacks: Vec::new(),
        }
    }

    /// Adds a callback. Callbacks are never removed.
    pub fn register(&mut self, callback: impl FnMut(bool) + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Calls every callback, in registration order, unless updates are blocked.
    ///
    /// Returns false if updates were blocked.
    pub fn request_update(&mut self, force: bool) -> bool {
        if self.runtime.is_blocked() {
            log::debug!("update suppressed; updates are blocked");
            return false;
        }
        for callback in &mut self.callbacks {
            callback(force);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}
