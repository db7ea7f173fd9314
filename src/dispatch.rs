//! Callback registration and synchronous event delivery.
//!
//! The dispatcher is driven by whatever thread the MIDI transport uses to
//! deliver bytes; callbacks run synchronously on that thread, in
//! registration order, and should therefore be short. A callback that
//! panics is caught at the dispatch boundary and reported to the error
//! sink; it never disturbs later callbacks or the transport.
//!
//! The registry lock is *not* held while a callback runs, so a callback
//! may register or unregister handlers (including itself) on its own
//! session. A handler unregistered mid-dispatch is not invoked for the
//! event being delivered.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::error;

use crate::event::{EventKind, InputEvent};

/// An input event handler.
pub type Callback = Box<dyn FnMut(&InputEvent) + Send>;

/// Where callback failures are reported: event kind plus panic message.
/// The default sink logs through [`log::error!`].
pub type ErrorSink = Box<dyn FnMut(EventKind, &str) + Send>;

/// Handle returned by [`Dispatcher::register`]; pass it to
/// [`Dispatcher::unregister`] to remove the handler again.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub struct Subscription(u64);

/// Lock that shrugs off poisoning; the dispatcher must stay usable after
/// a callback panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Handler {
    id: u64,
    kind: EventKind,
    // Each callback carries its own lock so it can be invoked with the
    // registry lock released; the per-handler lock also keeps one `FnMut`
    // from ever running concurrently with itself.
    callback: Arc<Mutex<Callback>>,
}

pub struct Dispatcher {
    next_id: u64,
    handlers: Vec<Handler>,
    error_sink: Arc<Mutex<ErrorSink>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            handlers: Vec::new(),
            error_sink: Arc::new(Mutex::new(Box::new(|kind, message| {
                error!("callback for {kind:?} event failed: {message}");
            }))),
        }
    }

    /// Replace the failure sink for all subsequent dispatches.
    pub fn set_error_sink(&mut self, sink: ErrorSink) {
        self.error_sink = Arc::new(Mutex::new(sink));
    }

    pub fn register(&mut self, kind: EventKind, callback: Callback) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers.push(Handler {
            id,
            kind,
            callback: Arc::new(Mutex::new(callback)),
        });
        Subscription(id)
    }

    /// Returns whether the subscription was still registered.
    pub fn unregister(&mut self, subscription: Subscription) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|h| h.id != subscription.0);
        self.handlers.len() != before
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    fn is_registered(&self, id: u64) -> bool {
        self.handlers.iter().any(|h| h.id == id)
    }

    /// Deliver `event` to every handler registered for its kind, in
    /// registration order. Events are not queued; this returns once the
    /// last handler has run.
    ///
    /// Takes the dispatcher behind its lock rather than `&mut self`: the
    /// lock is only held to snapshot the handler list and to re-check
    /// each handler right before it runs, never while a callback is on
    /// the stack.
    pub fn dispatch(dispatcher: &Mutex<Dispatcher>, event: &InputEvent) {
        let kind = event.kind();
        let (matching, sink) = {
            let d = lock(dispatcher);
            let matching: Vec<(u64, Arc<Mutex<Callback>>)> = d
                .handlers
                .iter()
                .filter(|h| h.kind == kind)
                .map(|h| (h.id, Arc::clone(&h.callback)))
                .collect();
            (matching, Arc::clone(&d.error_sink))
        };

        for (id, callback) in matching {
            // An earlier callback (or another thread) may have
            // unregistered this handler since the snapshot.
            if !lock(dispatcher).is_registered(id) {
                continue;
            }
            let mut callback = lock(&callback);
            let outcome = catch_unwind(AssertUnwindSafe(|| (*callback)(event)));
            drop(callback);
            if let Err(panic) = outcome {
                let mut sink = lock(&sink);
                (*sink)(kind, panic_message(&*panic));
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "callback panicked"
    }
}
