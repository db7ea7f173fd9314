//! The device session: one open connection to one Launchpad.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::codec;
use crate::color::Color;
use crate::dispatch::{Callback, Dispatcher, ErrorSink, Subscription};
use crate::error::{Error, Result};
use crate::event::{EventDetail, EventKind};
use crate::midi_io::{MidirTransport, Transport};
use crate::model::{self, DeviceModel};
use crate::pad::{Grid, Pad};

/// A [`Session`] over the real [`midir`](crate::midi_io::MidirTransport)
/// transport.
pub type MidiSession = Session<MidirTransport>;

/// Lock that shrugs off poisoning: the value is plain data and a panicking
/// callback must not take the session down with it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct GateState {
    closed: bool,
    /// Firmware version parked here by the receive thread until the
    /// pending `request_firmware` call picks it up.
    firmware: Option<String>,
}

/// Wait/notify point shared between `request_firmware`, the receive
/// thread, and `disconnect`.
#[derive(Default)]
struct Gate {
    state: Mutex<GateState>,
    cond: Condvar,
}

struct Shared<T: Transport> {
    model: &'static DeviceModel,
    /// Outbound serialization point. `None` once disconnected. Never held
    /// across a blocking wait.
    out: Mutex<Option<T>>,
    dispatcher: Mutex<Dispatcher>,
    gate: Gate,
}

impl<T: Transport> Shared<T> {
    /// Runs on the transport's delivery thread for every inbound message.
    fn handle_bytes(&self, timestamp: u64, bytes: &[u8]) {
        let Some(event) = codec::decode(self.model, timestamp, bytes) else {
            return;
        };
        if let EventDetail::Firmware { ref version } = event.detail {
            let mut state = lock(&self.gate.state);
            state.firmware = Some(version.clone());
            drop(state);
            self.gate.cond.notify_all();
        }
        Dispatcher::dispatch(&self.dispatcher, &event);
    }

    fn ensure_open(&self) -> Result<()> {
        if lock(&self.gate.state).closed {
            Err(Error::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn send_all<'a>(&self, messages: impl IntoIterator<Item = &'a [u8]>) -> Result<()> {
        let mut out = lock(&self.out);
        let transport = out.as_mut().ok_or(Error::SessionClosed)?;
        for message in messages {
            transport.send(message)?;
        }
        Ok(())
    }
}

/// An open connection to one device.
///
/// A session owns its transport exclusively and pairs it with one
/// [`DeviceModel`] from the registry. All methods take `&self` and are
/// safe to call from any thread; outbound messages are serialized per
/// session so multi-message image batches never interleave.
///
/// The session is `Disconnected` again after [`Session::disconnect`] (or
/// drop), and that is terminal: every further operation fails with
/// [`Error::SessionClosed`]. Connect a new session to reconnect.
///
/// ```no_run
/// use padlight::{Color, MidiSession, Pad};
///
/// let session = MidiSession::connect("Launchpad Mini MK3 LPMiniMK3 MIDI", "mini-mk3")?;
/// session.set_pad(Pad::new(3, 5), Color::rgb(255, 0, 0))?;
/// session.disconnect();
/// # Ok::<(), padlight::Error>(())
/// ```
pub struct Session<T: Transport> {
    shared: Arc<Shared<T>>,
}

impl<T: Transport> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("model", &self.shared.model.name)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Session<T> {
    /// Open the MIDI port matching `port` and bring the device identified
    /// by `model` (a registry name or alias) up, including any mode-switch
    /// messages the model requires.
    pub fn connect(port: &str, model: &str) -> Result<Self> {
        let model = model::lookup(model)?;

        let shared = Arc::new(Shared {
            model,
            out: Mutex::new(None),
            dispatcher: Mutex::new(Dispatcher::new()),
            gate: Gate::default(),
        });

        // The receive callback outlives neither the transport nor, via
        // the Weak, the session; bytes arriving during teardown are
        // dropped on the floor.
        let weak: Weak<Shared<T>> = Arc::downgrade(&shared);
        let mut transport = T::open(
            port,
            Box::new(move |timestamp, bytes| {
                if let Some(shared) = weak.upgrade() {
                    shared.handle_bytes(timestamp, bytes);
                }
            }),
        )?;

        for message in model.init {
            transport.send(message)?;
        }
        *lock(&shared.out) = Some(transport);

        debug!("connected to {} as {}", port, model.name);
        Ok(Self { shared })
    }

    pub fn model(&self) -> &'static DeviceModel {
        self.shared.model
    }

    /// Light a single pad.
    pub fn set_pad(&self, pad: Pad, color: Color) -> Result<()> {
        self.shared.ensure_open()?;
        let bytes = codec::encode_set_pad(self.shared.model, pad, color)?;
        self.shared.send_all([bytes.as_slice()])
    }

    /// Display a whole image. The grid must match the model's dimensions.
    pub fn set_image(&self, grid: &Grid) -> Result<()> {
        self.shared.ensure_open()?;
        let messages = codec::encode_set_image(self.shared.model, grid)?;
        self.shared
            .send_all(messages.iter().map(Vec::as_slice))
    }

    /// Light every pad with the same color.
    pub fn set_all(&self, color: Color) -> Result<()> {
        let model = self.shared.model;
        self.set_image(&Grid::filled(model.rows, model.cols, color))
    }

    /// Turn all pads off.
    pub fn clear(&self) -> Result<()> {
        self.set_all(Color::BLACK)
    }

    /// Ask the device for its firmware version and wait for the reply.
    ///
    /// This is the one request/response operation: it blocks the calling
    /// thread until the firmware event arrives, `timeout` elapses
    /// ([`Error::Timeout`]), or the session is disconnected underneath the
    /// wait ([`Error::SessionClosed`]). The outbound lock is released
    /// while waiting, so other threads can keep sending.
    ///
    /// Only one firmware inquiry may be in flight per session; two
    /// concurrent calls can hand the reply to either of them.
    pub fn request_firmware(&self, timeout: Duration) -> Result<String> {
        self.shared.ensure_open()?;
        lock(&self.shared.gate.state).firmware = None;
        self.shared
            .send_all([codec::encode_request_firmware(self.shared.model).as_slice()])?;

        let deadline = Instant::now() + timeout;
        let mut state = lock(&self.shared.gate.state);
        loop {
            if state.closed {
                return Err(Error::SessionClosed);
            }
            if let Some(version) = state.firmware.take() {
                return Ok(version);
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()).filter(|d| !d.is_zero())
            else {
                return Err(Error::Timeout(timeout));
            };
            state = self
                .shared
                .gate
                .cond
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Register `callback` for every future event of `kind`. Callbacks
    /// run synchronously on the transport's delivery thread, in
    /// registration order; keep them short.
    ///
    /// Calling [`Session::on`], [`Session::off`] or even
    /// [`Session::disconnect`] from inside a callback is fine; a handler
    /// unregistered mid-dispatch is skipped for the event being
    /// delivered.
    pub fn on(&self, kind: EventKind, callback: Callback) -> Result<Subscription> {
        self.shared.ensure_open()?;
        Ok(lock(&self.shared.dispatcher).register(kind, callback))
    }

    /// Remove a handler registered with [`Session::on`]. Returns whether
    /// it was still registered.
    pub fn off(&self, subscription: Subscription) -> Result<bool> {
        self.shared.ensure_open()?;
        Ok(lock(&self.shared.dispatcher).unregister(subscription))
    }

    /// Replace where callback panics are reported. The default logs them.
    pub fn set_error_sink(&self, sink: ErrorSink) -> Result<()> {
        self.shared.ensure_open()?;
        lock(&self.shared.dispatcher).set_error_sink(sink);
        Ok(())
    }

    /// Tear the session down: send the model's teardown messages (best
    /// effort), release the transport, drop all registrations, and wake
    /// any pending [`Session::request_firmware`] wait with
    /// [`Error::SessionClosed`]. Idempotent.
    pub fn disconnect(&self) {
        {
            let mut state = lock(&self.shared.gate.state);
            if state.closed {
                return;
            }
            state.closed = true;
        }
        self.shared.gate.cond.notify_all();

        if let Some(mut transport) = lock(&self.shared.out).take() {
            for message in self.shared.model.teardown {
                if let Err(e) = transport.send(message) {
                    warn!("teardown message failed: {e}");
                }
            }
        }
        lock(&self.shared.dispatcher).clear();
        debug!("disconnected from {}", self.shared.model.name);
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
