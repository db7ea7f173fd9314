//! The raw MIDI transport boundary.
//!
//! [`Transport`] is the contract a session needs from a MIDI backend:
//! open a named port pair, push bytes out, get bytes delivered to a
//! callback. [`MidirTransport`] is the production implementation on top
//! of [`midir`]; tests substitute their own.

use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

use crate::error::{Error, Result};

/// Invoked by the transport for every inbound message, with the
/// transport's microsecond timestamp, on the transport's own thread.
pub type ReceiveCallback = Box<dyn FnMut(u64, &[u8]) + Send + 'static>;

/// A bidirectional raw-MIDI connection. Dropping the value closes it.
pub trait Transport: Sized + Send + 'static {
    /// Open the input and output ports matching `port` and wire inbound
    /// bytes to `on_receive`.
    fn open(port: &str, on_receive: ReceiveCallback) -> Result<Self>;

    /// Send one complete MIDI message.
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Identifier used for the midir client and connection names.
const APPLICATION_NAME: &str = "padlight";

/// Find the first port whose name contains `keyword`, case-insensitively.
fn find_port<T: midir::MidiIO>(midi_io: &T, keyword: &str) -> Option<T::Port> {
    let keyword = keyword.to_ascii_lowercase();
    midi_io.ports().into_iter().find(|port| {
        midi_io
            .port_name(port)
            .is_ok_and(|name| name.to_ascii_lowercase().contains(&keyword))
    })
}

/// The [`midir`]-backed transport used against real hardware.
pub struct MidirTransport {
    port: String,
    output: MidiOutputConnection,
    // Never read, but dropping it would close the input stream.
    _input: MidiInputConnection<()>,
}

impl MidirTransport {
    fn connection_error(port: &str, reason: impl ToString) -> Error {
        Error::ConnectionError {
            port: port.to_owned(),
            reason: reason.to_string(),
        }
    }
}

impl Transport for MidirTransport {
    fn open(port: &str, mut on_receive: ReceiveCallback) -> Result<Self> {
        let midi_input =
            MidiInput::new(APPLICATION_NAME).map_err(|e| Self::connection_error(port, e))?;
        let input_port = find_port(&midi_input, port).ok_or_else(|| Error::PortUnavailable {
            port: port.to_owned(),
            direction: "input",
        })?;
        let input = midi_input
            .connect(
                &input_port,
                APPLICATION_NAME,
                move |timestamp, bytes, _| on_receive(timestamp, bytes),
                (),
            )
            .map_err(|e| Self::connection_error(port, e))?;

        let midi_output =
            MidiOutput::new(APPLICATION_NAME).map_err(|e| Self::connection_error(port, e))?;
        let output_port = find_port(&midi_output, port).ok_or_else(|| Error::PortUnavailable {
            port: port.to_owned(),
            direction: "output",
        })?;
        let output = midi_output
            .connect(&output_port, APPLICATION_NAME)
            .map_err(|e| Self::connection_error(port, e))?;

        Ok(Self {
            port: port.to_owned(),
            output,
            _input: input,
        })
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.output
            .send(bytes)
            .map_err(|e| Self::connection_error(&self.port, e))
    }
}
