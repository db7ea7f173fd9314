use crate::pad::Pad;

/// The kinds of input a device can deliver; used as the routing key for
/// [`Session::on`](crate::Session::on).
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    Press,
    Release,
    Firmware,
}

/// A decoded occurrence on the device.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum EventDetail {
    /// A pad was pressed down.
    Press { pad: Pad },
    /// A pad was released.
    Release { pad: Pad },
    /// The reply to a firmware inquiry, as a dotted revision string such
    /// as `"1.0.3.2"`.
    Firmware { version: String },
}

/// One decoded input event, created by the codec and handed to registered
/// callbacks. Events are not buffered or persisted.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InputEvent {
    /// Microsecond timestamp as reported by the MIDI transport.
    pub timestamp: u64,
    pub detail: EventDetail,
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self.detail {
            EventDetail::Press { .. } => EventKind::Press,
            EventDetail::Release { .. } => EventKind::Release,
            EventDetail::Firmware { .. } => EventKind::Firmware,
        }
    }

    /// The pad this event concerns, for button events.
    pub fn pad(&self) -> Option<Pad> {
        match self.detail {
            EventDetail::Press { pad } | EventDetail::Release { pad } => Some(pad),
            EventDetail::Firmware { .. } => None,
        }
    }
}
