use std::time::Duration;

use crate::color::Color;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong when talking to a Launchpad.
///
/// Encode-side validation failures (`InvalidAddress`, `UnsupportedColor`,
/// `DimensionMismatch`) surface synchronously from the offending call.
/// Unrecognized inbound bytes are *not* an error; [`crate::codec::decode`]
/// simply returns `None` for them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("pad ({row}, {col}) is outside the {rows}x{cols} grid of {model}")]
    InvalidAddress {
        model: &'static str,
        row: u8,
        col: u8,
        rows: u8,
        cols: u8,
    },

    #[error("{model} cannot display {color:?}: {reason}")]
    UnsupportedColor {
        model: &'static str,
        color: Color,
        reason: &'static str,
    },

    #[error("grid is {rows}x{cols} but {model} expects {expected_rows}x{expected_cols}")]
    DimensionMismatch {
        model: &'static str,
        rows: u8,
        cols: u8,
        expected_rows: u8,
        expected_cols: u8,
    },

    #[error("unknown device model {name:?}")]
    UnknownModel { name: String },

    #[error("no MIDI {direction} port matching {port:?}")]
    PortUnavailable {
        port: String,
        direction: &'static str,
    },

    #[error("MIDI connection to {port:?} failed: {reason}")]
    ConnectionError { port: String, reason: String },

    #[error("no firmware response from the device within {0:?}")]
    Timeout(Duration),

    #[error("session is closed")]
    SessionClosed,
}
