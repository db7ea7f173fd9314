//! The fixed table of known hardware generations.
//!
//! Different Launchpad generations number their pads and encode their
//! colors differently. Rather than one module per device, each generation
//! is described by an immutable [`DeviceModel`] value and the codec is
//! parameterized by it; supporting a new device means adding a row to
//! [`MODELS`], not touching any callers.

use crate::error::{Error, Result};

/// How a `(row, col)` pad address maps to a MIDI note number.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AddressScheme {
    /// `note = row * 16 + col`. Used by the original Launchpad, the S and
    /// the Mini mk1/mk2.
    RowTimesSixteen,
    /// `note = (rows - row) * 10 + col + 1`, bottom row 11..18. Used by
    /// the MK2 and everything after it.
    DecimalFromBottom,
}

/// How colors are expressed on the wire.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColorScheme {
    /// Legacy bi-color LEDs: 2-bit red and green brightness packed into
    /// the Note On velocity byte as `red | green << 4`. No blue channel.
    RedGreen,
    /// The RGB generations: a 128-entry palette addressed via plain Note
    /// On, and full RGB via a vendor SysEx LED command.
    PaletteRgb {
        /// LED lighting command byte, sent right after the SysEx header.
        command: u8,
        /// Per-entry color-spec tag pair `(palette, rgb)` for devices
        /// whose LED command mixes color kinds (the MK3 family); `None`
        /// when the command takes bare RGB entries (MK2, Pro).
        entry_tag: Option<(u8, u8)>,
        /// Maximum value of one RGB channel (63 or 127).
        color_max: u8,
        /// How many LED entries fit into a single SysEx message.
        max_pads_per_message: usize,
    },
}

/// Immutable description of one hardware generation.
///
/// Instances live in the static [`MODELS`] table and are shared read-only;
/// sessions hold `&'static DeviceModel` references.
#[derive(Debug)]
pub struct DeviceModel {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// Grid height in pads.
    pub rows: u8,
    /// Grid width in pads.
    pub cols: u8,
    pub address: AddressScheme,
    pub color: ColorScheme,
    /// Vendor SysEx header, everything between 0xF0 and the command byte.
    pub sysex_header: &'static [u8],
    /// Complete messages sent right after the transport opens.
    pub init: &'static [&'static [u8]],
    /// Complete messages sent while disconnecting, best effort.
    pub teardown: &'static [&'static [u8]],
}

/// Novation's MIDI manufacturer id.
pub(crate) const NOVATION_ID: [u8; 3] = [0x00, 0x20, 0x29];

/// All models this crate knows how to talk to. Populated once at compile
/// time; never mutated.
pub static MODELS: &[DeviceModel] = &[
    DeviceModel {
        name: "launchpad-s",
        aliases: &["s", "launchpad", "launchpad-mini"],
        rows: 8,
        cols: 8,
        address: AddressScheme::RowTimesSixteen,
        color: ColorScheme::RedGreen,
        sysex_header: &[0x00, 0x20, 0x29],
        init: &[],
        teardown: &[],
    },
    DeviceModel {
        name: "launchpad-mk2",
        aliases: &["mk2"],
        rows: 8,
        cols: 8,
        address: AddressScheme::DecimalFromBottom,
        color: ColorScheme::PaletteRgb {
            command: 0x0B,
            entry_tag: None,
            color_max: 63,
            max_pads_per_message: 80,
        },
        sysex_header: &[0x00, 0x20, 0x29, 0x02, 0x18],
        init: &[],
        teardown: &[],
    },
    DeviceModel {
        name: "launchpad-mini-mk3",
        aliases: &["mini-mk3", "mk3"],
        rows: 8,
        cols: 8,
        address: AddressScheme::DecimalFromBottom,
        color: ColorScheme::PaletteRgb {
            command: 0x03,
            entry_tag: Some((0x00, 0x03)),
            color_max: 127,
            max_pads_per_message: 81,
        },
        sysex_header: &[0x00, 0x20, 0x29, 0x02, 0x0D],
        // Programmer mode; without it the device stays in Ableton layout
        // and the decimal pad numbering does not apply.
        init: &[&[0xF0, 0x00, 0x20, 0x29, 0x02, 0x0D, 0x0E, 0x01, 0xF7]],
        // Back out of programmer mode, otherwise the device is stuck in it
        // after we hang up.
        teardown: &[&[0xF0, 0x00, 0x20, 0x29, 0x02, 0x0D, 0x0E, 0x00, 0xF7]],
    },
    DeviceModel {
        name: "launchpad-pro",
        aliases: &["pro"],
        rows: 8,
        cols: 8,
        address: AddressScheme::DecimalFromBottom,
        color: ColorScheme::PaletteRgb {
            command: 0x0B,
            entry_tag: None,
            color_max: 63,
            max_pads_per_message: 78,
        },
        sysex_header: &[0x00, 0x20, 0x29, 0x02, 0x10],
        init: &[],
        teardown: &[],
    },
];

impl DeviceModel {
    pub fn contains(&self, pad: crate::Pad) -> bool {
        pad.row < self.rows && pad.col < self.cols
    }
}

/// Look a model up by name or alias, ASCII case-insensitively.
pub fn lookup(name: &str) -> Result<&'static DeviceModel> {
    MODELS
        .iter()
        .find(|m| {
            m.name.eq_ignore_ascii_case(name)
                || m.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
        })
        .ok_or_else(|| Error::UnknownModel {
            name: name.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_and_alias() {
        assert_eq!(lookup("launchpad-mini-mk3").unwrap().name, "launchpad-mini-mk3");
        assert_eq!(lookup("MK3").unwrap().name, "launchpad-mini-mk3");
        assert_eq!(lookup("Pro").unwrap().name, "launchpad-pro");
    }

    #[test]
    fn lookup_unknown_fails() {
        let err = lookup("launchpad-mk9").unwrap_err();
        assert!(matches!(err, Error::UnknownModel { name } if name == "launchpad-mk9"));
    }

    #[test]
    fn headers_start_with_novation_id() {
        for model in MODELS {
            assert!(model.sysex_header.starts_with(&NOVATION_ID), "{}", model.name);
        }
    }
}
