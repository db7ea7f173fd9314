//! Translation between logical pad operations and raw MIDI bytes.
//!
//! Everything position- and color-related is parameterized by a
//! [`DeviceModel`], so this is the only place in the crate that knows how
//! any particular hardware generation numbers its pads. Encoding failures
//! are surfaced to the caller; decoding is total and returns `None` for
//! anything it does not recognize, because a MIDI stream legitimately
//! carries traffic we do not care about (clock, other channels, replies to
//! requests we never sent).

use log::trace;

use crate::color::{quantize_channel, Color};
use crate::error::{Error, Result};
use crate::event::{EventDetail, InputEvent};
use crate::model::{AddressScheme, ColorScheme, DeviceModel, NOVATION_ID};
use crate::pad::{Grid, Pad};

const NOTE_ON: u8 = 0x90;
const NOTE_OFF: u8 = 0x80;
const CONTROL_CHANGE: u8 = 0xB0;
const SYSEX_START: u8 = 0xF0;
const SYSEX_END: u8 = 0xF7;

/// Universal device inquiry, broadcast device id. Every Launchpad
/// generation answers this with its firmware revision.
const DEVICE_INQUIRY: [u8; 6] = [SYSEX_START, 0x7E, 0x7F, 0x06, 0x01, SYSEX_END];

fn note_for_pad(model: &DeviceModel, pad: Pad) -> u8 {
    match model.address {
        AddressScheme::RowTimesSixteen => pad.row * 16 + pad.col,
        AddressScheme::DecimalFromBottom => (model.rows - pad.row) * 10 + pad.col + 1,
    }
}

fn pad_for_note(model: &DeviceModel, note: u8) -> Option<Pad> {
    let pad = match model.address {
        AddressScheme::RowTimesSixteen => Pad {
            row: note / 16,
            col: note % 16,
        },
        AddressScheme::DecimalFromBottom => {
            let col = (note % 10).checked_sub(1)?;
            let row = model.rows.checked_sub(note / 10)?;
            Pad { row, col }
        }
    };
    model.contains(pad).then_some(pad)
}

fn check_address(model: &DeviceModel, pad: Pad) -> Result<()> {
    if model.contains(pad) {
        Ok(())
    } else {
        Err(Error::InvalidAddress {
            model: model.name,
            row: pad.row,
            col: pad.col,
            rows: model.rows,
            cols: model.cols,
        })
    }
}

fn unsupported(model: &DeviceModel, color: Color, reason: &'static str) -> Error {
    Error::UnsupportedColor {
        model: model.name,
        color,
        reason,
    }
}

/// Pack a color into the legacy red/green velocity byte.
fn red_green_velocity(model: &DeviceModel, color: Color) -> Result<u8> {
    match color {
        Color::Palette(id) => {
            if id > 127 {
                return Err(unsupported(model, color, "velocity codes go up to 127"));
            }
            Ok(id)
        }
        Color::Rgb { r, g, b } => {
            if quantize_channel(b, 3) != 0 {
                return Err(unsupported(model, color, "device has no blue LEDs"));
            }
            Ok(quantize_channel(r, 3) | quantize_channel(g, 3) << 4)
        }
    }
}

fn palette_id(model: &DeviceModel, color: Color, id: u8) -> Result<u8> {
    if id > 127 {
        return Err(unsupported(model, color, "palette has 128 entries"));
    }
    Ok(id)
}

/// Encode "light pad `pad` with `color`" as a single MIDI message.
///
/// Palette colors become a plain Note On; RGB colors become one vendor
/// SysEx block with the channels quantized to the model's color depth.
pub fn encode_set_pad(model: &DeviceModel, pad: Pad, color: Color) -> Result<Vec<u8>> {
    check_address(model, pad)?;
    let note = note_for_pad(model, pad);

    match model.color {
        ColorScheme::RedGreen => Ok(vec![NOTE_ON, note, red_green_velocity(model, color)?]),
        ColorScheme::PaletteRgb {
            command,
            entry_tag,
            color_max,
            ..
        } => match color {
            Color::Palette(id) => Ok(vec![NOTE_ON, note, palette_id(model, color, id)?]),
            Color::Rgb { r, g, b } => {
                let mut bytes = Vec::with_capacity(model.sysex_header.len() + 8);
                bytes.push(SYSEX_START);
                bytes.extend_from_slice(model.sysex_header);
                bytes.push(command);
                if let Some((_, rgb_tag)) = entry_tag {
                    bytes.push(rgb_tag);
                }
                bytes.push(note);
                bytes.push(quantize_channel(r, color_max));
                bytes.push(quantize_channel(g, color_max));
                bytes.push(quantize_channel(b, color_max));
                bytes.push(SYSEX_END);
                Ok(bytes)
            }
        },
    }
}

/// Encode a whole grid image as an ordered sequence of messages.
///
/// The grid must match the model's dimensions exactly. On SysEx-capable
/// models the pads are batched so that no single message carries more than
/// the model's `max_pads_per_message` LED entries; on legacy devices every
/// pad becomes its own Note On. On models whose LED command takes bare RGB
/// entries, palette cells are sent as individual Note Ons ahead of the
/// SysEx batches.
pub fn encode_set_image(model: &DeviceModel, grid: &Grid) -> Result<Vec<Vec<u8>>> {
    if grid.rows() != model.rows || grid.cols() != model.cols {
        return Err(Error::DimensionMismatch {
            model: model.name,
            rows: grid.rows(),
            cols: grid.cols(),
            expected_rows: model.rows,
            expected_cols: model.cols,
        });
    }

    match model.color {
        ColorScheme::RedGreen => grid
            .cells()
            .map(|(pad, color)| encode_set_pad(model, pad, color))
            .collect(),
        ColorScheme::PaletteRgb {
            command,
            entry_tag,
            color_max,
            max_pads_per_message,
        } => {
            let mut messages = Vec::new();
            // (entry bytes, number of pads) for the current SysEx batch
            let mut batch: Vec<u8> = Vec::new();
            let mut batched = 0usize;

            let flush = |batch: &mut Vec<u8>, batched: &mut usize| {
                if *batched == 0 {
                    return Vec::new();
                }
                let mut bytes = Vec::with_capacity(model.sysex_header.len() + batch.len() + 3);
                bytes.push(SYSEX_START);
                bytes.extend_from_slice(model.sysex_header);
                bytes.push(command);
                bytes.append(batch);
                bytes.push(SYSEX_END);
                *batched = 0;
                bytes
            };

            let mut sysex_batches = Vec::new();
            for (pad, color) in grid.cells() {
                let note = note_for_pad(model, pad);
                match (color, entry_tag) {
                    (Color::Palette(id), Some((palette_tag, _))) => {
                        batch.extend([palette_tag, note, palette_id(model, color, id)?]);
                    }
                    (Color::Palette(id), None) => {
                        // No palette entry form in this LED command; fall
                        // back to a plain Note On for this cell.
                        messages.push(vec![NOTE_ON, note, palette_id(model, color, id)?]);
                        continue;
                    }
                    (Color::Rgb { r, g, b }, tag) => {
                        if let Some((_, rgb_tag)) = tag {
                            batch.push(rgb_tag);
                        }
                        batch.extend([
                            note,
                            quantize_channel(r, color_max),
                            quantize_channel(g, color_max),
                            quantize_channel(b, color_max),
                        ]);
                    }
                }
                batched += 1;
                if batched == max_pads_per_message {
                    sysex_batches.push(flush(&mut batch, &mut batched));
                }
            }
            let last = flush(&mut batch, &mut batched);
            if !last.is_empty() {
                sysex_batches.push(last);
            }
            messages.extend(sysex_batches);
            Ok(messages)
        }
    }
}

/// The firmware inquiry message for `model`.
///
/// All known models answer the MIDI universal device inquiry, so this does
/// not actually vary per model today; the parameter keeps the contract
/// uniform with the other encoders.
pub fn encode_request_firmware(_model: &DeviceModel) -> Vec<u8> {
    DEVICE_INQUIRY.to_vec()
}

/// Decode raw inbound bytes into an [`InputEvent`].
///
/// Returns `None` for anything that is not a recognized event for this
/// model: malformed or truncated messages, control buttons outside the pad
/// grid, unrelated SysEx traffic. Never panics, whatever the input.
pub fn decode(model: &DeviceModel, timestamp: u64, bytes: &[u8]) -> Option<InputEvent> {
    let detail = match *bytes {
        [NOTE_ON, note, 0] => EventDetail::Release {
            pad: pad_for_note(model, note)?,
        },
        [NOTE_ON, note, _velocity] => EventDetail::Press {
            pad: pad_for_note(model, note)?,
        },
        [NOTE_OFF, note, _] => EventDetail::Release {
            pad: pad_for_note(model, note)?,
        },
        [CONTROL_CHANGE, controller, _] => {
            // Control buttons live outside the pad grid on every known
            // model, so a CC is a recognized shape we have no event for.
            trace!("ignoring control change {controller} outside the pad grid");
            return None;
        }
        _ => EventDetail::Firmware {
            version: parse_device_inquiry(bytes)?,
        },
    };
    Some(InputEvent { timestamp, detail })
}

/// Parse a universal device inquiry reply from a Novation device into a
/// dotted firmware revision string.
fn parse_device_inquiry(bytes: &[u8]) -> Option<String> {
    match *bytes {
        [SYSEX_START, 0x7E, _device_id, 0x06, 0x02, m0, m1, m2, _f0, _f1, _m0, _m1, d1, d2, d3, d4, SYSEX_END]
            if [m0, m1, m2] == NOVATION_ID =>
        {
            Some(format!("{d1}.{d2}.{d3}.{d4}"))
        }
        _ => {
            trace!("unrecognized midi message ({} bytes)", bytes.len());
            None
        }
    }
}

/// Inverse of [`encode_set_pad`] for the RGB generations: recover which
/// pad a set-pad message addresses and the wire-level color it carries.
///
/// The color comes back as encoded, i.e. RGB channels are in the device
/// range, not scaled back to 0-255. Legacy red/green messages have no
/// defined inverse and return `None`.
pub fn decode_set_pad(model: &DeviceModel, bytes: &[u8]) -> Option<(Pad, Color)> {
    let ColorScheme::PaletteRgb {
        command, entry_tag, ..
    } = model.color
    else {
        return None;
    };

    if let [NOTE_ON, note, id] = *bytes {
        return Some((pad_for_note(model, note)?, Color::Palette(id)));
    }

    let rest = bytes.strip_prefix(&[SYSEX_START])?;
    let rest = rest.strip_prefix(model.sysex_header)?;
    let rest = rest.strip_prefix(&[command])?;
    let rest = match entry_tag {
        Some((_, rgb_tag)) => rest.strip_prefix(&[rgb_tag])?,
        None => rest,
    };
    match *rest {
        [note, r, g, b, SYSEX_END] => Some((pad_for_note(model, note)?, Color::Rgb { r, g, b })),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lookup;
    use proptest::prelude::*;

    fn mk3() -> &'static DeviceModel {
        lookup("launchpad-mini-mk3").unwrap()
    }

    #[test]
    fn mk3_rgb_set_pad_is_a_single_sysex() {
        // Row 3, column 5 sits at decimal note 56; full red quantizes to
        // the MK3's channel maximum of 127.
        let bytes = encode_set_pad(mk3(), Pad::new(3, 5), Color::rgb(255, 0, 0)).unwrap();
        assert_eq!(
            bytes,
            [0xF0, 0x00, 0x20, 0x29, 0x02, 0x0D, 0x03, 0x03, 56, 127, 0, 0, 0xF7]
        );
    }

    #[test]
    fn mk2_rgb_set_pad_uses_bare_entries() {
        let model = lookup("launchpad-mk2").unwrap();
        let bytes = encode_set_pad(model, Pad::new(7, 0), Color::rgb(0, 0, 255)).unwrap();
        assert_eq!(
            bytes,
            [0xF0, 0x00, 0x20, 0x29, 0x02, 0x18, 0x0B, 11, 0, 0, 63, 0xF7]
        );
    }

    #[test]
    fn palette_set_pad_is_a_note_on() {
        let bytes = encode_set_pad(mk3(), Pad::new(0, 0), Color::RED).unwrap();
        assert_eq!(bytes, [0x90, 81, 5]);
    }

    #[test]
    fn out_of_bounds_address_is_rejected() {
        let err = encode_set_pad(mk3(), Pad::new(8, 0), Color::RED).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { row: 8, col: 0, .. }));
    }

    #[test]
    fn unrepresentable_colors_are_rejected() {
        let err = encode_set_pad(mk3(), Pad::new(0, 0), Color::Palette(200)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedColor { .. }));

        let s = lookup("launchpad-s").unwrap();
        let err = encode_set_pad(s, Pad::new(0, 0), Color::rgb(0, 0, 255)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedColor { .. }));
    }

    #[test]
    fn red_green_velocity_packs_both_channels() {
        let s = lookup("launchpad-s").unwrap();
        let bytes = encode_set_pad(s, Pad::new(2, 3), Color::rgb(255, 255, 0)).unwrap();
        assert_eq!(bytes, [0x90, 2 * 16 + 3, 3 | 3 << 4]);
    }

    #[test]
    fn set_pad_round_trips_on_rgb_models() {
        for name in ["launchpad-mk2", "launchpad-mini-mk3", "launchpad-pro"] {
            let model = lookup(name).unwrap();
            let ColorScheme::PaletteRgb { color_max, .. } = model.color else {
                unreachable!()
            };
            for row in 0..model.rows {
                for col in 0..model.cols {
                    let pad = Pad::new(row, col);

                    let msg = encode_set_pad(model, pad, Color::Palette(17)).unwrap();
                    assert_eq!(decode_set_pad(model, &msg), Some((pad, Color::Palette(17))));

                    let msg = encode_set_pad(model, pad, Color::rgb(255, 128, 3)).unwrap();
                    let quantized = Color::Rgb {
                        r: quantize_channel(255, color_max),
                        g: quantize_channel(128, color_max),
                        b: quantize_channel(3, color_max),
                    };
                    assert_eq!(decode_set_pad(model, &msg), Some((pad, quantized)));
                }
            }
        }
    }

    #[test]
    fn image_must_match_model_dimensions() {
        let err = encode_set_image(mk3(), &Grid::new(4, 4)).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch { rows: 4, cols: 4, .. }
        ));
    }

    #[test]
    fn image_batches_respect_the_message_cap() {
        // A model with a deliberately small cap to force several batches.
        let model = DeviceModel {
            name: "test-batcher",
            aliases: &[],
            rows: 8,
            cols: 8,
            address: AddressScheme::DecimalFromBottom,
            color: ColorScheme::PaletteRgb {
                command: 0x03,
                entry_tag: Some((0x00, 0x03)),
                color_max: 127,
                max_pads_per_message: 10,
            },
            sysex_header: &[0x00, 0x20, 0x29, 0x02, 0x0D],
            init: &[],
            teardown: &[],
        };
        let grid = Grid::filled(8, 8, Color::rgb(10, 20, 30));
        let messages = encode_set_image(&model, &grid).unwrap();

        // 64 pads at 10 per message
        assert_eq!(messages.len(), 7);
        let max_len = 1 + model.sysex_header.len() + 1 + 10 * 5 + 1;
        for msg in &messages {
            assert!(msg.len() <= max_len);
            assert_eq!(msg[0], 0xF0);
            assert_eq!(*msg.last().unwrap(), 0xF7);
        }
    }

    #[test]
    fn image_on_full_rgb_grid_fits_one_message() {
        let grid = Grid::filled(8, 8, Color::rgb(1, 2, 3));
        let messages = encode_set_image(mk3(), &grid).unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn mk2_image_sends_palette_cells_as_note_ons() {
        let model = lookup("launchpad-mk2").unwrap();
        let mut grid = Grid::filled(8, 8, Color::rgb(0, 255, 0));
        grid[Pad::new(0, 0)] = Color::RED;
        let messages = encode_set_image(model, &grid).unwrap();

        // One Note On for the palette cell, one SysEx batch for the rest.
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], vec![0x90, 81, 5]);
        assert_eq!(messages[1][0], 0xF0);
    }

    #[test]
    fn decode_recognizes_button_events() {
        let model = mk3();
        let press = decode(model, 7, &[0x90, 56, 127]).unwrap();
        assert_eq!(press.timestamp, 7);
        assert_eq!(press.pad(), Some(Pad::new(3, 5)));
        assert_eq!(press.kind(), crate::EventKind::Press);

        let release = decode(model, 8, &[0x90, 56, 0]).unwrap();
        assert_eq!(release.kind(), crate::EventKind::Release);

        let note_off = decode(model, 9, &[0x80, 11, 0x40]).unwrap();
        assert_eq!(note_off.pad(), Some(Pad::new(7, 0)));
        assert_eq!(note_off.kind(), crate::EventKind::Release);
    }

    #[test]
    fn decode_parses_the_device_inquiry_reply() {
        let reply = [
            0xF0, 0x7E, 0x00, 0x06, 0x02, 0x00, 0x20, 0x29, 0x13, 0x01, 0x00, 0x00, 1, 0, 3, 2,
            0xF7,
        ];
        let event = decode(mk3(), 0, &reply).unwrap();
        assert_eq!(
            event.detail,
            EventDetail::Firmware {
                version: "1.0.3.2".into()
            }
        );
    }

    #[test]
    fn decode_ignores_noise() {
        let model = mk3();
        assert_eq!(decode(model, 0, &[]), None);
        // Clock tick
        assert_eq!(decode(model, 0, &[0xF8]), None);
        // Note outside the grid
        assert_eq!(decode(model, 0, &[0x90, 0x00, 127]), None);
        // Control button
        assert_eq!(decode(model, 0, &[0xB0, 104, 127]), None);
        // Truncated SysEx
        assert_eq!(decode(model, 0, &[0xF0, 0x7E, 0x00, 0x06, 0x02]), None);
        // Inquiry reply from some other manufacturer
        let foreign = [
            0xF0, 0x7E, 0x00, 0x06, 0x02, 0x41, 0x00, 0x00, 0, 0, 0, 0, 1, 2, 3, 4, 0xF7,
        ];
        assert_eq!(decode(model, 0, &foreign), None);
    }

    proptest! {
        #[test]
        fn decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            for model in crate::model::MODELS {
                let _ = decode(model, 0, &bytes);
                let _ = decode_set_pad(model, &bytes);
            }
        }
    }
}
