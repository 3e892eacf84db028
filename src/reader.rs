//! Instruction stream reader.
//!
//! Splits a byte stream (a built job, or a capture of what another driver
//! sent) back into [`Instruction`]s, and reassembles the printed pages from
//! it. Setting commands (`ESC i U`) have model dependent payloads and are
//! not recognised.

use log::debug;

use crate::{
    codec::unpack,
    error::ReadError,
    instruction::{ExpandedMode, Instruction, MediaQuality, Plane, PrintMode, ESC},
};

/// Split `data` into instructions.
///
/// A run of 0x00 bytes becomes a single [`Instruction::Invalidate`].
pub fn read_instructions(data: &[u8]) -> Result<Vec<Instruction>, ReadError> {
    let mut instructions = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let (instruction, len) = read_one(&data[offset..], offset)?;
        debug!("{:>6}: {} ({} bytes)", offset, instruction.name(), len);
        instructions.push(instruction);
        offset += len;
    }

    Ok(instructions)
}

fn read_one(data: &[u8], offset: usize) -> Result<(Instruction, usize), ReadError> {
    let byte = |i: usize| data.get(i).copied().ok_or(ReadError::Truncated { offset });
    let unknown = |i: usize| ReadError::UnknownOpcode {
        offset: offset + i,
        byte: data[i],
    };

    let read = match data[0] {
        0x00 => {
            let n = data.iter().take_while(|b| **b == 0x00).count();
            (Instruction::Invalidate(n), n)
        }
        0x0C => (Instruction::Print(PrintMode::Feed), 1),
        0x1A => (Instruction::Print(PrintMode::Eject), 1),
        0x5A => (Instruction::ZeroRaster, 1),
        0x4D => (Instruction::Compression(byte(1)? == 0x02), 2),
        0x67 => {
            let len = byte(2)? as usize;
            (Instruction::Raster(payload(data, 3, len, offset)?), 3 + len)
        }
        0x77 => {
            let plane = match byte(1)? {
                0x01 => Plane::Black,
                0x02 => Plane::Red,
                _ => return Err(unknown(1)),
            };
            let len = byte(2)? as usize;
            let data = payload(data, 3, len, offset)?;
            (Instruction::TwoColorRaster { plane, data }, 3 + len)
        }
        0x47 => {
            let len = u16::from_le_bytes([byte(1)?, byte(2)?]) as usize;
            (Instruction::PTouchRaster(payload(data, 3, len, offset)?), 3 + len)
        }
        ESC => match byte(1)? {
            0x40 => (Instruction::Initialize, 2),
            0x69 => match byte(2)? {
                0x53 => (Instruction::StatusRequest, 3),
                0x61 if byte(3)? == 0x01 => (Instruction::SwitchToRaster, 4),
                0x21 => (Instruction::StatusNotification(byte(3)? == 0x00), 4),
                0x7A => {
                    let p = payload(data, 3, 10, offset)?;
                    let media = MediaQuality {
                        media_type: p[1],
                        width_mm: p[2],
                        length_mm: p[3],
                        high_quality: p[0] & 0b0100_0000 != 0,
                        raster_lines: u32::from_le_bytes([p[4], p[5], p[6], p[7]]),
                        continued: p[8] != 0x00,
                    };
                    (Instruction::MediaQuality(media), 13)
                }
                0x4D => (
                    Instruction::VariousMode {
                        auto_cut: byte(3)? & 0b0100_0000 != 0,
                    },
                    4,
                ),
                0x41 => (Instruction::CutEvery(byte(3)?), 4),
                0x4B => (Instruction::ExpandedMode(ExpandedMode::from_byte(byte(3)?)), 4),
                0x64 => (
                    Instruction::Margins(u16::from_le_bytes([byte(3)?, byte(4)?])),
                    5,
                ),
                _ => return Err(unknown(2)),
            },
            _ => return Err(unknown(1)),
        },
        _ => return Err(unknown(0)),
    };

    Ok(read)
}

fn payload(data: &[u8], start: usize, len: usize, offset: usize) -> Result<Vec<u8>, ReadError> {
    data.get(start..start + len)
        .map(|p| p.to_vec())
        .ok_or(ReadError::Truncated { offset })
}

/// One printed page reassembled from a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Decompressed print head lines of the black (or only) plane.
    pub black: Vec<Vec<u8>>,
    /// Decompressed lines of the red plane, empty unless two-color.
    pub red: Vec<Vec<u8>>,
    pub media: Option<MediaQuality>,
    pub expanded: ExpandedMode,
    pub compressed: bool,
    pub print: PrintMode,
}

/// Reassemble the pages printed by `data`.
///
/// Settings persist across pages until the next initialize, the way the
/// printer keeps them. A zero raster line becomes a blank line as wide as
/// the previous one.
pub fn read_pages(data: &[u8]) -> Result<Vec<Page>, ReadError> {
    let mut pages = Vec::new();
    let mut compressed = false;
    let mut media = None;
    let mut expanded = ExpandedMode::default();
    let mut black: Vec<Vec<u8>> = Vec::new();
    let mut red: Vec<Vec<u8>> = Vec::new();

    let decode = |data: &[u8], compressed: bool| -> Result<Vec<u8>, ReadError> {
        if compressed {
            Ok(unpack(data)?)
        } else {
            Ok(data.to_vec())
        }
    };

    for instruction in read_instructions(data)? {
        match instruction {
            Instruction::Initialize => {
                compressed = false;
                media = None;
                expanded = ExpandedMode::default();
                black.clear();
                red.clear();
            }
            Instruction::Compression(on) => compressed = on,
            Instruction::MediaQuality(m) => media = Some(m),
            Instruction::ExpandedMode(mode) => expanded = mode,
            Instruction::Raster(line) | Instruction::PTouchRaster(line) => {
                black.push(decode(&line, compressed)?)
            }
            Instruction::TwoColorRaster { plane, data } => {
                let line = decode(&data, compressed)?;
                match plane {
                    Plane::Black => black.push(line),
                    Plane::Red => red.push(line),
                }
            }
            Instruction::ZeroRaster => {
                let width = black.last().map_or(0, |line| line.len());
                black.push(vec![0x00; width]);
                if expanded.two_color {
                    red.push(vec![0x00; width]);
                }
            }
            Instruction::Print(print) => {
                debug!(
                    "Page with {} black and {} red lines",
                    black.len(),
                    red.len()
                );
                pages.push(Page {
                    black: std::mem::take(&mut black),
                    red: std::mem::take(&mut red),
                    media,
                    expanded,
                    compressed,
                    print,
                });
            }
            _ => {}
        }
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bitmap::{Bitmap, LabelImage},
        labels::lookup_label,
        model::lookup_model,
        raster::{build, PrintOptions},
    };

    #[test]
    fn built_jobs_read_back_unchanged() {
        let model = lookup_model("QL-820NWB").unwrap();
        let label = lookup_label("62").unwrap();
        let mut pixels = vec![false; 696 * 3];
        pixels[0] = true;
        pixels[696 + 10] = true;
        let image = LabelImage::mono(Bitmap::from_pixels(696, &pixels));
        let options = PrintOptions::new("62", "QL-820NWB").compress(true).copies(2);
        let job = build(&image, &options, model, label).unwrap();

        assert_eq!(read_instructions(&job.to_bytes()).unwrap(), job.instructions());
    }

    #[test]
    fn pages_are_reassembled() {
        let model = lookup_model("QL-720NW").unwrap();
        let label = lookup_label("29").unwrap();
        let mut pixels = vec![false; 306 * 2];
        pixels[305] = true;
        let image = LabelImage::mono(Bitmap::from_pixels(306, &pixels));
        let options = PrintOptions::new("29", "QL-720NW").compress(true).copies(2);
        let job = build(&image, &options, model, label).unwrap();

        let pages = read_pages(&job.to_bytes()).unwrap();
        assert_eq!(pages.len(), 2);
        for page in &pages {
            assert!(page.compressed);
            assert_eq!(page.black.len(), 2);
            assert!(page.red.is_empty());
            assert_eq!(page.media.map(|m| m.raster_lines), Some(2));
            // offset of 6 dots for 29 mm tape
            let mut first = vec![0x00; 90];
            first[0] = 0b0000_0010;
            assert_eq!(page.black[0], first);
            assert_eq!(page.black[1], vec![0x00; 90]);
        }
        assert_eq!(pages[0].print, PrintMode::Feed);
        assert_eq!(pages[1].print, PrintMode::Eject);
    }

    #[test]
    fn zero_raster_and_two_color_lines() {
        let data = [
            0x1B, 0x40, 0x1B, 0x69, 0x4B, 0x01, 0x77, 0x01, 0x02, 0xAA, 0xBB, 0x77, 0x02, 0x02,
            0xCC, 0xDD, 0x5A, 0x1A,
        ];
        let pages = read_pages(&data).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].black, vec![vec![0xAA, 0xBB], vec![0x00, 0x00]]);
        assert_eq!(pages[0].red, vec![vec![0xCC, 0xDD], vec![0x00, 0x00]]);
        assert!(pages[0].expanded.two_color);
    }

    #[test]
    fn malformed_streams() {
        assert_eq!(
            read_instructions(&[0x1B, 0x40, 0x99]),
            Err(ReadError::UnknownOpcode {
                offset: 2,
                byte: 0x99
            })
        );
        assert_eq!(
            read_instructions(&[0x1B, 0x69, 0x7F]),
            Err(ReadError::UnknownOpcode {
                offset: 2,
                byte: 0x7F
            })
        );
        assert_eq!(
            read_instructions(&[0x67, 0x00, 0x05, 0x01]),
            Err(ReadError::Truncated { offset: 0 })
        );
        assert_eq!(
            read_instructions(&[0x1B, 0x69]),
            Err(ReadError::Truncated { offset: 0 })
        );
    }

    #[test]
    fn preamble_is_one_instruction() {
        let mut data = vec![0x00; 400];
        data.extend_from_slice(&[0x1B, 0x40]);
        assert_eq!(
            read_instructions(&data).unwrap(),
            vec![Instruction::Invalidate(400), Instruction::Initialize]
        );
    }
}
