//! Raster instructions and their byte encoding.
//!
//! Every command the builder can emit is one [`Instruction`] variant;
//! [`Instruction::encode`] is the only place that knows the opcodes.

use crate::labels::LabelKind;

pub const ESC: u8 = 0x1B;

/// Which plane a two-color raster line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    Black,
    Red,
}

impl Plane {
    fn code(&self) -> u8 {
        match self {
            Self::Black => 0x01,
            Self::Red => 0x02,
        }
    }
}

/// Payload of the media & quality command (`ESC i z`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaQuality {
    /// Media type byte, 0x0A endless or 0x0B die-cut.
    pub media_type: u8,
    pub width_mm: u8,
    /// 0 for endless tape.
    pub length_mm: u8,
    pub high_quality: bool,
    /// Number of raster lines of the page.
    pub raster_lines: u32,
    /// Whether this is not the first page of the job.
    pub continued: bool,
}

impl MediaQuality {
    pub fn new(kind: LabelKind, tape_size: (u8, u8), high_quality: bool, raster_lines: u32) -> Self {
        MediaQuality {
            media_type: kind.media_code(),
            width_mm: tape_size.0,
            length_mm: tape_size.1,
            high_quality,
            raster_lines,
            continued: false,
        }
    }

    fn flags(&self) -> u8 {
        // printer recovery, media type, width and length are always valid
        let mut flags = 0b1000_1110;
        if self.high_quality {
            flags |= 0b0100_0000;
        }
        flags
    }
}

/// Payload of the expanded mode command (`ESC i K`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandedMode {
    pub two_color: bool,
    pub cut_at_end: bool,
    pub high_resolution: bool,
}

impl ExpandedMode {
    pub fn to_byte(&self) -> u8 {
        let mut flags = 0b0000_0000;
        if self.two_color {
            flags |= 0b0000_0001;
        }
        if self.cut_at_end {
            flags |= 0b0000_1000;
        }
        if self.high_resolution {
            flags |= 0b0100_0000;
        }
        flags
    }

    pub fn from_byte(byte: u8) -> Self {
        ExpandedMode {
            two_color: byte & 0b0000_0001 != 0,
            cut_at_end: byte & 0b0000_1000 != 0,
            high_resolution: byte & 0b0100_0000 != 0,
        }
    }
}

/// How the printer should finish a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    /// FF: print and keep feeding, more pages follow.
    Feed,
    /// Control-Z: print then eject (and cut, if enabled).
    Eject,
}

/// Whether a setting command reads or writes the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingAction {
    Write,
    Read,
}

/// One protocol command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Run of 0x00 bytes flushing a half received job.
    Invalidate(usize),
    /// ESC @
    Initialize,
    /// ESC i S
    StatusRequest,
    /// ESC i a 01
    SwitchToRaster,
    /// ESC i ! : `true` enables automatic status notifications.
    StatusNotification(bool),
    /// ESC i z
    MediaQuality(MediaQuality),
    /// ESC i M : auto cut flag.
    VariousMode { auto_cut: bool },
    /// ESC i A : cut every n labels.
    CutEvery(u8),
    /// ESC i K
    ExpandedMode(ExpandedMode),
    /// ESC i d : feed amount in dots.
    Margins(u16),
    /// M : PackBits compression on or off.
    Compression(bool),
    /// g 00 len data
    Raster(Vec<u8>),
    /// w plane len data
    TwoColorRaster { plane: Plane, data: Vec<u8> },
    /// G len_lo len_hi data
    PTouchRaster(Vec<u8>),
    /// Z : blank raster line.
    ZeroRaster,
    /// FF or Control-Z
    Print(PrintMode),
    /// ESC i U code action payload
    Setting {
        code: u8,
        action: SettingAction,
        payload: Vec<u8>,
    },
}

impl Instruction {
    /// Append the wire bytes of this instruction to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Invalidate(n) => buf.resize(buf.len() + n, 0x00),
            Self::Initialize => buf.extend_from_slice(&[ESC, 0x40]),
            Self::StatusRequest => buf.extend_from_slice(&[ESC, 0x69, 0x53]),
            Self::SwitchToRaster => buf.extend_from_slice(&[ESC, 0x69, 0x61, 0x01]),
            Self::StatusNotification(notify) => {
                buf.extend_from_slice(&[ESC, 0x69, 0x21, if *notify { 0x00 } else { 0x01 }])
            }
            Self::MediaQuality(media) => {
                buf.extend_from_slice(&[
                    ESC,
                    0x69,
                    0x7A,
                    media.flags(),
                    media.media_type,
                    media.width_mm,
                    media.length_mm,
                ]);
                buf.extend_from_slice(&media.raster_lines.to_le_bytes());
                buf.push(if media.continued { 0x01 } else { 0x00 });
                buf.push(0x00);
            }
            Self::VariousMode { auto_cut } => {
                buf.extend_from_slice(&[ESC, 0x69, 0x4D, if *auto_cut { 0b0100_0000 } else { 0x00 }])
            }
            Self::CutEvery(n) => buf.extend_from_slice(&[ESC, 0x69, 0x41, *n]),
            Self::ExpandedMode(mode) => buf.extend_from_slice(&[ESC, 0x69, 0x4B, mode.to_byte()]),
            Self::Margins(dots) => {
                buf.extend_from_slice(&[ESC, 0x69, 0x64]);
                buf.extend_from_slice(&dots.to_le_bytes());
            }
            Self::Compression(on) => buf.extend_from_slice(&[0x4D, if *on { 0x02 } else { 0x00 }]),
            Self::Raster(data) => {
                buf.extend_from_slice(&[0x67, 0x00, data.len() as u8]);
                buf.extend_from_slice(data);
            }
            Self::TwoColorRaster { plane, data } => {
                buf.extend_from_slice(&[0x77, plane.code(), data.len() as u8]);
                buf.extend_from_slice(data);
            }
            Self::PTouchRaster(data) => {
                buf.push(0x47);
                buf.extend_from_slice(&(data.len() as u16).to_le_bytes());
                buf.extend_from_slice(data);
            }
            Self::ZeroRaster => buf.push(0x5A),
            Self::Print(PrintMode::Feed) => buf.push(0x0C),
            Self::Print(PrintMode::Eject) => buf.push(0x1A),
            Self::Setting {
                code,
                action,
                payload,
            } => {
                let action = match action {
                    SettingAction::Write => 0x00,
                    SettingAction::Read => 0x01,
                };
                buf.extend_from_slice(&[ESC, 0x69, 0x55, *code, action]);
                buf.extend_from_slice(payload);
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }

    /// Short name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Invalidate(_) => "invalidate",
            Self::Initialize => "initialize",
            Self::StatusRequest => "status request",
            Self::SwitchToRaster => "switch to raster",
            Self::StatusNotification(_) => "status notification",
            Self::MediaQuality(_) => "media & quality",
            Self::VariousMode { .. } => "various mode",
            Self::CutEvery(_) => "cut every",
            Self::ExpandedMode(_) => "expanded mode",
            Self::Margins(_) => "margins",
            Self::Compression(_) => "compression",
            Self::Raster(_) | Self::TwoColorRaster { .. } | Self::PTouchRaster(_) => "raster",
            Self::ZeroRaster => "zero raster",
            Self::Print(_) => "print",
            Self::Setting { .. } => "setting",
        }
    }
}

/// Bytes of a status request: invalidate, initialize, ESC i S.
pub fn status_request(invalidate_bytes: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    Instruction::Invalidate(invalidate_bytes).encode(&mut buf);
    Instruction::Initialize.encode(&mut buf);
    Instruction::StatusRequest.encode(&mut buf);
    buf
}
