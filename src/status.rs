//! Status packet decoding.
//!
//! Printers answer a status request, and report job progress on their own,
//! with a fixed 32 byte packet:
//!
//! | byte  | field                         |
//! |-------|-------------------------------|
//! | 0     | print head mark `0x80`        |
//! | 1     | packet size `0x20`            |
//! | 2     | Brother code `B` (`0x42`)     |
//! | 3     | series code                   |
//! | 4     | model code                    |
//! | 8, 9  | error information 1 and 2     |
//! | 10    | media width (mm)              |
//! | 11    | media type                    |
//! | 15    | mode                          |
//! | 17    | media length (mm)             |
//! | 18    | status type                   |
//! | 19    | phase type                    |
//! | 20-21 | phase number (big endian)     |
//! | 22    | notification number           |
//! | 23    | expansion area                |
//! | 24    | tape color                    |
//! | 25    | text color                    |
//! | 30    | requested setting             |

use bitflags::bitflags;
use log::debug;

use crate::{
    error::ParseError,
    labels::{label_by_media, label_by_tape, LabelProfile},
    model::{model_by_codes, ModelProfile},
};

/// Size of every status packet.
pub const STATUS_LEN: usize = 32;

/// Fixed header: print head mark, size, Brother code.
pub const STATUS_MAGIC: [u8; 3] = [0x80, 0x20, 0x42];

bitflags! {
    /// Fault bits of error information 1 (low byte) and 2 (high byte).
    pub struct Faults: u16 {
        const NO_MEDIA = 1 << 0;
        const END_OF_MEDIA = 1 << 1;
        const CUTTER_JAM = 1 << 2;
        const WEAK_BATTERIES = 1 << 3;
        const PRINTER_IN_USE = 1 << 4;
        const TURNED_OFF = 1 << 5;
        const HIGH_VOLTAGE_ADAPTER = 1 << 6;
        const FAN_FAILURE = 1 << 7;
        const REPLACE_MEDIA = 1 << 8;
        const EXPANSION_BUFFER_FULL = 1 << 9;
        const TRANSMISSION_ERROR = 1 << 10;
        const COMMUNICATION_BUFFER_FULL = 1 << 11;
        const COVER_OPEN = 1 << 12;
        const OVERHEATING = 1 << 13;
        const FEED_FAILURE = 1 << 14;
        const SYSTEM_ERROR = 1 << 15;
    }
}

/// Status layout family, selected by the series code of the packet.
///
/// The layout is the same for both; they differ in which fault bits are
/// defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusDialect {
    /// Series code 0x30: QL-500/550/650TD/1050 and P-touch models.
    Series30,
    /// Series code 0x34: the later QL models.
    Series34,
}

impl StatusDialect {
    pub fn from_series_code(code: u8) -> Option<Self> {
        match code {
            0x30 => Some(Self::Series30),
            0x34 => Some(Self::Series34),
            _ => None,
        }
    }

    /// Fault bits this dialect defines.
    pub fn faults(&self) -> Faults {
        let unused = Faults::HIGH_VOLTAGE_ADAPTER | Faults::COMMUNICATION_BUFFER_FULL;
        match self {
            Self::Series30 => Faults::all() - unused,
            Self::Series34 => Faults::all() - unused - Faults::WEAK_BATTERIES - Faults::OVERHEATING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    NoMedia,
    LaminatedTape,
    NonLaminatedTape,
    HeatShrinkTube21,
    HeatShrinkTube31,
    ContinuousTape,
    DieCutLabels,
    /// RD (receipt) continuous roll.
    RdContinuousTape,
    /// RD (receipt) die-cut roll.
    RdDieCutLabels,
    IncompatibleTape,
    Unknown(u8),
}

impl MediaType {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::NoMedia,
            0x01 => Self::LaminatedTape,
            0x03 => Self::NonLaminatedTape,
            0x11 => Self::HeatShrinkTube21,
            0x17 => Self::HeatShrinkTube31,
            // Documented as 0x4A / 0x4B, but DK rolls report 0x0A / 0x0B
            0x0A => Self::ContinuousTape,
            0x0B => Self::DieCutLabels,
            0x4A => Self::RdContinuousTape,
            0x4B => Self::RdDieCutLabels,
            0xFF => Self::IncompatibleTape,
            _ => Self::Unknown(code),
        }
    }

    /// P-touch TZe and heat-shrink cassettes, which also report colors.
    pub fn is_tape_cassette(&self) -> bool {
        matches!(
            self,
            Self::LaminatedTape | Self::NonLaminatedTape | Self::HeatShrinkTube21 | Self::HeatShrinkTube31
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusType {
    ReplyToRequest,
    PrintingCompleted,
    ErrorOccurred,
    ExitIfMode,
    TurnedOff,
    Notification,
    PhaseChange,
    SettingsReport,
    Unknown(u8),
}

impl StatusType {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::ReplyToRequest,
            0x01 => Self::PrintingCompleted,
            0x02 => Self::ErrorOccurred,
            0x03 => Self::ExitIfMode,
            0x04 => Self::TurnedOff,
            0x05 => Self::Notification,
            0x06 => Self::PhaseChange,
            0xF0 => Self::SettingsReport,
            _ => Self::Unknown(code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Receiving,
    Printing,
    Unknown(u8),
}

impl Phase {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::Receiving,
            0x01 => Self::Printing,
            _ => Self::Unknown(code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    NotAvailable,
    CoolingStarted,
    CoolingFinished,
    Unknown(u8),
}

impl Notification {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::NotAvailable,
            0x03 => Self::CoolingStarted,
            0x04 => Self::CoolingFinished,
            _ => Self::Unknown(code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapeColor {
    White,
    Other,
    Clear,
    Red,
    Blue,
    Yellow,
    Green,
    Black,
    ClearWhiteText,
    MatteWhite,
    MatteClear,
    MatteSilver,
    SatinGold,
    SatinSilver,
    BlueD,
    RedD,
    FluorescentOrange,
    FluorescentYellow,
    BerryPinkS,
    LightGrayS,
    LimeGreenS,
    YellowF,
    PinkF,
    BlueF,
    WhiteHeatShrinkTube,
    WhiteFlexId,
    YellowFlexId,
    Cleaning,
    Stencil,
    Incompatible,
    Unknown(u8),
}

impl TapeColor {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::White,
            0x02 => Self::Other,
            0x03 => Self::Clear,
            0x04 => Self::Red,
            0x05 => Self::Blue,
            0x06 => Self::Yellow,
            0x07 => Self::Green,
            0x08 => Self::Black,
            0x09 => Self::ClearWhiteText,
            0x20 => Self::MatteWhite,
            0x21 => Self::MatteClear,
            0x22 => Self::MatteSilver,
            0x23 => Self::SatinGold,
            0x24 => Self::SatinSilver,
            0x30 => Self::BlueD,
            0x31 => Self::RedD,
            0x40 => Self::FluorescentOrange,
            0x41 => Self::FluorescentYellow,
            0x50 => Self::BerryPinkS,
            0x51 => Self::LightGrayS,
            0x52 => Self::LimeGreenS,
            0x60 => Self::YellowF,
            0x61 => Self::PinkF,
            0x62 => Self::BlueF,
            0x70 => Self::WhiteHeatShrinkTube,
            0x90 => Self::WhiteFlexId,
            0x91 => Self::YellowFlexId,
            0xF0 => Self::Cleaning,
            0xF1 => Self::Stencil,
            0xFF => Self::Incompatible,
            _ => Self::Unknown(code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColor {
    White,
    Other,
    Red,
    Blue,
    Black,
    Gold,
    BlueF,
    Cleaning,
    Stencil,
    Incompatible,
    Unknown(u8),
}

impl TextColor {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::White,
            0x02 => Self::Other,
            0x04 => Self::Red,
            0x05 => Self::Blue,
            0x08 => Self::Black,
            0x0A => Self::Gold,
            0x62 => Self::BlueF,
            0xF0 => Self::Cleaning,
            0xF1 => Self::Stencil,
            0xFF => Self::Incompatible,
            _ => Self::Unknown(code),
        }
    }
}

///
/// Status received from the printer decoded to Rust friendly types.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPacket {
    pub dialect: StatusDialect,
    pub series_code: u8,
    pub model_code: u8,
    /// Fault bits defined by the dialect.
    pub faults: Faults,
    /// Set error bits the dialect does not define, as raw `err2 << 8 | err1`.
    pub unrecognized_faults: u16,
    pub media_width: u8,
    pub media_type: MediaType,
    pub media_length: u8,
    pub mode: u8,
    pub status_type: StatusType,
    pub phase: Phase,
    pub phase_number: u16,
    pub notification: Notification,
    /// Expansion area, extended error information on some firmwares.
    pub extended_error: u8,
    pub tape_color: TapeColor,
    pub text_color: TextColor,
    /// Value of the requested setting, present in settings reports only.
    pub setting: Option<u8>,
}

impl StatusPacket {
    /// Decode a status packet.
    ///
    /// The length is checked first, then the header, then the dialect;
    /// every field is decoded only after all three pass.
    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        if buf.len() != STATUS_LEN {
            return Err(ParseError::WrongLength {
                expected: STATUS_LEN,
                actual: buf.len(),
            });
        }
        if buf[..3] != STATUS_MAGIC {
            return Err(ParseError::BadMagic([buf[0], buf[1], buf[2]]));
        }
        let dialect =
            StatusDialect::from_series_code(buf[3]).ok_or(ParseError::UnsupportedDialect(buf[3]))?;

        let raw_errors = u16::from_le_bytes([buf[8], buf[9]]);
        let defined = dialect.faults();
        let status_type = StatusType::from_code(buf[18]);

        let status = StatusPacket {
            dialect,
            series_code: buf[3],
            model_code: buf[4],
            faults: Faults::from_bits_truncate(raw_errors) & defined,
            unrecognized_faults: raw_errors & !defined.bits(),
            media_width: buf[10],
            media_type: MediaType::from_code(buf[11]),
            media_length: buf[17],
            mode: buf[15],
            status_type,
            phase: Phase::from_code(buf[19]),
            phase_number: u16::from_be_bytes([buf[20], buf[21]]),
            notification: Notification::from_code(buf[22]),
            extended_error: buf[23],
            tape_color: TapeColor::from_code(buf[24]),
            text_color: TextColor::from_code(buf[25]),
            setting: match status_type {
                StatusType::SettingsReport => Some(buf[30]),
                _ => None,
            },
        };

        debug!("Raw status code: {:X?}", buf);
        debug!("Parsed status: {:?}", status);

        Ok(status)
    }

    /// The model reporting this status, if it is in the model table.
    pub fn model(&self) -> Option<&'static ModelProfile> {
        model_by_codes(self.series_code, self.model_code)
    }

    /// The label matching the installed media, if it is in the label table.
    pub fn label(&self) -> Option<&'static LabelProfile> {
        if self.media_type.is_tape_cassette() {
            return label_by_tape(self.media_width);
        }
        let code = match self.media_type {
            MediaType::ContinuousTape => 0x0A,
            MediaType::DieCutLabels => 0x0B,
            MediaType::RdContinuousTape => 0x4A,
            MediaType::RdDieCutLabels => 0x4B,
            _ => return None,
        };
        label_by_media(code, self.media_width, self.media_length)
    }

    pub fn has_errors(&self) -> bool {
        !self.faults.is_empty() || self.unrecognized_faults != 0
    }

    /// No faults and waiting for data.
    pub fn is_ready(&self) -> bool {
        !self.has_errors() && self.phase == Phase::Receiving
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A QL-800 reply to a status request with 62 mm endless tape loaded.
    pub(crate) fn ql800_reply() -> [u8; 32] {
        let mut buf = [0x00; 32];
        buf[..3].copy_from_slice(&STATUS_MAGIC);
        buf[3] = 0x34;
        buf[4] = 0x38;
        buf[5] = 0x30;
        buf[10] = 62;
        buf[11] = 0x0A;
        buf[24] = 0x01;
        buf[25] = 0x08;
        buf
    }

    #[test]
    fn parse_reply_to_request() {
        let status = StatusPacket::parse(&ql800_reply()).unwrap();
        assert_eq!(status.dialect, StatusDialect::Series34);
        assert_eq!(status.model().map(|m| m.id), Some("QL-800"));
        assert_eq!(status.media_type, MediaType::ContinuousTape);
        assert_eq!(status.label().map(|l| l.id), Some("62"));
        assert_eq!(status.status_type, StatusType::ReplyToRequest);
        assert_eq!(status.phase, Phase::Receiving);
        assert_eq!(status.tape_color, TapeColor::White);
        assert_eq!(status.text_color, TextColor::Black);
        assert_eq!(status.setting, None);
        assert!(status.is_ready());
    }

    #[test]
    fn wrong_length() {
        assert_eq!(
            StatusPacket::parse(&[0x80, 0x20, 0x42]),
            Err(ParseError::WrongLength {
                expected: 32,
                actual: 3
            })
        );
        assert_eq!(
            StatusPacket::parse(&[0x00; 33]),
            Err(ParseError::WrongLength {
                expected: 32,
                actual: 33
            })
        );
    }

    #[test]
    fn bad_magic() {
        let mut buf = ql800_reply();
        buf[2] = 0x43;
        assert_eq!(
            StatusPacket::parse(&buf),
            Err(ParseError::BadMagic([0x80, 0x20, 0x43]))
        );
    }

    #[test]
    fn unsupported_dialect() {
        let mut buf = ql800_reply();
        buf[3] = 0x35;
        assert_eq!(
            StatusPacket::parse(&buf),
            Err(ParseError::UnsupportedDialect(0x35))
        );
    }

    #[test]
    fn fault_bits() {
        let mut buf = ql800_reply();
        buf[8] = 0b0000_0101;
        buf[9] = 0b0001_0000;
        buf[18] = 0x02;
        let status = StatusPacket::parse(&buf).unwrap();
        assert_eq!(
            status.faults,
            Faults::NO_MEDIA | Faults::CUTTER_JAM | Faults::COVER_OPEN
        );
        assert_eq!(status.unrecognized_faults, 0);
        assert_eq!(status.status_type, StatusType::ErrorOccurred);
        assert!(status.has_errors());
        assert!(!status.is_ready());
    }

    #[test]
    fn bits_outside_the_dialect_are_kept_raw() {
        let mut buf = ql800_reply();
        // weak batteries only exists on series 0x30 printers
        buf[8] = 0b0000_1000;
        let status = StatusPacket::parse(&buf).unwrap();
        assert!(status.faults.is_empty());
        assert_eq!(status.unrecognized_faults, 0x0008);
        assert!(status.has_errors());

        buf[3] = 0x30;
        let status = StatusPacket::parse(&buf).unwrap();
        assert_eq!(status.faults, Faults::WEAK_BATTERIES);
        assert_eq!(status.unrecognized_faults, 0);
    }

    #[test]
    fn unknown_codes_are_preserved() {
        let mut buf = ql800_reply();
        buf[11] = 0x5C;
        buf[18] = 0x07;
        buf[19] = 0x09;
        buf[22] = 0x11;
        let status = StatusPacket::parse(&buf).unwrap();
        assert_eq!(status.media_type, MediaType::Unknown(0x5C));
        assert_eq!(status.status_type, StatusType::Unknown(0x07));
        assert_eq!(status.phase, Phase::Unknown(0x09));
        assert_eq!(status.notification, Notification::Unknown(0x11));
        assert_eq!(status.label(), None);
    }

    #[test]
    fn settings_report_carries_the_value() {
        let mut buf = ql800_reply();
        buf[18] = 0xF0;
        buf[30] = 0x02;
        let status = StatusPacket::parse(&buf).unwrap();
        assert_eq!(status.status_type, StatusType::SettingsReport);
        assert_eq!(status.setting, Some(0x02));
    }

    #[test]
    fn printing_phase() {
        let mut buf = ql800_reply();
        buf[18] = 0x06;
        buf[19] = 0x01;
        buf[20] = 0x01;
        buf[21] = 0x02;
        let status = StatusPacket::parse(&buf).unwrap();
        assert_eq!(status.status_type, StatusType::PhaseChange);
        assert_eq!(status.phase, Phase::Printing);
        assert_eq!(status.phase_number, 0x0102);
        assert!(!status.is_ready());
    }

    #[test]
    fn tape_cassette_resolves_to_ptouch_tape() {
        let mut buf = ql800_reply();
        buf[3] = 0x30;
        buf[4] = 0x67;
        buf[10] = 24;
        buf[11] = 0x01;
        let status = StatusPacket::parse(&buf).unwrap();
        assert!(status.media_type.is_tape_cassette());
        assert_eq!(status.model().map(|m| m.id), Some("PT-P700"));
        assert_eq!(status.label().map(|l| l.id), Some("pt24"));
    }
}
