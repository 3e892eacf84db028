//! Error types for raster building, status decoding and printer sessions.
//!
//! The codec side ([`BuildError`], [`CodecError`], [`ParseError`],
//! [`ReadError`]) never does I/O. [`Error`] is what a printer session returns
//! and wraps everything else, transport failures included.

use thiserror::Error;

use crate::status::{Faults, StatusType};

/// Main error type for printer sessions.
///
/// This enum encompasses all possible errors that can occur when talking to
/// a printer, from transport failures to faults reported by the device.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error from a byte-stream transport.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// USB communication error.
    ///
    /// Wraps underlying rusb errors for device communication issues,
    /// timeouts, or permission problems.
    #[cfg(feature = "usb")]
    #[error(transparent)]
    Usb(#[from] rusb::Error),

    /// Printer device is not connected or not responding.
    #[error("Device is offline")]
    DeviceOffline,

    #[error("Device is missing endpoint")]
    MissingEndpoint,

    /// A bulk write returned before all bytes were accepted.
    #[error("Wrote {written} of {expected} bytes, possibly a timeout")]
    ShortWrite { written: usize, expected: usize },

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The installed media is not the label the job was built for.
    #[error("Media mismatch: expected {expected}, found {actual:?}")]
    MediaMismatch {
        expected: &'static str,
        actual: Option<&'static str>,
    },

    #[error("Status request return no response")]
    ReadStatusTimeout,

    #[error("Unexpected status type: {0:?}")]
    UnexpectedStatus(StatusType),

    /// Hardware-level printer error.
    ///
    /// The status packet reported one or more fault bits, such as cover
    /// open, media end or a cutter jam. Set bits the status dialect does
    /// not define are kept raw in `unrecognized`.
    #[error("Printer reported faults: {faults:?} (unrecognized bits {unrecognized:#06X})")]
    Device { faults: Faults, unrecognized: u16 },
}

/// Lookup failures in the capability tables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Unknown printer model {0:?}")]
    UnknownModel(String),

    #[error("Unknown label {0:?}")]
    UnknownLabel(String),
}

/// Errors of the line codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Zero-width rows carry nothing and are never encoded.
    #[error("Raster row is empty")]
    EmptyRow,

    /// A run header at `offset` declares more bytes than the buffer holds.
    #[error("Run at byte {offset} reads past the end of the line")]
    MalformedRun { offset: usize },

    #[error("Decoded line is {actual} bytes, expected {expected}")]
    WidthMismatch { expected: usize, actual: usize },
}

/// Pre-flight and construction failures of the instruction builder.
///
/// All of them are fixable by the caller by choosing another label, model
/// or option set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Label {label} can not be printed on {model}")]
    IncompatibleLabelModel {
        label: &'static str,
        model: &'static str,
    },

    /// No raster offset is known for this printable width on the model.
    #[error("Printable width of {width} dots is not supported by {model}")]
    UnsupportedWidth { model: &'static str, width: u32 },

    #[error("Bitmap has no rows")]
    EmptyBitmap,

    #[error("Row {row} is {actual} pixels wide, label expects {expected}")]
    RowWidthMismatch {
        row: usize,
        expected: u32,
        actual: u32,
    },

    #[error("{model} does not support {feature}")]
    UnsupportedFeature {
        model: &'static str,
        feature: &'static str,
    },

    /// Too few or too many rows for the label (die-cut) or the model.
    #[error("Bitmap has {actual} rows, expected between {min} and {max}")]
    LengthMismatch { min: usize, max: usize, actual: usize },

    #[error("Red plane has {red} rows but black plane has {black}")]
    PlaneMismatch { black: usize, red: usize },

    #[error("Invalid print option: {0}")]
    InvalidOption(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Status packet decoding failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Status packet is {actual} bytes, expected {expected}")]
    WrongLength { expected: usize, actual: usize },

    #[error("Status packet header {0:02X?} is not a Brother status header")]
    BadMagic([u8; 3]),

    #[error("Status dialect of series code {0:#04X} is not supported")]
    UnsupportedDialect(u8),
}

/// Instruction stream decoding failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("Unknown opcode {byte:#04X} at byte {offset}")]
    UnknownOpcode { offset: usize, byte: u8 },

    #[error("Instruction at byte {offset} is truncated")]
    Truncated { offset: usize },

    #[error(transparent)]
    Codec(#[from] CodecError),
}
