//! Brother QL / P-touch raster protocol
//!
//! This crate turns packed 1-bit bitmaps into the raster instruction stream
//! understood by Brother QL label printers and P-touch tape printers, and
//! decodes the 32 byte status packets they send back.
//!
//! - [`labels`] and [`model`] hold the label and printer capability tables.
//! - [`build`] validates a job and emits the instruction stream.
//! - [`StatusPacket::parse`] decodes status replies.
//! - [`read_instructions`] and [`read_pages`] split a captured stream back
//!   into instructions and pages.
//! - [`Printer`] drives a job over a [`Transport`]; USB support is behind
//!   the `usb` feature.
//!
//! # Example
//!
//! ```rust
//! use ql_raster::{build, lookup_label, lookup_model, Bitmap, LabelImage, PrintOptions};
//!
//! let model = lookup_model("QL-800").unwrap();
//! let label = lookup_label("62").unwrap();
//! let image = LabelImage::mono(Bitmap::blank(label.width(), 100));
//! let options = PrintOptions::new("62", "QL-800").compress(true);
//!
//! let job = build(&image, &options, model, label).unwrap();
//! let bytes = job.to_bytes();
//! assert_eq!(bytes.last(), Some(&0x1A));
//! ```

pub mod bitmap;
pub mod codec;
mod error;
pub mod instruction;
pub mod labels;
pub mod model;
mod printer;
mod raster;
mod reader;
pub mod status;
mod transport;

pub use crate::{
    bitmap::{Bitmap, LabelImage},
    error::{BuildError, CodecError, Error, LookupError, ParseError, ReadError},
    instruction::{Instruction, PrintMode},
    labels::{is_compatible, lookup_label, LabelKind, LabelProfile},
    model::{lookup_model, ModelProfile, NORMAL_PRINTER_WIDTH, WIDE_PRINTER_WIDTH},
    printer::{Printer, Setting},
    raster::{build, PrintOptions, RasterJob},
    reader::{read_instructions, read_pages, Page},
    status::{Faults, StatusPacket},
    transport::{StreamTransport, Transport},
};

#[cfg(feature = "usb")]
pub use crate::transport::UsbTransport;
