//! Printer model table.
//!
//! Each supported printer is one [`ModelProfile`] entry in [`MODELS`]. The
//! builder consults the profile once per job; model quirks are data here
//! rather than branches in the encoder.

use crate::{
    error::LookupError,
    labels::{LabelKind, MediaFamily},
    status::StatusDialect,
};

/// Width in dots of the normal QL print head (90 bytes per row).
pub const NORMAL_PRINTER_WIDTH: u32 = 720;

/// Width in dots of the wide QL-10xx/11xx print head (162 bytes per row).
pub const WIDE_PRINTER_WIDTH: u32 = 1296;

/// Raster command family understood by a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterDialect {
    /// `g 0x00 len` rows (`w plane len` in two-color mode), one length byte.
    Ql,
    /// `G len_lo len_hi` rows.
    PTouch,
}

/// Capabilities of one printer model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelProfile {
    pub id: &'static str,
    /// Label kinds the model can feed.
    pub kinds: &'static [LabelKind],
    pub bytes_per_row: u16,
    /// Minimum and maximum number of rows of one label.
    pub length_range: (u32, u32),
    /// Minimum and maximum feed amount in dots.
    pub feed_range: (u16, u16),
    pub two_color: bool,
    pub cutting: bool,
    pub compression: bool,
    /// Needs the explicit switch to raster mode.
    pub mode_setting: bool,
    pub expanded_mode: bool,
    /// Number of 0x00 bytes of the invalidate command.
    pub invalidate_bytes: usize,
    pub raster_dialect: RasterDialect,
    pub status_dialect: StatusDialect,
    /// Printable label width in dots to the blank dots placed on the right
    /// side of the print head before the label starts.
    pub offsets: &'static [(u32, u32)],
    pub series_code: u8,
    pub model_code: u8,
    pub product_id: u16,
}

impl ModelProfile {
    /// Maximum printable width in dots.
    pub fn max_width(&self) -> u32 {
        self.bytes_per_row as u32 * 8
    }

    /// DK rolls on QL heads, TZe cassettes on P-touch heads.
    pub fn media_family(&self) -> MediaFamily {
        match self.raster_dialect {
            RasterDialect::Ql => MediaFamily::Dk,
            RasterDialect::PTouch => MediaFamily::Tze,
        }
    }

    pub fn supports(&self, kind: LabelKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Raster offset for a label of `width` printable dots, if the model
    /// knows that width.
    pub fn offset_for(&self, width: u32) -> Option<u32> {
        self.offsets
            .iter()
            .find(|(w, _)| *w == width)
            .map(|(_, offset)| *offset)
    }
}

const QL_KINDS: &[LabelKind] = &[LabelKind::Endless, LabelKind::DieCut, LabelKind::Round];

const PTOUCH_KINDS: &[LabelKind] = &[LabelKind::Endless];

const NORMAL_OFFSETS: &[(u32, u32)] = &[
    (94, 113),
    (106, 29),
    (165, 0),
    (202, 42),
    (236, 42),
    (306, 6),
    (413, 12),
    (425, 6),
    (554, 12),
    (578, 0),
    (590, 0),
    (598, 60),
    (618, 51),
    (672, 18),
    (696, 12),
];

// The wide head needs 44 more dots on the right.
const WIDE_OFFSETS: &[(u32, u32)] = &[
    (94, 157),
    (106, 73),
    (165, 44),
    (202, 86),
    (236, 86),
    (306, 50),
    (413, 56),
    (425, 50),
    (554, 56),
    (578, 44),
    (590, 44),
    (598, 104),
    (618, 95),
    (672, 62),
    (696, 56),
    (1164, 56),
    (1200, 56),
];

const PTOUCH_OFFSETS: &[(u32, u32)] = &[(70, 29), (112, 8), (128, 0)];

const QL: ModelProfile = ModelProfile {
    id: "",
    kinds: QL_KINDS,
    bytes_per_row: 90,
    length_range: (150, 11811),
    feed_range: (35, 1500),
    two_color: false,
    cutting: true,
    compression: true,
    mode_setting: true,
    expanded_mode: true,
    invalidate_bytes: 200,
    raster_dialect: RasterDialect::Ql,
    status_dialect: StatusDialect::Series34,
    offsets: NORMAL_OFFSETS,
    series_code: 0x34,
    model_code: 0xFF,
    product_id: 0xFFFF,
};

const QL_WIDE: ModelProfile = ModelProfile {
    bytes_per_row: 162,
    length_range: (295, 35433),
    offsets: WIDE_OFFSETS,
    ..QL
};

const PTOUCH: ModelProfile = ModelProfile {
    kinds: PTOUCH_KINDS,
    bytes_per_row: 16,
    length_range: (31, 7086),
    raster_dialect: RasterDialect::PTouch,
    status_dialect: StatusDialect::Series30,
    offsets: PTOUCH_OFFSETS,
    series_code: 0x30,
    ..QL
};

pub static MODELS: &[ModelProfile] = &[
    ModelProfile {
        id: "QL-500",
        length_range: (295, 11811),
        compression: false,
        mode_setting: false,
        expanded_mode: false,
        cutting: false,
        status_dialect: StatusDialect::Series30,
        series_code: 0x30,
        model_code: 0x4F,
        product_id: 0x2015,
        ..QL
    },
    ModelProfile {
        id: "QL-550",
        length_range: (295, 11811),
        compression: false,
        mode_setting: false,
        status_dialect: StatusDialect::Series30,
        series_code: 0x30,
        model_code: 0x4F,
        product_id: 0x2016,
        ..QL
    },
    ModelProfile {
        id: "QL-560",
        length_range: (295, 11811),
        compression: false,
        mode_setting: false,
        model_code: 0x31,
        product_id: 0x2027,
        ..QL
    },
    ModelProfile {
        id: "QL-570",
        compression: false,
        mode_setting: false,
        model_code: 0x32,
        product_id: 0x2028,
        ..QL
    },
    ModelProfile {
        id: "QL-580N",
        model_code: 0x33,
        product_id: 0x2029,
        ..QL
    },
    ModelProfile {
        id: "QL-600",
        model_code: 0x47,
        product_id: 0x20C0,
        ..QL
    },
    ModelProfile {
        id: "QL-650TD",
        length_range: (295, 11811),
        status_dialect: StatusDialect::Series30,
        series_code: 0x30,
        model_code: 0x51,
        product_id: 0x201B,
        ..QL
    },
    ModelProfile {
        id: "QL-700",
        compression: false,
        mode_setting: false,
        model_code: 0x35,
        product_id: 0x2042,
        ..QL
    },
    ModelProfile {
        id: "QL-710W",
        model_code: 0x36,
        product_id: 0x2043,
        ..QL
    },
    ModelProfile {
        id: "QL-720NW",
        model_code: 0x37,
        product_id: 0x2044,
        ..QL
    },
    ModelProfile {
        id: "QL-800",
        two_color: true,
        compression: false,
        invalidate_bytes: 400,
        model_code: 0x38,
        product_id: 0x209B,
        ..QL
    },
    ModelProfile {
        id: "QL-810W",
        two_color: true,
        invalidate_bytes: 400,
        model_code: 0x39,
        product_id: 0x209C,
        ..QL
    },
    ModelProfile {
        id: "QL-820NWB",
        two_color: true,
        invalidate_bytes: 400,
        model_code: 0x41,
        product_id: 0x209D,
        ..QL
    },
    ModelProfile {
        id: "QL-1050",
        status_dialect: StatusDialect::Series30,
        series_code: 0x30,
        model_code: 0x50,
        product_id: 0x2020,
        ..QL_WIDE
    },
    ModelProfile {
        id: "QL-1060N",
        model_code: 0x34,
        product_id: 0x202A,
        ..QL_WIDE
    },
    ModelProfile {
        id: "QL-1100",
        length_range: (301, 35434),
        model_code: 0x43,
        product_id: 0x20A7,
        ..QL_WIDE
    },
    ModelProfile {
        id: "QL-1110NWB",
        length_range: (301, 35434),
        model_code: 0x44,
        product_id: 0x20A8,
        ..QL_WIDE
    },
    ModelProfile {
        id: "QL-1115NWB",
        length_range: (301, 35434),
        model_code: 0x45,
        product_id: 0x20AB,
        ..QL_WIDE
    },
    ModelProfile {
        id: "PT-E550W",
        length_range: (31, 14172),
        model_code: 0x68,
        product_id: 0x2060,
        ..PTOUCH
    },
    ModelProfile {
        id: "PT-P700",
        model_code: 0x67,
        product_id: 0x2061,
        ..PTOUCH
    },
    ModelProfile {
        id: "PT-P750W",
        model_code: 0x68,
        product_id: 0x2062,
        ..PTOUCH
    },
    // 560 dot head; no verified raster offsets yet.
    ModelProfile {
        id: "PT-P900W",
        bytes_per_row: 70,
        length_range: (57, 28346),
        offsets: &[],
        model_code: 0x69,
        product_id: 0x2085,
        ..PTOUCH
    },
    ModelProfile {
        id: "PT-P950NW",
        bytes_per_row: 70,
        length_range: (57, 28346),
        offsets: &[],
        model_code: 0x70,
        product_id: 0x2086,
        ..PTOUCH
    },
];

/// Find a model by its identifier, e.g. `"QL-800"`.
pub fn lookup_model(id: &str) -> Result<&'static ModelProfile, LookupError> {
    MODELS
        .iter()
        .find(|model| model.id == id)
        .ok_or_else(|| LookupError::UnknownModel(id.to_string()))
}

/// Find the model reporting `series_code`/`model_code` in its status.
///
/// Some models share codes (QL-500/QL-550, PT-E550W/PT-P750W); the first
/// entry wins.
pub fn model_by_codes(series_code: u8, model_code: u8) -> Option<&'static ModelProfile> {
    MODELS
        .iter()
        .find(|model| model.series_code == series_code && model.model_code == model_code)
}

pub fn model_by_product_id(product_id: u16) -> Option<&'static ModelProfile> {
    MODELS.iter().find(|model| model.product_id == product_id)
}
