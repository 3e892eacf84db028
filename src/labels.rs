//! Label geometry table.
//!
//! Every label the printers understand is one immutable [`LabelProfile`]
//! entry in [`LABELS`]. Adding a label means adding an entry here; the
//! raster builder only ever reads these records.

use crate::{error::LookupError, model::ModelProfile};

/// Physical form of a label roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// Continuous tape, cut by the printer or by hand.
    Endless,
    /// Pre-sized rectangular labels on a backing liner.
    DieCut,
    /// Pre-sized round labels on a backing liner.
    Round,
}

impl LabelKind {
    /// Media type byte used by the media & quality command.
    pub fn media_code(&self) -> u8 {
        match self {
            Self::Endless => 0x0A,
            Self::DieCut | Self::Round => 0x0B,
        }
    }
}

/// Media line a label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaFamily {
    /// DK rolls for the QL printers.
    Dk,
    /// TZe tape cassettes for the P-touch printers.
    Tze,
}

/// Geometry of one label type.
///
/// Pixel values are print head dots at 300 dpi. The width of a row handed
/// to the builder must equal [`LabelProfile::width`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelProfile {
    pub id: &'static str,
    pub kind: LabelKind,
    pub family: MediaFamily,
    /// Tape width and label length in millimetres; length is 0 for endless tape.
    pub tape_size: (u8, u8),
    /// Full label size in dots, margins included.
    pub dots_total: (u32, u32),
    /// Printable area in dots; length is 0 for endless tape.
    pub dots_printable: (u32, u32),
    /// Feed amount in dots sent with the margins command.
    pub feed: u16,
    /// Black/red/white media, printable only in two-color mode.
    pub two_color: bool,
    /// Models this label is limited to, on top of the geometric checks.
    pub restricted_to: Option<&'static [&'static str]>,
}

impl LabelProfile {
    pub fn width(&self) -> u32 {
        self.dots_printable.0
    }

    /// Printable length in dots, 0 for endless tape.
    pub fn length(&self) -> u32 {
        self.dots_printable.1
    }

    pub fn leading_margin(&self) -> u32 {
        (self.dots_total.1 - self.dots_printable.1) / 2
    }

    pub fn trailing_margin(&self) -> u32 {
        self.dots_total.1 - self.dots_printable.1 - self.leading_margin()
    }

    /// Die-cut and round labels come pre-cut on the liner.
    pub fn is_precut(&self) -> bool {
        self.kind != LabelKind::Endless
    }
}

const TWO_COLOR_MODELS: &[&str] = &["QL-800", "QL-810W", "QL-820NWB"];

const WIDE_MODELS: &[&str] = &[
    "QL-1050",
    "QL-1060N",
    "QL-1100",
    "QL-1110NWB",
    "QL-1115NWB",
];

const fn endless(id: &'static str, mm: u8, total: u32, printable: u32) -> LabelProfile {
    LabelProfile {
        id,
        kind: LabelKind::Endless,
        family: MediaFamily::Dk,
        tape_size: (mm, 0),
        dots_total: (total, 0),
        dots_printable: (printable, 0),
        feed: 35,
        two_color: false,
        restricted_to: None,
    }
}

const fn die_cut(
    id: &'static str,
    kind: LabelKind,
    mm: (u8, u8),
    total: (u32, u32),
    printable: (u32, u32),
) -> LabelProfile {
    LabelProfile {
        id,
        kind,
        family: MediaFamily::Dk,
        tape_size: mm,
        dots_total: total,
        dots_printable: printable,
        feed: 0,
        two_color: false,
        restricted_to: None,
    }
}

/// Database revision, bumped whenever an entry in [`LABELS`] or
/// [`crate::model::MODELS`] changes.
pub const DATABASE_VERSION: u32 = 1;

pub static LABELS: &[LabelProfile] = &[
    endless("12", 12, 142, 106),
    endless("29", 29, 342, 306),
    endless("38", 38, 449, 413),
    endless("50", 50, 590, 554),
    endless("54", 54, 636, 590),
    endless("62", 62, 732, 696),
    LabelProfile {
        two_color: true,
        restricted_to: Some(TWO_COLOR_MODELS),
        ..endless("62red", 62, 732, 696)
    },
    LabelProfile {
        restricted_to: Some(WIDE_MODELS),
        ..endless("102", 102, 1200, 1164)
    },
    LabelProfile {
        restricted_to: Some(WIDE_MODELS),
        ..endless("103", 104, 1224, 1200)
    },
    die_cut("17x54", LabelKind::DieCut, (17, 54), (201, 636), (165, 566)),
    die_cut("17x87", LabelKind::DieCut, (17, 87), (201, 1026), (165, 956)),
    die_cut("23x23", LabelKind::DieCut, (23, 23), (272, 272), (202, 202)),
    die_cut("29x42", LabelKind::DieCut, (29, 42), (342, 495), (306, 425)),
    die_cut("29x90", LabelKind::DieCut, (29, 90), (342, 1061), (306, 991)),
    die_cut("39x90", LabelKind::DieCut, (38, 90), (449, 1061), (413, 991)),
    die_cut("39x48", LabelKind::DieCut, (39, 48), (461, 565), (425, 495)),
    die_cut("52x29", LabelKind::DieCut, (52, 29), (614, 341), (578, 271)),
    die_cut("54x29", LabelKind::DieCut, (54, 29), (630, 341), (598, 271)),
    die_cut("60x86", LabelKind::DieCut, (60, 87), (708, 1024), (672, 954)),
    die_cut("62x29", LabelKind::DieCut, (62, 29), (732, 341), (696, 271)),
    die_cut("62x100", LabelKind::DieCut, (62, 100), (732, 1179), (696, 1109)),
    LabelProfile {
        restricted_to: Some(WIDE_MODELS),
        ..die_cut("102x51", LabelKind::DieCut, (102, 51), (1200, 596), (1164, 526))
    },
    LabelProfile {
        restricted_to: Some(WIDE_MODELS),
        ..die_cut("102x152", LabelKind::DieCut, (102, 153), (1200, 1804), (1164, 1660))
    },
    LabelProfile {
        feed: 35,
        ..die_cut("d12", LabelKind::Round, (12, 12), (142, 142), (94, 94))
    },
    die_cut("d24", LabelKind::Round, (24, 24), (284, 284), (236, 236)),
    die_cut("d58", LabelKind::Round, (58, 58), (688, 688), (618, 618)),
    LabelProfile {
        feed: 14,
        family: MediaFamily::Tze,
        ..endless("pt12", 12, 70, 70)
    },
    LabelProfile {
        feed: 14,
        family: MediaFamily::Tze,
        ..endless("pt18", 18, 112, 112)
    },
    LabelProfile {
        feed: 14,
        family: MediaFamily::Tze,
        ..endless("pt24", 24, 128, 128)
    },
];

/// Find a label by its identifier, e.g. `"62"` or `"29x90"`.
pub fn lookup_label(id: &str) -> Result<&'static LabelProfile, LookupError> {
    LABELS
        .iter()
        .find(|label| label.id == id)
        .ok_or_else(|| LookupError::UnknownLabel(id.to_string()))
}

/// Find the label matching the media a printer reports in its status.
///
/// `media_code` is the media type byte (0x0A/0x4A endless, 0x0B/0x4B
/// die-cut). Two-color media can not be told apart from plain media this
/// way, so the plain entry wins.
pub fn label_by_media(media_code: u8, width_mm: u8, length_mm: u8) -> Option<&'static LabelProfile> {
    LABELS
        .iter()
        .filter(|label| label.family == MediaFamily::Dk && !label.two_color)
        .find(|label| match media_code {
            0x0A | 0x4A => label.kind == LabelKind::Endless && label.tape_size.0 == width_mm,
            0x0B | 0x4B => label.is_precut() && label.tape_size == (width_mm, length_mm),
            _ => false,
        })
}

/// Find the P-touch tape a printer reports by its width.
pub fn label_by_tape(width_mm: u8) -> Option<&'static LabelProfile> {
    LABELS
        .iter()
        .find(|label| label.family == MediaFamily::Tze && label.tape_size.0 == width_mm)
}

/// Whether `label` can be printed on `model` at all.
///
/// Checks the media family and kind, that the model knows a raster offset
/// for the printable width and that label and offset fit the print head,
/// and any model restriction of the label. Two-color media needs a
/// two-color model. Every pair accepted here builds.
pub fn is_compatible(label: &LabelProfile, model: &ModelProfile) -> bool {
    label.family == model.media_family()
        && model.supports(label.kind)
        && model
            .offset_for(label.width())
            .map_or(false, |offset| label.width() + offset <= model.max_width())
        && label
            .restricted_to
            .map_or(true, |models| models.contains(&model.id))
        && (!label.two_color || model.two_color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lookup_model;

    #[test]
    fn lookup_known_and_unknown_labels() {
        let label = lookup_label("62").unwrap();
        assert_eq!(label.kind, LabelKind::Endless);
        assert_eq!(label.width(), 696);
        assert_eq!(label.length(), 0);
        assert_eq!(label.feed, 35);

        assert_eq!(
            lookup_label("63x63"),
            Err(LookupError::UnknownLabel("63x63".to_string()))
        );
    }

    #[test]
    fn identifiers_are_unique() {
        for (i, label) in LABELS.iter().enumerate() {
            assert!(
                LABELS[i + 1..].iter().all(|other| other.id != label.id),
                "duplicate label {}",
                label.id
            );
        }
    }

    #[test]
    fn die_cut_margins() {
        let label = lookup_label("29x90").unwrap();
        assert!(label.is_precut());
        assert_eq!(label.leading_margin(), 35);
        assert_eq!(label.trailing_margin(), 35);

        let endless = lookup_label("29").unwrap();
        assert!(!endless.is_precut());
        assert_eq!(endless.leading_margin(), 0);
    }

    #[test]
    fn compatibility() {
        let ql800 = lookup_model("QL-800").unwrap();
        let ql700 = lookup_model("QL-700").unwrap();
        let ql1100 = lookup_model("QL-1100").unwrap();
        let p700 = lookup_model("PT-P700").unwrap();

        assert!(is_compatible(lookup_label("62").unwrap(), ql800));
        assert!(is_compatible(lookup_label("62red").unwrap(), ql800));
        assert!(!is_compatible(lookup_label("62red").unwrap(), ql700));

        // too wide for a 720 dot head
        assert!(!is_compatible(lookup_label("102").unwrap(), ql800));
        assert!(is_compatible(lookup_label("102").unwrap(), ql1100));

        // P-touch tape only fits P-touch models and vice versa
        assert!(is_compatible(lookup_label("pt12").unwrap(), p700));
        assert!(!is_compatible(lookup_label("pt12").unwrap(), ql800));
        assert!(!is_compatible(lookup_label("d12").unwrap(), p700));

        // DK tape as narrow as a P-touch head is still the wrong media
        assert!(!is_compatible(lookup_label("12").unwrap(), p700));
    }

    #[test]
    fn models_without_offsets_accept_nothing() {
        let p900 = lookup_model("PT-P900W").unwrap();
        assert!(LABELS.iter().all(|label| !is_compatible(label, p900)));
    }

    #[test]
    fn tape_from_status_width() {
        assert_eq!(label_by_tape(24).map(|l| l.id), Some("pt24"));
        assert_eq!(label_by_tape(62), None);
    }

    #[test]
    fn media_from_status_fields() {
        assert_eq!(label_by_media(0x0A, 62, 0).map(|l| l.id), Some("62"));
        assert_eq!(label_by_media(0x4B, 29, 90).map(|l| l.id), Some("29x90"));
        assert_eq!(label_by_media(0x0B, 24, 24).map(|l| l.id), Some("d24"));
        assert_eq!(label_by_media(0x0B, 61, 61), None);
        assert_eq!(label_by_media(0x00, 62, 0), None);
    }
}
