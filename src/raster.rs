//! Raster job builder.
//!
//! [`build`] turns a [`LabelImage`] into the instruction stream for one
//! model and label. The stream always follows the same order:
//!
//! 1. invalidate
//! 2. initialize
//! 3. switch to raster mode (models with mode setting)
//! 4. status notification
//! 5. media & quality
//! 6. various mode and cut every (models with a cutter), expanded mode
//!    (models supporting it)
//! 7. margins
//! 8. compression (when enabled and supported)
//! 9. one raster line per row
//! 10. print
//!
//! Further copies repeat only steps 9 and 10; the printer keeps the setup.

use log::{debug, warn};

use crate::{
    bitmap::{place_row, row_bytes, Bitmap, LabelImage},
    codec::encode_row,
    error::BuildError,
    instruction::{ExpandedMode, Instruction, MediaQuality, Plane, PrintMode},
    labels::{is_compatible, LabelProfile},
    model::{ModelProfile, RasterDialect},
};

/// Options of one print job.
///
/// # Example
///
/// ```
/// use ql_raster::PrintOptions;
///
/// let options = PrintOptions::new("62", "QL-820NWB")
///     .cut_at_end(true)
///     .copies(2)
///     .compress(true);
/// assert_eq!(options.copies, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOptions {
    pub label: String,
    pub model: String,
    pub cut_at_end: bool,
    pub cut_every: u8,
    pub high_quality: bool,
    pub high_resolution: bool,
    pub two_color: bool,
    pub compress: bool,
    pub copies: u32,
    pub no_feed_after_last: bool,
    /// Ask the printer to report progress on its own.
    pub notify: bool,
    /// Feed amount override in dots; the label default otherwise.
    pub feed: Option<u16>,
}

impl PrintOptions {
    /// Options with default values: one copy, cut at the end, high
    /// quality, no compression.
    pub fn new(label: impl Into<String>, model: impl Into<String>) -> Self {
        PrintOptions {
            label: label.into(),
            model: model.into(),
            cut_at_end: true,
            cut_every: 1,
            high_quality: true,
            high_resolution: false,
            two_color: false,
            compress: false,
            copies: 1,
            no_feed_after_last: false,
            notify: true,
            feed: None,
        }
    }

    pub fn cut_at_end(self, flag: bool) -> Self {
        PrintOptions {
            cut_at_end: flag,
            ..self
        }
    }

    /// Cut after every `n` labels.
    pub fn cut_every(self, n: u8) -> Self {
        PrintOptions {
            cut_every: n,
            ..self
        }
    }

    pub fn high_quality(self, flag: bool) -> Self {
        PrintOptions {
            high_quality: flag,
            ..self
        }
    }

    pub fn high_resolution(self, flag: bool) -> Self {
        PrintOptions {
            high_resolution: flag,
            ..self
        }
    }

    pub fn two_color(self, two_color: bool) -> Self {
        PrintOptions { two_color, ..self }
    }

    pub fn compress(self, flag: bool) -> Self {
        PrintOptions {
            compress: flag,
            ..self
        }
    }

    pub fn copies(self, copies: u32) -> Self {
        PrintOptions { copies, ..self }
    }

    pub fn no_feed_after_last(self, flag: bool) -> Self {
        PrintOptions {
            no_feed_after_last: flag,
            ..self
        }
    }

    pub fn notify(self, flag: bool) -> Self {
        PrintOptions {
            notify: flag,
            ..self
        }
    }

    pub fn set_feed_in_dots(self, feed: u16) -> Self {
        PrintOptions {
            feed: Some(feed),
            ..self
        }
    }
}

/// The instruction stream of one job.
///
/// The transport must send [`RasterJob::to_bytes`] as one unit on a
/// connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RasterJob {
    instructions: Vec<Instruction>,
}

impl RasterJob {
    fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for instruction in &self.instructions {
            instruction.encode(&mut buf);
        }
        buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.to_bytes()
    }

    /// Number of pages the printer will report as completed, one per
    /// print command.
    pub fn pages(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| matches!(i, Instruction::Print(_)))
            .count()
    }
}

/// Everything resolved before the first byte is emitted.
struct Plan<'a> {
    offset: u32,
    line_bytes: usize,
    compress: bool,
    feed: u16,
    two_color: bool,
    red: Option<&'a Bitmap>,
}

/// Build the instruction stream printing `image` on `label` with `model`.
///
/// `options.label` and `options.model` must name the profiles passed in.
pub fn build(
    image: &LabelImage,
    options: &PrintOptions,
    model: &ModelProfile,
    label: &LabelProfile,
) -> Result<RasterJob, BuildError> {
    let plan = preflight(image, options, model, label)?;
    let rows = image.black.height();

    let mut job = RasterJob::default();
    job.push(Instruction::Invalidate(model.invalidate_bytes));
    job.push(Instruction::Initialize);
    if model.mode_setting {
        job.push(Instruction::SwitchToRaster);
    }
    job.push(Instruction::StatusNotification(options.notify));

    let media = MediaQuality::new(label.kind, label.tape_size, options.high_quality, rows as u32);
    debug!("Media & quality: {:?}", media);
    job.push(Instruction::MediaQuality(media));

    if model.cutting {
        debug!("Auto cut: {}, every {} labels", options.cut_at_end, options.cut_every);
        job.push(Instruction::VariousMode {
            auto_cut: options.cut_at_end,
        });
        job.push(Instruction::CutEvery(options.cut_every));
    }
    if model.expanded_mode {
        let mode = ExpandedMode {
            two_color: options.two_color,
            cut_at_end: options.cut_at_end,
            high_resolution: options.high_resolution,
        };
        debug!("Expanded mode: {:X}", mode.to_byte());
        job.push(Instruction::ExpandedMode(mode));
    }

    job.push(Instruction::Margins(plan.feed));
    if plan.compress {
        job.push(Instruction::Compression(true));
    }

    let lines = raster_lines(image, &plan, model, label)?;
    for copy in 0..options.copies {
        job.instructions.extend(lines.iter().cloned());

        let last = copy + 1 == options.copies;
        if last && !options.no_feed_after_last {
            job.push(Instruction::Print(PrintMode::Eject));
        } else {
            job.push(Instruction::Print(PrintMode::Feed));
        }
    }

    debug!(
        "Built {} instructions for {} on {}",
        job.instructions.len(),
        label.id,
        model.id
    );
    Ok(job)
}

fn preflight<'a>(
    image: &'a LabelImage,
    options: &PrintOptions,
    model: &ModelProfile,
    label: &LabelProfile,
) -> Result<Plan<'a>, BuildError> {
    if options.label != label.id || options.model != model.id {
        return Err(BuildError::InvalidOption(format!(
            "options are for {} on {}, profiles are {} on {}",
            options.label, options.model, label.id, model.id
        )));
    }
    if !is_compatible(label, model) {
        return Err(BuildError::IncompatibleLabelModel {
            label: label.id,
            model: model.id,
        });
    }

    let width = label.width();
    let offset = model
        .offset_for(width)
        .filter(|offset| width + offset <= model.max_width())
        .ok_or(BuildError::UnsupportedWidth {
            model: model.id,
            width,
        })?;

    let line_bytes = model.bytes_per_row as usize;
    // worst case of the literal fallback has to fit the length field
    let max_line = match model.raster_dialect {
        RasterDialect::Ql => u8::MAX as usize,
        RasterDialect::PTouch => u16::MAX as usize,
    };
    if line_bytes + (line_bytes + 127) / 128 > max_line {
        return Err(BuildError::UnsupportedWidth {
            model: model.id,
            width,
        });
    }

    if options.copies == 0 {
        return Err(BuildError::InvalidOption("copies must be at least 1".to_string()));
    }
    if options.cut_every == 0 {
        return Err(BuildError::InvalidOption("cut_every must be at least 1".to_string()));
    }

    let unsupported = |feature| BuildError::UnsupportedFeature {
        model: model.id,
        feature,
    };
    if options.cut_at_end && !model.cutting {
        return Err(unsupported("cutting"));
    }
    if options.two_color {
        if !model.two_color {
            return Err(unsupported("two-color printing"));
        }
        if !label.two_color {
            return Err(BuildError::InvalidOption(format!(
                "two-color printing needs two-color media, {} is not",
                label.id
            )));
        }
    } else if image.red.is_some() {
        return Err(BuildError::InvalidOption(
            "red plane given without two-color mode".to_string(),
        ));
    }
    if (options.two_color || options.high_resolution || options.cut_at_end) && !model.expanded_mode {
        return Err(unsupported("expanded mode"));
    }

    let feed = match options.feed {
        Some(feed) => {
            let (min, max) = model.feed_range;
            if feed < min || feed > max {
                return Err(BuildError::InvalidOption(format!(
                    "feed of {} dots outside {}..={}",
                    feed, min, max
                )));
            }
            feed
        }
        None => label.feed,
    };

    let compress = options.compress && model.compression;
    if options.compress && !model.compression {
        warn!("{} does not support compression, sending raw lines", model.id);
    }

    check_plane(&image.black, label)?;
    if let Some(red) = &image.red {
        check_plane(red, label)?;
        if red.height() != image.black.height() {
            return Err(BuildError::PlaneMismatch {
                black: image.black.height(),
                red: red.height(),
            });
        }
    }

    let rows = image.black.height();
    let (min, max) = if label.is_precut() {
        (label.length() as usize, label.length() as usize)
    } else {
        (1, model.length_range.1 as usize)
    };
    if rows < min || rows > max {
        return Err(BuildError::LengthMismatch {
            min,
            max,
            actual: rows,
        });
    }

    Ok(Plan {
        offset,
        line_bytes,
        compress,
        feed,
        two_color: options.two_color,
        red: image.red.as_ref(),
    })
}

fn check_plane(plane: &Bitmap, label: &LabelProfile) -> Result<(), BuildError> {
    if plane.height() == 0 {
        return Err(BuildError::EmptyBitmap);
    }
    let expected = label.width();
    if plane.width() != expected {
        return Err(BuildError::RowWidthMismatch {
            row: 0,
            expected,
            actual: plane.width(),
        });
    }
    let bytes = row_bytes(expected);
    if let Some((row, data)) = plane
        .rows()
        .iter()
        .enumerate()
        .find(|(_, data)| data.len() != bytes)
    {
        return Err(BuildError::RowWidthMismatch {
            row,
            expected,
            actual: data.len() as u32 * 8,
        });
    }
    Ok(())
}

fn raster_lines(
    image: &LabelImage,
    plan: &Plan<'_>,
    model: &ModelProfile,
    label: &LabelProfile,
) -> Result<Vec<Instruction>, BuildError> {
    let width = label.width();
    let line = |row: Option<&Vec<u8>>| -> Result<Vec<u8>, BuildError> {
        let placed = match row {
            Some(row) => place_row(row, width, plan.offset, plan.line_bytes),
            None => vec![0x00; plan.line_bytes],
        };
        Ok(encode_row(&placed, plan.compress)?)
    };

    let mut lines = Vec::with_capacity(image.black.height());
    for (y, row) in image.black.rows().iter().enumerate() {
        match model.raster_dialect {
            RasterDialect::Ql if plan.two_color => {
                lines.push(Instruction::TwoColorRaster {
                    plane: Plane::Black,
                    data: line(Some(row))?,
                });
                lines.push(Instruction::TwoColorRaster {
                    plane: Plane::Red,
                    data: line(plan.red.map(|red| &red.rows()[y]))?,
                });
            }
            RasterDialect::Ql => lines.push(Instruction::Raster(line(Some(row))?)),
            RasterDialect::PTouch => lines.push(Instruction::PTouchRaster(line(Some(row))?)),
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        labels::{lookup_label, LABELS},
        model::{lookup_model, MODELS},
    };
    use pretty_assertions::assert_eq;

    fn names(job: &RasterJob) -> Vec<&'static str> {
        job.instructions().iter().map(|i| i.name()).collect()
    }

    fn blank(label: &LabelProfile, rows: usize) -> LabelImage {
        LabelImage::mono(Bitmap::blank(label.width(), rows))
    }

    #[test]
    fn setup_order_on_a_cutter_model() {
        let model = lookup_model("QL-720NW").unwrap();
        let label = lookup_label("29").unwrap();
        let options = PrintOptions::new("29", "QL-720NW").compress(true);
        let job = build(&blank(label, 2), &options, model, label).unwrap();

        assert_eq!(
            names(&job),
            vec![
                "invalidate",
                "initialize",
                "switch to raster",
                "status notification",
                "media & quality",
                "various mode",
                "cut every",
                "expanded mode",
                "margins",
                "compression",
                "raster",
                "raster",
                "print",
            ]
        );
        assert_eq!(job.instructions()[0], Instruction::Invalidate(200));
        assert_eq!(job.instructions()[8], Instruction::Margins(35));
        // a blank 90 byte line compresses to a single run
        assert_eq!(job.instructions()[10], Instruction::Raster(vec![0xA7, 0x00]));
        assert_eq!(job.instructions()[12], Instruction::Print(PrintMode::Eject));
    }

    #[test]
    fn legacy_model_gets_the_minimal_stream() {
        let model = lookup_model("QL-500").unwrap();
        let label = lookup_label("62").unwrap();
        let options = PrintOptions::new("62", "QL-500").cut_at_end(false).compress(true);
        let job = build(&blank(label, 1), &options, model, label).unwrap();

        assert_eq!(
            names(&job),
            vec![
                "invalidate",
                "initialize",
                "status notification",
                "media & quality",
                "margins",
                "raster",
                "print",
            ]
        );
        // no compression on the QL-500, the raw 90 byte line is sent
        assert_eq!(job.instructions()[5], Instruction::Raster(vec![0x00; 90]));
    }

    #[test]
    fn pixels_land_mirrored_in_the_line() {
        let model = lookup_model("QL-800").unwrap();
        let label = lookup_label("62").unwrap();
        let mut pixels = vec![false; 696];
        pixels[695] = true;
        let image = LabelImage::mono(Bitmap::from_pixels(696, &pixels));
        let job = build(&image, &PrintOptions::new("62", "QL-800"), model, label).unwrap();

        let raster = job
            .instructions()
            .iter()
            .find_map(|i| match i {
                Instruction::Raster(data) => Some(data.clone()),
                _ => None,
            })
            .unwrap();
        // rightmost label pixel right after the 12 dot offset
        let mut expected = vec![0x00; 90];
        expected[1] = 0b0000_1000;
        assert_eq!(raster, expected);
    }

    #[test]
    fn two_color_lines_alternate() {
        let model = lookup_model("QL-820NWB").unwrap();
        let label = lookup_label("62red").unwrap();
        let image = LabelImage::two_color(Bitmap::blank(696, 2), Bitmap::blank(696, 2)).unwrap();
        let options = PrintOptions::new("62red", "QL-820NWB").two_color(true);
        let job = build(&image, &options, model, label).unwrap();

        let planes: Vec<Plane> = job
            .instructions()
            .iter()
            .filter_map(|i| match i {
                Instruction::TwoColorRaster { plane, .. } => Some(*plane),
                _ => None,
            })
            .collect();
        assert_eq!(planes, vec![Plane::Black, Plane::Red, Plane::Black, Plane::Red]);
        assert!(job.instructions().contains(&Instruction::ExpandedMode(ExpandedMode {
            two_color: true,
            cut_at_end: true,
            high_resolution: false,
        })));
    }

    #[test]
    fn two_color_needs_capable_model_and_media() {
        let label = lookup_label("62").unwrap();
        let image = blank(label, 1);
        let options = PrintOptions::new("62", "QL-720NW").two_color(true);
        assert_eq!(
            build(&image, &options, lookup_model("QL-720NW").unwrap(), label),
            Err(BuildError::UnsupportedFeature {
                model: "QL-720NW",
                feature: "two-color printing"
            })
        );
        let options = PrintOptions::new("62", "QL-800").two_color(true);
        assert!(matches!(
            build(&image, &options, lookup_model("QL-800").unwrap(), label),
            Err(BuildError::InvalidOption(_))
        ));
    }

    #[test]
    fn ptouch_rows_use_two_byte_lengths() {
        let model = lookup_model("PT-P700").unwrap();
        let label = lookup_label("pt24").unwrap();
        let job = build(
            &blank(label, 3),
            &PrintOptions::new("pt24", "PT-P700"),
            model,
            label,
        )
        .unwrap();
        let rasters = job
            .instructions()
            .iter()
            .filter(|i| matches!(i, Instruction::PTouchRaster(data) if data.len() == 16))
            .count();
        assert_eq!(rasters, 3);
        assert!(job.instructions().contains(&Instruction::Margins(14)));
    }

    #[test]
    fn model_without_offsets_is_incompatible() {
        let model = lookup_model("PT-P900W").unwrap();
        let label = lookup_label("pt24").unwrap();
        assert_eq!(
            build(&blank(label, 1), &PrintOptions::new("pt24", "PT-P900W"), model, label),
            Err(BuildError::IncompatibleLabelModel {
                label: "pt24",
                model: "PT-P900W"
            })
        );
    }

    #[test]
    fn every_compatible_pair_builds() {
        let mut built = 0;
        for model in MODELS {
            for label in LABELS.iter().filter(|label| is_compatible(label, model)) {
                let rows = if label.is_precut() {
                    label.length() as usize
                } else {
                    1
                };
                let options = PrintOptions::new(label.id, model.id)
                    .cut_at_end(model.cutting && model.expanded_mode)
                    .two_color(label.two_color);
                if let Err(err) = build(&blank(label, rows), &options, model, label) {
                    panic!("{} on {} failed: {}", label.id, model.id, err);
                }
                built += 1;
            }
        }
        assert!(built > 0);
    }

    #[test]
    fn high_resolution_needs_expanded_mode() {
        let model = lookup_model("QL-500").unwrap();
        let label = lookup_label("62").unwrap();
        let options = PrintOptions::new("62", "QL-500")
            .cut_at_end(false)
            .high_resolution(true);
        assert_eq!(
            build(&blank(label, 1), &options, model, label),
            Err(BuildError::UnsupportedFeature {
                model: "QL-500",
                feature: "expanded mode"
            })
        );
    }

    #[test]
    fn options_must_name_the_profiles() {
        let model = lookup_model("QL-800").unwrap();
        let label = lookup_label("62").unwrap();
        let image = blank(label, 1);
        assert!(matches!(
            build(&image, &PrintOptions::new("29", "QL-800"), model, label),
            Err(BuildError::InvalidOption(_))
        ));
        assert!(matches!(
            build(&image, &PrintOptions::new("62", "QL-820NWB"), model, label),
            Err(BuildError::InvalidOption(_))
        ));
    }

    #[test]
    fn pages_count_print_commands() {
        let model = lookup_model("QL-800").unwrap();
        let label = lookup_label("62").unwrap();
        let options = PrintOptions::new("62", "QL-800").copies(3);
        let job = build(&blank(label, 2), &options, model, label).unwrap();
        assert_eq!(job.pages(), 3);
    }

    #[test]
    fn validation_errors() {
        let model = lookup_model("QL-800").unwrap();
        let label = lookup_label("62").unwrap();
        let options = PrintOptions::new("62", "QL-800");

        assert_eq!(
            build(&blank(label, 0), &options, model, label),
            Err(BuildError::EmptyBitmap)
        );
        assert_eq!(
            build(
                &LabelImage::mono(Bitmap::blank(720, 1)),
                &options,
                model,
                label
            ),
            Err(BuildError::RowWidthMismatch {
                row: 0,
                expected: 696,
                actual: 720
            })
        );

        let mut bitmap = Bitmap::blank(696, 2);
        bitmap.push_row(vec![0x00; 80]);
        assert_eq!(
            build(&LabelImage::mono(bitmap), &options, model, label),
            Err(BuildError::RowWidthMismatch {
                row: 2,
                expected: 696,
                actual: 640
            })
        );

        assert!(matches!(
            build(&blank(label, 1), &options.clone().copies(0), model, label),
            Err(BuildError::InvalidOption(_))
        ));
        assert!(matches!(
            build(&blank(label, 1), &options.clone().cut_every(0), model, label),
            Err(BuildError::InvalidOption(_))
        ));
        assert!(matches!(
            build(&blank(label, 1), &options.clone().set_feed_in_dots(10), model, label),
            Err(BuildError::InvalidOption(_))
        ));
    }

    #[test]
    fn die_cut_needs_the_full_label() {
        let model = lookup_model("QL-720NW").unwrap();
        let label = lookup_label("29x90").unwrap();
        let options = PrintOptions::new("29x90", "QL-720NW");

        assert_eq!(
            build(&blank(label, 500), &options, model, label),
            Err(BuildError::LengthMismatch {
                min: 991,
                max: 991,
                actual: 500
            })
        );
        let job = build(&blank(label, 991), &options, model, label).unwrap();
        assert!(job.instructions().contains(&Instruction::Margins(0)));
        assert!(job.instructions().contains(&Instruction::MediaQuality(MediaQuality {
            media_type: 0x0B,
            width_mm: 29,
            length_mm: 90,
            high_quality: true,
            raster_lines: 991,
            continued: false,
        })));
    }

    #[test]
    fn incompatible_pair_is_rejected_first() {
        let model = lookup_model("QL-800").unwrap();
        let label = lookup_label("102").unwrap();
        assert_eq!(
            build(&blank(label, 1), &PrintOptions::new("102", "QL-800"), model, label),
            Err(BuildError::IncompatibleLabelModel {
                label: "102",
                model: "QL-800"
            })
        );
    }

    #[test]
    fn no_feed_after_last_keeps_feeding() {
        let model = lookup_model("QL-800").unwrap();
        let label = lookup_label("62").unwrap();
        let options = PrintOptions::new("62", "QL-800").copies(2).no_feed_after_last(true);
        let job = build(&blank(label, 1), &options, model, label).unwrap();
        let prints: Vec<&Instruction> = job
            .instructions()
            .iter()
            .filter(|i| matches!(i, Instruction::Print(_)))
            .collect();
        assert_eq!(
            prints,
            vec![
                &Instruction::Print(PrintMode::Feed),
                &Instruction::Print(PrintMode::Feed)
            ]
        );
    }
}
