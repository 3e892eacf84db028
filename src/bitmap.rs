//! Packed 1-bit rows handed to the raster builder.
//!
//! Pixels are packed MSB first, eight per byte, with `1` meaning a printed
//! dot. Image loading and dithering happen before this point.

use crate::error::BuildError;

/// One color plane: `width` pixels per row, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    rows: Vec<Vec<u8>>,
}

impl Bitmap {
    pub fn new(width: u32) -> Self {
        Bitmap {
            width,
            rows: Vec::new(),
        }
    }

    /// A bitmap of `height` blank rows.
    pub fn blank(width: u32, height: usize) -> Self {
        Bitmap {
            width,
            rows: vec![vec![0x00; row_bytes(width)]; height],
        }
    }

    /// Wrap already packed rows. Row lengths are checked by the builder.
    pub fn from_rows(width: u32, rows: Vec<Vec<u8>>) -> Self {
        Bitmap { width, rows }
    }

    /// Pack a row-major pixel buffer, `true` meaning a printed dot.
    pub fn from_pixels(width: u32, pixels: &[bool]) -> Self {
        let mut bitmap = Bitmap::new(width);
        if width == 0 {
            return bitmap;
        }
        for line in pixels.chunks(width as usize) {
            let mut row = vec![0x00; row_bytes(width)];
            for (x, _) in line.iter().enumerate().filter(|(_, dot)| **dot) {
                row[x / 8] |= 0x80 >> (x % 8);
            }
            bitmap.rows.push(row);
        }
        bitmap
    }

    pub fn push_row(&mut self, row: Vec<u8>) {
        self.rows.push(row);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub fn get(&self, x: u32, y: usize) -> bool {
        self.rows
            .get(y)
            .and_then(|row| row.get(x as usize / 8))
            .map_or(false, |byte| byte & (0x80 >> (x % 8)) != 0)
    }
}

/// What gets printed: a black plane and, in two-color mode, a red plane of
/// the same size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelImage {
    pub black: Bitmap,
    pub red: Option<Bitmap>,
}

impl LabelImage {
    pub fn mono(black: Bitmap) -> Self {
        LabelImage { black, red: None }
    }

    pub fn two_color(black: Bitmap, red: Bitmap) -> Result<Self, BuildError> {
        if black.height() != red.height() {
            return Err(BuildError::PlaneMismatch {
                black: black.height(),
                red: red.height(),
            });
        }
        if black.width() != red.width() {
            return Err(BuildError::RowWidthMismatch {
                row: 0,
                expected: black.width(),
                actual: red.width(),
            });
        }
        Ok(LabelImage {
            black,
            red: Some(red),
        })
    }
}

pub(crate) fn row_bytes(width: u32) -> usize {
    (width as usize + 7) / 8
}

/// Place a `width` pixel row into a print head line of `line_bytes`.
///
/// The head prints the line mirrored, so the label's rightmost pixel lands
/// in the first bit sent, after `offset` blank dots.
pub(crate) fn place_row(row: &[u8], width: u32, offset: u32, line_bytes: usize) -> Vec<u8> {
    let mut line = vec![0x00; line_bytes];
    for x in 0..width {
        if row[x as usize / 8] & (0x80 >> (x % 8)) == 0 {
            continue;
        }
        let pos = (offset + width - 1 - x) as usize;
        line[pos / 8] |= 0x80 >> (pos % 8);
    }
    line
}
