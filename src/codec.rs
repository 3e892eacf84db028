//! Line codec for raster rows.
//!
//! With compression enabled rows are sent as TIFF PackBits: a header byte
//! `n` in `0..=127` is followed by `n + 1` literal bytes, a header in
//! `-127..=-1` (as `i8`) is followed by one byte repeated `1 - n` times.
//! `0x80` is a no-op. The encoder also computes the plain literal form and
//! sends whichever is shorter; both decode the same way. Without
//! compression the row bytes go out unchanged.

use crate::error::CodecError;

/// Longest run (repeated or literal) one header byte can describe.
pub const MAX_RUN: usize = 128;

/// Encode one packed row.
pub fn encode_row(row: &[u8], compressed: bool) -> Result<Vec<u8>, CodecError> {
    if row.is_empty() {
        return Err(CodecError::EmptyRow);
    }
    if !compressed {
        return Ok(row.to_vec());
    }

    let packed = pack_bits(row);
    if packed.len() <= literal_len(row.len()) {
        Ok(packed)
    } else {
        Ok(literal(row))
    }
}

/// Decode one row and check it is `expected_width` bytes long.
pub fn decode_row(data: &[u8], expected_width: usize, compressed: bool) -> Result<Vec<u8>, CodecError> {
    let row = if compressed {
        unpack(data)?
    } else {
        data.to_vec()
    };

    if row.len() != expected_width {
        return Err(CodecError::WidthMismatch {
            expected: expected_width,
            actual: row.len(),
        });
    }
    Ok(row)
}

/// Decode a PackBits stream of any length.
pub fn unpack(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut row = Vec::with_capacity(data.len() * 2);
    let mut i = 0;

    while i < data.len() {
        let header = data[i] as i8;
        match header {
            -128 => i += 1,
            0..=127 => {
                let count = header as usize + 1;
                let end = i + 1 + count;
                if end > data.len() {
                    return Err(CodecError::MalformedRun { offset: i });
                }
                row.extend_from_slice(&data[i + 1..end]);
                i = end;
            }
            _ => {
                let count = (1 - header as isize) as usize;
                let value = *data
                    .get(i + 1)
                    .ok_or(CodecError::MalformedRun { offset: i })?;
                row.extend(std::iter::repeat(value).take(count));
                i += 2;
            }
        }
    }

    Ok(row)
}

fn literal_len(len: usize) -> usize {
    len + (len + MAX_RUN - 1) / MAX_RUN
}

/// The raw fallback: the row as literal chunks.
fn literal(row: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(literal_len(row.len()));
    for chunk in row.chunks(MAX_RUN) {
        out.push((chunk.len() - 1) as u8);
        out.extend_from_slice(chunk);
    }
    out
}

fn pack_bits(data: &[u8]) -> Vec<u8> {
    let mut packed = Vec::new();
    let mut pending: Vec<u8> = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let value = data[i];
        let mut run_length = 1;
        while i + run_length < data.len() && run_length < MAX_RUN && data[i + run_length] == value {
            run_length += 1;
        }

        // A pair only pays off when it does not split a literal run.
        if run_length >= 3 || (run_length == 2 && pending.is_empty()) {
            flush_literal(&mut packed, &mut pending);
            packed.push((1 - run_length as i16) as u8);
            packed.push(value);
            i += run_length;
        } else {
            pending.push(value);
            if pending.len() == MAX_RUN {
                flush_literal(&mut packed, &mut pending);
            }
            i += 1;
        }
    }
    flush_literal(&mut packed, &mut pending);

    packed
}

fn flush_literal(packed: &mut Vec<u8>, pending: &mut Vec<u8>) {
    if pending.is_empty() {
        return;
    }
    packed.push((pending.len() - 1) as u8);
    packed.append(pending);
}
