//! Google encoded polyline format, precision 1e5.
//!
//! Each coordinate is stored as a delta from the previous point, zigzag
//! encoded, split into little-endian 5-bit chunks and written as printable
//! ASCII (`chunk + 63`, with `0x20` marking that another chunk follows).
//! The decoder scans bytes directly and reports malformed input instead of
//! reading past the end of the string.

use crate::error::{CoreError, DecodeError};
use crate::geo::GeoPoint;

const PRECISION: f64 = 1e5;
const ASCII_OFFSET: u8 = 63;
const CONTINUATION: u64 = 0x20;
const CHUNK_MASK: u64 = 0x1f;
/// Last shift at which a chunk may start while the value still fits in 32
/// bits (7 chunks x 5 bits).
const MAX_SHIFT: u32 = 30;

/// Decodes an encoded polyline into points in route order.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when the input stops inside a value or
/// after a latitude with no longitude, [`DecodeError::InvalidByte`] for bytes
/// outside `?..=~`, and [`DecodeError::Overflow`] for values wider than 32
/// bits.
pub fn decode(encoded: &str) -> Result<Vec<GeoPoint>, DecodeError> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::with_capacity(bytes.len() / 4);
    let mut index = 0usize;
    let mut lat = 0i64;
    let mut lng = 0i64;

    while index < bytes.len() {
        lat += next_delta(bytes, &mut index)?;
        if index >= bytes.len() {
            return Err(DecodeError::Truncated { offset: index });
        }
        lng += next_delta(bytes, &mut index)?;
        points.push(GeoPoint::new(to_degrees(lat), to_degrees(lng)));
    }

    Ok(points)
}

/// Encodes points into a polyline string, rounding each coordinate to 1e-5.
///
/// # Errors
///
/// Returns [`CoreError::InvalidInput`] when a coordinate is not finite or
/// lies outside `-90..=90` latitude or `-180..=180` longitude.
pub fn encode(points: &[GeoPoint]) -> Result<String, CoreError> {
    let mut out = String::with_capacity(points.len() * 10);
    let mut prev_lat = 0i64;
    let mut prev_lng = 0i64;

    for point in points {
        let lat = to_units("latitude", point.latitude, 90.0)?;
        let lng = to_units("longitude", point.longitude, 180.0)?;
        push_delta(&mut out, lat - prev_lat);
        push_delta(&mut out, lng - prev_lng);
        prev_lat = lat;
        prev_lng = lng;
    }

    Ok(out)
}

/// Reads one zigzag-encoded value starting at `*index` and advances past it.
fn next_delta(bytes: &[u8], index: &mut usize) -> Result<i64, DecodeError> {
    let start = *index;
    let mut result = 0u64;
    let mut shift = 0u32;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(DecodeError::Truncated { offset: *index });
        };
        if !(ASCII_OFFSET..=b'~').contains(&byte) {
            return Err(DecodeError::InvalidByte {
                offset: *index,
                byte,
            });
        }
        if shift > MAX_SHIFT {
            return Err(DecodeError::Overflow { offset: start });
        }

        let chunk = u64::from(byte - ASCII_OFFSET);
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;
        *index += 1;

        if chunk & CONTINUATION == 0 {
            break;
        }
    }

    if result > u64::from(u32::MAX) {
        return Err(DecodeError::Overflow { offset: start });
    }

    // Fits in 32 bits, so the shifted value always fits in i64.
    #[allow(clippy::cast_possible_wrap)]
    let magnitude = (result >> 1) as i64;
    Ok(if result & 1 == 1 {
        !magnitude
    } else {
        magnitude
    })
}

fn push_delta(out: &mut String, delta: i64) {
    #[allow(clippy::cast_sign_loss)]
    let mut value = ((delta << 1) ^ (delta >> 63)) as u64;

    while value >= CONTINUATION {
        out.push(chunk_char((value & CHUNK_MASK) | CONTINUATION));
        value >>= 5;
    }
    out.push(chunk_char(value));
}

fn chunk_char(chunk: u64) -> char {
    // Chunks are at most 0x3f, so the byte stays within `?..=~`.
    #[allow(clippy::cast_possible_truncation)]
    let byte = chunk as u8 + ASCII_OFFSET;
    char::from(byte)
}

#[allow(clippy::cast_precision_loss)]
fn to_degrees(units: i64) -> f64 {
    units as f64 / PRECISION
}

/// Coordinates within `limit` stay far inside the 32-bit range `decode`
/// accepts, deltas included.
#[allow(clippy::cast_possible_truncation)]
fn to_units(field: &str, degrees: f64, limit: f64) -> Result<i64, CoreError> {
    if !degrees.is_finite() {
        return Err(CoreError::invalid(field, "must be a finite number"));
    }
    if degrees.abs() > limit {
        return Err(CoreError::invalid(
            field,
            format!("must be between -{limit} and {limit}"),
        ));
    }
    Ok((degrees * PRECISION).round() as i64)
}

#[cfg(test)]
#[path = "polyline_test.rs"]
mod tests;
