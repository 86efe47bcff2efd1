//! Well-known-binary encoding for flowline geometry.
//!
//! Only the 2-D `LineString` shape is needed: one geometry per table row.
//! Encoding is always little-endian; decoding rejects big-endian payloads
//! and non-linestring geometry types rather than guessing.

use crate::geom::{Point, Polyline};
use anyhow::{Context, Result, bail};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

const LITTLE_ENDIAN: u8 = 1;
const LINESTRING: u32 = 2;

/// Encode a polyline as a WKB `LineString`.
pub fn encode_linestring(line: &Polyline) -> Vec<u8> {
    let points = line.points();
    let mut buf = Vec::with_capacity(1 + 4 + 4 + points.len() * 16);
    buf.push(LITTLE_ENDIAN);
    buf.extend_from_slice(&LINESTRING.to_le_bytes());
    buf.extend_from_slice(&(points.len() as u32).to_le_bytes());
    for p in points {
        buf.extend_from_slice(&p.x.to_le_bytes());
        buf.extend_from_slice(&p.y.to_le_bytes());
    }
    buf
}

/// Decode a WKB `LineString` back into a polyline.
///
/// # Errors
/// Returns an error for truncated payloads, big-endian byte order, a
/// geometry type other than `LineString`, or fewer than two vertices.
pub fn decode_linestring(bytes: &[u8]) -> Result<Polyline> {
    let mut cursor = Cursor::new(bytes);
    let byte_order = cursor.read_u8().context("read WKB byte order")?;
    if byte_order != LITTLE_ENDIAN {
        bail!("unsupported WKB byte order {byte_order} (only little-endian)");
    }
    let geometry_type = cursor
        .read_u32::<LittleEndian>()
        .context("read WKB geometry type")?;
    if geometry_type != LINESTRING {
        bail!("unexpected WKB geometry type {geometry_type} (want LineString)");
    }
    let n = cursor.read_u32::<LittleEndian>().context("read vertex count")?;
    let mut points = Vec::with_capacity(n as usize);
    for i in 0..n {
        let x = cursor
            .read_f64::<LittleEndian>()
            .with_context(|| format!("read vertex #{i} x"))?;
        let y = cursor
            .read_f64::<LittleEndian>()
            .with_context(|| format!("read vertex #{i} y"))?;
        points.push(Point::new(x, y));
    }
    Polyline::new(points).context("WKB linestring has fewer than two vertices")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_bit_identical() {
        let line = Polyline::from_coords(&[(0.5, -1.25), (1e6, 2e6), (3.0, 4.0)]).unwrap();
        let encoded = encode_linestring(&line);
        let decoded = decode_linestring(&encoded).unwrap();
        assert_eq!(decoded, line);
        assert_eq!(encode_linestring(&decoded), encoded);
    }

    #[test]
    fn rejects_malformed_payloads() {
        let line = Polyline::from_coords(&[(0.0, 0.0), (1.0, 1.0)]).unwrap();
        let mut encoded = encode_linestring(&line);

        assert!(decode_linestring(&encoded[..7]).is_err());

        encoded[0] = 0; // big-endian marker
        assert!(decode_linestring(&encoded).is_err());

        let mut wrong_type = encode_linestring(&line);
        wrong_type[1] = 1; // WKB Point
        assert!(decode_linestring(&wrong_type).is_err());
    }
}
