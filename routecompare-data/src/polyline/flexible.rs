//! HERE flexible polyline format.
//!
//! The header holds a format version and a packed word with the coordinate
//! precision and an optional third dimension. The third dimension is read
//! and discarded.

use geo::Coord;

use super::{PolylineError, VarintReader, unzigzag};

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
const FORMAT_VERSION: u64 = 1;

/// Decode a HERE flexible polyline into `(lon, lat)` coordinates.
///
/// # Examples
/// ```
/// use routecompare_data::polyline::decode_flexible;
///
/// let coords = decode_flexible("BFoz5xJ67i1B1B7PzIhaxL7Y")?;
/// assert_eq!(coords.len(), 4);
/// assert!((coords[0].x - 8.69821).abs() < 1e-9);
/// assert!((coords[0].y - 50.10228).abs() < 1e-9);
/// # Ok::<(), routecompare_data::polyline::PolylineError>(())
/// ```
pub fn decode_flexible(encoded: &str) -> Result<Vec<Coord<f64>>, PolylineError> {
    let values = read_values(encoded)?;
    let mut values = values.into_iter();

    let version = values.next().ok_or(PolylineError::Truncated)?;
    if version != FORMAT_VERSION {
        return Err(PolylineError::UnsupportedVersion { version });
    }
    let header = values.next().ok_or(PolylineError::Truncated)?;
    let precision = (header & 0x0f) as i32;
    let has_third_dimension = (header >> 4) & 0x07 != 0;
    let factor = 10_f64.powi(precision);
    let stride = if has_third_dimension { 3 } else { 2 };

    let deltas: Vec<i64> = values.map(unzigzag).collect();
    if deltas.len() % stride != 0 {
        return Err(PolylineError::Truncated);
    }

    let mut lat = 0_i64;
    let mut lon = 0_i64;
    let coords = deltas
        .chunks_exact(stride)
        .map(|tuple| {
            lat += tuple[0];
            lon += tuple[1];
            Coord {
                x: lon as f64 / factor,
                y: lat as f64 / factor,
            }
        })
        .collect();
    Ok(coords)
}

fn read_values(encoded: &str) -> Result<Vec<u64>, PolylineError> {
    let mut reader = VarintReader::default();
    let mut values = Vec::new();
    for (position, character) in encoded.char_indices() {
        let chunk = ALPHABET
            .iter()
            .position(|&symbol| char::from(symbol) == character)
            .ok_or(PolylineError::InvalidCharacter {
                character,
                position,
            })?;
        if let Some(value) = reader.push(chunk as u64)? {
            values.push(value);
        }
    }
    if reader.is_idle() {
        Ok(values)
    } else {
        Err(PolylineError::Truncated)
    }
}
