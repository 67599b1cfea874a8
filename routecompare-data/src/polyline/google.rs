//! Encoded polyline algorithm format (precision 5).

use geo::Coord;

use super::{PolylineError, VarintReader, unzigzag};

const FACTOR: f64 = 1e5;

/// Decode a Google/OSRM encoded polyline into `(lon, lat)` coordinates.
///
/// # Examples
/// ```
/// use routecompare_data::polyline::decode_polyline;
///
/// let coords = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@")?;
/// assert_eq!(coords.len(), 3);
/// assert!((coords[0].x - -120.2).abs() < 1e-9);
/// assert!((coords[0].y - 38.5).abs() < 1e-9);
/// # Ok::<(), routecompare_data::polyline::PolylineError>(())
/// ```
pub fn decode_polyline(encoded: &str) -> Result<Vec<Coord<f64>>, PolylineError> {
    let mut reader = VarintReader::default();
    let mut deltas = Vec::new();
    for (position, character) in encoded.char_indices() {
        let chunk = chunk_value(character, position)?;
        if let Some(value) = reader.push(chunk)? {
            deltas.push(unzigzag(value));
        }
    }
    if !reader.is_idle() || deltas.len() % 2 != 0 {
        return Err(PolylineError::Truncated);
    }

    let mut lat = 0_i64;
    let mut lon = 0_i64;
    let coords = deltas
        .chunks_exact(2)
        .map(|pair| {
            lat += pair[0];
            lon += pair[1];
            Coord {
                x: lon as f64 / FACTOR,
                y: lat as f64 / FACTOR,
            }
        })
        .collect();
    Ok(coords)
}

fn chunk_value(character: char, position: usize) -> Result<u64, PolylineError> {
    match u64::from(character) {
        value @ 63..=126 => Ok(value - 63),
        _ => Err(PolylineError::InvalidCharacter {
            character,
            position,
        }),
    }
}
