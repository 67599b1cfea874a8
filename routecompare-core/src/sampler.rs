//! Random origin/destination sampling inside a bounding box.

use geo::Coord;
use log::warn;
use rand::Rng;

use crate::{BoundingBox, RoadSnapper};

/// Number of origin/destination pairs in a default batch.
pub const NUM_ROUTES: usize = 5;

/// One origin/destination pair under comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OdPair {
    /// Dense index of the pair within its batch.
    pub pair_id: u32,
    /// Start of the route.
    pub origin: Coord<f64>,
    /// End of the route.
    pub destination: Coord<f64>,
}

/// Draw `count` coordinates uniformly inside `bbox`.
///
/// Longitude and latitude are drawn independently. An axis whose minimum
/// equals its maximum yields that constant for every sample.
///
/// # Examples
/// ```
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use routecompare_core::{sample, BoundingBox};
///
/// let bbox = BoundingBox::default();
/// let mut rng = ChaCha8Rng::seed_from_u64(7);
/// let points = sample(&bbox, 10, &mut rng);
/// assert!(points.iter().all(|p| bbox.contains(*p)));
/// ```
pub fn sample<R>(bbox: &BoundingBox, count: usize, rng: &mut R) -> Vec<Coord<f64>>
where
    R: Rng + ?Sized,
{
    (0..count)
        .map(|_| Coord {
            x: draw(bbox.min_lon(), bbox.max_lon(), rng),
            y: draw(bbox.min_lat(), bbox.max_lat(), rng),
        })
        .collect()
}

fn draw<R: Rng + ?Sized>(min: f64, max: f64, rng: &mut R) -> f64 {
    if min == max {
        min
    } else {
        rng.gen_range(min..=max)
    }
}

/// Draw exactly `count` origin/destination pairs with ids `0..count`.
///
/// Pairs are not de-duplicated and an origin may coincide with its
/// destination.
pub fn sample_pairs<R>(bbox: &BoundingBox, count: usize, rng: &mut R) -> Vec<OdPair>
where
    R: Rng + ?Sized,
{
    (0..count)
        .map(|index| {
            let mut ends = sample(bbox, 2, rng).into_iter();
            let origin = ends.next().unwrap_or_else(|| bbox.center());
            let destination = ends.next().unwrap_or_else(|| bbox.center());
            OdPair {
                pair_id: u32::try_from(index).unwrap_or(u32::MAX),
                origin,
                destination,
            }
        })
        .collect()
}

/// A coordinate after a road-snapping attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnappedPoint {
    /// Snapped coordinate, or the original when snapping failed.
    pub coord: Coord<f64>,
    /// Whether `coord` came from the snapper.
    pub snapped: bool,
}

/// Snap `point` to the nearest road, falling back to `point` on failure.
///
/// Never fails: snapper errors are logged and the original coordinate is
/// returned with `snapped == false`.
pub async fn snap_or_original<S>(snapper: &S, point: Coord<f64>) -> SnappedPoint
where
    S: RoadSnapper + ?Sized,
{
    match snapper.nearest_road(point).await {
        Ok(coord) => SnappedPoint {
            coord,
            snapped: true,
        },
        Err(err) => {
            warn!(
                "road snapping failed for ({}, {}); keeping original point: {err}",
                point.x, point.y
            );
            SnappedPoint {
                coord: point,
                snapped: false,
            }
        }
    }
}
