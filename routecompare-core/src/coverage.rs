//! Buffered-overlap coverage between a reference route and a candidate.
//!
//! The corridor around a reference route is the set of planar points within
//! the buffer distance of the polyline. It is represented exactly as the
//! union of one capsule per reference segment (a rectangle with round caps),
//! which is the round-joined buffer polygon. For every candidate segment the
//! portion lying inside each nearby capsule is one parameter interval; the
//! merged intervals give the candidate length inside the corridor.
//!
//! Coverage is `100 * inside_length / reference_length`. It is deliberately
//! asymmetric: swapping the routes generally changes the result.

use geo::Coord;
use rstar::{AABB, RTree, RTreeObject};
use thiserror::Error;

use crate::{PlanarProjection, PlanarRoute, Route};

/// Lateral tolerance, in meters, for two routes to share a road.
pub const BUFFER_METERS: f64 = 30.0;

/// Errors returned by [`CoverageScorer::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoverageError {
    /// The buffer distance was zero, negative or not finite.
    #[error("buffer distance must be a positive finite number of meters, got {value}")]
    InvalidBuffer {
        /// Rejected buffer distance.
        value: f64,
    },
}

/// Computes coverage percentages for a fixed buffer distance.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use routecompare_core::{CoverageScorer, PlanarProjection, Route};
///
/// let reference = Route::from_lon_lat([(9.10, 48.78), (9.15, 48.80)])?;
/// let projection = PlanarProjection::for_region(Coord { x: 9.15, y: 48.83 });
/// let scorer = CoverageScorer::default();
/// let same = scorer.coverage(&reference, Some(&reference), &projection);
/// assert!((same - 100.0).abs() < 1e-6);
/// assert_eq!(scorer.coverage(&reference, None, &projection), 0.0);
/// # Ok::<(), routecompare_core::RouteError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageScorer {
    buffer: f64,
}

impl Default for CoverageScorer {
    fn default() -> Self {
        Self {
            buffer: BUFFER_METERS,
        }
    }
}

impl CoverageScorer {
    /// Build a scorer with a custom buffer distance in meters.
    pub fn new(buffer: f64) -> Result<Self, CoverageError> {
        if buffer.is_finite() && buffer > 0.0 {
            Ok(Self { buffer })
        } else {
            Err(CoverageError::InvalidBuffer { value: buffer })
        }
    }

    /// Buffer distance in meters.
    pub fn buffer(&self) -> f64 {
        self.buffer
    }

    /// Index the corridor around a projected reference route.
    ///
    /// Build the corridor once per pair and score every candidate against it.
    pub fn corridor(&self, reference: &PlanarRoute) -> Corridor {
        let capsules = reference
            .coords()
            .windows(2)
            .filter_map(|pair| match pair {
                [start, end] => Some(Capsule {
                    start: *start,
                    end: *end,
                    radius: self.buffer,
                }),
                _ => None,
            })
            .collect();
        Corridor {
            index: RTree::bulk_load(capsules),
            reference_length: reference.length(),
        }
    }

    /// Project both routes and score `candidate` against `reference`.
    pub fn coverage(
        &self,
        reference: &Route,
        candidate: Option<&Route>,
        projection: &PlanarProjection,
    ) -> f64 {
        let corridor = self.corridor(&projection.project_route(reference));
        let planar = candidate.map(|route| projection.project_route(route));
        corridor.coverage(planar.as_ref())
    }
}

/// The buffered corridor around one reference route.
#[derive(Debug, Clone)]
pub struct Corridor {
    index: RTree<Capsule>,
    reference_length: f64,
}

impl Corridor {
    /// Planar length of the reference route in meters.
    pub fn reference_length(&self) -> f64 {
        self.reference_length
    }

    /// Percentage of the reference length matched by `candidate`.
    ///
    /// Returns 0 for an absent candidate or a zero-length reference and never
    /// returns NaN. Results are clamped to `[0, 100]`.
    pub fn coverage(&self, candidate: Option<&PlanarRoute>) -> f64 {
        let Some(candidate) = candidate else {
            return 0.0;
        };
        if self.reference_length <= 0.0 {
            return 0.0;
        }
        let inside = self.length_inside(candidate);
        let percent = 100.0 * inside / self.reference_length;
        if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// Length in meters of `candidate` that lies inside the corridor.
    pub fn length_inside(&self, candidate: &PlanarRoute) -> f64 {
        candidate
            .coords()
            .windows(2)
            .map(|pair| match pair {
                [start, end] => self.segment_length_inside(*start, *end),
                _ => 0.0,
            })
            .sum()
    }

    fn segment_length_inside(&self, start: Coord<f64>, end: Coord<f64>) -> f64 {
        let length = (end.x - start.x).hypot(end.y - start.y);
        if length == 0.0 {
            return 0.0;
        }
        let envelope = AABB::from_corners(
            [start.x.min(end.x), start.y.min(end.y)],
            [start.x.max(end.x), start.y.max(end.y)],
        );
        let mut intervals: Vec<Interval> = self
            .index
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|capsule| capsule.clip(start, end))
            .collect();
        length * merged_length(&mut intervals)
    }
}

/// Closed parameter interval `[lo, hi]` along a candidate segment.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Interval {
    lo: f64,
    hi: f64,
}

impl Interval {
    fn intersect(self, other: Self) -> Option<Self> {
        let lo = self.lo.max(other.lo);
        let hi = self.hi.min(other.hi);
        (lo <= hi).then_some(Self { lo, hi })
    }

    fn hull(self, other: Self) -> Self {
        Self {
            lo: self.lo.min(other.lo),
            hi: self.hi.max(other.hi),
        }
    }
}

const UNIT: Interval = Interval { lo: 0.0, hi: 1.0 };
const EVERYTHING: Interval = Interval {
    lo: f64::NEG_INFINITY,
    hi: f64::INFINITY,
};

fn merged_length(intervals: &mut [Interval]) -> f64 {
    intervals.sort_by(|a, b| a.lo.total_cmp(&b.lo));
    let mut total = 0.0;
    let mut current: Option<Interval> = None;
    for next in intervals.iter().copied() {
        current = match current {
            Some(open) if next.lo <= open.hi => Some(open.hull(next)),
            Some(open) => {
                total += open.hi - open.lo;
                Some(next)
            }
            None => Some(next),
        };
    }
    if let Some(open) = current {
        total += open.hi - open.lo;
    }
    total
}

/// Points within `radius` of the segment `start..end`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Capsule {
    start: Coord<f64>,
    end: Coord<f64>,
    radius: f64,
}

impl RTreeObject for Capsule {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [
                self.start.x.min(self.end.x) - self.radius,
                self.start.y.min(self.end.y) - self.radius,
            ],
            [
                self.start.x.max(self.end.x) + self.radius,
                self.start.y.max(self.end.y) + self.radius,
            ],
        )
    }
}

impl Capsule {
    /// Parameters `t` in `[0, 1]` for which `p0 + t * (p1 - p0)` lies inside
    /// the capsule.
    ///
    /// The capsule is convex, so the set is one interval: the hull of the
    /// intervals inside the two end discs and the central slab.
    fn clip(&self, p0: Coord<f64>, p1: Coord<f64>) -> Option<Interval> {
        let direction = p1 - p0;
        let discs = [self.start, self.end]
            .into_iter()
            .filter_map(|center| disc_interval(p0, direction, center, self.radius));
        let slab = self.slab_interval(p0, direction);
        discs
            .chain(slab)
            .reduce(Interval::hull)
            .and_then(|interval| interval.intersect(UNIT))
    }

    fn slab_interval(&self, p0: Coord<f64>, direction: Coord<f64>) -> Option<Interval> {
        let axis = self.end - self.start;
        let axis_len_sq = dot(axis, axis);
        if axis_len_sq == 0.0 {
            return None;
        }
        let axis_len = axis_len_sq.sqrt();
        let offset = p0 - self.start;
        // Position along the axis, normalised so the slab spans [0, 1].
        let along = linear_interval(
            dot(offset, axis) / axis_len_sq,
            dot(direction, axis) / axis_len_sq,
            0.0,
            1.0,
        )?;
        // Signed distance from the axis line.
        let across = linear_interval(
            cross(axis, offset) / axis_len,
            cross(axis, direction) / axis_len,
            -self.radius,
            self.radius,
        )?;
        along.intersect(across)
    }
}

/// Solve `lo <= a + b * t <= hi` for `t`.
fn linear_interval(a: f64, b: f64, lo: f64, hi: f64) -> Option<Interval> {
    if b == 0.0 {
        return (lo..=hi).contains(&a).then_some(EVERYTHING);
    }
    let t1 = (lo - a) / b;
    let t2 = (hi - a) / b;
    Some(Interval {
        lo: t1.min(t2),
        hi: t1.max(t2),
    })
}

/// Solve `|p0 + t * direction - center| <= radius` for `t`.
fn disc_interval(
    p0: Coord<f64>,
    direction: Coord<f64>,
    center: Coord<f64>,
    radius: f64,
) -> Option<Interval> {
    let offset = p0 - center;
    let a = dot(direction, direction);
    if a == 0.0 {
        return None;
    }
    let b = 2.0 * dot(direction, offset);
    let c = dot(offset, offset) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    Some(Interval {
        lo: (-b - root) / (2.0 * a),
        hi: (-b + root) / (2.0 * a),
    })
}

fn dot(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x.mul_add(b.x, a.y * b.y)
}

fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x.mul_add(b.y, -(a.y * b.x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn planar(points: &[(f64, f64)]) -> PlanarRoute {
        PlanarRoute::new(points.iter().map(|&(x, y)| Coord { x, y }).collect())
            .expect("two or more vertices")
    }

    #[fixture]
    fn scorer() -> CoverageScorer {
        CoverageScorer::default()
    }

    #[rstest]
    #[case(0.0)]
    #[case(-5.0)]
    #[case(f64::NAN)]
    fn invalid_buffers_are_rejected(#[case] buffer: f64) {
        assert!(matches!(
            CoverageScorer::new(buffer),
            Err(CoverageError::InvalidBuffer { .. })
        ));
    }

    #[rstest]
    fn identical_route_is_fully_covered(scorer: CoverageScorer) {
        let reference = planar(&[(0.0, 0.0), (1_000.0, 0.0), (1_000.0, 1_000.0)]);
        let coverage = scorer.corridor(&reference).coverage(Some(&reference));
        assert!((coverage - 100.0).abs() < 1e-9, "coverage was {coverage}");
    }

    #[rstest]
    fn parallel_route_inside_buffer_is_covered(scorer: CoverageScorer) {
        let reference = planar(&[(0.0, 0.0), (1_000.0, 0.0)]);
        let candidate = planar(&[(0.0, 10.0), (1_000.0, 10.0)]);
        let coverage = scorer.corridor(&reference).coverage(Some(&candidate));
        assert!((coverage - 100.0).abs() < 1e-9, "coverage was {coverage}");
    }

    #[rstest]
    fn distant_route_is_not_covered(scorer: CoverageScorer) {
        let reference = planar(&[(0.0, 0.0), (1_000.0, 0.0)]);
        let candidate = planar(&[(0.0, 100.0), (1_000.0, 100.0)]);
        assert_eq!(scorer.corridor(&reference).coverage(Some(&candidate)), 0.0);
    }

    #[rstest]
    fn half_shared_route_scores_half(scorer: CoverageScorer) {
        let reference = planar(&[(0.0, 0.0), (1_000.0, 0.0)]);
        // Follows the reference for 500 m then turns away at right angles.
        let candidate = planar(&[(0.0, 0.0), (500.0, 0.0), (500.0, 500.0)]);
        let coverage = scorer.corridor(&reference).coverage(Some(&candidate));
        // The turn stays inside the buffer for its first 30 m.
        let expected = 100.0 * (500.0 + BUFFER_METERS) / 1_000.0;
        assert!((coverage - expected).abs() < 1e-9, "coverage was {coverage}");
    }

    #[rstest]
    fn round_caps_cover_overshoot(scorer: CoverageScorer) {
        let reference = planar(&[(0.0, 0.0), (1_000.0, 0.0)]);
        let candidate = planar(&[(-100.0, 0.0), (1_000.0, 0.0)]);
        let inside = scorer.corridor(&reference).length_inside(&candidate);
        assert!((inside - (1_000.0 + BUFFER_METERS)).abs() < 1e-9, "inside was {inside}");
    }

    #[rstest]
    fn overlapping_capsules_are_not_double_counted(scorer: CoverageScorer) {
        let reference = planar(&[(0.0, 0.0), (500.0, 0.0), (1_000.0, 0.0)]);
        let inside = scorer.corridor(&reference).length_inside(&reference);
        assert!((inside - 1_000.0).abs() < 1e-9, "inside was {inside}");
    }

    #[rstest]
    fn coverage_is_asymmetric(scorer: CoverageScorer) {
        let long = planar(&[(0.0, 0.0), (2_000.0, 0.0)]);
        let short = planar(&[(0.0, 0.0), (500.0, 0.0)]);
        let forward = scorer.corridor(&long).coverage(Some(&short));
        let backward = scorer.corridor(&short).coverage(Some(&long));
        assert!((forward - 25.0).abs() < 1e-9);
        assert!((backward - 100.0).abs() < 1e-9, "clamped to 100, got {backward}");
    }

    #[rstest]
    fn absent_candidate_scores_zero(scorer: CoverageScorer) {
        let reference = planar(&[(0.0, 0.0), (1_000.0, 0.0)]);
        assert_eq!(scorer.corridor(&reference).coverage(None), 0.0);
    }

    #[rstest]
    fn zero_length_reference_scores_zero(scorer: CoverageScorer) {
        let reference = planar(&[(10.0, 10.0), (10.0, 10.0)]);
        let candidate = planar(&[(0.0, 0.0), (20.0, 20.0)]);
        let coverage = scorer.corridor(&reference).coverage(Some(&candidate));
        assert_eq!(coverage, 0.0);
    }

    #[rstest]
    fn merging_handles_nested_intervals() {
        let mut intervals = vec![
            Interval { lo: 0.0, hi: 0.5 },
            Interval { lo: 0.1, hi: 0.2 },
            Interval { lo: 0.6, hi: 0.7 },
        ];
        assert!((merged_length(&mut intervals) - 0.6).abs() < 1e-12);
    }
}
