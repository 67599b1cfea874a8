//! Geographic bounding boxes used to sample origin/destination pairs.

use geo::{Coord, Rect};
use thiserror::Error;

/// Errors returned by [`BoundingBox::new`] and [`BoundingBox::require_area`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundingBoxError {
    /// A bound was NaN or infinite.
    #[error("bounding box values must be finite")]
    NonFinite,
    /// A longitude bound fell outside `[-180, 180]`.
    #[error("longitude {value} is outside [-180, 180]")]
    LongitudeOutOfRange {
        /// Rejected longitude.
        value: f64,
    },
    /// A latitude bound fell outside `[-90, 90]`.
    #[error("latitude {value} is outside [-90, 90]")]
    LatitudeOutOfRange {
        /// Rejected latitude.
        value: f64,
    },
    /// The minimum exceeded the maximum on an axis.
    #[error("{axis} minimum {min} exceeds maximum {max}")]
    Inverted {
        /// Offending axis, `"longitude"` or `"latitude"`.
        axis: &'static str,
        /// Supplied minimum.
        min: f64,
        /// Supplied maximum.
        max: f64,
    },
    /// The box has no extent on an axis.
    #[error("{axis} minimum and maximum are both {value}; the box has no area")]
    Degenerate {
        /// Offending axis, `"longitude"` or `"latitude"`.
        axis: &'static str,
        /// Shared bound.
        value: f64,
    },
}

/// An axis-aligned box in WGS84 degrees.
///
/// Boxes with zero extent on an axis are valid for sampling (every sample
/// shares that coordinate) but are rejected as batch inputs by
/// [`BoundingBox::require_area`].
///
/// # Examples
/// ```
/// use routecompare_core::BoundingBox;
///
/// let bbox = BoundingBox::new(9.10, 48.78, 9.20, 48.88)?;
/// assert!((bbox.center().x - 9.15).abs() < 1e-9);
/// # Ok::<(), routecompare_core::BoundingBoxError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BoundingBox {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

impl Default for BoundingBox {
    /// Stuttgart-Weilimdorf.
    fn default() -> Self {
        Self {
            min_lon: 9.10,
            min_lat: 48.78,
            max_lon: 9.20,
            max_lat: 48.88,
        }
    }
}

impl BoundingBox {
    /// Validate and construct a bounding box.
    pub fn new(
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    ) -> Result<Self, BoundingBoxError> {
        if ![min_lon, min_lat, max_lon, max_lat]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(BoundingBoxError::NonFinite);
        }
        for value in [min_lon, max_lon] {
            if !(-180.0..=180.0).contains(&value) {
                return Err(BoundingBoxError::LongitudeOutOfRange { value });
            }
        }
        for value in [min_lat, max_lat] {
            if !(-90.0..=90.0).contains(&value) {
                return Err(BoundingBoxError::LatitudeOutOfRange { value });
            }
        }
        if min_lon > max_lon {
            return Err(BoundingBoxError::Inverted {
                axis: "longitude",
                min: min_lon,
                max: max_lon,
            });
        }
        if min_lat > max_lat {
            return Err(BoundingBoxError::Inverted {
                axis: "latitude",
                min: min_lat,
                max: max_lat,
            });
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// Construct from `[min_lon, min_lat, max_lon, max_lat]`.
    pub fn from_array(values: [f64; 4]) -> Result<Self, BoundingBoxError> {
        let [min_lon, min_lat, max_lon, max_lat] = values;
        Self::new(min_lon, min_lat, max_lon, max_lat)
    }

    /// Reject boxes with zero extent on either axis.
    pub fn require_area(self) -> Result<Self, BoundingBoxError> {
        if self.min_lon == self.max_lon {
            return Err(BoundingBoxError::Degenerate {
                axis: "longitude",
                value: self.min_lon,
            });
        }
        if self.min_lat == self.max_lat {
            return Err(BoundingBoxError::Degenerate {
                axis: "latitude",
                value: self.min_lat,
            });
        }
        Ok(self)
    }

    /// Western bound.
    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    /// Southern bound.
    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    /// Eastern bound.
    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    /// Northern bound.
    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    /// Bounds as `[min_lon, min_lat, max_lon, max_lat]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }

    /// Midpoint of the box.
    pub fn center(&self) -> Coord<f64> {
        Coord {
            x: (self.min_lon + self.max_lon) / 2.0,
            y: (self.min_lat + self.max_lat) / 2.0,
        }
    }

    /// Whether `coord` lies inside the box, boundary included.
    pub fn contains(&self, coord: Coord<f64>) -> bool {
        (self.min_lon..=self.max_lon).contains(&coord.x)
            && (self.min_lat..=self.max_lat).contains(&coord.y)
    }

    /// The box as a `geo` rectangle.
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min_lon,
                y: self.min_lat,
            },
            Coord {
                x: self.max_lon,
                y: self.max_lat,
            },
        )
    }
}
