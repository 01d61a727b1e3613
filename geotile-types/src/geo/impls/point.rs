use approx::{AbsDiffEq, RelativeEq};
use serde::{Deserialize, Serialize};

use crate::cartesian::CartesianPoint2d;

/// Geographic point given by longitude and latitude in degrees.
///
/// World coordinates are projection independent. When used as a planar point (for example as a
/// key of a spatial index), `x` is longitude and `y` is latitude.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct WorldCoordinate {
    lon: f64,
    lat: f64,
}

impl WorldCoordinate {
    /// Creates a new coordinate from longitude and latitude in degrees.
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }
}

impl CartesianPoint2d for WorldCoordinate {
    type Num = f64;

    fn x(&self) -> f64 {
        self.lon
    }

    fn y(&self) -> f64 {
        self.lat
    }
}

impl AbsDiffEq for WorldCoordinate {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.lon.abs_diff_eq(&other.lon, epsilon) && self.lat.abs_diff_eq(&other.lat, epsilon)
    }
}

impl RelativeEq for WorldCoordinate {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.lon.relative_eq(&other.lon, epsilon, max_relative)
            && self.lat.relative_eq(&other.lat, epsilon, max_relative)
    }
}

/// Creates a new [`WorldCoordinate`] from longitude and latitude values (in degrees).
///
/// ```
/// use geotile_types::lonlat;
///
/// let point = lonlat!(52.0, 38.0);
/// assert_eq!(point.lat(), 38.0);
/// ```
#[macro_export]
macro_rules! lonlat {
    ($lon:expr, $lat:expr) => {
        $crate::geo::WorldCoordinate::new($lon, $lat)
    };
}
