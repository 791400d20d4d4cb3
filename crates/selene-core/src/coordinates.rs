use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::constants::{MIN_VECTOR_LENGTH, POLE_EPSILON};
use crate::error::DomainError;

/// Geographic position in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoCoord {
    pub lat_deg: f64, // [-90, 90]
    pub lon_deg: f64, // (-180, 180]
}

/// Where the sky is watched from. Only the hemisphere matters to the phase
/// geometry, but the full position is kept for callers.
pub type ObserverLocation = GeoCoord;

impl GeoCoord {
    /// Clamps latitude and normalizes longitude
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self {
            lat_deg: lat_deg.clamp(-90.0, 90.0),
            lon_deg: normalize_longitude_deg(lon_deg),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.lat_deg.is_finite() && self.lon_deg.is_finite()
    }

    pub fn is_southern(&self) -> bool {
        self.lat_deg < 0.0
    }
}

/// Normalize a longitude to (-180, 180]
pub fn normalize_longitude_deg(lon_deg: f64) -> f64 {
    let wrapped = (lon_deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Wrap an angle to (-π, π]
pub fn wrap_pi(angle: f64) -> f64 {
    let wrapped = angle.sin().atan2(angle.cos());
    if wrapped <= -PI {
        PI
    } else {
        wrapped
    }
}

/// Wrap an angle to [0, 2π)
pub fn wrap_two_pi(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Signed shortest rotation taking `from` onto `to`, in (-π, π].
/// Never jumps by a full turn across the ±π seam.
pub fn shortest_arc(from: f64, to: f64) -> f64 {
    wrap_pi(to - from)
}

/// Fixed offset between the body texture's longitude origin and
/// geographic longitude zero
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderFrameCalibration {
    pub longitude_offset_deg: f64,
}

impl RenderFrameCalibration {
    pub fn new(longitude_offset_deg: f64) -> Self {
        Self { longitude_offset_deg }
    }
}

/// Maps between geographic coordinates and points on the body sphere.
///
/// Convention: longitude 0 lies on +Z, longitude 90°E on +X, and latitude
/// is measured from the equatorial plane toward +Y.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoordinateMapper {
    calibration: RenderFrameCalibration,
}

impl CoordinateMapper {
    pub fn new(calibration: RenderFrameCalibration) -> Self {
        Self { calibration }
    }

    pub fn calibration(&self) -> RenderFrameCalibration {
        self.calibration
    }

    /// Point on a sphere of `radius` for a latitude/longitude pair (degrees)
    pub fn to_vector(lat_deg: f64, lon_deg: f64, radius: f64) -> DVec3 {
        let lat = lat_deg.to_radians();
        let lon = lon_deg.to_radians();
        let cos_lat = lat.cos();
        DVec3::new(
            radius * cos_lat * lon.sin(),
            radius * lat.sin(),
            radius * cos_lat * lon.cos(),
        )
    }

    /// Inverse of [`CoordinateMapper::to_vector`].
    ///
    /// Longitude is undefined at the poles and reported as 0 there.
    pub fn to_lat_lon(v: DVec3) -> Result<GeoCoord, DomainError> {
        if !v.is_finite() {
            return Err(DomainError::NonFinite("vector"));
        }
        let len = v.length();
        if len < MIN_VECTOR_LENGTH {
            return Err(DomainError::ZeroLength(len));
        }

        let n = v / len;
        let horizontal = (n.x * n.x + n.z * n.z).sqrt();
        let lat_deg = n.y.atan2(horizontal).to_degrees();
        let lon_deg = if horizontal < POLE_EPSILON {
            0.0
        } else {
            normalize_longitude_deg(n.x.atan2(n.z).to_degrees())
        };

        Ok(GeoCoord { lat_deg, lon_deg })
    }

    /// Geographic longitude to texture-space longitude
    pub fn apply_calibration(&self, lon_deg: f64) -> f64 {
        normalize_longitude_deg(lon_deg + self.calibration.longitude_offset_deg)
    }

    /// Texture-space longitude back to geographic longitude
    pub fn remove_calibration(&self, lon_deg: f64) -> f64 {
        normalize_longitude_deg(lon_deg - self.calibration.longitude_offset_deg)
    }

    /// Body-local unit vector for a geographic point, calibration applied
    pub fn to_render_vector(&self, coord: GeoCoord) -> DVec3 {
        Self::to_vector(coord.lat_deg, self.apply_calibration(coord.lon_deg), 1.0)
    }
}
