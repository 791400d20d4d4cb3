//! Rotation that brings a geographic target to the camera
//!
//! A single "rotate the point to the pole" rotation rolls the horizon by an
//! amount that depends on the target latitude, so every target would be
//! framed differently. The solve is instead split into two fixed-order
//! steps applied as world-axis quaternion premultiplications:
//!
//! 1. yaw about world +Y, turning the target meridian to face the camera
//!    by the shortest signed arc;
//! 2. a fixed canonical pitch about the horizontal axis across the
//!    camera's line of sight (world +X for a camera on +Z), the same for
//!    every target.
//!
//! The target's latitude is not removed by the pitch; it is reported as
//! `target_elevation_rad` for the camera rig to absorb. Exact geometry at
//! high latitudes is traded for identical composition across all targets.

use glam::{DQuat, DVec2, DVec3};
use serde::{Deserialize, Serialize};
use selene_core::constants::{CANONICAL_PITCH_DEG, POLE_CLAMP_DEG};
use selene_core::{
    shortest_arc, wrap_pi, CoordinateMapper, DomainError, EngineError, GeoCoord,
    RenderFrameCalibration, Status,
};

/// Below this horizontal extent an azimuth is meaningless
const HORIZONTAL_EPSILON: f64 = 1e-9;

/// A geographic point to bring in front of the camera
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentTarget {
    pub lat_deg: f64,
    pub lon_deg: f64,
    /// Overrides the configured canonical pitch for this target
    #[serde(default)]
    pub canonical_pitch_deg: Option<f64>,
}

impl AlignmentTarget {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            canonical_pitch_deg: None,
        }
    }

    pub fn with_pitch(mut self, pitch_deg: f64) -> Self {
        self.canonical_pitch_deg = Some(pitch_deg);
        self
    }

    fn is_finite(&self) -> bool {
        self.lat_deg.is_finite()
            && self.lon_deg.is_finite()
            && self.canonical_pitch_deg.map_or(true, f64::is_finite)
    }
}

/// Body transform plus the pitch currently baked into it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyOrientation {
    pub rotation: DQuat,
    pub pitch_rad: f64,
    /// Horizontal unit axis the pitch was applied about
    pub pitch_axis: DVec3,
}

impl Default for BodyOrientation {
    fn default() -> Self {
        Self {
            rotation: DQuat::IDENTITY,
            pitch_rad: 0.0,
            pitch_axis: DVec3::X,
        }
    }
}

impl BodyOrientation {
    pub fn is_finite(&self) -> bool {
        self.rotation.is_finite() && self.pitch_rad.is_finite() && self.pitch_axis.is_finite()
    }

    /// Orientation with the baked-in pitch removed
    pub fn level(&self) -> DQuat {
        DQuat::from_axis_angle(self.pitch_axis, -self.pitch_rad) * self.rotation
    }
}

/// Horizontal axis across the line of sight of a camera at `azimuth_rad`
/// (measured from +Z toward +X)
pub fn pitch_axis_for_azimuth(azimuth_rad: f64) -> DVec3 {
    DQuat::from_rotation_y(azimuth_rad) * DVec3::X
}

/// Outcome of one solve
#[derive(Clone, Debug, PartialEq)]
pub struct RotationResult {
    /// Rotation applied about world +Y, in (-π, π]
    pub yaw_delta_rad: f64,
    /// Change of the baked-in pitch
    pub pitch_delta_rad: f64,
    /// Pitch baked in after the solve
    pub pitch_rad: f64,
    /// Elevation of the target above the horizontal plane after the solve
    pub target_elevation_rad: f64,
    /// Full body rotation after the solve
    pub quaternion: DQuat,
    pub status: Status,
}

impl RotationResult {
    fn unchanged(orientation: &BodyOrientation, status: Status) -> Self {
        Self {
            yaw_delta_rad: 0.0,
            pitch_delta_rad: 0.0,
            pitch_rad: orientation.pitch_rad,
            target_elevation_rad: 0.0,
            quaternion: orientation.rotation,
            status,
        }
    }
}

/// Solver parameters that may change at runtime
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentTuning {
    pub canonical_pitch_deg: f64,
    pub pole_clamp_deg: f64,
}

impl Default for AlignmentTuning {
    fn default() -> Self {
        Self {
            canonical_pitch_deg: CANONICAL_PITCH_DEG,
            pole_clamp_deg: POLE_CLAMP_DEG,
        }
    }
}

impl AlignmentTuning {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.canonical_pitch_deg.is_finite() || self.canonical_pitch_deg.abs() >= 90.0 {
            return Err(EngineError::Config(format!(
                "canonical pitch {}° must lie strictly between -90° and 90°",
                self.canonical_pitch_deg
            )));
        }
        if !self.pole_clamp_deg.is_finite()
            || self.pole_clamp_deg <= 0.0
            || self.pole_clamp_deg >= 90.0
        {
            return Err(EngineError::Config(format!(
                "pole clamp {}° must lie strictly between 0° and 90°",
                self.pole_clamp_deg
            )));
        }
        Ok(())
    }
}

/// Computes the yaw/pitch rotation placing a target at the screen anchor
#[derive(Clone, Debug)]
pub struct AlignmentSolver {
    mapper: CoordinateMapper,
    tuning: AlignmentTuning,
}

impl AlignmentSolver {
    pub fn new(calibration: RenderFrameCalibration, tuning: AlignmentTuning) -> Self {
        Self {
            mapper: CoordinateMapper::new(calibration),
            tuning,
        }
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn tuning(&self) -> AlignmentTuning {
        self.tuning
    }

    pub fn set_tuning(&mut self, tuning: AlignmentTuning) {
        self.tuning = tuning;
    }

    /// Rotate `orientation` so `target` faces a camera at `camera_position`.
    ///
    /// On numeric failure the orientation is left untouched and the result
    /// carries a degraded status with zero deltas.
    pub fn solve(
        &self,
        orientation: &mut BodyOrientation,
        camera_position: DVec3,
        target: &AlignmentTarget,
    ) -> RotationResult {
        if !camera_position.is_finite() {
            let err = EngineError::NumericInstability(format!(
                "camera position {:?} is not finite",
                camera_position
            ));
            tracing::error!("Alignment aborted: {}", err);
            return RotationResult::unchanged(orientation, err.into());
        }
        if !orientation.is_finite() {
            let err = EngineError::NumericInstability("body orientation is not finite".into());
            tracing::error!("Alignment aborted: {}", err);
            return RotationResult::unchanged(orientation, err.into());
        }
        if !target.is_finite() {
            tracing::warn!("Ignoring non-finite alignment target {:?}", target);
            return RotationResult::unchanged(orientation, DomainError::NonFinite("target").into());
        }

        let mut status = Status::Nominal;
        let pitch_rad = target
            .canonical_pitch_deg
            .unwrap_or(self.tuning.canonical_pitch_deg)
            .to_radians();

        let clamp = self.tuning.pole_clamp_deg;
        let mut lat_deg = target.lat_deg.clamp(-90.0, 90.0);
        if lat_deg.abs() > clamp {
            tracing::warn!("Target latitude {:.3}° clamped to ±{}° for yaw", lat_deg, clamp);
            status = DomainError::PoleSingularity(lat_deg).into();
            lat_deg = lat_deg.clamp(-clamp, clamp);
        }

        let local = self.mapper.to_render_vector(GeoCoord::new(lat_deg, target.lon_deg));
        let level = orientation.level();

        // Yaw: meridian azimuth on the horizontal plane vs. camera azimuth
        let world = level * local;
        let target_horizontal = DVec2::new(world.x, world.z);
        let camera_horizontal = DVec2::new(camera_position.x, camera_position.z);
        // A camera straight above or below the body keeps the previous axis
        let pitch_axis = if camera_horizontal.length() < HORIZONTAL_EPSILON {
            orientation.pitch_axis
        } else {
            pitch_axis_for_azimuth(camera_position.x.atan2(camera_position.z))
        };
        let yaw_delta_rad = if target_horizontal.length() < HORIZONTAL_EPSILON
            || camera_horizontal.length() < HORIZONTAL_EPSILON
        {
            tracing::warn!("Azimuth undefined for target {:?}; yaw skipped", target);
            status = DomainError::PoleSingularity(lat_deg).into();
            0.0
        } else {
            let current = world.x.atan2(world.z);
            let desired = camera_position.x.atan2(camera_position.z);
            shortest_arc(current, desired)
        };

        let yawed = DQuat::from_rotation_y(yaw_delta_rad) * level;
        let rotation = (DQuat::from_axis_angle(pitch_axis, pitch_rad) * yawed).normalize();

        let placed = rotation * local;
        let target_elevation_rad = placed.y.atan2(DVec2::new(placed.x, placed.z).length());

        if !rotation.is_finite() || !yaw_delta_rad.is_finite() || !target_elevation_rad.is_finite()
        {
            let err = EngineError::NumericInstability(format!(
                "rotation for {:?} produced non-finite values",
                target
            ));
            tracing::error!("Alignment aborted: {}", err);
            return RotationResult::unchanged(orientation, err.into());
        }

        let pitch_delta_rad = wrap_pi(pitch_rad - orientation.pitch_rad);
        *orientation = BodyOrientation {
            rotation,
            pitch_rad,
            pitch_axis,
        };

        tracing::debug!(
            "Aligned ({:.3}, {:.3}): yaw Δ={:.4}° pitch={:.2}° elevation={:.2}°",
            target.lat_deg,
            target.lon_deg,
            yaw_delta_rad.to_degrees(),
            pitch_rad.to_degrees(),
            target_elevation_rad.to_degrees()
        );

        RotationResult {
            yaw_delta_rad,
            pitch_delta_rad,
            pitch_rad,
            target_elevation_rad,
            quaternion: rotation,
            status,
        }
    }
}

impl Default for AlignmentSolver {
    fn default() -> Self {
        Self::new(RenderFrameCalibration::default(), AlignmentTuning::default())
    }
}
