//! Engine configuration

use serde::{Deserialize, Serialize};
use selene_core::{EngineError, EngineResult, ObserverLocation, RenderFrameCalibration};
use selene_sim::rates;
use std::path::Path;

use crate::alignment::AlignmentTuning;
use crate::camera::Camera;

/// Everything the controller needs at construction.
///
/// `calibration` is fixed for the lifetime of a controller; `tuning` may be
/// replaced later through [`crate::AlignmentController::update_tuning`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub calibration: RenderFrameCalibration,
    pub tuning: AlignmentTuning,
    /// Camera distance from the body centre, in body radii
    pub camera_distance: f64,
    pub fov_y_deg: f64,
    pub aspect: f64,
    pub observer: Option<ObserverLocation>,
    /// Simulated seconds per real second
    pub time_rate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            calibration: RenderFrameCalibration::default(),
            tuning: AlignmentTuning::default(),
            camera_distance: 3.0,
            fov_y_deg: 45.0,
            aspect: 16.0 / 9.0,
            observer: None,
            time_rate: rates::REALTIME,
        }
    }
}

impl EngineConfig {
    pub fn with_longitude_offset(mut self, offset_deg: f64) -> Self {
        self.calibration = RenderFrameCalibration::new(offset_deg);
        self
    }

    pub fn with_canonical_pitch(mut self, pitch_deg: f64) -> Self {
        self.tuning.canonical_pitch_deg = pitch_deg;
        self
    }

    pub fn with_pole_clamp(mut self, clamp_deg: f64) -> Self {
        self.tuning.pole_clamp_deg = clamp_deg;
        self
    }

    pub fn with_camera(mut self, distance: f64, fov_y_deg: f64, aspect: f64) -> Self {
        self.camera_distance = distance;
        self.fov_y_deg = fov_y_deg;
        self.aspect = aspect;
        self
    }

    pub fn with_observer(mut self, observer: ObserverLocation) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_time_rate(mut self, rate: f64) -> Self {
        self.time_rate = rate;
        self
    }

    /// Initial camera described by this config
    pub fn camera(&self) -> Camera {
        Camera::facing_origin(self.camera_distance, self.fov_y_deg, self.aspect)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !self.calibration.longitude_offset_deg.is_finite() {
            return Err(EngineError::Config("longitude offset must be finite".into()));
        }
        self.tuning.validate()?;
        if !self.camera().is_valid() {
            return Err(EngineError::Config(format!(
                "camera (distance {}, fov {}°, aspect {}) is degenerate",
                self.camera_distance, self.fov_y_deg, self.aspect
            )));
        }
        if self.camera_distance <= 1.0 {
            return Err(EngineError::Config(format!(
                "camera distance {} puts the camera inside the body",
                self.camera_distance
            )));
        }
        if let Some(observer) = &self.observer {
            if !observer.is_finite() {
                return Err(EngineError::Config("observer location must be finite".into()));
            }
        }
        if !self.time_rate.is_finite() {
            return Err(EngineError::Config("time rate must be finite".into()));
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{:?}: {}", path, e)))?;
        tracing::info!("Loading engine config from {:?}", path);
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }
}
