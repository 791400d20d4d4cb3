//! Owner of the body orientation and everything derived from it
//!
//! One controller per viewport. All state is reached through typed
//! commands and queries on this object.

use glam::DVec3;
use hifitime::Epoch;
use selene_core::{EngineError, ObserverLocation, RenderFrameCalibration, Status};
use selene_sim::{
    AnalyticEphemeris, EphemerisProvider, PhaseGeometryResolver, PhaseState, TimeController,
};

use crate::alignment::{
    AlignmentSolver, AlignmentTarget, AlignmentTuning, BodyOrientation, RotationResult,
};
use crate::anchor::{ScreenAnchor, ScreenAnchorProjector};
use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::gpu_types::{BodyUniform, PhaseUniform};

pub struct AlignmentController<E: EphemerisProvider = AnalyticEphemeris> {
    config: EngineConfig,
    ephemeris: E,
    resolver: PhaseGeometryResolver,
    solver: AlignmentSolver,
    projector: ScreenAnchorProjector,
    clock: TimeController,
    camera: Camera,
    orientation: BodyOrientation,
    last_target: Option<AlignmentTarget>,
    last_rotation: Option<RotationResult>,
    phase: PhaseState,
}

impl AlignmentController<AnalyticEphemeris> {
    /// Controller backed by the built-in ephemeris, starting at `epoch`
    pub fn new(config: EngineConfig, epoch: Epoch) -> Self {
        Self::with_ephemeris(config, AnalyticEphemeris::new(), epoch)
    }
}

impl<E: EphemerisProvider> AlignmentController<E> {
    pub fn with_ephemeris(config: EngineConfig, ephemeris: E, epoch: Epoch) -> Self {
        if let Err(e) = config.validate() {
            tracing::warn!("Engine config failed validation: {}", e);
        }

        let mut clock = TimeController::at_epoch(epoch);
        clock.set_rate(config.time_rate);

        let resolver = PhaseGeometryResolver::new();
        let phase = resolver.resolve(&ephemeris, &clock.sample(), config.observer.as_ref());
        let camera = config.camera();

        Self {
            solver: AlignmentSolver::new(config.calibration, config.tuning),
            config,
            ephemeris,
            resolver,
            projector: ScreenAnchorProjector::new(),
            clock,
            camera,
            orientation: BodyOrientation::default(),
            last_target: None,
            last_rotation: None,
            phase,
        }
    }

    // --- commands ---------------------------------------------------------

    /// Rotate the body so `target` faces the camera
    pub fn align_to(&mut self, target: AlignmentTarget) -> RotationResult {
        let result = self.solver.solve(&mut self.orientation, self.camera.position, &target);
        if !matches!(result.status.error(), Some(EngineError::NumericInstability(_))) {
            self.last_target = Some(target);
        }
        self.last_rotation = Some(result.clone());
        result
    }

    /// Re-run the last alignment, e.g. after the camera moved
    pub fn realign(&mut self) -> Option<RotationResult> {
        let target = self.last_target?;
        Some(self.align_to(target))
    }

    /// Replace the camera. An unusable camera is refused and the previous
    /// one kept.
    pub fn set_camera(&mut self, camera: Camera) -> Status {
        if !camera.is_valid() {
            let err = EngineError::NumericInstability(format!(
                "camera at {:?} is not usable",
                camera.position
            ));
            tracing::error!("{}", err);
            return err.into();
        }
        self.camera = camera;
        self.projector.refresh(&self.camera);
        self.projector.status().clone()
    }

    /// Swing the camera around the body
    pub fn orbit_camera(&mut self, d_yaw: f64, d_pitch: f64) -> Status {
        let mut camera = self.camera;
        camera.orbit(d_yaw, d_pitch);
        self.set_camera(camera)
    }

    pub fn update_tuning(&mut self, tuning: AlignmentTuning) -> Status {
        if let Err(e) = tuning.validate() {
            tracing::warn!("Rejected tuning update: {}", e);
            return e.into();
        }
        self.solver.set_tuning(tuning);
        self.config.tuning = tuning;
        Status::Nominal
    }

    pub fn reset_orientation(&mut self) {
        self.orientation = BodyOrientation::default();
        self.last_target = None;
        self.last_rotation = None;
    }

    pub fn set_observer(&mut self, observer: Option<ObserverLocation>) -> &PhaseState {
        self.config.observer = observer;
        self.refresh_phase()
    }

    pub fn set_time(&mut self, epoch: Epoch) -> &PhaseState {
        self.clock.set_time(epoch);
        self.refresh_phase()
    }

    /// Per-frame update: advance the clock, recompute the phase and any
    /// screen anchors invalidated by camera motion
    pub fn tick(&mut self, real_dt_seconds: f64) -> &PhaseState {
        self.clock.tick(real_dt_seconds);
        self.projector.refresh(&self.camera);
        self.refresh_phase()
    }

    pub fn clock_mut(&mut self) -> &mut TimeController {
        &mut self.clock
    }

    pub fn add_anchor(&mut self, name: impl Into<String>, anchor: ScreenAnchor) -> Status {
        let status = self.projector.insert(name, anchor);
        if status.is_nominal() {
            self.projector.refresh(&self.camera);
        }
        status
    }

    pub fn remove_anchor(&mut self, name: &str) -> Option<ScreenAnchor> {
        self.projector.remove(name)
    }

    fn refresh_phase(&mut self) -> &PhaseState {
        self.phase = self.resolver.resolve(
            &self.ephemeris,
            &self.clock.sample(),
            self.config.observer.as_ref(),
        );
        &self.phase
    }

    // --- queries ----------------------------------------------------------

    pub fn orientation(&self) -> &BodyOrientation {
        &self.orientation
    }

    pub fn last_rotation(&self) -> Option<&RotationResult> {
        self.last_rotation.as_ref()
    }

    pub fn phase(&self) -> &PhaseState {
        &self.phase
    }

    pub fn anchor(&self, name: &str) -> Option<DVec3> {
        self.projector.placement(name)
    }

    pub fn anchors(&self) -> &ScreenAnchorProjector {
        &self.projector
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calibration(&self) -> RenderFrameCalibration {
        self.config.calibration
    }

    pub fn current_time(&self) -> Epoch {
        self.clock.current()
    }

    pub fn phase_uniform(&self) -> PhaseUniform {
        PhaseUniform::from_phase(&self.phase)
    }

    pub fn body_uniform(&self) -> BodyUniform {
        BodyUniform::from_orientation(&self.orientation)
    }
}
