//! Alignment engine for the rendered body
//!
//! Solves the rotation that brings a geographic target in front of the
//! camera with a fixed composition, pins auxiliary objects to screen
//! positions, and packs the results for the renderer. Everything is
//! single-threaded and frame-synchronous; each viewport owns its own
//! [`AlignmentController`].

pub mod alignment;
pub mod anchor;
pub mod camera;
pub mod config;
pub mod controller;
pub mod gpu_types;

pub use alignment::{
    AlignmentSolver, AlignmentTarget, AlignmentTuning, BodyOrientation, RotationResult,
};
pub use anchor::{project_anchor, AnchorPlacement, ScreenAnchor, ScreenAnchorProjector};
pub use camera::Camera;
pub use config::EngineConfig;
pub use controller::AlignmentController;
pub use gpu_types::{BodyUniform, PhaseUniform};
