//! GPU-compatible uniform data for the body's material

use bytemuck::{Pod, Zeroable};
use glam::DMat4;
use selene_sim::PhaseState;

use crate::alignment::BodyOrientation;

/// Lighting parameters for the body shader
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PhaseUniform {
    /// Sun direction in the render frame
    pub sun_dir: [f32; 3],
    /// Lit fraction of the disc
    pub illumination: f32,
    pub phase_angle: f32,
    pub position_angle: f32,
    /// Non-zero when the phase is a fallback
    pub degraded: u32,
    pub _pad0: f32,
}

impl PhaseUniform {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn from_phase(phase: &PhaseState) -> Self {
        Self {
            sun_dir: phase.sun_dir_render_frame.as_vec3().to_array(),
            illumination: phase.illumination as f32,
            phase_angle: phase.phase_angle_rad as f32,
            position_angle: phase.position_angle_rad as f32,
            degraded: phase.status.is_degraded() as u32,
            _pad0: 0.0,
        }
    }
}

/// Body transform
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct BodyUniform {
    pub rotation: [f32; 4],
    pub model: [[f32; 4]; 4],
}

impl BodyUniform {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn from_orientation(orientation: &BodyOrientation) -> Self {
        Self {
            rotation: orientation.rotation.as_quat().to_array(),
            model: DMat4::from_quat(orientation.rotation)
                .as_mat4()
                .to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selene_core::EngineError;

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(PhaseUniform::SIZE, 32);
        assert_eq!(BodyUniform::SIZE, 80);
    }

    #[test]
    fn test_degraded_flag_packed() {
        let phase = PhaseState::fallback(EngineError::EphemerisUnavailable("offline".into()));
        let uniform = PhaseUniform::from_phase(&phase);
        assert_eq!(uniform.degraded, 1);
        assert_eq!(uniform.illumination, 0.5);
        assert_eq!(bytemuck::bytes_of(&uniform).len(), PhaseUniform::SIZE);
    }

    #[test]
    fn test_identity_body() {
        let uniform = BodyUniform::from_orientation(&BodyOrientation::default());
        assert_eq!(uniform.rotation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniform.model[0], [1.0, 0.0, 0.0, 0.0]);
    }
}
