//! Lunar phase geometry for rendering
//!
//! The rendered body sits at a fixed place on screen, so its shading cannot
//! come from the raw 3D Sun/Moon vectors. Instead the render-frame Sun
//! direction is rebuilt from the ecliptic-longitude difference between the
//! two bodies, in a frame where the camera sits on +Z looking at the body:
//!
//! ```text
//! sun = (-sin pa, 0, cos pa),   pa = wrap_pi(phase_lon - π)
//! ```
//!
//! New moon puts the Sun behind the body (-Z), full moon puts it behind the
//! camera (+Z), and the waxing half of the month lights the right limb (+X)
//! for a northern observer.

use glam::DVec3;
use selene_core::constants::OBLIQUITY_J2000_DEG;
use selene_core::{wrap_pi, wrap_two_pi, EngineError, ObserverLocation, Status};
use std::f64::consts::{FRAC_PI_2, PI};

use crate::ephemeris::{
    ecliptic_longitude, mean_obliquity, EphemerisProvider, EphemerisSample, TimeSample,
};

/// Illumination state consumed by the body's material
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseState {
    /// Lit fraction of the disc [0, 1]
    pub illumination: f64,
    /// Sun-Earth-Moon elongation [0, π]
    pub phase_angle_rad: f64,
    /// Orientation of the lit limb (-π, π]
    pub position_angle_rad: f64,
    /// Unit Sun direction in the fixed-screen render frame
    pub sun_dir_render_frame: DVec3,
    /// True between new and full moon
    pub waxing: bool,
    pub status: Status,
}

impl PhaseState {
    /// Neutral half-lit state used when the ephemeris cannot be evaluated
    pub fn fallback(err: EngineError) -> Self {
        let position_angle_rad = -FRAC_PI_2;
        Self {
            illumination: 0.5,
            phase_angle_rad: FRAC_PI_2,
            position_angle_rad,
            sun_dir_render_frame: render_sun_direction(position_angle_rad),
            waxing: true,
            status: Status::Degraded(err),
        }
    }

    /// Conventional name of the phase
    pub fn name(&self) -> &'static str {
        let k = self.illumination;
        match (k, self.waxing) {
            (k, _) if k < 0.03 => "new moon",
            (k, _) if k > 0.97 => "full moon",
            (k, true) if k < 0.47 => "waxing crescent",
            (k, true) if k <= 0.53 => "first quarter",
            (_, true) => "waxing gibbous",
            (k, false) if k < 0.47 => "waning crescent",
            (k, false) if k <= 0.53 => "last quarter",
            (_, false) => "waning gibbous",
        }
    }
}

/// Lit fraction of the disc seen at a given elongation
pub fn illuminated_fraction(phase_angle_rad: f64) -> f64 {
    ((1.0 - phase_angle_rad.cos()) / 2.0).clamp(0.0, 1.0)
}

/// Sun direction in the render frame for a position angle
pub fn render_sun_direction(position_angle_rad: f64) -> DVec3 {
    DVec3::new(-position_angle_rad.sin(), 0.0, position_angle_rad.cos())
}

/// Turns raw ephemeris output into a [`PhaseState`]
///
/// Ecliptic longitudes are recovered with the mean obliquity of date, the
/// same obliquity [`crate::AnalyticEphemeris`] rotates its vectors with.
/// Samples resolved without a time fall back to the J2000 obliquity.
#[derive(Clone, Copy, Debug)]
pub struct PhaseGeometryResolver {
    obliquity_rad: f64,
}

impl Default for PhaseGeometryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseGeometryResolver {
    pub fn new() -> Self {
        Self {
            obliquity_rad: OBLIQUITY_J2000_DEG.to_radians(),
        }
    }

    /// Evaluate the provider and resolve. Provider failures never escape:
    /// they produce the fallback state with a degraded status.
    pub fn resolve<E: EphemerisProvider + ?Sized>(
        &self,
        ephemeris: &E,
        time: &TimeSample,
        observer: Option<&ObserverLocation>,
    ) -> PhaseState {
        match ephemeris.sample(time) {
            Ok(sample) => {
                let obliquity = mean_obliquity(time.julian_centuries());
                self.resolve_with_obliquity(&sample, obliquity, observer)
            }
            Err(e) => {
                tracing::warn!("Ephemeris failed at {}: {}; using neutral phase", time.epoch, e);
                PhaseState::fallback(e)
            }
        }
    }

    /// Resolve an already evaluated sample whose epoch is unknown
    pub fn resolve_sample(
        &self,
        sample: &EphemerisSample,
        observer: Option<&ObserverLocation>,
    ) -> PhaseState {
        self.resolve_with_obliquity(sample, self.obliquity_rad, observer)
    }

    /// Resolve a sample taken at `time`
    pub fn resolve_sample_at(
        &self,
        sample: &EphemerisSample,
        time: &TimeSample,
        observer: Option<&ObserverLocation>,
    ) -> PhaseState {
        self.resolve_with_obliquity(sample, mean_obliquity(time.julian_centuries()), observer)
    }

    fn resolve_with_obliquity(
        &self,
        sample: &EphemerisSample,
        obliquity_rad: f64,
        observer: Option<&ObserverLocation>,
    ) -> PhaseState {
        let Some(vectors) = sample.vectors().normalized().filter(|v| {
            v.sun_dir.is_finite() && v.moon_dir.is_finite()
        }) else {
            let err = EngineError::EphemerisUnavailable("degenerate Sun/Moon vectors".into());
            tracing::warn!("{}", err);
            return PhaseState::fallback(err);
        };

        let phase_angle_rad = vectors.sun_dir.dot(vectors.moon_dir).clamp(-1.0, 1.0).acos();

        let illumination = if sample.illumination_fraction.is_finite() {
            sample.illumination_fraction.clamp(0.0, 1.0)
        } else {
            illuminated_fraction(phase_angle_rad)
        };

        // Both longitudes go to [0, 2π) first so the difference never
        // straddles the seam
        let sun_lon = wrap_two_pi(ecliptic_longitude(vectors.sun_dir, obliquity_rad));
        let moon_lon = wrap_two_pi(ecliptic_longitude(vectors.moon_dir, obliquity_rad));
        let phase_lon = wrap_two_pi(moon_lon - sun_lon);
        let waxing = phase_lon > 0.0 && phase_lon < PI;

        let mut position_angle_rad = wrap_pi(phase_lon - PI);
        if observer.is_some_and(|o| o.is_southern()) {
            position_angle_rad = wrap_pi(-position_angle_rad);
        }

        tracing::debug!(
            "Phase: k={:.4} elongation={:.2}° phase_lon={:.2}° pa={:.2}°",
            illumination,
            phase_angle_rad.to_degrees(),
            phase_lon.to_degrees(),
            position_angle_rad.to_degrees()
        );

        PhaseState {
            illumination,
            phase_angle_rad,
            position_angle_rad,
            sun_dir_render_frame: render_sun_direction(position_angle_rad),
            waxing,
            status: Status::Nominal,
        }
    }
}
