//! Sun/Moon ephemeris, lunar phase geometry and the playback clock.

pub mod ephemeris;
pub mod phase;
pub mod time_controller;

pub use ephemeris::{
    AnalyticEphemeris, CelestialVectors, EclipticPosition, EphemerisProvider, EphemerisSample,
    TimeSample,
};
pub use phase::{illuminated_fraction, render_sun_direction, PhaseGeometryResolver, PhaseState};
pub use time_controller::{rates, TimeController, SYNODIC_MONTH_DAYS};
