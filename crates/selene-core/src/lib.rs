//! Core geometry for the Selene alignment engine: geographic coordinate
//! mapping, angle normalization, render-frame calibration and the shared
//! error taxonomy.

pub mod constants;
pub mod coordinates;
pub mod error;


pub use coordinates::{
    normalize_longitude_deg, shortest_arc, wrap_pi, wrap_two_pi, CoordinateMapper, GeoCoord,
    ObserverLocation, RenderFrameCalibration,
};
pub use error::{DomainError, EngineError, EngineResult, Status};
