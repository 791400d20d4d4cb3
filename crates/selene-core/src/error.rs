//! Error taxonomy and the status flag returned with every best-effort result

use thiserror::Error;

/// Result type for fallible engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Degenerate geometric input
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DomainError {
    #[error("vector length {0:e} is too short to map to a surface point")]
    ZeroLength(f64),

    #[error("latitude {0:.3}° lies inside the polar singularity")]
    PoleSingularity(f64),

    #[error("non-finite {0}")]
    NonFinite(&'static str),
}

/// Errors surfaced by the engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Ephemeris unavailable: {0}")]
    EphemerisUnavailable(String),

    #[error("Numeric instability: {0}")]
    NumericInstability(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Accuracy flag attached to every engine output.
///
/// Engine operations never fail outright; when an input is degenerate or an
/// upstream computation breaks they return a fallback value tagged
/// `Degraded` with the cause.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Status {
    #[default]
    Nominal,
    Degraded(EngineError),
}

impl Status {
    pub fn is_nominal(&self) -> bool {
        matches!(self, Status::Nominal)
    }

    pub fn is_degraded(&self) -> bool {
        !self.is_nominal()
    }

    /// Cause of the degradation, if any
    pub fn error(&self) -> Option<&EngineError> {
        match self {
            Status::Nominal => None,
            Status::Degraded(e) => Some(e),
        }
    }
}

impl From<EngineError> for Status {
    fn from(err: EngineError) -> Self {
        Status::Degraded(err)
    }
}

impl From<DomainError> for Status {
    fn from(err: DomainError) -> Self {
        Status::Degraded(EngineError::Domain(err))
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Nominal => write!(f, "nominal"),
            Status::Degraded(e) => write!(f, "degraded ({})", e),
        }
    }
}
