/// Mean obliquity of the ecliptic at J2000.0 (degrees)
pub const OBLIQUITY_J2000_DEG: f64 = 23.439_291_1;

/// Julian Date of the J2000.0 epoch
pub const J2000_JD: f64 = 2_451_545.0;

/// Days per Julian century
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;

/// Astronomical unit in meters
pub const AU: f64 = 1.495978707e11;

/// Latitude beyond which azimuth becomes unreliable (degrees)
pub const POLE_CLAMP_DEG: f64 = 85.0;

/// Default fixed tilt applied to every alignment target (degrees)
pub const CANONICAL_PITCH_DEG: f64 = -10.0;

/// Shortest vector that still maps to a surface point
pub const MIN_VECTOR_LENGTH: f64 = 1e-12;

/// Horizontal component under which a unit vector is treated as a pole
pub const POLE_EPSILON: f64 = 1e-12;
