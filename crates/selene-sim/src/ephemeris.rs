//! Geocentric Sun and Moon directions
//!
//! The engine treats the ephemeris as an interchangeable black box behind
//! [`EphemerisProvider`]. [`AnalyticEphemeris`] is the built-in provider: a
//! low-precision solar theory plus the leading terms of the ELP2000 lunar
//! series, good to roughly 0.1 degrees. That is plenty for shading a disc.

use glam::DVec3;
use hifitime::Epoch;
use selene_core::constants::{DAYS_PER_JULIAN_CENTURY, J2000_JD};
use selene_core::{EngineError, EngineResult};

/// Kilometers per astronomical unit
const KM_PER_AU: f64 = 149_597_870.7;

/// Mean Earth-Moon distance used by the lunar series (km)
const MOON_MEAN_DISTANCE_KM: f64 = 385_000.56;

/// The series are fitted around J2000; outside this window (Julian
/// centuries) their error grows without bound.
const VALIDITY_CENTURIES: f64 = 50.0;

/// One UTC instant, immutable for the duration of a computation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeSample {
    pub epoch: Epoch,
}

impl TimeSample {
    pub fn new(epoch: Epoch) -> Self {
        Self { epoch }
    }

    /// Julian centuries (TT) since J2000.0
    pub fn julian_centuries(&self) -> f64 {
        (self.epoch.to_jde_tt_days() - J2000_JD) / DAYS_PER_JULIAN_CENTURY
    }
}

impl From<Epoch> for TimeSample {
    fn from(epoch: Epoch) -> Self {
        Self::new(epoch)
    }
}

/// Unit directions from the Earth's centre, equatorial frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CelestialVectors {
    pub sun_dir: DVec3,
    pub moon_dir: DVec3,
}

impl CelestialVectors {
    /// Normalized copy, or `None` when either vector is unusable
    pub fn normalized(&self) -> Option<Self> {
        let sun_dir = self.sun_dir.try_normalize()?;
        let moon_dir = self.moon_dir.try_normalize()?;
        Some(Self { sun_dir, moon_dir })
    }
}

/// What a provider reports for one instant
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EphemerisSample {
    pub sun_dir: DVec3,
    pub moon_dir: DVec3,
    /// Lit fraction of the disc, 0 = new, 1 = full
    pub illumination_fraction: f64,
    /// Sun-Moon-Earth angle (degrees)
    pub phase_angle_deg: f64,
}

impl EphemerisSample {
    pub fn vectors(&self) -> CelestialVectors {
        CelestialVectors {
            sun_dir: self.sun_dir,
            moon_dir: self.moon_dir,
        }
    }
}

/// Source of Sun/Moon geometry.
///
/// Implementations must be pure functions of the time sample.
pub trait EphemerisProvider {
    fn sample(&self, time: &TimeSample) -> EngineResult<EphemerisSample>;
}

impl<F> EphemerisProvider for F
where
    F: Fn(&TimeSample) -> EngineResult<EphemerisSample>,
{
    fn sample(&self, time: &TimeSample) -> EngineResult<EphemerisSample> {
        self(time)
    }
}

/// Mean obliquity of the ecliptic of date (radians)
pub fn mean_obliquity(t: f64) -> f64 {
    (23.439_291 - 0.013_004_2 * t).to_radians()
}

/// Ecliptic longitude/latitude (radians) to an equatorial unit vector
pub fn ecliptic_to_equatorial(lon: f64, lat: f64, obliquity: f64) -> DVec3 {
    let (sin_l, cos_l) = lon.sin_cos();
    let (sin_b, cos_b) = lat.sin_cos();
    let (sin_e, cos_e) = obliquity.sin_cos();
    DVec3::new(
        cos_b * cos_l,
        cos_e * cos_b * sin_l - sin_e * sin_b,
        sin_e * cos_b * sin_l + cos_e * sin_b,
    )
}

/// Ecliptic longitude (radians, (-π, π]) of an equatorial direction
pub fn ecliptic_longitude(dir: DVec3, obliquity: f64) -> f64 {
    let (sin_e, cos_e) = obliquity.sin_cos();
    let y = cos_e * dir.y + sin_e * dir.z;
    y.atan2(dir.x)
}

/// Position of a body on the ecliptic
#[derive(Clone, Copy, Debug)]
pub struct EclipticPosition {
    pub lon: f64, // radians
    pub lat: f64, // radians
    pub distance_km: f64,
}

/// Built-in low-precision Sun/Moon theory
#[derive(Clone, Copy, Debug, Default)]
pub struct AnalyticEphemeris;

impl AnalyticEphemeris {
    pub fn new() -> Self {
        Self
    }

    /// Geometric solar position for `t` Julian centuries since J2000
    pub fn sun_position(t: f64) -> EclipticPosition {
        let l0 = (280.46646 + 36_000.76983 * t + 0.000_303_2 * t * t).rem_euclid(360.0);
        let m = (357.52911 + 35_999.05029 * t - 0.000_153_7 * t * t)
            .rem_euclid(360.0)
            .to_radians();

        // Equation of centre (degrees)
        let c = (1.914_602 - 0.004_817 * t - 0.000_014 * t * t) * m.sin()
            + (0.019_993 - 0.000_101 * t) * (2.0 * m).sin()
            + 0.000_289 * (3.0 * m).sin();

        let e = 0.016_708_634 - 0.000_042_037 * t;
        let v = m + c.to_radians();
        let r_au = 1.000_001_018 * (1.0 - e * e) / (1.0 + e * v.cos());

        EclipticPosition {
            lon: (l0 + c).to_radians(),
            lat: 0.0,
            distance_km: r_au * KM_PER_AU,
        }
    }

    /// Geocentric lunar position for `t` Julian centuries since J2000
    pub fn moon_position(t: f64) -> EclipticPosition {
        let lp = (218.316_447_7 + 481_267.881_234_21 * t - 0.001_578_6 * t * t).rem_euclid(360.0);
        let d = (297.850_192_1 + 445_267.111_403_4 * t - 0.001_881_9 * t * t)
            .rem_euclid(360.0)
            .to_radians();
        let m = (357.529_109_2 + 35_999.050_290_9 * t - 0.000_153_6 * t * t)
            .rem_euclid(360.0)
            .to_radians();
        let mp = (134.963_396_4 + 477_198.867_505_5 * t + 0.008_741_4 * t * t)
            .rem_euclid(360.0)
            .to_radians();
        let f = (93.272_095_0 + 483_202.017_523_3 * t - 0.003_653_9 * t * t)
            .rem_euclid(360.0)
            .to_radians();

        // Eccentricity damping for terms involving the solar anomaly
        let ecc = 1.0 - 0.002_516 * t - 0.000_007_4 * t * t;

        // (D, M, M', F, coefficient) in millionths of a degree
        const LON_TERMS: [(f64, f64, f64, f64, f64); 24] = [
            (0.0, 0.0, 1.0, 0.0, 6_288_774.0),
            (2.0, 0.0, -1.0, 0.0, 1_274_027.0),
            (2.0, 0.0, 0.0, 0.0, 658_314.0),
            (0.0, 0.0, 2.0, 0.0, 213_618.0),
            (0.0, 1.0, 0.0, 0.0, -185_116.0),
            (0.0, 0.0, 0.0, 2.0, -114_332.0),
            (2.0, 0.0, -2.0, 0.0, 58_793.0),
            (2.0, -1.0, -1.0, 0.0, 57_066.0),
            (2.0, 0.0, 1.0, 0.0, 53_322.0),
            (2.0, -1.0, 0.0, 0.0, 45_758.0),
            (0.0, 1.0, -1.0, 0.0, -40_923.0),
            (1.0, 0.0, 0.0, 0.0, -34_720.0),
            (0.0, 1.0, 1.0, 0.0, -30_383.0),
            (2.0, 0.0, 0.0, -2.0, 15_327.0),
            (0.0, 0.0, 1.0, 2.0, -12_528.0),
            (0.0, 0.0, 1.0, -2.0, 10_980.0),
            (4.0, 0.0, -1.0, 0.0, 10_675.0),
            (0.0, 0.0, 3.0, 0.0, 10_034.0),
            (4.0, 0.0, -2.0, 0.0, 8_548.0),
            (2.0, 1.0, -1.0, 0.0, -7_888.0),
            (2.0, 1.0, 0.0, 0.0, -6_766.0),
            (1.0, 0.0, -1.0, 0.0, -5_163.0),
            (1.0, 1.0, 0.0, 0.0, 4_987.0),
            (2.0, -1.0, 1.0, 0.0, 4_036.0),
        ];

        const LAT_TERMS: [(f64, f64, f64, f64, f64); 10] = [
            (0.0, 0.0, 0.0, 1.0, 5_128_122.0),
            (0.0, 0.0, 1.0, 1.0, 280_602.0),
            (0.0, 0.0, 1.0, -1.0, 277_693.0),
            (2.0, 0.0, 0.0, -1.0, 173_237.0),
            (2.0, 0.0, -1.0, 1.0, 55_413.0),
            (2.0, 0.0, -1.0, -1.0, 46_271.0),
            (2.0, 0.0, 0.0, 1.0, 32_573.0),
            (0.0, 0.0, 2.0, 1.0, 17_198.0),
            (2.0, 0.0, 1.0, -1.0, 9_266.0),
            (0.0, 0.0, 2.0, -1.0, 8_822.0),
        ];

        // Distance terms in meters
        const DIST_TERMS: [(f64, f64, f64, f64, f64); 12] = [
            (0.0, 0.0, 1.0, 0.0, -20_905_355.0),
            (2.0, 0.0, -1.0, 0.0, -3_699_111.0),
            (2.0, 0.0, 0.0, 0.0, -2_955_968.0),
            (0.0, 0.0, 2.0, 0.0, -569_925.0),
            (0.0, 1.0, 0.0, 0.0, 48_888.0),
            (0.0, 0.0, 0.0, 2.0, -3_149.0),
            (2.0, 0.0, -2.0, 0.0, 246_158.0),
            (2.0, -1.0, -1.0, 0.0, -152_138.0),
            (2.0, 0.0, 1.0, 0.0, -170_733.0),
            (2.0, -1.0, 0.0, 0.0, -204_586.0),
            (0.0, 1.0, -1.0, 0.0, -129_620.0),
            (1.0, 0.0, 0.0, 0.0, 108_743.0),
        ];

        let argument = |(cd, cm, cmp, cf, _): (f64, f64, f64, f64, f64)| {
            cd * d + cm * m + cmp * mp + cf * f
        };
        let damping = |cm: f64| ecc.powi(cm.abs() as i32);

        let sum_l: f64 = LON_TERMS
            .iter()
            .map(|&term| term.4 * damping(term.1) * argument(term).sin())
            .sum();
        let sum_b: f64 = LAT_TERMS
            .iter()
            .map(|&term| term.4 * damping(term.1) * argument(term).sin())
            .sum();
        let sum_r: f64 = DIST_TERMS
            .iter()
            .map(|&term| term.4 * damping(term.1) * argument(term).cos())
            .sum();

        EclipticPosition {
            lon: (lp + sum_l / 1_000_000.0).to_radians(),
            lat: (sum_b / 1_000_000.0).to_radians(),
            distance_km: MOON_MEAN_DISTANCE_KM + sum_r / 1_000.0,
        }
    }
}

impl EphemerisProvider for AnalyticEphemeris {
    fn sample(&self, time: &TimeSample) -> EngineResult<EphemerisSample> {
        let t = time.julian_centuries();
        if !t.is_finite() || t.abs() > VALIDITY_CENTURIES {
            return Err(EngineError::EphemerisUnavailable(format!(
                "{} is outside the analytic series window",
                time.epoch
            )));
        }

        let sun = Self::sun_position(t);
        let moon = Self::moon_position(t);
        let obliquity = mean_obliquity(t);

        // Geocentric elongation, then the Sun-Moon-Earth angle
        let elongation = (moon.lat.cos() * (moon.lon - sun.lon).cos())
            .clamp(-1.0, 1.0)
            .acos();
        let phase_angle = (sun.distance_km * elongation.sin())
            .atan2(moon.distance_km - sun.distance_km * elongation.cos());

        let sample = EphemerisSample {
            sun_dir: ecliptic_to_equatorial(sun.lon, sun.lat, obliquity),
            moon_dir: ecliptic_to_equatorial(moon.lon, moon.lat, obliquity),
            illumination_fraction: (1.0 + phase_angle.cos()) / 2.0,
            phase_angle_deg: phase_angle.to_degrees(),
        };

        if !(sample.sun_dir.is_finite() && sample.moon_dir.is_finite()) {
            return Err(EngineError::EphemerisUnavailable(format!(
                "non-finite body direction at {}",
                time.epoch
            )));
        }

        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample_at(y: i32, mo: u8, d: u8, h: u8) -> EphemerisSample {
        let epoch = Epoch::from_gregorian_utc(y, mo, d, h, 0, 0, 0);
        AnalyticEphemeris::new().sample(&TimeSample::new(epoch)).unwrap()
    }

    #[test]
    fn test_sun_near_equinox() {
        // March equinox 2024 fell on 03-20 03:06 UTC
        let epoch = Epoch::from_gregorian_utc(2024, 3, 20, 3, 6, 0, 0);
        let t = TimeSample::new(epoch).julian_centuries();
        let sun = AnalyticEphemeris::sun_position(t);
        let lon = selene_core::wrap_pi(sun.lon).to_degrees();
        assert!(lon.abs() < 0.1, "solar longitude at equinox was {}", lon);

        let dir = ecliptic_to_equatorial(sun.lon, sun.lat, mean_obliquity(t));
        assert!(dir.z.abs() < 1e-3);
    }

    #[test]
    fn test_new_moon_is_dark() {
        // New moon 2024-01-11 11:57 UTC
        let sample = sample_at(2024, 1, 11, 12);
        assert!(sample.illumination_fraction < 0.01);
        assert!(sample.phase_angle_deg > 170.0);
    }

    #[test]
    fn test_full_moon_is_lit() {
        // Full moon 2024-01-25 17:54 UTC
        let sample = sample_at(2024, 1, 25, 18);
        assert!(sample.illumination_fraction > 0.99);
        assert!(sample.phase_angle_deg < 10.0);
    }

    #[test]
    fn test_directions_are_unit_length() {
        let sample = sample_at(2031, 7, 4, 6);
        assert_abs_diff_eq!(sample.sun_dir.length(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sample.moon_dir.length(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_moon_distance_in_range() {
        for day in 1..28 {
            let epoch = Epoch::from_gregorian_utc(2024, 2, day, 0, 0, 0, 0);
            let t = TimeSample::new(epoch).julian_centuries();
            let moon = AnalyticEphemeris::moon_position(t);
            assert!(moon.distance_km > 355_000.0 && moon.distance_km < 408_000.0);
            assert!(moon.lat.to_degrees().abs() < 5.5);
        }
    }

    #[test]
    fn test_ecliptic_longitude_inverts_conversion() {
        let obliquity = mean_obliquity(0.24);
        for lon_deg in [-170.0_f64, -45.0, 0.0, 30.0, 135.0, 179.0] {
            let dir = ecliptic_to_equatorial(lon_deg.to_radians(), 0.0, obliquity);
            assert_abs_diff_eq!(
                ecliptic_longitude(dir, obliquity).to_degrees(),
                lon_deg,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_far_epoch_is_unavailable() {
        let epoch = Epoch::from_gregorian_utc(9000, 1, 1, 0, 0, 0, 0);
        let err = AnalyticEphemeris::new().sample(&TimeSample::new(epoch)).unwrap_err();
        assert!(matches!(err, EngineError::EphemerisUnavailable(_)));
    }

    #[test]
    fn test_closure_provider() {
        let provider = |_: &TimeSample| -> EngineResult<EphemerisSample> {
            Err(EngineError::EphemerisUnavailable("offline".into()))
        };
        let epoch = Epoch::from_gregorian_utc(2024, 1, 1, 0, 0, 0, 0);
        assert!(provider.sample(&TimeSample::new(epoch)).is_err());
    }
}
