use approx::assert_abs_diff_eq;
use hifitime::Epoch;
use selene_core::{EngineError, EngineResult};
use selene_engine::{
    AlignmentController, AlignmentTarget, AlignmentTuning, Camera, EngineConfig, ScreenAnchor,
};
use selene_sim::{EphemerisSample, TimeSample};

const BEIJING: (f64, f64) = (39.9, 116.4);
const SHANGHAI: (f64, f64) = (31.2, 121.5);

fn j2024() -> Epoch {
    Epoch::from_gregorian_utc(2024, 1, 1, 0, 0, 0, 0)
}

fn controller(offset_deg: f64) -> AlignmentController {
    AlignmentController::new(EngineConfig::default().with_longitude_offset(offset_deg), j2024())
}

#[test]
fn test_city_yaws_differ_by_longitude_gap() {
    for offset in [0.0, 20.0, -47.5] {
        let mut ctl = controller(offset);
        let beijing = ctl.align_to(AlignmentTarget::new(BEIJING.0, BEIJING.1));
        ctl.reset_orientation();
        let shanghai = ctl.align_to(AlignmentTarget::new(SHANGHAI.0, SHANGHAI.1));

        assert!(beijing.status.is_nominal());
        assert!(shanghai.status.is_nominal());
        assert_eq!(beijing.pitch_rad, shanghai.pitch_rad);
        assert_abs_diff_eq!(beijing.pitch_rad, (-10.0f64).to_radians(), epsilon = 1e-12);
        assert_abs_diff_eq!(
            shanghai.yaw_delta_rad - beijing.yaw_delta_rad,
            -(5.1f64).to_radians(),
            epsilon = 1e-9
        );
        if offset == 0.0 {
            assert!(beijing.yaw_delta_rad < 0.0);
            assert!(shanghai.yaw_delta_rad < 0.0);
        }
    }
}

#[test]
fn test_sequential_city_alignment_is_incremental() {
    let mut ctl = controller(0.0);
    ctl.align_to(AlignmentTarget::new(BEIJING.0, BEIJING.1));
    let step = ctl.align_to(AlignmentTarget::new(SHANGHAI.0, SHANGHAI.1));
    assert_abs_diff_eq!(step.yaw_delta_rad, -(5.1f64).to_radians(), epsilon = 1e-9);
    assert_abs_diff_eq!(step.pitch_delta_rad, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(
        step.target_elevation_rad,
        (SHANGHAI.0 + 10.0f64).to_radians(),
        epsilon = 1e-9
    );
}

#[test]
fn test_realign_is_idempotent() {
    let mut ctl = controller(12.0);
    let first = ctl.align_to(AlignmentTarget::new(-33.9, 151.2));
    let again = ctl.realign().unwrap();
    assert_abs_diff_eq!(again.yaw_delta_rad, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(again.pitch_delta_rad, 0.0, epsilon = 1e-12);
    assert!(first.quaternion.abs_diff_eq(again.quaternion, 1e-9));
    assert_eq!(ctl.last_rotation(), Some(&again));
}

#[test]
fn test_tuning_update_changes_pitch() {
    let mut ctl = controller(0.0);
    let status = ctl.update_tuning(AlignmentTuning {
        canonical_pitch_deg: -20.0,
        ..AlignmentTuning::default()
    });
    assert!(status.is_nominal());
    let result = ctl.align_to(AlignmentTarget::new(10.0, 10.0));
    assert_abs_diff_eq!(result.pitch_rad, (-20.0f64).to_radians(), epsilon = 1e-12);

    let rejected = ctl.update_tuning(AlignmentTuning {
        canonical_pitch_deg: f64::NAN,
        ..AlignmentTuning::default()
    });
    assert!(rejected.is_degraded());
    assert_eq!(ctl.config().tuning.canonical_pitch_deg, -20.0);
}

#[test]
fn test_new_moon_lights_far_side() {
    let mut ctl = controller(0.0);
    let phase = ctl.set_time(Epoch::from_gregorian_utc(2024, 1, 11, 11, 57, 0, 0)).clone();
    assert!(phase.status.is_nominal());
    assert!(phase.illumination < 0.01);
    assert!(phase.sun_dir_render_frame.z < -0.99);

    let uniform = ctl.phase_uniform();
    assert_eq!(uniform.degraded, 0);
    assert!(uniform.sun_dir[2] < -0.99);
}

#[test]
fn test_tick_advances_phase() {
    let mut ctl = controller(0.0);
    ctl.set_time(Epoch::from_gregorian_utc(2024, 1, 11, 11, 57, 0, 0));
    ctl.clock_mut().set_rate_days_per_second(1.0);
    let before = ctl.current_time();
    let phase = ctl.tick(7.0).clone();
    assert!((ctl.current_time() - before).to_seconds() > 6.9 * 86_400.0);
    assert!(phase.waxing);
    assert!(phase.illumination > 0.4 && phase.illumination < 0.65);
    assert!(phase.sun_dir_render_frame.x > 0.9);
}

#[test]
fn test_southern_observer_mirrors_limb() {
    let mut ctl = controller(0.0);
    ctl.set_time(Epoch::from_gregorian_utc(2024, 1, 18, 4, 0, 0, 0));
    let north = ctl.phase().sun_dir_render_frame;
    let south = ctl
        .set_observer(Some(selene_core::GeoCoord::new(-33.9, 151.2)))
        .sun_dir_render_frame;
    assert_abs_diff_eq!(north.x, -south.x, epsilon = 1e-12);
    assert_abs_diff_eq!(north.z, south.z, epsilon = 1e-12);
}

#[test]
fn test_anchors_ignore_body_rotation() {
    let mut ctl = controller(0.0);
    assert!(ctl.add_anchor("label", ScreenAnchor::new(0.15, 0.85, 2.0)).is_nominal());
    let pinned = ctl.anchor("label").unwrap();

    ctl.align_to(AlignmentTarget::new(BEIJING.0, BEIJING.1));
    ctl.tick(0.016);
    assert_eq!(ctl.anchor("label"), Some(pinned));

    assert!(ctl.orbit_camera(0.4, 0.1).is_nominal());
    let moved = ctl.anchor("label").unwrap();
    assert!((moved - pinned).length() > 1e-3);

    let (u, v, _) = ctl.camera().project(moved).unwrap();
    assert_abs_diff_eq!(u, 0.15, epsilon = 1e-9);
    assert_abs_diff_eq!(v, 0.85, epsilon = 1e-9);
}

#[test]
fn test_invalid_camera_rejected() {
    let mut ctl = controller(0.0);
    let before = *ctl.camera();
    let mut broken = before;
    broken.position.x = f64::NAN;

    let status = ctl.set_camera(broken);
    assert!(matches!(status.error(), Some(EngineError::NumericInstability(_))));
    assert_eq!(*ctl.camera(), before);

    let orientation = *ctl.orientation();
    let result = ctl.align_to(AlignmentTarget::new(0.0, 45.0));
    assert!(result.status.is_nominal());
    assert_ne!(*ctl.orientation(), orientation);
}

#[test]
fn test_unavailable_ephemeris_degrades_phase() {
    let offline = |_: &TimeSample| -> EngineResult<EphemerisSample> {
        Err(EngineError::EphemerisUnavailable("no data loaded".into()))
    };
    let mut ctl = AlignmentController::with_ephemeris(EngineConfig::default(), offline, j2024());
    assert!(ctl.phase().status.is_degraded());
    assert_eq!(ctl.phase().illumination, 0.5);
    assert_eq!(ctl.phase_uniform().degraded, 1);

    // Alignment does not depend on the ephemeris
    let result = ctl.align_to(AlignmentTarget::new(BEIJING.0, BEIJING.1));
    assert!(result.status.is_nominal());
    assert!(ctl.tick(1.0).status.is_degraded());
}

#[test]
fn test_camera_override_from_config() {
    let config = EngineConfig::default().with_camera(5.0, 30.0, 1.0);
    let ctl = AlignmentController::new(config, j2024());
    assert_abs_diff_eq!(ctl.camera().position.length(), 5.0, epsilon = 1e-12);
    assert_eq!(*ctl.camera(), Camera::facing_origin(5.0, 30.0, 1.0));
}

#[test]
fn test_orbited_camera_keeps_composition() {
    let target = AlignmentTarget::new(BEIJING.0, BEIJING.1);

    let mut reference = controller(0.0);
    let on_axis = reference.align_to(target);

    let mut ctl = controller(0.0);
    ctl.align_to(target);
    assert!(ctl.orbit_camera(std::f64::consts::FRAC_PI_2, 0.0).is_nominal());
    let orbited = ctl.realign().unwrap();

    assert!(orbited.status.is_nominal());
    assert_abs_diff_eq!(orbited.yaw_delta_rad, std::f64::consts::FRAC_PI_2, epsilon = 1e-9);
    assert_abs_diff_eq!(
        orbited.target_elevation_rad,
        on_axis.target_elevation_rad,
        epsilon = 1e-9
    );

    // The target sits on the same screen spot from either camera
    let surface = |ctl: &AlignmentController| {
        let local = selene_core::CoordinateMapper::to_vector(BEIJING.0, BEIJING.1, 1.0);
        ctl.camera().project(ctl.orientation().rotation * local).unwrap()
    };
    let (u0, v0, _) = surface(&reference);
    let (u1, v1, _) = surface(&ctl);
    assert_abs_diff_eq!(u0, u1, epsilon = 1e-9);
    assert_abs_diff_eq!(v0, v1, epsilon = 1e-9);
}
