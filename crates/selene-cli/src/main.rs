use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hifitime::{Duration, Epoch};
use selene_core::{CoordinateMapper, GeoCoord, RenderFrameCalibration};
use selene_engine::{
    project_anchor, AlignmentController, AlignmentTarget, EngineConfig, ScreenAnchor,
};
use selene_sim::{
    AnalyticEphemeris, EphemerisProvider, EphemerisSample, PhaseGeometryResolver, PhaseState,
    TimeSample,
};
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Longest table `lunation` will print (about 27 years)
const MAX_LUNATION_DAYS: f64 = 10_000.0;
const MAX_LUNATION_ROWS: usize = 100_000;

#[derive(Parser)]
#[command(name = "selene")]
#[command(about = "Moon phase and alignment engine")]
struct Cli {
    /// Engine config (JSON); defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the lunar phase at an epoch
    Phase {
        /// Epoch (ISO format or "now")
        #[arg(short, long, default_value = "now")]
        epoch: String,
        /// Observer latitude (degrees); a southern observer mirrors the lit limb
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Observer longitude (degrees)
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Tabulate the phase over a span of days
    Lunation {
        #[arg(short, long, default_value = "now")]
        epoch: String,
        /// Span to cover (days)
        #[arg(long, default_value = "29.5")]
        days: f64,
        /// Step between rows (hours)
        #[arg(long, default_value = "24")]
        step_hours: f64,
    },

    /// Solve the alignment rotation for a target, optionally followed by a
    /// second target from the resulting orientation
    Align {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        then_lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        then_lon: Option<f64>,
        /// Override the canonical pitch (degrees)
        #[arg(long, allow_hyphen_values = true)]
        pitch: Option<f64>,
    },

    /// Place a screen anchor in world space for the configured camera
    Anchor {
        /// Horizontal screen position (0 = left, 1 = right)
        #[arg(short, long)]
        u: f64,
        /// Vertical screen position (0 = top, 1 = bottom)
        #[arg(short, long)]
        v: f64,
        /// Distance from the camera (body radii)
        #[arg(short, long, default_value = "1.5")]
        distance: f64,
    },

    /// Map a geographic coordinate onto the unit sphere and back
    Map {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Render-frame longitude offset (degrees)
        #[arg(long, allow_hyphen_values = true, default_value = "0")]
        offset: f64,
    },

    /// Print the effective engine config as JSON
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {:?}", path))?,
        None => EngineConfig::default(),
    };
    tracing::debug!("Engine config: {:?}", config);

    match cli.command {
        Commands::Phase { epoch, lat, lon } => {
            let epoch = parse_epoch(&epoch)?;
            let observer = match (lat, lon) {
                (Some(lat), Some(lon)) => Some(GeoCoord::new(lat, lon)),
                (None, None) => config.observer,
                _ => anyhow::bail!("--lat and --lon must be given together"),
            };

            let (phase, sample) = evaluate_phase(epoch, observer.as_ref());

            println!("Moon at {}:", epoch);
            println!("  Phase:          {}", phase.name());
            println!("  Illumination:   {:.2}%", phase.illumination * 100.0);
            println!("  Elongation:     {:.2}°", phase.phase_angle_rad.to_degrees());
            if let Some(sample) = sample {
                println!("  Phase angle i:  {:.2}°", sample.phase_angle_deg);
            }
            println!("  Position angle: {:.2}°", phase.position_angle_rad.to_degrees());
            let sun = phase.sun_dir_render_frame;
            println!("  Render sun:     ({:+.4}, {:+.4}, {:+.4})", sun.x, sun.y, sun.z);
            if phase.status.is_degraded() {
                println!("  Status:         {}", phase.status);
            }
        }

        Commands::Lunation { epoch, days, step_hours } => {
            let start = parse_epoch(&epoch)?;
            let epochs = lunation_epochs(start, days, step_hours)?;
            let mut ctl = AlignmentController::new(config, start);

            println!(
                "{:<32} {:>8} {:>10} {:>10}  {}",
                "Epoch", "Illum %", "Elong °", "PA °", "Phase"
            );
            for t in epochs {
                let phase = ctl.set_time(t);
                println!(
                    "{:<32} {:>8.2} {:>10.2} {:>10.2}  {}",
                    t.to_string(),
                    phase.illumination * 100.0,
                    phase.phase_angle_rad.to_degrees(),
                    phase.position_angle_rad.to_degrees(),
                    phase.name()
                );
            }
        }

        Commands::Align { lat, lon, then_lat, then_lon, pitch } => {
            let j2000 = Epoch::from_gregorian_utc(2000, 1, 1, 12, 0, 0, 0);
            let mut ctl = AlignmentController::new(config, j2000);
            let mut targets = vec![AlignmentTarget::new(lat, lon)];
            match (then_lat, then_lon) {
                (Some(lat), Some(lon)) => targets.push(AlignmentTarget::new(lat, lon)),
                (None, None) => {}
                _ => anyhow::bail!("--then-lat and --then-lon must be given together"),
            }

            println!(
                "{:>9} {:>10} {:>10} {:>10} {:>12}  {}",
                "Lat °", "Lon °", "Yaw Δ °", "Pitch °", "Elevation °", "Status"
            );
            for target in targets {
                let target = match pitch {
                    Some(p) => target.with_pitch(p),
                    None => target,
                };
                let result = ctl.align_to(target);
                println!(
                    "{:>9.3} {:>10.3} {:>10.4} {:>10.3} {:>12.3}  {}",
                    target.lat_deg,
                    target.lon_deg,
                    result.yaw_delta_rad.to_degrees(),
                    result.pitch_rad.to_degrees(),
                    result.target_elevation_rad.to_degrees(),
                    result.status
                );
            }
            let q = ctl.orientation().rotation;
            println!("\nFinal rotation: ({:.6}, {:.6}, {:.6}, {:.6})", q.x, q.y, q.z, q.w);
        }

        Commands::Anchor { u, v, distance } => {
            let camera = config.camera();
            let anchor = ScreenAnchor::new(u, v, distance);
            let pos = project_anchor(&camera, &anchor)?;

            let cam = camera.position;
            println!("Camera at ({:.4}, {:.4}, {:.4})", cam.x, cam.y, cam.z);
            println!(
                "Anchor ({:.3}, {:.3}) at {} → ({:+.6}, {:+.6}, {:+.6})",
                u, v, distance, pos.x, pos.y, pos.z
            );
        }

        Commands::Map { lat, lon, offset } => {
            let mapper = CoordinateMapper::new(RenderFrameCalibration::new(offset));
            let geo = GeoCoord::new(lat, lon);
            let v = CoordinateMapper::to_vector(geo.lat_deg, geo.lon_deg, 1.0);
            let render = mapper.to_render_vector(geo);
            let back = CoordinateMapper::to_lat_lon(v)?;

            println!("Input:    ({:.6}°, {:.6}°)", lat, lon);
            println!("Sphere:   ({:+.6}, {:+.6}, {:+.6})", v.x, v.y, v.z);
            println!("Render:   ({:+.6}, {:+.6}, {:+.6})", render.x, render.y, render.z);
            println!("Inverse:  ({:.6}°, {:.6}°)", back.lat_deg, back.lon_deg);
        }

        Commands::Config => {
            println!("{}", config.to_json()?);
        }
    }

    Ok(())
}

fn parse_epoch(s: &str) -> Result<Epoch> {
    if s.eq_ignore_ascii_case("now") {
        return Ok(Epoch::now()?);
    }
    Epoch::from_str(s).with_context(|| format!("invalid epoch '{}'", s))
}

/// Phase at `epoch` plus the raw sample when the ephemeris covers it. An
/// uncovered epoch yields the resolver's degraded fallback, not an error.
fn evaluate_phase(
    epoch: Epoch,
    observer: Option<&GeoCoord>,
) -> (PhaseState, Option<EphemerisSample>) {
    let ephemeris = AnalyticEphemeris::new();
    let time = TimeSample::new(epoch);
    let resolver = PhaseGeometryResolver::new();
    match ephemeris.sample(&time) {
        Ok(sample) => (resolver.resolve_sample_at(&sample, &time, observer), Some(sample)),
        Err(_) => (resolver.resolve(&ephemeris, &time, observer), None),
    }
}

/// Row epochs for the `lunation` table, from `start` through `start + days`
fn lunation_epochs(start: Epoch, days: f64, step_hours: f64) -> Result<Vec<Epoch>> {
    if !days.is_finite() || !(0.0..=MAX_LUNATION_DAYS).contains(&days) {
        anyhow::bail!("--days must be between 0 and {}", MAX_LUNATION_DAYS);
    }
    if !step_hours.is_finite() || step_hours <= 0.0 {
        anyhow::bail!("--step-hours must be a positive number");
    }
    let rows = (days * 24.0 / step_hours).floor();
    if rows >= MAX_LUNATION_ROWS as f64 {
        anyhow::bail!(
            "{} days at {} h steps is more than {} rows",
            days,
            step_hours,
            MAX_LUNATION_ROWS
        );
    }
    let step = Duration::from_hours(step_hours);
    if step == Duration::ZERO {
        anyhow::bail!("--step-hours {} is below the clock resolution", step_hours);
    }

    let end = start + Duration::from_days(days);
    let mut epochs = Vec::with_capacity(rows as usize + 1);
    let mut t = start;
    while t <= end && epochs.len() <= MAX_LUNATION_ROWS {
        epochs.push(t);
        t = t + step;
    }
    Ok(epochs)
}
