//! Playback clock that drives per-frame phase updates

use hifitime::{Duration, Epoch};

use crate::ephemeris::TimeSample;

/// Mean synodic month in days
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_853;

/// Variable-rate simulation clock
pub struct TimeController {
    current: Epoch,
    min_epoch: Epoch,
    max_epoch: Epoch,
    /// Simulated seconds per real second; negative runs backwards
    rate: f64,
    paused: bool,
}

impl TimeController {
    /// Clock at `epoch`, running in real time, limited to ±5000 years
    /// around J2000
    pub fn at_epoch(epoch: Epoch) -> Self {
        let j2000 = Epoch::from_gregorian_utc(2000, 1, 1, 12, 0, 0, 0);
        let mut tc = Self {
            current: epoch,
            min_epoch: j2000 - Duration::from_days(5000.0 * 365.25),
            max_epoch: j2000 + Duration::from_days(5000.0 * 365.25),
            rate: rates::REALTIME,
            paused: false,
        };
        tc.set_time(epoch);
        tc
    }

    pub fn current(&self) -> Epoch {
        self.current
    }

    /// Snapshot handed to the ephemeris for this frame
    pub fn sample(&self) -> TimeSample {
        TimeSample::new(self.current)
    }

    pub fn set_time(&mut self, epoch: Epoch) {
        self.current = epoch.clamp(self.min_epoch, self.max_epoch);
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn set_rate(&mut self, rate: f64) {
        if rate.is_finite() {
            self.rate = rate.clamp(-1e9, 1e9);
        } else {
            tracing::warn!("Ignoring non-finite time rate {}", rate);
        }
    }

    pub fn set_rate_days_per_second(&mut self, days: f64) {
        self.set_rate(days * 86400.0);
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Advance by a real-world frame delta; returns the new epoch
    pub fn tick(&mut self, real_dt_seconds: f64) -> Epoch {
        if self.paused || !real_dt_seconds.is_finite() {
            return self.current;
        }

        let sim_dt = real_dt_seconds * self.rate;
        if !sim_dt.is_finite() {
            tracing::warn!(
                "Frame step of {} s at rate {} overflows; clock held",
                real_dt_seconds,
                self.rate
            );
            return self.current;
        }

        // Nothing past the window span can land inside it
        let span = (self.max_epoch - self.min_epoch).to_seconds();
        let sim_dt = sim_dt.clamp(-span, span);
        self.current = (self.current + Duration::from_seconds(sim_dt))
            .clamp(self.min_epoch, self.max_epoch);

        self.current
    }

    pub fn jump(&mut self, duration: Duration) {
        self.current = (self.current + duration).clamp(self.min_epoch, self.max_epoch);
    }

    /// Step a whole number of synodic months forward (or back)
    pub fn jump_lunations(&mut self, count: i32) {
        self.jump(Duration::from_days(count as f64 * SYNODIC_MONTH_DAYS));
    }
}

impl Default for TimeController {
    fn default() -> Self {
        Self::at_epoch(Epoch::from_gregorian_utc(2000, 1, 1, 12, 0, 0, 0))
    }
}

/// Preset playback rates
pub mod rates {
    pub const REALTIME: f64 = 1.0;
    pub const HOUR_PER_SEC: f64 = 3600.0;
    pub const DAY_PER_SEC: f64 = 86400.0;
    /// One synodic month per minute of viewing
    pub const LUNATION_PER_MINUTE: f64 = super::SYNODIC_MONTH_DAYS * 86400.0 / 60.0;
}
