//! Simulation clock
//!
//! Accumulates real elapsed time and propagates every satellite once the
//! accumulator crosses the update interval, scaled by the speed-up factor.
//! With the default 0.2 s interval that is at most 5 propagations per second
//! no matter how often the host ticks.

use std::time::Instant;

use serde::Serialize;
use tracing::trace;

use crate::store::TopologyStore;
use crate::{Result, TopologyError};

pub const DEFAULT_UPDATE_INTERVAL_S: f64 = 0.2;
pub const DEFAULT_SPEED_UP: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockConfig {
    pub update_interval_s: f64,
    pub speed_up: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            update_interval_s: DEFAULT_UPDATE_INTERVAL_S,
            speed_up: DEFAULT_SPEED_UP,
        }
    }
}

impl ClockConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.update_interval_s.is_finite() && self.update_interval_s > 0.0) {
            return Err(TopologyError::InvalidClock(format!(
                "update interval must be positive, got {}",
                self.update_interval_s
            )));
        }
        if !(self.speed_up.is_finite() && self.speed_up >= 1.0) {
            return Err(TopologyError::InvalidClock(format!(
                "speed-up must be >= 1, got {}",
                self.speed_up
            )));
        }
        Ok(())
    }
}

/// Outcome of one host tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TickReport {
    /// Simulated seconds applied this tick (0 when below the interval)
    pub simulated_dt_s: f64,
    pub satellites_moved: usize,
}

#[derive(Debug)]
pub struct SimulationClock {
    config: ClockConfig,
    last_observed: Option<Instant>,
    accumulator_s: f64,
    running: bool,
    simulated_total_s: f64,
    steps: u64,
}

impl SimulationClock {
    pub fn new(config: ClockConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            last_observed: None,
            accumulator_s: 0.0,
            running: true,
            simulated_total_s: 0.0,
            steps: 0,
        })
    }

    pub fn config(&self) -> ClockConfig {
        self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn simulated_seconds(&self) -> f64 {
        self.simulated_total_s
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Resume ticking. Time spent stopped is not replayed.
    pub fn start(&mut self) {
        self.running = true;
        self.last_observed = None;
        self.accumulator_s = 0.0;
    }

    /// Feed a real elapsed duration. Returns the scaled simulated Δt when the
    /// accumulator crosses the interval.
    pub fn advance(&mut self, real_dt_s: f64) -> Option<f64> {
        if !self.running || !(real_dt_s.is_finite() && real_dt_s > 0.0) {
            return None;
        }

        self.accumulator_s += real_dt_s;
        if self.accumulator_s < self.config.update_interval_s {
            return None;
        }

        let sim_dt = self.accumulator_s * self.config.speed_up;
        self.accumulator_s = 0.0;
        self.simulated_total_s += sim_dt;
        self.steps += 1;
        Some(sim_dt)
    }

    /// Observe a host timestamp. The first observation only records it.
    pub fn observe(&mut self, now: Instant) -> Option<f64> {
        if !self.running {
            return None;
        }
        let previous = self.last_observed.replace(now)?;
        let real_dt = now.saturating_duration_since(previous).as_secs_f64();
        self.advance(real_dt)
    }

    /// Observe `now` and propagate the store's satellites when due
    pub fn tick(&mut self, now: Instant, store: &mut TopologyStore) -> Result<TickReport> {
        let Some(dt) = self.observe(now) else {
            return Ok(TickReport::default());
        };

        let moved = store.propagate_satellites(dt)?;
        trace!("Clock step {}: dt={:.3}s, {} satellites moved", self.steps, dt, moved);

        Ok(TickReport {
            simulated_dt_s: dt,
            satellites_moved: moved,
        })
    }
}
