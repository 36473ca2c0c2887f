use crate::config::simulation::SimulationConfig;

/// Longest frame the driver will account for, in milliseconds.
pub const MAX_FRAME_MS: f64 = 200.0;

/// Turns elapsed wall-clock time into a whole number of ticks.
///
/// Each call adds the scaled frame time to an accumulator and pays out at
/// most `max_catchup` ticks. Backlog beyond two ticks after the payout is
/// dropped so a stalled host never triggers a burst of catch-up work.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedStepDriver {
    tick_ms: f64,
    max_catchup: u32,
    speed: f64,
    accumulator: f64,
}

impl FixedStepDriver {
    pub fn new(tick_ms: u32, max_catchup: u32, speed: f64) -> Self {
        FixedStepDriver {
            tick_ms: tick_ms.max(1) as f64,
            max_catchup: max_catchup.max(1),
            speed: sanitize_speed(speed),
            accumulator: 0.0,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.tick_ms, config.max_catchup_ticks, config.sim_speed as f64)
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// 0 pauses the simulation.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = sanitize_speed(speed);
    }

    pub fn is_paused(&self) -> bool {
        self.speed == 0.0
    }

    pub fn tick_ms(&self) -> f64 {
        self.tick_ms
    }

    /// Ticks due after `elapsed_ms` of wall-clock time.
    pub fn ticks_for(&mut self, elapsed_ms: f64) -> u32 {
        if self.is_paused() {
            return 0;
        }
        let dt = if elapsed_ms.is_finite() {
            elapsed_ms.clamp(0.0, MAX_FRAME_MS)
        } else {
            0.0
        };
        self.accumulator += dt * self.speed;

        let mut ticks = 0;
        while self.accumulator >= self.tick_ms && ticks < self.max_catchup {
            self.accumulator -= self.tick_ms;
            ticks += 1;
        }
        if self.accumulator > self.tick_ms * 2.0 {
            self.accumulator = 0.0;
        }
        ticks
    }
}

fn sanitize_speed(speed: f64) -> f64 {
    if speed.is_finite() && speed > 0.0 { speed } else { 0.0 }
}
