use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

/// Simulation step length in seconds.
pub const FIXED_DT: f64 = 1.0 / 60.0;

/// Largest wall-clock delta fed into the accumulator in one frame.
pub const MAX_ACCUMULATOR: f64 = 0.25;

pub struct TimeState {
    pub fixed_dt: f64,
    pub max_accumulator: f64,
    accumulator: f64,
    pub total_time: f64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: f64,
    last_instant: Instant,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TimeState {
    pub fn new() -> Self {
        Self {
            fixed_dt: FIXED_DT,
            max_accumulator: MAX_ACCUMULATOR,
            accumulator: 0.0,
            total_time: 0.0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: 0.0,
            last_instant: Instant::now(),
            fps_samples: [FIXED_DT; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    /// Measure the wall-clock delta since the previous frame and feed it
    /// into the accumulator.
    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let real_dt = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.advance(real_dt);
    }

    /// Feed an explicit delta into the accumulator. `begin_frame` goes through
    /// here; replays and tests call it directly.
    pub fn advance(&mut self, real_dt: f64) {
        self.real_dt = real_dt.max(0.0);

        // Spiral-of-death cap
        if self.real_dt > self.max_accumulator {
            log::warn!(
                "Frame took {:.1}ms, capping accumulator to {}ms",
                self.real_dt * 1000.0,
                self.max_accumulator * 1000.0
            );
            self.real_dt = self.max_accumulator;
        }

        self.accumulator += self.real_dt;
        self.steps_this_frame = 0;
        self.frame_count += 1;

        // FPS smoothing
        self.fps_samples[self.fps_sample_index] = self.real_dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    pub fn should_step(&mut self) -> bool {
        if self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            self.total_time += self.fixed_dt;
            self.fixed_step_count += 1;
            self.steps_this_frame += 1;
            true
        } else {
            false
        }
    }

    /// Time carried over to the next frame.
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Throw away banked time, used while the simulation is paused so that
    /// resuming does not replay the whole pause.
    pub fn discard_accumulator(&mut self) {
        self.accumulator = 0.0;
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(time: &mut TimeState) -> u32 {
        while time.should_step() {}
        time.steps_this_frame
    }

    #[test]
    fn fifty_milliseconds_runs_three_fixed_steps() {
        let mut time = TimeState::new();
        time.advance(0.05);
        assert_eq!(drain(&mut time), 3);
        assert!(time.accumulator() >= 0.0);
        assert!(time.accumulator() < 1e-9);
    }

    #[test]
    fn remainder_carries_into_next_frame() {
        let mut time = TimeState::new();
        time.advance(0.06);
        assert_eq!(drain(&mut time), 3);
        assert!((time.accumulator() - 0.01).abs() < 1e-9);

        // 0.01 banked + 0.01 new still falls short of a step.
        time.advance(0.01);
        assert_eq!(drain(&mut time), 1);
    }

    #[test]
    fn short_frame_runs_no_steps() {
        let mut time = TimeState::new();
        time.advance(0.01);
        assert_eq!(drain(&mut time), 0);
        assert!((time.accumulator() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn long_stall_is_capped() {
        let mut time = TimeState::new();
        time.advance(5.0);
        assert!((time.real_dt - MAX_ACCUMULATOR).abs() < 1e-12);
        // 0.25 / (1/60) = 15 steps, never the 300 an uncapped stall would cause.
        assert_eq!(drain(&mut time), 15);
    }

    #[test]
    fn counters_track_frames_and_steps() {
        let mut time = TimeState::new();
        time.advance(FIXED_DT * 2.5);
        drain(&mut time);
        time.advance(FIXED_DT);
        drain(&mut time);
        assert_eq!(time.frame_count, 2);
        assert_eq!(time.fixed_step_count, 3);
        assert!((time.total_time - 3.0 * FIXED_DT).abs() < 1e-12);
    }

    #[test]
    fn discard_accumulator_drops_banked_time() {
        let mut time = TimeState::new();
        time.advance(0.1);
        time.discard_accumulator();
        assert_eq!(drain(&mut time), 0);
    }
}
