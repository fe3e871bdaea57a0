//! Fixed-timestep clock driven by host frame timestamps.
//!
//! The host hands in monotonic milliseconds (e.g. a `requestAnimationFrame`
//! timestamp). Real deltas are capped at `max_frame_dt`, fed into an
//! accumulator, and drained in `fixed_dt` slices via [`TimeState::should_step`].

const FPS_SAMPLE_COUNT: usize = 60;

pub const DEFAULT_FIXED_DT: f64 = 1.0 / 120.0;
pub const DEFAULT_MAX_FRAME_DT: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct TimeState {
    pub fixed_dt: f64,
    pub max_frame_dt: f64,
    accumulator: f64,
    pub total_time: f64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: f64,
    last_ms: Option<f64>,
    pub interpolation_alpha: f64,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TimeState {
    pub fn new(fixed_dt: f64, max_frame_dt: f64) -> Self {
        Self {
            fixed_dt,
            max_frame_dt,
            accumulator: 0.0,
            total_time: 0.0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: 0.0,
            last_ms: None,
            interpolation_alpha: 0.0,
            fps_samples: [fixed_dt; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 1.0 / fixed_dt,
            smoothed_frame_time_ms: fixed_dt * 1000.0,
        }
    }

    /// Measures the delta since the previous frame and, unless `paused`,
    /// feeds it into the accumulator. The first frame after construction or
    /// [`Self::reset`] always measures zero.
    pub fn begin_frame(&mut self, now_ms: f64, paused: bool) {
        let raw_dt = match self.last_ms {
            Some(last) if now_ms.is_finite() => ((now_ms - last) / 1000.0).max(0.0),
            _ => 0.0,
        };
        if now_ms.is_finite() {
            self.last_ms = Some(now_ms);
        }

        // Spiral-of-death cap
        self.real_dt = if raw_dt > self.max_frame_dt {
            log::debug!(
                "Frame took {:.1}ms, capping to {:.1}ms",
                raw_dt * 1000.0,
                self.max_frame_dt * 1000.0
            );
            self.max_frame_dt
        } else {
            raw_dt
        };

        if !paused {
            self.accumulator += self.real_dt;
        }
        self.steps_this_frame = 0;
        self.frame_count += 1;

        // FPS smoothing
        if self.real_dt > 0.0 {
            self.fps_samples[self.fps_sample_index] = self.real_dt;
            self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
            let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
            self.smoothed_frame_time_ms = avg_dt * 1000.0;
            self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
        }
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

    pub fn end_frame(&mut self) {
        self.interpolation_alpha = self.accumulator / self.fixed_dt;
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Forgets the previous timestamp so the next frame measures zero.
    pub fn reset(&mut self) {
        self.last_ms = None;
        self.accumulator = 0.0;
        self.steps_this_frame = 0;
        self.interpolation_alpha = 0.0;
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new(DEFAULT_FIXED_DT, DEFAULT_MAX_FRAME_DT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(time: &mut TimeState) -> u32 {
        let mut steps = 0;
        while time.should_step() {
            steps += 1;
        }
        time.end_frame();
        steps
    }

    #[test]
    fn test_first_frame_measures_zero() {
        let mut time = TimeState::default();
        time.begin_frame(12_345.0, false);
        assert_eq!(time.real_dt, 0.0);
        assert_eq!(drain(&mut time), 0);
    }

    #[test]
    fn test_steps_follow_elapsed_time() {
        let mut time = TimeState::default();
        time.begin_frame(0.0, false);
        drain(&mut time);
        // 30ms at 120Hz is three whole steps plus a remainder.
        time.begin_frame(30.0, false);
        assert_eq!(drain(&mut time), 3);
        assert!(time.interpolation_alpha >= 0.0 && time.interpolation_alpha < 1.0);
        assert_eq!(time.fixed_step_count, 3);
    }

    #[test]
    fn test_long_frame_is_capped() {
        let mut time = TimeState::default();
        time.begin_frame(0.0, false);
        time.begin_frame(2_000.0, false);
        assert!((time.real_dt - DEFAULT_MAX_FRAME_DT).abs() < 1e-12);
        // 0.05s / (1/120) sits right on the sixth step boundary.
        let steps = drain(&mut time);
        assert!((5..=6).contains(&steps), "{steps}");
    }

    #[test]
    fn test_paused_frames_do_not_feed_accumulator() {
        let mut time = TimeState::default();
        time.begin_frame(0.0, false);
        time.begin_frame(40.0, true);
        assert!(time.real_dt > 0.0);
        assert_eq!(time.accumulator(), 0.0);
        assert_eq!(drain(&mut time), 0);
    }

    #[test]
    fn test_backwards_timestamp_reads_as_zero() {
        let mut time = TimeState::default();
        time.begin_frame(100.0, false);
        time.begin_frame(50.0, false);
        assert_eq!(time.real_dt, 0.0);
    }

    #[test]
    fn test_reset_restarts_delta_measurement() {
        let mut time = TimeState::default();
        time.begin_frame(0.0, false);
        time.begin_frame(16.0, false);
        time.reset();
        time.begin_frame(5_000.0, false);
        assert_eq!(time.real_dt, 0.0);
        assert_eq!(time.accumulator(), 0.0);
    }

    #[test]
    fn test_fps_smoothing_converges() {
        let mut time = TimeState::default();
        let mut now = 0.0;
        for _ in 0..(FPS_SAMPLE_COUNT + 1) {
            time.begin_frame(now, false);
            drain(&mut time);
            now += 1000.0 / 60.0;
        }
        assert!((time.smoothed_fps - 60.0).abs() < 0.5, "{}", time.smoothed_fps);
    }
}
