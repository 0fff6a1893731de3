//! Simulation time for the render loop.

/// Milliseconds per frame at the 60 Hz reference rate.
const FRAME_MS: f64 = 1000.0 / 60.0;

/// Smallest per-step advance, in 60 Hz frames.
pub const MIN_STEP: f32 = 0.2;
/// Largest per-step advance, in 60 Hz frames.
pub const MAX_STEP: f32 = 5.0;

/// Seconds per 60 Hz frame, as exposed to shader-style time uniforms.
const SECONDS_PER_FRAME: f32 = 0.016667;

/// Elapsed simulated time, in 60 Hz frames.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Raw accumulated frames.
    pub t: f32,
    /// Frames scaled by the speed multiplier.
    pub t2: f32,
}

impl FrameTime {
    /// Speed-scaled time in seconds.
    pub fn seconds(&self) -> f32 {
        self.t2 * SECONDS_PER_FRAME
    }
}

/// Accumulates clamped wall-clock deltas into [`FrameTime`].
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    time: FrameTime,
    prev_now: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to wall-clock time `now_ms`. The first call only records the
    /// timestamp. Returns the clamped delta in 60 Hz frames.
    pub fn advance(&mut self, now_ms: f64, speed: f32) -> Option<f32> {
        let delta = self.prev_now.map(|prev| {
            let frames = ((now_ms - prev) / FRAME_MS) as f32;
            // NaN from a broken timestamp clamps to the minimum step
            frames.max(MIN_STEP).min(MAX_STEP)
        });
        if let Some(delta) = delta {
            self.time.t += delta;
            self.time.t2 += speed * delta;
        }
        self.prev_now = Some(now_ms);
        delta
    }

    pub fn time(&self) -> FrameTime {
        self.time
    }
}

/// Frame counter and rolling rate for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    frames: u64,
    window_start: Option<f64>,
    window_frames: u32,
    fps: f32,
}

impl FrameStats {
    /// Record a rendered frame at `now_ms`. Returns the new rate whenever a
    /// one-second window completes.
    pub fn record(&mut self, now_ms: f64) -> Option<f32> {
        self.frames += 1;
        self.window_frames += 1;
        let start = *self.window_start.get_or_insert(now_ms);
        let span = now_ms - start;
        if span >= 1000.0 {
            self.fps = (f64::from(self.window_frames) * 1000.0 / span) as f32;
            self.window_start = Some(now_ms);
            self.window_frames = 0;
            return Some(self.fps);
        }
        None
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_only_records_timestamp() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(1234.0, 1.0), None);
        assert_eq!(clock.time(), FrameTime::default());
    }

    #[test]
    fn normal_frame_is_one_unit() {
        let mut clock = FrameClock::new();
        clock.advance(0.0, 1.0);
        let delta = clock.advance(FRAME_MS, 1.0).unwrap();
        assert!((delta - 1.0).abs() < 1e-5);
    }

    #[test]
    fn long_stall_is_clamped_to_max() {
        let mut clock = FrameClock::new();
        clock.advance(0.0, 1.0);
        assert_eq!(clock.advance(10_000.0, 1.0), Some(MAX_STEP));
        assert_eq!(clock.time().t, MAX_STEP);
    }

    #[test]
    fn duplicate_timestamp_is_clamped_to_min() {
        let mut clock = FrameClock::new();
        clock.advance(500.0, 1.0);
        assert_eq!(clock.advance(500.0, 1.0), Some(MIN_STEP));
    }

    #[test]
    fn clock_going_backwards_is_clamped_to_min() {
        let mut clock = FrameClock::new();
        clock.advance(500.0, 1.0);
        assert_eq!(clock.advance(100.0, 1.0), Some(MIN_STEP));
    }

    #[test]
    fn speed_scales_only_t2() {
        let mut clock = FrameClock::new();
        clock.advance(0.0, 2.0);
        clock.advance(FRAME_MS * 2.0, 2.0);
        let time = clock.time();
        assert!((time.t - 2.0).abs() < 1e-5);
        assert!((time.t2 - 4.0).abs() < 1e-5);
        assert!((time.seconds() - 4.0 * 0.016667).abs() < 1e-6);
    }

    #[test]
    fn stats_report_rate_once_per_second() {
        let mut stats = FrameStats::default();
        assert_eq!(stats.record(0.0), None);
        assert_eq!(stats.record(500.0), None);
        assert_eq!(stats.record(1000.0), Some(3.0));
        assert_eq!(stats.record(1100.0), None);
        assert_eq!(stats.frames(), 4);
        assert_eq!(stats.fps(), 3.0);
    }
}
