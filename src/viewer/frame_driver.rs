use std::time::{Duration, Instant};

use crate::viewer::ViewerState;

/// Monotonic time source for the frame loop.
pub trait FrameClock {
    fn now(&self) -> Duration;
}

pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Whatever turns a [`ViewerState`] into pixels.
pub trait FrameSink {
    type Error;

    fn render_frame(&mut self, state: &ViewerState) -> Result<(), Self::Error>;
}

/// Counts frames and publishes a rate once at least a second has passed since the last sample.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frames: u32,
    last_sample: Duration,
}

impl FpsCounter {
    pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(1000);

    pub fn new(now: Duration) -> Self {
        Self {
            frames: 0,
            last_sample: now,
        }
    }

    pub fn tick(&mut self, now: Duration) -> Option<f32> {
        self.frames += 1;

        let elapsed = now.saturating_sub(self.last_sample);
        if elapsed < Self::SAMPLE_INTERVAL {
            return None;
        }

        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let fps = (self.frames as f64 / elapsed_ms * 1000.0) as f32;

        self.frames = 0;
        self.last_sample = now;

        Some(fps)
    }
}

pub struct FrameDriver<C: FrameClock> {
    clock: C,
    fps: FpsCounter,
}

impl<C: FrameClock> FrameDriver<C> {
    pub fn new(clock: C) -> Self {
        let fps = FpsCounter::new(clock.now());
        Self { clock, fps }
    }

    /// Starts a fresh FPS sample from now, so time spent before the first frame is not counted.
    pub fn restart(&mut self) {
        self.fps = FpsCounter::new(self.clock.now());
    }

    /// One display refresh: updates the FPS estimate, then renders unconditionally.
    pub fn tick<S: FrameSink>(
        &mut self,
        state: &mut ViewerState,
        sink: &mut S,
    ) -> Result<(), S::Error> {
        if let Some(fps) = self.fps.tick(self.clock.now()) {
            log::trace!("{:.1} fps", fps);
            state.stats.fps = Some(fps);
        }

        sink.render_frame(state)
    }
}
