//! Virtual frame clock for headless replay.

use retrace_env::TickPhase;
use std::time::Duration;

/// Frame clock backed by virtual time.
///
/// Unlike a real host, frames are produced on demand with a fixed `dt`, so
/// a headless run is reproducible frame for frame.
#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Fixed frame length
    frame_dt: Duration,

    /// Frames delivered so far
    frame: u64,

    /// Virtual time since the clock started (nanoseconds)
    elapsed_ns: u64,
}

impl FrameClock {
    /// Creates a clock delivering `fps` frames per virtual second.
    pub fn new(fps: u32) -> Self {
        let fps = fps.max(1);
        Self {
            frame_dt: Duration::from_secs_f64(1.0 / fps as f64),
            frame: 0,
            elapsed_ns: 0,
        }
    }

    /// Advances one frame and returns its length in seconds.
    pub fn next_frame(&mut self) -> f64 {
        self.frame += 1;
        self.elapsed_ns += self.frame_dt.as_nanos() as u64;
        self.frame_dt.as_secs_f64()
    }

    /// Phases delivered within every frame, in order.
    pub fn phases(&self) -> [TickPhase; 3] {
        TickPhase::all()
    }

    /// Fixed frame length in seconds.
    pub fn dt(&self) -> f64 {
        self.frame_dt.as_secs_f64()
    }

    /// Frames delivered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Virtual time since the clock started.
    pub fn now(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns)
    }

    /// Back to frame 0.
    pub fn reset(&mut self) {
        self.frame = 0;
        self.elapsed_ns = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_clock_time() {
        let mut clock = FrameClock::new(50);
        assert_eq!(clock.now(), Duration::ZERO);

        let dt = clock.next_frame();
        assert!((dt - 0.02).abs() < 1e-9);
        assert_eq!(clock.frame(), 1);

        for _ in 0..49 {
            clock.next_frame();
        }
        assert_eq!(clock.now(), Duration::from_secs(1));
    }

    #[test]
    fn test_frame_clock_reset() {
        let mut clock = FrameClock::new(30);
        clock.next_frame();
        clock.reset();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_zero_fps_is_one() {
        let clock = FrameClock::new(0);
        assert_eq!(clock.dt(), 1.0);
    }
}
