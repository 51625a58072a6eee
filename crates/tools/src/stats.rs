use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Frames-per-second counter plus a bounded window of recent frame times.
///
/// Call [`PerfStats::update`] once per frame. FPS is recomputed once per
/// second from the number of updates in that second.
#[derive(Debug)]
pub struct PerfStats {
    frame_times: VecDeque<Duration>,
    history: usize,
    last: Option<Instant>,
    window_start: Option<Instant>,
    frames_in_window: u32,
    fps: f32,
    total_frames: u64,
}

impl Default for PerfStats {
    fn default() -> Self {
        Self::new(120)
    }
}

impl PerfStats {
    /// `history` is the number of frame times kept for avg/min/max.
    pub fn new(history: usize) -> Self {
        let history = history.max(1);
        Self {
            frame_times: VecDeque::with_capacity(history),
            history,
            last: None,
            window_start: None,
            frames_in_window: 0,
            fps: 0.0,
            total_frames: 0,
        }
    }

    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    /// Take a sample at `now`. Exposed so callers with their own clock can drive it.
    pub fn update_at(&mut self, now: Instant) {
        self.total_frames += 1;
        if let Some(prev) = self.last.replace(now) {
            if self.frame_times.len() == self.history {
                self.frame_times.pop_front();
            }
            self.frame_times.push_back(now.saturating_duration_since(prev));
        }

        let start = *self.window_start.get_or_insert(now);
        self.frames_in_window += 1;
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= Duration::from_secs(1) {
            // The sample that closes the window belongs to the next one.
            self.fps = (self.frames_in_window - 1) as f32 / elapsed.as_secs_f32();
            self.window_start = Some(now);
            self.frames_in_window = 1;
            tracing::trace!(fps = self.fps, "fps window closed");
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Frame times currently in the window, oldest first.
    pub fn frame_times(&self) -> impl Iterator<Item = Duration> + '_ {
        self.frame_times.iter().copied()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let ms = |d: Duration| d.as_secs_f32() * 1000.0;
        let avg = match self.frame_times.len() {
            0 => Duration::ZERO,
            n => self.frame_times.iter().sum::<Duration>() / n as u32,
        };
        StatsSnapshot {
            fps: self.fps,
            frame_ms_avg: ms(avg),
            frame_ms_min: ms(self.frame_times().min().unwrap_or_default()),
            frame_ms_max: ms(self.frame_times().max().unwrap_or_default()),
            total_frames: self.total_frames,
        }
    }
}

/// Point-in-time view of [`PerfStats`] for overlays and reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub fps: f32,
    pub frame_ms_avg: f32,
    pub frame_ms_min: f32,
    pub frame_ms_max: f32,
    pub total_frames: u64,
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.0} FPS ({:.1} ms avg, {:.1}-{:.1} ms)",
            self.fps, self.frame_ms_avg, self.frame_ms_min, self.frame_ms_max
        )
    }
}
