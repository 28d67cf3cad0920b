//! Countdown timer and stopwatch arithmetic.
//!
//! Both types are clock-free: callers drive the countdown with [`Countdown::tick`]
//! once per second and feed the stopwatch monotonic millisecond readings.

pub const DEFAULT_COUNTDOWN_SECS: u64 = 25 * 60;
pub const MIN_COUNTDOWN_SECS: u64 = 60;
/// 99 hours 59 minutes.
pub const MAX_COUNTDOWN_SECS: u64 = 359_940;
pub const PRESET_MINUTES: [u64; 4] = [5, 15, 25, 45];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    initial_secs: u64,
    remaining_secs: u64,
    running: bool,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN_SECS)
    }
}

impl Countdown {
    pub const fn new(seconds: u64) -> Self {
        Self {
            initial_secs: seconds,
            remaining_secs: seconds,
            running: false,
        }
    }

    pub const fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub const fn initial_secs(&self) -> u64 {
        self.initial_secs
    }

    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Starting at zero does nothing.
    pub fn start(&mut self) {
        self.running = self.remaining_secs > 0;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn toggle(&mut self) {
        if self.running {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Shift the duration by `delta_secs`. Ignored while running.
    pub fn adjust(&mut self, delta_secs: i64) {
        if self.running {
            return;
        }
        let current = i64::try_from(self.remaining_secs).unwrap_or(i64::MAX);
        let target = current.saturating_add(delta_secs);
        let clamped = u64::try_from(target)
            .unwrap_or(0)
            .clamp(MIN_COUNTDOWN_SECS, MAX_COUNTDOWN_SECS);
        self.remaining_secs = clamped;
        self.initial_secs = clamped;
    }

    pub fn set_preset(&mut self, minutes: u64) {
        *self = Self::new(minutes.saturating_mul(60));
    }

    /// Advance one second. Returns `true` on the tick that reaches zero.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.running = false;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.remaining_secs = self.initial_secs;
    }

    /// Fraction of the duration still remaining, in `[0, 1]`.
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        if self.initial_secs == 0 {
            return 0.0;
        }
        self.remaining_secs as f64 / self.initial_secs as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stopwatch {
    accumulated_ms: u64,
    started_at_ms: Option<u64>,
    laps: Vec<u64>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn is_running(&self) -> bool {
        self.started_at_ms.is_some()
    }

    pub fn start(&mut self, now_ms: u64) {
        if self.started_at_ms.is_none() {
            self.started_at_ms = Some(now_ms);
        }
    }

    pub fn pause(&mut self, now_ms: u64) {
        if let Some(started) = self.started_at_ms.take() {
            self.accumulated_ms += now_ms.saturating_sub(started);
        }
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        self.accumulated_ms
            + self
                .started_at_ms
                .map_or(0, |started| now_ms.saturating_sub(started))
    }

    /// Record a lap while running; laps are kept newest first.
    pub fn lap(&mut self, now_ms: u64) -> Option<u64> {
        if !self.is_running() {
            return None;
        }
        let elapsed = self.elapsed_ms(now_ms);
        self.laps.insert(0, elapsed);
        Some(elapsed)
    }

    pub fn laps(&self) -> &[u64] {
        &self.laps
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// `MM:SS`; minutes are not wrapped into hours.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// `MM:SS.CC`
pub fn format_stopwatch(ms: u64) -> String {
    format!(
        "{:02}:{:02}.{:02}",
        ms / 60_000,
        (ms % 60_000) / 1_000,
        (ms % 1_000) / 10
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn countdown_defaults_to_pomodoro() {
        let countdown = Countdown::default();
        assert_eq!(countdown.remaining_secs(), 1_500);
        assert_eq!(format_clock(countdown.remaining_secs()), "25:00");
    }

    #[test]
    fn adjust_clamps_and_is_ignored_while_running() {
        let mut countdown = Countdown::new(90);
        countdown.adjust(-600);
        assert_eq!(countdown.remaining_secs(), MIN_COUNTDOWN_SECS);
        countdown.adjust(i64::MAX);
        assert_eq!(countdown.remaining_secs(), MAX_COUNTDOWN_SECS);

        countdown.set_preset(5);
        countdown.start();
        countdown.adjust(60);
        assert_eq!(countdown.remaining_secs(), 300);
    }

    #[test]
    fn tick_stops_at_zero() {
        let mut countdown = Countdown::new(2);
        assert!(!countdown.tick());
        countdown.start();
        assert!(!countdown.tick());
        assert!(countdown.tick());
        assert!(!countdown.is_running());
        assert_eq!(countdown.remaining_secs(), 0);
        assert!(!countdown.tick());

        countdown.reset();
        assert_eq!(countdown.remaining_secs(), 2);
    }

    #[test]
    fn preset_stops_running_timer() {
        let mut countdown = Countdown::default();
        countdown.start();
        countdown.set_preset(45);
        assert!(!countdown.is_running());
        assert_eq!(countdown.initial_secs(), 2_700);
    }

    #[test]
    fn stopwatch_accumulates_across_pauses() {
        let mut stopwatch = Stopwatch::new();
        stopwatch.start(1_000);
        stopwatch.pause(2_500);
        assert_eq!(stopwatch.elapsed_ms(9_999), 1_500);
        assert_eq!(stopwatch.lap(3_000), None);

        stopwatch.start(10_000);
        assert_eq!(stopwatch.lap(10_250), Some(1_750));
        assert_eq!(stopwatch.lap(11_000), Some(2_500));
        assert_eq!(stopwatch.laps(), &[2_500, 1_750]);

        stopwatch.reset();
        assert_eq!(stopwatch, Stopwatch::default());
    }

    #[test]
    fn formats() {
        assert_eq!(format_clock(359_940), "5999:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_stopwatch(0), "00:00.00");
        assert_eq!(format_stopwatch(83_456), "01:23.45");
    }
}
