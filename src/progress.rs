//! Progress throttling and rendering
//!
//! Chat providers rate-limit message edits aggressively, so raw transfer
//! callbacks cannot be mirrored one-to-one into edits. [`ProgressThrottle`]
//! decides which observations become user-visible updates; the render
//! functions compose the update text (bar, percentage, sizes, speed).
//!
//! One throttle instance belongs to exactly one task and lives only while
//! that task is Active. State is never shared across tasks.

use crate::config::ProgressConfig;
use crate::utils::{BYTES_PER_MB, to_mb};
use std::time::{Duration, Instant};

/// Number of cells in the rendered progress bar
pub const BAR_WIDTH: usize = 20;

/// An emitted progress update, ready for rendering
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressFrame {
    /// Integer percentage (0 to 100)
    pub percent: u8,
    /// Bytes received so far
    pub received_bytes: u64,
    /// Total bytes expected
    pub total_bytes: u64,
    /// Instantaneous speed in bytes per second since the previous
    /// observation; `None` on the first observation or when the time delta
    /// is non-positive
    pub speed_bps: Option<u64>,
}

/// Per-task progress update throttle
///
/// An observation is emitted when any of the following holds:
/// 1. it is the first observation for the task,
/// 2. at least `min_interval` elapsed since the last emitted update,
/// 3. the percentage advanced by at least `min_percent_step` points, or
/// 4. the transfer is complete (`received_bytes >= total_bytes`).
///
/// This bounds the edit rate while guaranteeing the final 100% update is
/// always delivered.
#[derive(Debug)]
pub struct ProgressThrottle {
    min_interval: Duration,
    min_percent_step: u8,
    last_emit_at: Option<Instant>,
    last_emit_percent: Option<u8>,
    last_seen_bytes: u64,
    last_seen_at: Option<Instant>,
}

impl ProgressThrottle {
    /// Create a throttle for one task's lifetime
    #[must_use]
    pub fn new(config: &ProgressConfig) -> Self {
        Self {
            min_interval: config.min_interval,
            min_percent_step: config.min_percent_step,
            last_emit_at: None,
            last_emit_percent: None,
            last_seen_bytes: 0,
            last_seen_at: None,
        }
    }

    /// Feed one progress observation, returning a frame when it should be
    /// emitted
    ///
    /// Updates internal state on every call: emission memory only when a
    /// frame is returned, speed memory always (speed is measured against the
    /// previous observation, not the previous emission).
    pub fn observe(&mut self, received_bytes: u64, total_bytes: u64, now: Instant) -> Option<ProgressFrame> {
        let percent = percent_of(received_bytes, total_bytes);

        let first = self.last_emit_percent.is_none();
        let interval_elapsed = self
            .last_emit_at
            .is_some_and(|at| now.duration_since(at) >= self.min_interval);
        let percent_advanced = self
            .last_emit_percent
            .is_some_and(|last| percent >= last.saturating_add(self.min_percent_step));
        let complete = received_bytes >= total_bytes;

        let speed_bps = self.speed_since_last_observation(received_bytes, now);

        self.last_seen_bytes = received_bytes;
        self.last_seen_at = Some(now);

        if !(first || interval_elapsed || percent_advanced || complete) {
            return None;
        }

        self.last_emit_at = Some(now);
        self.last_emit_percent = Some(percent);

        Some(ProgressFrame {
            percent,
            received_bytes,
            total_bytes,
            speed_bps,
        })
    }

    /// Instantaneous speed against the previous observation
    fn speed_since_last_observation(&self, received_bytes: u64, now: Instant) -> Option<u64> {
        let last_at = self.last_seen_at?;
        let elapsed = now.duration_since(last_at).as_secs_f64();
        let delta = received_bytes.saturating_sub(self.last_seen_bytes);

        if elapsed <= 0.0 || delta == 0 {
            return None;
        }

        Some((delta as f64 / elapsed).round() as u64)
    }
}

/// Integer percentage of `received` over `total`, clamped to 100
fn percent_of(received: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((received.saturating_mul(100) / total).min(100)) as u8
}

/// Render a fixed-width filled/unfilled progress bar with its percentage
///
/// # Examples
///
/// ```
/// use chat_media_dl::progress::render_bar;
///
/// assert_eq!(render_bar(50), "██████████░░░░░░░░░░ 50%");
/// ```
#[must_use]
pub fn render_bar(percent: u8) -> String {
    let percent = percent.min(100) as usize;
    let filled = BAR_WIDTH * percent / 100;
    format!(
        "{}{} {}%",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled),
        percent
    )
}

/// Render the body of a progress update
///
/// Composes the bar, percentage, transferred/total sizes in MB to one
/// decimal, and the speed line when a speed estimate is available.
#[must_use]
pub fn render_update(frame: &ProgressFrame) -> String {
    let mut text = format!(
        "{}\n📊 {}% • {:.1}MB / {:.1}MB",
        render_bar(frame.percent),
        frame.percent,
        to_mb(frame.received_bytes),
        to_mb(frame.total_bytes),
    );

    if let Some(bps) = frame.speed_bps {
        text.push_str(&format!("\n⚡ {:.1} MB/s", bps as f64 / BYTES_PER_MB));
    }

    text
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    fn throttle() -> ProgressThrottle {
        ProgressThrottle::new(&ProgressConfig::default())
    }

    #[test]
    fn first_observation_always_emits() {
        let mut throttle = throttle();
        let frame = throttle.observe(0, 100 * MB, Instant::now());

        let frame = frame.expect("first observation should emit");
        assert_eq!(frame.percent, 0);
        assert_eq!(frame.speed_bps, None, "no speed on first observation");
    }

    #[test]
    fn small_advance_within_interval_is_suppressed() {
        let mut throttle = throttle();
        let start = Instant::now();

        assert!(throttle.observe(0, 100 * MB, start).is_some());

        // 1% further, 0.5s later: none of the emission conditions hold.
        let emitted = throttle.observe(MB, 100 * MB, start + Duration::from_millis(500));
        assert!(emitted.is_none());
    }

    #[test]
    fn interval_elapse_forces_emission() {
        let mut throttle = throttle();
        let start = Instant::now();

        assert!(throttle.observe(0, 100 * MB, start).is_some());
        assert!(
            throttle
                .observe(MB, 100 * MB, start + Duration::from_secs(2))
                .is_some()
        );
    }

    #[test]
    fn percent_step_forces_emission() {
        let mut throttle = throttle();
        let start = Instant::now();

        assert!(throttle.observe(0, 100 * MB, start).is_some());
        // 2% advance only 0.1s later still emits.
        assert!(
            throttle
                .observe(2 * MB, 100 * MB, start + Duration::from_millis(100))
                .is_some()
        );
    }

    #[test]
    fn completion_always_emits() {
        let mut throttle = throttle();
        let start = Instant::now();

        assert!(throttle.observe(99 * MB, 100 * MB, start).is_some());
        // Immediately complete: interval and percent-step both fail, but the
        // final update must go out.
        let frame = throttle
            .observe(100 * MB, 100 * MB, start + Duration::from_millis(10))
            .expect("completion must emit");
        assert_eq!(frame.percent, 100);
    }

    #[test]
    fn speed_is_measured_against_previous_observation() {
        let mut throttle = throttle();
        let start = Instant::now();

        assert!(throttle.observe(0, 100 * MB, start).is_some());

        // 2 MB in 1 second = 2 MB/s, emitted via the percent-step rule.
        let frame = throttle
            .observe(2 * MB, 100 * MB, start + Duration::from_secs(1))
            .expect("2% advance should emit");
        assert_eq!(frame.speed_bps, Some(2 * MB));
    }

    #[test]
    fn speed_omitted_when_bytes_did_not_advance() {
        let mut throttle = throttle();
        let start = Instant::now();

        assert!(throttle.observe(50 * MB, 100 * MB, start).is_some());
        let frame = throttle
            .observe(50 * MB, 100 * MB, start + Duration::from_secs(3))
            .expect("interval elapse should emit");
        assert_eq!(frame.speed_bps, None);
    }

    #[test]
    fn hundred_mb_at_one_mb_per_tick_is_materially_throttled() {
        // Scenario: 100 MB total, 1 MB increments every 0.1s.
        let mut throttle = throttle();
        let start = Instant::now();
        let mut emitted = Vec::new();

        for step in 1..=100u64 {
            let now = start + Duration::from_millis(100 * step);
            if let Some(frame) = throttle.observe(step * MB, 100 * MB, now) {
                emitted.push(frame);
            }
        }

        assert!(
            emitted.len() < 100,
            "expected materially fewer updates than observations, got {}",
            emitted.len()
        );
        assert_eq!(
            emitted.last().unwrap().percent,
            100,
            "last update must be the 100% completion frame"
        );
    }

    #[test]
    fn consecutive_emissions_respect_the_interval_unless_final() {
        let mut throttle = ProgressThrottle::new(&ProgressConfig {
            min_interval: Duration::from_secs(2),
            // Effectively disable the percent rule so the interval dominates.
            min_percent_step: 100,
        });
        let start = Instant::now();
        let mut emit_times = Vec::new();

        for step in 1..=100u64 {
            let now = start + Duration::from_millis(100 * step);
            if throttle.observe(step * MB, 100 * MB, now).is_some() {
                emit_times.push(now);
            }
        }

        for pair in emit_times.windows(2) {
            let gap = pair[1].duration_since(pair[0]);
            // The completion frame may arrive early; everything else is
            // spaced by at least the interval.
            assert!(
                gap >= Duration::from_secs(2) || pair[1] == *emit_times.last().unwrap(),
                "updates {:?} apart",
                gap
            );
        }
    }

    #[test]
    fn zero_total_reports_zero_percent() {
        let mut throttle = throttle();
        let frame = throttle.observe(500, 0, Instant::now()).unwrap();
        assert_eq!(frame.percent, 0);
    }

    #[test]
    fn zero_length_transfer_observations_count_as_complete() {
        let mut throttle = throttle();
        let start = Instant::now();

        assert!(throttle.observe(0, 0, start).is_some());

        // An empty transfer is complete from the first byte count, so later
        // observations are final updates, not interval-gated churn.
        let frame = throttle
            .observe(0, 0, start + Duration::from_millis(10))
            .expect("completion rule must apply when total is zero");
        assert_eq!(frame.percent, 0);
    }

    #[test]
    fn bar_rendering_is_proportional() {
        assert_eq!(render_bar(0), format!("{} 0%", "░".repeat(20)));
        assert_eq!(render_bar(100), format!("{} 100%", "█".repeat(20)));
        assert_eq!(
            render_bar(50),
            format!("{}{} 50%", "█".repeat(10), "░".repeat(10))
        );
        // Over-100 inputs are clamped.
        assert_eq!(render_bar(250), format!("{} 100%", "█".repeat(20)));
    }

    #[test]
    fn update_text_includes_sizes_and_optional_speed() {
        let frame = ProgressFrame {
            percent: 42,
            received_bytes: 42 * MB,
            total_bytes: 100 * MB,
            speed_bps: Some(2 * MB + MB / 2),
        };

        let text = render_update(&frame);
        assert!(text.contains("42%"));
        assert!(text.contains("42.0MB / 100.0MB"));
        assert!(text.contains("2.5 MB/s"));

        let silent = ProgressFrame {
            speed_bps: None,
            ..frame
        };
        assert!(!render_update(&silent).contains("MB/s"));
    }
}
