//! Controls visibility - auto-dimming transport controls
//!
//! A renewable single deadline: every interaction restores full opacity and
//! pushes the dim deadline out again. Time comes from an injected `Clock`, so
//! the host decides how to wake up (`time_until_dim`) and tests never sleep.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

/// Default delay before controls dim
pub const DEFAULT_DIM_AFTER: Duration = Duration::from_secs(5);

/// Default opacity of dimmed controls
pub const DEFAULT_DIMMED_OPACITY: f32 = 0.3;

/// Source of the current time
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock; clones share the same time
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move time forward by `by`
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Visibility of the transport controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Dimmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Stopped,
}

/// Renewable countdown driving controls opacity
#[derive(Debug)]
pub struct ControlsVisibilityTimer<C: Clock> {
    clock: C,
    dim_after: Duration,
    dimmed_opacity: f32,
    phase: Phase,
    visibility: Visibility,
    deadline: Option<Instant>,
}

impl<C: Clock> ControlsVisibilityTimer<C> {
    pub fn new(clock: C, dim_after: Duration, dimmed_opacity: f32) -> Self {
        Self {
            clock,
            dim_after,
            dimmed_opacity: dimmed_opacity.clamp(0.0, 1.0),
            phase: Phase::Idle,
            visibility: Visibility::Visible,
            deadline: None,
        }
    }

    /// Show controls and begin the countdown (player mounted)
    pub fn start(&mut self) {
        if self.phase == Phase::Stopped {
            return;
        }
        self.phase = Phase::Running;
        self.restore();
    }

    /// Register an interaction: full visibility, deadline pushed out
    ///
    /// A ping before `start` starts the timer; a ping after `stop` is ignored.
    pub fn ping(&mut self) {
        match self.phase {
            Phase::Stopped => {}
            Phase::Idle => self.start(),
            Phase::Running => self.restore(),
        }
    }

    /// Cancel any pending deadline for good (player unmounted)
    pub fn stop(&mut self) {
        self.phase = Phase::Stopped;
        self.deadline = None;
    }

    /// Apply an expired deadline; returns the transition if one happened
    pub fn poll(&mut self) -> Option<Visibility> {
        let deadline = self.deadline?;
        if self.clock.now() < deadline {
            return None;
        }
        self.deadline = None;
        self.visibility = Visibility::Dimmed;
        debug!("controls dimmed");
        Some(Visibility::Dimmed)
    }

    /// Current visibility, expiring the deadline first
    pub fn visibility(&mut self) -> Visibility {
        self.poll();
        self.visibility
    }

    pub fn is_visible(&mut self) -> bool {
        self.visibility() == Visibility::Visible
    }

    /// Opacity for rendering: 1.0 when visible, the dimmed level otherwise
    pub fn opacity(&mut self) -> f32 {
        match self.visibility() {
            Visibility::Visible => 1.0,
            Visibility::Dimmed => self.dimmed_opacity,
        }
    }

    /// Time left before the pending deadline, if any
    pub fn time_until_dim(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(self.clock.now()))
    }

    pub fn is_stopped(&self) -> bool {
        self.phase == Phase::Stopped
    }

    fn restore(&mut self) {
        self.visibility = Visibility::Visible;
        self.deadline = Some(self.clock.now() + self.dim_after);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer() -> (ManualClock, ControlsVisibilityTimer<ManualClock>) {
        let clock = ManualClock::new();
        let timer = ControlsVisibilityTimer::new(clock.clone(), DEFAULT_DIM_AFTER, DEFAULT_DIMMED_OPACITY);
        (clock, timer)
    }

    #[test]
    fn test_ping_before_start_starts() {
        let (clock, mut timer) = timer();
        assert_eq!(timer.time_until_dim(), None);
        timer.ping();
        assert_eq!(timer.time_until_dim(), Some(DEFAULT_DIM_AFTER));
        clock.advance(DEFAULT_DIM_AFTER);
        assert!(!timer.is_visible());
    }

    #[test]
    fn test_opacity_levels() {
        let (clock, mut timer) = timer();
        timer.start();
        assert_eq!(timer.opacity(), 1.0);
        clock.advance(Duration::from_secs(6));
        assert_eq!(timer.opacity(), DEFAULT_DIMMED_OPACITY);
    }

    #[test]
    fn test_poll_reports_transition_once() {
        let (clock, mut timer) = timer();
        timer.start();
        assert_eq!(timer.poll(), None);
        clock.advance(DEFAULT_DIM_AFTER);
        assert_eq!(timer.poll(), Some(Visibility::Dimmed));
        assert_eq!(timer.poll(), None);
    }
}
