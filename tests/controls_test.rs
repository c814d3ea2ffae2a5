//! Controls Visibility Tests
//!
//! Dim deadline behaviour driven by a manual clock.

use std::time::Duration;

use embedplay::player::{ControlsVisibilityTimer, ManualClock, Visibility};

const DIM_AFTER: Duration = Duration::from_secs(5);

fn timer() -> (ManualClock, ControlsVisibilityTimer<ManualClock>) {
    let clock = ManualClock::new();
    let timer = ControlsVisibilityTimer::new(clock.clone(), DIM_AFTER, 0.3);
    (clock, timer)
}

// =============================================================================
// Dimming
// =============================================================================

/// Test: controls start visible and dim exactly at the deadline
#[test]
fn test_dims_after_idle_period() {
    let (clock, mut timer) = timer();
    timer.start();
    assert!(timer.is_visible());
    assert_eq!(timer.opacity(), 1.0);

    clock.advance(DIM_AFTER - Duration::from_millis(1));
    assert!(timer.is_visible());

    clock.advance(Duration::from_millis(1));
    assert_eq!(timer.visibility(), Visibility::Dimmed);
    assert!((timer.opacity() - 0.3).abs() < f32::EPSILON);
}

/// Test: every interaction pushes the deadline out by the full period
#[test]
fn test_ping_resets_deadline() {
    let (clock, mut timer) = timer();
    timer.start();

    for _ in 0..4 {
        clock.advance(Duration::from_secs(3));
        timer.ping();
        assert!(timer.is_visible());
    }

    assert_eq!(timer.time_until_dim(), Some(DIM_AFTER));
    clock.advance(DIM_AFTER);
    assert!(!timer.is_visible());
}

/// Test: an interaction after dimming restores full opacity
#[test]
fn test_ping_restores_after_dim() {
    let (clock, mut timer) = timer();
    timer.start();
    clock.advance(DIM_AFTER);
    assert!(!timer.is_visible());

    timer.ping();
    assert!(timer.is_visible());
    assert_eq!(timer.time_until_dim(), Some(DIM_AFTER));
}

/// Test: poll reports the dim transition once
#[test]
fn test_poll_reports_transition_once() {
    let (clock, mut timer) = timer();
    timer.start();
    assert_eq!(timer.poll(), None);

    clock.advance(DIM_AFTER * 2);
    assert_eq!(timer.poll(), Some(Visibility::Dimmed));
    assert_eq!(timer.poll(), None);
    assert_eq!(timer.time_until_dim(), None);
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Test: a ping before start starts the countdown
#[test]
fn test_ping_before_start_starts() {
    let (clock, mut timer) = timer();
    assert_eq!(timer.time_until_dim(), None);

    timer.ping();
    assert_eq!(timer.time_until_dim(), Some(DIM_AFTER));
    clock.advance(DIM_AFTER);
    assert!(!timer.is_visible());
}

/// Test: after stop nothing fires and nothing restarts the timer
#[test]
fn test_stop_cancels_for_good() {
    let (clock, mut timer) = timer();
    timer.start();
    timer.stop();
    assert!(timer.is_stopped());

    clock.advance(DIM_AFTER * 3);
    assert_eq!(timer.poll(), None);
    assert!(timer.is_visible());

    timer.ping();
    timer.start();
    assert_eq!(timer.time_until_dim(), None);
}

/// Test: dimmed opacity is clamped into range
#[test]
fn test_dimmed_opacity_clamped() {
    let clock = ManualClock::new();
    let mut timer = ControlsVisibilityTimer::new(clock.clone(), DIM_AFTER, 1.7);
    timer.start();
    clock.advance(DIM_AFTER);
    assert_eq!(timer.opacity(), 1.0);

    let mut timer = ControlsVisibilityTimer::new(clock.clone(), DIM_AFTER, -0.5);
    timer.start();
    clock.advance(DIM_AFTER);
    assert_eq!(timer.opacity(), 0.0);
}
