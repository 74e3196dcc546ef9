//! Integration tests for the countdown timer.
//!
//! Uses `start_paused` so `tokio::time` is virtual and deterministic:
//! sleeps auto-advance the clock instantly while preserving ordering and
//! measured durations.

use std::time::Duration;

use raceline_countdown::{CountdownConfig, CountdownPhase, CountdownTimer};
use tokio::time::Instant;

/// Drains the timer, recording each phase with its virtual offset from `start`.
async fn collect_phases(
    mut timer: CountdownTimer,
    start: Instant,
) -> Vec<(CountdownPhase, Duration)> {
    let mut phases = Vec::new();
    while let Some(phase) = timer.next_phase().await {
        phases.push((phase, start.elapsed()));
    }
    phases
}

#[tokio::test(start_paused = true)]
async fn test_full_sequence_in_order() {
    let timer = CountdownTimer::new(CountdownConfig::default());
    let phases = collect_phases(timer, Instant::now()).await;

    let sequence: Vec<CountdownPhase> =
        phases.iter().map(|(p, _)| *p).collect();
    assert_eq!(
        sequence,
        vec![
            CountdownPhase::Tick(5),
            CountdownPhase::Tick(4),
            CountdownPhase::Tick(3),
            CountdownPhase::Tick(2),
            CountdownPhase::Tick(1),
            CountdownPhase::Go,
            CountdownPhase::Started,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_phase_timing_offsets() {
    let start = Instant::now();
    let timer = CountdownTimer::new(CountdownConfig::default());
    let phases = collect_phases(timer, start).await;

    let offsets: Vec<Duration> = phases.iter().map(|(_, t)| *t).collect();
    assert_eq!(offsets[0], Duration::from_secs(1)); // Tick(5)
    assert_eq!(offsets[4], Duration::from_secs(5)); // Tick(1)
    // GO fires in the same instant as the final tick.
    assert_eq!(offsets[5], Duration::from_secs(5));
    // Started fires one grace second later.
    assert_eq!(offsets[6], Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn test_timer_yields_none_after_started() {
    let mut timer = CountdownTimer::new(CountdownConfig::default());
    while timer.next_phase().await.is_some() {}
    assert!(timer.is_done());
    assert_eq!(timer.next_phase().await, None);
    assert_eq!(timer.next_phase().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_short_countdown() {
    let cfg = CountdownConfig {
        start_from: 1,
        ..CountdownConfig::default()
    };
    let phases = collect_phases(CountdownTimer::new(cfg), Instant::now()).await;
    let sequence: Vec<CountdownPhase> =
        phases.iter().map(|(p, _)| *p).collect();
    assert_eq!(
        sequence,
        vec![
            CountdownPhase::Tick(1),
            CountdownPhase::Go,
            CountdownPhase::Started,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_custom_interval_is_respected() {
    let cfg = CountdownConfig {
        start_from: 2,
        interval: Duration::from_millis(250),
        go_grace: Duration::from_millis(500),
    };
    let start = Instant::now();
    let phases = collect_phases(CountdownTimer::new(cfg), start).await;

    assert_eq!(phases[0].1, Duration::from_millis(250)); // Tick(2)
    assert_eq!(phases[1].1, Duration::from_millis(500)); // Tick(1)
    assert_eq!(phases[2].1, Duration::from_millis(500)); // Go
    assert_eq!(phases[3].1, Duration::from_millis(1000)); // Started
}
