//! Tests for the process-rate monitor

use std::sync::atomic::Ordering;

use super::RateMonitor;

#[test]
fn test_rate_transitions() {
    let monitor = RateMonitor::new();

    monitor.swap_and_publish();
    assert_eq!(monitor.rate(), 1.0);

    monitor.add_queued(500);
    monitor.swap_and_publish();
    assert_eq!(monitor.rate(), 0.0);

    monitor.add_queued(500);
    monitor.add_processed(500);
    monitor.swap_and_publish();
    assert_eq!(monitor.rate(), 1.0);

    monitor.add_queued(500);
    monitor.add_processed(250);
    monitor.swap_and_publish();
    assert_eq!(monitor.rate(), 2.0);

    monitor.add_queued(500);
    monitor.add_processed(5000);
    monitor.swap_and_publish();
    assert_eq!(monitor.rate(), 0.1);
}

#[test]
fn test_swap_zeroes_counters() {
    let monitor = RateMonitor::new();
    monitor.add_queued(10);
    monitor.add_processed(3);
    monitor.swap_and_publish();

    assert_eq!(monitor.queued.load(Ordering::Relaxed), 0);
    assert_eq!(monitor.processed.load(Ordering::Relaxed), 0);
}

#[test]
fn test_initial_rate_is_zero() {
    assert_eq!(RateMonitor::new().rate(), 0.0);
}
