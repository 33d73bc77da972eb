//! Tests for the bounded queue

use siphon_protocol::{LogEvent, Severity};

use super::Queue;

fn event(n: usize) -> LogEvent {
    LogEvent {
        remote_addr: "10.0.0.1".into(),
        timestamp: n as i64 + 1,
        severity: Severity::Info,
        hostname: format!("host-{n}"),
        application: "app".into(),
        text: format!("event {n}"),
        ..Default::default()
    }
}

fn events(range: std::ops::Range<usize>) -> Vec<LogEvent> {
    range.map(event).collect()
}

#[test]
fn test_push_get_in_order() {
    let queue = Queue::new(100);
    for n in 0..105 {
        queue.push(vec![event(n)]);
    }

    let batch = queue.get();
    assert_eq!(batch.len(), 100);
    assert_eq!(batch, events(0..100));

    let batch = queue.get();
    assert_eq!(batch.len(), 5);
    assert_eq!(batch, events(100..105));

    assert!(queue.get().is_empty());
}

#[test]
fn test_get_n() {
    let queue = Queue::new(100);
    queue.push(events(0..50));

    assert_eq!(queue.get_n(20).len(), 20);
    assert_eq!(queue.get_n(100).len(), 30);
    assert_eq!(queue.get_n(10).len(), 0);
}

#[test]
fn test_max_items_drops_overflow() {
    let queue = Queue::with_max(25, 50);
    let batch = events(0..80);

    let (len, dropped) = queue.push(batch.clone());
    assert_eq!(len, 50);
    assert_eq!(dropped, 30);

    let (len, dropped) = queue.push(batch.clone());
    assert_eq!(len, 50);
    assert_eq!(dropped, 80);

    assert_eq!(queue.dropped(), 110);

    let drained = queue.get_n(25);
    assert_eq!(drained.len(), 25);
    assert_eq!(queue.len(), 25);
    assert_eq!(drained, events(0..25));
}

#[test]
fn test_accounting_invariant() {
    // emitted + dropped + still queued == pushed, for any interleaving.
    let queue = Queue::with_max(10, 40);
    let mut emitted = 0usize;
    let mut pushed = 0usize;

    for round in 0..20 {
        let batch = events(0..7);
        pushed += batch.len();
        queue.push(batch);
        if round % 3 == 0 {
            emitted += queue.get().len();
        }
    }
    emitted += queue.get_n(usize::MAX).len();

    assert_eq!(emitted + queue.dropped() as usize + queue.len(), pushed);
    assert_eq!(queue.len(), 0);
}

#[test]
fn test_concurrent_push_get() {
    use std::sync::Arc;

    let queue = Arc::new(Queue::with_max(64, 10_000));
    let mut handles = Vec::new();

    for _ in 0..4 {
        let queue = Arc::clone(&queue);
        handles.push(std::thread::spawn(move || {
            for n in 0..500 {
                queue.push(vec![event(n)]);
            }
        }));
    }

    let drainer = {
        let queue = Arc::clone(&queue);
        std::thread::spawn(move || {
            let mut drained = 0usize;
            for _ in 0..200 {
                drained += queue.get().len();
                std::thread::yield_now();
            }
            drained
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    let mut drained = drainer.join().unwrap();
    drained += queue.get_n(usize::MAX).len();

    assert_eq!(drained + queue.dropped() as usize, 2_000);
}
