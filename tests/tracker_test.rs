//! Integration tests for the tracker lifecycle and window aggregation.

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use user_input_tracker::source::Handler;
use user_input_tracker::{
    ChannelSource, EventKind, InputSource, ManualClock, RawClick, RawEvent, RawKeystroke, RawMove,
    RawScroll, SourceError, Tracker, TrackerOptions, UserInputAggregate, UserInputTracker,
};

#[derive(Default)]
struct ManualSourceState {
    keystroke: Option<Handler<RawKeystroke>>,
    click: Option<Handler<RawClick>>,
    movement: Option<Handler<RawMove>>,
    scroll: Option<Handler<RawScroll>>,
    subscriptions: usize,
    starts: usize,
    running: bool,
    /// Keep handlers on unload, like a source that ignores it
    misbehaving: bool,
}

/// A source the test drives by hand, on its own thread.
#[derive(Clone, Default)]
struct ManualSource {
    state: Arc<Mutex<ManualSourceState>>,
}

impl ManualSource {
    fn misbehaving() -> Self {
        let source = Self::default();
        source.state.lock().unwrap().misbehaving = true;
        source
    }

    fn subscriptions(&self) -> usize {
        self.state.lock().unwrap().subscriptions
    }

    fn starts(&self) -> usize {
        self.state.lock().unwrap().starts
    }

    fn is_running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    /// Deliver a keystroke; returns whether a handler received it.
    fn key(&self, c: char) -> bool {
        let state = self.state.lock().unwrap();
        match state.keystroke {
            Some(ref h) => {
                h(RawKeystroke::with_char(c));
                true
            }
            None => false,
        }
    }

    fn click(&self) -> bool {
        let state = self.state.lock().unwrap();
        match state.click {
            Some(ref h) => {
                h(RawClick { clicks: Some(1) });
                true
            }
            None => false,
        }
    }

    fn move_to(&self, x: f64, y: f64) {
        let state = self.state.lock().unwrap();
        if let Some(ref h) = state.movement {
            h(RawMove { x, y });
        }
    }

    fn scroll(&self, amount: f64, rotation: f64) {
        let state = self.state.lock().unwrap();
        if let Some(ref h) = state.scroll {
            h(RawScroll { amount, rotation });
        }
    }
}

impl InputSource for ManualSource {
    fn on_keystroke(&mut self, handler: Handler<RawKeystroke>) {
        let mut state = self.state.lock().unwrap();
        state.keystroke = Some(handler);
        state.subscriptions += 1;
    }

    fn on_click(&mut self, handler: Handler<RawClick>) {
        let mut state = self.state.lock().unwrap();
        state.click = Some(handler);
        state.subscriptions += 1;
    }

    fn on_move(&mut self, handler: Handler<RawMove>) {
        let mut state = self.state.lock().unwrap();
        state.movement = Some(handler);
        state.subscriptions += 1;
    }

    fn on_scroll(&mut self, handler: Handler<RawScroll>) {
        let mut state = self.state.lock().unwrap();
        state.scroll = Some(handler);
        state.subscriptions += 1;
    }

    fn start(&mut self) -> Result<(), SourceError> {
        let mut state = self.state.lock().unwrap();
        state.starts += 1;
        state.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.state.lock().unwrap().running = false;
    }

    fn unload(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.running = false;
        if !state.misbehaving {
            state.keystroke = None;
            state.click = None;
            state.movement = None;
            state.scroll = None;
        }
    }
}

type Collected = Arc<Mutex<Vec<UserInputAggregate>>>;

fn collecting_sink() -> (Collected, impl FnMut(&UserInputAggregate) + Send + 'static) {
    let collected: Collected = Arc::new(Mutex::new(Vec::new()));
    let c = collected.clone();
    (collected, move |aggregate: &UserInputAggregate| {
        c.lock().unwrap().push(aggregate.clone())
    })
}

/// A subscribed but idle tracker, so only manual ticks fire.
fn manual_tracker(
    source: &ManualSource,
    clock: &ManualClock,
    details: bool,
) -> (UserInputTracker, Collected) {
    let (collected, sink) = collecting_sink();
    let mut tracker = UserInputTracker::new(
        source.clone(),
        sink,
        Duration::from_millis(1000),
        TrackerOptions::default()
            .collect_key_details(details)
            .with_clock(clock.clone()),
    )
    .unwrap();
    tracker.start().unwrap();
    tracker.stop();
    (tracker, collected)
}

#[test]
fn test_keystrokes_split_across_ticks() {
    let t0 = Utc::now();
    let clock = ManualClock::new(t0);
    let source = ManualSource::default();
    let (tracker, collected) = manual_tracker(&source, &clock, false);

    for offset in [100, 500] {
        clock.set(t0 + ChronoDuration::milliseconds(offset));
        assert!(source.key('a'));
    }

    clock.set(t0 + ChronoDuration::milliseconds(1000));
    tracker.tick();

    clock.set(t0 + ChronoDuration::milliseconds(1500));
    source.key('b');

    clock.set(t0 + ChronoDuration::milliseconds(2000));
    tracker.tick();

    let aggregates = collected.lock().unwrap();
    assert_eq!(aggregates.len(), 2);

    assert_eq!(aggregates[0].ts_start, t0);
    assert_eq!(aggregates[0].ts_end, t0 + ChronoDuration::milliseconds(1000));
    assert_eq!(aggregates[0].key_total, 2);

    assert_eq!(aggregates[1].ts_start, aggregates[0].ts_end);
    assert_eq!(aggregates[1].ts_end, t0 + ChronoDuration::milliseconds(2000));
    assert_eq!(aggregates[1].key_total, 1);
}

#[test]
fn test_pointer_and_scroll_reduction() {
    let t0 = Utc::now();
    let clock = ManualClock::new(t0);
    let source = ManualSource::default();
    let (tracker, collected) = manual_tracker(&source, &clock, false);

    clock.set(t0 + ChronoDuration::milliseconds(200));
    source.move_to(0.0, 0.0);
    source.move_to(3.0, 4.0);
    source.scroll(2.0, -1.0);
    source.scroll(1.0, 1.0);
    source.click();

    clock.set(t0 + ChronoDuration::milliseconds(1000));
    tracker.tick();

    let aggregates = collected.lock().unwrap();
    let aggregate = &aggregates[0];
    assert!((aggregate.moved_distance - 5.0).abs() < 1e-9);
    assert_eq!(aggregate.scroll_delta, 3.0);
    assert_eq!(aggregate.click_total, 1);
    assert_eq!(aggregate.key_total, 0);
}

#[test]
fn test_empty_window_is_zero() {
    let clock = ManualClock::new(Utc::now());
    let source = ManualSource::default();
    let (tracker, _) = manual_tracker(&source, &clock, false);

    let aggregate = tracker.aggregate();
    assert!(aggregate.is_idle());
    assert_eq!(aggregate.moved_distance, 0.0);
    assert_eq!(aggregate.scroll_delta, 0.0);
}

#[test]
fn test_key_details_sum_to_total() {
    let t0 = Utc::now();
    let clock = ManualClock::new(t0);
    let source = ManualSource::default();
    let (tracker, _) = manual_tracker(&source, &clock, true);

    clock.set(t0 + ChronoDuration::milliseconds(10));
    for c in "ab 1\t\n?".chars() {
        source.key(c);
    }

    clock.set(t0 + ChronoDuration::milliseconds(1000));
    let aggregate = tracker.aggregate();
    let details = aggregate.key_details.expect("details enabled");

    assert_eq!(aggregate.key_total, 7);
    assert_eq!(details.total(), aggregate.key_total);
    assert_eq!(details.keys_letter, 2);
    assert_eq!(details.keys_space, 1);
    assert_eq!(details.keys_number, 1);
    assert_eq!(details.keys_tab, 1);
    assert_eq!(details.keys_enter, 1);
    assert_eq!(details.keys_other, 1);
}

#[test]
fn test_key_details_absent_when_disabled() {
    let clock = ManualClock::new(Utc::now());
    let source = ManualSource::default();
    let (tracker, _) = manual_tracker(&source, &clock, false);

    let aggregate = tracker.aggregate();
    assert!(aggregate.key_details.is_none());
    let json = serde_json::to_value(&aggregate).unwrap();
    assert!(json.get("keysLetter").is_none());
    assert!(json.get("keysOther").is_none());
}

#[test]
fn test_stale_events_are_dropped() {
    let t0 = Utc::now();
    let clock = ManualClock::new(t0);
    let source = ManualSource::default();
    let (tracker, _) = manual_tracker(&source, &clock, false);

    clock.set(t0 + ChronoDuration::milliseconds(1000));
    tracker.aggregate();

    // Captured before the next window's start
    clock.set(t0 + ChronoDuration::milliseconds(500));
    source.key('x');

    clock.set(t0 + ChronoDuration::milliseconds(2000));
    let aggregate = tracker.aggregate();
    assert_eq!(aggregate.key_total, 0);
    assert_eq!(tracker.buffered(EventKind::Keystroke), 0);
    assert_eq!(tracker.stats().snapshot().stale_events_dropped, 1);
}

#[test]
fn test_future_events_wait_for_their_window() {
    let t0 = Utc::now();
    let clock = ManualClock::new(t0);
    let source = ManualSource::default();
    let (tracker, _) = manual_tracker(&source, &clock, false);

    clock.set(t0 + ChronoDuration::milliseconds(1000));
    tracker.aggregate();

    clock.set(t0 + ChronoDuration::milliseconds(2500));
    source.key('x');

    // Late tick: the window is still [t0 + 1000, t0 + 2000)
    clock.set(t0 + ChronoDuration::milliseconds(2600));
    let late = tracker.aggregate();
    assert_eq!(late.ts_end, t0 + ChronoDuration::milliseconds(2000));
    assert_eq!(late.key_total, 0);
    assert_eq!(tracker.buffered(EventKind::Keystroke), 1);

    let next = tracker.aggregate();
    assert_eq!(next.ts_start, late.ts_end);
    assert_eq!(next.key_total, 1);
    assert_eq!(tracker.buffered(EventKind::Keystroke), 0);
}

#[test]
fn test_start_twice_subscribes_once() {
    let source = ManualSource::default();
    let mut tracker = UserInputTracker::new(
        source.clone(),
        |_: &UserInputAggregate| {},
        Duration::from_secs(60),
        TrackerOptions::default(),
    )
    .unwrap();

    tracker.start().unwrap();
    tracker.start().unwrap();

    assert!(tracker.is_running());
    assert_eq!(source.subscriptions(), 4);
    assert_eq!(source.starts(), 1);

    tracker.stop();
    assert!(!tracker.is_running());
}

#[test]
fn test_stop_keeps_buffers_and_cursor() {
    let t0 = Utc::now();
    let clock = ManualClock::new(t0);
    let source = ManualSource::default();
    let (mut tracker, _) = manual_tracker(&source, &clock, false);

    tracker.tick();
    clock.set(t0 + ChronoDuration::milliseconds(300));
    source.key('a');
    source.click();

    tracker.start().unwrap();
    assert!(source.is_running());
    tracker.stop();

    assert!(!tracker.is_running());
    assert!(!source.is_running());
    assert_eq!(tracker.buffered(EventKind::Keystroke), 1);
    assert_eq!(tracker.buffered(EventKind::Click), 1);
    assert_eq!(tracker.previous_end(), Some(t0));
    assert_eq!(source.subscriptions(), 4);

    clock.set(t0 + ChronoDuration::milliseconds(1000));
    let aggregate = tracker.aggregate();
    assert_eq!(aggregate.ts_start, t0);
    assert_eq!(aggregate.key_total, 1);
    assert_eq!(aggregate.click_total, 1);
}

#[test]
fn test_terminate_unsubscribes_source() {
    let clock = ManualClock::new(Utc::now());
    let source = ManualSource::default();
    let (mut tracker, _) = manual_tracker(&source, &clock, false);

    tracker.terminate();
    assert!(!tracker.is_running());
    assert!(!source.key('a'));
    assert!(tracker.start().is_err());
}

#[test]
fn test_terminate_rejects_misbehaving_source() {
    let clock = ManualClock::new(Utc::now());
    let source = ManualSource::misbehaving();
    let (mut tracker, _) = manual_tracker(&source, &clock, false);

    tracker.terminate();

    // Handler still wired up, but the tracker refuses the event
    assert!(source.key('a'));
    assert!(source.click());
    assert_eq!(tracker.buffered(EventKind::Keystroke), 0);
    assert_eq!(tracker.buffered(EventKind::Click), 0);
    assert_eq!(tracker.stats().snapshot().rejected_after_terminate, 2);
}

#[test]
fn test_timer_ticks_contiguously() {
    let (collected, sink) = collecting_sink();
    let mut tracker = UserInputTracker::new(
        ManualSource::default(),
        sink,
        Duration::from_millis(50),
        TrackerOptions::default(),
    )
    .unwrap();

    tracker.start().unwrap();
    tracker.start().unwrap();
    thread::sleep(Duration::from_millis(500));
    tracker.stop();

    let aggregates = collected.lock().unwrap();
    assert!(aggregates.len() >= 2, "only {} ticks", aggregates.len());
    for pair in aggregates.windows(2) {
        assert_eq!(pair[1].ts_start, pair[0].ts_end);
    }
    // A second timer would push the cursor ahead of wall-clock time
    assert!(aggregates.last().unwrap().ts_end <= Utc::now());
}

#[test]
fn test_no_ticks_after_stop() {
    let (collected, sink) = collecting_sink();
    let mut tracker = UserInputTracker::new(
        ManualSource::default(),
        sink,
        Duration::from_millis(20),
        TrackerOptions::default(),
    )
    .unwrap();

    tracker.start().unwrap();
    thread::sleep(Duration::from_millis(100));
    tracker.stop();

    let count = collected.lock().unwrap().len();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(collected.lock().unwrap().len(), count);
}

#[test]
fn test_channel_source_end_to_end() {
    let source = ChannelSource::new();
    let feed = source.feed();
    let (collected, sink) = collecting_sink();

    let mut tracker = UserInputTracker::new(
        source,
        sink,
        Duration::from_millis(100),
        TrackerOptions::default(),
    )
    .unwrap();

    // Queued before start, delivered once the source runs
    for _ in 0..5 {
        assert!(feed.send(RawEvent::Click(RawClick { clicks: Some(1) })));
    }
    tracker.start().unwrap();
    let started_at = Utc::now();

    for _ in 0..20 {
        assert!(feed.send(RawEvent::Keystroke(RawKeystroke::with_char('k'))));
    }

    let deadline = Instant::now() + Duration::from_secs(3);
    let mut total = 0;
    while Instant::now() < deadline {
        total = collected
            .lock()
            .unwrap()
            .iter()
            .map(|a| a.key_total)
            .sum::<u64>();
        if total == 20 {
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }
    tracker.terminate();

    let aggregates = collected.lock().unwrap();
    assert!(aggregates[0].ts_start <= started_at);
    assert_eq!(total, 20);
    assert_eq!(aggregates.iter().map(|a| a.click_total).sum::<u64>(), 5);

    let stats = tracker.stats().snapshot();
    assert_eq!(stats.keystrokes, 20);
    assert_eq!(stats.clicks, 5);
    assert_eq!(stats.stale_events_dropped, 0);
}
