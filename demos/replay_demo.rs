//! Demonstration of the user input tracker.
//!
//! This example shows how to:
//! 1. Create a channel-fed input source
//! 2. Start a tracker with keystroke detail collection
//! 3. Feed synthetic events from a producer thread
//! 4. Receive aggregates through a channel sink
//!
//! Run with: cargo run --example replay_demo

use std::thread;
use std::time::{Duration, Instant};

use user_input_tracker::{
    ChannelSink, ChannelSource, RawClick, RawEvent, RawKeystroke, RawMove, RawScroll, Tracker,
    TrackerOptions, UserInputTracker,
};

fn main() {
    println!("User Input Tracker - Replay Demo");
    println!("================================");
    println!();

    let source = ChannelSource::new();
    let feed = source.feed();
    let (tx, rx) = crossbeam_channel::unbounded();

    let mut tracker = match UserInputTracker::new(
        source,
        ChannelSink::new(tx),
        Duration::from_secs(1),
        TrackerOptions::default().collect_key_details(true),
    ) {
        Ok(tracker) => tracker,
        Err(e) => {
            eprintln!("Error creating tracker: {e}");
            return;
        }
    };

    if let Err(e) = tracker.start() {
        eprintln!("Error starting tracker: {e}");
        return;
    }
    println!("Feeding synthetic input for 5 seconds...");
    println!();

    // Producer: type a sentence, wander the pointer, scroll now and then
    let producer = thread::spawn(move || {
        let text = "hello world 42\n";
        let start = Instant::now();
        let mut step = 0u32;
        while start.elapsed() < Duration::from_secs(5) {
            let c = text.chars().nth(step as usize % text.len()).unwrap_or(' ');
            feed.send(RawEvent::Keystroke(RawKeystroke::with_char(c)));

            let t = step as f64 / 10.0;
            feed.send(RawEvent::Move(RawMove {
                x: 100.0 * t.cos(),
                y: 100.0 * t.sin(),
            }));

            if step % 10 == 0 {
                feed.send(RawEvent::Click(RawClick { clicks: Some(1) }));
            }
            if step % 7 == 0 {
                feed.send(RawEvent::Scroll(RawScroll {
                    amount: 3.0,
                    rotation: if step % 2 == 0 { 1.0 } else { -1.0 },
                }));
            }

            step += 1;
            thread::sleep(Duration::from_millis(40));
        }
    });

    let deadline = Instant::now() + Duration::from_secs(6);
    while Instant::now() < deadline {
        if let Ok(aggregate) = rx.recv_timeout(Duration::from_millis(200)) {
            println!("=== Window {} ===", aggregate.ts_end.format("%H:%M:%S%.3f"));
            println!("  Keys: {}", aggregate.key_total);
            println!("  Clicks: {}", aggregate.click_total);
            println!("  Moved: {:.1}", aggregate.moved_distance);
            println!("  Scrolled: {:.1}", aggregate.scroll_delta);
            if let Some(details) = aggregate.key_details {
                println!(
                    "  Letters/numbers/spaces/enter: {}/{}/{}/{}",
                    details.keys_letter, details.keys_number, details.keys_space, details.keys_enter
                );
            }
            println!();
        }
    }

    let _ = producer.join();
    tracker.terminate();

    println!("{}", tracker.stats().summary());
    println!();
    println!("Demo complete!");
}
