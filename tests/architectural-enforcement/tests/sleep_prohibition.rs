//! Integration Test: Sleep Prohibition
//!
//! Production code waits on events, never on the clock. Timeouts go through
//! `tokio::time::timeout`; nothing polls with a sleep.

use architectural_enforcement::{report, scan, Violation};

fn find_sleep_violations() -> Vec<Violation> {
    let mut violations = Vec::new();

    for dir in ["session/core/src", "session/cli/src"] {
        violations.extend(scan(dir, |_, _, code| {
            if code.contains("thread::sleep") {
                Some("Blocking thread sleep")
            } else if code.contains("time::sleep") || code.contains("sleep_until") {
                Some("Async sleep in production code")
            } else {
                None
            }
        }));
    }

    violations
}

#[test]
fn test_no_sleep_in_production_code() {
    report(
        "Sleep calls found in production code. Wait on a channel or use a timeout instead.",
        &find_sleep_violations(),
    );
}
