//! Integration Test: Blocking I/O Prohibition
//!
//! Async functions must not block the runtime. Blocking I/O is fine in plain
//! functions that run before or outside the async paths (config loading).
//!
//! **Forbidden in async fns**: `std::fs`, `std::net`, `reqwest::blocking`,
//! `std::io::stdin()`

use architectural_enforcement::{is_in_async_function, report, scan, Violation};

fn blocking_call(code: &str) -> Option<&'static str> {
    if code.contains("reqwest::blocking") {
        // Never acceptable, async or not
        return Some("Blocking HTTP client");
    }
    None
}

fn blocking_call_in_async(code: &str) -> Option<&'static str> {
    if code.contains("std::fs::") {
        Some("Blocking file I/O in async fn")
    } else if code.contains("std::net::") {
        Some("Blocking network I/O in async fn")
    } else if code.contains("std::io::stdin()") {
        Some("Blocking stdin in async fn")
    } else {
        None
    }
}

fn find_blocking_io_violations() -> Vec<Violation> {
    let mut violations = Vec::new();

    for dir in ["session/core/src", "session/cli/src"] {
        violations.extend(scan(dir, |lines, idx, code| {
            blocking_call(code).or_else(|| {
                if is_in_async_function(lines, idx) {
                    blocking_call_in_async(code)
                } else {
                    None
                }
            })
        }));
    }

    violations
}

#[test]
fn test_no_blocking_io_in_async_code() {
    report(
        "Blocking I/O found in async code. Use tokio::fs, tokio::net, tokio::io or async reqwest.",
        &find_blocking_io_violations(),
    );
}

#[test]
fn test_detector_flags_blocking_read_in_async_fn() {
    let lines = vec![
        "pub async fn refresh() {",
        "    let raw = std::fs::read_to_string(path)?;",
        "}",
    ];
    assert!(is_in_async_function(&lines, 1));
    assert!(blocking_call_in_async(lines[1]).is_some());
    assert!(blocking_call("let client = reqwest::blocking::Client::new();").is_some());
}
