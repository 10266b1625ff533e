//! Integration Test: Exchange Log Write Boundary
//!
//! The session controller is the only writer of the exchange log. Surfaces
//! read it through `log()` and never append, reset or build entries
//! themselves.

use architectural_enforcement::{report, scan, Violation};

const FORBIDDEN: [(&str, &str); 5] = [
    ("log().push(", "Appends to the exchange log"),
    (".push(Message", "Appends a message entry"),
    (".reset(", "Resets the exchange log"),
    ("Message::user(", "Builds a user entry"),
    ("Message::assistant(", "Builds an assistant entry"),
];

fn log_write(code: &str) -> Option<&'static str> {
    FORBIDDEN
        .iter()
        .find(|(pattern, _)| code.contains(pattern))
        .map(|(_, rule)| *rule)
}

fn find_log_write_violations() -> Vec<Violation> {
    scan("session/cli/src", |_, _, code| log_write(code))
}

#[test]
fn test_cli_never_writes_the_exchange_log() {
    report(
        "The CLI writes to the exchange log. Go through ChatSession::send instead.",
        &find_log_write_violations(),
    );
}

#[test]
fn test_detector_patterns() {
    assert!(log_write("session.log().push(entry);").is_some());
    assert!(log_write("entries.push(Message::user(text));").is_some());
    assert!(log_write("let n = session.log().len();").is_none());
    assert!(log_write("record.insert(name, value);").is_none());
}
