//! Architectural Enforcement Integration Tests
//!
//! Source scans that keep the workspace honest:
//! - No thread sleeps in production code
//! - No blocking I/O inside async functions
//! - The CLI only reads the exchange log, never writes it
//!
//! The scans are textual. Everything from a file's `#[cfg(test)]` module on
//! is treated as test code and skipped.

use std::fs;
use std::path::{Path, PathBuf};

/// A rule hit in one source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File the line came from
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// What rule was broken
    pub rule: &'static str,
    /// The offending source line, trimmed
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} - {}: {}",
            self.path.display(),
            self.line,
            self.rule,
            self.text
        )
    }
}

/// Workspace root, two levels above this package
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Every `.rs` file under `dir`, relative to the workspace root
#[must_use]
pub fn rust_sources(dir: &str) -> Vec<PathBuf> {
    let root = workspace_root().join(dir);
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Lines of a file that belong to production code
///
/// Stops at the first `#[cfg(test)]`.
#[must_use]
pub fn production_lines(content: &str) -> Vec<&str> {
    content
        .lines()
        .take_while(|line| line.trim() != "#[cfg(test)]")
        .collect()
}

/// The code part of a line: comments stripped
#[must_use]
pub fn code_part(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.starts_with("//") {
        return "";
    }
    line.split("//").next().unwrap_or(line)
}

/// Whether the line at `idx` sits inside an `async fn`
///
/// Scans backwards for the nearest function header.
#[must_use]
pub fn is_in_async_function(lines: &[&str], idx: usize) -> bool {
    for i in (0..=idx).rev() {
        let line = code_part(lines[i]).trim();

        if line.contains("async fn ") {
            return true;
        }
        if line.starts_with("fn ") || line.contains(" fn ") {
            return false;
        }
        if line.starts_with("mod ") || (line.starts_with("impl") && line.contains('{')) {
            return false;
        }
    }
    false
}

/// Apply `check` to every production line of every file under `dir`
pub fn scan<F>(dir: &str, mut check: F) -> Vec<Violation>
where
    F: FnMut(&[&str], usize, &str) -> Option<&'static str>,
{
    let mut violations = Vec::new();

    for path in rust_sources(dir) {
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        let lines = production_lines(&content);

        for (idx, line) in lines.iter().enumerate() {
            let code = code_part(line);
            if code.trim().is_empty() {
                continue;
            }
            if let Some(rule) = check(&lines, idx, code) {
                violations.push(Violation {
                    path: path.clone(),
                    line: idx + 1,
                    rule,
                    text: line.trim().to_string(),
                });
            }
        }
    }

    violations
}

/// Print violations and fail the calling test
///
/// # Panics
///
/// Panics when `violations` is not empty.
pub fn report(title: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n{title}\n");
    for violation in violations {
        eprintln!("  {violation}");
    }
    panic!("\nFound {} violation(s).", violations.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let content = "fn a() {}\n\n#[cfg(test)]\nmod tests {\n    fn b() {}\n}\n";
        assert_eq!(production_lines(content), vec!["fn a() {}", ""]);
    }

    #[test]
    fn test_code_part_strips_comments() {
        assert_eq!(code_part("    // std::thread::sleep(d)"), "");
        assert_eq!(code_part("    /// std::fs docs"), "");
        assert_eq!(code_part("let x = 1; // note"), "let x = 1; ");
    }

    #[test]
    fn test_async_function_detection() {
        let code = vec![
            "pub async fn load() {",
            "    let text = std::fs::read_to_string(\"a\");",
            "}",
            "fn sync_load() {",
            "    let text = std::fs::read_to_string(\"a\");",
            "}",
        ];
        assert!(is_in_async_function(&code, 1));
        assert!(!is_in_async_function(&code, 4));
    }

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
        assert!(!rust_sources("session/core/src").is_empty());
    }
}
