// Error types for the download core

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// yt-dlp could not be found on this machine
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The engine process could not be started
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine exited with a non-zero status
    #[error("{}", exit_message(.code, .stderr))]
    EngineFailed { code: Option<i32>, stderr: String },

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A child process did not finish in time
    #[error("Timed out after {0}s")]
    Timeout(u64),

    /// Filesystem operation failed
    #[error("{} {}: {}", .action, .path.display(), .source)]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// yt-dlp prints a lot of noise; the `ERROR:` lines are what a user needs.
fn error_lines(stderr: &str) -> impl Iterator<Item = &str> {
    stderr
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("ERROR:"))
}

fn exit_message(code: &Option<i32>, stderr: &str) -> String {
    let important: Vec<&str> = error_lines(stderr).take(2).collect();

    let detail = if !important.is_empty() {
        important.join(" | ")
    } else {
        stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("no output")
            .chars()
            .take(200)
            .collect()
    };

    match code {
        Some(code) => format!("yt-dlp exited with code {}: {}", code, detail),
        None => format!("yt-dlp was terminated: {}", detail),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_failure_prefers_error_lines() {
        let err = DownloadError::EngineFailed {
            code: Some(1),
            stderr: "WARNING: something\nERROR: [youtube] abc: Video unavailable\nmore".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "yt-dlp exited with code 1: ERROR: [youtube] abc: Video unavailable"
        );
    }

    #[test]
    fn engine_failure_falls_back_to_last_line() {
        let err = DownloadError::EngineFailed {
            code: None,
            stderr: "first\nlast line\n\n".to_string(),
        };
        assert_eq!(err.to_string(), "yt-dlp was terminated: last line");
    }
}
