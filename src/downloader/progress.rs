// Progress reporting: engine progress lines -> session events

use regex::Regex;
use thiserror::Error;

use super::messages;
use super::models::{DownloadSession, ProgressEvent, ProgressPhase};
use super::traits::ProgressEmitter;

/// `--progress-template` handed to yt-dlp. Every field is printed as `NA` when unknown.
pub const PROGRESS_TEMPLATE: &str = "download:[progress] %(progress.status)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s|%(progress.speed)s";

/// Parse one stdout line produced by [`PROGRESS_TEMPLATE`].
/// Returns `None` for anything else yt-dlp prints.
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    lazy_static::lazy_static! {
        static ref PROGRESS_RE: Regex = Regex::new(
            r"^\[progress\]\s+(\w+)\|([^|]*)\|([^|]*)\|([^|]*)\|([^|]*?)\s*$"
        ).unwrap();
    }

    let caps = PROGRESS_RE.captures(line.trim_start())?;
    let phase = match caps.get(1)?.as_str() {
        "downloading" => ProgressPhase::Downloading,
        "finished" => ProgressPhase::Finished,
        _ => return None,
    };

    let downloaded_bytes = parse_bytes(caps.get(2)?.as_str()).unwrap_or(0);
    let total_bytes =
        parse_bytes(caps.get(3)?.as_str()).or_else(|| parse_bytes(caps.get(4)?.as_str()));
    let speed = parse_number(caps.get(5)?.as_str());

    Some(ProgressEvent {
        phase,
        downloaded_bytes,
        total_bytes,
        speed,
    })
}

fn parse_number(field: &str) -> Option<f64> {
    let field = field.trim();
    if field.is_empty() || field == "NA" || field == "None" {
        return None;
    }
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_bytes(field: &str) -> Option<u64> {
    parse_number(field)
        .filter(|v| *v >= 0.0)
        .map(|v| v as u64)
}

/// Whole-number percentage, rounded down and capped at 100
pub fn percent_of(downloaded: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let percent = (u128::from(downloaded) * 100) / u128::from(total);
    Some(percent.min(100) as u8)
}

#[derive(Debug, Error, PartialEq)]
enum ReportError {
    #[error("invalid transfer speed {0}")]
    InvalidSpeed(f64),
    #[error("item counter {completed} exceeds total {total}")]
    CounterOverflow { completed: u32, total: u32 },
}

/// Turns engine progress into status lines for one session.
///
/// Reporting problems are logged and swallowed so they never abort a download.
pub struct ProgressReporter<'a> {
    session: &'a mut DownloadSession,
    emitter: &'a ProgressEmitter,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(session: &'a mut DownloadSession, emitter: &'a ProgressEmitter) -> Self {
        Self { session, emitter }
    }

    pub fn on_progress(&mut self, event: ProgressEvent) {
        if let Err(e) = self.report(event) {
            tracing::warn!(error = %e, ?event, "progress event ignored");
        }
    }

    fn report(&mut self, event: ProgressEvent) -> Result<(), ReportError> {
        match event.phase {
            ProgressPhase::Downloading => {
                let Some(percent) = event
                    .total_bytes
                    .and_then(|total| percent_of(event.downloaded_bytes, total))
                else {
                    return Ok(());
                };
                let speed_mb = match event.speed {
                    None => 0.0,
                    Some(s) if s.is_finite() && s >= 0.0 => s / 1024.0 / 1024.0,
                    Some(s) => return Err(ReportError::InvalidSpeed(s)),
                };

                self.emitter.percent(percent);
                self.emitter.status(messages::downloading(
                    self.session.current_item(),
                    self.session.total_items,
                    speed_mb,
                ));
            }
            ProgressPhase::Finished => {
                let total = self.session.total_items;
                if self.session.items_completed > total {
                    return Err(ReportError::CounterOverflow {
                        completed: self.session.items_completed,
                        total,
                    });
                }
                if self.session.is_complete() {
                    // Merged formats report one "finished" per stream.
                    tracing::debug!(total, "extra completion clamped");
                    return Ok(());
                }

                self.session.items_completed += 1;
                self.emitter.percent(0);
                if self.session.is_complete() {
                    self.emitter.status(messages::all_finished());
                } else {
                    self.emitter.status(messages::item_finished(
                        self.session.items_completed,
                        total,
                    ));
                }
            }
        }
        Ok(())
    }
}
