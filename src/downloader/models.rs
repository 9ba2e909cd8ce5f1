// Common data models for the download core

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What the user wants out of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Audio,
    Video,
}

impl FormatKind {
    /// yt-dlp `-f` selector for this kind
    pub fn format_selector(&self) -> &'static str {
        match self {
            Self::Audio => "bestaudio/best",
            Self::Video => "bestvideo+bestaudio/best",
        }
    }

    /// Container for merged video+audio streams
    pub fn merge_output_format(&self) -> Option<&'static str> {
        match self {
            Self::Audio => None,
            Self::Video => Some("mp4"),
        }
    }
}

/// One user submission. Never changes after the session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub format: FormatKind,
    pub is_playlist: bool,
    pub add_index_prefix: bool,
    pub output_dir: PathBuf,
    /// Move finished playlist files into `<output_dir>/Playlists/<title>`
    #[serde(default)]
    pub export_to_playlist_folder: bool,
}

/// Mutable state of a running session, owned by the orchestrator
#[derive(Debug, Clone)]
pub struct DownloadSession {
    pub request: DownloadRequest,
    pub working_dir: PathBuf,
    pub playlist_title: String,
    pub total_items: u32,
    pub items_completed: u32,
}

impl DownloadSession {
    pub fn new(
        request: DownloadRequest,
        working_dir: PathBuf,
        playlist_title: String,
        total_items: u32,
    ) -> Self {
        Self {
            request,
            working_dir,
            playlist_title,
            total_items: total_items.max(1),
            items_completed: 0,
        }
    }

    /// 1-based index of the item currently downloading
    pub fn current_item(&self) -> u32 {
        (self.items_completed + 1).min(self.total_items)
    }

    pub fn is_complete(&self) -> bool {
        self.items_completed >= self.total_items
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Downloading,
    Finished,
}

/// A single progress report from the engine. Consumed immediately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    pub downloaded_bytes: u64,
    /// Exact size, or the engine's estimate when the exact one is unknown
    pub total_bytes: Option<u64>,
    /// Bytes per second
    pub speed: Option<f64>,
}

/// Terminal outcome of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub succeeded: bool,
    pub output_dir: PathBuf,
    pub playlist_title: String,
    pub total_items: u32,
}

/// Playlist metadata from the resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistMeta {
    pub title: String,
    pub item_count: u32,
}

/// Notification sent from the worker to the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    Progress { percent: u8 },
    Status { message: String },
    Finished(DownloadResult),
}

/// Everything the engine needs for one invocation
#[derive(Debug, Clone)]
pub struct EngineJob {
    pub url: String,
    pub format: FormatKind,
    pub working_dir: PathBuf,
    pub output_template: String,
    pub is_playlist: bool,
    pub retries: u32,
    pub fragment_retries: u32,
}

/// What a successful engine run left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineReport {
    /// `ERROR:` lines of playlist entries that were skipped
    pub skipped: Vec<String>,
}
