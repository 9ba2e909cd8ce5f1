// Downloader module - orchestration around yt-dlp

pub mod backends;
pub mod errors;
pub mod export;
pub mod extractors;
pub mod messages;
pub mod models;
pub mod naming;
pub mod orchestrator;
pub mod progress;
pub mod runner;
pub mod tools;
pub mod traits;
pub mod utils;

pub use errors::DownloadError;
pub use export::PlaylistExporter;
pub use models::{
    DownloadRequest, DownloadResult, DownloadSession, EngineReport, FormatKind, ProgressEvent,
    ProgressPhase, SessionEvent,
};
pub use orchestrator::DownloadOrchestrator;
pub use progress::ProgressReporter;
pub use runner::{BackgroundRunner, Outcome, RunnerState, SessionHandle};
pub use traits::{DownloadEngine, PlaylistResolver, ProgressEmitter};
