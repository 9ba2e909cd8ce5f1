// Seams between the orchestrator and its external collaborators

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use super::errors::DownloadError;
use super::models::{
    DownloadResult, EngineJob, EngineReport, PlaylistMeta, ProgressEvent, SessionEvent,
};

/// External download engine (network I/O, extraction, file writing)
#[async_trait]
pub trait DownloadEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    /// Download everything behind `job.url`, reporting progress as it goes.
    /// Playlist entries the engine skipped are listed in the report.
    async fn download(
        &self,
        job: &EngineJob,
        on_progress: &mut (dyn FnMut(ProgressEvent) + Send),
    ) -> Result<EngineReport, DownloadError>;
}

/// External playlist metadata lookup
#[async_trait]
pub trait PlaylistResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<PlaylistMeta, DownloadError>;
}

/// Sending half of a session's notification channel.
///
/// Delivery is best-effort: a closed receiver never affects the download.
#[derive(Debug, Clone)]
pub struct ProgressEmitter {
    tx: UnboundedSender<SessionEvent>,
}

impl ProgressEmitter {
    pub fn new(tx: UnboundedSender<SessionEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn emit(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("session event dropped: receiver closed");
        }
    }

    pub fn status(&self, message: impl Into<String>) {
        self.emit(SessionEvent::Status {
            message: message.into(),
        });
    }

    pub fn percent(&self, percent: u8) {
        self.emit(SessionEvent::Progress { percent });
    }

    pub fn finished(&self, result: DownloadResult) {
        self.emit(SessionEvent::Finished(result));
    }
}
