// Orchestrator: one request in, exactly one DownloadResult out

use std::fs;

use crate::config::{self, AppConfig};

use super::backends::YtDlpEngine;
use super::errors::DownloadError;
use super::export::PlaylistExporter;
use super::extractors::YtDlpPlaylistResolver;
use super::messages;
use super::models::{
    DownloadRequest, DownloadResult, DownloadSession, EngineJob, EngineReport, PlaylistMeta,
    ProgressEvent,
};
use super::naming::{self, DEFAULT_PLAYLIST_TITLE};
use super::progress::ProgressReporter;
use super::traits::{DownloadEngine, PlaylistResolver, ProgressEmitter};

pub struct DownloadOrchestrator {
    engine: Box<dyn DownloadEngine>,
    resolver: Box<dyn PlaylistResolver>,
    retries: u32,
    fragment_retries: u32,
}

impl DownloadOrchestrator {
    pub fn new(engine: Box<dyn DownloadEngine>, resolver: Box<dyn PlaylistResolver>) -> Self {
        let defaults = AppConfig::default();
        Self {
            engine,
            resolver,
            retries: defaults.retries,
            fragment_retries: defaults.fragment_retries,
        }
    }

    /// yt-dlp for both metadata and downloads
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Box::new(YtDlpEngine::new(config)),
            Box::new(YtDlpPlaylistResolver::new(config)),
        )
        .with_retries(config.retries, config.fragment_retries)
    }

    pub fn with_retries(mut self, retries: u32, fragment_retries: u32) -> Self {
        self.retries = retries;
        self.fragment_retries = fragment_retries;
        self
    }

    /// Run one session to completion. Every failure ends up in the result
    /// and on the status channel; nothing is propagated to the caller.
    pub async fn run(&self, request: &DownloadRequest, emitter: &ProgressEmitter) -> DownloadResult {
        let base_dir = config::absolute(&request.output_dir);

        if request.url.trim().is_empty() {
            emitter.status(messages::invalid_url());
            return DownloadResult {
                succeeded: false,
                output_dir: base_dir,
                playlist_title: DEFAULT_PLAYLIST_TITLE.to_string(),
                total_items: 1,
            };
        }

        let meta = self.playlist_meta(request).await;
        let working_dir = base_dir.join(naming::working_dir_name(&meta.title));
        let mut session =
            DownloadSession::new(request.clone(), working_dir, meta.title, meta.item_count);

        if let Err(e) = fs::create_dir_all(&session.working_dir) {
            let err = DownloadError::io("create", &session.working_dir, e);
            tracing::error!(error = %err, "cannot prepare working directory");
            emitter.status(messages::error(&err));
            return Self::finish(&session, session.working_dir.clone(), false, emitter);
        }

        let job = EngineJob {
            url: request.url.trim().to_string(),
            format: request.format,
            working_dir: session.working_dir.clone(),
            output_template: naming::build_output_template(
                request.is_playlist,
                request.add_index_prefix,
                session.total_items,
            ),
            is_playlist: request.is_playlist,
            retries: self.retries,
            fragment_retries: self.fragment_retries,
        };

        emitter.status(messages::starting(session.current_item(), session.total_items));
        tracing::info!(
            engine = self.engine.name(),
            url = %job.url,
            items = session.total_items,
            template = %job.output_template,
            "download started"
        );

        let outcome = {
            let mut reporter = ProgressReporter::new(&mut session, emitter);
            let mut on_progress = |event: ProgressEvent| reporter.on_progress(event);
            self.engine.download(&job, &mut on_progress).await
        };

        let succeeded = match outcome {
            Ok(EngineReport { skipped }) => {
                if !skipped.is_empty() {
                    emitter.status(messages::skipped_entries(&skipped));
                }
                true
            }
            Err(e) => {
                tracing::error!(engine = self.engine.name(), error = %e, "download failed");
                emitter.status(messages::error(&e));
                false
            }
        };

        let mut output_dir = session.working_dir.clone();
        if succeeded && request.is_playlist && request.export_to_playlist_folder {
            // Export problems are reported but do not change the outcome.
            if let Ok(dest) = PlaylistExporter::new(emitter).export(
                &session.working_dir,
                &base_dir,
                &session.playlist_title,
            ) {
                if let Err(e) = fs::remove_dir(&session.working_dir) {
                    tracing::debug!(error = %e, "working directory left in place");
                }
                output_dir = dest;
            }
        }

        Self::finish(&session, output_dir, succeeded, emitter)
    }

    async fn playlist_meta(&self, request: &DownloadRequest) -> PlaylistMeta {
        let fallback = PlaylistMeta {
            title: DEFAULT_PLAYLIST_TITLE.to_string(),
            item_count: 1,
        };
        if !request.is_playlist {
            return fallback;
        }

        match self.resolver.resolve(request.url.trim()).await {
            Ok(meta) => PlaylistMeta {
                item_count: meta.item_count.max(1),
                ..meta
            },
            Err(e) => {
                tracing::warn!(error = %e, url = %request.url, "playlist lookup failed, using defaults");
                fallback
            }
        }
    }

    fn finish(
        session: &DownloadSession,
        output_dir: std::path::PathBuf,
        succeeded: bool,
        emitter: &ProgressEmitter,
    ) -> DownloadResult {
        emitter.status(if succeeded {
            messages::session_succeeded()
        } else {
            messages::session_failed()
        });
        tracing::info!(
            succeeded,
            dir = %output_dir.display(),
            completed = session.items_completed,
            total = session.total_items,
            "session finished"
        );

        DownloadResult {
            succeeded,
            output_dir,
            playlist_title: session.playlist_title.clone(),
            total_items: session.total_items,
        }
    }
}
