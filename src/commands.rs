// Tauri commands for the desktop window

use std::path::PathBuf;
use tauri::Emitter;

use crate::config::AppConfig;
use crate::downloader::tools::{self, EngineStatus};
use crate::downloader::{
    BackgroundRunner, DownloadOrchestrator, DownloadRequest, FormatKind, RunnerState, SessionEvent,
};

pub const SESSION_EVENT: &str = "download-event";

pub struct AppState {
    runner: BackgroundRunner,
    config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            runner: BackgroundRunner::new(DownloadOrchestrator::from_config(&config)),
            config,
        }
    }
}

/// Start a download. Resolves to `false` when one is already running.
#[tauri::command]
pub fn start_download(
    url: String,
    format: FormatKind,
    is_playlist: bool,
    add_index_prefix: bool,
    export_to_playlist_folder: Option<bool>,
    output_dir: Option<String>,
    state: tauri::State<'_, AppState>,
    app_handle: tauri::AppHandle,
) -> Result<bool, String> {
    let output_dir = output_dir
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| state.config.resolved_output_dir());

    let request = DownloadRequest {
        url,
        format,
        is_playlist,
        add_index_prefix,
        output_dir,
        export_to_playlist_folder: export_to_playlist_folder.unwrap_or(false),
    };

    let Some(handle) = state.runner.start(request) else {
        return Ok(false);
    };

    let (mut events, _worker) = handle.into_parts();
    let open_folder = state.config.open_folder_on_success;
    tauri::async_runtime::spawn(async move {
        while let Some(event) = events.recv().await {
            if let SessionEvent::Finished(result) = &event {
                if result.succeeded && open_folder {
                    if let Err(e) = tauri_plugin_opener::open_path(&result.output_dir, None::<&str>) {
                        tracing::warn!(error = %e, dir = %result.output_dir.display(), "could not open folder");
                    }
                }
            }
            if let Err(e) = app_handle.emit(SESSION_EVENT, &event) {
                tracing::warn!(error = %e, "failed to forward session event");
            }
        }
    });

    Ok(true)
}

#[tauri::command]
pub fn get_runner_state(state: tauri::State<'_, AppState>) -> RunnerState {
    state.runner.state()
}

#[tauri::command]
pub async fn get_engine_status(state: tauri::State<'_, AppState>) -> Result<EngineStatus, String> {
    Ok(tools::engine_status(state.config.ytdlp_path.as_deref()))
}

#[tauri::command]
pub fn get_default_output_dir(state: tauri::State<'_, AppState>) -> String {
    state.config.resolved_output_dir().to_string_lossy().to_string()
}
