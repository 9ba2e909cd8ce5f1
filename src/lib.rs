pub mod config;
pub mod downloader;
pub mod logging;

#[cfg(feature = "desktop")]
mod commands;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use commands::{get_default_output_dir, get_engine_status, get_runner_state, start_download, AppState};

    logging::init_tracing();
    let config = config::AppConfig::load();
    tracing::info!(output_dir = %config.resolved_output_dir().display(), "starting desktop app");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(AppState::new(config))
        .invoke_handler(tauri::generate_handler![
            start_download,
            get_runner_state,
            get_engine_status,
            get_default_output_dir,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
