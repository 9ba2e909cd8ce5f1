use tracing_subscriber::EnvFilter;

/// Install the global subscriber once. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "playlist_downloader_lib=info,ytdlp=warn".into());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
