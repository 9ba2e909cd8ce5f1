use async_trait::async_trait;

use crate::config::AppConfig;
use crate::downloader::errors::DownloadError;
use crate::downloader::models::PlaylistMeta;
use crate::downloader::tools;
use crate::downloader::traits::PlaylistResolver;
use crate::downloader::utils::{proxy_args, run_output_with_timeout};

/// Playlist title and length via `yt-dlp --flat-playlist -J`
pub struct YtDlpPlaylistResolver {
    ytdlp_path: Option<String>,
    proxy: Option<String>,
    timeout_secs: u64,
}

impl YtDlpPlaylistResolver {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            ytdlp_path: config.ytdlp_path.clone(),
            proxy: config.proxy.clone(),
            timeout_secs: config.metadata_timeout_secs,
        }
    }

    fn build_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--flat-playlist".to_string(),
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            "15".to_string(),
        ];
        args.extend(proxy_args(self.proxy.as_deref()));
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl PlaylistResolver for YtDlpPlaylistResolver {
    async fn resolve(&self, url: &str) -> Result<PlaylistMeta, DownloadError> {
        let program = tools::ytdlp_program(self.ytdlp_path.as_deref());
        let output = run_output_with_timeout(&program, self.build_args(url), self.timeout_secs).await?;

        if !output.status.success() {
            return Err(DownloadError::EngineFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let meta = parse_playlist_json(&output.stdout)?;
        tracing::info!(title = %meta.title, items = meta.item_count, "resolved playlist");
        Ok(meta)
    }
}

/// Extract `{title, item_count}` from yt-dlp's single-JSON dump
pub fn parse_playlist_json(stdout: &[u8]) -> Result<PlaylistMeta, DownloadError> {
    let json: serde_json::Value = serde_json::from_slice(stdout)
        .map_err(|e| DownloadError::ParseError(format!("Invalid JSON: {}", e)))?;

    if json["_type"].as_str() != Some("playlist") {
        return Err(DownloadError::ParseError(
            "URL does not point to a playlist".to_string(),
        ));
    }

    let title = json["title"]
        .as_str()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| DownloadError::ParseError("playlist has no title".to_string()))?
        .to_string();

    let count = json["playlist_count"]
        .as_u64()
        .or_else(|| json["entries"].as_array().map(|e| e.len() as u64))
        .unwrap_or(0);

    Ok(PlaylistMeta {
        title,
        item_count: u32::try_from(count).unwrap_or(u32::MAX).max(1),
    })
}
