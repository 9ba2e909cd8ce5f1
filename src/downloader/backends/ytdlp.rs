use async_trait::async_trait;
use std::collections::VecDeque;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;

use crate::config::AppConfig;
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{EngineJob, EngineReport, ProgressEvent, ProgressPhase};
use crate::downloader::progress::{parse_progress_line, PROGRESS_TEMPLATE};
use crate::downloader::tools;
use crate::downloader::traits::DownloadEngine;
use crate::downloader::utils::proxy_args;

/// Lines of stderr kept for the failure message
const STDERR_TAIL: usize = 50;

/// yt-dlp's exit code when it skipped entries under `--ignore-errors`
const EXIT_ENTRIES_SKIPPED: i32 = 1;

#[derive(Debug, Default)]
struct StderrCapture {
    tail: String,
    errors: Vec<String>,
}

/// yt-dlp driven as a child process
pub struct YtDlpEngine {
    ytdlp_path: Option<String>,
    proxy: Option<String>,
}

impl YtDlpEngine {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            ytdlp_path: config.ytdlp_path.clone(),
            proxy: config.proxy.clone(),
        }
    }

    pub fn build_args(&self, job: &EngineJob) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            job.format.format_selector().to_string(),
            "-P".to_string(),
            job.working_dir.to_string_lossy().to_string(),
            "-o".to_string(),
            job.output_template.clone(),
            "--newline".to_string(),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
            "--retries".to_string(),
            job.retries.to_string(),
            "--fragment-retries".to_string(),
            job.fragment_retries.to_string(),
            "--force-overwrites".to_string(),
            "--continue".to_string(),
            "--no-warnings".to_string(),
            "--hls-prefer-native".to_string(),
        ];

        if job.is_playlist {
            // One broken entry must not stop the rest of the playlist
            args.push("--yes-playlist".to_string());
            args.push("--ignore-errors".to_string());
        } else {
            args.push("--no-playlist".to_string());
        }

        if let Some(container) = job.format.merge_output_format() {
            args.push("--merge-output-format".to_string());
            args.push(container.to_string());
        }

        args.extend(proxy_args(self.proxy.as_deref()));
        args.push(job.url.clone());
        args
    }
}

#[async_trait]
impl DownloadEngine for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn download(
        &self,
        job: &EngineJob,
        on_progress: &mut (dyn FnMut(ProgressEvent) + Send),
    ) -> Result<EngineReport, DownloadError> {
        let program = tools::ytdlp_program(self.ytdlp_path.as_deref());
        let args = self.build_args(job);
        tracing::info!(%program, url = %job.url, dir = %job.working_dir.display(), "starting yt-dlp");
        tracing::debug!(?args, "yt-dlp arguments");

        let mut child = TokioCommand::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    DownloadError::ToolNotFound(format!("{}: {}", program, source))
                } else {
                    DownloadError::Spawn {
                        program: program.clone(),
                        source,
                    }
                }
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::ToolNotFound("Failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::ToolNotFound("Failed to capture stderr".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL);
            let mut errors = Vec::new();
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(target: "ytdlp", "{}", line);
                if line.trim_start().starts_with("ERROR:") {
                    errors.push(line.trim().to_string());
                }
                if tail.len() == STDERR_TAIL {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            StderrCapture {
                tail: tail.into_iter().collect::<Vec<_>>().join("\n"),
                errors,
            }
        });

        let mut finished_items = 0u32;
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_progress_line(&line) {
                    Some(event) => {
                        if event.phase == ProgressPhase::Finished {
                            finished_items = finished_items.saturating_add(1);
                        }
                        on_progress(event)
                    }
                    None if !line.trim().is_empty() => {
                        tracing::debug!(target: "ytdlp", "{}", line)
                    }
                    None => {}
                },
                Ok(None) => break,
                Err(e) => {
                    // Non UTF-8 output; the process keeps running, we just stop listening.
                    tracing::warn!(error = %e, "stopped reading yt-dlp output");
                    break;
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| DownloadError::io("wait for", &program, e))?;
        let stderr = stderr_task.await.unwrap_or_default();

        settle(job, status.code(), finished_items, stderr)
    }
}

/// Map the exit status to the session outcome. A playlist run that
/// downloaded something and only skipped broken entries still counts.
fn settle(
    job: &EngineJob,
    code: Option<i32>,
    finished_items: u32,
    stderr: StderrCapture,
) -> Result<EngineReport, DownloadError> {
    match code {
        Some(0) => {
            tracing::info!(url = %job.url, "yt-dlp finished");
            Ok(EngineReport::default())
        }
        Some(EXIT_ENTRIES_SKIPPED) if job.is_playlist && finished_items > 0 => {
            for line in &stderr.errors {
                tracing::warn!(url = %job.url, "playlist entry skipped: {}", line);
            }
            tracing::info!(
                url = %job.url,
                finished_items,
                skipped = stderr.errors.len(),
                "yt-dlp finished with skipped entries"
            );
            Ok(EngineReport {
                skipped: stderr.errors,
            })
        }
        code => Err(DownloadError::EngineFailed {
            code,
            stderr: stderr.tail,
        }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::downloader::models::FormatKind;
    use std::path::PathBuf;

    fn job(format: FormatKind, is_playlist: bool) -> EngineJob {
        EngineJob {
            url: "https://www.youtube.com/watch?v=abc".to_string(),
            format,
            working_dir: PathBuf::from("/tmp/out"),
            output_template: "%(title)s.%(ext)s".to_string(),
            is_playlist,
            retries: 3,
            fragment_retries: 3,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn single_audio_args() {
        let engine = YtDlpEngine::new(&AppConfig::default());
        let args = engine.build_args(&job(FormatKind::Audio, false));

        assert_eq!(value_after(&args, "-f"), Some("bestaudio/best"));
        assert_eq!(value_after(&args, "-P"), Some("/tmp/out"));
        assert_eq!(value_after(&args, "-o"), Some("%(title)s.%(ext)s"));
        assert_eq!(value_after(&args, "--retries"), Some("3"));
        assert_eq!(value_after(&args, "--fragment-retries"), Some("3"));
        assert_eq!(value_after(&args, "--progress-template"), Some(PROGRESS_TEMPLATE));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args.contains(&"--force-overwrites".to_string()));
        assert!(!args.contains(&"--merge-output-format".to_string()));
        assert!(!args.contains(&"--proxy".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("https://www.youtube.com/watch?v=abc"));
    }

    #[test]
    fn playlist_video_args() {
        let config = AppConfig {
            proxy: Some("socks5h://127.0.0.1:1080".to_string()),
            ..AppConfig::default()
        };
        let engine = YtDlpEngine::new(&config);
        let args = engine.build_args(&job(FormatKind::Video, true));

        assert_eq!(value_after(&args, "-f"), Some("bestvideo+bestaudio/best"));
        assert_eq!(value_after(&args, "--merge-output-format"), Some("mp4"));
        assert_eq!(value_after(&args, "--proxy"), Some("socks5h://127.0.0.1:1080"));
        assert!(args.contains(&"--yes-playlist".to_string()));
        assert!(args.contains(&"--ignore-errors".to_string()));
        assert!(!args.contains(&"--no-playlist".to_string()));
    }

    fn capture(errors: &[&str]) -> StderrCapture {
        StderrCapture {
            tail: errors.join("\n"),
            errors: errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn skipped_playlist_entries_are_not_fatal() {
        let report = settle(
            &job(FormatKind::Audio, true),
            Some(1),
            2,
            capture(&["ERROR: [youtube] b: Private video"]),
        )
        .unwrap();
        assert_eq!(report.skipped, vec!["ERROR: [youtube] b: Private video"]);
    }

    #[test]
    fn exit_one_is_fatal_without_finished_items_or_outside_playlists() {
        let stderr = || capture(&["ERROR: [youtube] b: Private video"]);
        assert!(matches!(
            settle(&job(FormatKind::Audio, true), Some(1), 0, stderr()),
            Err(DownloadError::EngineFailed { code: Some(1), .. })
        ));
        assert!(matches!(
            settle(&job(FormatKind::Audio, false), Some(1), 1, stderr()),
            Err(DownloadError::EngineFailed { code: Some(1), .. })
        ));
        assert!(matches!(
            settle(&job(FormatKind::Audio, true), Some(2), 3, stderr()),
            Err(DownloadError::EngineFailed { code: Some(2), .. })
        ));
        assert!(matches!(
            settle(&job(FormatKind::Audio, true), None, 3, stderr()),
            Err(DownloadError::EngineFailed { code: None, .. })
        ));
    }

    /// Write an executable shell script standing in for yt-dlp.
    /// It honours `-P` so files land in the job's working directory.
    #[cfg(unix)]
    pub(crate) fn fake_ytdlp(dir: &std::path::Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-yt-dlp");
        let script = format!(
            "#!/bin/sh\nout=.\nwhile [ $# -gt 0 ]; do\n  case \"$1\" in -P) out=\"$2\"; shift;; esac\n  shift\ndone\ncd \"$out\" || exit 2\n{}\n",
            body
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    /// Three entries, the second one private: what `--ignore-errors` looks like
    #[cfg(unix)]
    pub(crate) const PLAYLIST_WITH_PRIVATE_ENTRY: &str = r#"
echo "[progress] downloading|50|100|NA|1000"
echo "[progress] finished|100|100|NA|NA"
: > 001-a.m4a
echo "ERROR: [youtube] b: Private video. Sign in if you've been granted access" >&2
echo "[progress] finished|100|100|NA|NA"
: > 003-c.m4a
exit 1"#;

    #[cfg(unix)]
    #[tokio::test]
    async fn child_exiting_one_after_skipping_an_entry_reports_it() {
        let bin = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let engine = YtDlpEngine::new(&AppConfig {
            ytdlp_path: Some(fake_ytdlp(bin.path(), PLAYLIST_WITH_PRIVATE_ENTRY)),
            ..AppConfig::default()
        });
        let mut playlist = job(FormatKind::Audio, true);
        playlist.working_dir = out.path().to_path_buf();

        let mut finished = 0;
        let mut count = |ev: ProgressEvent| {
            if ev.phase == ProgressPhase::Finished {
                finished += 1;
            }
        };
        let report = engine.download(&playlist, &mut count).await.unwrap();

        assert_eq!(finished, 2);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].contains("Private video"));
        assert!(out.path().join("001-a.m4a").is_file());
        assert!(out.path().join("003-c.m4a").is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn child_failing_before_any_item_is_an_error() {
        let bin = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let engine = YtDlpEngine::new(&AppConfig {
            ytdlp_path: Some(fake_ytdlp(
                bin.path(),
                "echo \"ERROR: [youtube] PL1: This playlist does not exist\" >&2\nexit 1",
            )),
            ..AppConfig::default()
        });
        let mut playlist = job(FormatKind::Audio, true);
        playlist.working_dir = out.path().to_path_buf();

        let mut sink = |_ev: ProgressEvent| {};
        let err = engine.download(&playlist, &mut sink).await.unwrap_err();
        assert!(err.to_string().contains("This playlist does not exist"));
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let engine = YtDlpEngine::new(&AppConfig::default());
        // Only meaningful where yt-dlp is not installed.
        if tools::locate_ytdlp(None).is_some() {
            return;
        }
        let mut sink = |_ev: ProgressEvent| {};
        let err = engine
            .download(&job(FormatKind::Audio, false), &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::ToolNotFound(_)));
    }
}
