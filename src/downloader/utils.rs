// Helper functions for engine and resolver implementations

use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration};

use super::errors::DownloadError;

/// Run command with timeout, collecting stdout and stderr
pub async fn run_output_with_timeout(
    program: &str,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<std::process::Output, DownloadError> {
    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| DownloadError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| DownloadError::ToolNotFound(format!("no stdout from {}", program)))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| DownloadError::ToolNotFound(format!("no stderr from {}", program)))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
        Ok(status) => {
            let status = status.map_err(|e| DownloadError::io("wait for", program, e))?;
            let stdout = join_pipe(stdout_task, program).await?;
            let stderr = join_pipe(stderr_task, program).await?;
            Ok(std::process::Output {
                status,
                stdout,
                stderr,
            })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(DownloadError::Timeout(timeout_secs))
        }
    }
}

async fn join_pipe(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
    program: &str,
) -> Result<Vec<u8>, DownloadError> {
    match task.await {
        Ok(read) => read.map_err(|e| DownloadError::io("read output of", program, e)),
        Err(e) => Err(DownloadError::io(
            "read output of",
            program,
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        )),
    }
}

/// Build proxy arguments for yt-dlp
pub fn proxy_args(proxy: Option<&str>) -> Vec<String> {
    match proxy {
        Some(p) if !p.trim().is_empty() => vec!["--proxy".to_string(), p.trim().to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_args_skip_blank() {
        assert!(proxy_args(None).is_empty());
        assert!(proxy_args(Some("  ")).is_empty());
        assert_eq!(
            proxy_args(Some("socks5h://127.0.0.1:1080")),
            vec!["--proxy", "socks5h://127.0.0.1:1080"]
        );
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let err = run_output_with_timeout("definitely-not-a-real-binary-xyz", Vec::new(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Spawn { .. }));
    }
}
