use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

const YTDLP: &str = "yt-dlp";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub name: String,
    pub version: Option<String>,
    pub path: Option<String>,
    pub is_available: bool,
}

fn binary_name() -> String {
    if cfg!(windows) {
        format!("{}.exe", YTDLP)
    } else {
        YTDLP.to_string()
    }
}

/// Find yt-dlp: explicit override first, then common install paths, then PATH
pub fn locate_ytdlp(override_path: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        let path = Path::new(path);
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "configured yt-dlp path does not exist");
    }

    let common_paths = [
        "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
        "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac
        "/usr/bin/yt-dlp",
    ];
    if let Some(found) = common_paths.iter().map(Path::new).find(|p| p.is_file()) {
        return Some(found.to_path_buf());
    }

    let name = binary_name();
    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(&name))
            .find(|candidate| candidate.is_file())
    })
}

/// Program to spawn. Falls back to the bare name and lets the OS resolve it.
pub fn ytdlp_program(override_path: Option<&str>) -> String {
    locate_ytdlp(override_path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| YTDLP.to_string())
}

fn version_of(path: &Path) -> Option<String> {
    match Command::new(path).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let out = String::from_utf8_lossy(&output.stdout).trim().to_string();
            (!out.is_empty()).then_some(out)
        }
        _ => None,
    }
}

pub fn engine_status(override_path: Option<&str>) -> EngineStatus {
    let path = locate_ytdlp(override_path);
    let version = path.as_deref().and_then(version_of);

    EngineStatus {
        name: YTDLP.to_string(),
        is_available: path.is_some(),
        path: path.map(|p| p.to_string_lossy().to_string()),
        version,
    }
}
