// Moves a finished playlist into `<base>/Playlists/<title>`

use std::fs;
use std::path::{Path, PathBuf};

use super::errors::DownloadError;
use super::messages;
use super::naming;
use super::traits::ProgressEmitter;

pub const PLAYLISTS_DIR: &str = "Playlists";

pub struct PlaylistExporter<'a> {
    emitter: &'a ProgressEmitter,
}

impl<'a> PlaylistExporter<'a> {
    pub fn new(emitter: &'a ProgressEmitter) -> Self {
        Self { emitter }
    }

    /// Move every regular file from `source_dir` into the playlist folder.
    ///
    /// Not transactional: a failure part-way leaves files in both places.
    pub fn export(
        &self,
        source_dir: &Path,
        base_dir: &Path,
        playlist_title: &str,
    ) -> Result<PathBuf, DownloadError> {
        match move_files(source_dir, &destination(base_dir, playlist_title)) {
            Ok((dest, moved)) => {
                tracing::info!(dest = %dest.display(), moved, "playlist exported");
                self.emitter.status(messages::exported(playlist_title));
                Ok(dest)
            }
            Err(e) => {
                tracing::error!(error = %e, source = %source_dir.display(), "playlist export failed");
                self.emitter.status(messages::export_failed(&e));
                Err(e)
            }
        }
    }
}

pub fn destination(base_dir: &Path, playlist_title: &str) -> PathBuf {
    base_dir
        .join(PLAYLISTS_DIR)
        .join(naming::working_dir_name(playlist_title))
}

fn move_files(source_dir: &Path, dest: &Path) -> Result<(PathBuf, usize), DownloadError> {
    fs::create_dir_all(dest).map_err(|e| DownloadError::io("create", dest, e))?;

    let entries = fs::read_dir(source_dir).map_err(|e| DownloadError::io("read", source_dir, e))?;
    let mut moved = 0;
    for entry in entries {
        let entry = entry.map_err(|e| DownloadError::io("read", source_dir, e))?;
        let from = entry.path();
        if !from.is_file() {
            continue;
        }
        let to = dest.join(entry.file_name());
        move_file(&from, &to)?;
        moved += 1;
    }
    Ok((dest.to_path_buf(), moved))
}

/// `rename`, or copy + remove when the destination is on another filesystem
fn move_file(from: &Path, to: &Path) -> Result<(), DownloadError> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to).map_err(|e| DownloadError::io("copy", from, e))?;
    fs::remove_file(from).map_err(|e| DownloadError::io("remove", from, e))
}
