// Metadata extraction ahead of a download
//
// The playlist resolver asks yt-dlp for a flat listing (no per-entry
// extraction), which is enough for the title and item count.

mod playlist;

pub use playlist::{parse_playlist_json, YtDlpPlaylistResolver};
