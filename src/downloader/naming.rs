// Output naming: yt-dlp templates and filesystem-safe folder names

/// Title used when playlist metadata is unavailable ("playlist")
pub const DEFAULT_PLAYLIST_TITLE: &str = "قائمة تشغيل";

/// Keep alphanumerics, spaces, hyphens and underscores; drop trailing whitespace.
///
/// Different titles can sanitize to the same name. Callers accept the collision.
pub fn sanitize(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim_end().to_string()
}

/// Zero-padding width for an autonumber prefix
pub fn index_width(total_items: u32) -> usize {
    match total_items {
        0..=9 => 1,
        10..=99 => 2,
        _ => 3,
    }
}

/// yt-dlp `-o` template, relative to the working directory.
///
/// `add_index_prefix` numbers files in download order (`1_`, `02_`, ...).
/// Without it, playlist entries keep their playlist position (`007-`).
pub fn build_output_template(is_playlist: bool, add_index_prefix: bool, total_items: u32) -> String {
    if add_index_prefix {
        format!(
            "%(autonumber)0{}d_%(title)s.%(ext)s",
            index_width(total_items)
        )
    } else if is_playlist {
        "%(playlist_index)03d-%(title)s.%(ext)s".to_string()
    } else {
        "%(title)s.%(ext)s".to_string()
    }
}

/// Directory name for a session's working folder
pub fn working_dir_name(title: &str) -> String {
    let name = sanitize(title);
    if name.trim().is_empty() {
        DEFAULT_PLAYLIST_TITLE.to_string()
    } else {
        name
    }
}
