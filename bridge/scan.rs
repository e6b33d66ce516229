//! Building a library from the audio files under a directory.
//!
//! Nothing is decoded: a track's title is its file name, and the directories
//! above it name the album and the artist (`<artist>/<album>/<track>`).

use crate::error::App;
use crate::library::{Library, Track};
use log::{debug, info};
use std::path::{Component, Path};

pub const AUDIO_EXTENSIONS: &[&str] = &[
    "aac", "aiff", "ape", "flac", "m4a", "mp3", "ogg", "opus", "wav", "wv",
];

pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Walks `root` and returns a library of every audio file below it, sorted
/// by path. Hidden entries and symlinks are skipped.
pub async fn scan_library(root: &Path) -> Result<Library, App> {
    let root = tokio::fs::canonicalize(root).await?;
    if !tokio::fs::metadata(&root).await?.is_dir() {
        return Err(App::InvalidInput(format!(
            "{} is not a directory",
            root.display()
        )));
    }
    info!("Scanning {}", root.display());

    let mut tracks = Vec::new();
    let mut directories = vec![root.clone()];
    while let Some(dir) = directories.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_hidden(&path) {
                continue;
            }
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                directories.push(path);
            } else if file_type.is_file() && is_audio_file(&path) {
                if let Ok(relative) = path.strip_prefix(&root) {
                    debug!("Found {}", relative.display());
                    tracks.push(track_from_path(relative));
                }
            }
        }
    }
    tracks.sort_by(|a, b| a.path.cmp(&b.path));

    info!("Found {} tracks under {}", tracks.len(), root.display());
    Ok(Library {
        root: Some(root),
        tracks,
    })
}

fn track_from_path(relative: &Path) -> Track {
    let title = relative
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut directories: Vec<String> = relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    let album = directories.pop();
    let artist = directories.pop();

    Track {
        path: relative.to_string_lossy().into_owned(),
        title,
        artist,
        album,
        playlists: Vec::new(),
    }
}
