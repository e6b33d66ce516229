//! Writing tracks out as a JSON list or an M3U8 playlist.

use crate::error::App;
use crate::library::{Library, Track};
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    M3u8,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::M3u8 => "m3u8",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = App;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "m3u8" => Ok(ExportFormat::M3u8),
            other => Err(App::InvalidInput(format!(
                "Unsupported format {other:?}, supported formats are json and m3u8"
            ))),
        }
    }
}

/// `path` with its extension replaced by `extension` unless it already
/// has it.
pub fn check_and_correct_extension(path: &Path, extension: &str) -> PathBuf {
    if path.extension().and_then(|ext| ext.to_str()) == Some(extension) {
        path.to_path_buf()
    } else {
        path.with_extension(extension)
    }
}

#[derive(Serialize)]
struct ExportedTrack<'a> {
    path: PathBuf,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    artist: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    album: Option<&'a str>,
}

/// Writes `tracks` to `output`, creating its parent directories. The
/// extension is corrected to match `format`; the path actually written is
/// returned. Playlist entries are relative to the playlist's directory.
pub async fn export_tracks(
    library: &Library,
    tracks: &[&Track],
    format: ExportFormat,
    output: &Path,
) -> Result<PathBuf, App> {
    let corrected_path = check_and_correct_extension(output, format.extension());
    if corrected_path != output {
        warn!(
            "Output file extension corrected to .{}",
            format.extension()
        );
    }
    let parent = corrected_path.parent().unwrap_or(Path::new(""));
    if !parent.as_os_str().is_empty() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content = match format {
        ExportFormat::Json => {
            let entries: Vec<_> = tracks
                .iter()
                .map(|track| ExportedTrack {
                    path: library.resolve(track),
                    title: &track.title,
                    artist: track.artist.as_deref(),
                    album: track.album.as_deref(),
                })
                .collect();
            serde_json::to_string_pretty(&entries)?
        }
        ExportFormat::M3u8 => m3u8_playlist(library, tracks, parent)?,
    };
    tokio::fs::write(&corrected_path, content).await?;

    info!(
        "Exported {} tracks to {}",
        tracks.len(),
        corrected_path.display()
    );
    Ok(corrected_path)
}

fn m3u8_playlist(library: &Library, tracks: &[&Track], base: &Path) -> Result<String, App> {
    let mut playlist = String::from("#EXTM3U\n");
    for track in tracks {
        let path = library.resolve(track);
        let relative = pathdiff::diff_paths(&path, base).ok_or_else(|| {
            App::InvalidInput(format!(
                "Failed to calculate the path of {} relative to {}",
                path.display(),
                base.display()
            ))
        })?;
        playlist.push_str(&relative.to_string_lossy());
        playlist.push('\n');
    }
    Ok(playlist)
}
