use crate::error::App;
use crate::signals::{Collection, CollectionGroup, CollectionGroupSummary, CollectionType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Group title for names that don't start with a letter or digit.
pub const OTHER_GROUP: &str = "#";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub path: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub playlists: Vec<String>,
}

impl Track {
    fn directory(&self) -> Option<String> {
        Path::new(&self.path)
            .parent()
            .map(|dir| dir.to_string_lossy().into_owned())
            .filter(|dir| !dir.is_empty())
    }

    fn collections(&self, collection_type: CollectionType) -> Vec<String> {
        match collection_type {
            CollectionType::Album => self.album.iter().cloned().collect(),
            CollectionType::Artist => self.artist.iter().cloned().collect(),
            CollectionType::Directory => self.directory().into_iter().collect(),
            CollectionType::Playlist => self.playlists.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Library {
    /// Directory the track paths are relative to. Absent for hand-written
    /// libraries, whose paths are taken as they are.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Library {
    pub async fn load_from_file(file_path: &Path) -> Result<Self, App> {
        log::info!("Loading library from {}", file_path.display());
        let content = tokio::fs::read_to_string(file_path).await?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, App> {
        let library: Library = toml::from_str(content)?;
        Ok(library)
    }

    pub async fn save_to_file(&self, file_path: &Path) -> Result<(), App> {
        if let Some(parent) = file_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(file_path, toml::to_string(self)?).await?;
        log::info!(
            "Saved {} tracks to {}",
            self.tracks.len(),
            file_path.display()
        );
        Ok(())
    }

    /// Where `track` lives on disk.
    pub fn resolve(&self, track: &Track) -> PathBuf {
        match &self.root {
            Some(root) => root.join(&track.path),
            None => PathBuf::from(&track.path),
        }
    }

    /// Tracks belonging to the collection `name`, in library order.
    pub fn collection_tracks(&self, collection_type: CollectionType, name: &str) -> Vec<&Track> {
        self.tracks
            .iter()
            .filter(|track| track.collections(collection_type).iter().any(|c| c == name))
            .collect()
    }

    /// Copies playlist memberships over from an earlier scan of the same
    /// root. Tracks that are gone are dropped from their playlists.
    pub fn adopt_playlists(&mut self, previous: &Library) {
        if self.root != previous.root {
            return;
        }
        let playlists: HashMap<&str, &Vec<String>> = previous
            .tracks
            .iter()
            .filter(|track| !track.playlists.is_empty())
            .map(|track| (track.path.as_str(), &track.playlists))
            .collect();
        for track in &mut self.tracks {
            if let Some(names) = playlists.get(track.path.as_str()) {
                track.playlists.clone_from(names);
            }
        }
    }

    /// Collection name -> number of tracks, sorted by name.
    fn collections(&self, collection_type: CollectionType) -> BTreeMap<String, usize> {
        let mut collections = BTreeMap::new();
        for track in &self.tracks {
            for name in track.collections(collection_type) {
                *collections.entry(name).or_insert(0) += 1;
            }
        }
        collections
    }

    fn grouped(&self, collection_type: CollectionType) -> Vec<(String, Vec<Collection>)> {
        let mut groups: BTreeMap<String, Vec<Collection>> = BTreeMap::new();
        for (name, track_count) in self.collections(collection_type) {
            groups
                .entry(group_title(&name))
                .or_default()
                .push(Collection { name, track_count });
        }
        let mut groups: Vec<_> = groups.into_iter().collect();
        groups.sort_by(|(a, _), (b, _)| {
            (a == OTHER_GROUP)
                .cmp(&(b == OTHER_GROUP))
                .then_with(|| a.cmp(b))
        });
        groups
    }

    pub fn group_summary(&self, collection_type: CollectionType) -> Vec<CollectionGroupSummary> {
        self.grouped(collection_type)
            .into_iter()
            .map(|(group_title, collections)| CollectionGroupSummary {
                group_title,
                count: collections.len(),
            })
            .collect()
    }

    /// The requested groups in summary order. Unknown titles are skipped.
    pub fn groups(
        &self,
        collection_type: CollectionType,
        group_titles: &[String],
    ) -> Vec<CollectionGroup> {
        self.grouped(collection_type)
            .into_iter()
            .filter(|(title, _)| group_titles.contains(title))
            .map(|(group_title, collections)| CollectionGroup {
                group_title,
                collections,
            })
            .collect()
    }
}

/// Upper-cased first letter or digit of `name`, or [`OTHER_GROUP`].
pub fn group_title(name: &str) -> String {
    match name.trim_start().chars().next() {
        Some(first) if first.is_alphanumeric() => first.to_uppercase().collect(),
        _ => OTHER_GROUP.to_string(),
    }
}
