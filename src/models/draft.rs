//! Rows of the multi-row upload form.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A not-yet-saved entry: a name plus optional local files.
///
/// `saved_id` is filled in once the row's record has been created.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftRow {
    /// Local identifier, only meaningful within one form.
    pub id: Uuid,
    pub name: String,
    pub image: Option<PathBuf>,
    pub video: Option<PathBuf>,
    pub saved_id: Option<String>,
}

impl DraftRow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            image: None,
            video: None,
            saved_id: None,
        }
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image = Some(path.into());
        self
    }

    pub fn with_video(mut self, path: impl Into<PathBuf>) -> Self {
        self.video = Some(path.into());
        self
    }

    /// Rows without any file are skipped on submit.
    pub fn has_files(&self) -> bool {
        self.image.is_some() || self.video.is_some()
    }

    pub fn image_path(&self) -> Option<&Path> {
        self.image.as_deref()
    }

    pub fn video_path(&self) -> Option<&Path> {
        self.video.as_deref()
    }
}

/// One entry of a JSON draft manifest.
///
/// ```json
/// [{"name": "poster", "image": "poster.jpg", "video": "clip.mp4"}]
/// ```
#[derive(Debug, Deserialize)]
struct ManifestEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    image: Option<PathBuf>,
    #[serde(default)]
    video: Option<PathBuf>,
}

/// Parse a manifest into draft rows. Relative file paths are resolved
/// against `base_dir` (usually the manifest's directory).
pub fn parse_manifest(json: &str, base_dir: &Path) -> Result<Vec<DraftRow>, serde_json::Error> {
    let entries: Vec<ManifestEntry> = serde_json::from_str(json)?;
    Ok(entries
        .into_iter()
        .map(|entry| DraftRow {
            id: Uuid::new_v4(),
            name: entry.name,
            image: entry.image.map(|p| base_dir.join(p)),
            video: entry.video.map(|p| base_dir.join(p)),
            saved_id: None,
        })
        .collect())
}
