use crate::core::photo::{trailing_segment, Photo};
use crate::core::store::StateStore;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SUPPORTED_SUFFIXES: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "svg"];

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Photos directory not found: {path}")]
    MissingDirectory { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A manifest entry is either a bare source reference or a partial record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestEntry {
    Source(String),
    Record(ManifestRecord),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub photos: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn from_json(raw: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)? + "\n")
    }

    /// Map entries to photos in manifest order, filling the optional fields.
    /// An id already taken by an earlier entry is replaced so every photo
    /// keeps its own identity.
    pub fn to_photos(&self) -> Vec<Photo> {
        let mut taken: HashSet<String> = HashSet::new();
        self.photos
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let mut photo = entry.to_photo(index);
                if !taken.insert(photo.id.clone()) {
                    let rekeyed = unique_id(&taken, index);
                    log::warn!(
                        "Manifest entry {} reuses id {:?}, using {:?}",
                        index,
                        photo.id,
                        rekeyed
                    );
                    taken.insert(rekeyed.clone());
                    photo.id = rekeyed;
                }
                photo
            })
            .collect()
    }
}

fn unique_id(taken: &HashSet<String>, index: usize) -> String {
    let fallback = format!("photo-{}", index);
    let mut candidate = fallback.clone();
    let mut n = 0;
    while taken.contains(&candidate) {
        n += 1;
        candidate = format!("{}-{}", fallback, n);
    }
    candidate
}

impl ManifestEntry {
    fn to_photo(&self, index: usize) -> Photo {
        let record = match self {
            ManifestEntry::Source(src) => ManifestRecord {
                src: Some(src.clone()),
                ..ManifestRecord::default()
            },
            ManifestEntry::Record(record) => record.clone(),
        };

        let fallback = format!("photo-{}", index);
        let src = record
            .src
            .filter(|s| !s.is_empty())
            .or_else(|| record.filename.clone())
            .unwrap_or_default();
        let filename = record
            .filename
            .filter(|f| !f.is_empty())
            .or_else(|| trailing_segment(&src).map(str::to_string))
            .unwrap_or_else(|| fallback.clone());

        Photo {
            id: record.id.filter(|id| !id.is_empty()).unwrap_or(fallback),
            src,
            filename,
            width: record.width,
            height: record.height,
        }
    }
}

/// Deck source: the cached manifest in state if present, otherwise the
/// manifest file, which is then cached. Failures yield an empty deck.
pub async fn load_photos<S: StateStore>(store: &S, manifest_path: &Path) -> Vec<Photo> {
    let cached = store.read().photos;
    if !cached.is_empty() {
        log::debug!("Using {} cached manifest photos", cached.len());
        return cached;
    }

    let raw = match tokio::fs::read_to_string(manifest_path).await {
        Ok(raw) => raw,
        Err(e) => {
            log::error!(
                "Unable to load manifest {}: {}",
                manifest_path.display(),
                e
            );
            return Vec::new();
        }
    };

    let photos = match Manifest::from_json(&raw) {
        Ok(manifest) => manifest.to_photos(),
        Err(e) => {
            log::error!("Unable to parse manifest {}: {}", manifest_path.display(), e);
            return Vec::new();
        }
    };

    let snapshot = photos.clone();
    if let Err(e) = store.update(move |state| state.photos = snapshot) {
        log::warn!("Failed to cache manifest photos: {}", e);
    }
    log::info!("Loaded {} photos from {}", photos.len(), manifest_path.display());
    photos
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Prepended to every file name, e.g. `./photos/`.
    pub prefix: String,
    /// Probe width/height and emit records instead of bare sources.
    pub dimensions: bool,
}

/// Collect supported image files directly inside `dir`, sorted by lowercased
/// name, skipping dot-files and the manifest itself.
pub fn photo_files(dir: &Path) -> Result<Vec<PathBuf>, ManifestError> {
    if !dir.is_dir() {
        return Err(ManifestError::MissingDirectory {
            path: dir.display().to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            e.into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"))
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') || name == MANIFEST_FILE {
            continue;
        }
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| SUPPORTED_SUFFIXES.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false);
        if supported {
            files.push(path.to_path_buf());
        }
    }

    files.sort_by_key(|path| {
        path.file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
    Ok(files)
}

pub fn generate_manifest(dir: &Path, options: &GenerateOptions) -> Result<Manifest, ManifestError> {
    let files = photo_files(dir)?;
    let source = |path: &PathBuf| -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}{}", options.prefix, name)
    };

    if !options.dimensions {
        return Ok(Manifest {
            photos: files.iter().map(|p| ManifestEntry::Source(source(p))).collect(),
        });
    }

    let bar = ProgressBar::new(files.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:30.green} {pos}/{len} {msg}") {
        bar.set_style(style);
    }
    bar.set_message("Probing dimensions…");

    let photos = files
        .par_iter()
        .map(|path| {
            let dims = match image::image_dimensions(path) {
                Ok(dims) => Some(dims),
                Err(e) => {
                    log::warn!("Failed to read dimensions of {}: {}", path.display(), e);
                    None
                }
            };
            bar.inc(1);
            ManifestEntry::Record(ManifestRecord {
                src: Some(source(path)),
                width: dims.map(|(w, _)| w),
                height: dims.map(|(_, h)| h),
                ..ManifestRecord::default()
            })
        })
        .collect();
    bar.finish_and_clear();

    Ok(Manifest { photos })
}
