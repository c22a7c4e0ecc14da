use crate::core::photo::Photo;
use std::path::{Component, Path, PathBuf};

/// Dimensions assumed when a photo cannot be probed (portrait 3:4).
pub const PLACEHOLDER_DIMENSIONS: (u32, u32) = (3, 4);

/// Resolve a local `src` against `root`. Remote references (`scheme://`)
/// and empty sources are not probeable.
///
/// A source that already starts with the root's own directory name
/// (`./photos/a.jpg` under root `site/photos`) resolves against the root's
/// parent, which is how generated manifests spell their entries.
pub fn local_path(src: &str, root: &Path) -> Option<PathBuf> {
    if src.is_empty() || src.contains("://") {
        return None;
    }
    let path = Path::new(src);
    if path.is_absolute() {
        return Some(path.to_path_buf());
    }

    let relative: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let mut components = relative.components();
    let carries_root = match (components.next(), root.file_name()) {
        (Some(Component::Normal(first)), Some(name)) => first == name && components.next().is_some(),
        _ => false,
    };

    let base = match root.parent() {
        Some(parent) if carries_root => parent,
        _ => root,
    };
    Some(base.join(relative))
}

/// Fill in width/height for `photo`. Never fails; unreadable sources get
/// [`PLACEHOLDER_DIMENSIONS`].
pub async fn probe_photo(photo: Photo, root: &Path) -> Photo {
    if photo.width.is_some() && photo.height.is_some() {
        return photo;
    }

    let Some(path) = local_path(&photo.src, root) else {
        log::debug!("Not probing {:?}, using placeholder size", photo.src);
        return with_dimensions(photo, PLACEHOLDER_DIMENSIONS);
    };

    let probed = tokio::task::spawn_blocking(move || image::image_dimensions(&path)).await;
    let dims = match probed {
        Ok(Ok(dims)) => dims,
        Ok(Err(e)) => {
            log::warn!("Failed to probe {}: {}", photo.src, e);
            PLACEHOLDER_DIMENSIONS
        }
        Err(e) => {
            log::warn!("Probe task for {} did not finish: {}", photo.src, e);
            PLACEHOLDER_DIMENSIONS
        }
    };
    with_dimensions(photo, dims)
}

/// Probe every photo of a group. All probes start before any is awaited;
/// the result keeps input order.
pub async fn probe_group(photos: Vec<Photo>, root: &Path) -> Vec<Photo> {
    let handles: Vec<_> = photos
        .into_iter()
        .map(|photo| {
            let root = root.to_path_buf();
            tokio::spawn(async move { probe_photo(photo, &root).await })
        })
        .collect();

    let mut probed = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(photo) => probed.push(photo),
            Err(e) => log::warn!("Probe task failed: {}", e),
        }
    }
    probed
}

fn with_dimensions(mut photo: Photo, (width, height): (u32, u32)) -> Photo {
    photo.width = Some(width);
    photo.height = Some(height);
    photo
}
