use crate::core::manifest::MANIFEST_FILE;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_DIR: &str = "photoflow";
pub const STATE_FILE: &str = "state.json";
pub const DEFAULT_COUNTDOWN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub state_path: PathBuf,
    pub manifest_path: PathBuf,
    /// Base directory for relative photo sources.
    pub photo_root: PathBuf,
    /// Pause after the target is set, before swiping starts.
    pub countdown: Duration,
    /// Swipe at most this many photos from the deck.
    pub deck_limit: Option<usize>,
    /// Treat photos whose names reduce to nothing (`1.jpg`, `2.jpg`) as one
    /// duplicate group.
    pub group_blank_keys: bool,
}

impl FlowConfig {
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        let manifest_path = manifest_path.into();
        Self {
            state_path: default_state_path(),
            photo_root: manifest_root(&manifest_path),
            manifest_path,
            countdown: DEFAULT_COUNTDOWN,
            deck_limit: None,
            group_blank_keys: true,
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self::new(Path::new("photos").join(MANIFEST_FILE))
    }
}

/// `<data_local_dir>/photoflow/state.json`, falling back to
/// `~/.photoflow/state.json`, then to the working directory.
pub fn default_state_path() -> PathBuf {
    if let Some(dir) = dirs::data_local_dir() {
        return dir.join(APP_DIR).join(STATE_FILE);
    }
    match dirs::home_dir() {
        Some(home) => home.join(format!(".{}", APP_DIR)).join(STATE_FILE),
        None => PathBuf::from(STATE_FILE),
    }
}

pub fn manifest_root(manifest_path: &Path) -> PathBuf {
    manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FlowConfig::default();
        assert_eq!(config.manifest_path, Path::new("photos").join("manifest.json"));
        assert_eq!(config.photo_root, PathBuf::from("photos"));
        assert_eq!(config.countdown, Duration::from_secs(5));
        assert!(config.state_path.ends_with(STATE_FILE));
        assert!(config.group_blank_keys);
    }

    #[test]
    fn test_manifest_root_of_bare_file() {
        assert_eq!(manifest_root(Path::new("manifest.json")), PathBuf::from("."));
    }
}
