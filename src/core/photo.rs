use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single photo in the deck. Identity is the `id`; `filename` only feeds
/// duplicate-key derivation and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Photo {
    pub fn new(id: impl Into<String>, src: impl Into<String>) -> Self {
        let src = src.into();
        let filename = trailing_segment(&src).unwrap_or_default().to_string();
        Self {
            id: id.into(),
            src,
            filename,
            width: None,
            height: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Label shown to the user; never empty.
    pub fn display_name(&self) -> &str {
        if self.filename.is_empty() {
            "—"
        } else {
            &self.filename
        }
    }
}

/// Last `/`-separated segment of a source reference, if non-empty.
pub fn trailing_segment(src: &str) -> Option<&str> {
    src.rsplit('/').next().filter(|segment| !segment.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub key: String,
    pub photos: Vec<Photo>,
}

impl DuplicateGroup {
    pub fn contains(&self, id: &str) -> bool {
        self.photos.iter().any(|photo| photo.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Pick,
    Winner,
}

/// Append-only tournament log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub group: String,
    pub round: u32,
    pub action: DecisionAction,
    pub picked_id: String,
    pub dropped_ids: Vec<String>,
}

impl Decision {
    pub fn pick(group: &str, round: u32, picked: &Photo, dropped: &Photo) -> Self {
        Self {
            group: group.to_string(),
            round,
            action: DecisionAction::Pick,
            picked_id: picked.id.clone(),
            dropped_ids: vec![dropped.id.clone()],
        }
    }

    pub fn winner(group: &DuplicateGroup, round: u32, champion: &Photo) -> Self {
        Self {
            group: group.key.clone(),
            round,
            action: DecisionAction::Winner,
            picked_id: champion.id.clone(),
            dropped_ids: group
                .photos
                .iter()
                .filter(|photo| photo.id != champion.id)
                .map(|photo| photo.id.clone())
                .collect(),
        }
    }
}

/// Lookup of manifest photos used to rehydrate photos restored from state.
#[derive(Debug, Default)]
pub struct PhotoCatalog {
    by_id: HashMap<String, Photo>,
    by_filename: HashMap<String, Photo>,
}

impl PhotoCatalog {
    pub fn new(photos: &[Photo]) -> Self {
        let mut catalog = Self::default();
        for photo in photos {
            catalog.by_id.insert(photo.id.clone(), photo.clone());
            if !photo.filename.is_empty() {
                catalog
                    .by_filename
                    .insert(photo.filename.clone(), photo.clone());
            }
        }
        catalog
    }

    /// Merge `photo` over its manifest record. Fields set on `photo` win.
    pub fn rehydrate(&self, photo: &Photo) -> Photo {
        let base = self
            .by_id
            .get(&photo.id)
            .or_else(|| self.by_filename.get(&photo.filename));

        let mut merged = photo.clone();
        if let Some(base) = base {
            if merged.src.is_empty() {
                merged.src = base.src.clone();
            }
            if merged.filename.is_empty() {
                merged.filename = base.filename.clone();
            }
            merged.width = merged.width.or(base.width);
            merged.height = merged.height.or(base.height);
        }

        if merged.src.is_empty() && !merged.filename.is_empty() {
            merged.src = merged.filename.clone();
        }
        if merged.filename.is_empty() {
            merged.filename = trailing_segment(&merged.src)
                .unwrap_or(merged.id.as_str())
                .to_string();
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_filename_from_src() {
        let photo = Photo::new("photo-0", "./photos/img_1.jpg");
        assert_eq!(photo.filename, "img_1.jpg");

        let bare = Photo::new("photo-1", "");
        assert_eq!(bare.filename, "");
        assert_eq!(bare.display_name(), "—");
    }

    #[test]
    fn test_winner_decision_lists_everyone_else() {
        let a = Photo::new("a", "a.jpg");
        let b = Photo::new("b", "b.jpg");
        let c = Photo::new("c", "c.jpg");
        let group = DuplicateGroup {
            key: "x".to_string(),
            photos: vec![a, b.clone(), c],
        };

        let decision = Decision::winner(&group, 3, &b);
        assert_eq!(decision.action, DecisionAction::Winner);
        assert_eq!(decision.picked_id, "b");
        assert_eq!(decision.dropped_ids, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_decision_serializes_camel_case() {
        let a = Photo::new("a", "a.jpg");
        let b = Photo::new("b", "b.jpg");
        let json = serde_json::to_value(Decision::pick("img", 1, &a, &b)).unwrap();

        assert_eq!(json["action"], "pick");
        assert_eq!(json["pickedId"], "a");
        assert_eq!(json["droppedIds"][0], "b");
    }

    #[test]
    fn test_rehydrate_prefers_stored_fields() {
        let manifest = vec![Photo {
            id: "photo-0".to_string(),
            src: "./photos/img_1.jpg".to_string(),
            filename: "img_1.jpg".to_string(),
            width: Some(400),
            height: Some(300),
        }];
        let catalog = PhotoCatalog::new(&manifest);

        let stored = Photo {
            id: "photo-0".to_string(),
            src: String::new(),
            filename: "renamed.jpg".to_string(),
            width: None,
            height: None,
        };
        let merged = catalog.rehydrate(&stored);

        assert_eq!(merged.src, "./photos/img_1.jpg");
        assert_eq!(merged.filename, "renamed.jpg");
        assert_eq!(merged.width, Some(400));
    }

    #[test]
    fn test_rehydrate_falls_back_without_record() {
        let catalog = PhotoCatalog::new(&[]);

        let no_src = Photo::new("p", "").with_filename("beach.png");
        assert_eq!(catalog.rehydrate(&no_src).src, "beach.png");

        let no_name = Photo::new("q", "");
        assert_eq!(catalog.rehydrate(&no_name).filename, "q");
    }
}
