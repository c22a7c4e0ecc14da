// Duplicate detection by filename heuristic.
// Photos whose normalized filenames collide are treated as likely variants of
// the same shot (burst frames, numbered exports, copies).

use crate::core::photo::{DuplicateGroup, Photo};
use std::collections::HashMap;

/// Lowercase, drop the extension, drop digits, drop separators.
///
/// `"IMG_2024_01.JPEG"` and `"img001.jpeg"` both normalize to `"img"`.
/// Dots left after the extension is stripped are treated as separators so
/// that normalizing a key again yields the same key.
pub fn normalize_filename(name: &str) -> String {
    let lowered = name.to_lowercase();
    strip_extension(&lowered)
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .filter(|c| !matches!(c, '_' | '-' | '.') && !c.is_whitespace())
        .collect()
}

// Only a trailing `.suffix` without further dots or slashes counts.
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) => {
            let suffix = &name[dot + 1..];
            if suffix.is_empty() || suffix.contains('/') {
                name
            } else {
                &name[..dot]
            }
        }
        None => name,
    }
}

pub struct DuplicateDetector {
    /// Group photos whose key normalizes to the empty string.
    pub group_blank_keys: bool,
}

impl DuplicateDetector {
    pub fn new() -> Self {
        Self {
            group_blank_keys: true,
        }
    }

    pub fn without_blank_keys() -> Self {
        Self {
            group_blank_keys: false,
        }
    }

    /// Groups in first-encounter order of their key; photos in input order.
    /// Only keys shared by two or more photos produce a group.
    pub fn detect(&self, photos: &[Photo]) -> Vec<DuplicateGroup> {
        let mut order: Vec<DuplicateGroup> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();

        for photo in photos {
            let key = normalize_filename(&photo.filename);
            match slots.get(&key) {
                Some(&slot) => order[slot].photos.push(photo.clone()),
                None => {
                    slots.insert(key.clone(), order.len());
                    order.push(DuplicateGroup {
                        key,
                        photos: vec![photo.clone()],
                    });
                }
            }
        }

        order
            .into_iter()
            .filter(|group| group.photos.len() > 1)
            .filter(|group| {
                if !group.key.is_empty() {
                    return true;
                }
                log::warn!(
                    "{} photos have a blank filename key ({})",
                    group.photos.len(),
                    if self.group_blank_keys {
                        "grouped together"
                    } else {
                        "left ungrouped"
                    }
                );
                self.group_blank_keys
            })
            .collect()
    }
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Total number of photos across `groups`.
pub fn grouped_photo_count(groups: &[DuplicateGroup]) -> usize {
    groups.iter().map(|group| group.photos.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: &str, filename: &str) -> Photo {
        Photo::new(id, format!("./photos/{}", filename)).with_filename(filename)
    }

    #[test]
    fn test_normalize_examples() {
        assert_eq!(normalize_filename("IMG_2024_01.JPEG"), "img");
        assert_eq!(normalize_filename("img001.jpeg"), "img");
        assert_eq!(normalize_filename("img_1.jpg"), "img");
        assert_eq!(normalize_filename("vacation.png"), "vacation");
        assert_eq!(normalize_filename("Beach - Day 2.jpg"), "beachday");
    }

    #[test]
    fn test_normalize_without_extension() {
        assert_eq!(normalize_filename("sunset_03"), "sunset");
        assert_eq!(normalize_filename("trailing."), "trailing");
        assert_eq!(normalize_filename(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let names = [
            "IMG_2024_01.JPEG",
            "holiday.2024.final.jpg",
            "a.b.c",
            "  spaced   out .png",
            "dir/with.dot/name",
            "ÄBC-12.TIFF",
            "",
            "...",
        ];
        for name in names {
            let once = normalize_filename(name);
            assert_eq!(normalize_filename(&once), once, "not idempotent for {:?}", name);
        }
    }

    #[test]
    fn test_detect_groups_in_first_encounter_order() {
        let photos = vec![
            photo("1", "beach_01.jpg"),
            photo("2", "img_1.jpg"),
            photo("3", "vacation.png"),
            photo("4", "IMG-2.JPG"),
            photo("5", "beach_02.jpg"),
            photo("6", "img 3.jpeg"),
        ];

        let groups = DuplicateDetector::new().detect(&photos);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "beach");
        assert_eq!(groups[1].key, "img");

        let ids: Vec<&str> = groups[1].photos.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4", "6"]);
    }

    #[test]
    fn test_detect_members_share_key_and_appear_once() {
        let photos = vec![
            photo("1", "a1.jpg"),
            photo("2", "a2.jpg"),
            photo("3", "b.jpg"),
            photo("4", "a3.png"),
        ];
        let groups = DuplicateDetector::new().detect(&photos);

        let mut seen = std::collections::HashSet::new();
        for group in &groups {
            assert!(group.photos.len() >= 2);
            for member in &group.photos {
                assert_eq!(normalize_filename(&member.filename), group.key);
                assert!(seen.insert(member.id.clone()));
            }
        }
        assert_eq!(grouped_photo_count(&groups), 3);
    }

    #[test]
    fn test_detect_no_duplicates() {
        let photos = vec![photo("1", "one.jpg"), photo("2", "two.jpg")];
        assert!(DuplicateDetector::new().detect(&photos).is_empty());
        assert!(DuplicateDetector::new().detect(&[]).is_empty());
    }

    #[test]
    fn test_blank_filenames() {
        let photos = vec![
            Photo::new("1", ""),
            Photo::new("2", ""),
            photo("3", "123.jpg"),
        ];

        let grouped = DuplicateDetector::new().detect(&photos);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].key, "");
        assert_eq!(grouped[0].photos.len(), 3);

        assert!(DuplicateDetector::without_blank_keys().detect(&photos).is_empty());
    }
}
