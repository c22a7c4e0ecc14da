use crate::core::photo::{DuplicateGroup, Photo};
use crate::core::tournament::GroupChampion;
use std::collections::HashSet;

/// Accepted photos outside every duplicate group, followed by the group
/// champions. No id appears twice; first occurrence wins.
pub fn assemble_refined(
    yes_photos: &[Photo],
    groups: &[DuplicateGroup],
    champions: &[GroupChampion],
) -> Vec<Photo> {
    let grouped: HashSet<&str> = groups
        .iter()
        .flat_map(|group| group.photos.iter().map(|p| p.id.as_str()))
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let ungrouped = yes_photos
        .iter()
        .filter(|photo| !grouped.contains(photo.id.as_str()));
    let winners = champions.iter().flat_map(|c| c.photos.iter());

    ungrouped
        .chain(winners)
        .filter(|photo| seen.insert(photo.id.clone()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    NoTarget,
    Under(u32),
    OnTarget,
    Over(u32),
}

impl TargetStatus {
    pub fn evaluate(selected: usize, target: Option<u32>) -> Self {
        let Some(target) = target else {
            return TargetStatus::NoTarget;
        };
        let selected = u32::try_from(selected).unwrap_or(u32::MAX);
        match selected.cmp(&target) {
            std::cmp::Ordering::Less => TargetStatus::Under(target - selected),
            std::cmp::Ordering::Equal => TargetStatus::OnTarget,
            std::cmp::Ordering::Greater => TargetStatus::Over(selected - target),
        }
    }
}

impl std::fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetStatus::NoTarget => write!(f, "no target set"),
            TargetStatus::Under(n) => write!(f, "{} short of target", n),
            TargetStatus::OnTarget => write!(f, "right on target"),
            TargetStatus::Over(n) => write!(f, "{} over target", n),
        }
    }
}

/// Photos ticked on the summary screen. Ids are kept in refined-set order
/// and never name a photo outside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<String>,
}

impl Selection {
    /// Stored ids that still belong to `refined`; anything else is stale.
    pub fn restore(refined: &[Photo], stored: &[String]) -> Self {
        let stored: HashSet<&str> = stored.iter().map(String::as_str).collect();
        Self {
            ids: refined
                .iter()
                .filter(|photo| stored.contains(photo.id.as_str()))
                .map(|photo| photo.id.clone())
                .collect(),
        }
    }

    /// Selection from positions in `refined`. Out-of-range positions are ignored.
    pub fn from_indices(refined: &[Photo], indices: &[usize]) -> Self {
        let picked: HashSet<usize> = indices.iter().copied().collect();
        Self {
            ids: refined
                .iter()
                .enumerate()
                .filter(|(i, _)| picked.contains(i))
                .map(|(_, photo)| photo.id.clone())
                .collect(),
        }
    }

    /// One flag per refined photo, for pre-ticking a picker.
    pub fn flags(&self, refined: &[Photo]) -> Vec<bool> {
        refined.iter().map(|photo| self.ids.contains(&photo.id)).collect()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn label(&self, target: Option<u32>) -> String {
        match target {
            Some(target) => format!("Selected {}/{}", self.ids.len(), target),
            None => format!("Selected {}", self.ids.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: &str) -> Photo {
        Photo::new(id, format!("{}.jpg", id))
    }

    #[test]
    fn test_scenario_refined_set() {
        let a = photo("A");
        let b = photo("B");
        let groups = vec![DuplicateGroup {
            key: "img".to_string(),
            photos: vec![a.clone(), b.clone()],
        }];
        let champions = vec![GroupChampion {
            key: "img".to_string(),
            photos: vec![a.clone()],
        }];

        let refined = assemble_refined(&[a, b], &groups, &champions);
        let ids: Vec<&str> = refined.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["A"]);
    }

    #[test]
    fn test_order_and_uniqueness() {
        let yes = vec![photo("x"), photo("g1"), photo("y"), photo("x"), photo("g2")];
        let groups = vec![DuplicateGroup {
            key: "g".to_string(),
            photos: vec![photo("g1"), photo("g2")],
        }];
        let champions = vec![
            GroupChampion {
                key: "g".to_string(),
                photos: vec![photo("g2")],
            },
            GroupChampion {
                key: "other".to_string(),
                photos: vec![photo("y"), photo("z")],
            },
        ];

        let refined = assemble_refined(&yes, &groups, &champions);
        let ids: Vec<&str> = refined.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "g2", "z"]);
    }

    #[test]
    fn test_no_groups_keeps_everything() {
        let yes = vec![photo("a"), photo("b")];
        assert_eq!(assemble_refined(&yes, &[], &[]), yes);
        assert!(assemble_refined(&[], &[], &[]).is_empty());
    }

    #[test]
    fn test_target_status() {
        assert_eq!(TargetStatus::evaluate(3, None), TargetStatus::NoTarget);
        assert_eq!(TargetStatus::evaluate(3, Some(5)), TargetStatus::Under(2));
        assert_eq!(TargetStatus::evaluate(5, Some(5)), TargetStatus::OnTarget);
        assert_eq!(TargetStatus::evaluate(8, Some(5)), TargetStatus::Over(3));
        assert_eq!(TargetStatus::Over(3).to_string(), "3 over target");
    }

    #[test]
    fn test_selection_restore_drops_stale_ids() {
        let refined = vec![photo("a"), photo("b"), photo("c")];
        let stored = vec!["c".to_string(), "gone".to_string(), "a".to_string()];

        let selection = Selection::restore(&refined, &stored);
        assert_eq!(selection.ids(), ["a".to_string(), "c".to_string()]);
        assert_eq!(selection.flags(&refined), vec![true, false, true]);
        assert_eq!(selection.label(Some(20)), "Selected 2/20");
        assert_eq!(selection.label(None), "Selected 2");
    }

    #[test]
    fn test_selection_from_indices() {
        let refined = vec![photo("a"), photo("b"), photo("c")];

        let selection = Selection::from_indices(&refined, &[2, 0, 9]);
        assert_eq!(selection.ids(), ["a".to_string(), "c".to_string()]);
        assert!(Selection::from_indices(&refined, &[]).ids().is_empty());
    }
}
