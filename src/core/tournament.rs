use crate::core::photo::{Decision, DuplicateGroup, Photo, PhotoCatalog};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament is finished; no pair is awaiting a choice")]
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// The pair currently awaiting a choice. `left` is always the reigning
/// champion, `right` the next challenger.
#[derive(Debug, Clone, Copy)]
pub struct Matchup<'a> {
    pub group_key: &'a str,
    pub group_number: usize,
    pub group_total: usize,
    pub round: u32,
    pub rounds: usize,
    pub left: &'a Photo,
    pub right: &'a Photo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupChampion {
    pub key: String,
    pub photos: Vec<Photo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TournamentStep {
    NextRound,
    /// The group with this key has its champion; the next group (if any) is up.
    GroupResolved(String),
    Finished,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TournamentOutcome {
    pub decisions: Vec<Decision>,
    pub champions: Vec<GroupChampion>,
}

impl TournamentOutcome {
    /// Replace each champion with its record from `groups`, so sizes filled
    /// in only for display do not reach the persisted selection.
    pub fn with_records(mut self, groups: &[DuplicateGroup]) -> Self {
        let records: HashMap<&str, &Photo> = groups
            .iter()
            .flat_map(|group| group.photos.iter())
            .map(|photo| (photo.id.as_str(), photo))
            .collect();

        for photo in self.champions.iter_mut().flat_map(|c| c.photos.iter_mut()) {
            if let Some(record) = records.get(photo.id.as_str()) {
                *photo = (*record).clone();
            }
        }
        self
    }
}

/// Rehydrate group members from the manifest catalog and drop any member
/// that is not part of the accepted set. Groups left empty are dropped.
pub fn resolve_groups(
    groups: &[DuplicateGroup],
    accepted: &[Photo],
    catalog: &PhotoCatalog,
) -> Vec<DuplicateGroup> {
    let accepted_ids: HashSet<&str> = accepted.iter().map(|p| p.id.as_str()).collect();

    groups
        .iter()
        .filter_map(|group| {
            let photos: Vec<Photo> = group
                .photos
                .iter()
                .filter(|photo| {
                    let known = accepted_ids.contains(photo.id.as_str());
                    if !known {
                        log::warn!(
                            "Group {:?}: photo {} is not in the accepted set, skipping it",
                            group.key,
                            photo.id
                        );
                    }
                    known
                })
                .map(|photo| catalog.rehydrate(photo))
                .collect();

            if photos.is_empty() {
                log::warn!("Group {:?} has no resolvable photos, skipping", group.key);
                return None;
            }
            Some(DuplicateGroup {
                key: group.key.clone(),
                photos,
            })
        })
        .collect()
}

/// Winner-stays-on elimination, one group after another. In a group of N
/// the champion starts as the first photo and meets every other photo once,
/// so each group takes exactly N-1 choices.
#[derive(Debug)]
pub struct Tournament {
    groups: Vec<DuplicateGroup>,
    group_index: usize,
    champion: Option<Photo>,
    challenger: usize,
    round: u32,
    decisions: Vec<Decision>,
    champions: Vec<GroupChampion>,
}

impl Tournament {
    pub fn new(groups: Vec<DuplicateGroup>) -> Self {
        let mut tournament = Self {
            groups,
            group_index: 0,
            champion: None,
            challenger: 1,
            round: 1,
            decisions: Vec::new(),
            champions: Vec::new(),
        };
        tournament.start_group(0);
        tournament
    }

    fn start_group(&mut self, mut index: usize) {
        self.champion = None;
        while let Some(group) = self.groups.get(index) {
            match group.photos.as_slice() {
                [] => {
                    log::warn!("Group {:?} is empty, skipping", group.key);
                }
                [only] => {
                    self.champions.push(GroupChampion {
                        key: group.key.clone(),
                        photos: vec![only.clone()],
                    });
                }
                [first, ..] => {
                    self.group_index = index;
                    self.champion = Some(first.clone());
                    self.challenger = 1;
                    self.round = 1;
                    return;
                }
            }
            index += 1;
        }
        self.group_index = self.groups.len();
    }

    pub fn is_finished(&self) -> bool {
        self.champion.is_none()
    }

    pub fn current(&self) -> Option<Matchup<'_>> {
        let champion = self.champion.as_ref()?;
        let group = self.groups.get(self.group_index)?;
        let challenger = group.photos.get(self.challenger)?;
        Some(Matchup {
            group_key: &group.key,
            group_number: self.group_index + 1,
            group_total: self.groups.len(),
            round: self.round,
            rounds: group.photos.len() - 1,
            left: champion,
            right: challenger,
        })
    }

    pub fn choose(&mut self, side: Side) -> Result<TournamentStep, TournamentError> {
        let (picked, dropped, key) = {
            let matchup = self.current().ok_or(TournamentError::Finished)?;
            let (picked, dropped) = match side {
                Side::Left => (matchup.left, matchup.right),
                Side::Right => (matchup.right, matchup.left),
            };
            (picked.clone(), dropped.clone(), matchup.group_key.to_string())
        };

        log::debug!(
            "Group {:?} round {}: kept {} over {}",
            key,
            self.round,
            picked.id,
            dropped.id
        );
        self.decisions
            .push(Decision::pick(&key, self.round, &picked, &dropped));
        self.champion = Some(picked);
        self.challenger += 1;
        self.round += 1;

        let group_len = self.groups[self.group_index].photos.len();
        if self.challenger < group_len {
            return Ok(TournamentStep::NextRound);
        }

        self.finalize_group();
        if self.is_finished() {
            Ok(TournamentStep::Finished)
        } else {
            Ok(TournamentStep::GroupResolved(key))
        }
    }

    fn finalize_group(&mut self) {
        let Some(champion) = self.champion.take() else {
            return;
        };
        let group = &self.groups[self.group_index];
        self.decisions
            .push(Decision::winner(group, self.round, &champion));
        log::info!("Group {:?} champion: {}", group.key, champion.id);

        let key = group.key.clone();
        match self.champions.iter_mut().find(|c| c.key == key) {
            Some(existing) => {
                if !existing.photos.iter().any(|p| p.id == champion.id) {
                    existing.photos.push(champion);
                }
            }
            None => self.champions.push(GroupChampion {
                key,
                photos: vec![champion],
            }),
        }

        self.start_group(self.group_index + 1);
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn champions(&self) -> &[GroupChampion] {
        &self.champions
    }

    pub fn into_outcome(self) -> TournamentOutcome {
        TournamentOutcome {
            decisions: self.decisions,
            champions: self.champions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::photo::DecisionAction;

    fn group(key: &str, ids: &[&str]) -> DuplicateGroup {
        DuplicateGroup {
            key: key.to_string(),
            photos: ids
                .iter()
                .map(|id| Photo::new(*id, format!("{}.jpg", id)))
                .collect(),
        }
    }

    #[test]
    fn test_single_round_scenario() {
        let mut tournament = Tournament::new(vec![group("img", &["A", "B"])]);

        let matchup = tournament.current().unwrap();
        assert_eq!((matchup.left.id.as_str(), matchup.right.id.as_str()), ("A", "B"));
        assert_eq!((matchup.round, matchup.rounds), (1, 1));

        assert_eq!(tournament.choose(Side::Left).unwrap(), TournamentStep::Finished);
        assert!(tournament.is_finished());

        let outcome = tournament.into_outcome();
        assert_eq!(outcome.champions.len(), 1);
        assert_eq!(outcome.champions[0].photos[0].id, "A");
        assert_eq!(outcome.decisions.len(), 2);
        assert_eq!(outcome.decisions[1].action, DecisionAction::Winner);
        assert_eq!(outcome.decisions[1].dropped_ids, vec!["B".to_string()]);
    }

    #[test]
    fn test_winner_stays_on() {
        let mut tournament = Tournament::new(vec![group("x", &["A", "B", "C", "D"])]);

        // B beats A, B holds against C, D beats B.
        tournament.choose(Side::Right).unwrap();
        let matchup = tournament.current().unwrap();
        assert_eq!((matchup.left.id.as_str(), matchup.right.id.as_str()), ("B", "C"));
        assert_eq!(matchup.round, 2);

        tournament.choose(Side::Left).unwrap();
        let matchup = tournament.current().unwrap();
        assert_eq!((matchup.left.id.as_str(), matchup.right.id.as_str()), ("B", "D"));

        assert_eq!(tournament.choose(Side::Right).unwrap(), TournamentStep::Finished);

        let picks: Vec<&str> = tournament
            .decisions()
            .iter()
            .map(|d| d.picked_id.as_str())
            .collect();
        assert_eq!(picks, vec!["B", "B", "D", "D"]);

        let winner = tournament.decisions().last().unwrap();
        assert_eq!(winner.round, 4);
        assert_eq!(winner.dropped_ids, vec!["A", "B", "C"]);
        assert_eq!(tournament.champions()[0].photos[0].id, "D");
    }

    #[test]
    fn test_comparison_count_per_group() {
        for n in 2..=6 {
            let ids: Vec<String> = (0..n).map(|i| format!("p{}", i)).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let mut tournament = Tournament::new(vec![group("k", &refs)]);

            let mut choices = 0;
            while !tournament.is_finished() {
                let side = if choices % 2 == 0 { Side::Left } else { Side::Right };
                tournament.choose(side).unwrap();
                choices += 1;
            }

            assert_eq!(choices, n - 1);
            assert_eq!(tournament.champions().len(), 1);
            assert_eq!(tournament.decisions().len(), n);
        }
    }

    #[test]
    fn test_groups_resolve_in_order() {
        let mut tournament = Tournament::new(vec![
            group("first", &["A", "B"]),
            group("solo", &["S"]),
            group("empty", &[]),
            group("last", &["C", "D", "E"]),
        ]);

        assert_eq!(
            tournament.choose(Side::Left).unwrap(),
            TournamentStep::GroupResolved("first".to_string())
        );
        let matchup = tournament.current().unwrap();
        assert_eq!(matchup.group_key, "last");
        assert_eq!((matchup.group_number, matchup.group_total), (4, 4));

        tournament.choose(Side::Left).unwrap();
        tournament.choose(Side::Left).unwrap();
        assert!(tournament.is_finished());

        let keys: Vec<&str> = tournament.champions().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["first", "solo", "last"]);
        // The solo group adds no log entries.
        assert_eq!(tournament.decisions().len(), 2 + 3);
    }

    #[test]
    fn test_no_groups_is_finished() {
        let mut tournament = Tournament::new(Vec::new());
        assert!(tournament.is_finished());
        assert!(tournament.current().is_none());
        assert!(matches!(
            tournament.choose(Side::Left),
            Err(TournamentError::Finished)
        ));
        assert!(tournament.into_outcome().champions.is_empty());
    }

    #[test]
    fn test_outcome_restores_champion_records() {
        let stored = group("img", &["A", "B"]);
        let mut probed = stored.clone();
        for photo in &mut probed.photos {
            photo.width = Some(3);
            photo.height = Some(4);
        }

        let mut tournament = Tournament::new(vec![probed]);
        assert_eq!(tournament.current().unwrap().left.width, Some(3));
        tournament.choose(Side::Right).unwrap();

        let outcome = tournament.into_outcome().with_records(&[stored]);
        let champion = &outcome.champions[0].photos[0];
        assert_eq!(champion.id, "B");
        assert_eq!((champion.width, champion.height), (None, None));
        assert_eq!(outcome.decisions.len(), 2);
    }

    #[test]
    fn test_resolve_groups_drops_unknown_members() {
        let accepted = vec![Photo::new("A", ""), Photo::new("B", "b.jpg")];
        let manifest = vec![Photo::new("A", "./photos/a_1.jpg")];
        let catalog = PhotoCatalog::new(&manifest);

        let groups = vec![
            DuplicateGroup {
                key: "a".to_string(),
                photos: vec![
                    Photo::new("A", "").with_filename(""),
                    Photo::new("ghost", "ghost.jpg"),
                ],
            },
            group("gone", &["nobody", "else"]),
        ];

        let resolved = resolve_groups(&groups, &accepted, &catalog);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].photos.len(), 1);
        assert_eq!(resolved[0].photos[0].src, "./photos/a_1.jpg");
        assert_eq!(resolved[0].photos[0].filename, "a_1.jpg");
    }
}
