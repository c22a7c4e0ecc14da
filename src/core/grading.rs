// Two-question rating pass over a short deck. Each photo is scored 1-4 on
// feeling first, then 1-4 on technique, before the next photo comes up.
// Position, stage and scores live in the state record so a pass resumes
// where it stopped.

use crate::core::photo::{Photo, PhotoCatalog};
use crate::core::store::{StateStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Photos taken from the head of the deck for a grading pass.
pub const GRADING_DECK_SIZE: usize = 24;
pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 4;

#[derive(Debug, Error)]
pub enum GradingError {
    #[error("Score must be between 1 and 4, got {0}")]
    ScoreOutOfRange(u8),

    #[error("No photo is awaiting a score")]
    NothingToGrade,

    #[error("State store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradingStage {
    #[default]
    Emotional,
    Objective,
}

impl GradingStage {
    pub fn question(&self) -> &'static str {
        match self {
            GradingStage::Emotional => {
                "Is the moment good, the subject engaging and the mood right?"
            }
            GradingStage::Objective => {
                "Is the photo sharp, evenly lit and neatly composed?"
            }
        }
    }

    /// 1-based step number shown next to the question.
    pub fn number(&self) -> usize {
        match self {
            GradingStage::Emotional => 1,
            GradingStage::Objective => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub emotional: Option<u8>,
    pub objective: Option<u8>,
}

impl Scores {
    pub fn is_complete(&self) -> bool {
        self.emotional.is_some() && self.objective.is_some()
    }

    pub fn total(&self) -> Option<u8> {
        Some(self.emotional? + self.objective?)
    }
}

/// Persisted grading progress. `order` holds photo ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradingState {
    pub order: Vec<String>,
    pub index: usize,
    pub stage: GradingStage,
    pub scores: BTreeMap<String, Scores>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingStep {
    /// Same photo, second question.
    NextQuestion,
    NextPhoto(usize),
    /// The last photo got its second score.
    Complete,
}

/// What the shell shows: the current photo with its neighbours as peeks.
#[derive(Debug, Clone, Copy)]
pub struct GradingView<'a> {
    pub position: usize,
    pub total: usize,
    pub stage: GradingStage,
    pub previous: Option<&'a Photo>,
    pub current: &'a Photo,
    pub next: Option<&'a Photo>,
    pub scores: Scores,
}

pub struct GradingSession<'a, S: StateStore> {
    store: &'a S,
    photos: Vec<Photo>,
    state: GradingState,
}

impl<'a, S: StateStore> GradingSession<'a, S> {
    /// Pick up the stored pass, or start one over the head of `deck`.
    pub fn resume(store: &'a S, deck: &[Photo]) -> Result<Self, GradingError> {
        let mut state = store.read().grading;
        if state.order.is_empty() && !deck.is_empty() {
            state = GradingState {
                order: deck
                    .iter()
                    .take(GRADING_DECK_SIZE)
                    .map(|photo| photo.id.clone())
                    .collect(),
                ..GradingState::default()
            };
            let snapshot = state.clone();
            store.update(move |s| s.grading = snapshot)?;
            log::info!("Grading pass started with {} photos", state.order.len());
        }
        state.index = state.index.min(state.order.len().saturating_sub(1));

        let catalog = PhotoCatalog::new(deck);
        let photos = state
            .order
            .iter()
            .map(|id| catalog.rehydrate(&Photo::new(id.as_str(), "")))
            .collect();

        Ok(Self {
            store,
            photos,
            state,
        })
    }

    pub fn view(&self) -> Option<GradingView<'_>> {
        let index = self.state.index;
        let current = self.photos.get(index)?;
        Some(GradingView {
            position: index,
            total: self.photos.len(),
            stage: self.state.stage,
            previous: index.checked_sub(1).and_then(|i| self.photos.get(i)),
            current,
            next: self.photos.get(index + 1),
            scores: self.scores_of(&current.id),
        })
    }

    /// Record `score` for the current photo and stage, then advance. The
    /// session moves only after the store accepted the write.
    pub fn rate(&mut self, score: u8) -> Result<GradingStep, GradingError> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(GradingError::ScoreOutOfRange(score));
        }
        let id = self
            .state
            .order
            .get(self.state.index)
            .cloned()
            .ok_or(GradingError::NothingToGrade)?;

        let mut next = self.state.clone();
        let entry = next.scores.entry(id.clone()).or_default();
        let step = match next.stage {
            GradingStage::Emotional => {
                entry.emotional = Some(score);
                next.stage = GradingStage::Objective;
                GradingStep::NextQuestion
            }
            GradingStage::Objective => {
                entry.objective = Some(score);
                next.stage = GradingStage::Emotional;
                if next.index + 1 < next.order.len() {
                    next.index += 1;
                    GradingStep::NextPhoto(next.index)
                } else {
                    GradingStep::Complete
                }
            }
        };

        let snapshot = next.clone();
        self.store.update(move |s| s.grading = snapshot)?;
        log::debug!("Scored {} with {} ({:?})", id, score, self.state.stage);
        self.state = next;
        Ok(step)
    }

    pub fn is_complete(&self) -> bool {
        !self.state.order.is_empty()
            && self
                .state
                .order
                .iter()
                .all(|id| self.scores_of(id).is_complete())
    }

    /// Photos with both scores, best total first. Ties keep deck order.
    pub fn ranked(&self) -> Vec<(Photo, Scores)> {
        let mut ranked: Vec<(Photo, Scores)> = self
            .photos
            .iter()
            .map(|photo| (photo.clone(), self.scores_of(&photo.id)))
            .filter(|(_, scores)| scores.is_complete())
            .collect();
        ranked.sort_by(|a, b| b.1.total().cmp(&a.1.total()));
        ranked
    }

    fn scores_of(&self, id: &str) -> Scores {
        self.state.scores.get(id).copied().unwrap_or_default()
    }
}
