use crate::core::duplicate::{grouped_photo_count, DuplicateDetector};
use crate::core::photo::{DuplicateGroup, Photo};
use crate::core::store::{StateStore, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No photo is awaiting a decision")]
    NotPresenting,

    #[error("State store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipePhase {
    Idle,
    /// The photo at this deck index is the only actionable item.
    Presenting(usize),
    Concluded,
    /// Deck failed to load or was empty. Terminal.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwipeProgress {
    pub position: usize,
    pub total: usize,
    pub remaining: usize,
    pub accepted: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwipeSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub duplicate_groups: usize,
    pub duplicate_photos: usize,
}

impl SwipeSummary {
    pub fn has_duplicates(&self) -> bool {
        self.duplicate_groups > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeStep {
    Next(usize),
    Concluded(SwipeSummary),
}

/// Linear pass over a fixed deck. Each decision is one read-modify-write of
/// the store, in deck order; `&mut self` keeps them serialized.
pub struct SwipeSession<'a, S: StateStore> {
    store: &'a S,
    detector: DuplicateDetector,
    deck: Vec<Photo>,
    yes_photos: Vec<Photo>,
    no_photos: Vec<Photo>,
    groups: Vec<DuplicateGroup>,
    phase: SwipePhase,
}

impl<'a, S: StateStore> SwipeSession<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_detector(store, DuplicateDetector::new())
    }

    pub fn with_detector(store: &'a S, detector: DuplicateDetector) -> Self {
        Self {
            store,
            detector,
            deck: Vec::new(),
            yes_photos: Vec::new(),
            no_photos: Vec::new(),
            groups: Vec::new(),
            phase: SwipePhase::Idle,
        }
    }

    /// Reset the session fields in state and take `deck` as the fixed order.
    pub fn start(&mut self, deck: Vec<Photo>) -> Result<SwipePhase, SessionError> {
        self.store.update(|state| state.clear_session())?;

        self.yes_photos.clear();
        self.no_photos.clear();
        self.groups.clear();
        self.deck = deck;
        self.phase = if self.deck.is_empty() {
            log::info!("Deck is empty, nothing to swipe");
            SwipePhase::Empty
        } else {
            log::info!("Swipe session started with {} photos", self.deck.len());
            SwipePhase::Presenting(0)
        };
        Ok(self.phase)
    }

    pub fn phase(&self) -> SwipePhase {
        self.phase
    }

    pub fn current(&self) -> Option<&Photo> {
        match self.phase {
            SwipePhase::Presenting(index) => self.deck.get(index),
            _ => None,
        }
    }

    /// Accept/reject controls are live only while a photo is presented.
    pub fn controls_enabled(&self) -> bool {
        matches!(self.phase, SwipePhase::Presenting(_))
    }

    pub fn current_index(&self) -> usize {
        match self.phase {
            SwipePhase::Presenting(index) => index,
            SwipePhase::Concluded => self.deck.len(),
            SwipePhase::Idle | SwipePhase::Empty => 0,
        }
    }

    pub fn progress(&self) -> SwipeProgress {
        let position = self.current_index();
        SwipeProgress {
            position,
            total: self.deck.len(),
            remaining: self.deck.len().saturating_sub(position),
            accepted: self.yes_photos.len(),
            rejected: self.no_photos.len(),
        }
    }

    pub fn decide(&mut self, verdict: Verdict) -> Result<SwipeStep, SessionError> {
        let SwipePhase::Presenting(index) = self.phase else {
            return Err(SessionError::NotPresenting);
        };
        let photo = self.deck[index].clone();
        log::debug!("{:?} {} ({})", verdict, photo.id, photo.display_name());

        // Nothing moves until the store has the decision. The last decision
        // carries the duplicate groups in the same write.
        let mut yes = self.yes_photos.clone();
        let mut no = self.no_photos.clone();
        match verdict {
            Verdict::Accept => yes.push(photo),
            Verdict::Reject => no.push(photo),
        }
        let next = index + 1;
        let groups = (next >= self.deck.len()).then(|| self.detector.detect(&yes));

        let (yes_snapshot, no_snapshot, groups_snapshot) = (yes.clone(), no.clone(), groups.clone());
        self.store.update(move |state| {
            state.yes_photos = yes_snapshot;
            state.no_photos = no_snapshot;
            if let Some(groups) = groups_snapshot {
                state.duplicate_groups = groups;
            }
        })?;
        self.yes_photos = yes;
        self.no_photos = no;

        match groups {
            None => {
                self.phase = SwipePhase::Presenting(next);
                Ok(SwipeStep::Next(next))
            }
            Some(groups) => {
                self.groups = groups;
                self.phase = SwipePhase::Concluded;
                let summary = self.summary();
                log::info!(
                    "Swipe concluded: {} kept, {} skipped, {} duplicate groups",
                    summary.accepted,
                    summary.rejected,
                    summary.duplicate_groups
                );
                Ok(SwipeStep::Concluded(summary))
            }
        }
    }

    pub fn summary(&self) -> SwipeSummary {
        SwipeSummary {
            accepted: self.yes_photos.len(),
            rejected: self.no_photos.len(),
            duplicate_groups: self.groups.len(),
            duplicate_photos: grouped_photo_count(&self.groups),
        }
    }

    pub fn yes_photos(&self) -> &[Photo] {
        &self.yes_photos
    }

    pub fn no_photos(&self) -> &[Photo] {
        &self.no_photos
    }

    pub fn duplicate_groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }
}
