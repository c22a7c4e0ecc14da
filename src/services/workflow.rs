use crate::config::FlowConfig;
use crate::core::duplicate::DuplicateDetector;
use crate::core::grading::{GradingError, GradingSession, GradingStep};
use crate::core::intake::{parse_link, record_link, route, Route};
use crate::core::manifest::load_photos;
use crate::core::photo::{DuplicateGroup, Photo, PhotoCatalog};
use crate::core::probe::probe_group;
use crate::core::session::{SessionError, SwipePhase, SwipeSession, SwipeStep, SwipeSummary};
use crate::core::store::{StateStore, StoreError};
use crate::core::summary::{assemble_refined, Selection, TargetStatus};
use crate::core::target::parse_target_count;
use crate::core::tournament::{resolve_groups, Tournament, TournamentError, TournamentOutcome};
use crate::services::shell::{Screen, UiShell};
use chrono::Utc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    #[error("Swipe session error: {0}")]
    Session(#[from] SessionError),

    #[error("Tournament error: {0}")]
    Tournament(#[from] TournamentError),

    #[error("Grading error: {0}")]
    Grading(#[from] GradingError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwipeOutcome {
    Concluded(SwipeSummary),
    EmptyDeck,
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradeOutcome {
    /// Number of fully scored photos.
    Completed(usize),
    EmptyDeck,
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    Completed(Vec<Photo>),
    EmptyDeck,
    Interrupted,
}

/// Drives the screens in order against one state store and one shell.
pub struct Workflow<'a, S: StateStore, U: UiShell> {
    store: &'a S,
    shell: &'a mut U,
    config: &'a FlowConfig,
}

impl<'a, S: StateStore, U: UiShell> Workflow<'a, S, U> {
    pub fn new(store: &'a S, shell: &'a mut U, config: &'a FlowConfig) -> Self {
        Self {
            store,
            shell,
            config,
        }
    }

    pub async fn run(&mut self) -> Result<FlowOutcome, WorkflowError> {
        let Some(route) = self.intake()? else {
            return Ok(FlowOutcome::Interrupted);
        };
        log::debug!("Intake routed to {:?}", route);

        if !self.prepare().await? {
            return Ok(FlowOutcome::Interrupted);
        }

        let summary = match self.swipe().await? {
            SwipeOutcome::Concluded(summary) => summary,
            SwipeOutcome::EmptyDeck => return Ok(FlowOutcome::EmptyDeck),
            SwipeOutcome::Interrupted => return Ok(FlowOutcome::Interrupted),
        };

        if summary.has_duplicates() {
            if self.pairwise().await?.is_none() {
                return Ok(FlowOutcome::Interrupted);
            }
        } else {
            self.finalize(TournamentOutcome::default())?;
        }

        Ok(FlowOutcome::Completed(self.summary()?))
    }

    /// Ask for the Drive link until one is given. Backing out keeps a link
    /// already on record; `None` when there is none.
    pub fn intake(&mut self) -> Result<Option<Route>, WorkflowError> {
        self.shell.navigate(Screen::Intake);
        let state = self.store.read();

        loop {
            let Some(raw) = self.shell.prompt_drive_link(state.drive_link.as_deref()) else {
                return Ok(state.drive_link.is_some().then(|| route(&state)));
            };

            match parse_link(&raw) {
                Ok(link) => {
                    let next = self.store.update(|s| record_link(s, link, Utc::now()))?;
                    log::info!("Drive link recorded");
                    return Ok(Some(route(&next)));
                }
                Err(e) => self.shell.notify(&e.to_string()),
            }
        }
    }

    /// Ask for the target count until it is valid, then count down.
    /// Returns `false` when the user backs out without any target on record.
    pub async fn prepare(&mut self) -> Result<bool, WorkflowError> {
        let state = self.store.read();
        if !state.has_visited {
            self.shell
                .notify("Welcome! Set how many photos you want to keep, then swipe.");
            self.store.update(|s| s.has_visited = true)?;
        }

        self.shell.navigate(Screen::Prepare);
        let mut current = state.target_count;
        loop {
            let Some(raw) = self.shell.prompt_target(current) else {
                if current.is_some() {
                    break;
                }
                self.shell.notify("Enter target to proceed");
                return Ok(false);
            };

            match parse_target_count(&raw) {
                Ok(target) => {
                    self.store.update(|s| s.target_count = Some(target))?;
                    self.shell.notify(&format!("Target set to {}", target));
                    current = Some(target);
                    break;
                }
                Err(e) => {
                    log::debug!("Rejected target input {:?}: {:?}", raw, e);
                    self.shell.notify(&e.to_string());
                }
            }
        }

        if !self.config.countdown.is_zero() {
            self.shell.notify(&format!(
                "Starting in {}s…",
                self.config.countdown.as_secs()
            ));
            tokio::time::sleep(self.config.countdown).await;
        }
        Ok(current.is_some())
    }

    pub async fn swipe(&mut self) -> Result<SwipeOutcome, WorkflowError> {
        self.shell.navigate(Screen::Swipe);

        self.shell.start_loading("Loading photos…");
        let mut deck = load_photos(self.store, &self.config.manifest_path).await;
        self.shell.finish_loading();
        if let Some(limit) = self.config.deck_limit {
            deck.truncate(limit);
        }

        let detector = if self.config.group_blank_keys {
            DuplicateDetector::new()
        } else {
            DuplicateDetector::without_blank_keys()
        };
        let mut session = SwipeSession::with_detector(self.store, detector);
        if session.start(deck)? == SwipePhase::Empty {
            self.shell.render_empty_deck();
            return Ok(SwipeOutcome::EmptyDeck);
        }

        while let Some(photo) = session.current() {
            self.shell.render_card(photo, &session.progress());
            let Some(verdict) = self.shell.prompt_verdict() else {
                log::info!("Swipe stopped at {}", session.current_index());
                return Ok(SwipeOutcome::Interrupted);
            };

            if let SwipeStep::Concluded(summary) = session.decide(verdict)? {
                self.shell.render_swipe_summary(&summary);
                return Ok(SwipeOutcome::Concluded(summary));
            }
        }
        Ok(SwipeOutcome::Interrupted)
    }

    /// Resolve every stored duplicate group to one champion and persist the
    /// refined set. `None` when the user quits mid-tournament.
    pub async fn pairwise(&mut self) -> Result<Option<Vec<Photo>>, WorkflowError> {
        let state = self.store.read();
        if state.duplicate_groups.is_empty() {
            return self.finalize(TournamentOutcome::default()).map(Some);
        }

        self.shell.navigate(Screen::Pairwise);
        self.shell.start_loading("Preparing duplicate groups…");
        let manifest = load_photos(self.store, &self.config.manifest_path).await;
        let catalog = PhotoCatalog::new(&manifest);

        let resolved = resolve_groups(&state.duplicate_groups, &state.yes_photos, &catalog);
        let mut groups = Vec::with_capacity(resolved.len());
        for group in &resolved {
            let photos = probe_group(group.photos.clone(), &self.config.photo_root).await;
            groups.push(DuplicateGroup {
                key: group.key.clone(),
                photos,
            });
        }
        self.shell.finish_loading();

        self.store.update(|s| s.pairwise_decisions.clear())?;

        let mut tournament = Tournament::new(groups);
        while let Some(matchup) = tournament.current() {
            self.shell.render_matchup(&matchup);
            let Some(side) = self.shell.prompt_side() else {
                log::info!("Pairwise stopped before all groups were resolved");
                return Ok(None);
            };
            tournament.choose(side)?;
        }

        self.finalize(tournament.into_outcome().with_records(&resolved))
            .map(Some)
    }

    /// Two-question grading over the head of the deck, resuming any pass
    /// already on record.
    pub async fn grade(&mut self) -> Result<GradeOutcome, WorkflowError> {
        self.shell.navigate(Screen::Grade);
        self.shell.start_loading("Loading photos…");
        let deck = load_photos(self.store, &self.config.manifest_path).await;
        self.shell.finish_loading();

        let mut session = GradingSession::resume(self.store, &deck)?;
        if session.view().is_none() {
            self.shell.render_empty_deck();
            return Ok(GradeOutcome::EmptyDeck);
        }

        if !session.is_complete() {
            while let Some(view) = session.view() {
                self.shell.render_grading(&view);
                let Some(score) = self.shell.prompt_score(view.stage) else {
                    log::info!("Grading stopped at {}", view.position);
                    return Ok(GradeOutcome::Interrupted);
                };

                match session.rate(score) {
                    Ok(GradingStep::Complete) => break,
                    Ok(_) => {}
                    Err(e @ GradingError::ScoreOutOfRange(_)) => self.shell.notify(&e.to_string()),
                    Err(e) => return Err(e.into()),
                }
            }
        }

        let ranked = session.ranked();
        self.shell.render_grades(&ranked);
        Ok(GradeOutcome::Completed(ranked.len()))
    }

    fn finalize(&mut self, outcome: TournamentOutcome) -> Result<Vec<Photo>, WorkflowError> {
        let latest = self.store.read();
        let refined = assemble_refined(
            &latest.yes_photos,
            &latest.duplicate_groups,
            &outcome.champions,
        );

        let snapshot = refined.clone();
        self.store.update(move |s| {
            s.pairwise_decisions = outcome.decisions;
            s.refined_yes_photos = snapshot;
        })?;
        log::info!("Refined selection holds {} photos", refined.len());
        Ok(refined)
    }

    /// Show the refined set against the target and let the user tick the
    /// photos to hand over.
    pub fn summary(&mut self) -> Result<Vec<Photo>, WorkflowError> {
        self.shell.navigate(Screen::Summary);
        let state = self.store.read();
        let refined = if state.refined_yes_photos.is_empty() {
            state.yes_photos
        } else {
            state.refined_yes_photos
        };

        let status = TargetStatus::evaluate(refined.len(), state.target_count);
        self.shell.render_refined(&refined, status);
        if refined.is_empty() {
            return Ok(refined);
        }

        let mut selection = Selection::restore(&refined, &state.selected_photo_ids);
        if let Some(picked) = self
            .shell
            .prompt_selection(&refined, &selection.flags(&refined))
        {
            selection = Selection::from_indices(&refined, &picked);
            let ids = selection.ids().to_vec();
            self.store.update(move |s| s.selected_photo_ids = ids)?;
        }
        self.shell.notify(&selection.label(state.target_count));
        Ok(refined)
    }
}
