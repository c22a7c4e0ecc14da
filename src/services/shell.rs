// The presentation surface the workflow talks to. The core never renders;
// it hands the shell whatever is currently actionable and asks it for the
// user's decision.

use crate::core::grading::{GradingStage, GradingView, Scores, MAX_SCORE, MIN_SCORE};
use crate::core::photo::Photo;
use crate::core::session::{SwipeProgress, SwipeSummary, Verdict};
use crate::core::summary::TargetStatus;
use crate::core::tournament::{Matchup, Side};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, MultiSelect, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Intake,
    Prepare,
    Swipe,
    Pairwise,
    Grade,
    Summary,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::Intake => "intake",
            Screen::Prepare => "prepare",
            Screen::Swipe => "swipe",
            Screen::Pairwise => "pairwise",
            Screen::Grade => "grade",
            Screen::Summary => "summary",
        };
        f.write_str(name)
    }
}

pub trait UiShell {
    fn navigate(&mut self, screen: Screen);

    /// Transient message (toast).
    fn notify(&mut self, message: &str);

    fn render_card(&mut self, photo: &Photo, progress: &SwipeProgress);

    /// Deck could not be loaded; both decision controls are disabled.
    fn render_empty_deck(&mut self);

    fn render_swipe_summary(&mut self, summary: &SwipeSummary);

    fn render_matchup(&mut self, matchup: &Matchup<'_>);

    fn render_refined(&mut self, refined: &[Photo], status: TargetStatus);

    fn render_grading(&mut self, view: &GradingView<'_>);

    /// Fully scored photos, best first.
    fn render_grades(&mut self, ranked: &[(Photo, Scores)]);

    /// Raw link input; `None` when the user backs out.
    fn prompt_drive_link(&mut self, current: Option<&str>) -> Option<String>;

    /// Raw target-count input; `None` when the user backs out.
    fn prompt_target(&mut self, current: Option<u32>) -> Option<String>;

    /// `None` when the user quits the swipe screen.
    fn prompt_verdict(&mut self) -> Option<Verdict>;

    /// `None` when the user quits the pairwise screen.
    fn prompt_side(&mut self) -> Option<Side>;

    /// Score for the question of `stage`; `None` when the user quits.
    fn prompt_score(&mut self, stage: GradingStage) -> Option<u8>;

    /// Positions in `refined` the user keeps ticked. `selected` holds the
    /// current ticks; `None` leaves the selection as it was.
    fn prompt_selection(&mut self, refined: &[Photo], selected: &[bool]) -> Option<Vec<usize>>;

    fn start_loading(&mut self, _message: &str) {}

    fn finish_loading(&mut self) {}
}

/// Interactive terminal shell built on dialoguer prompts.
pub struct TerminalShell {
    theme: ColorfulTheme,
    spinner: Option<ProgressBar>,
}

impl TerminalShell {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
            spinner: None,
        }
    }
}

impl Default for TerminalShell {
    fn default() -> Self {
        Self::new()
    }
}

fn dimensions(photo: &Photo) -> String {
    match (photo.width, photo.height) {
        (Some(w), Some(h)) => format!("{}×{}", w, h),
        _ => "?×?".to_string(),
    }
}

fn peek(photo: Option<&Photo>) -> &str {
    photo.map(Photo::display_name).unwrap_or("")
}

impl UiShell for TerminalShell {
    fn navigate(&mut self, screen: Screen) {
        log::debug!("Navigating to {}", screen);
        println!("\n▶ {}", screen.to_string().to_uppercase());
    }

    fn notify(&mut self, message: &str) {
        println!("💬 {}", message);
    }

    fn render_card(&mut self, photo: &Photo, progress: &SwipeProgress) {
        println!(
            "\n📷 {}   [{}/{}]",
            photo.display_name(),
            progress.position + 1,
            progress.total
        );
        println!("   {}", photo.src);
        println!(
            "   Remaining: {} │ Yes: {} │ No: {}",
            progress.remaining, progress.accepted, progress.rejected
        );
    }

    fn render_empty_deck(&mut self) {
        println!("No photos found in manifest.");
        println!("   Remaining: 0 │ 👍 Keep (disabled) │ 👎 Skip (disabled)");
    }

    fn render_swipe_summary(&mut self, summary: &SwipeSummary) {
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        println!(
            "\n✅ You approved {} photo{} and skipped {}.",
            summary.accepted,
            plural(summary.accepted),
            summary.rejected
        );
        if summary.has_duplicates() {
            println!(
                "   Found {} duplicate group{} with {} photo{} total.",
                summary.duplicate_groups,
                plural(summary.duplicate_groups),
                summary.duplicate_photos,
                plural(summary.duplicate_photos)
            );
        } else {
            println!("   No duplicate patterns detected. Nice!");
        }
    }

    fn render_matchup(&mut self, matchup: &Matchup<'_>) {
        println!(
            "\n🥊 Group {} / {} · Round {} / {}",
            matchup.group_number, matchup.group_total, matchup.round, matchup.rounds
        );
        println!(
            "   ◀ {} ({})   {}",
            matchup.left.display_name(),
            dimensions(matchup.left),
            matchup.left.src
        );
        println!(
            "   ▶ {} ({})   {}",
            matchup.right.display_name(),
            dimensions(matchup.right),
            matchup.right.src
        );
    }

    fn render_refined(&mut self, refined: &[Photo], status: TargetStatus) {
        println!("\n🏆 Final selection: {} photo(s), {}", refined.len(), status);
        for (i, photo) in refined.iter().enumerate() {
            println!("   {:>3}. {}", i + 1, photo.display_name());
        }
    }

    fn render_grading(&mut self, view: &GradingView<'_>) {
        println!(
            "\n⭐ {} / {} · Question {} of 2",
            view.position + 1,
            view.total,
            view.stage.number()
        );
        println!(
            "   {}  [ {} ]  {}",
            peek(view.previous),
            view.current.display_name(),
            peek(view.next)
        );
        println!("   {}", view.current.src);
        if let Some(emotional) = view.scores.emotional {
            println!("   Feeling: {}", emotional);
        }
        println!("   {}", view.stage.question());
    }

    fn render_grades(&mut self, ranked: &[(Photo, Scores)]) {
        println!("\n🏅 Graded {} photo(s)", ranked.len());
        for (photo, scores) in ranked {
            println!(
                "   {:>2} ({}+{})  {}",
                scores.total().unwrap_or(0),
                scores.emotional.unwrap_or(0),
                scores.objective.unwrap_or(0),
                photo.display_name()
            );
        }
    }

    fn prompt_drive_link(&mut self, current: Option<&str>) -> Option<String> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt("Paste your Drive link")
            .allow_empty(true);
        if let Some(current) = current {
            input = input.default(current.to_string());
        }
        match input.interact_text() {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Link prompt aborted: {}", e);
                None
            }
        }
    }

    fn prompt_target(&mut self, current: Option<u32>) -> Option<String> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt("How many photos do you want to keep?")
            .allow_empty(true);
        if let Some(current) = current {
            input = input.default(current.to_string());
        }
        match input.interact_text() {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Target prompt aborted: {}", e);
                None
            }
        }
    }

    fn prompt_verdict(&mut self) -> Option<Verdict> {
        let choice = Select::with_theme(&self.theme)
            .with_prompt("Keep this photo? (Esc to quit)")
            .items(&["👍 Keep", "👎 Skip"])
            .default(0)
            .interact_opt();
        match choice {
            Ok(Some(0)) => Some(Verdict::Accept),
            Ok(Some(_)) => Some(Verdict::Reject),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Swipe prompt aborted: {}", e);
                None
            }
        }
    }

    fn prompt_side(&mut self) -> Option<Side> {
        let choice = Select::with_theme(&self.theme)
            .with_prompt("Which one stays? (Esc to quit)")
            .items(&["◀ Left", "▶ Right"])
            .default(0)
            .interact_opt();
        match choice {
            Ok(Some(0)) => Some(Side::Left),
            Ok(Some(_)) => Some(Side::Right),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Pairwise prompt aborted: {}", e);
                None
            }
        }
    }

    fn prompt_score(&mut self, stage: GradingStage) -> Option<u8> {
        let scores: Vec<String> = (MIN_SCORE..=MAX_SCORE).map(|n| n.to_string()).collect();
        let choice = Select::with_theme(&self.theme)
            .with_prompt(format!("Score {} (Esc to quit)", stage.number()))
            .items(&scores)
            .default(0)
            .interact_opt();
        match choice {
            Ok(Some(i)) => u8::try_from(i).ok().map(|i| MIN_SCORE + i),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Score prompt aborted: {}", e);
                None
            }
        }
    }

    fn prompt_selection(&mut self, refined: &[Photo], selected: &[bool]) -> Option<Vec<usize>> {
        let names: Vec<&str> = refined.iter().map(Photo::display_name).collect();
        let choice = MultiSelect::with_theme(&self.theme)
            .with_prompt("Tick the photos to hand over (Space toggles, Esc keeps the current picks)")
            .items(&names)
            .defaults(selected)
            .interact_opt();
        match choice {
            Ok(picked) => picked,
            Err(e) => {
                log::warn!("Selection prompt aborted: {}", e);
                None
            }
        }
    }

    fn start_loading(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn finish_loading(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}
