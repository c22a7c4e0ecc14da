use crate::config::FlowConfig;
use crate::core::intake::{parse_link, record_link, route, Route};
use crate::core::manifest::{generate_manifest, GenerateOptions, MANIFEST_FILE};
use crate::core::store::StateStore;
use crate::services::shell::{Screen, TerminalShell};
use crate::services::workflow::{FlowOutcome, GradeOutcome, SwipeOutcome, Workflow};
use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// prepare → swipe → pairwise → summary.
pub async fn run_flow<S: StateStore>(store: &S, config: &FlowConfig) -> Result<()> {
    let mut shell = TerminalShell::new();
    let mut workflow = Workflow::new(store, &mut shell, config);

    match workflow.run().await? {
        FlowOutcome::Completed(refined) => {
            println!("\n✅ Curated {} photo(s).", refined.len());
        }
        FlowOutcome::EmptyDeck => {
            println!("\n⚠️  Nothing to curate; check {}", config.manifest_path.display());
        }
        FlowOutcome::Interrupted => {
            println!("\n⏸  Stopped. Progress so far is saved.");
        }
    }
    Ok(())
}

/// Run one screen against the persisted state.
pub async fn run_screen<S: StateStore>(store: &S, config: &FlowConfig, screen: Screen) -> Result<()> {
    let mut shell = TerminalShell::new();
    let mut workflow = Workflow::new(store, &mut shell, config);

    match screen {
        Screen::Intake => {
            if let Some(route) = workflow.intake()? {
                print_route(route);
            }
        }
        Screen::Prepare => {
            workflow.prepare().await?;
        }
        Screen::Swipe => match workflow.swipe().await? {
            SwipeOutcome::Concluded(summary) if summary.has_duplicates() => {
                println!("\n➡️  Next: photoflow pairwise");
            }
            SwipeOutcome::Concluded(_) => {
                println!("\n➡️  Next: photoflow pairwise (finalizes) or photoflow summary");
            }
            SwipeOutcome::EmptyDeck | SwipeOutcome::Interrupted => {}
        },
        Screen::Pairwise => {
            if workflow.pairwise().await?.is_some() {
                workflow.summary()?;
            }
        }
        Screen::Grade => match workflow.grade().await? {
            GradeOutcome::Completed(graded) => println!("\n✅ {} photo(s) fully graded.", graded),
            GradeOutcome::Interrupted => println!("\n⏸  Stopped. Grades so far are saved."),
            GradeOutcome::EmptyDeck => {}
        },
        Screen::Summary => {
            workflow.summary()?;
        }
    }
    Ok(())
}

/// Record a Drive link without prompting.
pub fn submit_link<S: StateStore>(store: &S, raw: &str) -> Result<Route> {
    let link = parse_link(raw)?;
    let state = store
        .update(|s| record_link(s, link, Utc::now()))
        .context("Failed to record Drive link")?;
    let route = route(&state);
    println!("🔗 Drive link saved");
    print_route(route);
    Ok(route)
}

fn print_route(route: Route) {
    match route {
        Route::Welcome => println!("➡️  Next: photoflow prepare (first visit)"),
        Route::Prepare => println!("➡️  Next: photoflow prepare"),
    }
}

pub fn write_manifest(
    dir: &Path,
    output: Option<PathBuf>,
    options: &GenerateOptions,
) -> Result<PathBuf> {
    let start = Instant::now();
    let manifest = generate_manifest(dir, options)
        .with_context(|| format!("Failed to list photos in {}", dir.display()))?;

    let output = output.unwrap_or_else(|| dir.join(MANIFEST_FILE));
    fs::write(&output, manifest.to_json()?)
        .with_context(|| format!("Failed to write manifest {}", output.display()))?;

    println!(
        "✅ Manifest updated with {} photos -> {} ({:.2?})",
        manifest.photos.len(),
        output.display(),
        start.elapsed()
    );
    Ok(output)
}

pub fn show_state<S: StateStore>(store: &S) -> Result<()> {
    let state = store.read();
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

pub fn reset_state<S: StateStore>(store: &S) -> Result<()> {
    store.reset().context("Failed to reset state")?;
    println!("🧹 State reset to defaults");
    Ok(())
}
