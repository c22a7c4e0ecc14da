use anyhow::Result;
use clap::{Parser, Subcommand};
use photoflow::commands;
use photoflow::config::{manifest_root, FlowConfig};
use photoflow::core::manifest::GenerateOptions;
use photoflow::core::store::{FileStateStore, MemoryStateStore, StateStore};
use photoflow::services::Screen;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "photoflow", version, about = "Swipe, de-duplicate and curate a photo set")]
struct Cli {
    /// State file (default: platform data dir)
    #[arg(long, global = true, value_name = "FILE", env = "PHOTOFLOW_STATE")]
    state: Option<PathBuf>,

    /// Photo manifest
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "PHOTOFLOW_MANIFEST",
        default_value = "photos/manifest.json"
    )]
    manifest: PathBuf,

    /// Base directory for relative photo sources (default: manifest's directory)
    #[arg(long, global = true, value_name = "DIR")]
    photo_root: Option<PathBuf>,

    /// Seconds to wait after the target is set
    #[arg(long, global = true, default_value_t = 5)]
    countdown: u64,

    /// Only swipe the first N photos
    #[arg(long, global = true, value_name = "N")]
    limit: Option<usize>,

    /// Leave photos whose names reduce to nothing (`1.jpg`, `2.jpg`) ungrouped
    #[arg(long, global = true)]
    no_blank_groups: bool,

    /// Keep state in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Full flow: link, target, swipe, pairwise, summary
    Run,

    /// Submit the Drive link for this session
    Intake {
        /// Link to record; prompts when omitted
        link: Option<String>,
    },

    /// Set the target photo count
    Prepare,

    /// Swipe through the deck
    Swipe,

    /// Resolve duplicate groups head-to-head
    Pairwise,

    /// Score photos on feeling and technique, 1-4 each
    Grade,

    /// Show the curated set and tick the photos to hand over
    Summary,

    /// Manifest tooling
    Manifest {
        #[command(subcommand)]
        command: ManifestCmd,
    },

    /// Inspect or reset the persisted state
    State {
        #[command(subcommand)]
        command: StateCmd,
    },
}

#[derive(Subcommand, Debug)]
enum ManifestCmd {
    /// Write `manifest.json` for the images in a directory
    Generate {
        /// Directory holding the photos
        #[arg(value_name = "DIR")]
        dir: PathBuf,
        /// Output file (default: `<DIR>/manifest.json`)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Prefix for every entry, e.g. `./photos/`
        #[arg(long, default_value = "")]
        prefix: String,
        /// Probe and record image dimensions
        #[arg(long)]
        dimensions: bool,
    },
}

#[derive(Subcommand, Debug)]
enum StateCmd {
    /// Print the state as JSON
    Show,
    /// Reset the state to defaults
    Reset,
}

impl Cli {
    fn config(&self) -> FlowConfig {
        let mut config = FlowConfig::new(&self.manifest);
        if let Some(state) = &self.state {
            config.state_path = state.clone();
        }
        config.photo_root = self
            .photo_root
            .clone()
            .unwrap_or_else(|| manifest_root(&self.manifest));
        config.countdown = Duration::from_secs(self.countdown);
        config.deck_limit = self.limit;
        config.group_blank_keys = !self.no_blank_groups;
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "photoflow=debug" } else { "photoflow=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config();
    if cli.ephemeral {
        dispatch(&MemoryStateStore::new(), &config, cli.command).await
    } else {
        log::debug!("State file: {}", config.state_path.display());
        dispatch(&FileStateStore::new(&config.state_path), &config, cli.command).await
    }
}

async fn dispatch<S: StateStore>(store: &S, config: &FlowConfig, command: Commands) -> Result<()> {
    match command {
        Commands::Run => commands::run_flow(store, config).await,
        Commands::Intake { link: Some(link) } => commands::submit_link(store, &link).map(|_| ()),
        Commands::Intake { link: None } => commands::run_screen(store, config, Screen::Intake).await,
        Commands::Prepare => commands::run_screen(store, config, Screen::Prepare).await,
        Commands::Swipe => commands::run_screen(store, config, Screen::Swipe).await,
        Commands::Pairwise => commands::run_screen(store, config, Screen::Pairwise).await,
        Commands::Grade => commands::run_screen(store, config, Screen::Grade).await,
        Commands::Summary => commands::run_screen(store, config, Screen::Summary).await,
        Commands::Manifest { command } => match command {
            ManifestCmd::Generate {
                dir,
                output,
                prefix,
                dimensions,
            } => {
                println!("▶ Scanning for photos in: {}", dir.display());
                let options = GenerateOptions { prefix, dimensions };
                commands::write_manifest(&dir, output, &options).map(|_| ())
            }
        },
        Commands::State { command } => match command {
            StateCmd::Show => commands::show_state(store),
            StateCmd::Reset => commands::reset_state(store),
        },
    }
}
