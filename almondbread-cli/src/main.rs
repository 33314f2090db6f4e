mod cache;
mod document;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use almondbread_render::{
    compute, export_png, render, BuiltinScheme, CancelToken, ExportMetadata, RenderError,
    RenderSettings,
};

use cache::{CachePaths, CacheState};
use document::ImageDocument;
use error::CliError;

/// Exit status for a run stopped by `--timeout-secs`.
const EXIT_CANCELLED: u8 = 2;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug, Clone)]
#[command(name = "almondbread")]
#[command(about = "Render a Mandelbrot image document to PNG", long_about = None)]
struct Cli {
    /// Image document (JSON)
    document: PathBuf,

    /// Write a default document to DOCUMENT before rendering
    #[arg(long)]
    new: bool,

    /// Ignore every cached value grid and image
    #[arg(long)]
    force: bool,

    /// Cancel the calculation after this many seconds
    #[arg(long, value_name = "N")]
    timeout_secs: Option<u64>,

    /// PNG destination (defaults to `<stem>.png` next to the document)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Switch the document's color scheme
    #[arg(long, value_enum)]
    scheme: Option<SchemeArg>,

    /// Change the document's iteration budget
    #[arg(long, value_name = "N")]
    max_iterations: Option<u32>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum SchemeArg {
    Warm,
    Cool,
}

impl From<SchemeArg> for BuiltinScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Warm => BuiltinScheme::Warm,
            SchemeArg::Cool => BuiltinScheme::Cool,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

fn run(cli: &Cli) -> Result<(), CliError> {
    let mut doc = if cli.new {
        let doc = ImageDocument::default();
        doc.save(&cli.document)?;
        info!("Created {}", cli.document.display());
        doc
    } else {
        ImageDocument::load(&cli.document)?
    };

    let mut edited = false;
    if let Some(scheme) = cli.scheme.map(BuiltinScheme::from) {
        edited |= doc.scheme != scheme;
        doc.scheme = scheme;
    }
    if let Some(max_iterations) = cli.max_iterations {
        edited |= doc.settings.max_iterations != max_iterations;
        doc.settings.max_iterations = max_iterations;
    }
    if edited {
        doc.save(&cli.document)?;
    }

    let paths = CachePaths::for_document(&cli.document, cli.output.as_deref());
    let mut state = if cli.force {
        CacheState::default()
    } else {
        paths.load_state()
    };
    let change = state.change_for(&doc);
    info!(
        cosmetic = change.cosmetic,
        rendering = change.rendering,
        dimensional = change.dimensional,
        "Compared against cached state"
    );
    paths.invalidate(change)?;
    state.forget(change);

    let cancel = Arc::new(CancelToken::new());
    if let Some(secs) = cli.timeout_secs {
        let cancel = Arc::clone(&cancel);
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            warn!("Timeout of {secs}s reached, cancelling");
            cancel.cancel();
        });
    }

    let settings = &doc.settings;
    let mut grid = paths.load_values(settings);
    if !grid.is_complete() {
        let remaining = grid.cell_count() - grid.filled();
        info!(
            "Calculating {}x{} at {} iterations ({} of {} cells left)",
            settings.width,
            settings.height,
            settings.max_iterations,
            remaining,
            grid.cell_count()
        );
        grid = compute(
            settings,
            Some(&grid),
            progress_logger("Calculating", remaining),
            &cancel,
        )?;
        paths.save_values(&grid)?;
    }
    if state.values.as_ref() != Some(settings) {
        state.values = Some(*settings);
        paths.save_state(&state)?;
    }

    if change.is_empty() && paths.load_image(settings).is_some() {
        info!("Nothing changed, {} is up to date", paths.image.display());
        return Ok(());
    }

    let buffer = render(
        &grid,
        &RenderSettings::builtin(settings.max_iterations, doc.scheme),
        progress_logger("Rendering", grid.cell_count()),
        &cancel,
    )?;
    let metadata = ExportMetadata {
        name: doc.name.clone(),
        settings: doc.settings,
        scheme: doc.scheme,
    };
    export_png(&buffer, &paths.image, &metadata)?;
    state.image = Some(doc.clone());
    paths.save_state(&state)?;
    info!("Wrote {}", paths.image.display());
    Ok(())
}

/// Progress sink that logs each completed tenth of `total` cells.
fn progress_logger(stage: &'static str, total: usize) -> impl FnMut(usize) + Send {
    let mut last_decile = 0;
    move |done| {
        if total == 0 {
            return;
        }
        let decile = (done * 10 / total).min(10);
        if decile > last_decile {
            last_decile = decile;
            info!("{stage}: {}%", decile * 10);
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Render(RenderError::Cancelled)) => {
            warn!("Cancelled; cached values left untouched");
            ExitCode::from(EXIT_CANCELLED)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
