//! fitview-inspect - load a decoded FIT file into the state store
//!
//! Runs the full loading pipeline (load, process, validate, metrics) on a
//! JSON file produced by a FIT decoder and prints what ended up in state.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p fitview-inspect -- ride.json
//!
//! # Show every state slot and the last 50 writes
//! cargo run -p fitview-inspect -- ride.json --state --changes 50 --verbose
//! ```

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use fitview_state::debug::DebugState;
use fitview_state::{App, AppConfig, SystemClock, TracingNotifier};
use tracing_subscriber::EnvFilter;

/// Inspect how a decoded FIT file is loaded into application state
#[derive(Parser, Debug)]
#[command(name = "fitview-inspect")]
#[command(about = "Load a decoded FIT file (JSON) and print the resulting state")]
struct Args {
    /// Decoded FIT file as JSON (`recordMesgs`, `sessionMesgs`, ...)
    file: PathBuf,

    /// Application config as JSON
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Print every state slot after loading
    #[arg(long)]
    state: bool,

    /// Number of recent state changes to print
    #[arg(long, default_value = "20")]
    changes: usize,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => AppConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::default(),
    };

    let contents = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let data: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", args.file.display()))?;

    let app = App::new(config, Rc::new(TracingNotifier), Rc::new(SystemClock))?;
    app.actions().set_initialized(true);

    let scheduler = app.render_scheduler();
    let path = args.file.display().to_string();
    let load = async {
        let result = app.actions().load_file(data, &path).await;
        app.actions().switch_theme("dark");
        tokio::time::sleep(app.config().chart_render_debounce() * 2).await;
        scheduler.dispose();
        result
    };
    let (result, ()) = tokio::join!(
        load,
        scheduler.run(|| tracing::info!("Charts would re-render now"))
    );
    result.context("loading failed")?;

    let selectors = app.fit_file_selectors();
    println!("file:       {}", selectors.current_file().unwrap_or_default());
    println!("phase:      {:?}", selectors.phase());
    println!("quality:    {}%", selectors.data_quality_score());
    println!(
        "metrics:    {}",
        serde_json::to_string_pretty(&selectors.metrics())?
    );
    if let Some(validation) = selectors.validation() {
        println!("validation: {validation}");
    }
    println!("renders:    {}", scheduler.render_count());

    if args.state {
        println!();
        print!("{}", app.store().debug_text());
    }

    if args.changes > 0 {
        println!();
        println!("recent changes:");
        for entry in app.change_log().recent(args.changes) {
            println!(
                "  #{:<4} {:<28} {:<40} {}",
                entry.sequence,
                entry.path,
                entry.source.as_deref().unwrap_or("-"),
                entry.summary
            );
        }
    }

    app.dispose();
    Ok(())
}
