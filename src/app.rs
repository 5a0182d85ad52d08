//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds the explicit `DashboardConfig`
//! - loads the indicator table
//! - prints tables/plots/narratives
//! - writes optional exports

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::{ChartArgs, Command, DashboardArgs, NarrateArgs, TableArgs};
use crate::config::DashboardConfig;
use crate::data::LoadOutcome;
use crate::error::AppError;

pub mod pipeline;

use pipeline::Session;

/// Entry point for the `econ` binary.
pub fn run() -> Result<(), AppError> {
    // We want `econ` and `econ --countries JPN,USA` to behave like `econ tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Table(args) => {
            init_logging();
            handle_table(args)
        }
        Command::Chart(args) => {
            init_logging();
            handle_chart(args)
        }
        Command::Narrate(args) => {
            init_logging();
            handle_narrate(args)
        }
        Command::Models(args) => {
            init_logging();
            handle_models(args)
        }
        // No subscriber: log lines would tear the alternate screen.
        Command::Tui(args) => crate::tui::run(session_from_args(&args)?),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn session_from_args(args: &DashboardArgs) -> Result<Session, AppError> {
    let config = DashboardConfig::from_args(args)?;
    Session::from_config(config)
}

/// Load the table, turning "no rows" into an exit-code-3 error for CLI use.
fn load_nonempty(session: &Session) -> Result<LoadOutcome, AppError> {
    let outcome = session.load()?;
    if let Some(diag) = &outcome.diagnostic {
        return Err(AppError::new(4, diag.clone()));
    }
    if outcome.table.is_empty() {
        return Err(AppError::new(
            3,
            "No indicator data returned for the requested countries and years.",
        ));
    }
    Ok(outcome)
}

fn handle_table(args: TableArgs) -> Result<(), AppError> {
    let session = session_from_args(&args.dashboard)?;
    let outcome = load_nonempty(&session)?;

    println!("{}", crate::report::format_table(&outcome.table));

    if let Some(path) = &args.export {
        crate::io::export::write_table_csv(path, &outcome.table)?;
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}

fn handle_chart(args: ChartArgs) -> Result<(), AppError> {
    let session = session_from_args(&args.dashboard)?;
    let outcome = load_nonempty(&session)?;
    let table = &outcome.table;

    let label = match &args.indicator {
        Some(label) => {
            if table.label_index(label).is_none() {
                return Err(AppError::new(
                    2,
                    format!(
                        "Unknown indicator '{label}'. Available: {}.",
                        table.labels().join(", ")
                    ),
                ));
            }
            label.clone()
        }
        None => table
            .labels()
            .first()
            .cloned()
            .ok_or_else(|| AppError::new(3, "Table has no indicator columns."))?,
    };

    let plot = crate::plot::render_ascii_plot(table, &label, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_narrate(args: NarrateArgs) -> Result<(), AppError> {
    let mut session = session_from_args(&args.dashboard)?;
    let outcome = session.load()?;
    if let Some(diag) = &outcome.diagnostic {
        eprintln!("{diag}");
    }

    let year = session.target_year(&outcome.table, args.year)?;
    println!("{}", crate::report::format_year_slice(&outcome.table.for_year(year)));

    let narrative = session.narrate(&outcome.table, year)?;
    println!("{}", crate::report::format_narrative(&narrative));

    if let Some(path) = &args.brief {
        crate::io::brief::write_brief(path, &outcome.table, &narrative)?;
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}

fn handle_models(args: DashboardArgs) -> Result<(), AppError> {
    let mut session = session_from_args(&args)?;
    if session.config().ai.api_key.is_none() {
        return Err(crate::error::GenerationError::MissingCredential.into());
    }
    let (catalog, chosen) = session.model_choice();
    println!("{}", crate::report::format_catalog(&catalog, &chosen));
    Ok(())
}

/// Rewrite argv so `econ` defaults to `econ tui`.
///
/// Rules:
/// - `econ`                       -> `econ tui`
/// - `econ --countries JPN ...`   -> `econ tui --countries JPN ...`
/// - `econ --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "table" | "chart" | "narrate" | "models" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
