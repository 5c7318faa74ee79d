use std::{fmt::Display, path::PathBuf};

use clap::{ArgAction, Parser, ValueEnum};
use color_eyre::eyre::{Report, Result, WrapErr, eyre};
use tracing::{info, warn};

use masterdetail::{
    MasterDetail, MasterDetailApp, MemoryStore, SamplePerson, ValidationMode, ViewOptions,
    domain::sample_people,
    io::OutputDestination,
    list::person_columns,
    nav::{RouteTemplate, SessionHistory},
    notify::Severity,
};

mod logging;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ValidationArg {
    Eager,
    OnSubmit,
}

impl From<ValidationArg> for ValidationMode {
    fn from(arg: ValidationArg) -> Self {
        match arg {
            ValidationArg::Eager => ValidationMode::Eager,
            ValidationArg::OnSubmit => ValidationMode::OnSubmit,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "masterdetail",
    version,
    about = "Browse and edit person records in a master-detail terminal view"
)]
struct Cli {
    /// Snapshot file to load and save back on exit (.json, .yaml or .toml)
    #[arg(short = 'd', long = "data", value_name = "PATH")]
    data: Option<PathBuf>,

    /// Sample people generated when no snapshot exists yet
    #[arg(long = "seed", value_name = "COUNT", default_value_t = 100)]
    seed: usize,

    /// Initial location, e.g. /master-detail/42/edit
    #[arg(short = 'u', long = "url", value_name = "URL")]
    url: Option<String>,

    /// View options document (.json, .yaml or .toml)
    #[arg(long = "options", value_name = "PATH")]
    options: Option<PathBuf>,

    #[arg(long = "page-size", value_name = "ROWS")]
    page_size: Option<usize>,

    /// Allow hiding and showing grid columns
    #[arg(long = "column-menu")]
    column_menu: bool,

    /// Keep the record id out of the URL
    #[arg(long = "no-deep-linking")]
    no_deep_linking: bool,

    #[arg(long = "validation", value_enum, value_name = "MODE")]
    validation: Option<ValidationArg>,

    /// Also write the final snapshot here ("-" is stdout); repeatable
    #[arg(short = 'o', long = "export", value_name = "DEST", action = ArgAction::Append)]
    exports: Vec<String>,

    /// Resolve the URL and report, without starting the terminal UI
    #[arg(long = "no-ui")]
    no_ui: bool,

    /// Append logs to this file
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    logging::init(
        logging::level_for(cli.verbose),
        cli.log_file.as_deref(),
        cli.no_ui,
    )
    .wrap_err("failed to open the log file")?;

    let options = view_options(&cli)?;
    let store = open_store(&cli)?;
    let route = RouteTemplate::master_detail()?;
    let url = cli.url.clone().unwrap_or_else(|| route.encode(None));
    let history = SessionHistory::new(url.clone());
    let mut session = MasterDetail::new(store.clone(), person_columns(), route, history, options)
        .map_err(chain)?;
    if let Err(err) = session.enter(&url) {
        warn!(url = %url, error = %err, "deep link could not be resolved; starting on a new record");
    }

    if cli.no_ui {
        for note in session.take_notifications() {
            match note.severity {
                Severity::Info => eprintln!("{}", note.message),
                Severity::Error => eprintln!("error: {}", note.message),
            }
        }
        println!("{}", session.current_url());
    } else {
        let exit = MasterDetailApp::new(session)
            .and_then(MasterDetailApp::run)
            .map_err(chain)?;
        info!(saves = exit.saves, deletes = exit.deletes, url = %exit.url, "session finished");
    }

    if let Some(path) = &cli.data {
        store
            .write_snapshot(OutputDestination::file(path))
            .map_err(|err| eyre!("failed to save {}: {err:#}", path.display()))?;
    }
    for raw in &cli.exports {
        store
            .write_snapshot(OutputDestination::parse(raw))
            .map_err(chain)?;
    }
    Ok(())
}

fn view_options(cli: &Cli) -> Result<ViewOptions> {
    let mut options = match &cli.options {
        Some(path) => ViewOptions::load(path).map_err(chain)?,
        None => ViewOptions::default(),
    };
    if let Some(page_size) = cli.page_size {
        options = options.with_page_size(page_size);
    }
    if cli.column_menu {
        options = options.with_column_menu(true);
    }
    if cli.no_deep_linking {
        options = options.with_deep_linking(false);
    }
    if let Some(mode) = cli.validation {
        options = options.with_validation(mode.into());
    }
    Ok(options)
}

fn open_store(cli: &Cli) -> Result<MemoryStore<SamplePerson>> {
    match &cli.data {
        Some(path) if path.exists() => MemoryStore::load_snapshot(path).map_err(chain),
        _ => {
            info!(rows = cli.seed, "seeding sample people");
            Ok(MemoryStore::seed(sample_people(cli.seed))?)
        }
    }
}

/// Keep the whole context chain of library errors in the report.
fn chain(err: impl Display) -> Report {
    eyre!("{err:#}")
}
