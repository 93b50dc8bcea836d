use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing::{error, info};
use tracing_error::{ErrorLayer, SpanTrace};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod inputter;
mod model;
mod ui;

use controller::Controller;
use model::{Model, Status};
use recview::domain::{RVConfig, RVError};
use recview::loader::load_data_file;
use ui::TableUI;

/// Browse record files as a paged table or a status board.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// csv, parquet, arrow or json file to show
    path: String,

    /// Rows per table page
    #[arg(short = 's', long, default_value_t = 20)]
    page_size: usize,

    /// Column preset and export name, e.g. licenseLookup
    #[arg(short = 't', long)]
    search_type: Option<String>,

    /// Field identifying a record
    #[arg(short, long, default_value = "id")]
    key_field: String,

    /// Field the board groups by
    #[arg(long, default_value = "status")]
    status_field: String,

    /// Secondary sort field
    #[arg(long, default_value = "name")]
    tie_break_field: String,

    /// Directory exports are written to
    #[arg(short, long, default_value = ".")]
    export_dir: String,

    /// Statuses the board refuses to move records into
    #[arg(long = "reject", value_name = "STATUS")]
    rejected_statuses: Vec<String>,

    /// Widest a table column gets
    #[arg(long, default_value_t = 30)]
    max_column_width: usize,

    /// Write logs to this file, filtered by RUST_LOG
    #[arg(short, long)]
    log_file: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_tracing(args.log_file.as_deref()) {
        eprintln!("Error: could not open log file: {e}");
        return ExitCode::FAILURE;
    }

    let result = run(args);
    ratatui::restore();
    match result {
        Err(e) => {
            error!("rv failed: {}", e);
            eprintln!("Error: {e}");
            let trace = SpanTrace::capture();
            if trace.status() == tracing_error::SpanTraceStatus::CAPTURED {
                eprintln!("{trace}");
            }
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_tracing(log_file: Option<&str>) -> Result<(), RVError> {
    let writer = match log_file {
        Some(path) => Some(Mutex::new(File::create(expand(path))?)),
        None => None,
    };
    let fmt_layer = writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::full(path).map(|p| p.into_owned()).unwrap_or_else(|_| path.to_string()))
}

fn config_from(args: &Args) -> RVConfig {
    RVConfig::default()
        .page_size(args.page_size)
        .search_type(args.search_type.clone())
        .key_field(args.key_field.clone())
        .status_field(args.status_field.clone())
        .tie_break_field(args.tie_break_field.clone())
        .export_dir(expand(&args.export_dir))
        .rejected_statuses(args.rejected_statuses.clone())
        .max_column_width(args.max_column_width)
}

fn run(args: Args) -> Result<(), RVError> {
    let cfg = config_from(&args);
    info!("Starting rv with {:?}", cfg);

    let data = load_data_file(expand(&args.path))?;
    let mut model = Model::init(&cfg, data)?;
    let mut ui = TableUI::new(&cfg);
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    while model.status != Status::QUITTING {
        terminal.draw(|f| ui.draw(&model, f))?;
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }
    info!("Quitting rv");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arguments_into_a_config() {
        let args = Args::parse_from([
            "rv",
            "stories.json",
            "--page-size",
            "50",
            "--reject",
            "Blocked",
            "--reject",
            "Done",
            "-t",
            "licenseLookup",
        ]);
        let cfg = config_from(&args);
        assert_eq!(cfg.page_size, 50);
        assert_eq!(cfg.rejected_statuses, vec!["Blocked", "Done"]);
        assert_eq!(cfg.search_type.as_deref(), Some("licenseLookup"));
        assert_eq!(cfg.key_field, "id");
    }
}
