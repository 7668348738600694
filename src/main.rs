mod cli;
mod error;
mod exporter;
mod fmt;
mod importer;
mod login;
mod models;
mod outputs;
#[cfg(feature = "pdf")]
mod pdf;
mod reports;
mod settings;
mod store;
mod tui;

use clap::{CommandFactory, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};
use store::SalesStore;

/// Log to `~/.config/salesdesk/salesdesk.log`, never to the terminal.
/// Level comes from `SALESDESK_LOG` (default `info`).
fn init_logging() {
    let path = settings::log_path();
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(log_file) = std::fs::OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let level = std::env::var("SALESDESK_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let settings = settings::load_settings();
    let data_file = settings::resolve_data_file(&settings, cli.data_file.as_deref());

    let result = match cli.command {
        None => cli::dashboard::run(SalesStore::load(&data_file), settings),
        Some(Commands::Report { command }) => {
            cli::report::dispatch(command, SalesStore::load(&data_file), settings)
        }
        Some(Commands::Import { file, yes }) => {
            cli::import::run(&file, yes, SalesStore::load(&data_file))
        }
        Some(Commands::Export {
            format,
            branch,
            product,
            from_date,
            to_date,
            output,
        }) => cli::export::run(
            cli::export::ExportArgs {
                format,
                branch,
                product,
                from_date,
                to_date,
                output,
            },
            &SalesStore::load(&data_file),
            &settings,
        ),
        Some(Commands::Status) => cli::status::run(SalesStore::load(&data_file), &settings),
        Some(Commands::Load { path }) => cli::load::run(&path, settings),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "salesdesk", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
