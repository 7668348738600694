pub mod dashboard;
pub mod export;
pub mod import;
pub mod load;
pub mod report;
pub mod status;
pub mod views;

use std::io::Write;

use chrono::{Duration, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};

use crate::error::Result;
use crate::exporter::ExportFormat;
use crate::outputs::ReportRequest;
use crate::reports::{parse_month, parse_ymd, DateRange};

/// Start of the default range for preference, distribution and export.
pub const DEFAULT_FROM: &str = "2020-01-01";

#[derive(Parser)]
#[command(
    name = "salesdesk",
    version,
    about = "Sales reporting for multi-branch retail: import, analyse, export."
)]
pub struct Cli {
    /// Sales data CSV to use for this run (default: the configured data file)
    #[arg(long = "data-file", global = true)]
    pub data_file: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a report.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Import a CSV or Excel file into the sales data.
    Import {
        /// Path to a .csv, .xlsx, .xls, .xlsm or .ods file
        file: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Export sales data, filtered by branch, product and date range.
    Export {
        /// Output format (default: from the output extension, else csv)
        #[arg(long, value_enum)]
        format: Option<ExportFormat>,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        product: Option<String>,
        /// Start date: YYYY-MM-DD (default 2020-01-01)
        #[arg(long = "from")]
        from_date: Option<String>,
        /// End date: YYYY-MM-DD (default today)
        #[arg(long = "to")]
        to_date: Option<String>,
        /// Output file path (default: <data dir>/exports/sales_export-YYYY-MM-DD.<ext>)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show the data file and dataset statistics.
    Status,
    /// Switch to a different sales data CSV.
    Load {
        /// Path to the sales data CSV
        path: String,
    },
    /// Print shell completions.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Clone, Debug, Default)]
pub struct ReportOutputArgs {
    /// Export to a file instead of displaying (.csv, .xlsx or .pdf)
    #[arg(long)]
    pub output: Option<String>,
    /// Print a plain-text table even on a terminal
    #[arg(long)]
    pub text: bool,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Quantity, average unit price and total per product for a month.
    Monthly {
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        /// Month: 1-12 or a name (e.g. June, Jun)
        #[arg(long)]
        month: Option<String>,
        #[command(flatten)]
        out: ReportOutputArgs,
    },
    /// Unit price over time for one product.
    Price {
        #[arg(long)]
        product: String,
        #[command(flatten)]
        out: ReportOutputArgs,
    },
    /// Sales per weekday (default: the last 7 days).
    Weekly {
        #[arg(long = "from")]
        from_date: Option<String>,
        #[arg(long = "to")]
        to_date: Option<String>,
        #[arg(long)]
        branch: Option<String>,
        #[command(flatten)]
        out: ReportOutputArgs,
    },
    /// Units and revenue per product, most sold first.
    Preference {
        #[arg(long = "from")]
        from_date: Option<String>,
        #[arg(long = "to")]
        to_date: Option<String>,
        #[arg(long)]
        branch: Option<String>,
        #[command(flatten)]
        out: ReportOutputArgs,
    },
    /// Histogram and statistics of sale totals.
    Distribution {
        #[arg(long = "from")]
        from_date: Option<String>,
        #[arg(long = "to")]
        to_date: Option<String>,
        #[arg(long)]
        branch: Option<String>,
        #[command(flatten)]
        out: ReportOutputArgs,
    },
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Resolve optional `--from`/`--to` against a default start.
pub(crate) fn date_range(from: Option<&str>, to: Option<&str>, default_from: NaiveDate) -> Result<DateRange> {
    let start = from.map(parse_ymd).transpose()?.unwrap_or(default_from);
    let end = to.map(parse_ymd).transpose()?.unwrap_or_else(today);
    DateRange::new(start, end)
}

pub(crate) fn default_from() -> NaiveDate {
    NaiveDate::parse_from_str(DEFAULT_FROM, "%Y-%m-%d").unwrap_or_else(|_| today())
}

impl ReportCommands {
    pub fn output_args(&self) -> &ReportOutputArgs {
        match self {
            ReportCommands::Monthly { out, .. }
            | ReportCommands::Price { out, .. }
            | ReportCommands::Weekly { out, .. }
            | ReportCommands::Preference { out, .. }
            | ReportCommands::Distribution { out, .. } => out,
        }
    }

    /// Validate the arguments into a report request.
    pub fn request(&self) -> Result<ReportRequest> {
        Ok(match self {
            ReportCommands::Monthly { branch, year, month, .. } => ReportRequest::Monthly {
                branch: branch.clone(),
                year: *year,
                month: month.as_deref().map(parse_month).transpose()?,
            },
            ReportCommands::Price { product, .. } => ReportRequest::PriceHistory {
                product: product.clone(),
            },
            ReportCommands::Weekly { from_date, to_date, branch, .. } => ReportRequest::Weekly {
                range: date_range(
                    from_date.as_deref(),
                    to_date.as_deref(),
                    today() - Duration::days(7),
                )?,
                branch: branch.clone(),
            },
            ReportCommands::Preference { from_date, to_date, branch, .. } => {
                ReportRequest::Preference {
                    range: date_range(from_date.as_deref(), to_date.as_deref(), default_from())?,
                    branch: branch.clone(),
                }
            }
            ReportCommands::Distribution { from_date, to_date, branch, .. } => {
                ReportRequest::Distribution {
                    range: date_range(from_date.as_deref(), to_date.as_deref(), default_from())?,
                    branch: branch.clone(),
                }
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Terminal-mode helpers
// ---------------------------------------------------------------------------

pub(crate) fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
