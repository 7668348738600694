use std::path::PathBuf;

use chrono::Local;

use crate::error::{Result, SalesError};
use crate::exporter::{default_path, export_records, ExportFormat};
use crate::reports::{filter_records, ExportFilter};
use crate::settings::{shellexpand_path, Settings};
use crate::store::SalesStore;

use super::{date_range, default_from};

pub struct ExportArgs {
    pub format: Option<ExportFormat>,
    pub branch: Option<String>,
    pub product: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub output: Option<String>,
}

pub fn run(args: ExportArgs, store: &SalesStore, settings: &Settings) -> Result<()> {
    if store.is_empty() {
        return Err(SalesError::NoData(
            "No data available to export. Please import data first.".to_string(),
        ));
    }
    let range = date_range(args.from_date.as_deref(), args.to_date.as_deref(), default_from())?;
    let filter = ExportFilter {
        branch: args.branch.clone(),
        product: args.product.clone(),
        range: Some(range),
    };
    let records = filter_records(store.records(), &filter);
    if records.is_empty() {
        return Err(SalesError::NoData(
            "No data found for the selected filters to export.".to_string(),
        ));
    }

    let output = args.output.as_deref().map(|o| PathBuf::from(shellexpand_path(o)));
    let format = ExportFormat::resolve(args.format, output.as_deref())?;
    let path = output.unwrap_or_else(|| default_path(store.path(), "sales_export", format));

    let subtitle = format!(
        "{} | {} | {} to {} | generated {}",
        args.branch.as_deref().unwrap_or("All Branches"),
        args.product.as_deref().unwrap_or("All Products"),
        range.start.format("%Y-%m-%d"),
        range.end.format("%Y-%m-%d"),
        Local::now().format("%Y-%m-%d %H:%M"),
    );
    export_records(&records, &subtitle, format, &path, &settings.currency)?;
    println!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}
