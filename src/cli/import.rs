use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::{Result, SalesError};
use crate::importer::{read_batch, Preview};
use crate::settings::shellexpand_path;
use crate::store::SalesStore;

use super::prompt;

pub fn format_preview(preview: &Preview) -> String {
    let mut table = Table::new();
    table.set_header(preview.columns.iter().map(Cell::new));
    for row in &preview.head {
        table.add_row(row.iter().map(Cell::new));
    }
    format!(
        "{}\n{table}\n{} rows in file",
        "Preview".bold(),
        preview.total_rows
    )
}

pub fn run(file: &str, yes: bool, mut store: SalesStore) -> Result<()> {
    let path = PathBuf::from(shellexpand_path(file));
    let batch = read_batch(&path)?;
    let preview = Preview::of(&batch);
    println!("{}", format_preview(&preview));

    if !preview.missing.is_empty() {
        return Err(SalesError::MissingColumns(preview.missing));
    }
    if batch.is_empty() {
        return Err(SalesError::NoValidRows);
    }

    if !yes {
        let answer = prompt(&format!(
            "Import {} rows into {}? [y/N] ",
            preview.total_rows,
            store.path().display()
        ))?;
        if !answer.eq_ignore_ascii_case("y") && !answer.eq_ignore_ascii_case("yes") {
            println!("Import cancelled.");
            return Ok(());
        }
    }

    let outcome = store.append(&batch)?;
    if let Some(err) = outcome.persist_error {
        return Err(SalesError::Other(err));
    }
    println!(
        "Data imported and saved successfully! ({} added, {} skipped)",
        outcome.added, outcome.dropped
    );
    Ok(())
}
