pub mod text;
pub mod view;

use std::io::IsTerminal;
use std::path::PathBuf;

use crate::error::Result;
use crate::exporter::{export_report, ExportFormat};
use crate::outputs::build;
use crate::settings::{shellexpand_path, Settings};
use crate::store::SalesStore;

use super::ReportCommands;

pub fn dispatch(cmd: ReportCommands, store: SalesStore, settings: Settings) -> Result<()> {
    let request = cmd.request()?;
    let args = cmd.output_args();

    if let Some(output) = &args.output {
        let path = PathBuf::from(shellexpand_path(output));
        let format = ExportFormat::from_path(&path)?;
        let report = build(&request, store.records());
        if let Some(msg) = &report.empty_message {
            return Err(crate::error::SalesError::NoData(msg.clone()));
        }
        export_report(&report, format, &path, &settings.currency)?;
        println!("Report saved to {}", path.display());
        Ok(())
    } else if !args.text && std::io::stdout().is_terminal() {
        view::run(&request, store, settings)
    } else {
        // Non-TTY: plain text to stdout
        let report = build(&request, store.records());
        println!("{}", text::format_report(&report, &settings.currency));
        Ok(())
    }
}
