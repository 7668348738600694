use std::path::PathBuf;

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::form::{Field, FilterForm, FormKey};
use super::report::{branch_options, today};
use crate::cli::DEFAULT_FROM;
use crate::error::{Result, SalesError};
use crate::exporter::{default_path, export_records, ExportFormat};
use crate::reports::{filter_records, selection, DateRange, ExportFilter, ALL_PRODUCTS};
use crate::settings::shellexpand_path;
use crate::store::SalesStore;
use crate::tui::{View, ViewAction, ViewContext, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE, STATUS_STYLE};

const FORMATS: [&str; 3] = ["CSV", "XLSX", "PDF"];

fn product_options(store: &SalesStore) -> Vec<String> {
    std::iter::once(ALL_PRODUCTS.to_string())
        .chain(store.products())
        .collect()
}

/// Filtered export of the raw dataset.
pub struct ExportScreen {
    form: FilterForm,
    status: Option<(String, bool)>,
}

impl ExportScreen {
    pub fn new(store: &SalesStore) -> Self {
        Self {
            form: FilterForm::new(vec![
                Field::choice("Branch", branch_options(store)),
                Field::choice("Product", product_options(store)),
                Field::text("Start", DEFAULT_FROM),
                Field::text("End", today()),
                Field::choice("Format", FORMATS.iter().map(|f| f.to_string()).collect()),
                Field::text("Output", ""),
            ]),
            status: None,
        }
    }

    fn format(&self) -> ExportFormat {
        match self.form.value("Format") {
            "XLSX" => ExportFormat::Xlsx,
            "PDF" => ExportFormat::Pdf,
            _ => ExportFormat::Csv,
        }
    }

    fn filter(&self) -> Result<ExportFilter> {
        Ok(ExportFilter {
            branch: selection(self.form.value("Branch")).map(str::to_string),
            product: selection(self.form.value("Product")).map(str::to_string),
            range: Some(DateRange::parse(self.form.value("Start"), self.form.value("End"))?),
        })
    }

    fn run(&self, store: &SalesStore, currency: &str) -> Result<PathBuf> {
        if store.is_empty() {
            return Err(SalesError::NoData(
                "No data available to export. Please import data first.".to_string(),
            ));
        }
        let filter = self.filter()?;
        let records = filter_records(store.records(), &filter);
        if records.is_empty() {
            return Err(SalesError::NoData(
                "No data found for the selected filters to export.".to_string(),
            ));
        }
        let output = self.form.value("Output").trim();
        let path = if output.is_empty() {
            default_path(store.path(), "sales_export", self.format())
        } else {
            PathBuf::from(shellexpand_path(output))
        };
        let subtitle = format!(
            "{} | {} | {} to {}",
            self.form.value("Branch"),
            self.form.value("Product"),
            self.form.value("Start"),
            self.form.value("End")
        );
        export_records(&records, &subtitle, self.format(), &path, currency)?;
        Ok(path)
    }
}

impl View for ExportScreen {
    fn draw(&mut self, frame: &mut Frame, _ctx: &ViewContext) {
        let area = frame.area();
        let [header_area, sep_area, form_area, status_area, _, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(self.form.height() + 1),
            Constraint::Length(2),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(Paragraph::new(" Export Data").style(HEADER_STYLE), header_area);
        frame.render_widget(
            Paragraph::new("━".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );
        self.form.render(frame, form_area);
        if let Some((msg, is_error)) = &self.status {
            let style = if *is_error { ERROR_STYLE } else { STATUS_STYLE };
            frame.render_widget(Paragraph::new(Line::from(Span::styled(format!(" {msg}"), style))), status_area);
        }
        frame.render_widget(
            Paragraph::new(" Enter=export  Up/Down=field  Left/Right=choose  Esc=back  (empty Output = exports folder)")
                .style(FOOTER_STYLE),
            footer_area,
        );
    }

    fn handle_key(&mut self, code: KeyCode, ctx: &ViewContext) -> ViewAction {
        if code == KeyCode::Esc {
            return ViewAction::Close;
        }
        match self.form.handle_key(code) {
            FormKey::Submit => {
                self.status = Some(match self.run(ctx.store, ctx.currency()) {
                    Ok(path) => (format!("Data exported to {}", path.display()), false),
                    Err(e) => (e.to_string(), true),
                });
            }
            FormKey::Handled => self.status = None,
            FormKey::Unhandled => {}
        }
        ViewAction::Continue
    }

    fn refresh_options(&mut self, ctx: &ViewContext) {
        self.form.set_options("Branch", branch_options(ctx.store));
        self.form.set_options("Product", product_options(ctx.store));
    }
}
