use chrono::{Duration, Local};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::form::{Field, FilterForm, FormKey};
use super::render::{render_chart, render_summary, render_table};
use crate::cli::DEFAULT_FROM;
use crate::error::Result;
use crate::exporter::{default_path, export_report, ExportFormat};
use crate::outputs::{build, ReportKind, ReportOutput, ReportRequest};
use crate::reports::{parse_month, selection, DateRange, ALL_BRANCHES, ALL_MONTHS, ALL_YEARS, MONTH_NAMES};
use crate::store::SalesStore;
use crate::tui::{View, ViewAction, ViewContext, ViewKind, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE, STATUS_STYLE};

pub fn branch_options(store: &SalesStore) -> Vec<String> {
    std::iter::once(ALL_BRANCHES.to_string())
        .chain(store.branches())
        .collect()
}

fn year_options(store: &SalesStore) -> Vec<String> {
    std::iter::once(ALL_YEARS.to_string())
        .chain(store.years().into_iter().map(|y| y.to_string()))
        .collect()
}

fn month_options() -> Vec<String> {
    std::iter::once(ALL_MONTHS)
        .chain(MONTH_NAMES)
        .map(str::to_string)
        .collect()
}

pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Form fields for a report kind, with their opening defaults.
fn fields_for(kind: ReportKind, store: &SalesStore) -> FilterForm {
    match kind {
        ReportKind::Monthly => {
            let mut form = FilterForm::new(vec![
                Field::choice("Branch", branch_options(store)),
                Field::choice("Year", year_options(store)),
                Field::choice("Month", month_options()),
            ]);
            // First actual year rather than the "All Years" entry.
            if let Some(first) = store.years().first() {
                form.select("Year", &first.to_string());
            }
            form
        }
        ReportKind::PriceHistory => FilterForm::new(vec![Field::choice("Product", store.products())]),
        ReportKind::Weekly => {
            let week_ago = (Local::now() - Duration::days(7)).format("%Y-%m-%d").to_string();
            FilterForm::new(vec![
                Field::text("Start", week_ago),
                Field::text("End", today()),
                Field::choice("Branch", branch_options(store)),
            ])
        }
        ReportKind::Preference | ReportKind::Distribution => FilterForm::new(vec![
            Field::text("Start", DEFAULT_FROM),
            Field::text("End", today()),
            Field::choice("Branch", branch_options(store)),
        ]),
    }
}

fn owned(value: &str) -> Option<String> {
    selection(value).map(str::to_string)
}

/// One of the five report screens: filter form, table, chart and summary.
pub struct ReportScreen {
    kind: ReportKind,
    form: FilterForm,
    output: Option<ReportOutput>,
    offset: usize,
    status: Option<(String, bool)>,
}

impl ReportScreen {
    pub fn new(kind: ReportKind, store: &SalesStore) -> Self {
        Self {
            kind,
            form: fields_for(kind, store),
            output: None,
            offset: 0,
            status: None,
        }
    }

    /// Open with a request already resolved (CLI arguments) and run it.
    pub fn with_request(request: &ReportRequest, store: &SalesStore) -> Self {
        let mut screen = Self::new(request.kind(), store);
        match request {
            ReportRequest::Monthly { branch, year, month } => {
                screen.form.select("Branch", branch.as_deref().unwrap_or(ALL_BRANCHES));
                let year = year.map_or_else(|| ALL_YEARS.to_string(), |y| y.to_string());
                screen.form.select("Year", &year);
                let month = month.map_or(ALL_MONTHS, crate::reports::month_name);
                screen.form.select("Month", month);
            }
            ReportRequest::PriceHistory { product } => screen.form.select("Product", product),
            ReportRequest::Weekly { range, branch }
            | ReportRequest::Preference { range, branch }
            | ReportRequest::Distribution { range, branch } => {
                screen.form.set_text("Start", &range.start.format("%Y-%m-%d").to_string());
                screen.form.set_text("End", &range.end.format("%Y-%m-%d").to_string());
                screen.form.select("Branch", branch.as_deref().unwrap_or(ALL_BRANCHES));
            }
        }
        screen.output = Some(build(request, store.records()));
        screen
    }

    /// Turn the form into a request; bad dates are reported, not queried.
    fn request(&self) -> Result<ReportRequest> {
        let branch = owned(self.form.value("Branch"));
        Ok(match self.kind {
            ReportKind::Monthly => ReportRequest::Monthly {
                branch,
                year: selection(self.form.value("Year")).and_then(|y| y.parse().ok()),
                month: selection(self.form.value("Month")).map(parse_month).transpose()?,
            },
            ReportKind::PriceHistory => {
                let product = self.form.value("Product");
                if product.is_empty() {
                    return Err(crate::error::SalesError::NoData("Please select a product.".to_string()));
                }
                ReportRequest::PriceHistory {
                    product: product.to_string(),
                }
            }
            ReportKind::Weekly | ReportKind::Preference | ReportKind::Distribution => {
                let range = DateRange::parse(self.form.value("Start"), self.form.value("End"))?;
                match self.kind {
                    ReportKind::Weekly => ReportRequest::Weekly { range, branch },
                    ReportKind::Preference => ReportRequest::Preference { range, branch },
                    _ => ReportRequest::Distribution { range, branch },
                }
            }
        })
    }

    fn generate(&mut self, store: &SalesStore) {
        self.offset = 0;
        match self.request() {
            Ok(req) => {
                let out = build(&req, store.records());
                self.status = out.empty_message.clone().map(|m| (m, false));
                self.output = Some(out);
            }
            Err(e) => {
                self.status = Some((e.to_string(), true));
            }
        }
    }

    fn export(&mut self, format: ExportFormat, ctx: &ViewContext) {
        let Some(out) = &self.output else {
            self.status = Some(("Generate a report first before exporting.".to_string(), true));
            return;
        };
        let slug = match self.request() {
            Ok(req) => req.slug(),
            Err(_) => "report",
        };
        let path = default_path(ctx.store.path(), slug, format);
        self.status = Some(match export_report(out, format, &path, ctx.currency()) {
            Ok(()) => (format!("Report saved to {}", path.display()), false),
            Err(e) => (format!("Export failed: {e}"), true),
        });
    }
}

impl View for ReportScreen {
    fn draw(&mut self, frame: &mut Frame, ctx: &ViewContext) {
        let area = frame.area();
        let [header_area, sep_area, form_area, summary_area, body_area, status_area, footer_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(self.form.height() + 1),
                Constraint::Length(2),
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(area);

        let subtitle = self
            .output
            .as_ref()
            .map(|o| format!("  |  {}", o.subtitle))
            .unwrap_or_default();
        frame.render_widget(
            Paragraph::new(format!(" {}{subtitle}", self.kind.title())).style(HEADER_STYLE),
            header_area,
        );
        frame.render_widget(
            Paragraph::new("━".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );
        self.form.render(frame, form_area);

        if let Some(out) = self.output.as_ref().filter(|o| !o.is_empty()) {
            render_summary(frame, summary_area, out, ctx.currency());
            let [table_area, chart_area] =
                Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)])
                    .areas(body_area);
            render_table(frame, table_area, out, ctx.currency(), self.offset);
            if let Some(chart) = &out.chart {
                render_chart(frame, chart_area, chart);
            }
        } else if ctx.store.is_empty() {
            frame.render_widget(
                Paragraph::new(" Please import sales data first to generate reports. (F5 = import)"),
                body_area,
            );
        }

        if let Some((msg, is_error)) = &self.status {
            let style = if *is_error { ERROR_STYLE } else { STATUS_STYLE };
            frame.render_widget(Paragraph::new(Line::from(Span::styled(format!(" {msg}"), style))), status_area);
        }
        frame.render_widget(
            Paragraph::new(" Enter=generate  \u{2191}/\u{2193}=field  \u{2190}/\u{2192}=choose  PgUp/PgDn=scroll  F2=CSV F3=XLSX F4=PDF  F5=import  Esc=back")
                .style(FOOTER_STYLE),
            footer_area,
        );
    }

    fn handle_key(&mut self, code: KeyCode, ctx: &ViewContext) -> ViewAction {
        match code {
            KeyCode::Esc => return ViewAction::Close,
            KeyCode::F(2) => self.export(ExportFormat::Csv, ctx),
            KeyCode::F(3) => self.export(ExportFormat::Xlsx, ctx),
            KeyCode::F(4) => self.export(ExportFormat::Pdf, ctx),
            KeyCode::F(5) => return ViewAction::Open(ViewKind::Import),
            KeyCode::PageDown => {
                let rows = self.output.as_ref().map_or(0, |o| o.rows.len());
                self.offset = (self.offset + 10).min(rows.saturating_sub(1));
            }
            KeyCode::PageUp => self.offset = self.offset.saturating_sub(10),
            _ => match self.form.handle_key(code) {
                FormKey::Submit => self.generate(ctx.store),
                FormKey::Handled => self.status = None,
                FormKey::Unhandled => {}
            },
        }
        ViewAction::Continue
    }

    fn refresh_options(&mut self, ctx: &ViewContext) {
        match self.kind {
            ReportKind::Monthly => {
                self.form.set_options("Branch", branch_options(ctx.store));
                self.form.set_options("Year", year_options(ctx.store));
            }
            ReportKind::PriceHistory => self.form.set_options("Product", ctx.store.products()),
            _ => self.form.set_options("Branch", branch_options(ctx.store)),
        }
    }
}
