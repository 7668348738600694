use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::error::Result;
use crate::importer::{read_batch, Preview};
use crate::models::{AppendOutcome, Batch, REQUIRED_COLUMNS};
use crate::settings::shellexpand_path;
use crate::tui::{
    wrap_text, View, ViewAction, ViewContext, BOLD, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE,
    STATUS_STYLE,
};

/// Pick a file, preview it, then hand the batch to the store owner.
pub struct ImportScreen {
    path: String,
    /// Path and batch of the last successful preview.
    loaded: Option<(String, Batch)>,
    preview: Option<Preview>,
    status: Option<(String, bool)>,
}

impl ImportScreen {
    pub fn new() -> Self {
        Self {
            path: String::new(),
            loaded: None,
            preview: None,
            status: None,
        }
    }

    fn load_preview(&mut self) {
        let path = shellexpand_path(self.path.trim());
        self.loaded = None;
        self.preview = None;
        match read_batch(std::path::Path::new(&path)) {
            Ok(batch) => {
                let preview = Preview::of(&batch);
                self.status = Some(if preview.is_importable() {
                    ("Press Enter again to import.".to_string(), false)
                } else if !preview.missing.is_empty() {
                    (format!("Missing required columns: {}", preview.missing.join(", ")), true)
                } else {
                    ("The file has no data rows.".to_string(), true)
                });
                self.preview = Some(preview);
                self.loaded = Some((self.path.clone(), batch));
            }
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "import preview failed");
                self.status = Some((format!("Failed to read file: {e}"), true));
            }
        }
    }

    fn ready_to_commit(&self) -> bool {
        matches!(&self.loaded, Some((p, _)) if *p == self.path)
            && self.preview.as_ref().is_some_and(Preview::is_importable)
    }
}

impl Default for ImportScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl View for ImportScreen {
    fn draw(&mut self, frame: &mut Frame, _ctx: &ViewContext) {
        let area = frame.area();
        let [header_area, sep_area, path_area, info_area, table_area, status_area, footer_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Fill(1),
                Constraint::Length(2),
                Constraint::Length(1),
            ])
            .areas(area);

        frame.render_widget(Paragraph::new(" Import Data").style(HEADER_STYLE), header_area);
        frame.render_widget(
            Paragraph::new("━".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(" File: ", BOLD),
                Span::raw(format!("{}_", self.path)),
            ])),
            path_area,
        );

        let info = match &self.preview {
            Some(p) => format!(
                " {} rows, columns: {}",
                p.total_rows,
                p.columns.join(", ")
            ),
            None => format!(" CSV or Excel file with columns: {}", REQUIRED_COLUMNS.join(", ")),
        };
        let (wrapped, _) = wrap_text(&info, area.width.saturating_sub(1) as usize);
        frame.render_widget(Paragraph::new(wrapped).style(FOOTER_STYLE), info_area);

        if let Some(p) = &self.preview {
            let header = Row::new(
                p.columns
                    .iter()
                    .map(|c| {
                        let style = if REQUIRED_COLUMNS.contains(&c.as_str()) { BOLD } else { FOOTER_STYLE };
                        Cell::from(Span::styled(c.clone(), style))
                    })
                    .collect::<Vec<_>>(),
            )
            .bottom_margin(1);
            let rows: Vec<Row> = p
                .head
                .iter()
                .map(|r| Row::new(r.iter().map(|v| Cell::from(v.clone())).collect::<Vec<_>>()))
                .collect();
            let widths = vec![Constraint::Fill(1); p.columns.len().max(1)];
            frame.render_widget(Table::new(rows, widths).header(header).column_spacing(2), table_area);
        }

        if let Some((msg, is_error)) = &self.status {
            let style = if *is_error { ERROR_STYLE } else { STATUS_STYLE };
            let (wrapped, _) = wrap_text(msg, area.width.saturating_sub(2) as usize);
            let lines: Vec<Line> = wrapped
                .lines()
                .map(|l| Line::from(Span::styled(format!(" {l}"), style)))
                .collect();
            frame.render_widget(Paragraph::new(lines), status_area);
        }
        frame.render_widget(
            Paragraph::new(" Type a path  Enter=preview/import  Esc=back")
                .style(FOOTER_STYLE),
            footer_area,
        );
    }

    fn handle_key(&mut self, code: KeyCode, _ctx: &ViewContext) -> ViewAction {
        match code {
            KeyCode::Esc => return ViewAction::Close,
            KeyCode::Char(c) => self.path.push(c),
            KeyCode::Backspace => {
                self.path.pop();
            }
            KeyCode::Enter => {
                if self.path.trim().is_empty() {
                    self.status = Some(("Please choose a file first.".to_string(), true));
                } else if self.ready_to_commit() {
                    if let Some((_, batch)) = self.loaded.take() {
                        return ViewAction::Commit(batch);
                    }
                } else {
                    self.load_preview();
                }
            }
            _ => {}
        }
        ViewAction::Continue
    }

    fn commit_finished(&mut self, result: &Result<AppendOutcome>) {
        self.status = Some(match result {
            Ok(outcome) => {
                self.preview = None;
                match &outcome.persist_error {
                    Some(err) => (format!("{} rows added, but saving failed: {err}", outcome.added), true),
                    None => (
                        format!(
                            "Data imported and saved successfully! ({} added, {} skipped) Esc to go back.",
                            outcome.added, outcome.dropped
                        ),
                        false,
                    ),
                }
            }
            Err(e) => (e.to_string(), true),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::store::SalesStore;

    fn type_path(screen: &mut ImportScreen, ctx: &ViewContext, path: &str) {
        for c in path.chars() {
            screen.handle_key(KeyCode::Char(c), ctx);
        }
    }

    #[test]
    fn test_empty_path_asks_for_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SalesStore::load(&dir.path().join("sales.csv"));
        let settings = Settings::default();
        let ctx = ViewContext { store: &store, settings: &settings };
        let mut screen = ImportScreen::new();
        screen.handle_key(KeyCode::Enter, &ctx);
        assert_eq!(screen.status.clone().unwrap().0, "Please choose a file first.");
    }

    #[test]
    fn test_missing_columns_block_commit() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bad.csv");
        std::fs::write(&file, "Date,Branch,Product\n2024-01-01,A,B\n").unwrap();
        let store = SalesStore::load(&dir.path().join("sales.csv"));
        let settings = Settings::default();
        let ctx = ViewContext { store: &store, settings: &settings };
        let mut screen = ImportScreen::new();
        type_path(&mut screen, &ctx, &file.to_string_lossy());
        screen.handle_key(KeyCode::Enter, &ctx);
        let (msg, is_error) = screen.status.clone().unwrap();
        assert!(is_error);
        assert!(msg.contains("Quantity, UnitPrice, Total"));
        assert!(matches!(screen.handle_key(KeyCode::Enter, &ctx), ViewAction::Continue));
    }

    #[test]
    fn test_editing_path_requires_new_preview() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ok.csv");
        std::fs::write(
            &file,
            "Date,Branch,Product,Quantity,UnitPrice,Total\n2024-01-01,A,B,1,2,2\n",
        )
        .unwrap();
        let store = SalesStore::load(&dir.path().join("sales.csv"));
        let settings = Settings::default();
        let ctx = ViewContext { store: &store, settings: &settings };
        let mut screen = ImportScreen::new();
        type_path(&mut screen, &ctx, &file.to_string_lossy());
        screen.handle_key(KeyCode::Enter, &ctx);
        assert_eq!(screen.preview.as_ref().unwrap().total_rows, 1);

        screen.handle_key(KeyCode::Char(' '), &ctx);
        assert!(!screen.ready_to_commit());
        screen.handle_key(KeyCode::Backspace, &ctx);
        assert!(matches!(screen.handle_key(KeyCode::Enter, &ctx), ViewAction::Commit(_)));
    }

    #[test]
    fn test_commit_result_messages() {
        let mut screen = ImportScreen::new();
        screen.commit_finished(&Ok(AppendOutcome {
            added: 3,
            dropped: 1,
            persist_error: None,
        }));
        let (msg, is_error) = screen.status.clone().unwrap();
        assert!(!is_error);
        assert!(msg.starts_with("Data imported and saved successfully! (3 added, 1 skipped)"));

        screen.commit_finished(&Err(crate::error::SalesError::NoValidRows));
        assert!(screen.status.clone().unwrap().1);
    }
}
