use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::form::{Field, FilterForm, FormKey};
use crate::error::SalesError;
use crate::settings::Settings;
use crate::store::SalesStore;
use crate::tui::{View, ViewAction, ViewContext, BOLD, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE};

pub struct SettingsScreen {
    form: FilterForm,
    base: Settings,
    records: usize,
    error: Option<String>,
}

impl SettingsScreen {
    pub fn new(store: &SalesStore, settings: &Settings) -> Self {
        Self {
            form: FilterForm::new(vec![
                Field::text("Currency", settings.currency.clone()),
                Field::text("Your name", settings.user_name.clone()),
            ]),
            base: settings.clone(),
            records: store.len(),
            error: None,
        }
    }

    fn updated(&self) -> Settings {
        Settings {
            currency: self.form.value("Currency").trim().to_string(),
            user_name: self.form.value("Your name").trim().to_string(),
            ..self.base.clone()
        }
    }
}

impl View for SettingsScreen {
    fn draw(&mut self, frame: &mut Frame, ctx: &ViewContext) {
        let area = frame.area();
        let [header_area, sep_area, info_area, form_area, status_area, _, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(self.form.height()),
            Constraint::Length(2),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(Paragraph::new(" Settings").style(HEADER_STYLE), header_area);
        frame.render_widget(
            Paragraph::new("━".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(vec![
                    Span::styled("   Data file  ", BOLD),
                    Span::raw(ctx.store.path().display().to_string()),
                ]),
                Line::from(vec![
                    Span::styled("   Records    ", BOLD),
                    Span::raw(self.records.to_string()),
                ]),
            ]),
            info_area,
        );
        self.form.render(frame, form_area);
        if let Some(msg) = &self.error {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(format!(" Settings not saved: {msg}"), ERROR_STYLE))),
                status_area,
            );
        }
        frame.render_widget(
            Paragraph::new(" Enter=save  Up/Down=field  Esc=cancel").style(FOOTER_STYLE),
            footer_area,
        );
    }

    fn handle_key(&mut self, code: KeyCode, _ctx: &ViewContext) -> ViewAction {
        if code == KeyCode::Esc {
            return ViewAction::Close;
        }
        match self.form.handle_key(code) {
            FormKey::Submit => ViewAction::SaveSettings(self.updated()),
            FormKey::Handled => {
                self.error = None;
                ViewAction::Continue
            }
            FormKey::Unhandled => ViewAction::Continue,
        }
    }

    fn save_failed(&mut self, error: &SalesError) {
        self.error = Some(error.to_string());
    }
}
