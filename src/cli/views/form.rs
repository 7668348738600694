use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::tui::{BOLD, SELECTED_STYLE};

pub enum FieldKind {
    Choice { options: Vec<String>, selected: usize },
    Text { value: String },
}

pub struct Field {
    pub label: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub fn choice(label: &'static str, options: Vec<String>) -> Self {
        Self {
            label,
            kind: FieldKind::Choice { options, selected: 0 },
        }
    }

    pub fn text(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            kind: FieldKind::Text { value: value.into() },
        }
    }

    pub fn value(&self) -> &str {
        match &self.kind {
            FieldKind::Choice { options, selected } => {
                options.get(*selected).map(String::as_str).unwrap_or("")
            }
            FieldKind::Text { value } => value,
        }
    }
}

pub enum FormKey {
    Handled,
    Submit,
    Unhandled,
}

/// A row of labelled inputs. Up/Down/Tab move focus, Left/Right cycle
/// choices, typing edits text fields, Enter submits.
pub struct FilterForm {
    fields: Vec<Field>,
    focus: usize,
}

impl FilterForm {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields, focus: 0 }
    }

    pub fn value(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(Field::value)
            .unwrap_or("")
    }

    pub fn select(&mut self, label: &str, option: &str) {
        if let Some(FieldKind::Choice { options, selected }) = self.kind_mut(label) {
            if let Some(i) = options.iter().position(|o| o == option) {
                *selected = i;
            }
        }
    }

    pub fn set_text(&mut self, label: &str, text: &str) {
        if let Some(FieldKind::Text { value }) = self.kind_mut(label) {
            *value = text.to_string();
        }
    }

    /// Replace a choice list, keeping the current pick when it still exists.
    pub fn set_options(&mut self, label: &str, new_options: Vec<String>) {
        if let Some(FieldKind::Choice { options, selected }) = self.kind_mut(label) {
            let current = options.get(*selected).cloned();
            *selected = current
                .and_then(|c| new_options.iter().position(|o| *o == c))
                .unwrap_or(0);
            *options = new_options;
        }
    }

    fn kind_mut(&mut self, label: &str) -> Option<&mut FieldKind> {
        self.fields
            .iter_mut()
            .find(|f| f.label == label)
            .map(|f| &mut f.kind)
    }

    pub fn handle_key(&mut self, code: KeyCode) -> FormKey {
        if self.fields.is_empty() {
            return FormKey::Unhandled;
        }
        let n = self.fields.len();
        match code {
            KeyCode::Enter => return FormKey::Submit,
            KeyCode::Up | KeyCode::BackTab => self.focus = (self.focus + n - 1) % n,
            KeyCode::Down | KeyCode::Tab => self.focus = (self.focus + 1) % n,
            _ => {
                return match &mut self.fields[self.focus].kind {
                    FieldKind::Choice { options, selected } => match code {
                        KeyCode::Left if !options.is_empty() => {
                            *selected = (*selected + options.len() - 1) % options.len();
                            FormKey::Handled
                        }
                        KeyCode::Right if !options.is_empty() => {
                            *selected = (*selected + 1) % options.len();
                            FormKey::Handled
                        }
                        _ => FormKey::Unhandled,
                    },
                    FieldKind::Text { value } => match code {
                        KeyCode::Char(c) => {
                            value.push(c);
                            FormKey::Handled
                        }
                        KeyCode::Backspace => {
                            value.pop();
                            FormKey::Handled
                        }
                        _ => FormKey::Unhandled,
                    },
                };
            }
        }
        FormKey::Handled
    }

    /// Number of terminal rows `render` needs.
    pub fn height(&self) -> u16 {
        self.fields.len() as u16
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let label_w = self.fields.iter().map(|f| f.label.len()).max().unwrap_or(0);
        let lines: Vec<Line> = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let focused = i == self.focus;
                let marker = if focused { ">" } else { " " };
                let shown = match &f.kind {
                    FieldKind::Choice { options, .. } if options.is_empty() => "(none)".to_string(),
                    FieldKind::Choice { .. } => format!("\u{2039} {} \u{203a}", f.value()),
                    FieldKind::Text { value } if focused => format!("{value}_"),
                    FieldKind::Text { value } => value.clone(),
                };
                Line::from(vec![
                    Span::styled(format!(" {marker} {:<label_w$}  ", f.label), BOLD),
                    Span::styled(shown, if focused { SELECTED_STYLE } else { Style::default() }),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }
}
