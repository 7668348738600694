//! Full-screen views shared by the dashboard and the standalone `report`
//! command, plus the stack that routes keys and actions between them.

pub mod export;
pub mod form;
pub mod import;
pub mod render;
pub mod report;
pub mod settings;

use std::path::PathBuf;

use crossterm::event::KeyCode;
use ratatui::Frame;

use crate::settings::{save_settings_to, settings_path, Settings};
use crate::store::SalesStore;
use crate::tui::{View, ViewAction, ViewContext, ViewKind};

pub fn open_view(kind: ViewKind, ctx: &ViewContext) -> Box<dyn View> {
    match kind {
        ViewKind::Report(k) => Box::new(report::ReportScreen::new(k, ctx.store)),
        ViewKind::Import => Box::new(import::ImportScreen::new()),
        ViewKind::Export => Box::new(export::ExportScreen::new(ctx.store)),
        ViewKind::Settings => Box::new(settings::SettingsScreen::new(ctx.store, ctx.settings)),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NavOutcome {
    /// The last view closed; control goes back to the caller.
    pub closed_all: bool,
    pub data_changed: bool,
}

/// Stack of open views. Only the top one is drawn and receives keys.
pub struct Navigator {
    stack: Vec<Box<dyn View>>,
    settings_file: PathBuf,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            settings_file: settings_path(),
        }
    }

    #[cfg(test)]
    pub fn with_settings_file(settings_file: PathBuf) -> Self {
        Self {
            stack: Vec::new(),
            settings_file,
        }
    }

    pub fn push(&mut self, view: Box<dyn View>) {
        self.stack.push(view);
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn draw(&mut self, frame: &mut Frame, ctx: &ViewContext) {
        if let Some(top) = self.stack.last_mut() {
            top.draw(frame, ctx);
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, store: &mut SalesStore, settings: &mut Settings) -> NavOutcome {
        let mut outcome = NavOutcome::default();
        let action = {
            let ctx = ViewContext { store: &*store, settings: &*settings };
            match self.stack.last_mut() {
                Some(top) => top.handle_key(code, &ctx),
                None => return NavOutcome { closed_all: true, ..outcome },
            }
        };
        match action {
            ViewAction::Continue => {}
            ViewAction::Close => {
                self.stack.pop();
                outcome.closed_all = self.stack.is_empty();
            }
            ViewAction::Open(kind) => {
                let ctx = ViewContext { store: &*store, settings: &*settings };
                let view = open_view(kind, &ctx);
                self.stack.push(view);
            }
            ViewAction::Commit(batch) => {
                let result = store.append(&batch);
                outcome.data_changed = result.is_ok();
                if let Some(top) = self.stack.last_mut() {
                    top.commit_finished(&result);
                }
                if outcome.data_changed {
                    let ctx = ViewContext { store: &*store, settings: &*settings };
                    for view in &mut self.stack {
                        view.refresh_options(&ctx);
                    }
                }
            }
            ViewAction::SaveSettings(updated) => match save_settings_to(&self.settings_file, &updated) {
                Ok(()) => {
                    *settings = updated;
                    self.stack.pop();
                    outcome.closed_all = self.stack.is_empty();
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to save settings");
                    if let Some(top) = self.stack.last_mut() {
                        top.save_failed(&e);
                    }
                }
            },
        }
        outcome
    }
}
