use crossterm::event::KeyEvent;
use ratatui::Frame;

use crate::cli::views::report::ReportScreen;
use crate::cli::views::Navigator;
use crate::error::Result;
use crate::outputs::ReportRequest;
use crate::settings::Settings;
use crate::store::SalesStore;
use crate::tui::{run_app, App, ViewContext};

/// A report screen outside the dashboard. It can still open import, and
/// quits once its last view closes.
struct StandaloneReport {
    nav: Navigator,
    store: SalesStore,
    settings: Settings,
}

impl App for StandaloneReport {
    fn draw(&mut self, frame: &mut Frame) {
        let ctx = ViewContext {
            store: &self.store,
            settings: &self.settings,
        };
        self.nav.draw(frame, &ctx);
    }

    fn on_key(&mut self, key: KeyEvent) -> bool {
        self.nav
            .handle_key(key.code, &mut self.store, &mut self.settings)
            .closed_all
    }
}

pub fn run(request: &ReportRequest, store: SalesStore, settings: Settings) -> Result<()> {
    let mut nav = Navigator::new();
    nav.push(Box::new(ReportScreen::with_request(request, &store)));
    let mut app = StandaloneReport { nav, store, settings };
    run_app(&mut app)
}
