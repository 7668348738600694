use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::Frame;

use crate::error::{Result, SalesError};
use crate::models::{AppendOutcome, Batch};
use crate::outputs::ReportKind;
use crate::settings::Settings;
use crate::store::SalesStore;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));

pub const ERROR_STYLE: Style = Style::new().fg(Color::Red);

pub const STATUS_STYLE: Style = Style::new().fg(Color::Yellow);

pub const DISABLED_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const BOLD: Style = Style::new().add_modifier(Modifier::BOLD);

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

/// Centered rect of the given size, clamped to `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [rect] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    rect
}

// ---------------------------------------------------------------------------
// View infrastructure
// ---------------------------------------------------------------------------

/// Screens a view can ask the navigator to open on top of itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Report(ReportKind),
    Import,
    Export,
    Settings,
}

pub enum ViewAction {
    Continue,
    Close,
    Open(ViewKind),
    /// Hand a previewed batch to the store owner for append.
    Commit(Batch),
    SaveSettings(Settings),
}

/// Read-only state every view renders against.
pub struct ViewContext<'a> {
    pub store: &'a SalesStore,
    pub settings: &'a Settings,
}

impl ViewContext<'_> {
    pub fn currency(&self) -> &str {
        &self.settings.currency
    }
}

pub trait View {
    fn draw(&mut self, frame: &mut Frame, ctx: &ViewContext);
    fn handle_key(&mut self, code: KeyCode, ctx: &ViewContext) -> ViewAction;
    /// Re-read branch/product/year choices after the dataset changed.
    fn refresh_options(&mut self, _ctx: &ViewContext) {}
    /// Result of a `Commit` this view asked for.
    fn commit_finished(&mut self, _result: &Result<AppendOutcome>) {}
    /// A failed `SaveSettings`; the view stays open.
    fn save_failed(&mut self, _error: &SalesError) {}
}

/// Something that owns a full-screen event loop.
pub trait App {
    fn draw(&mut self, frame: &mut Frame);
    /// Returns `true` when the app is finished.
    fn on_key(&mut self, key: KeyEvent) -> bool;
}

/// Run an interactive ratatui app. Sets up the terminal, event loop,
/// and panic hook, then restores the terminal on exit.
pub fn run_app(app: &mut dyn App) -> Result<()> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| app.draw(frame)) {
            break Err(e.into());
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    break Ok(());
                }
                if app.on_key(key) {
                    break Ok(());
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}
