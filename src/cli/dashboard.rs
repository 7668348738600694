use crossterm::event::{KeyCode, KeyEvent};
use rand::seq::SliceRandom;
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use zeroize::Zeroizing;

use super::views::{open_view, Navigator};
use crate::error::Result;
use crate::fmt::money;
use crate::login::{authenticate, Session};
use crate::outputs::ReportKind;
use crate::reports::{dashboard_summary, DashboardSummary};
use crate::settings::Settings;
use crate::store::SalesStore;
use crate::tui::{
    centered, run_app, wrap_text, App, ViewContext, ViewKind, AMOUNT_STYLE, BOLD, DISABLED_STYLE,
    ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE, STATUS_STYLE,
};

const GREETINGS: &[&str] = &[
    "Let's see how the tills did.",
    "The branches have been busy.",
    "Fresh numbers, hot off the counter.",
    "Ready when you are.",
    "Shall we see what sold?",
    "Back again? Good.",
    "Another day, another spreadsheet.",
    "Every sale tells a story.",
    "The shelves are stocked. So are the reports.",
    "Pull up a chair.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    Report(ReportKind),
    Import,
    Export,
    Settings,
    Exit,
}

const MENU: [MenuItem; 9] = [
    MenuItem::Report(ReportKind::Monthly),
    MenuItem::Report(ReportKind::PriceHistory),
    MenuItem::Report(ReportKind::Weekly),
    MenuItem::Report(ReportKind::Preference),
    MenuItem::Report(ReportKind::Distribution),
    MenuItem::Import,
    MenuItem::Export,
    MenuItem::Settings,
    MenuItem::Exit,
];

/// Number of menu items in the left column; the rest go on the right.
const MENU_LEFT_COUNT: usize = 5;

impl MenuItem {
    fn label(self) -> &'static str {
        match self {
            MenuItem::Report(kind) => kind.title(),
            MenuItem::Import => "Import Data",
            MenuItem::Export => "Export Data",
            MenuItem::Settings => "Settings",
            MenuItem::Exit => "Exit",
        }
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[derive(Default)]
struct LoginForm {
    username: String,
    password: Zeroizing<String>,
    on_password: bool,
    error: Option<String>,
}

enum LoginKey {
    Continue,
    Success(Session),
    Quit,
}

impl LoginForm {
    fn handle_key(&mut self, code: KeyCode) -> LoginKey {
        match code {
            KeyCode::Esc => return LoginKey::Quit,
            KeyCode::Tab | KeyCode::Down | KeyCode::Up | KeyCode::BackTab => {
                self.on_password = !self.on_password;
            }
            KeyCode::Char(c) => {
                self.field().push(c);
            }
            KeyCode::Backspace => {
                self.field().pop();
            }
            KeyCode::Enter if !self.on_password => self.on_password = true,
            KeyCode::Enter => {
                if let Some(session) = authenticate(&self.username, &self.password) {
                    return LoginKey::Success(session);
                }
                self.error = Some("Invalid username or password".to_string());
                self.password = Zeroizing::new(String::new());
            }
            _ => {}
        }
        LoginKey::Continue
    }

    fn field(&mut self) -> &mut String {
        if self.on_password {
            &mut *self.password
        } else {
            &mut self.username
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let popup = centered(area, 44, 9);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(" Sales Report Login ")
            .title_style(HEADER_STYLE)
            .borders(Borders::ALL)
            .border_style(FOOTER_STYLE);
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let field_style = |active: bool| {
            if active {
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default()
            }
        };
        let cursor = |active: bool| if active { "_" } else { "" };
        let lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled(" Username  ", BOLD),
                Span::styled(
                    format!("{}{}", self.username, cursor(!self.on_password)),
                    field_style(!self.on_password),
                ),
            ]),
            Line::from(vec![
                Span::styled(" Password  ", BOLD),
                Span::styled(
                    format!("{}{}", "*".repeat(self.password.chars().count()), cursor(self.on_password)),
                    field_style(self.on_password),
                ),
            ]),
            Line::from(""),
            match &self.error {
                Some(e) => Line::from(Span::styled(format!(" {e}"), ERROR_STYLE)),
                None => Line::from(""),
            },
            Line::from(Span::styled(" Tab=switch  Enter=login  Esc=quit", FOOTER_STYLE)),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

enum Screen {
    Login(LoginForm),
    Home,
    Views(Navigator),
}

struct Dashboard {
    store: SalesStore,
    settings: Settings,
    session: Option<Session>,
    screen: Screen,
    greeting: String,
    summary: DashboardSummary,
    menu_selection: usize,
    status_message: Option<String>,
    confirm_exit: bool,
}

impl Dashboard {
    fn new(mut store: SalesStore, settings: Settings) -> Self {
        let summary = dashboard_summary(store.records());
        let status_message = store.take_notice();
        Self {
            store,
            settings,
            session: None,
            screen: Screen::Login(LoginForm::default()),
            greeting: String::new(),
            summary,
            menu_selection: 0,
            status_message,
            confirm_exit: false,
        }
    }

    fn greet(&mut self) {
        let mut rng = rand::thread_rng();
        let random_greeting = GREETINGS.choose(&mut rng).unwrap_or(&"Hello.");
        let name = self
            .settings
            .user_name
            .split_whitespace()
            .next()
            .map(str::to_string)
            .or_else(|| self.session.as_ref().map(|s| s.username.clone()))
            .unwrap_or_default();
        self.greeting = if name.is_empty() {
            format!("Sales Report: {random_greeting}")
        } else {
            format!("Hello, {name}. {random_greeting}")
        };
    }

    fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.role.can_edit_settings())
    }

    fn is_enabled(&self, item: MenuItem) -> bool {
        match item {
            MenuItem::Report(_) => !self.store.is_empty(),
            MenuItem::Settings => self.is_admin(),
            MenuItem::Import | MenuItem::Export | MenuItem::Exit => true,
        }
    }

    fn open(&mut self, kind: ViewKind) {
        let ctx = ViewContext {
            store: &self.store,
            settings: &self.settings,
        };
        let mut nav = Navigator::new();
        nav.push(open_view(kind, &ctx));
        self.screen = Screen::Views(nav);
    }

    fn select(&mut self, item: MenuItem) {
        if !self.is_enabled(item) {
            self.status_message = Some(match item {
                MenuItem::Settings => "Settings are available to administrators only.".to_string(),
                _ => "Please import sales data first to generate reports.".to_string(),
            });
            return;
        }
        match item {
            MenuItem::Report(kind) => self.open(ViewKind::Report(kind)),
            MenuItem::Import => self.open(ViewKind::Import),
            MenuItem::Export => self.open(ViewKind::Export),
            MenuItem::Settings => self.open(ViewKind::Settings),
            MenuItem::Exit => self.confirm_exit = true,
        }
    }

    fn handle_home_key(&mut self, code: KeyCode) {
        self.status_message = None;
        match code {
            KeyCode::Up => self.menu_selection = self.menu_selection.saturating_sub(1),
            KeyCode::Down => self.menu_selection = (self.menu_selection + 1).min(MENU.len() - 1),
            KeyCode::Left if self.menu_selection >= MENU_LEFT_COUNT => {
                self.menu_selection -= MENU_LEFT_COUNT;
            }
            KeyCode::Right if self.menu_selection < MENU_LEFT_COUNT => {
                self.menu_selection = (self.menu_selection + MENU_LEFT_COUNT).min(MENU.len() - 1);
            }
            KeyCode::Char('q') | KeyCode::Esc => self.confirm_exit = true,
            KeyCode::Enter => self.select(MENU[self.menu_selection]),
            _ => {}
        }
    }

    fn draw_home(&self, frame: &mut Frame) {
        let area = frame.area();
        let menu_rows = MENU_LEFT_COUNT as u16 + 1;

        let [header_area, sep1, stats_area, sep2, _, sep3, menu_area, hints_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Length(menu_rows),
                Constraint::Length(2),
            ])
            .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" {}", self.greeting)).style(HEADER_STYLE),
            header_area,
        );

        let sep_widget = Paragraph::new("━".repeat(area.width as usize)).style(FOOTER_STYLE);
        frame.render_widget(sep_widget.clone(), sep1);
        frame.render_widget(sep_widget.clone(), sep2);
        frame.render_widget(sep_widget, sep3);

        let currency = self.settings.currency.as_str();
        let top = self.summary.top_product.as_deref().unwrap_or("N/A");
        let role = self
            .session
            .as_ref()
            .map(|s| format!("{} ({:?})", s.username, s.role))
            .unwrap_or_default();
        let stats_lines = vec![
            Line::from(vec![
                Span::raw(" Total Sales (All Time)  "),
                Span::styled(money(self.summary.total_sales, currency), AMOUNT_STYLE),
            ]),
            Line::from(vec![Span::raw(" Top Product             "), Span::styled(top.to_string(), BOLD)]),
            Line::from(format!(" Records                 {}", self.summary.record_count)),
            Line::from(Span::styled(format!(" Signed in as {role}"), FOOTER_STYLE)),
        ];
        frame.render_widget(Paragraph::new(stats_lines), stats_area);

        let [menu_title_area, menu_cols_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(menu_area);
        frame.render_widget(
            Paragraph::new(Span::styled(" What would you like to do?", BOLD)),
            menu_title_area,
        );
        let [menu_left, menu_right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(menu_cols_area);
        let left_lines: Vec<Line> = (0..MENU_LEFT_COUNT).map(|i| self.menu_item_line(i)).collect();
        frame.render_widget(Paragraph::new(left_lines), menu_left);
        let right_lines: Vec<Line> = (MENU_LEFT_COUNT..MENU.len()).map(|i| self.menu_item_line(i)).collect();
        frame.render_widget(Paragraph::new(right_lines), menu_right);

        if let Some(msg) = &self.status_message {
            let (wrapped, _) = wrap_text(msg, area.width.saturating_sub(2) as usize);
            let lines: Vec<Line> = wrapped
                .lines()
                .map(|l| Line::from(Span::styled(format!(" {l}"), STATUS_STYLE)))
                .collect();
            frame.render_widget(Paragraph::new(lines), hints_area);
        } else {
            frame.render_widget(
                Paragraph::new(" Up/Down/Left/Right=navigate  Enter=select  q=quit").style(FOOTER_STYLE),
                hints_area,
            );
        }

        if self.confirm_exit {
            draw_exit_confirm(frame);
        }
    }

    fn menu_item_line(&self, i: usize) -> Line<'static> {
        let item = MENU[i];
        let selected = i == self.menu_selection;
        let marker = if selected { ">" } else { " " };
        let style = if !self.is_enabled(item) {
            DISABLED_STYLE
        } else if selected {
            BOLD
        } else {
            Style::default()
        };
        Line::from(Span::styled(format!(" {marker} {}", item.label()), style))
    }
}

fn draw_exit_confirm(frame: &mut Frame) {
    let popup = centered(frame.area(), 36, 5);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(Span::styled(" Are you sure you want to exit?", BOLD)),
            Line::from(""),
            Line::from(Span::styled(" y=exit  n=stay", FOOTER_STYLE)),
        ]),
        inner,
    );
}

impl App for Dashboard {
    fn draw(&mut self, frame: &mut Frame) {
        match &mut self.screen {
            Screen::Login(form) => form.draw(frame),
            Screen::Home => self.draw_home(frame),
            Screen::Views(nav) => {
                let ctx = ViewContext {
                    store: &self.store,
                    settings: &self.settings,
                };
                nav.draw(frame, &ctx);
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> bool {
        if self.confirm_exit {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    tracing::info!("dashboard closed");
                    return true;
                }
                _ => self.confirm_exit = false,
            }
            return false;
        }

        let mut go_home = false;
        match &mut self.screen {
            Screen::Login(form) => match form.handle_key(key.code) {
                LoginKey::Continue => {}
                LoginKey::Quit => return true,
                LoginKey::Success(session) => {
                    self.session = Some(session);
                    self.greet();
                    self.screen = Screen::Home;
                }
            },
            Screen::Home => self.handle_home_key(key.code),
            Screen::Views(nav) => {
                let outcome = nav.handle_key(key.code, &mut self.store, &mut self.settings);
                if outcome.data_changed {
                    self.summary = dashboard_summary(self.store.records());
                }
                go_home = outcome.closed_all;
            }
        }
        if go_home {
            self.screen = Screen::Home;
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

pub fn run(store: SalesStore, settings: Settings) -> Result<()> {
    tracing::info!(path = %store.path().display(), records = store.len(), "dashboard opened");
    let mut dashboard = Dashboard::new(store, settings);
    run_app(&mut dashboard)
}
