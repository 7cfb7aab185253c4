use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Wrap};

use crate::api::{HttpApi, MarketplaceApi};
use crate::config::StorefrontConfig;
use crate::error::{Error, Result};
use crate::forms::card::{CardForm, CardSection, SubmitResult};
use crate::images::ResourcePath;
use crate::outcome::Route;
use crate::session::Session;
use crate::text_sanitize::sanitize_server_text;
use crate::validation::card;
use crate::views::SaleListingView;

const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Listing,
    Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Creator,
    Section,
    Title,
    Description,
    Keywords,
}

impl Field {
    const ORDER: [Field; 5] = [
        Field::Creator,
        Field::Section,
        Field::Title,
        Field::Description,
        Field::Keywords,
    ];

    fn label(self) -> &'static str {
        match self {
            Field::Creator => "Creator",
            Field::Section => "Section",
            Field::Title => "Title",
            Field::Description => "Description",
            Field::Keywords => "Keywords",
        }
    }

    fn step(self, delta: isize) -> Field {
        let n = Self::ORDER.len() as isize;
        let at = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
        Self::ORDER[(at + delta).rem_euclid(n) as usize]
    }
}

/// Every user action the terminal front end understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    Quit,
    OpenCard,
    CloseCard,
    NextImage,
    PreviousImage,
    SelectImage(usize),
    ToggleBookmark,
    DeleteListing,
    NextField,
    PreviousField,
    Input(char),
    Backspace,
    CursorLeft,
    CursorRight,
    CycleSection(isize),
    AcceptSuggestion(usize),
    Submit,
}

/// Map a key press to a message for the given screen and focused field.
pub fn key_to_msg(screen: Screen, focus: Field, code: KeyCode, mods: KeyModifiers) -> Option<Msg> {
    if mods.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Msg::Quit),
            KeyCode::Char('s') if screen == Screen::Card => Some(Msg::Submit),
            _ => None,
        };
    }
    match screen {
        Screen::Listing => match code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Msg::Quit),
            KeyCode::Right | KeyCode::Char('l') => Some(Msg::NextImage),
            KeyCode::Left | KeyCode::Char('h') => Some(Msg::PreviousImage),
            KeyCode::Char('b') => Some(Msg::ToggleBookmark),
            KeyCode::Char('d') => Some(Msg::DeleteListing),
            KeyCode::Char('c') => Some(Msg::OpenCard),
            KeyCode::Char(c @ '1'..='9') => c
                .to_digit(10)
                .map(|d| Msg::SelectImage(d as usize - 1)),
            _ => None,
        },
        Screen::Card => match code {
            KeyCode::Esc => Some(Msg::CloseCard),
            KeyCode::Tab | KeyCode::Down => Some(Msg::NextField),
            KeyCode::BackTab | KeyCode::Up => Some(Msg::PreviousField),
            KeyCode::Enter if focus == Field::Keywords => Some(Msg::AcceptSuggestion(0)),
            KeyCode::Enter => Some(Msg::NextField),
            KeyCode::Left if focus == Field::Section => Some(Msg::CycleSection(-1)),
            KeyCode::Right if focus == Field::Section => Some(Msg::CycleSection(1)),
            KeyCode::Left => Some(Msg::CursorLeft),
            KeyCode::Right => Some(Msg::CursorRight),
            KeyCode::Backspace => Some(Msg::Backspace),
            KeyCode::Char(c) => Some(Msg::Input(c)),
            _ => None,
        },
    }
}

pub struct App<'a> {
    api: &'a dyn MarketplaceApi,
    session: Session,
    screen: Screen,
    listing: Option<SaleListingView>,
    card: CardForm,
    focus: Field,
    suggestions: Vec<String>,
    status: Option<String>,
    route: Option<Route>,
    quit: bool,
}

impl<'a> App<'a> {
    pub fn new(api: &'a dyn MarketplaceApi, session: Session, card: CardForm) -> Self {
        Self {
            api,
            session,
            screen: Screen::Card,
            listing: None,
            card,
            focus: Field::Title,
            suggestions: Vec::new(),
            status: None,
            route: None,
            quit: false,
        }
    }

    /// Start on the listing screen with an already loaded listing.
    pub fn with_listing(mut self, listing: SaleListingView) -> Self {
        self.listing = Some(listing);
        self.screen = Screen::Listing;
        self
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn listing(&self) -> Option<&SaleListingView> {
        self.listing.as_ref()
    }

    pub fn card(&self) -> &CardForm {
        &self.card
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// The last navigation a handler asked for.
    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Translate and apply a key press. Returns true when the app should exit.
    pub fn handle_key(&mut self, code: KeyCode, mods: KeyModifiers) -> bool {
        if let Some(msg) = key_to_msg(self.screen, self.focus, code, mods) {
            self.dispatch(msg);
        }
        self.quit
    }

    fn navigate(&mut self, route: Route) {
        tracing::debug!(route = %route.path(), "navigate");
        self.status = Some(format!("-> {}", route.path()));
        if route == Route::Back && self.screen == Screen::Listing {
            self.listing = None;
        }
        self.route = Some(route);
    }

    pub fn dispatch(&mut self, msg: Msg) {
        match msg {
            Msg::Quit => self.quit = true,
            Msg::OpenCard => {
                self.screen = Screen::Card;
                self.focus = if self.session.is_admin() {
                    Field::Creator
                } else {
                    Field::Title
                };
            }
            Msg::CloseCard => {
                if self.listing.is_some() {
                    self.screen = Screen::Listing;
                } else {
                    self.quit = true;
                }
            }
            Msg::NextImage => {
                if let Some(view) = self.listing.as_mut() {
                    view.next_image();
                }
            }
            Msg::PreviousImage => {
                if let Some(view) = self.listing.as_mut() {
                    view.previous_image();
                }
            }
            Msg::SelectImage(slot) => {
                if let Some(view) = self.listing.as_mut() {
                    if let Some(index) = view.visible_images().get(slot).copied() {
                        view.set_main_image(index);
                    }
                }
            }
            Msg::ToggleBookmark => self.toggle_bookmark(),
            Msg::DeleteListing => self.delete_listing(),
            Msg::NextField => self.move_focus(1),
            Msg::PreviousField => self.move_focus(-1),
            Msg::Input(c) => self.input(c),
            Msg::Backspace => self.backspace(),
            Msg::CursorLeft => {
                if self.focus == Field::Keywords {
                    self.card.keywords.move_left();
                    self.refresh_suggestions();
                }
            }
            Msg::CursorRight => {
                if self.focus == Field::Keywords {
                    self.card.keywords.move_right();
                    self.refresh_suggestions();
                }
            }
            Msg::CycleSection(delta) => self.cycle_section(delta),
            Msg::AcceptSuggestion(i) => {
                if let Some(word) = self.suggestions.get(i).cloned() {
                    self.card.keywords.update_keyword(&word);
                    self.suggestions.clear();
                }
            }
            Msg::Submit => self.submit_card(),
        }
    }

    /// Only administrators pick a creator; everyone else skips that field.
    fn move_focus(&mut self, delta: isize) {
        self.focus = self.focus.step(delta);
        if self.focus == Field::Creator && !self.session.is_admin() {
            self.focus = self.focus.step(delta);
        }
    }

    fn toggle_bookmark(&mut self) {
        let Some(view) = self.listing.as_mut() else {
            return;
        };
        match view.toggle_bookmark(self.api) {
            Ok(()) => {
                self.status = Some(if view.is_bookmarked {
                    "Bookmarked".into()
                } else {
                    "Bookmark removed".into()
                })
            }
            Err(outcome) => {
                self.status = outcome.message.clone();
                if let Some(route) = outcome.redirect {
                    self.navigate(route);
                }
            }
        }
    }

    fn delete_listing(&mut self) {
        let Some(view) = self.listing.as_ref() else {
            return;
        };
        if !view.can_delete(&self.session) {
            self.status = Some("Only the business acting as owner can delete this listing.".into());
            return;
        }
        match view.delete_listing(self.api, &mut self.session) {
            Ok(route) => self.navigate(route),
            Err(outcome) => {
                self.status = outcome.message.clone();
                if let Some(route) = outcome.redirect {
                    self.navigate(route);
                }
            }
        }
    }

    fn input(&mut self, c: char) {
        match self.focus {
            Field::Creator => {
                let mut value = self.card.creator_id.value.clone();
                value.push(c);
                self.card.set_creator_id(&value);
            }
            Field::Section => {}
            Field::Title => {
                let mut value = self.card.title.value.clone();
                value.push(c);
                self.card.set_title(&value);
            }
            Field::Description => {
                let mut value = self.card.description.value.clone();
                value.push(c);
                self.card.set_description(&value);
            }
            Field::Keywords => {
                self.card.keywords.insert_char(c);
                self.card.keywords.normalize();
                self.refresh_suggestions();
            }
        }
    }

    fn backspace(&mut self) {
        match self.focus {
            Field::Creator => {
                let mut value = self.card.creator_id.value.clone();
                value.pop();
                self.card.set_creator_id(&value);
            }
            Field::Section => {}
            Field::Title => {
                let mut value = self.card.title.value.clone();
                value.pop();
                self.card.set_title(&value);
            }
            Field::Description => {
                let mut value = self.card.description.value.clone();
                value.pop();
                self.card.set_description(&value);
            }
            Field::Keywords => {
                self.card.keywords.backspace();
                self.card.keywords.normalize();
                self.refresh_suggestions();
            }
        }
    }

    fn cycle_section(&mut self, delta: isize) {
        let all = CardSection::ALL;
        let n = all.len() as isize;
        let next = match self.card.section() {
            Some(current) => {
                let at = all.iter().position(|s| *s == current).unwrap_or(0) as isize;
                all[(at + delta).rem_euclid(n) as usize]
            }
            None if delta < 0 => all[all.len() - 1],
            None => all[0],
        };
        self.card.select_section(next);
    }

    /// Look up existing keywords matching the token under the cursor.
    fn refresh_suggestions(&mut self) {
        self.suggestions.clear();
        let query = match self.card.keywords.current_keyword() {
            Some(q) if !q.is_empty() => q.to_string(),
            _ => return,
        };
        match self.api.search_keywords(&query) {
            Ok(reply) => {
                self.suggestions = reply
                    .data
                    .into_iter()
                    .map(|k| k.name)
                    .filter(|name| !name.eq_ignore_ascii_case(&query))
                    .take(MAX_SUGGESTIONS)
                    .collect();
            }
            Err(err) => tracing::warn!(%err, query, "keyword search failed"),
        }
    }

    fn submit_card(&mut self) {
        match self.card.submit(self.api, &self.session) {
            SubmitResult::Blocked => {
                self.status = Some("Please fix the highlighted fields.".into());
            }
            SubmitResult::Redirect(route) => self.navigate(route),
            SubmitResult::Saved { card_id } => {
                self.suggestions.clear();
                self.status = Some(match card_id {
                    Some(id) => format!("Card {id} saved."),
                    None => "Card saved.".into(),
                });
            }
            SubmitResult::Failed(outcome) => {
                self.status = outcome.message.clone();
                if let Some(route) = outcome.redirect {
                    self.navigate(route);
                }
            }
        }
    }

    fn draw(&self, f: &mut ratatui::Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(3),
                Constraint::Length(2),
            ])
            .split(f.area());
        self.draw_header(f, chunks[0]);
        match self.screen {
            Screen::Listing => self.draw_listing(f, chunks[1]),
            Screen::Card => self.draw_card(f, chunks[1]),
        }
        self.draw_footer(f, chunks[2]);
    }

    fn draw_header(&self, f: &mut ratatui::Frame, area: Rect) {
        let title = match self.screen {
            Screen::Listing => "Storefront: Listing",
            Screen::Card => "Storefront: New Card",
        };
        let acting = match (self.session.user_id(), self.session.acting_as()) {
            (None, _) => "not logged in".to_string(),
            (Some(user), None) => format!("user {user}"),
            (Some(user), Some(business)) => format!("user {user} as business {business}"),
        };
        let mut spans = vec![
            Span::styled(title, Style::default().fg(Color::Cyan)),
            Span::raw("  "),
            Span::styled(acting, Style::default().fg(Color::Gray)),
        ];
        if let Some(status) = &self.status {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                sanitize_server_text(status),
                Style::default().fg(Color::Yellow),
            ));
        }
        let p = Paragraph::new(Text::from(Line::from(spans))).block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_type(BorderType::Plain),
        );
        f.render_widget(p, area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame, area: Rect) {
        let hint = match self.screen {
            Screen::Listing => {
                "[h/l] Carousel  [1-9] Show Image  [b] Bookmark  [d] Delete  [c] New Card  [q] Quit"
            }
            Screen::Card => {
                "[Tab/Up/Down] Field  [Left/Right] Section  [Enter] Accept Keyword  [Ctrl+S] Submit  [Esc] Back"
            }
        };
        let p = Paragraph::new(hint)
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::TOP));
        f.render_widget(p, area);
    }

    fn draw_listing(&self, f: &mut ratatui::Frame, area: Rect) {
        let Some(view) = &self.listing else {
            let p = Paragraph::new("No listing loaded.")
                .block(Block::default().borders(Borders::ALL).title("Listing"));
            f.render_widget(p, area);
            return;
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let dim = Style::default().fg(Color::Gray);
        let mut lines = vec![
            Line::from(Span::styled(
                view.product_name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "{}{} {}  x{}",
                view.currency_symbol, view.price, view.currency_code, view.quantity
            )),
        ];
        if let Some(desc) = &view.description {
            lines.push(Line::from(Span::styled(sanitize_server_text(desc), dim)));
        }
        for (label, value) in [
            ("Listed", &view.start_date),
            ("Closes", &view.close_date),
            ("Manufacturer", &view.manufacturer),
            ("Expires", &view.expires),
            ("More info", &view.more_info),
        ] {
            if let Some(value) = value {
                lines.push(Line::from(format!("{label}: {value}")));
            }
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            view.business_name.clone(),
            Style::default().fg(Color::LightBlue),
        )));
        for line in view.address_lines.iter().flatten() {
            lines.push(Line::from(Span::styled(line.clone(), dim)));
        }
        lines.push(Line::from(""));
        let mark = if view.is_bookmarked { "*" } else { " " };
        lines.push(Line::from(format!(
            "[{mark}] {} bookmarks",
            view.total_bookmarks
        )));
        if view.can_buy(&self.session) {
            lines.push(Line::from(Span::styled("Available to buy", Style::default().fg(Color::Green))));
        }
        let p = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Listing"));
        f.render_widget(p, cols[0]);

        let main = view.main_image_index();
        let items: Vec<ListItem> = view
            .visible_images()
            .into_iter()
            .enumerate()
            .map(|(slot, index)| {
                let style = if index as i64 == main {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(Span::styled(
                    format!("{} {}", slot + 1, view.carousel_image(index as i64)),
                    style,
                )))
            })
            .collect();
        let images = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Images: {}", view.main_image())),
        );
        f.render_widget(images, cols[1]);
    }

    fn draw_card(&self, f: &mut ratatui::Frame, area: Rect) {
        let form = &self.card;
        let error_style = Style::default().fg(Color::Red);
        let mut lines = Vec::new();
        for field in Field::ORDER {
            if field == Field::Creator && !self.session.is_admin() {
                continue;
            }
            let (value, error) = match field {
                Field::Creator => (form.creator_id.value.clone(), form.creator_id.error_message()),
                Field::Section => (
                    form.section().map(|s| s.to_string()).unwrap_or_default(),
                    form.section_error.message(),
                ),
                Field::Title => (form.title.value.clone(), form.title.error_message()),
                Field::Description => (
                    form.description.value.clone(),
                    form.description.error_message(),
                ),
                Field::Keywords => (form.keywords.text().to_string(), form.keywords_error.message()),
            };
            let label_style = if field == self.focus {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{:<12}", field.label()), label_style),
                Span::raw(value),
            ]));
            if !error.is_empty() {
                lines.push(Line::from(Span::styled(format!("{:<12}{error}", ""), error_style)));
            }
        }
        if !form.user_full_name().is_empty() {
            lines.push(Line::from(format!(
                "{:<12}{} ({})",
                "Creator",
                form.user_full_name(),
                form.user_location()
            )));
        }
        if let Some(err) = form.modal_error() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(err.to_string(), error_style)));
        }
        if self.focus == Field::Keywords && !self.suggestions.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Suggestions: {}", self.suggestions.join(", ")),
                Style::default().fg(Color::LightBlue),
            )));
        }
        let title = match form.card_id() {
            Some(id) => format!("Edit Card {id}"),
            None => format!("New Card ({} form)", card::FORM),
        };
        let p = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(p, area);
    }
}

/// Run the terminal front end against the configured backend. With a
/// listing it opens on the listing screen, otherwise on the card form.
pub fn run_tui(config: &StorefrontConfig, listing: Option<(u64, u64)>) -> Result<()> {
    let api = HttpApi::from_config(config)?;
    let session = config.session.session();
    let card = CardForm::with_overrides(config.validation_overrides(card::FORM))?;
    let mut app = App::new(&api, session, card);
    if let Some((business_id, listing_id)) = listing {
        let resources = ResourcePath::new(config.api.resolved_resource_base());
        let view = SaleListingView::load(
            &api,
            app.session(),
            business_id,
            listing_id,
            resources,
            config.carousel.num_visible,
        )
        .map_err(|outcome| {
            Error::msg(
                outcome
                    .message
                    .or_else(|| outcome.redirect.map(|r| format!("redirected to {}", r.path())))
                    .unwrap_or_else(|| "failed to load listing".into()),
            )
        })?;
        app = app.with_listing(view);
    }

    let mut stdout = io::stdout();
    enable_raw_mode().map_err(|e| Error::msg(e.to_string()))?;
    execute!(stdout, EnterAlternateScreen, Hide).map_err(|e| Error::msg(e.to_string()))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| Error::msg(e.to_string()))?;
    terminal
        .clear()
        .map_err(|e| Error::msg(format!("tui clear failed: {e}")))?;

    let result = run_loop(&mut terminal, &mut app);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen, Show).ok();
    result
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App<'_>) -> Result<()> {
    let tick = Duration::from_millis(100);
    loop {
        terminal
            .draw(|f| app.draw(f))
            .map_err(|e| Error::msg(format!("tui draw failed: {e}")))?;

        if event::poll(tick).map_err(|e| Error::msg(e.to_string()))? {
            if let Event::Key(k) = event::read().map_err(|e| Error::msg(e.to_string()))? {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(k.code, k.modifiers) {
                    return Ok(());
                }
            }
        }
    }
}
