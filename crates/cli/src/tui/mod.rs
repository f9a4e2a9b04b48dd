use std::io::stdout;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use moa_core::{StyleToken, Theme};
use moa_engine::{GroupKind, Key, KeyInput, KeyOutcome, Modifiers, Workspace};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};

use crate::HookLog;

const SIDEBAR_WIDTH: u16 = 26;

struct TuiApp {
    ws: Workspace,
    hooks: HookLog,
    /// One-line feedback from the last executed command or rejected key.
    status: Option<String>,
    should_quit: bool,
    show_help: bool,
}

impl TuiApp {
    fn new(ws: Workspace, hooks: HookLog) -> Self {
        Self {
            ws,
            hooks,
            status: None,
            should_quit: false,
            show_help: false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.show_help {
            self.show_help = false;
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        let Some(input) = to_key_input(&key) else {
            return;
        };

        match self.ws.handle_key(&input) {
            KeyOutcome::Executed(Ok(id)) => {
                let label = self
                    .ws
                    .command(id.as_str())
                    .map(|c| c.label.clone())
                    .unwrap_or_else(|| id.to_string());
                let fired = self.hooks.take();
                self.status = Some(if fired.is_empty() {
                    format!("✓ {label}")
                } else {
                    format!("✓ {label} ({})", fired.join(", "))
                });
            }
            KeyOutcome::Executed(Err(err)) => self.status = Some(format!("✗ {err}")),
            KeyOutcome::Handled => {}
            KeyOutcome::Ignored => {
                if !self.ws.is_palette_open() {
                    self.handle_page_key(&input);
                }
            }
        }
    }

    /// Keys the page handles itself when no shortcut or palette claimed them.
    fn handle_page_key(&mut self, input: &KeyInput) {
        if input.modifiers.has_command() {
            return;
        }
        let result = match input.key {
            Key::Char('q') | Key::Escape => {
                self.should_quit = true;
                return;
            }
            Key::Char('?') => {
                self.show_help = true;
                return;
            }
            Key::Up | Key::Char('k') => self.step_category(-1),
            Key::Down | Key::Char('j') => self.step_category(1),
            Key::Left | Key::Char('h') => self.step_sub_category(-1),
            Key::Right | Key::Char('l') => self.step_sub_category(1),
            Key::Tab => self.cycle_filter(),
            Key::Char('x') => self.ws.on_filter_change(None).map(|_| ()),
            Key::Char('f') => {
                self.ws.toggle_filters_panel();
                Ok(())
            }
            Key::Enter => {
                self.ws.open_detail();
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(err) = result {
            self.status = Some(format!("✗ {err}"));
        }
    }

    fn step_category(&mut self, delta: isize) -> Result<(), moa_engine::NavError> {
        let categories = &self.ws.layout().categories;
        let current = categories
            .iter()
            .position(|c| c.id == self.ws.nav_state().active_category)
            .unwrap_or(0);
        let Some(next) = step(current, delta, categories.len()) else {
            return Ok(());
        };
        let id = categories[next].id.clone();
        self.ws.on_category_change(&id).map(|_| ())
    }

    fn step_sub_category(&mut self, delta: isize) -> Result<(), moa_engine::NavError> {
        let view = self.ws.subnav();
        let current = view.tabs.iter().position(|t| t.active).unwrap_or(0);
        let Some(next) = step(current, delta, view.tabs.len()) else {
            return Ok(());
        };
        self.ws.on_sub_category_change(&view.tabs[next].id).map(|_| ())
    }

    /// None → first chip → ... → last chip → None.
    fn cycle_filter(&mut self) -> Result<(), moa_engine::NavError> {
        let Some(chips) = self.ws.subnav().filters else {
            return Ok(());
        };
        let next = match chips.iter().position(|c| c.active) {
            None => chips.first(),
            Some(i) => chips.get(i + 1),
        };
        let id = next.map(|c| c.id.clone());
        self.ws.on_filter_change(id.as_deref()).map(|_| ())
    }

    // ------------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------------

    fn palette(&self) -> Palette {
        match self.ws.theme() {
            Theme::Light => Palette {
                fg: Color::Black,
                bg: Color::White,
                accent: Color::Blue,
                muted: Color::DarkGray,
            },
            Theme::Dark => Palette {
                fg: Color::White,
                bg: Color::Black,
                accent: Color::Cyan,
                muted: Color::Gray,
            },
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let has_chips = self.ws.subnav().filters.is_some();

        let chunks = Layout::vertical([
            Constraint::Length(1),                      // title + breadcrumb
            Constraint::Length(1),                      // sub-category tabs
            Constraint::Length(u16::from(has_chips)),   // filter chips
            Constraint::Min(3),                         // body
            Constraint::Length(1),                      // status
        ])
        .split(area);

        self.draw_title(frame, chunks[0]);
        self.draw_tab_bar(frame, chunks[1]);
        if has_chips {
            self.draw_chips(frame, chunks[2]);
        }
        self.draw_body(frame, chunks[3]);
        self.draw_status(frame, chunks[4]);

        if self.ws.is_palette_open() {
            self.draw_palette(frame, area);
        }
        if self.show_help {
            self.draw_help(frame, area);
        }
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let p = self.palette();
        let line = Line::from(vec![
            Span::styled(
                format!(" {} ", self.ws.layout().label),
                Style::default().fg(p.bg).bg(p.accent).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(self.ws.breadcrumb().display(), Style::default().fg(p.fg)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let p = self.palette();
        let view = self.ws.subnav();
        let mut spans: Vec<Span> = Vec::new();

        if view.tabs.is_empty() {
            spans.push(Span::styled(" (no sub-categories)", Style::default().fg(p.muted)));
        }
        for tab in &view.tabs {
            let style = if tab.active {
                Style::default().fg(p.bg).bg(p.fg).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(p.fg)
            };
            spans.push(Span::styled(format!(" {} ", tab.label), style));
            if let Some(badge) = &tab.badge {
                spans.push(Span::styled(
                    format!(" {} ", badge.count),
                    Style::default().fg(Color::Black).bg(token_color(badge.token)),
                ));
            }
            spans.push(Span::raw(" "));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_chips(&self, frame: &mut Frame, area: Rect) {
        let p = self.palette();
        let Some(chips) = self.ws.subnav().filters else {
            return;
        };
        let mut spans = vec![Span::styled(" Filtres: ", Style::default().fg(p.muted))];
        for chip in &chips {
            let style = if chip.active {
                Style::default().fg(p.bg).bg(p.accent)
            } else {
                Style::default().fg(p.accent)
            };
            spans.push(Span::styled(format!("[{}]", chip.label), style));
            spans.push(Span::raw(" "));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_body(&self, frame: &mut Frame, area: Rect) {
        let sidebar = if self.ws.ui().sidebar_collapsed { 0 } else { SIDEBAR_WIDTH };
        let filters = if self.ws.ui().filters_panel_open { SIDEBAR_WIDTH } else { 0 };
        let cols = Layout::horizontal([
            Constraint::Length(sidebar),
            Constraint::Min(10),
            Constraint::Length(filters),
        ])
        .split(area);

        if sidebar > 0 {
            self.draw_sidebar(frame, cols[0]);
        }
        self.draw_content(frame, cols[1]);
        if filters > 0 {
            self.draw_filters_panel(frame, cols[2]);
        }
    }

    fn draw_sidebar(&self, frame: &mut Frame, area: Rect) {
        let p = self.palette();
        let active = &self.ws.nav_state().active_category;
        let lines: Vec<Line> = self
            .ws
            .layout()
            .categories
            .iter()
            .map(|cat| {
                if &cat.id == active {
                    Line::from(Span::styled(
                        format!("▸ {}", cat.label),
                        Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(format!("  {}", cat.label), Style::default().fg(p.fg)))
                }
            })
            .collect();
        let block = Block::default()
            .borders(Borders::RIGHT)
            .border_style(Style::default().fg(p.muted));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_content(&self, frame: &mut Frame, area: Rect) {
        let p = self.palette();
        let state = self.ws.nav_state();
        let mut lines = vec![
            Line::from(Span::styled(
                self.ws.breadcrumb().display(),
                Style::default().fg(p.fg).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!("history: {} · recent commands: {}", state.history.len(), self.ws.recency().len()),
                Style::default().fg(p.muted),
            )),
        ];
        for (key, value) in &state.extras {
            lines.push(Line::from(Span::styled(
                format!("{key}: {value}"),
                Style::default().fg(p.muted),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{} to search commands · ? for keys", self.ws.keymap().shortcut_label('k')),
            Style::default().fg(p.muted),
        )));

        frame.render_widget(Paragraph::new(lines), area);

        if self.ws.is_detail_open() {
            self.draw_detail(frame, area);
        }
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect) {
        let p = self.palette();
        let popup = centered(area, 40, 6);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.accent))
            .title(" Détail ")
            .style(Style::default().bg(p.bg));
        let text = vec![
            Line::from(Span::styled(self.ws.breadcrumb().display(), Style::default().fg(p.fg))),
            Line::from(""),
            Line::from(Span::styled("Esc to close", Style::default().fg(p.muted))),
        ];
        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(text).block(block), popup);
    }

    fn draw_filters_panel(&self, frame: &mut Frame, area: Rect) {
        let p = self.palette();
        let mut lines = Vec::new();
        match self.ws.subnav().filters {
            Some(chips) => {
                for chip in chips {
                    let mark = if chip.active { "[x]" } else { "[ ]" };
                    lines.push(Line::from(Span::styled(
                        format!("{mark} {}", chip.label),
                        Style::default().fg(p.fg),
                    )));
                }
            }
            None => lines.push(Line::from(Span::styled(
                "Aucun filtre",
                Style::default().fg(p.muted),
            ))),
        }
        let block = Block::default()
            .borders(Borders::LEFT)
            .border_style(Style::default().fg(p.muted))
            .title(" Filtres ");
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let p = self.palette();
        let left = self
            .status
            .clone()
            .unwrap_or_else(|| format!(" {}", self.ws.module()));
        let right = format!(
            "{} palette  {} back  ? help ",
            self.ws.keymap().shortcut_label('k'),
            self.ws.keymap().back_label()
        );
        let pad = (area.width as usize)
            .saturating_sub(left.chars().count() + right.chars().count());
        let line = Line::from(vec![
            Span::styled(left, Style::default().fg(p.bg).bg(p.fg)),
            Span::styled(" ".repeat(pad), Style::default().bg(p.fg)),
            Span::styled(right, Style::default().fg(p.bg).bg(p.fg)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_palette(&self, frame: &mut Frame, area: Rect) {
        let p = self.palette();
        let width = 64u16.min(area.width.saturating_sub(4));
        let height = 20u16.min(area.height.saturating_sub(2));
        let popup = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + 2.min(area.height.saturating_sub(height)),
            width,
            height,
        );

        let palette = self.ws.palette();
        let mut lines = vec![
            Line::from(vec![
                Span::styled("› ", Style::default().fg(p.accent)),
                Span::styled(palette.query().to_string(), Style::default().fg(p.fg)),
                Span::styled("▏", Style::default().fg(p.accent)),
            ]),
            Line::from(""),
        ];

        let groups = self.ws.palette_groups();
        if groups.is_empty() {
            lines.push(Line::from(Span::styled(
                "Aucune commande",
                Style::default().fg(p.muted),
            )));
        }

        let inner_width = width.saturating_sub(2) as usize;
        let mut flat = 0usize;
        let mut selected_line = 0usize;
        for (group, commands) in &groups {
            let title_style = match group.kind {
                GroupKind::Recent => Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
                GroupKind::Category(_) => Style::default().fg(p.muted).add_modifier(Modifier::BOLD),
            };
            lines.push(Line::from(Span::styled(group.kind.title(), title_style)));

            for cmd in commands {
                let shortcut = cmd.shortcut.clone().unwrap_or_default();
                let label_width = inner_width.saturating_sub(shortcut.chars().count() + 3);
                let label: String = cmd.label.chars().take(label_width).collect();
                let pad = label_width.saturating_sub(label.chars().count());
                let text = format!("  {label}{} {shortcut}", " ".repeat(pad));

                let style = if flat == palette.selected() {
                    selected_line = lines.len();
                    Style::default().fg(p.bg).bg(p.accent)
                } else {
                    Style::default().fg(p.fg)
                };
                lines.push(Line::from(Span::styled(text, style)));
                flat += 1;
            }
        }

        // Keep the selection visible
        let visible = height.saturating_sub(2) as usize;
        let scroll = (selected_line + 1).saturating_sub(visible);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.accent))
            .title(" Commandes ")
            .title_style(Style::default().fg(p.accent).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(p.bg));

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines).block(block).scroll((scroll as u16, 0)),
            popup,
        );
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let primary = self.ws.keymap().shortcut_label('k');
        let sidebar = self.ws.keymap().shortcut_label('b');
        let back = self.ws.keymap().back_label();
        let help_lines = vec![
            String::new(),
            "  Palette".to_string(),
            "  -------".to_string(),
            format!("  {primary:<16}Open command palette"),
            "  type            Filter commands".to_string(),
            "  Up / Down       Move selection".to_string(),
            "  Tab / Shift+Tab Move selection".to_string(),
            "  Enter           Run selected command".to_string(),
            String::new(),
            "  Navigation".to_string(),
            "  ----------".to_string(),
            "  Up / Down  j k  Previous/next category".to_string(),
            "  Left/Right h l  Previous/next tab".to_string(),
            "  Tab             Cycle filter".to_string(),
            "  x               Clear filter".to_string(),
            format!("  {back:<16}Back"),
            String::new(),
            "  General".to_string(),
            "  -------".to_string(),
            format!("  {sidebar:<16}Toggle sidebar"),
            "  f               Toggle filters panel".to_string(),
            "  Enter           Open detail panel".to_string(),
            "  Esc             Close overlay / quit".to_string(),
            "  q               Quit".to_string(),
            "  ?               Toggle this help".to_string(),
            String::new(),
        ];
        let popup = centered(area, 44, help_lines.len() as u16);

        let lines: Vec<Line> = help_lines
            .into_iter()
            .map(|s| Line::from(Span::styled(s, Style::default().fg(Color::White))))
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Keybindings ")
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .style(Style::default().bg(Color::Black));

        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

#[derive(Clone, Copy)]
struct Palette {
    fg: Color,
    bg: Color,
    accent: Color,
    muted: Color,
}

fn token_color(token: StyleToken) -> Color {
    match token {
        StyleToken::BadgeNeutral => Color::Gray,
        StyleToken::BadgeInfo => Color::Cyan,
        StyleToken::BadgeWarning => Color::Yellow,
        StyleToken::BadgeCritical => Color::Red,
        StyleToken::BadgeSuccess => Color::Green,
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Clamped (non-wrapping) step through `len` items.
fn step(current: usize, delta: isize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let next = current.checked_add_signed(delta)?;
    (next < len && next != current).then_some(next)
}

fn to_key_input(event: &KeyEvent) -> Option<KeyInput> {
    if event.kind != KeyEventKind::Press {
        return None;
    }
    let m = event.modifiers;
    let mut modifiers = Modifiers {
        ctrl: m.contains(KeyModifiers::CONTROL),
        alt: m.contains(KeyModifiers::ALT),
        shift: m.contains(KeyModifiers::SHIFT),
        meta: m.contains(KeyModifiers::SUPER) || m.contains(KeyModifiers::META),
    };
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => {
            modifiers.shift = true;
            Key::Tab
        }
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => return None,
    };
    Some(KeyInput::new(key, modifiers))
}

/// Run the interactive workspace until the user quits.
pub fn run(ws: Workspace, hooks: HookLog) -> Result<(), String> {
    let app = TuiApp::new(ws, hooks);
    run_app(app)
}

fn run_app(mut app: TuiApp) -> Result<(), String> {
    terminal::enable_raw_mode()
        .map_err(|e| format!("failed to enable raw mode: {}", e))?;
    stdout()
        .execute(EnterAlternateScreen)
        .map_err(|e| format!("failed to enter alternate screen: {}", e))?;

    struct Cleanup;
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = stdout().execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
    let _cleanup = Cleanup;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| format!("failed to create terminal: {}", e))?;

    loop {
        terminal
            .draw(|frame| app.draw(frame))
            .map_err(|e| format!("draw error: {}", e))?;

        if event::poll(Duration::from_millis(100))
            .map_err(|e| format!("event poll error: {}", e))?
        {
            if let Event::Key(key) =
                event::read().map_err(|e| format!("event read error: {}", e))?
            {
                app.handle_key(key);
            }
        }

        if app.should_quit {
            break;
        }
    }

    app.ws.flush();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn ctrl_k_translates_to_primary_shortcut() {
        let input = to_key_input(&press(KeyCode::Char('k'), KeyModifiers::CONTROL)).unwrap();
        assert_eq!(input, KeyInput::new(Key::Char('k'), Modifiers::ctrl()));
    }

    #[test]
    fn back_tab_is_shift_tab() {
        let input = to_key_input(&press(KeyCode::BackTab, KeyModifiers::SHIFT)).unwrap();
        assert_eq!(input.key, Key::Tab);
        assert!(input.modifiers.shift);
    }

    #[test]
    fn releases_and_unmapped_keys_are_dropped() {
        let mut release = press(KeyCode::Char('a'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert!(to_key_input(&release).is_none());
        assert!(to_key_input(&press(KeyCode::F(5), KeyModifiers::NONE)).is_none());
    }

    #[test]
    fn step_clamps_at_edges() {
        assert_eq!(step(0, -1, 3), None);
        assert_eq!(step(2, 1, 3), None);
        assert_eq!(step(1, 1, 3), Some(2));
        assert_eq!(step(0, 1, 0), None);
    }
}
