use std::io;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use roster_terminal::config::AppConfig;
use roster_terminal::paging::{FetchController, PageRequest};
use roster_terminal::persist::StateStore;
use roster_terminal::player_fetch::FetchError;
use roster_terminal::provider;
use roster_terminal::roster::{RosterError, Team};
use roster_terminal::state::{
    AppState, DashboardTab, Delta, Overlay, Player, ProviderCommand, Screen,
    TEAM_FORM_FIELDS, TeamForm, apply_delta,
};

struct App {
    state: AppState,
    store: StateStore,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(
        state: AppState,
        store: StateStore,
        cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    ) -> Self {
        Self {
            state,
            store,
            should_quit: false,
            cmd_tx,
        }
    }

    fn dispatch(&mut self, request: PageRequest) {
        let ticket = request.ticket;
        let cursor = request.cursor.clone().unwrap_or_else(|| "start".to_string());
        let attempt = request.attempt;
        let sent = self
            .cmd_tx
            .as_ref()
            .is_some_and(|tx| tx.send(ProviderCommand::FetchPlayers(request)).is_ok());
        if sent {
            self.state.push_log(format!(
                "[INFO] Players request sent (cursor {cursor}, attempt {attempt})"
            ));
            return;
        }
        apply_delta(
            &mut self.state,
            Delta::PlayersFetched {
                ticket,
                result: Err(FetchError::transient(None, "player provider unavailable")),
            },
            Instant::now(),
        );
    }

    fn dispatch_opt(&mut self, request: Option<PageRequest>) {
        if let Some(request) = request {
            self.dispatch(request);
        }
    }

    fn observe_sentinel(&mut self, size: Rect) {
        if self.state.screen != Screen::Dashboard
            || self.state.tab != DashboardTab::Players
            || self.state.overlay.is_some()
        {
            return;
        }
        let total = self
            .state
            .players
            .as_ref()
            .map_or(0, FetchController::player_count);
        if total == 0 {
            return;
        }
        let rows = players_chunks(dashboard_chunks(size)[1])[1].height as usize;
        let (_, end) = visible_range(self.state.players_selected, total, rows);
        let request = self.state.observe_sentinel(total as u32, end as u32);
        self.dispatch_opt(request);
    }

    fn shutdown(&mut self) {
        self.state.unmount_players(Instant::now());
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(ProviderCommand::Shutdown);
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        match self.state.screen {
            Screen::Login => self.on_login_key(key),
            Screen::Dashboard => self.on_dashboard_key(key),
        }
    }

    fn on_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => {
                self.state.login(&self.store);
            }
            KeyCode::Backspace => {
                self.state.login_input.pop();
                self.state.login_error = None;
            }
            KeyCode::Char(c) => {
                self.state.login_input.push(c);
                self.state.login_error = None;
            }
            _ => {}
        }
    }

    fn on_dashboard_key(&mut self, key: KeyEvent) {
        if self.state.help_overlay {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.state.help_overlay = false;
            }
            return;
        }
        if let Some(overlay) = self.state.overlay.take() {
            self.on_overlay_key(overlay, key);
            return;
        }

        let now = Instant::now();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = true,
            KeyCode::Char('1') => {
                let req = self.state.switch_tab(DashboardTab::Teams, now);
                self.dispatch_opt(req);
            }
            KeyCode::Char('2') => {
                let req = self.state.switch_tab(DashboardTab::Players, now);
                self.dispatch_opt(req);
            }
            KeyCode::Tab => {
                let next = match self.state.tab {
                    DashboardTab::Teams => DashboardTab::Players,
                    DashboardTab::Players => DashboardTab::Teams,
                };
                let req = self.state.switch_tab(next, now);
                self.dispatch_opt(req);
            }
            KeyCode::Char('L') => self.state.logout(&self.store, now),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            _ => match self.state.tab {
                DashboardTab::Teams => self.on_teams_key(key),
                DashboardTab::Players => self.on_players_key(key),
            },
        }
    }

    fn on_teams_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('n') => self.state.overlay = Some(Overlay::TeamForm(TeamForm::create())),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(team) = self.state.selected_team() {
                    self.state.overlay = Some(Overlay::TeamForm(TeamForm::edit(team)));
                }
            }
            KeyCode::Char('d') => {
                if let Some(team) = self.state.selected_team() {
                    self.state.overlay = Some(Overlay::ConfirmDelete {
                        team_id: team.id.clone(),
                    });
                }
            }
            KeyCode::Char('r') => match self.state.selected_team() {
                Some(team) if !team.players.is_empty() => {
                    self.state.overlay = Some(Overlay::RemovePlayer {
                        team_id: team.id.clone(),
                        selected: 0,
                    });
                }
                Some(_) => self.state.push_log("[INFO] Team has no players"),
                None => {}
            },
            _ => {}
        }
    }

    fn on_players_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('m') => {
                let req = self.state.load_more_players();
                self.dispatch_opt(req);
            }
            KeyCode::Char('a') | KeyCode::Enter => {
                let Some(player) = self.state.selected_player().cloned() else {
                    return;
                };
                if let Some(team) = self.state.roster.team_of(player.id) {
                    let msg = format!("[INFO] {} already plays for {}", player.full_name(), team.name);
                    self.state.push_log(msg);
                    return;
                }
                if self.state.roster.teams().is_empty() {
                    self.state.push_log("[INFO] Create a team first");
                    return;
                }
                self.state.overlay = Some(Overlay::PickTeam {
                    player,
                    selected: 0,
                });
            }
            _ => {}
        }
    }

    fn on_overlay_key(&mut self, overlay: Overlay, key: KeyEvent) {
        match overlay {
            Overlay::TeamForm(form) => self.on_form_key(form, key),
            Overlay::ConfirmDelete { team_id } => {
                if matches!(key.code, KeyCode::Char('y') | KeyCode::Enter) {
                    match self
                        .state
                        .update_roster(&self.store, |roster| roster.delete_team(&team_id))
                    {
                        Ok(team) => {
                            self.state.push_log(format!("[INFO] Team deleted: {}", team.name))
                        }
                        Err(err) => self.state.push_log(format!("[WARN] {err}")),
                    }
                }
            }
            Overlay::PickTeam {
                player,
                mut selected,
            } => match key.code {
                KeyCode::Char('j') | KeyCode::Down => {
                    let len = self.state.roster.teams().len();
                    selected = (selected + 1).min(len.saturating_sub(1));
                    self.state.overlay = Some(Overlay::PickTeam { player, selected });
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    selected = selected.saturating_sub(1);
                    self.state.overlay = Some(Overlay::PickTeam { player, selected });
                }
                KeyCode::Enter => {
                    let Some(team) = self.state.roster.teams().get(selected) else {
                        return;
                    };
                    let team_id = team.id.clone();
                    let team_name = team.name.clone();
                    let name = player.full_name();
                    match self.state.update_roster(&self.store, |roster| {
                        roster.add_player_to_team(&team_id, player)
                    }) {
                        Ok(()) => self
                            .state
                            .push_log(format!("[INFO] {name} added to {team_name}")),
                        Err(err) => self.state.push_log(format!("[WARN] {err}")),
                    }
                }
                KeyCode::Esc => {}
                _ => self.state.overlay = Some(Overlay::PickTeam { player, selected }),
            },
            Overlay::RemovePlayer {
                team_id,
                mut selected,
            } => {
                let players: Vec<u64> = self
                    .state
                    .roster
                    .team(&team_id)
                    .map(|t| t.players.iter().map(|p| p.id).collect())
                    .unwrap_or_default();
                match key.code {
                    KeyCode::Char('j') | KeyCode::Down => {
                        selected = (selected + 1).min(players.len().saturating_sub(1));
                        self.state.overlay = Some(Overlay::RemovePlayer { team_id, selected });
                    }
                    KeyCode::Char('k') | KeyCode::Up => {
                        selected = selected.saturating_sub(1);
                        self.state.overlay = Some(Overlay::RemovePlayer { team_id, selected });
                    }
                    KeyCode::Enter => {
                        let Some(player_id) = players.get(selected).copied() else {
                            return;
                        };
                        match self.state.update_roster(&self.store, |roster| {
                            roster.remove_player_from_team(&team_id, player_id)
                        }) {
                            Ok(player) => self.state.push_log(format!(
                                "[INFO] {} removed from team",
                                player.full_name()
                            )),
                            Err(err) => self.state.push_log(format!("[WARN] {err}")),
                        }
                    }
                    KeyCode::Esc => {}
                    _ => self.state.overlay = Some(Overlay::RemovePlayer { team_id, selected }),
                }
            }
        }
    }

    fn on_form_key(&mut self, mut form: TeamForm, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => return,
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
            KeyCode::Backspace => form.pop_char(),
            KeyCode::Char(c) => form.push_char(c),
            KeyCode::Enter => {
                let draft = form.draft.clone();
                let result = match form.editing.clone() {
                    Some(team_id) => self
                        .state
                        .update_roster(&self.store, |roster| roster.update_team(&team_id, draft))
                        .map(|()| self.state.push_log("[INFO] Team updated")),
                    None => self.state.create_team(&self.store, draft).map(|_| ()),
                };
                match result {
                    Ok(()) => return,
                    Err(RosterError::InvalidDraft(errors)) => {
                        form.errors = errors.iter().map(ToString::to_string).collect();
                    }
                    Err(err) => {
                        self.state.push_log(format!("[WARN] {err}"));
                        return;
                    }
                }
            }
            _ => {}
        }
        self.state.overlay = Some(Overlay::TeamForm(form));
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env();
    let store = StateStore::resolve(&config);
    let mut app_state = AppState::new(&config);
    app_state.restore(&store);

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let cmd_tx = match provider::build_source(&config) {
        Ok(source) => {
            provider::spawn_provider(source, tx, cmd_rx);
            Some(cmd_tx)
        }
        Err(err) => {
            app_state.push_log(format!("[WARN] Player source unavailable: {err:#}"));
            None
        }
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(app_state, store, cmd_tx);
    let res = run_app(&mut terminal, &mut app, rx);
    app.shutdown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(100);

    loop {
        let now = Instant::now();
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta, now);
        }

        app.state.advance_clock(now);
        let retry = app.state.poll_players(now);
        app.dispatch_opt(retry);
        let size = terminal.size()?;
        app.observe_sentinel(size);

        terminal.draw(|f| ui(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn dashboard_chunks(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(2),
        ])
        .split(area)
}

fn players_chunks(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area)
}

fn ui(frame: &mut Frame, app: &App) {
    let state = &app.state;
    if state.screen == Screen::Login {
        render_login(frame, frame.size(), state);
        return;
    }

    let chunks = dashboard_chunks(frame.size());

    let header = Paragraph::new(header_text(state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match state.tab {
        DashboardTab::Teams => render_teams(frame, chunks[1], state),
        DashboardTab::Players => render_players(frame, chunks[1], state),
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(state)).block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if let Some(overlay) = &state.overlay {
        render_overlay(frame, frame.size(), state, overlay);
    }
    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn render_login(frame: &mut Frame, area: Rect, state: &AppState) {
    let popup = centered_rect(50, 40, area);
    let mut lines = vec![
        Line::from(Span::styled(
            "Team Manager",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Username:"),
        Line::from(Span::styled(
            format!("> {}_", state.login_input),
            Style::default().fg(Color::Cyan),
        )),
        Line::from(""),
    ];
    if let Some(err) = &state.login_error {
        lines.push(Line::from(Span::styled(
            err.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(Span::styled(
        "Enter sign in | Esc quit",
        Style::default().fg(Color::DarkGray),
    )));
    let login = Paragraph::new(lines)
        .block(Block::default().title("Sign in").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(login, popup);
}

fn header_text(state: &AppState) -> String {
    let tab = match state.tab {
        DashboardTab::Teams => "TEAMS",
        DashboardTab::Players => "PLAYERS",
    };
    let line1 = format!(
        "  TEAM MANAGER | {} | {} | Teams: {} | Players: {}",
        state.auth.display_name(),
        tab,
        state.roster.teams().len(),
        state.roster.total_players()
    );
    format!("{line1}\n  [1] Teams  [2] Players")
}

fn footer_text(state: &AppState) -> String {
    match state.tab {
        DashboardTab::Teams => {
            "Tab/1/2 Switch | j/k Move | n New | e Edit | d Delete | r Remove player | L Logout | ? Help | q Quit".to_string()
        }
        DashboardTab::Players => {
            "Tab/1/2 Switch | j/k Move | a/Enter Add to team | m Load more | L Logout | ? Help | q Quit".to_string()
        }
    }
}

fn render_teams(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let teams = state.roster.teams();
    let list_block = Block::default().title("Teams").borders(Borders::ALL);
    if teams.is_empty() {
        let empty = Paragraph::new("No teams yet. Press n to create one.")
            .style(Style::default().fg(Color::DarkGray))
            .block(list_block);
        frame.render_widget(empty, columns[0]);
    } else {
        let inner_height = columns[0].height.saturating_sub(2) as usize;
        let (start, end) = visible_range(state.teams_selected, teams.len(), inner_height);
        let lines: Vec<Line> = (start..end)
            .map(|idx| {
                let team = &teams[idx];
                let text = format!("{} ({})", team.name, team.player_count);
                if idx == state.teams_selected {
                    Line::from(Span::styled(
                        format!("> {text}"),
                        Style::default().fg(Color::White).bg(Color::DarkGray),
                    ))
                } else {
                    Line::from(format!("  {text}"))
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).block(list_block), columns[0]);
    }

    let detail = Paragraph::new(team_detail_text(state.selected_team()))
        .block(Block::default().title("Team").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(detail, columns[1]);
}

fn team_detail_text(team: Option<&Team>) -> String {
    let Some(team) = team else {
        return "No team selected".to_string();
    };
    let mut lines = vec![
        format!("Name: {}", team.name),
        format!("Region: {}", team.region),
        format!("Country: {}", team.country),
        format!("Players: {}", team.player_count),
        format!("Created: {}", format_created_at(&team.created_at)),
        String::new(),
    ];
    if team.players.is_empty() {
        lines.push("No players yet".to_string());
    }
    for player in &team.players {
        lines.push(format_player_line(player));
    }
    lines.join("\n")
}

fn format_created_at(raw: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn format_player_line(player: &Player) -> String {
    let pos = if player.position.is_empty() {
        "-"
    } else {
        player.position.as_str()
    };
    format!(
        "{:<24} {:<4} {}",
        player.full_name(),
        pos,
        player.team.name
    )
}

fn render_players(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = players_chunks(area);
    let Some(controller) = &state.players else {
        let idle = Paragraph::new("Player list not mounted").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(idle, area);
        return;
    };
    let surface = controller.surface();

    let status = if surface.is_loading_initial {
        Span::styled("Loading players...", Style::default().fg(Color::Yellow))
    } else if surface.cooldown_remaining_seconds > 0 {
        Span::styled(
            format!(
                "API limit reached. Please wait {} seconds.",
                surface.cooldown_remaining_seconds
            ),
            Style::default().fg(Color::Red),
        )
    } else if surface.last_error.is_some() {
        Span::styled(
            "Error loading more players. Try again shortly.",
            Style::default().fg(Color::Red),
        )
    } else {
        Span::raw(format!("{} players loaded", surface.players.len()))
    };
    frame.render_widget(Paragraph::new(Line::from(status)), sections[0]);

    let list_area = sections[1];
    let total = surface.players.len();
    if total > 0 && list_area.height > 0 {
        let (start, end) = visible_range(state.players_selected, total, list_area.height as usize);
        let lines: Vec<Line> = (start..end)
            .map(|idx| player_row(state, surface.players[idx], idx == state.players_selected))
            .collect();
        frame.render_widget(Paragraph::new(lines), list_area);
    }

    let hint = if surface.is_loading_more {
        Span::styled("Loading more...", Style::default().fg(Color::Yellow))
    } else if surface.has_next_page && surface.cooldown_remaining_seconds > 0 {
        Span::styled(
            format!("Retry in {}s", surface.cooldown_remaining_seconds),
            Style::default().fg(Color::DarkGray),
        )
    } else if surface.has_next_page {
        Span::styled("m  Load More Players", Style::default().fg(Color::Cyan))
    } else if total > 0 {
        Span::styled("End of list", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw("")
    };
    frame.render_widget(Paragraph::new(Line::from(hint)), sections[2]);
}

fn player_row<'a>(state: &AppState, player: &Player, selected: bool) -> Line<'a> {
    let mut text = format_player_line(player);
    let assigned = state.roster.is_assigned(player.id);
    if assigned {
        let team = state
            .roster
            .team_of(player.id)
            .map(|t| t.name.as_str())
            .unwrap_or("a team");
        text.push_str(&format!("  [on {team}]"));
    }
    let mut style = if assigned {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    if selected {
        style = style.bg(Color::DarkGray).fg(Color::White);
    }
    let prefix = if selected { "> " } else { "  " };
    Line::from(Span::styled(format!("{prefix}{text}"), style))
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let skip = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_overlay(frame: &mut Frame, area: Rect, state: &AppState, overlay: &Overlay) {
    match overlay {
        Overlay::TeamForm(form) => render_team_form(frame, area, form),
        Overlay::ConfirmDelete { team_id } => {
            let name = state
                .roster
                .team(team_id)
                .map(|t| t.name.as_str())
                .unwrap_or("this team");
            let popup = centered_rect(50, 25, area);
            frame.render_widget(Clear, popup);
            let text = format!(
                "Delete {name}?\nIts players become available again.\n\ny/Enter confirm | any other key cancel"
            );
            let confirm = Paragraph::new(text)
                .block(Block::default().title("Delete team").borders(Borders::ALL))
                .wrap(Wrap { trim: true });
            frame.render_widget(confirm, popup);
        }
        Overlay::PickTeam { player, selected } => {
            let names: Vec<String> = state
                .roster
                .teams()
                .iter()
                .map(|t| format!("{} ({})", t.name, t.player_count))
                .collect();
            let title = format!("Add {} to", player.full_name());
            render_pick_list(frame, area, &title, &names, *selected);
        }
        Overlay::RemovePlayer { team_id, selected } => {
            let names: Vec<String> = state
                .roster
                .team(team_id)
                .map(|t| t.players.iter().map(format_player_line).collect())
                .unwrap_or_default();
            render_pick_list(frame, area, "Remove player", &names, *selected);
        }
    }
}

fn render_pick_list(frame: &mut Frame, area: Rect, title: &str, items: &[String], selected: usize) {
    let popup = centered_rect(60, 50, area);
    frame.render_widget(Clear, popup);
    let mut lines: Vec<Line> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            if idx == selected {
                Line::from(Span::styled(
                    format!("> {item}"),
                    Style::default().fg(Color::White).bg(Color::DarkGray),
                ))
            } else {
                Line::from(format!("  {item}"))
            }
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "j/k Move | Enter confirm | Esc cancel",
        Style::default().fg(Color::DarkGray),
    )));
    let list = Paragraph::new(lines).block(Block::default().title(title.to_string()).borders(Borders::ALL));
    frame.render_widget(list, popup);
}

fn render_team_form(frame: &mut Frame, area: Rect, form: &TeamForm) {
    let popup = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup);

    let title = if form.is_create() {
        "Create team"
    } else {
        "Edit team"
    };
    let mut lines = Vec::new();
    for (idx, label) in TEAM_FORM_FIELDS.iter().enumerate() {
        let focused = idx == form.focus;
        let value = form.field(idx);
        let suffix = if form.is_locked(idx) { " (fixed)" } else { "" };
        let cursor = if focused && !form.is_locked(idx) { "_" } else { "" };
        let style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{label:<13}: {value}{cursor}{suffix}"),
            style,
        )));
    }
    lines.push(Line::from(""));
    for err in &form.errors {
        lines.push(Line::from(Span::styled(
            err.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(Span::styled(
        "Tab/↑/↓ Field | Enter save | Esc cancel",
        Style::default().fg(Color::DarkGray),
    )));

    let widget = Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(widget, popup);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Team Manager - Help",
        "",
        "Global:",
        "  1 / 2 / Tab  Teams / Players",
        "  j/k or ↑/↓   Move",
        "  L            Logout (clears local teams)",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Teams:",
        "  n            New team",
        "  e / Enter    Edit team",
        "  d            Delete team",
        "  r            Remove a player",
        "",
        "Players:",
        "  a / Enter    Add player to a team",
        "  m            Load more players",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
