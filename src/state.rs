use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::AppConfig;
use crate::paging::{
    FetchController, PLAYERS_QUERY_KEY, PageRequest, QueryCache, ResponseOutcome,
};
use crate::persist::StateStore;
use crate::player_fetch::{FetchError, retry_after_hint};
use crate::roster::{Roster, RosterError, Team, TeamDraft};
use crate::scroll::ScrollTrigger;
use crate::session::AuthRecord;

const MAX_LOGS: usize = 200;
const ONE_SECOND: Duration = Duration::from_secs(1);

/// Team summary as reported by the player API. Unrelated to the local `Team`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTeam {
    #[serde(default)]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub position: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team: PlayerTeam,
}

impl Player {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerPage {
    pub players: Vec<Player>,
    pub next_cursor: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardTab {
    Teams,
    Players,
}

pub const TEAM_FORM_FIELDS: [&str; 4] = ["Name", "Player count", "Region", "Country"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamForm {
    pub editing: Option<String>,
    pub draft: TeamDraft,
    pub focus: usize,
    pub errors: Vec<String>,
}

impl TeamForm {
    pub fn create() -> Self {
        Self {
            editing: None,
            draft: TeamDraft {
                player_count: "0".to_string(),
                ..TeamDraft::default()
            },
            focus: 0,
            errors: Vec::new(),
        }
    }

    pub fn edit(team: &Team) -> Self {
        Self {
            editing: Some(team.id.clone()),
            draft: TeamDraft::from_team(team),
            focus: 0,
            errors: Vec::new(),
        }
    }

    pub fn is_create(&self) -> bool {
        self.editing.is_none()
    }

    pub fn field(&self, idx: usize) -> &str {
        match idx {
            0 => &self.draft.name,
            1 => &self.draft.player_count,
            2 => &self.draft.region,
            _ => &self.draft.country,
        }
    }

    /// The player count is read-only while creating.
    pub fn is_locked(&self, idx: usize) -> bool {
        idx == 1 && self.is_create()
    }

    fn focused_mut(&mut self) -> Option<&mut String> {
        if self.is_locked(self.focus) {
            return None;
        }
        match self.focus {
            0 => Some(&mut self.draft.name),
            1 => Some(&mut self.draft.player_count),
            2 => Some(&mut self.draft.region),
            3 => Some(&mut self.draft.country),
            _ => None,
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.focused_mut() {
            field.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.focused_mut() {
            field.pop();
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % TEAM_FORM_FIELDS.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + TEAM_FORM_FIELDS.len() - 1) % TEAM_FORM_FIELDS.len();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    TeamForm(TeamForm),
    ConfirmDelete { team_id: String },
    PickTeam { player: Player, selected: usize },
    RemovePlayer { team_id: String, selected: usize },
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub tab: DashboardTab,
    pub overlay: Option<Overlay>,
    pub help_overlay: bool,
    pub login_input: String,
    pub login_error: Option<String>,
    pub auth: AuthRecord,
    pub roster: Roster,
    pub teams_selected: usize,
    pub players: Option<FetchController>,
    pub players_selected: usize,
    pub player_cache: QueryCache,
    pub scroll: ScrollTrigger,
    pub page_size: u32,
    pub logs: VecDeque<String>,
    // Start of the current cooldown second; set when a 429 lands.
    cooldown_clock: Option<Instant>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            screen: Screen::Login,
            tab: DashboardTab::Teams,
            overlay: None,
            help_overlay: false,
            login_input: String::new(),
            login_error: None,
            auth: AuthRecord::default(),
            roster: Roster::new(),
            teams_selected: 0,
            players: None,
            players_selected: 0,
            player_cache: QueryCache::new(),
            scroll: ScrollTrigger::new(u32::from(config.scroll_lookahead_rows)),
            page_size: config.page_size,
            logs: VecDeque::with_capacity(MAX_LOGS),
            cooldown_clock: None,
        }
    }

    /// Reads both durable records. Unreadable records fall back to empty state.
    pub fn restore(&mut self, store: &StateStore) {
        match store.load_auth() {
            Ok(auth) => self.auth = auth,
            Err(err) => {
                self.auth = AuthRecord::default();
                self.push_log(format!("[WARN] Error loading auth state: {err:#}"));
            }
        }
        match store.load_teams() {
            Ok(roster) => self.roster = roster,
            Err(err) => {
                self.roster = Roster::new();
                self.push_log(format!("[WARN] Error loading teams state: {err:#}"));
            }
        }
        self.screen = if self.auth.is_authenticated {
            Screen::Dashboard
        } else {
            Screen::Login
        };
        self.clamp_teams_selection();
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn login(&mut self, store: &StateStore) -> bool {
        let input = self.login_input.clone();
        if let Err(err) = self.auth.login(&input) {
            self.login_error = Some(err.to_string());
            return false;
        }
        if let Err(err) = store.save_auth(&self.auth) {
            self.push_log(format!("[WARN] {err:#}"));
        }
        self.login_input.clear();
        self.login_error = None;
        self.screen = Screen::Dashboard;
        self.tab = DashboardTab::Teams;
        self.push_log(format!("[INFO] Signed in as {}", self.auth.display_name()));
        true
    }

    /// Signs out and wipes the local roster along with the auth record.
    pub fn logout(&mut self, store: &StateStore, now: Instant) {
        self.unmount_players(now);
        self.auth.logout();
        self.roster.reset();
        if let Err(err) = store.clear_auth() {
            self.push_log(format!("[WARN] {err:#}"));
        }
        if let Err(err) = store.clear_teams() {
            self.push_log(format!("[WARN] Error clearing teams from storage: {err:#}"));
        }
        self.screen = Screen::Login;
        self.tab = DashboardTab::Teams;
        self.overlay = None;
        self.teams_selected = 0;
        self.push_log("[INFO] Signed out");
    }

    /// Runs one roster mutation and writes the teams record if it succeeded.
    pub fn update_roster<T>(
        &mut self,
        store: &StateStore,
        op: impl FnOnce(&mut Roster) -> Result<T, RosterError>,
    ) -> Result<T, RosterError> {
        let out = op(&mut self.roster)?;
        if let Err(err) = store.save_teams(&self.roster) {
            self.push_log(format!("[WARN] Error saving teams state: {err:#}"));
        }
        self.clamp_teams_selection();
        Ok(out)
    }

    pub fn create_team(
        &mut self,
        store: &StateStore,
        draft: TeamDraft,
    ) -> Result<String, RosterError> {
        let name = draft.name.trim().to_string();
        let id = self.update_roster(store, |roster| roster.create_team(draft, Utc::now()))?;
        self.push_log(format!("[INFO] Team created: {name}"));
        Ok(id)
    }

    pub fn switch_tab(&mut self, tab: DashboardTab, now: Instant) -> Option<PageRequest> {
        if self.tab == tab {
            return None;
        }
        self.tab = tab;
        match tab {
            DashboardTab::Players => self.mount_players(now),
            DashboardTab::Teams => {
                self.unmount_players(now);
                None
            }
        }
    }

    /// Mounts the player list. A fresh cached query is reused; otherwise page 1 is requested.
    pub fn mount_players(&mut self, now: Instant) -> Option<PageRequest> {
        if self.players.is_some() {
            return None;
        }
        let mut controller =
            FetchController::mount(&mut self.player_cache, PLAYERS_QUERY_KEY, self.page_size, now);
        self.scroll.reset();
        self.players_selected = 0;
        let request = if controller.is_empty() {
            controller.load_next()
        } else {
            self.push_log(format!(
                "[INFO] Reusing {} cached players",
                controller.player_count()
            ));
            None
        };
        self.players = Some(controller);
        request
    }

    pub fn unmount_players(&mut self, now: Instant) {
        if let Some(controller) = self.players.take() {
            controller.unmount(&mut self.player_cache, PLAYERS_QUERY_KEY, now);
        }
        self.scroll.reset();
        self.cooldown_clock = None;
    }

    /// Manual "load more". Refused with a hint while cooling down.
    pub fn load_more_players(&mut self) -> Option<PageRequest> {
        let controller = self.players.as_mut()?;
        let remaining = controller.cooldown_remaining_seconds();
        if remaining > 0 {
            self.push_log(format!("[INFO] Retry in {remaining}s"));
            return None;
        }
        controller.load_next()
    }

    pub fn poll_players(&mut self, now: Instant) -> Option<PageRequest> {
        self.players.as_mut()?.poll(now)
    }

    pub fn observe_sentinel(&mut self, sentinel: u32, viewport_end: u32) -> Option<PageRequest> {
        let controller = self.players.as_mut()?;
        let eligible = controller.has_next_page() && controller.can_load_more();
        if !self.scroll.observe(sentinel, viewport_end, eligible) {
            return None;
        }
        controller.load_next()
    }

    /// Feeds the cooldown one tick per whole second elapsed since the 429 arrived.
    pub fn advance_clock(&mut self, now: Instant) {
        while let Some(start) = self.cooldown_clock {
            if now.saturating_duration_since(start) < ONE_SECOND {
                break;
            }
            self.cooldown_clock = Some(start + ONE_SECOND);
            self.tick_second();
            let cooling = self
                .players
                .as_ref()
                .is_some_and(|c| c.cooldown_remaining_seconds() > 0);
            if !cooling {
                self.cooldown_clock = None;
            }
        }
    }

    pub fn tick_second(&mut self) {
        let Some(controller) = self.players.as_mut() else {
            return;
        };
        if controller.tick_second() {
            self.push_log("[INFO] Cooldown over, fetching re-enabled");
        }
    }

    pub fn selected_team(&self) -> Option<&Team> {
        self.roster.teams().get(self.teams_selected)
    }

    pub fn selected_player(&self) -> Option<&Player> {
        self.players
            .as_ref()
            .and_then(|c| c.player_at(self.players_selected))
    }

    pub fn select_next(&mut self) {
        match self.tab {
            DashboardTab::Teams => {
                let len = self.roster.teams().len();
                if len > 0 {
                    self.teams_selected = (self.teams_selected + 1).min(len - 1);
                }
            }
            DashboardTab::Players => {
                let len = self.players.as_ref().map_or(0, |c| c.player_count());
                if len > 0 {
                    self.players_selected = (self.players_selected + 1).min(len - 1);
                }
            }
        }
    }

    pub fn select_prev(&mut self) {
        match self.tab {
            DashboardTab::Teams => self.teams_selected = self.teams_selected.saturating_sub(1),
            DashboardTab::Players => {
                self.players_selected = self.players_selected.saturating_sub(1)
            }
        }
    }

    pub fn clamp_teams_selection(&mut self) {
        let len = self.roster.teams().len();
        if len == 0 {
            self.teams_selected = 0;
        } else if self.teams_selected >= len {
            self.teams_selected = len - 1;
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    PlayersFetched {
        ticket: u64,
        result: Result<PlayerPage, FetchError>,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchPlayers(PageRequest),
    Shutdown,
}

pub fn apply_delta(state: &mut AppState, delta: Delta, now: Instant) {
    match delta {
        Delta::PlayersFetched { ticket, result } => {
            let Some(controller) = state.players.as_mut() else {
                state.push_log("[INFO] Dropped players response for a closed list");
                return;
            };
            match controller.on_response(ticket, result, now) {
                ResponseOutcome::Appended { players, has_next } => {
                    let total = controller.player_count();
                    let tail = if has_next { "" } else { ", end of list" };
                    state.push_log(format!(
                        "[INFO] Loaded {players} players ({total} total{tail})"
                    ));
                }
                ResponseOutcome::Retrying {
                    attempt,
                    max_attempts,
                    delay,
                } => {
                    state.push_log(format!(
                        "[WARN] Players fetch failed, attempt {attempt}/{max_attempts} in {}",
                        retry_after_hint(delay)
                    ));
                }
                ResponseOutcome::RateLimited { cooldown_secs } => {
                    state.cooldown_clock = Some(now);
                    state.push_log(format!(
                        "[WARN] API limit reached. Please wait {cooldown_secs} seconds."
                    ));
                }
                ResponseOutcome::Failed(info) => {
                    state.push_log(format!(
                        "[WARN] Error loading more players: {}",
                        info.message
                    ));
                }
                ResponseOutcome::Discarded => {
                    state.push_log("[INFO] Discarded stale players response");
                }
            }
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
