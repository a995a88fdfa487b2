use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use roster_terminal::paging::PageRequest;
use roster_terminal::persist::StateStore;
use roster_terminal::player_fetch::FetchError;
use roster_terminal::roster::TeamDraft;
use roster_terminal::state::{
    AppState, DashboardTab, Delta, Player, PlayerPage, PlayerTeam, Screen, apply_delta,
};

static COUNTER: AtomicU32 = AtomicU32::new(0);

fn scratch_store() -> StateStore {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir: PathBuf = std::env::temp_dir().join(format!(
        "roster_terminal_state_{}_{}",
        std::process::id(),
        n
    ));
    let _ = fs::remove_dir_all(&dir);
    StateStore::new(dir)
}

fn page(start: u64, len: u64, next: Option<&str>) -> PlayerPage {
    PlayerPage {
        players: (start..start + len)
            .map(|id| Player {
                id,
                first_name: "P".to_string(),
                last_name: id.to_string(),
                position: String::new(),
                team: PlayerTeam::default(),
            })
            .collect(),
        next_cursor: next.map(str::to_string),
    }
}

fn fetched(request: &PageRequest, result: Result<PlayerPage, FetchError>) -> Delta {
    Delta::PlayersFetched {
        ticket: request.ticket,
        result,
    }
}

fn last_log(state: &AppState) -> &str {
    state.logs.back().map(String::as_str).unwrap_or("")
}

fn signed_in(store: &StateStore) -> AppState {
    let mut state = AppState::default();
    state.login_input = "magic".to_string();
    assert!(state.login(store));
    state
}

#[test]
fn login_validates_and_persists() {
    let store = scratch_store();
    let mut state = AppState::default();
    state.login_input = " ab ".to_string();
    assert!(!state.login(&store));
    assert_eq!(state.screen, Screen::Login);
    assert!(state.login_error.is_some());

    state.login_input = "magic".to_string();
    assert!(state.login(&store));
    assert_eq!(state.screen, Screen::Dashboard);
    assert!(state.login_input.is_empty());

    let mut restored = AppState::default();
    restored.restore(&store);
    assert_eq!(restored.screen, Screen::Dashboard);
    assert_eq!(restored.auth.display_name(), "magic");
}

#[test]
fn opening_players_tab_fetches_first_page() {
    let store = scratch_store();
    let now = Instant::now();
    let mut state = signed_in(&store);

    let request = state
        .switch_tab(DashboardTab::Players, now)
        .expect("first page request");
    assert_eq!(request.cursor, None);
    assert_eq!(request.per_page, 10);
    assert!(state.switch_tab(DashboardTab::Players, now).is_none());

    apply_delta(&mut state, fetched(&request, Ok(page(1, 10, Some("c2")))), now);
    assert_eq!(last_log(&state), "[INFO] Loaded 10 players (10 total)");
    assert_eq!(state.selected_player().map(|p| p.id), Some(1));
    state.select_next();
    assert_eq!(state.selected_player().map(|p| p.id), Some(2));
}

#[test]
fn sentinel_fires_once_per_visibility() {
    let store = scratch_store();
    let now = Instant::now();
    let mut state = signed_in(&store);
    let first = state
        .switch_tab(DashboardTab::Players, now)
        .expect("first page");
    apply_delta(&mut state, fetched(&first, Ok(page(1, 10, Some("c2")))), now);

    let second = state
        .observe_sentinel(10, 10)
        .expect("visible sentinel loads more");
    assert_eq!(second.cursor.as_deref(), Some("c2"));
    assert!(state.observe_sentinel(10, 10).is_none());

    apply_delta(&mut state, fetched(&second, Ok(page(11, 10, Some("c3")))), now);

    // Sentinel pushed out of range by the new rows, then scrolled back within the lookahead.
    assert!(state.observe_sentinel(20, 10).is_none());
    assert!(state.observe_sentinel(20, 16).is_none());
    let third = state
        .observe_sentinel(20, 17)
        .expect("fires again after hiding");
    assert_eq!(third.cursor.as_deref(), Some("c3"));
}

#[test]
fn rate_limit_delta_blocks_manual_load() {
    let store = scratch_store();
    let now = Instant::now();
    let mut state = signed_in(&store);
    let first = state
        .switch_tab(DashboardTab::Players, now)
        .expect("first page");
    apply_delta(&mut state, fetched(&first, Ok(page(1, 10, Some("c2")))), now);

    let second = state.load_more_players().expect("load more");
    apply_delta(&mut state, fetched(&second, Err(FetchError::RateLimited)), now);
    assert_eq!(
        last_log(&state),
        "[WARN] API limit reached. Please wait 60 seconds."
    );

    assert!(state.load_more_players().is_none());
    assert_eq!(last_log(&state), "[INFO] Retry in 60s");
    assert!(state.observe_sentinel(10, 10).is_none());

    for _ in 0..60 {
        state.tick_second();
    }
    assert_eq!(last_log(&state), "[INFO] Cooldown over, fetching re-enabled");
    let retry = state.load_more_players().expect("allowed after cooldown");
    assert_eq!(retry.cursor.as_deref(), Some("c2"));
}

#[test]
fn retry_is_logged_and_polled() {
    let store = scratch_store();
    let now = Instant::now();
    let mut state = signed_in(&store);
    let first = state
        .switch_tab(DashboardTab::Players, now)
        .expect("first page");

    apply_delta(
        &mut state,
        fetched(&first, Err(FetchError::from_status(503, ""))),
        now,
    );
    assert_eq!(
        last_log(&state),
        "[WARN] Players fetch failed, attempt 2/3 in 1s"
    );
    assert!(state.poll_players(now).is_none());
    let retry = state
        .poll_players(now + std::time::Duration::from_secs(1))
        .expect("retry due");
    assert_eq!(retry.attempt, 2);
}

#[test]
fn responses_for_a_closed_list_are_dropped() {
    let store = scratch_store();
    let now = Instant::now();
    let mut state = signed_in(&store);
    let request = state
        .switch_tab(DashboardTab::Players, now)
        .expect("first page");
    state.switch_tab(DashboardTab::Teams, now);

    apply_delta(&mut state, fetched(&request, Ok(page(1, 10, None))), now);
    assert_eq!(
        last_log(&state),
        "[INFO] Dropped players response for a closed list"
    );

    let again = state
        .switch_tab(DashboardTab::Players, now)
        .expect("nothing cached, refetch");
    apply_delta(&mut state, fetched(&request, Ok(page(1, 10, None))), now);
    assert_eq!(last_log(&state), "[INFO] Discarded stale players response");
    apply_delta(&mut state, fetched(&again, Ok(page(1, 10, None))), now);
    assert_eq!(last_log(&state), "[INFO] Loaded 10 players (10 total, end of list)");
}

#[test]
fn returning_to_players_reuses_cached_pages() {
    let store = scratch_store();
    let now = Instant::now();
    let mut state = signed_in(&store);
    let request = state
        .switch_tab(DashboardTab::Players, now)
        .expect("first page");
    apply_delta(&mut state, fetched(&request, Ok(page(1, 10, Some("c2")))), now);

    state.switch_tab(DashboardTab::Teams, now);
    assert!(state.switch_tab(DashboardTab::Players, now).is_none());
    assert_eq!(last_log(&state), "[INFO] Reusing 10 cached players");
    assert_eq!(state.players.as_ref().map(|c| c.player_count()), Some(10));
}

#[test]
fn logout_clears_roster_and_records() {
    let store = scratch_store();
    let now = Instant::now();
    let mut state = signed_in(&store);

    state
        .create_team(
            &store,
            TeamDraft {
                name: "Lakers".to_string(),
                player_count: "9".to_string(),
                region: "West".to_string(),
                country: "USA".to_string(),
            },
        )
        .expect("create team");
    assert_eq!(last_log(&state), "[INFO] Team created: Lakers");
    assert_eq!(state.roster.teams()[0].player_count, "0");
    assert_eq!(store.load_teams().expect("teams").teams().len(), 1);

    state.logout(&store, now);
    assert_eq!(state.screen, Screen::Login);
    assert!(state.roster.teams().is_empty());
    assert!(store.load_teams().expect("teams").teams().is_empty());
    assert!(!store.load_auth().expect("auth").is_authenticated);

    let _ = fs::remove_dir_all(store.dir());
}

#[test]
fn provider_logs_are_appended() {
    let mut state = AppState::default();
    apply_delta(&mut state, Delta::Log("[INFO] hello".to_string()), Instant::now());
    assert_eq!(last_log(&state), "[INFO] hello");
}

#[test]
fn cooldown_seconds_count_from_the_rate_limit() {
    let store = scratch_store();
    let start = Instant::now();
    let mut state = signed_in(&store);
    let first = state
        .switch_tab(DashboardTab::Players, start)
        .expect("first page");

    let landed = start + Duration::from_millis(700);
    apply_delta(&mut state, fetched(&first, Err(FetchError::RateLimited)), landed);
    let remaining = |state: &AppState| {
        state
            .players
            .as_ref()
            .map_or(0, |c| c.cooldown_remaining_seconds())
    };

    state.advance_clock(start + Duration::from_secs(1));
    assert_eq!(remaining(&state), 60);
    state.advance_clock(landed + Duration::from_millis(999));
    assert_eq!(remaining(&state), 60);
    state.advance_clock(landed + Duration::from_secs(1));
    assert_eq!(remaining(&state), 59);

    state.advance_clock(landed + Duration::from_secs(59));
    assert_eq!(remaining(&state), 1);
    assert!(state.load_more_players().is_none());

    state.advance_clock(landed + Duration::from_secs(60));
    assert_eq!(remaining(&state), 0);
    assert_eq!(last_log(&state), "[INFO] Cooldown over, fetching re-enabled");
    assert!(state.load_more_players().is_some());
}

#[test]
fn unreadable_teams_record_falls_back_to_empty_roster() {
    let store = scratch_store();
    let mut seeded = signed_in(&store);
    seeded
        .create_team(
            &store,
            TeamDraft {
                name: "Lakers".to_string(),
                player_count: "0".to_string(),
                region: "West".to_string(),
                country: "USA".to_string(),
            },
        )
        .expect("create team");
    fs::write(store.dir().join("teams.json"), "{\"teams\": [").expect("corrupt teams");

    let mut state = AppState::default();
    state.restore(&store);
    assert!(state.roster.teams().is_empty());
    assert!(state.roster.assigned_player_ids().is_empty());
    assert!(state.auth.is_authenticated);
    assert_eq!(state.auth.display_name(), "magic");
    assert_eq!(state.screen, Screen::Dashboard);
    assert!(
        state
            .logs
            .iter()
            .any(|line| line.starts_with("[WARN] Error loading teams state"))
    );

    let _ = fs::remove_dir_all(store.dir());
}
