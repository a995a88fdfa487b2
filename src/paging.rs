use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::cooldown::CooldownTimer;
use crate::player_fetch::FetchError;
use crate::state::{Player, PlayerPage};

pub const PLAYERS_QUERY_KEY: &str = "players";
pub const RATE_LIMIT_COOLDOWN_SECS: u32 = 60;
pub const STALE_AFTER: Duration = Duration::from_secs(5 * 60);
pub const GC_AFTER: Duration = Duration::from_secs(10 * 60);

// Tickets are process-wide so a response that outlives its controller can never match a
// request of a later mount.
static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

fn next_ticket() -> u64 {
    NEXT_TICKET.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    LoadingMore,
    Error,
    Cooldown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    RateLimited,
    Transient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchErrorInfo {
    pub kind: FetchErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl From<&FetchError> for FetchErrorInfo {
    fn from(err: &FetchError) -> Self {
        let kind = if err.is_rate_limited() {
            FetchErrorKind::RateLimited
        } else {
            FetchErrorKind::Transient
        };
        Self {
            kind,
            status: err.status(),
            message: err.to_string(),
        }
    }
}

/// A page request the caller must hand to a `PlayerSource`, then report back with the same ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub ticket: u64,
    pub cursor: Option<String>,
    pub per_page: u32,
    pub attempt: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub step: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            step: Duration::from_millis(1000),
            cap: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    /// Delay before the `retry`-th retry (1-based): linear, capped.
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        self.step.saturating_mul(retry).min(self.cap)
    }
}

/// What a reported response did to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    Appended { players: usize, has_next: bool },
    Retrying {
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
    },
    RateLimited { cooldown_secs: u32 },
    Failed(FetchErrorInfo),
    Discarded,
}

#[derive(Debug, Clone)]
struct CachedPage {
    cursor: Option<String>,
    page: PlayerPage,
}

#[derive(Debug, Clone)]
struct InFlight {
    ticket: u64,
    cursor: Option<String>,
    attempt: u32,
    // Set while waiting out a backoff; no request is outstanding then.
    retry_at: Option<Instant>,
}

/// Snapshot of what the player list needs to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSurface<'a> {
    pub players: Vec<&'a Player>,
    pub has_next_page: bool,
    pub is_loading_initial: bool,
    pub is_loading_more: bool,
    pub last_error: Option<&'a FetchErrorInfo>,
    pub cooldown_remaining_seconds: u32,
}

/// Cursor-paged fetch state for one mounted player list.
///
/// The controller never performs I/O. `load_next` and `poll` hand out `PageRequest`s; the
/// caller runs them and reports back through `on_response`. Time only enters through the
/// `now` arguments and `tick_second`, so tests drive it without real timers.
#[derive(Debug, Clone)]
pub struct FetchController {
    pages: Vec<CachedPage>,
    cursor: Option<String>,
    exhausted: bool,
    status: FetchStatus,
    last_error: Option<FetchErrorInfo>,
    in_flight: Option<InFlight>,
    cooldown: CooldownTimer,
    completed_at: Option<Instant>,
    per_page: u32,
    policy: RetryPolicy,
}

impl FetchController {
    pub fn new(per_page: u32) -> Self {
        Self::with_policy(per_page, RetryPolicy::default())
    }

    pub fn with_policy(per_page: u32, policy: RetryPolicy) -> Self {
        Self {
            pages: Vec::new(),
            cursor: None,
            exhausted: false,
            status: FetchStatus::Idle,
            last_error: None,
            in_flight: None,
            cooldown: CooldownTimer::new(),
            completed_at: None,
            per_page: per_page.max(1),
            policy,
        }
    }

    /// Mounts a controller for `key`, reusing cached pages when they are still fresh.
    pub fn mount(cache: &mut QueryCache, key: &str, per_page: u32, now: Instant) -> Self {
        cache.prune(now);
        let mut controller = Self::new(per_page);
        if let Some(cached) = cache.take_fresh(key, now) {
            controller.pages = cached.pages;
            controller.cursor = cached.cursor;
            controller.exhausted = cached.exhausted;
            controller.completed_at = Some(cached.completed_at);
        }
        controller
    }

    /// Drops the controller. Completed pages go back into `cache`; the cooldown and any
    /// in-flight request die with it.
    pub fn unmount(self, cache: &mut QueryCache, key: &str, now: Instant) {
        let Some(completed_at) = self.completed_at else {
            return;
        };
        if self.pages.is_empty() {
            return;
        }
        cache.store(
            key,
            CachedQuery {
                pages: self.pages,
                cursor: self.cursor,
                exhausted: self.exhausted,
                completed_at,
                released_at: now,
            },
        );
    }

    pub fn can_load_more(&self) -> bool {
        self.in_flight.is_none()
            && !self.cooldown.is_active()
            && !self.exhausted
            && (self.cursor.is_some() || self.pages.is_empty())
    }

    pub fn load_next(&mut self) -> Option<PageRequest> {
        if !self.can_load_more() {
            return None;
        }
        self.status = if self.pages.is_empty() {
            FetchStatus::Loading
        } else {
            FetchStatus::LoadingMore
        };
        let flight = InFlight {
            ticket: next_ticket(),
            cursor: self.cursor.clone(),
            attempt: 1,
            retry_at: None,
        };
        let request = self.request_for(&flight);
        self.in_flight = Some(flight);
        Some(request)
    }

    /// Issues the pending retry once its backoff has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<PageRequest> {
        let flight = self.in_flight.as_mut()?;
        let due = flight.retry_at?;
        if now < due {
            return None;
        }
        flight.retry_at = None;
        flight.ticket = next_ticket();
        flight.attempt += 1;
        let flight = flight.clone();
        Some(self.request_for(&flight))
    }

    pub fn on_response(
        &mut self,
        ticket: u64,
        result: Result<PlayerPage, FetchError>,
        now: Instant,
    ) -> ResponseOutcome {
        let matches = self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.ticket == ticket && f.retry_at.is_none());
        if !matches {
            return ResponseOutcome::Discarded;
        }
        let Some(mut flight) = self.in_flight.take() else {
            return ResponseOutcome::Discarded;
        };

        match result {
            Ok(page) => {
                self.status = FetchStatus::Idle;
                if self.was_requested(flight.cursor.as_deref()) {
                    self.end_of_data();
                    return ResponseOutcome::Discarded;
                }
                let players = page.players.len();
                // A cursor pointing back at a page already fetched ends the list.
                self.cursor = page.next_cursor.clone().filter(|next| {
                    flight.cursor.as_deref() != Some(next.as_str())
                        && !self.was_requested(Some(next.as_str()))
                });
                self.exhausted = self.cursor.is_none();
                self.pages.push(CachedPage {
                    cursor: flight.cursor,
                    page,
                });
                self.last_error = None;
                self.completed_at = Some(now);
                ResponseOutcome::Appended {
                    players,
                    has_next: !self.exhausted,
                }
            }
            Err(err) if err.is_rate_limited() => {
                self.cooldown.start(RATE_LIMIT_COOLDOWN_SECS);
                self.status = FetchStatus::Cooldown;
                self.last_error = Some(FetchErrorInfo::from(&err));
                ResponseOutcome::RateLimited {
                    cooldown_secs: RATE_LIMIT_COOLDOWN_SECS,
                }
            }
            Err(err) => {
                if flight.attempt < self.policy.max_attempts {
                    let delay = self.policy.delay_before_retry(flight.attempt);
                    flight.retry_at = Some(now + delay);
                    let attempt = flight.attempt + 1;
                    self.in_flight = Some(flight);
                    return ResponseOutcome::Retrying {
                        attempt,
                        max_attempts: self.policy.max_attempts,
                        delay,
                    };
                }
                let info = FetchErrorInfo::from(&err);
                self.status = FetchStatus::Error;
                self.last_error = Some(info.clone());
                ResponseOutcome::Failed(info)
            }
        }
    }

    /// One second of wall time passed. Returns true when this tick ended a cooldown.
    pub fn tick_second(&mut self) -> bool {
        let expired = self.cooldown.tick();
        if expired && self.status == FetchStatus::Cooldown {
            self.status = FetchStatus::Idle;
        }
        expired
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&FetchErrorInfo> {
        self.last_error.as_ref()
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.pages.iter().flat_map(|p| p.page.players.iter())
    }

    pub fn player_count(&self) -> usize {
        self.pages.iter().map(|p| p.page.players.len()).sum()
    }

    pub fn player_at(&self, index: usize) -> Option<&Player> {
        self.players().nth(index)
    }

    pub fn has_next_page(&self) -> bool {
        !self.pages.is_empty() && self.cursor.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_loading_initial(&self) -> bool {
        self.in_flight.is_some() && self.pages.is_empty()
    }

    pub fn is_loading_more(&self) -> bool {
        self.in_flight.is_some() && !self.pages.is_empty()
    }

    pub fn cooldown_remaining_seconds(&self) -> u32 {
        self.cooldown.remaining_seconds()
    }

    pub fn surface(&self) -> ListSurface<'_> {
        ListSurface {
            players: self.players().collect(),
            has_next_page: self.has_next_page(),
            is_loading_initial: self.is_loading_initial(),
            is_loading_more: self.is_loading_more(),
            last_error: self.last_error.as_ref(),
            cooldown_remaining_seconds: self.cooldown.remaining_seconds(),
        }
    }

    fn was_requested(&self, cursor: Option<&str>) -> bool {
        self.pages.iter().any(|p| p.cursor.as_deref() == cursor)
    }

    fn end_of_data(&mut self) {
        self.cursor = None;
        self.exhausted = true;
    }

    fn request_for(&self, flight: &InFlight) -> PageRequest {
        PageRequest {
            ticket: flight.ticket,
            cursor: flight.cursor.clone(),
            per_page: self.per_page,
            attempt: flight.attempt,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedQuery {
    pages: Vec<CachedPage>,
    cursor: Option<String>,
    exhausted: bool,
    completed_at: Instant,
    released_at: Instant,
}

/// In-memory pages of unmounted queries. Entries are reused while fresh and dropped once they
/// have sat unused for the gc window.
#[derive(Debug, Clone)]
pub struct QueryCache {
    entries: HashMap<String, CachedQuery>,
    stale_after: Duration,
    gc_after: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::with_windows(STALE_AFTER, GC_AFTER)
    }

    pub fn with_windows(stale_after: Duration, gc_after: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stale_after,
            gc_after,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn prune(&mut self, now: Instant) {
        let gc_after = self.gc_after;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.released_at) < gc_after);
    }

    fn store(&mut self, key: &str, entry: CachedQuery) {
        self.entries.insert(key.to_string(), entry);
    }

    fn take_fresh(&mut self, key: &str, now: Instant) -> Option<CachedQuery> {
        let entry = self.entries.remove(key)?;
        if now.saturating_duration_since(entry.completed_at) < self.stale_after {
            Some(entry)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_is_linear_and_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before_retry(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_before_retry(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_before_retry(5), Duration::from_millis(5000));
        assert_eq!(policy.delay_before_retry(9), Duration::from_millis(5000));
    }

    #[test]
    fn tickets_are_unique_across_controllers() {
        let mut a = FetchController::new(10);
        let mut b = FetchController::new(10);
        let ra = a.load_next().expect("first request");
        let rb = b.load_next().expect("first request");
        assert_ne!(ra.ticket, rb.ticket);
    }
}
