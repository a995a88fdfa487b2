use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DemoConfig;
use crate::player_fetch::{FetchError, PlayerSource};
use crate::state::{Player, PlayerPage, PlayerTeam};

const FIRST_NAMES: [&str; 12] = [
    "Alex", "Bo", "Cam", "Dante", "Eli", "Finn", "Gus", "Hal", "Isaiah", "Jalen", "Kobe", "Luka",
];
const LAST_NAMES: [&str; 10] = [
    "Stone", "Vega", "Holt", "Nox", "Vale", "Rook", "Quinn", "Park", "Moss", "Noor",
];
const POSITIONS: [&str; 6] = ["G", "F", "C", "G-F", "F-C", ""];
const TEAMS: [(u64, &str); 6] = [
    (1, "Hawks"),
    (2, "Celtics"),
    (10, "Warriors"),
    (14, "Lakers"),
    (17, "Bucks"),
    (24, "Suns"),
];

/// Offline stand-in for the player API. Serves a fixed generated roster with offset cursors and
/// can inject latency, transient failures and 429s.
pub struct DemoPlayerSource {
    players: Vec<Player>,
    config: DemoConfig,
    rng: StdRng,
}

impl DemoPlayerSource {
    pub fn new(config: DemoConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn seeded(config: DemoConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: DemoConfig, rng: StdRng) -> Self {
        Self {
            players: seed_players(config.total_players),
            config,
            rng,
        }
    }

    pub fn total(&self) -> usize {
        self.players.len()
    }
}

impl PlayerSource for DemoPlayerSource {
    fn label(&self) -> &'static str {
        "demo"
    }

    fn fetch_page(
        &mut self,
        cursor: Option<&str>,
        per_page: u32,
    ) -> Result<PlayerPage, FetchError> {
        if !self.config.latency.is_zero() {
            thread::sleep(self.config.latency);
        }
        if self.config.rate_limit_rate > 0.0 && self.rng.gen_bool(self.config.rate_limit_rate) {
            return Err(FetchError::RateLimited);
        }
        if self.config.failure_rate > 0.0 && self.rng.gen_bool(self.config.failure_rate) {
            return Err(FetchError::from_status(503, "demo upstream unavailable"));
        }

        let offset = match cursor {
            None => 0,
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| FetchError::from_status(400, "invalid cursor"))?,
        };
        let start = offset.min(self.players.len());
        let end = (start + per_page.max(1) as usize).min(self.players.len());
        let next_cursor = (end < self.players.len()).then(|| end.to_string());
        Ok(PlayerPage {
            players: self.players[start..end].to_vec(),
            next_cursor,
        })
    }
}

pub fn seed_players(total: u32) -> Vec<Player> {
    (0..total as usize)
        .map(|i| {
            let (team_id, team_name) = TEAMS[i % TEAMS.len()];
            Player {
                id: i as u64 + 1,
                first_name: FIRST_NAMES[i % FIRST_NAMES.len()].to_string(),
                last_name: LAST_NAMES[(i / FIRST_NAMES.len()) % LAST_NAMES.len()].to_string(),
                position: POSITIONS[i % POSITIONS.len()].to_string(),
                team: PlayerTeam {
                    id: team_id,
                    name: team_name.to_string(),
                },
            }
        })
        .collect()
}
