use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::Player;

pub const MIN_TEAM_NAME_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    pub player_count: String,
    pub region: String,
    pub country: String,
    #[serde(default)]
    pub players: Vec<Player>,
    pub created_at: String,
}

/// Form input for creating or editing a team.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamDraft {
    pub name: String,
    pub player_count: String,
    pub region: String,
    pub country: String,
}

impl TeamDraft {
    pub fn from_team(team: &Team) -> Self {
        Self {
            name: team.name.clone(),
            player_count: team.player_count.clone(),
            region: team.region.clone(),
            country: team.country.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Team name is required")]
    NameRequired,
    #[error("Team name must be at least {MIN_TEAM_NAME_CHARS} characters")]
    NameTooShort,
    #[error("Team name must be unique")]
    NameTaken,
    #[error("Player count cannot be negative")]
    NegativePlayerCount,
    #[error("Player count must be a whole number")]
    InvalidPlayerCount,
    #[error("Region is required")]
    RegionRequired,
    #[error("Country is required")]
    CountryRequired,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("team {0} not found")]
    TeamNotFound(String),
    #[error("player {0} is already on a team")]
    PlayerAlreadyAssigned(u64),
    #[error("player {player_id} is not on team {team_id}")]
    PlayerNotOnTeam { team_id: String, player_id: u64 },
    #[error("invalid team: {}", .0.first().map(|e| e.to_string()).unwrap_or_default())]
    InvalidDraft(Vec<DraftError>),
}

/// Teams plus the assignment index. Serialized as the durable teams record.
///
/// Every mutation goes through the methods below so `assigned_player_ids` always matches the
/// union of team rosters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    #[serde(default)]
    teams: Vec<Team>,
    #[serde(default)]
    assigned_player_ids: Vec<u64>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, team_id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == team_id)
    }

    pub fn assigned_player_ids(&self) -> &[u64] {
        &self.assigned_player_ids
    }

    pub fn is_assigned(&self, player_id: u64) -> bool {
        self.assigned_player_ids.contains(&player_id)
    }

    pub fn team_of(&self, player_id: u64) -> Option<&Team> {
        self.teams
            .iter()
            .find(|t| t.players.iter().any(|p| p.id == player_id))
    }

    pub fn total_players(&self) -> u64 {
        self.teams
            .iter()
            .map(|t| t.player_count.trim().parse::<u64>().unwrap_or(0))
            .sum()
    }

    /// Creates a team. The draft's player count is ignored: new teams always start at "0".
    pub fn create_team(
        &mut self,
        draft: TeamDraft,
        now: DateTime<Utc>,
    ) -> Result<String, RosterError> {
        validate_draft(&draft, &self.teams, None).map_err(RosterError::InvalidDraft)?;

        let mut stamp = now.timestamp_millis();
        while self.teams.iter().any(|t| t.id == stamp.to_string()) {
            stamp += 1;
        }
        let id = stamp.to_string();
        self.teams.push(Team {
            id: id.clone(),
            name: draft.name.trim().to_string(),
            player_count: "0".to_string(),
            region: draft.region.trim().to_string(),
            country: draft.country.trim().to_string(),
            players: Vec::new(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        Ok(id)
    }

    pub fn update_team(&mut self, team_id: &str, draft: TeamDraft) -> Result<(), RosterError> {
        let idx = self
            .teams
            .iter()
            .position(|t| t.id == team_id)
            .ok_or_else(|| RosterError::TeamNotFound(team_id.to_string()))?;
        validate_draft(&draft, &self.teams, Some(&self.teams[idx]))
            .map_err(RosterError::InvalidDraft)?;

        let team = &mut self.teams[idx];
        team.name = draft.name.trim().to_string();
        team.player_count = normalized_count(&draft.player_count);
        team.region = draft.region.trim().to_string();
        team.country = draft.country.trim().to_string();
        Ok(())
    }

    /// Removes the team and releases every player it held.
    pub fn delete_team(&mut self, team_id: &str) -> Result<Team, RosterError> {
        let idx = self
            .teams
            .iter()
            .position(|t| t.id == team_id)
            .ok_or_else(|| RosterError::TeamNotFound(team_id.to_string()))?;
        let team = self.teams.remove(idx);
        self.assigned_player_ids
            .retain(|id| !team.players.iter().any(|p| p.id == *id));
        Ok(team)
    }

    pub fn add_player_to_team(&mut self, team_id: &str, player: Player) -> Result<(), RosterError> {
        if self.is_assigned(player.id) {
            return Err(RosterError::PlayerAlreadyAssigned(player.id));
        }
        let team = self
            .teams
            .iter_mut()
            .find(|t| t.id == team_id)
            .ok_or_else(|| RosterError::TeamNotFound(team_id.to_string()))?;
        let player_id = player.id;
        team.players.push(player);
        team.player_count = team.players.len().to_string();
        self.assigned_player_ids.push(player_id);
        Ok(())
    }

    pub fn remove_player_from_team(
        &mut self,
        team_id: &str,
        player_id: u64,
    ) -> Result<Player, RosterError> {
        let team = self
            .teams
            .iter_mut()
            .find(|t| t.id == team_id)
            .ok_or_else(|| RosterError::TeamNotFound(team_id.to_string()))?;
        let idx = team
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| RosterError::PlayerNotOnTeam {
                team_id: team_id.to_string(),
                player_id,
            })?;
        let player = team.players.remove(idx);
        team.player_count = team.players.len().to_string();
        self.assigned_player_ids.retain(|id| *id != player_id);
        Ok(player)
    }

    pub fn reset(&mut self) {
        self.teams.clear();
        self.assigned_player_ids.clear();
    }
}

/// Collects every problem with a draft. `editing` is the team being edited, if any, so it
/// may keep its own name.
pub fn validate_draft(
    draft: &TeamDraft,
    teams: &[Team],
    editing: Option<&Team>,
) -> Result<(), Vec<DraftError>> {
    let mut errors = Vec::new();

    let name = draft.name.trim();
    if name.is_empty() {
        errors.push(DraftError::NameRequired);
    } else if name.chars().count() < MIN_TEAM_NAME_CHARS {
        errors.push(DraftError::NameTooShort);
    } else if teams.iter().any(|t| t.name == name) && editing.is_none_or(|t| t.name != name) {
        errors.push(DraftError::NameTaken);
    }

    let count = draft.player_count.trim();
    if !count.is_empty() {
        match count.parse::<i64>() {
            Ok(n) if n < 0 => errors.push(DraftError::NegativePlayerCount),
            Ok(_) => {}
            Err(_) => errors.push(DraftError::InvalidPlayerCount),
        }
    }

    if draft.region.trim().is_empty() {
        errors.push(DraftError::RegionRequired);
    }
    if draft.country.trim().is_empty() {
        errors.push(DraftError::CountryRequired);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn normalized_count(raw: &str) -> String {
    raw.trim()
        .parse::<u64>()
        .map(|n| n.to_string())
        .unwrap_or_else(|_| "0".to_string())
}
