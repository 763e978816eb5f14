// Player and team catalog: static records for one auction session.
//
// Records are immutable once the catalog is built. Captain and vice-captain
// references arrive as free-text names and are resolved against the player
// list exactly once, here, so rule checks downstream only ever compare ids.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable player identifier, assigned in ingestion row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

/// Stable team identifier, assigned in ingestion row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A player available in the auction pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Display name, trimmed.
    pub name: String,
    /// Playing role (e.g. "Batter", "Bowler"), trimmed.
    pub role: String,
    /// Normalized lowercase tag used for rule lookups. Defaults to the
    /// lowercased role when the source row carried no category.
    pub category: String,
    /// Opening price; always positive for a valid entrant.
    pub base_price: u32,
    /// Optional photo URL, display-only.
    pub photo: Option<String>,
}

impl Player {
    /// Build a player, normalizing the category tag (or deriving it from
    /// the role when absent).
    pub fn new(
        id: PlayerId,
        name: &str,
        role: &str,
        category: Option<&str>,
        base_price: u32,
        photo: Option<String>,
    ) -> Self {
        let role = role.trim().to_string();
        let category = match category.map(str::trim) {
            Some(c) if !c.is_empty() => c.to_lowercase(),
            _ => role.to_lowercase(),
        };
        Player {
            id,
            name: name.trim().to_string(),
            role,
            category,
            base_price,
            photo,
        }
    }
}

/// A franchise bidding in the auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    /// Captain's player name as written in the team sheet.
    pub captain: String,
    /// Vice-captain's player name, if the team declared one.
    pub vice_captain: Option<String>,
}

/// Which pre-assigned slot a retained player fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetainedSlot {
    Captain,
    ViceCaptain,
}

impl fmt::Display for RetainedSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetainedSlot::Captain => write!(f, "C"),
            RetainedSlot::ViceCaptain => write!(f, "VC"),
        }
    }
}

/// A resolved pre-assignment: this player belongs to this team at zero cost,
/// seeded before bidding begins. Never recorded in the assignment ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retention {
    pub team: TeamId,
    pub player: PlayerId,
    pub slot: RetainedSlot,
}

// ---------------------------------------------------------------------------
// Name normalization
// ---------------------------------------------------------------------------

/// Normalization used for all name matching: trimmed, lowercased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The static player/team records for a session, with lookup indexes and
/// captain/vice-captain references resolved up front.
#[derive(Debug, Clone)]
pub struct Catalog {
    players: Vec<Player>,
    teams: Vec<Team>,
    retentions: Vec<Retention>,
    player_index: HashMap<PlayerId, usize>,
    name_index: HashMap<String, usize>,
    team_index: HashMap<TeamId, usize>,
}

impl Catalog {
    /// Build the catalog and resolve every captain/vice-captain name to a
    /// player id. Unresolvable names leave the slot empty with a warning;
    /// a player already claimed by another team is not claimed twice.
    pub fn new(players: Vec<Player>, teams: Vec<Team>) -> Self {
        let mut player_index = HashMap::new();
        let mut name_index = HashMap::new();
        for (idx, player) in players.iter().enumerate() {
            player_index.insert(player.id, idx);
            let key = normalize_name(&player.name);
            if name_index.contains_key(&key) {
                warn!("duplicate player name '{}'; keeping first entry", player.name);
            } else {
                name_index.insert(key, idx);
            }
        }

        let team_index = teams
            .iter()
            .enumerate()
            .map(|(idx, team)| (team.id, idx))
            .collect();

        let mut catalog = Catalog {
            players,
            teams,
            retentions: Vec::new(),
            player_index,
            name_index,
            team_index,
        };
        catalog.retentions = catalog.resolve_retentions();
        catalog
    }

    fn resolve_retentions(&self) -> Vec<Retention> {
        let mut retentions = Vec::new();
        let mut claimed: HashMap<PlayerId, TeamId> = HashMap::new();

        for team in &self.teams {
            let slots = [
                (RetainedSlot::Captain, Some(team.captain.as_str())),
                (RetainedSlot::ViceCaptain, team.vice_captain.as_deref()),
            ];
            for (slot, name) in slots {
                let Some(name) = name else { continue };
                if name.trim().is_empty() {
                    continue;
                }
                let Some(player) = self.player_by_name(name) else {
                    warn!(
                        "team '{}': {} '{}' matches no catalog player",
                        team.name, slot, name
                    );
                    continue;
                };
                if let Some(holder) = claimed.get(&player.id) {
                    warn!(
                        "team '{}': {} '{}' already retained by {}; skipping",
                        team.name, slot, name, holder
                    );
                    continue;
                }
                claimed.insert(player.id, team.id);
                retentions.push(Retention {
                    team: team.id,
                    player: player.id,
                    slot,
                });
            }
        }

        retentions
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.player_index.get(&id).map(|&idx| &self.players[idx])
    }

    /// Case-insensitive, trimmed name lookup.
    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        self.name_index
            .get(&normalize_name(name))
            .map(|&idx| &self.players[idx])
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.team_index.get(&id).map(|&idx| &self.teams[idx])
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// All resolved pre-assignments, in team order (captain before
    /// vice-captain within a team).
    pub fn retentions(&self) -> &[Retention] {
        &self.retentions
    }

    /// Retained players for one team, captain first.
    pub fn retained_by(&self, team: TeamId) -> impl Iterator<Item = &Retention> {
        self.retentions.iter().filter(move |r| r.team == team)
    }

    /// True when the player is pre-assigned to this specific team.
    pub fn is_retained_by(&self, team: TeamId, player: PlayerId) -> bool {
        self.retentions
            .iter()
            .any(|r| r.team == team && r.player == player)
    }

    /// True when the player is pre-assigned to any team.
    pub fn is_retained(&self, player: PlayerId) -> bool {
        self.retentions.iter().any(|r| r.player == player)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
