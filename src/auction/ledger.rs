// Assignment ledger and budget book.
//
// The ledger is the append/retract log of committed (player -> team, price)
// facts and the single source of truth for everything derived from them.
// The budget book tracks each team's remaining purse against the shared
// limit; it is adjusted only when a ledger entry is appended or retracted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::catalog::{PlayerId, TeamId};

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// One committed purchase. At most one assignment exists per player; undo
/// removes the record entirely and a re-assign creates a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub player: PlayerId,
    pub team: TeamId,
    pub price: u32,
    /// 1-based commit order, monotonic across the session (never reused,
    /// even after an undo).
    pub sequence: u64,
    pub committed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// AssignmentLedger
// ---------------------------------------------------------------------------

/// Append-ordered log of committed assignments.
#[derive(Debug, Clone, Default)]
pub struct AssignmentLedger {
    entries: Vec<Assignment>,
    next_sequence: u64,
}

impl AssignmentLedger {
    pub fn new() -> Self {
        AssignmentLedger {
            entries: Vec::new(),
            next_sequence: 1,
        }
    }

    /// Append a committed assignment. The caller must have verified that
    /// the player holds no existing assignment.
    pub fn append(&mut self, player: PlayerId, team: TeamId, price: u32) -> &Assignment {
        debug_assert!(!self.contains(player), "player {player} already assigned");
        let entry = Assignment {
            player,
            team,
            price,
            sequence: self.next_sequence,
            committed_at: Utc::now(),
        };
        self.next_sequence += 1;
        debug!("ledger append: {} -> {} at {}", player, team, price);
        let idx = self.entries.len();
        self.entries.push(entry);
        &self.entries[idx]
    }

    /// Retract the most recent entry, returning it.
    pub fn retract_last(&mut self) -> Option<Assignment> {
        let entry = self.entries.pop();
        if let Some(e) = &entry {
            debug!("ledger retract: {} from {}", e.player, e.team);
        }
        entry
    }

    /// The most recent entry, if any.
    pub fn last(&self) -> Option<&Assignment> {
        self.entries.last()
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.entries.iter().any(|e| e.player == player)
    }

    pub fn get(&self, player: PlayerId) -> Option<&Assignment> {
        self.entries.iter().find(|e| e.player == player)
    }

    /// All entries in commit order.
    pub fn entries(&self) -> &[Assignment] {
        &self.entries
    }

    /// One team's entries, in commit order.
    pub fn for_team(&self, team: TeamId) -> impl Iterator<Item = &Assignment> {
        self.entries.iter().filter(move |e| e.team == team)
    }

    /// Total committed spend for one team.
    pub fn team_spend(&self, team: TeamId) -> u32 {
        self.for_team(team).map(|e| e.price).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// BudgetBook
// ---------------------------------------------------------------------------

/// Per-team remaining purse. Every team starts at the shared limit;
/// `charge` and `refund` are the only mutations and are driven exclusively
/// by ledger commits and undos.
#[derive(Debug, Clone)]
pub struct BudgetBook {
    limit: u32,
    remaining: HashMap<TeamId, u32>,
}

impl BudgetBook {
    pub fn new(limit: u32, teams: impl IntoIterator<Item = TeamId>) -> Self {
        let remaining = teams.into_iter().map(|t| (t, limit)).collect();
        BudgetBook { limit, remaining }
    }

    /// The shared per-team limit.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Remaining purse for a team. Unknown teams have nothing to spend.
    pub fn remaining(&self, team: TeamId) -> u32 {
        self.remaining.get(&team).copied().unwrap_or(0)
    }

    /// Spend so far for a team.
    pub fn spent(&self, team: TeamId) -> u32 {
        self.limit.saturating_sub(self.remaining(team))
    }

    /// Deduct a committed price. The caller must have verified affordability.
    pub fn charge(&mut self, team: TeamId, amount: u32) {
        if let Some(purse) = self.remaining.get_mut(&team) {
            *purse = purse.saturating_sub(amount);
        }
    }

    /// Restore an undone price exactly.
    pub fn refund(&mut self, team: TeamId, amount: u32) {
        if let Some(purse) = self.remaining.get_mut(&team) {
            *purse += amount;
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
