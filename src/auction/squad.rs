// Squad membership and category tallies.
//
// A team's squad is its retained captain/vice-captain plus every committed
// assignment. A player appearing in both sources counts once; totals here
// feed the roster-cap and category-ceiling checks.

use std::collections::{HashMap, HashSet};

use crate::catalog::{Catalog, PlayerId, TeamId};

use super::ledger::AssignmentLedger;

/// Read-only view over one team's derived squad state, borrowing the
/// catalog and the ledger it is computed from.
#[derive(Debug, Clone, Copy)]
pub struct SquadView<'a> {
    catalog: &'a Catalog,
    ledger: &'a AssignmentLedger,
}

impl<'a> SquadView<'a> {
    pub fn new(catalog: &'a Catalog, ledger: &'a AssignmentLedger) -> Self {
        SquadView { catalog, ledger }
    }

    /// Squad members in listing order: retained players first (captain,
    /// then vice-captain), then committed assignments in commit order.
    /// Each player appears once.
    pub fn members(&self, team: TeamId) -> Vec<PlayerId> {
        let mut seen = HashSet::new();
        let mut members = Vec::new();
        for retention in self.catalog.retained_by(team) {
            if seen.insert(retention.player) {
                members.push(retention.player);
            }
        }
        for entry in self.ledger.for_team(team) {
            if seen.insert(entry.player) {
                members.push(entry.player);
            }
        }
        members
    }

    /// True when the player is already on this team's squad, whether
    /// retained or committed.
    pub fn contains(&self, team: TeamId, player: PlayerId) -> bool {
        self.catalog.is_retained_by(team, player)
            || self.ledger.for_team(team).any(|e| e.player == player)
    }

    pub fn roster_size(&self, team: TeamId) -> usize {
        self.members(team).len()
    }

    /// Category -> member count for one team.
    pub fn category_counts(&self, team: TeamId) -> HashMap<String, u32> {
        let mut counts = HashMap::new();
        for player_id in self.members(team) {
            if let Some(player) = self.catalog.player(player_id) {
                *counts.entry(player.category.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Member count for one category of one team.
    pub fn category_count(&self, team: TeamId, category: &str) -> u32 {
        self.members(team)
            .iter()
            .filter_map(|&id| self.catalog.player(id))
            .filter(|p| p.category == category)
            .count() as u32
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
