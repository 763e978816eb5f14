// Eligibility rules: bid sanity, budget, roster cap, category ceilings.
//
// All numbers come from configuration. Checks run in a fixed priority
// order and the first failure is the reported reason.

use std::collections::HashMap;

use crate::catalog::{Player, TeamId};

use super::error::AuctionError;
use super::ledger::BudgetBook;
use super::squad::SquadView;

/// Table-driven rule set for one auction session.
#[derive(Debug, Clone)]
pub struct RuleBook {
    roster_cap: usize,
    default_increment: u32,
    increments: HashMap<String, u32>,
    category_maxima: HashMap<String, u32>,
}

impl RuleBook {
    /// Build a rule book from configuration tables. Category keys are
    /// normalized to trimmed lowercase so they match catalog categories.
    pub fn new(
        roster_cap: usize,
        default_increment: u32,
        increments: HashMap<String, u32>,
        category_maxima: HashMap<String, u32>,
    ) -> Self {
        let normalize =
            |table: HashMap<String, u32>| -> HashMap<String, u32> {
                table
                    .into_iter()
                    .map(|(k, v)| (k.trim().to_lowercase(), v))
                    .collect()
            };
        RuleBook {
            roster_cap,
            default_increment,
            increments: normalize(increments),
            category_maxima: normalize(category_maxima),
        }
    }

    pub fn roster_cap(&self) -> usize {
        self.roster_cap
    }

    /// Raise step for a category; unlisted categories use the default.
    pub fn increment_for(&self, category: &str) -> u32 {
        self.increments
            .get(category)
            .copied()
            .unwrap_or(self.default_increment)
    }

    /// Opening bid for a player.
    pub fn starting_bid(&self, player: &Player) -> u32 {
        player.base_price
    }

    /// The next bid up from `current`, stepping by the player's category
    /// increment. Advisory for the operator's raise command; the evaluator
    /// accepts any legal amount, on-step or not.
    pub fn next_bid(&self, player: &Player, current: u32) -> u32 {
        current.saturating_add(self.increment_for(&player.category))
    }

    /// Configured ceiling for a category, if any. A ceiling of 0 bars the
    /// category outright.
    pub fn category_max(&self, category: &str) -> Option<u32> {
        self.category_maxima.get(category).copied()
    }

    /// Decide whether `team` may take `player` at `bid`.
    ///
    /// Check order: bid sanity, budget, roster ceiling, category ceiling.
    /// A player the team already holds (retained captain/vice-captain)
    /// is "already counted" and adds nothing when projecting sizes.
    pub fn can_assign(
        &self,
        squads: &SquadView<'_>,
        budgets: &BudgetBook,
        team: TeamId,
        player: &Player,
        bid: u32,
    ) -> Result<(), AuctionError> {
        if bid == 0 || bid < player.base_price {
            return Err(AuctionError::InvalidBid {
                player: player.id,
                bid,
                base_price: player.base_price,
            });
        }

        let remaining = budgets.remaining(team);
        if bid > remaining {
            return Err(AuctionError::BudgetExceeded {
                team,
                bid,
                remaining,
            });
        }

        let already_counted = squads.contains(team, player.id);
        let addition = usize::from(!already_counted);

        let size = squads.roster_size(team);
        if size + addition > self.roster_cap {
            return Err(AuctionError::RosterFull {
                team,
                size,
                cap: self.roster_cap,
            });
        }

        if let Some(max) = self.category_max(&player.category) {
            let count = squads.category_count(team, &player.category);
            if count + addition as u32 > max {
                return Err(AuctionError::CategoryLimitExceeded {
                    team,
                    category: player.category.clone(),
                    count,
                    max,
                });
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
