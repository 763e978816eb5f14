// Engine error taxonomy. Every variant is a recoverable operator condition:
// the engine rejects the call, leaves state untouched, and the operator
// retries with corrected input. Nothing here is fatal.

use thiserror::Error;

use crate::catalog::{PlayerId, TeamId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    /// Bid is zero or below the player's base price.
    #[error("invalid bid {bid} for {player}: minimum is the base price {base_price}")]
    InvalidBid {
        player: PlayerId,
        bid: u32,
        base_price: u32,
    },

    /// Bid is more than the team has left in its purse.
    #[error("bid {bid} exceeds remaining budget {remaining} for {team}")]
    BudgetExceeded {
        team: TeamId,
        bid: u32,
        remaining: u32,
    },

    /// Taking the player would push the squad past the roster cap.
    #[error("{team} roster is full ({size} of {cap})")]
    RosterFull {
        team: TeamId,
        size: usize,
        cap: usize,
    },

    /// Taking the player would exceed the configured per-category maximum.
    #[error("{team} already holds {count} in category '{category}' (max {max})")]
    CategoryLimitExceeded {
        team: TeamId,
        category: String,
        count: u32,
        max: u32,
    },

    /// Confirm or reopen was called with no tentative award pending.
    #[error("no team has been selected for the current player")]
    NoTeamSelected,

    /// Undo was requested for a player that is not the last-committed
    /// assignment. Historical undo is not supported.
    #[error("nothing to undo for {player}: only the most recent assignment can be undone")]
    NothingToUndo { player: PlayerId },

    /// The requested operation is not legal from the current lot stage.
    #[error("cannot {action}: {stage}")]
    InvalidTransition {
        action: &'static str,
        stage: &'static str,
    },
}
