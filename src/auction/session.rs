// Bid session state machine and the engine that drives it.
//
// The engine owns the only mutable auction state: the assignment ledger,
// the budget book, the lot machine, the last-committed pointer, and the
// round-local unsold set. Everything callers see is a read-only view or a
// snapshot. One player moves through the machine at a time:
//
//   Idle -> Offered -> TentativelyAwarded -> (confirm) back to Idle
//                  \-> Unsold (returns to the pool for a later round)
//
// Confirm is the single transition that touches the ledger and budgets.

use std::collections::{BTreeMap, HashSet};

use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{Catalog, Player, PlayerId, RetainedSlot, TeamId};

use super::error::AuctionError;
use super::ledger::{Assignment, AssignmentLedger, BudgetBook};
use super::rules::RuleBook;
use super::select::select_next;
use super::squad::SquadView;

// ---------------------------------------------------------------------------
// Lot state machine
// ---------------------------------------------------------------------------

/// Stage of the single player currently moving through the auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LotState {
    /// No player on the block.
    Idle,
    /// A player is up for bidding; no team chosen yet.
    Offered { player: PlayerId },
    /// The operator has picked a team at a price. Revocable via reopen
    /// until confirmed; never persisted.
    TentativelyAwarded {
        player: PlayerId,
        team: TeamId,
        price: u32,
    },
}

impl LotState {
    /// The player occupying the lot, if any.
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            LotState::Idle => None,
            LotState::Offered { player } => Some(*player),
            LotState::TentativelyAwarded { player, .. } => Some(*player),
        }
    }
}

/// Whether the auction is still taking bids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuctionPhase {
    Bidding,
    Complete,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// One squad line: a retained or purchased player.
#[derive(Debug, Clone, Serialize)]
pub struct SquadSlot {
    pub player: PlayerId,
    pub name: String,
    pub role: String,
    pub category: String,
    /// Zero for retained captains/vice-captains.
    pub price: u32,
    /// Set for pre-assigned entries, `None` for auction purchases.
    pub retained: Option<RetainedSlot>,
}

/// Point-in-time view of one team.
#[derive(Debug, Clone, Serialize)]
pub struct TeamSnapshot {
    pub team: TeamId,
    pub name: String,
    pub captain: String,
    pub vice_captain: Option<String>,
    pub budget_remaining: u32,
    pub budget_spent: u32,
    /// Retained players first (captain, vice-captain), then purchases in
    /// commit order.
    pub squad: Vec<SquadSlot>,
    pub category_counts: BTreeMap<String, u32>,
}

/// A player still without a team, with its base price for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct UnassignedEntry {
    pub player: PlayerId,
    pub name: String,
    pub role: String,
    pub category: String,
    pub base_price: u32,
}

/// Full read-only view of the auction, enough to render a scoreboard or
/// produce the final export.
#[derive(Debug, Clone, Serialize)]
pub struct AuctionSnapshot {
    pub phase: AuctionPhase,
    pub round: u32,
    pub lot: LotState,
    pub budget_limit: u32,
    pub teams: Vec<TeamSnapshot>,
    pub unassigned: Vec<UnassignedEntry>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The auction allocation engine.
///
/// Owns the catalog, the rule book, and all mutable session state. All
/// operations are synchronous; a confirm either fully applies (ledger
/// append, budget charge, pointer update) or fails with no effect.
#[derive(Debug, Clone)]
pub struct AuctionEngine {
    catalog: Catalog,
    rules: RuleBook,
    category_order: Vec<String>,
    ledger: AssignmentLedger,
    budgets: BudgetBook,
    lot: LotState,
    /// Only the most recent commit can be undone; cleared by undo.
    last_committed: Option<PlayerId>,
    /// Players passed over in the current round; cleared on rollover.
    passed_this_round: HashSet<PlayerId>,
    round: u32,
    phase: AuctionPhase,
}

impl AuctionEngine {
    pub fn new(
        catalog: Catalog,
        rules: RuleBook,
        category_order: Vec<String>,
        budget_limit: u32,
    ) -> Self {
        let team_ids: Vec<TeamId> = catalog.teams().iter().map(|t| t.id).collect();
        let budgets = BudgetBook::new(budget_limit, team_ids);
        let category_order = category_order
            .iter()
            .map(|c| c.trim().to_lowercase())
            .collect();
        info!(
            "engine ready: {} players, {} teams, purse {} each, {} retained",
            catalog.players().len(),
            catalog.teams().len(),
            budget_limit,
            catalog.retentions().len()
        );
        AuctionEngine {
            catalog,
            rules,
            category_order,
            ledger: AssignmentLedger::new(),
            budgets,
            lot: LotState::Idle,
            last_committed: None,
            passed_this_round: HashSet::new(),
            round: 1,
            phase: AuctionPhase::Bidding,
        }
    }

    // -- read-only projections ------------------------------------------------

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// The committed-assignment log, read-only.
    pub fn ledger(&self) -> &AssignmentLedger {
        &self.ledger
    }

    pub fn budget_limit(&self) -> u32 {
        self.budgets.limit()
    }

    pub fn budget_remaining(&self, team: TeamId) -> u32 {
        self.budgets.remaining(team)
    }

    /// Derived squad view (roster membership, category counts).
    pub fn squads(&self) -> SquadView<'_> {
        SquadView::new(&self.catalog, &self.ledger)
    }

    pub fn lot(&self) -> LotState {
        self.lot
    }

    /// The player currently on the block, if any.
    pub fn offered_player(&self) -> Option<&Player> {
        self.lot.player().and_then(|id| self.catalog.player(id))
    }

    pub fn phase(&self) -> AuctionPhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == AuctionPhase::Complete
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Players with no team: not retained, not committed. Catalog order.
    pub fn unassigned(&self) -> Vec<&Player> {
        self.catalog
            .players()
            .iter()
            .filter(|p| !self.catalog.is_retained(p.id) && !self.ledger.contains(p.id))
            .collect()
    }

    /// Unassigned players still offerable this round.
    pub fn offerable(&self) -> Vec<&Player> {
        self.unassigned()
            .into_iter()
            .filter(|p| !self.passed_this_round.contains(&p.id))
            .collect()
    }

    /// Evaluate a bid without touching any state. `player` must come from
    /// this engine's catalog; teams outside the catalog have no purse and
    /// fail the budget check.
    pub fn check_bid(
        &self,
        team: TeamId,
        player: &Player,
        bid: u32,
    ) -> Result<(), AuctionError> {
        self.rules
            .can_assign(&self.squads(), &self.budgets, team, player, bid)
    }

    // -- selection ------------------------------------------------------------

    /// Offer the next player, drawn by category priority. Returns `None`
    /// when the auction is complete or the pool is exhausted (which flips
    /// the phase to complete). Rolls the round over when every remaining
    /// player has been passed. Discards any pending lot.
    pub fn offer_next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&Player> {
        if self.is_complete() {
            return None;
        }
        self.discard_pending_lot();

        if self.unassigned().is_empty() {
            info!("pool exhausted in round {}; auction complete", self.round);
            self.phase = AuctionPhase::Complete;
            return None;
        }
        if self.offerable().is_empty() {
            self.round += 1;
            self.passed_this_round.clear();
            info!("round {} begins; unsold players return to the pool", self.round);
        }

        let pool = self.offerable();
        let selected = select_next(rng, &pool, &self.category_order).map(|p| p.id);
        let player = selected?;

        self.lot = LotState::Offered { player };
        let record = self.catalog.player(player);
        if let Some(p) = record {
            info!(
                "on the block: '{}' ({}, base {})",
                p.name, p.category, p.base_price
            );
        }
        record
    }

    /// Put a specific player on the block, bypassing the random draw.
    /// Discards any pending lot, like `offer_next`.
    pub fn offer(&mut self, player: PlayerId) -> Result<&Player, AuctionError> {
        if self.is_complete() {
            return Err(AuctionError::InvalidTransition {
                action: "offer a player",
                stage: "the auction is complete",
            });
        }
        if self.catalog.player(player).is_none() {
            return Err(AuctionError::InvalidTransition {
                action: "offer a player",
                stage: "no such player in the catalog",
            });
        }
        if self.ledger.contains(player) {
            return Err(AuctionError::InvalidTransition {
                action: "offer a player",
                stage: "the player is already assigned",
            });
        }
        if self.catalog.is_retained(player) {
            return Err(AuctionError::InvalidTransition {
                action: "offer a player",
                stage: "the player is retained by a team",
            });
        }

        self.discard_pending_lot();
        self.lot = LotState::Offered { player };
        let record = self.player_record(player)?;
        info!(
            "on the block (operator pick): '{}' ({}, base {})",
            record.name, record.category, record.base_price
        );
        Ok(record)
    }

    fn discard_pending_lot(&mut self) {
        if let LotState::TentativelyAwarded { player, team, .. } = self.lot {
            warn!("discarding tentative award of {} to {}", player, team);
        }
        self.lot = LotState::Idle;
    }

    /// Resolve the record for a player id the lot machinery is holding.
    fn player_record(&self, player: PlayerId) -> Result<&Player, AuctionError> {
        self.catalog
            .player(player)
            .ok_or(AuctionError::InvalidTransition {
                action: "resolve the player on the block",
                stage: "no such player in the catalog",
            })
    }

    // -- bidding --------------------------------------------------------------

    /// Tentatively award the offered player to `team` at `price`. Validates
    /// eligibility first; a rejection leaves the lot offered.
    pub fn tentative(&mut self, team: TeamId, price: u32) -> Result<(), AuctionError> {
        let player = match self.lot {
            LotState::Offered { player } => player,
            LotState::TentativelyAwarded { .. } => {
                return Err(AuctionError::InvalidTransition {
                    action: "select a team",
                    stage: "a tentative award is already pending",
                })
            }
            LotState::Idle => {
                return Err(AuctionError::InvalidTransition {
                    action: "select a team",
                    stage: "no player is on the block",
                })
            }
        };

        let record = self.player_record(player)?;
        self.rules
            .can_assign(&SquadView::new(&self.catalog, &self.ledger), &self.budgets, team, record, price)?;

        self.lot = LotState::TentativelyAwarded {
            player,
            team,
            price,
        };
        info!("tentative: {} to {} at {}", player, team, price);
        Ok(())
    }

    /// Discard the tentative award and put the player back up for bidding.
    /// No side effects.
    pub fn reopen(&mut self) -> Result<PlayerId, AuctionError> {
        let LotState::TentativelyAwarded { player, .. } = self.lot else {
            return Err(AuctionError::NoTeamSelected);
        };
        self.lot = LotState::Offered { player };
        info!("reopened bidding for {}", player);
        Ok(player)
    }

    /// Commit the tentative award: append to the ledger, charge the budget,
    /// set the undo pointer, return the lot to idle. Eligibility is
    /// re-checked first; on rejection nothing changes and the award stays
    /// pending.
    pub fn confirm(&mut self) -> Result<&Assignment, AuctionError> {
        let LotState::TentativelyAwarded {
            player,
            team,
            price,
        } = self.lot
        else {
            return Err(AuctionError::NoTeamSelected);
        };

        let record = self.player_record(player)?;
        self.rules
            .can_assign(&SquadView::new(&self.catalog, &self.ledger), &self.budgets, team, record, price)?;

        let player_name = record.name.clone();
        let team_name = self
            .catalog
            .team(team)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| team.to_string());

        self.budgets.charge(team, price);
        self.last_committed = Some(player);
        self.lot = LotState::Idle;
        let entry = self.ledger.append(player, team, price);
        info!(
            "sold #{}: '{}' to '{}' for {}",
            entry.sequence, player_name, team_name, price
        );
        Ok(entry)
    }

    /// Pass on the offered player for this round. The player stays in the
    /// global unassigned pool and comes back when the round rolls over.
    /// No ledger or budget effects.
    pub fn mark_unsold(&mut self) -> Result<PlayerId, AuctionError> {
        match self.lot {
            LotState::Offered { player } => {
                self.passed_this_round.insert(player);
                self.lot = LotState::Idle;
                info!("unsold: {} returns to the pool for a later round", player);
                Ok(player)
            }
            LotState::TentativelyAwarded { .. } => Err(AuctionError::InvalidTransition {
                action: "mark the lot unsold",
                stage: "a tentative award is pending",
            }),
            LotState::Idle => Err(AuctionError::InvalidTransition {
                action: "mark the lot unsold",
                stage: "no player is on the block",
            }),
        }
    }

    // -- undo -----------------------------------------------------------------

    /// Undo the most recent commit, by player. With nothing committed since
    /// the last undo this is a no-op (`Ok(None)`); naming any player other
    /// than the last-committed one is refused with `NothingToUndo`.
    pub fn undo(&mut self, player: PlayerId) -> Result<Option<Assignment>, AuctionError> {
        let Some(last) = self.last_committed else {
            return Ok(None);
        };
        if last != player {
            return Err(AuctionError::NothingToUndo { player });
        }

        let Some(entry) = self.ledger.retract_last() else {
            return Ok(None);
        };
        debug_assert_eq!(entry.player, player, "undo pointer out of step with ledger");
        self.budgets.refund(entry.team, entry.price);
        self.last_committed = None;
        info!(
            "undo: {} back to the pool, {} refunded to {}",
            entry.player, entry.price, entry.team
        );
        Ok(Some(entry))
    }

    /// Undo the most recent commit, whichever player that is. `None` when
    /// there is nothing to undo.
    pub fn undo_last(&mut self) -> Option<Assignment> {
        let player = self.last_committed?;
        self.undo(player).ok().flatten()
    }

    // -- completion -----------------------------------------------------------

    /// End the auction now. Discards any pending lot; remaining unassigned
    /// players are never offered again and surface in the final snapshot
    /// at their base price, billed to no one.
    pub fn force_complete(&mut self) {
        self.discard_pending_lot();
        if self.phase != AuctionPhase::Complete {
            self.phase = AuctionPhase::Complete;
            info!(
                "auction force-completed; {} players unassigned",
                self.unassigned().len()
            );
        }
    }

    // -- snapshot -------------------------------------------------------------

    /// Build the full read-only snapshot used by the scoreboard and export.
    pub fn snapshot(&self) -> AuctionSnapshot {
        let squads = self.squads();
        let teams = self
            .catalog
            .teams()
            .iter()
            .map(|team| {
                let mut squad = Vec::new();
                for retention in self.catalog.retained_by(team.id) {
                    if let Some(p) = self.catalog.player(retention.player) {
                        squad.push(SquadSlot {
                            player: p.id,
                            name: p.name.clone(),
                            role: p.role.clone(),
                            category: p.category.clone(),
                            price: 0,
                            retained: Some(retention.slot),
                        });
                    }
                }
                for entry in self.ledger.for_team(team.id) {
                    if let Some(p) = self.catalog.player(entry.player) {
                        squad.push(SquadSlot {
                            player: p.id,
                            name: p.name.clone(),
                            role: p.role.clone(),
                            category: p.category.clone(),
                            price: entry.price,
                            retained: None,
                        });
                    }
                }
                TeamSnapshot {
                    team: team.id,
                    name: team.name.clone(),
                    captain: team.captain.clone(),
                    vice_captain: team.vice_captain.clone(),
                    budget_remaining: self.budgets.remaining(team.id),
                    budget_spent: self.budgets.spent(team.id),
                    squad,
                    category_counts: squads.category_counts(team.id).into_iter().collect(),
                }
            })
            .collect();

        let unassigned = self
            .unassigned()
            .into_iter()
            .map(|p| UnassignedEntry {
                player: p.id,
                name: p.name.clone(),
                role: p.role.clone(),
                category: p.category.clone(),
                base_price: p.base_price,
            })
            .collect();

        AuctionSnapshot {
            phase: self.phase,
            round: self.round,
            lot: self.lot,
            budget_limit: self.budgets.limit(),
            teams,
            unassigned,
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
