// Auction allocation engine: rule evaluation, lot state machine, and the
// append-only assignment ledger behind it.

pub mod error;
pub mod ledger;
pub mod rules;
pub mod select;
pub mod session;
pub mod squad;

pub use error::AuctionError;
pub use ledger::{Assignment, AssignmentLedger, BudgetBook};
pub use rules::RuleBook;
pub use select::select_next;
pub use session::{
    AuctionEngine, AuctionPhase, AuctionSnapshot, LotState, SquadSlot, TeamSnapshot,
    UnassignedEntry,
};
pub use squad::SquadView;
