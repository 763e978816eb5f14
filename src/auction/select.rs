// Player selection: ordered category tiers, uniform random within a tier.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::catalog::Player;

/// Pick the next player to offer from `pool`.
///
/// Walks `category_order` and draws uniformly at random from the first
/// tier with at least one candidate. Players whose category matches no
/// configured tier are only reachable through the final fallback draw
/// over the whole pool. An empty pool yields `None`, which callers treat
/// as "auction exhausted", not an error.
pub fn select_next<'a, R: Rng + ?Sized>(
    rng: &mut R,
    pool: &[&'a Player],
    category_order: &[String],
) -> Option<&'a Player> {
    if pool.is_empty() {
        return None;
    }

    for tier in category_order {
        let tier_pool: Vec<&Player> = pool
            .iter()
            .copied()
            .filter(|p| p.category == *tier)
            .collect();
        if let Some(player) = tier_pool.choose(rng).copied() {
            debug!(
                "selected {} '{}' from tier '{}' ({} candidates)",
                player.id,
                player.name,
                tier,
                tier_pool.len()
            );
            return Some(player);
        }
    }

    let player = pool.choose(rng).copied();
    if let Some(p) = player {
        debug!("selected {} '{}' outside configured tiers", p.id, p.name);
    }
    player
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
