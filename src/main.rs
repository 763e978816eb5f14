// Auction desk entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not the operator's terminal)
// 2. Ensure + load config
// 3. Load roster sheets (players.csv, teams.csv)
// 4. Build the catalog and the auction engine
// 5. Run the operator console loop
// 6. Export results on completion

use auction_desk::auction::{AuctionEngine, LotState, RuleBook};
use auction_desk::catalog::{Catalog, PlayerId, TeamId};
use auction_desk::config::{self, Config};
use auction_desk::ingest;
use auction_desk::report;

use anyhow::Context;
use std::io::Write as _;
use std::path::Path;
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not the terminal)
    init_tracing()?;
    info!("Auction desk starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: auction={}, purse {}, roster cap {}",
        config.auction.name, config.auction.budget_limit, config.auction.roster_cap
    );

    // 3. Load roster sheets
    let data = ingest::load_all(&config).context("failed to load roster sheets")?;
    info!(
        "Loaded {} players, {} teams",
        data.players.len(),
        data.teams.len()
    );

    // 4. Build the catalog (resolves captains/vice-captains) and the engine
    let catalog = Catalog::new(data.players, data.teams);
    let rules = RuleBook::new(
        config.auction.roster_cap,
        config.rules.default_increment,
        config.rules.increments.clone(),
        config.rules.category_maxima.clone(),
    );
    let engine = AuctionEngine::new(
        catalog,
        rules,
        config.rules.category_order.clone(),
        config.auction.budget_limit,
    );

    // 5. Operator console loop
    println!("=== {} ===", config.auction.name);
    print_teams(&engine);
    println!("Type 'help' for commands.");
    run_console(engine, &config)?;

    info!("Auction desk shut down cleanly");
    Ok(())
}

// ---------------------------------------------------------------------------
// Console loop
// ---------------------------------------------------------------------------

fn run_console(mut engine: AuctionEngine, config: &Config) -> anyhow::Result<()> {
    let mut rng = rand::thread_rng();
    let stdin = std::io::stdin();
    let mut line = String::new();
    let mut was_complete = engine.is_complete();

    loop {
        print!("gavel> ");
        std::io::stdout().flush()?;
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            // stdin closed
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let (command, rest) = match input.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (input, ""),
        };

        match command {
            "next" | "n" => draw_next(&mut engine, &mut rng, config),
            "offer" => offer_named(&mut engine, rest),
            "take" => take(&mut engine, rest),
            "raise" => raise(&mut engine, rest),
            "confirm" | "sold" => confirm(&mut engine),
            "reopen" => match engine.reopen() {
                Ok(player) => println!("bidding reopened for {}", player_name(&engine, player)),
                Err(e) => println!("! {e}"),
            },
            "unsold" | "pass" => match engine.mark_unsold() {
                Ok(player) => println!(
                    "{} goes unsold this round and returns to the pool",
                    player_name(&engine, player)
                ),
                Err(e) => println!("! {e}"),
            },
            "undo" => undo(&mut engine, rest),
            "board" | "b" => println!("{}", report::render_scoreboard(&engine.snapshot())),
            "json" => match serde_json::to_string_pretty(&engine.snapshot()) {
                Ok(dump) => println!("{dump}"),
                Err(e) => println!("! snapshot serialization failed: {e}"),
            },
            "finish" => {
                engine.force_complete();
                println!("{}", report::render_scoreboard(&engine.snapshot()));
            }
            "export" => {
                let path = if rest.is_empty() {
                    config.console.export_path.as_str()
                } else {
                    rest
                };
                export(&engine, path);
            }
            "help" | "?" => print_help(),
            "quit" | "q" => {
                if !engine.is_complete() {
                    warn!("quitting with the auction still in progress");
                }
                break;
            }
            other => println!("! unknown command '{other}'; type 'help'"),
        }

        // One export per completion, however it was reached.
        if engine.is_complete() && !was_complete {
            was_complete = true;
            println!("auction complete");
            export(&engine, &config.console.export_path);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn draw_next<R: rand::Rng>(engine: &mut AuctionEngine, rng: &mut R, config: &Config) {
    // Cosmetic suspense pause; carries no state meaning.
    if config.console.reveal_delay_ms > 0 && !engine.is_complete() {
        println!("drawing...");
        std::thread::sleep(std::time::Duration::from_millis(config.console.reveal_delay_ms));
    }
    let Some(player) = engine.offer_next(rng) else {
        println!("no players left to offer");
        return;
    };
    let name = player.name.clone();
    let role = player.role.clone();
    let category = player.category.clone();
    let base = player.base_price;
    announce_lot(engine, &name, &role, &category, base);
}

fn offer_named(engine: &mut AuctionEngine, name: &str) {
    if name.is_empty() {
        println!("usage: offer <player name>");
        return;
    }
    let Some(id) = engine.catalog().player_by_name(name).map(|p| p.id) else {
        println!("! no player named '{name}'");
        return;
    };
    match engine.offer(id) {
        Ok(player) => {
            let name = player.name.clone();
            let role = player.role.clone();
            let category = player.category.clone();
            let base = player.base_price;
            announce_lot(engine, &name, &role, &category, base);
        }
        Err(e) => println!("! {e}"),
    }
}

fn announce_lot(engine: &AuctionEngine, name: &str, role: &str, category: &str, base: u32) {
    let step = engine.rules().increment_for(category);
    println!("ON THE BLOCK: {name} ({role}, {category})");
    println!("  base price {base}, raise step {step}");
}

/// `take <team> <amount>`: tentatively award the lot. A pending award is
/// reopened first so competing bids flow as repeated takes.
fn take(engine: &mut AuctionEngine, rest: &str) {
    let Some((team_token, amount_text)) = rest.rsplit_once(char::is_whitespace) else {
        println!("usage: take <team> <amount>");
        return;
    };
    let Ok(amount) = amount_text.trim().parse::<u32>() else {
        println!("! '{}' is not an amount", amount_text.trim());
        return;
    };
    let Some(team) = resolve_team(engine, team_token.trim()) else {
        println!("! no team matching '{}'", team_token.trim());
        return;
    };
    award(engine, team, amount);
}

/// `raise <team>`: step the bid for a team. Opens at the base price, then
/// climbs by the category increment from the pending award.
fn raise(engine: &mut AuctionEngine, rest: &str) {
    let Some(team) = resolve_team(engine, rest) else {
        println!("usage: raise <team>");
        return;
    };
    let Some(player) = engine.offered_player() else {
        println!("! no player is on the block");
        return;
    };
    let amount = match engine.lot() {
        LotState::TentativelyAwarded { price, .. } => engine.rules().next_bid(player, price),
        _ => engine.rules().starting_bid(player),
    };
    award(engine, team, amount);
}

fn award(engine: &mut AuctionEngine, team: TeamId, amount: u32) {
    if matches!(engine.lot(), LotState::TentativelyAwarded { .. }) {
        if let Err(e) = engine.reopen() {
            println!("! {e}");
            return;
        }
    }
    match engine.tentative(team, amount) {
        Ok(()) => {
            let team_name = team_name(engine, team);
            println!("going to {team_name} at {amount}... ('confirm' to close, 'take'/'raise' to rebid)");
        }
        Err(e) => println!("! {e}"),
    }
}

fn confirm(engine: &mut AuctionEngine) {
    let (player, team, price) = match engine.confirm() {
        Ok(entry) => (entry.player, entry.team, entry.price),
        Err(e) => {
            println!("! {e}");
            return;
        }
    };
    println!(
        "SOLD: {} to {} for {} (budget left {})",
        player_name(engine, player),
        team_name(engine, team),
        price,
        engine.budget_remaining(team)
    );
}

fn undo(engine: &mut AuctionEngine, rest: &str) {
    let result = if rest.is_empty() {
        Ok(engine.undo_last())
    } else {
        match engine.catalog().player_by_name(rest).map(|p| p.id) {
            Some(id) => engine.undo(id),
            None => {
                println!("! no player named '{rest}'");
                return;
            }
        }
    };
    match result {
        Ok(Some(entry)) => println!(
            "undone: {} returns to the pool, {} refunded to {}",
            player_name(engine, entry.player),
            entry.price,
            team_name(engine, entry.team)
        ),
        Ok(None) => println!("nothing to undo"),
        Err(e) => println!("! {e}"),
    }
}

fn export(engine: &AuctionEngine, path: &str) {
    match report::export_csv(&engine.snapshot(), Path::new(path)) {
        Ok(()) => println!("results written to {path}"),
        Err(e) => println!("! {e}"),
    }
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn print_teams(engine: &AuctionEngine) {
    let catalog = engine.catalog();
    println!(
        "{} players in the pool, {} retained; purse {} per team",
        engine.unassigned().len(),
        catalog.retentions().len(),
        engine.budget_limit()
    );
    for (idx, team) in catalog.teams().iter().enumerate() {
        println!("  {}. {} (captain: {})", idx + 1, team.name, team.captain);
    }
}

fn print_help() {
    println!("commands:");
    println!("  next                draw the next player by category priority");
    println!("  offer <name>        put a specific player on the block");
    println!("  take <team> <amt>   tentatively award the lot to a team");
    println!("  raise <team>        step a team's bid by the category increment");
    println!("  confirm             commit the pending award (alias: sold)");
    println!("  reopen              void the pending award, reopen bidding");
    println!("  unsold              pass the lot to a later round (alias: pass)");
    println!("  undo [name]         revert the most recent sale");
    println!("  board               show the scoreboard (alias: b)");
    println!("  json                dump the snapshot as JSON");
    println!("  finish              end the auction now");
    println!("  export [path]       write the results CSV");
    println!("  quit                exit");
}

/// Team tokens are a 1-based index from the startup listing or a
/// case-insensitive name.
fn resolve_team(engine: &AuctionEngine, token: &str) -> Option<TeamId> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    let teams = engine.catalog().teams();
    if let Ok(index) = token.parse::<usize>() {
        return teams.get(index.checked_sub(1)?).map(|t| t.id);
    }
    let wanted = token.to_lowercase();
    teams
        .iter()
        .find(|t| t.name.to_lowercase() == wanted)
        .map(|t| t.id)
}

fn player_name(engine: &AuctionEngine, player: PlayerId) -> String {
    engine
        .catalog()
        .player(player)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| player.to_string())
}

fn team_name(engine: &AuctionEngine, team: TeamId) -> String {
    engine
        .catalog()
        .team(team)
        .map(|t| t.name.clone())
        .unwrap_or_else(|| team.to_string())
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize tracing to log to a file (not the terminal, which is the
/// operator's console).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("auction-desk.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("auction_desk=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
