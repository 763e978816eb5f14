// Roster sheet loading and normalization.
//
// Reads the operator's players and teams CSVs. The sheets come from
// spreadsheet exports with no fixed heading convention ("Base Price",
// "base_price", "BASEPRICE"), so headers are normalized before column
// aliases are matched, and cell values are trimmed.

use crate::catalog::{Player, PlayerId, Team, TeamId};
use crate::config::{Config, DataPaths};
use std::io::Read;
use std::path::Path;
use tracing::warn;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// All roster data loaded and ready for the engine.
#[derive(Debug, Clone)]
pub struct RosterData {
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Header matching
// ---------------------------------------------------------------------------

/// Normalize a CSV heading for alias matching: trimmed, lowercased, spaces
/// and underscores stripped ("Base Price" == "base_price" == "BASEPRICE").
fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace([' ', '_'], "")
}

/// Index of the first header matching any of the given normalized aliases.
fn find_column(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.contains(&normalize_header(h).as_str()))
}

fn field<'r>(record: &'r csv::StringRecord, column: Option<usize>) -> Option<&'r str> {
    column.and_then(|idx| record.get(idx))
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let headers = reader.headers()?.clone();

    let name_col = find_column(&headers, &["name", "playername"]);
    let role_col = find_column(&headers, &["role", "playerrole"]);
    let category_col = find_column(&headers, &["category", "playercategory", "set"]);
    let price_col = find_column(&headers, &["baseprice"]);
    let photo_col = find_column(&headers, &["photo", "photourl", "image", "imageurl"]);

    if name_col.is_none() || role_col.is_none() || price_col.is_none() {
        warn!("players CSV is missing a name, role, or base price column; no rows will load");
        return Ok(Vec::new());
    }

    let mut players = Vec::new();
    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
                continue;
            }
        };

        let name = field(&record, name_col).map(str::trim).unwrap_or("");
        if name.is_empty() {
            warn!("skipping player row with no name");
            continue;
        }

        let price_text = field(&record, price_col).map(str::trim).unwrap_or("");
        let base_price = match price_text.parse::<u32>() {
            Ok(p) if p > 0 => p,
            Ok(_) => {
                warn!("skipping player '{}': base price must be positive", name);
                continue;
            }
            Err(_) => {
                warn!(
                    "skipping player '{}': unreadable base price '{}'",
                    name, price_text
                );
                continue;
            }
        };

        let role = field(&record, role_col).map(str::trim).unwrap_or("");
        if role.is_empty() {
            warn!("skipping player '{}': no role", name);
            continue;
        }

        let category = field(&record, category_col);
        let photo = field(&record, photo_col)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        // Ids follow valid-row order; skipped rows never consume one.
        let id = PlayerId(players.len() as u32);
        players.push(Player::new(id, name, role, category, base_price, photo));
    }
    Ok(players)
}

fn load_teams_from_reader<R: Read>(rdr: R) -> Result<Vec<Team>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let headers = reader.headers()?.clone();

    let name_col = find_column(&headers, &["teamname", "team", "name"]);
    let captain_col = find_column(&headers, &["captain", "captainname"]);
    let vice_col = find_column(&headers, &["vicecaptain", "vc", "vicecaptainname"]);

    if name_col.is_none() {
        warn!("teams CSV is missing a team name column; no rows will load");
        return Ok(Vec::new());
    }

    let mut teams = Vec::new();
    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping malformed team row: {}", e);
                continue;
            }
        };

        let name = field(&record, name_col).map(str::trim).unwrap_or("");
        if name.is_empty() {
            warn!("skipping team row with no name");
            continue;
        }

        let captain = field(&record, captain_col)
            .map(str::trim)
            .unwrap_or("")
            .to_string();
        let vice_captain = field(&record, vice_col)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        teams.push(Team {
            id: TeamId(teams.len() as u32),
            name: name.to_string(),
            captain,
            vice_captain,
        });
    }
    Ok(teams)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Load auction players from a CSV file.
pub fn load_players(path: &Path) -> Result<Vec<Player>, IngestError> {
    let file = std::fs::File::open(path).map_err(|e| IngestError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_players_from_reader(file).map_err(|e| IngestError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load bidding teams from a CSV file.
pub fn load_teams(path: &Path) -> Result<Vec<Team>, IngestError> {
    let file = std::fs::File::open(path).map_err(|e| IngestError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_teams_from_reader(file).map_err(|e| IngestError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load all roster data using paths from the config.
pub fn load_all(config: &Config) -> Result<RosterData, IngestError> {
    load_all_from_paths(&config.data_paths)
}

/// Load all roster data from explicit paths. Exposed for testing and flexibility.
pub fn load_all_from_paths(paths: &DataPaths) -> Result<RosterData, IngestError> {
    let players = load_players(Path::new(&paths.players))?;
    let teams = load_teams(Path::new(&paths.teams))?;

    if players.is_empty() {
        return Err(IngestError::Validation(
            "players CSV produced zero valid rows".into(),
        ));
    }
    if teams.is_empty() {
        return Err(IngestError::Validation(
            "teams CSV produced zero valid rows".into(),
        ));
    }

    Ok(RosterData { players, teams })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
