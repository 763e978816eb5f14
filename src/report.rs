// Scoreboard rendering and the final results export.
//
// Both read the engine's `AuctionSnapshot`; nothing here touches engine
// state. The CSV export is one row per team plus a trailing row for
// players left unassigned, whose base-price total lands in the spend
// column and is billed to no one.

use std::io::Write;
use std::path::Path;

use crate::auction::{AuctionPhase, AuctionSnapshot, TeamSnapshot};
use crate::catalog::RetainedSlot;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

const EXPORT_HEADERS: [&str; 10] = [
    "Team Name",
    "Captain",
    "Vice Captain",
    "Squad Size",
    "Players",
    "Roles",
    "Categories",
    "Total Spend",
    "Budget Remaining",
    "Budget Spent",
];

/// Name as it appears in the export, with the retained slot marked.
fn slot_label(name: &str, retained: Option<RetainedSlot>) -> String {
    match retained {
        Some(slot) => format!("{name} ({slot})"),
        None => name.to_string(),
    }
}

fn team_row(team: &TeamSnapshot) -> Vec<String> {
    let players: Vec<String> = team
        .squad
        .iter()
        .map(|s| slot_label(&s.name, s.retained))
        .collect();
    let roles: Vec<&str> = team.squad.iter().map(|s| s.role.as_str()).collect();
    let categories: Vec<&str> = team.squad.iter().map(|s| s.category.as_str()).collect();
    let spend: u32 = team.squad.iter().map(|s| s.price).sum();

    vec![
        team.name.clone(),
        team.captain.clone(),
        team.vice_captain.clone().unwrap_or_else(|| "-".to_string()),
        team.squad.len().to_string(),
        players.join("; "),
        roles.join("; "),
        categories.join("; "),
        spend.to_string(),
        team.budget_remaining.to_string(),
        team.budget_spent.to_string(),
    ]
}

fn unassigned_row(snapshot: &AuctionSnapshot) -> Vec<String> {
    let names: Vec<&str> = snapshot.unassigned.iter().map(|u| u.name.as_str()).collect();
    let roles: Vec<&str> = snapshot.unassigned.iter().map(|u| u.role.as_str()).collect();
    let categories: Vec<&str> = snapshot
        .unassigned
        .iter()
        .map(|u| u.category.as_str())
        .collect();
    let base_total: u32 = snapshot.unassigned.iter().map(|u| u.base_price).sum();

    vec![
        "Unassigned Players".to_string(),
        "-".to_string(),
        "-".to_string(),
        snapshot.unassigned.len().to_string(),
        names.join("; "),
        roles.join("; "),
        categories.join("; "),
        base_total.to_string(),
        String::new(),
        String::new(),
    ]
}

fn write_export<W: Write>(snapshot: &AuctionSnapshot, wtr: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(wtr);
    writer.write_record(EXPORT_HEADERS)?;
    for team in &snapshot.teams {
        writer.write_record(team_row(team))?;
    }
    if !snapshot.unassigned.is_empty() {
        writer.write_record(unassigned_row(snapshot))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the final results CSV to `path`.
pub fn export_csv(snapshot: &AuctionSnapshot, path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| ReportError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
        }
    }
    let file = std::fs::File::create(path).map_err(|e| ReportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    write_export(snapshot, file).map_err(|e| ReportError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Scoreboard
// ---------------------------------------------------------------------------

/// Render the snapshot as the console scoreboard.
pub fn render_scoreboard(snapshot: &AuctionSnapshot) -> String {
    let phase = match snapshot.phase {
        AuctionPhase::Bidding => "bidding",
        AuctionPhase::Complete => "complete",
    };
    let mut out = String::new();
    out.push_str(&format!(
        "round {} | {} | {} unassigned\n",
        snapshot.round,
        phase,
        snapshot.unassigned.len()
    ));

    for team in &snapshot.teams {
        out.push('\n');
        out.push_str(&format!(
            "{:<24} spent {} / {} (remaining {})\n",
            team.name, team.budget_spent, snapshot.budget_limit, team.budget_remaining
        ));
        if team.squad.is_empty() {
            out.push_str("  (no players)\n");
        }
        for slot in &team.squad {
            let marker = match slot.retained {
                Some(s) => s.to_string(),
                None => String::new(),
            };
            out.push_str(&format!(
                "  {:<3} {:<24} {:<20} {:>8}\n",
                marker, slot.name, slot.role, slot.price
            ));
        }
        if !team.category_counts.is_empty() {
            let counts: Vec<String> = team
                .category_counts
                .iter()
                .map(|(category, count)| format!("{category} {count}"))
                .collect();
            out.push_str(&format!("  categories: {}\n", counts.join(", ")));
        }
    }

    if !snapshot.unassigned.is_empty() {
        let names: Vec<&str> = snapshot.unassigned.iter().map(|u| u.name.as_str()).collect();
        out.push_str(&format!(
            "\nunassigned ({}): {}\n",
            snapshot.unassigned.len(),
            names.join(", ")
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
