// Configuration loading and parsing (auction.toml, rules.toml).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Assembled configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub auction: AuctionSettings,
    pub rules: RulesConfig,
    pub data_paths: DataPaths,
    pub console: ConsoleConfig,
}

// ---------------------------------------------------------------------------
// auction.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire auction.toml file.
#[derive(Debug, Clone, Deserialize)]
struct AuctionFile {
    auction: AuctionSettings,
    data: DataPaths,
    #[serde(default)]
    console: ConsoleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuctionSettings {
    pub name: String,
    /// Shared purse every team starts with.
    pub budget_limit: u32,
    /// Squad size ceiling, retained players included.
    pub roster_cap: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub players: String,
    pub teams: String,
}

/// The `[console]` table is optional; omitting it disables the reveal
/// pause and exports next to the binary.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub reveal_delay_ms: u64,
    #[serde(default = "default_export_path")]
    pub export_path: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig {
            reveal_delay_ms: 0,
            export_path: default_export_path(),
        }
    }
}

fn default_export_path() -> String {
    "auction_result.csv".to_string()
}

// ---------------------------------------------------------------------------
// rules.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire rules.toml file.
#[derive(Debug, Clone, Deserialize)]
struct RulesFile {
    selection: SelectionSection,
    bidding: BiddingSection,
    limits: LimitsSection,
}

#[derive(Debug, Clone, Deserialize)]
struct SelectionSection {
    category_order: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct BiddingSection {
    default_increment: u32,
    #[serde(default)]
    increments: HashMap<String, u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct LimitsSection {
    #[serde(default)]
    category_maxima: HashMap<String, u32>,
}

/// The public bidding-rules config assembled from the rules.toml sections.
/// All category tags are normalized (trimmed, lowercased) on load.
#[derive(Debug, Clone)]
pub struct RulesConfig {
    /// Selection priority tiers, highest first. Order is significant.
    pub category_order: Vec<String>,
    pub default_increment: u32,
    pub increments: HashMap<String, u32>,
    /// Per-team ceilings. A maximum of 0 bars the category outright;
    /// unlisted categories are unrestricted.
    pub category_maxima: HashMap<String, u32>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/auction.toml` and
/// `config/rules.toml`, both relative to the given `base_dir`.
///
/// Lower-level seam that never touches `defaults/`; tests point it at
/// scratch directories. The binary goes through `load_config()` instead.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- auction.toml (required) ---
    let auction_path = config_dir.join("auction.toml");
    let auction_text = read_file(&auction_path)?;
    let auction_file: AuctionFile =
        toml::from_str(&auction_text).map_err(|e| ConfigError::ParseError {
            path: auction_path.clone(),
            source: e,
        })?;

    // --- rules.toml (required) ---
    let rules_path = config_dir.join("rules.toml");
    let rules_text = read_file(&rules_path)?;
    let rules_file: RulesFile =
        toml::from_str(&rules_text).map_err(|e| ConfigError::ParseError {
            path: rules_path.clone(),
            source: e,
        })?;

    let rules = RulesConfig {
        category_order: rules_file
            .selection
            .category_order
            .iter()
            .map(|c| normalize_tag(c))
            .collect(),
        default_increment: rules_file.bidding.default_increment,
        increments: normalize_table(rules_file.bidding.increments),
        category_maxima: normalize_table(rules_file.limits.category_maxima),
    };

    let config = Config {
        auction: auction_file.auction,
        rules,
        data_paths: auction_file.data,
        console: auction_file.console,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/` with any file from `defaults/` that the operator has not
/// already customized, skipping `.example` templates. Returns the paths
/// that were written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        // Nothing to seed from. That is fine as long as config/ is already
        // in place; with both directories missing the load step cannot
        // possibly succeed, so say so up front.
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither defaults/ nor config/ directory found in {}; \
                 run from the project root or ensure defaults/ is present",
                base_dir.display()
            ),
        });
    }

    let copy_failed = |message: String| ConfigError::DefaultsCopyError { message };

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_failed(format!("failed to create config directory: {e}")))?;

    let listing = std::fs::read_dir(&defaults_dir)
        .map_err(|e| copy_failed(format!("failed to read defaults directory: {e}")))?;

    let mut copied = Vec::new();
    for entry in listing {
        let source = entry
            .map_err(|e| copy_failed(format!("failed to read defaults entry: {e}")))?
            .path();
        if !source.is_file() {
            continue;
        }
        let Some(file_name) = source.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);
        // create_new keeps this race-free: an operator-edited file in
        // config/ is never clobbered.
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let body = std::fs::read(&source)
                    .map_err(|e| copy_failed(format!("failed to read {}: {e}", source.display())))?;
                std::io::Write::write_all(&mut dest, &body).map_err(|e| {
                    copy_failed(format!("failed to write {}: {e}", target.display()))
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(copy_failed(format!(
                    "failed to create {}: {e}",
                    target.display()
                )));
            }
        }
    }

    Ok(copied)
}

/// Load configuration relative to the working directory, seeding any
/// missing file from `defaults/` first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// Category tags are matched case-insensitively everywhere; normalize once.
fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

fn normalize_table(table: HashMap<String, u32>) -> HashMap<String, u32> {
    table
        .into_iter()
        .map(|(k, v)| (normalize_tag(&k), v))
        .collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    // Auction validations
    if config.auction.budget_limit == 0 {
        return Err(ConfigError::ValidationError {
            field: "auction.budget_limit".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.auction.roster_cap == 0 {
        return Err(ConfigError::ValidationError {
            field: "auction.roster_cap".into(),
            message: "must be greater than 0".into(),
        });
    }

    // Data path validations
    if config.data_paths.players.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data.players".into(),
            message: "must not be empty".into(),
        });
    }

    if config.data_paths.teams.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data.teams".into(),
            message: "must not be empty".into(),
        });
    }

    // Rules validations
    if config.rules.category_order.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "selection.category_order".into(),
            message: "must list at least one category".into(),
        });
    }

    if config.rules.category_order.iter().any(|c| c.is_empty()) {
        return Err(ConfigError::ValidationError {
            field: "selection.category_order".into(),
            message: "contains an empty category tag".into(),
        });
    }

    if config.rules.default_increment == 0 {
        return Err(ConfigError::ValidationError {
            field: "bidding.default_increment".into(),
            message: "must be greater than 0".into(),
        });
    }

    // Increments must step somewhere; maxima may be 0 (a barred category).
    let mut increments: Vec<_> = config.rules.increments.iter().collect();
    increments.sort();
    for (category, step) in increments {
        if *step == 0 {
            return Err(ConfigError::ValidationError {
                field: format!("bidding.increments.{category}"),
                message: "must be greater than 0".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    /// Repository root, located by the defaults/ directory (cargo test runs
    /// with the package root as the working directory).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        assert!(
            cwd.join("defaults").exists(),
            "defaults/ not found under {}",
            cwd.display()
        );
        cwd
    }

    /// Helper: fresh temp dir with config/ populated from defaults/.
    fn temp_config_dir(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let config_dir = tmp.join("config");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&config_dir).unwrap();

        let root = project_root();
        fs::copy(
            root.join("defaults/auction.toml"),
            config_dir.join("auction.toml"),
        )
        .unwrap();
        fs::copy(root.join("defaults/rules.toml"), config_dir.join("rules.toml")).unwrap();
        tmp
    }

    #[test]
    fn load_valid_config_from_project_files() {
        let root = project_root();
        ensure_config_files(&root).expect("should copy default configs");
        let config = load_config_from(&root).expect("should load valid config");

        // Auction assertions
        assert_eq!(config.auction.name, "Premier Cricket Auction");
        assert_eq!(config.auction.budget_limit, 100_000);
        assert_eq!(config.auction.roster_cap, 10);

        // Rules assertions
        assert_eq!(
            config.rules.category_order,
            vec![
                "new-to-game",
                "wk-bat-bowl",
                "best-batters-bowlers",
                "allrounders-1",
                "allrounders"
            ]
        );
        assert_eq!(config.rules.default_increment, 500);
        assert_eq!(config.rules.increments.get("allrounders"), Some(&2000));
        assert_eq!(config.rules.increments.get("allrounders-1"), Some(&1000));
        assert_eq!(config.rules.increments.get("new-to-game"), Some(&200));
        assert_eq!(config.rules.category_maxima.get("allrounders"), Some(&2));
        assert_eq!(
            config.rules.category_maxima.get("best-batters-bowlers"),
            Some(&2)
        );
        // Legacy pool is barred, not merely capped.
        assert_eq!(config.rules.category_maxima.get("allrounders-p"), Some(&0));

        // Paths and console settings
        assert_eq!(config.data_paths.players, "data/players.csv");
        assert_eq!(config.data_paths.teams, "data/teams.csv");
        assert_eq!(config.console.reveal_delay_ms, 800);
        assert_eq!(config.console.export_path, "auction_result.csv");
    }

    #[test]
    fn missing_console_section_uses_defaults() {
        let tmp = temp_config_dir("auction_config_no_console");
        let auction_toml = r#"
[auction]
name = "Test"
budget_limit = 100000
roster_cap = 10

[data]
players = "data/players.csv"
teams = "data/teams.csv"
"#;
        fs::write(tmp.join("config/auction.toml"), auction_toml).unwrap();

        let config = load_config_from(&tmp).expect("should load without [console]");
        assert_eq!(config.console.reveal_delay_ms, 0);
        assert_eq!(config.console.export_path, "auction_result.csv");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn category_tags_are_normalized_on_load() {
        let tmp = temp_config_dir("auction_config_normalize");
        let rules_toml = r#"
[selection]
category_order = ["  New-To-Game ", "Allrounders"]

[bidding]
default_increment = 500

[bidding.increments]
"Allrounders" = 2000

[limits.category_maxima]
"ALLROUNDERS" = 2
"#;
        fs::write(tmp.join("config/rules.toml"), rules_toml).unwrap();

        let config = load_config_from(&tmp).expect("should load");
        assert_eq!(
            config.rules.category_order,
            vec!["new-to-game", "allrounders"]
        );
        assert_eq!(config.rules.increments.get("allrounders"), Some(&2000));
        assert_eq!(config.rules.category_maxima.get("allrounders"), Some(&2));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_budget_limit_zero() {
        let tmp = temp_config_dir("auction_config_budget_zero");
        let text = fs::read_to_string(tmp.join("config/auction.toml")).unwrap();
        let modified = text.replace("budget_limit = 100000", "budget_limit = 0");
        fs::write(tmp.join("config/auction.toml"), modified).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "auction.budget_limit");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_roster_cap_zero() {
        let tmp = temp_config_dir("auction_config_cap_zero");
        let text = fs::read_to_string(tmp.join("config/auction.toml")).unwrap();
        let modified = text.replace("roster_cap = 10", "roster_cap = 0");
        fs::write(tmp.join("config/auction.toml"), modified).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "auction.roster_cap");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_category_order() {
        let tmp = temp_config_dir("auction_config_empty_order");
        let rules_toml = r#"
[selection]
category_order = []

[bidding]
default_increment = 500

[limits]
"#;
        fs::write(tmp.join("config/rules.toml"), rules_toml).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "selection.category_order");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_default_increment() {
        let tmp = temp_config_dir("auction_config_zero_step");
        let text = fs::read_to_string(tmp.join("config/rules.toml")).unwrap();
        let modified = text.replace("default_increment = 500", "default_increment = 0");
        fs::write(tmp.join("config/rules.toml"), modified).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "bidding.default_increment");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_increment_entry() {
        let tmp = temp_config_dir("auction_config_zero_entry");
        let text = fs::read_to_string(tmp.join("config/rules.toml")).unwrap();
        let modified = text.replace("new-to-game = 200", "new-to-game = 0");
        fs::write(tmp.join("config/rules.toml"), modified).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "bidding.increments.new-to-game");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn zero_category_maximum_is_allowed() {
        // A maximum of 0 bars the category; it must not be rejected the way
        // a zero increment is.
        let tmp = temp_config_dir("auction_config_zero_max");
        let config = load_config_from(&tmp).expect("defaults include a barred category");
        assert_eq!(config.rules.category_maxima.get("allrounders-p"), Some(&0));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_auction_toml() {
        let tmp = temp_config_dir("auction_config_missing_auction");
        fs::remove_file(tmp.join("config/auction.toml")).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::FileNotFound { path } => {
                assert!(path.ends_with("auction.toml"));
            }
            other => panic!("expected FileNotFound, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_rules_toml() {
        let tmp = temp_config_dir("auction_config_missing_rules");
        fs::remove_file(tmp.join("config/rules.toml")).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::FileNotFound { path } => {
                assert!(path.ends_with("rules.toml"));
            }
            other => panic!("expected FileNotFound, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = temp_config_dir("auction_config_invalid_toml");
        fs::write(
            tmp.join("config/auction.toml"),
            "this is not valid [[[ toml",
        )
        .unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ParseError { path, .. } => {
                assert!(path.ends_with("auction.toml"));
            }
            other => panic!("expected ParseError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_files() {
        let tmp = std::env::temp_dir().join("auction_config_ensure_copies");
        let _ = fs::remove_dir_all(&tmp);

        // Create defaults/ with auction.toml and rules.toml
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();

        let root = project_root();
        fs::copy(
            root.join("defaults/auction.toml"),
            defaults_dir.join("auction.toml"),
        )
        .unwrap();
        fs::copy(root.join("defaults/rules.toml"), defaults_dir.join("rules.toml")).unwrap();
        // Templates stay behind; only real config files are seeded.
        fs::write(
            defaults_dir.join("auction.toml.example"),
            "# template only\n",
        )
        .unwrap();

        assert!(!tmp.join("config").exists());

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 2);

        assert!(tmp.join("config/auction.toml").exists());
        assert!(tmp.join("config/rules.toml").exists());
        assert!(!tmp.join("config/auction.toml.example").exists());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let tmp = std::env::temp_dir().join("auction_config_ensure_skips");
        let _ = fs::remove_dir_all(&tmp);

        let defaults_dir = tmp.join("defaults");
        let config_dir = tmp.join("config");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::create_dir_all(&config_dir).unwrap();

        let root = project_root();
        fs::copy(
            root.join("defaults/auction.toml"),
            defaults_dir.join("auction.toml"),
        )
        .unwrap();
        fs::copy(root.join("defaults/rules.toml"), defaults_dir.join("rules.toml")).unwrap();

        // An operator-edited auction.toml is already in place.
        fs::write(config_dir.join("auction.toml"), "# custom\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1, "only the missing rules.toml is seeded");
        assert!(copied[0].ends_with("rules.toml"));

        let content = fs::read_to_string(config_dir.join("auction.toml")).unwrap();
        assert_eq!(content, "# custom\n", "the edited file survives untouched");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_no_defaults_dir_is_ok() {
        let tmp = std::env::temp_dir().join("auction_config_no_defaults");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        // With config/ present a missing defaults/ only means there is
        // nothing to seed.
        fs::create_dir_all(tmp.join("config")).unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert!(copied.is_empty());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("auction_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_files(&tmp).unwrap_err();
        match &err {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
