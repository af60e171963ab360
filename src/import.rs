//! Import of JSON game-data dumps
//!
//! Walks a directory for `*.json` files and classifies each one by file name:
//! `exchanges*.json`, `recipes*.json`, `buildings*.json`, `planets*.json`,
//! `templates*.json` and `preferences*.json`. Each file holds a JSON array of
//! the matching records. Records with malformed tickers are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::db;
use crate::models::{
    BuildingTemplate, ExchangeTicker, Planet, Preferences, ProductionTemplate, Recipe,
};

/// Kind of records a dump file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpKind {
    Exchanges,
    Recipes,
    Buildings,
    Planets,
    Templates,
    Preferences,
}

/// Recognizes dump files and material tickers
pub struct DumpClassifier {
    file_re: Regex,
    ticker_re: Regex,
}

impl DumpClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            file_re: Regex::new(
                r"^(exchanges|recipes|buildings|planets|templates|preferences)(?:[-_.][\w.-]*)?\.json$",
            )?,
            ticker_re: Regex::new(r"^[A-Z0-9]{1,3}$")?,
        })
    }

    pub fn classify(&self, path: &Path) -> Option<DumpKind> {
        let filename = path.file_name()?.to_str()?.to_ascii_lowercase();
        let cap = self.file_re.captures(&filename)?;
        match &cap[1] {
            "exchanges" => Some(DumpKind::Exchanges),
            "recipes" => Some(DumpKind::Recipes),
            "buildings" => Some(DumpKind::Buildings),
            "planets" => Some(DumpKind::Planets),
            "templates" => Some(DumpKind::Templates),
            "preferences" => Some(DumpKind::Preferences),
            _ => None,
        }
    }

    pub fn valid_ticker(&self, ticker: &str) -> bool {
        self.ticker_re.is_match(ticker)
    }

    fn valid_recipe(&self, recipe: &Recipe) -> bool {
        self.valid_ticker(&recipe.building_ticker)
            && recipe.duration_ms > 0.0
            && recipe
                .inputs
                .iter()
                .chain(&recipe.outputs)
                .all(|m| self.valid_ticker(&m.ticker))
    }

    fn valid_building(&self, building: &BuildingTemplate) -> bool {
        self.valid_ticker(&building.ticker)
            && building
                .construction_costs
                .iter()
                .all(|c| self.valid_ticker(&c.ticker))
    }

    fn valid_template(&self, template: &ProductionTemplate) -> bool {
        self.valid_ticker(&template.building)
            && template.amount > 0
            && template.habitation.iter().all(|h| self.valid_ticker(&h.building))
    }

    /// Every resource needs a ticker and a positive extraction rate
    fn valid_planet(&self, planet: &Planet) -> bool {
        !planet.natural_id.is_empty()
            && planet
                .resources
                .iter()
                .all(|r| self.valid_ticker(&r.ticker) && r.daily_extraction > 0.0)
    }
}

/// Find all dump files below a directory, in a stable order
pub fn find_dump_files(dir: &Path, classifier: &DumpClassifier) -> Vec<(PathBuf, DumpKind)> {
    let mut files: Vec<(PathBuf, DumpKind)> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let kind = classifier.classify(e.path())?;
            Some((e.into_path(), kind))
        })
        .collect();

    files.sort_by(|a, b| a.0.cmp(&b.0));
    files
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn import_file(
    conn: &Connection,
    classifier: &DumpClassifier,
    path: &Path,
    kind: DumpKind,
    stats: &mut ImportStats,
) -> Result<()> {
    match kind {
        DumpKind::Exchanges => {
            for exchange in read_records::<ExchangeTicker>(path)? {
                if !classifier.valid_ticker(&exchange.material_ticker)
                    || exchange.exchange_code.is_empty()
                {
                    warn!(ticker_id = %exchange.ticker_id(), "invalid exchange ticker skipped");
                    stats.invalid += 1;
                    continue;
                }
                db::upsert_exchange(conn, &exchange)?;
                stats.exchanges += 1;
            }
        }
        DumpKind::Recipes => {
            for recipe in read_records::<Recipe>(path)? {
                if !classifier.valid_recipe(&recipe) {
                    warn!(recipe = %recipe.id, "invalid recipe skipped");
                    stats.invalid += 1;
                    continue;
                }
                db::upsert_recipe(conn, &recipe)?;
                stats.recipes += 1;
            }
        }
        DumpKind::Buildings => {
            for building in read_records::<BuildingTemplate>(path)? {
                if !classifier.valid_building(&building) {
                    warn!(building = %building.ticker, "invalid building skipped");
                    stats.invalid += 1;
                    continue;
                }
                db::upsert_building(conn, &building)?;
                stats.buildings += 1;
            }
        }
        DumpKind::Planets => {
            for planet in read_records::<Planet>(path)? {
                if !classifier.valid_planet(&planet) {
                    warn!(planet = %planet.natural_id, "invalid planet skipped");
                    stats.invalid += 1;
                    continue;
                }
                db::upsert_planet(conn, &planet)?;
                stats.planets += 1;
            }
        }
        DumpKind::Templates => {
            for template in read_records::<ProductionTemplate>(path)? {
                if !classifier.valid_template(&template) {
                    warn!(template = %template.key(), "invalid template skipped");
                    stats.invalid += 1;
                    continue;
                }
                db::upsert_template(conn, &template)?;
                stats.templates += 1;
            }
        }
        DumpKind::Preferences => {
            for prefs in read_records::<Preferences>(path)? {
                db::save_preferences(conn, &prefs)?;
                stats.preference_sets += 1;
            }
        }
    }
    Ok(())
}

/// Import every dump file below `dir` into the database
pub fn import_directory(conn: &Connection, dir: &Path) -> Result<ImportStats> {
    let classifier = DumpClassifier::new()?;
    let mut stats = ImportStats::default();

    info!(dir = %dir.display(), "scanning for game data dumps");
    let files = find_dump_files(dir, &classifier);
    info!(count = files.len(), "found dump files");

    for (path, kind) in &files {
        match import_file(conn, &classifier, path, *kind, &mut stats) {
            Ok(()) => {
                stats.files += 1;
                info!(file = %path.display(), ?kind, "imported");
            }
            Err(e) => {
                warn!(file = %path.display(), error = %format!("{:#}", e), "import failed");
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub files: usize,
    pub exchanges: usize,
    pub recipes: usize,
    pub buildings: usize,
    pub planets: usize,
    pub templates: usize,
    pub preference_sets: usize,
    pub invalid: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} files: {} exchange tickers, {} recipes, {} buildings, {} planets, {} templates, {} preference sets. Invalid: {}, Errors: {}",
            self.files,
            self.exchanges,
            self.recipes,
            self.buildings,
            self.planets,
            self.templates,
            self.preference_sets,
            self.invalid,
            self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::GameData;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("prun-import-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn classifies_dump_files() {
        let c = DumpClassifier::new().unwrap();
        assert_eq!(c.classify(Path::new("a/exchanges.json")), Some(DumpKind::Exchanges));
        assert_eq!(c.classify(Path::new("Planets-2024-05.json")), Some(DumpKind::Planets));
        assert_eq!(c.classify(Path::new("recipes_full.json")), Some(DumpKind::Recipes));
        assert_eq!(c.classify(Path::new("recipes.txt")), None);
        assert_eq!(c.classify(Path::new("materials.json")), None);
        assert_eq!(c.classify(Path::new("myrecipes.json")), None);
    }

    #[test]
    fn ticker_shapes() {
        let c = DumpClassifier::new().unwrap();
        assert!(c.valid_ticker("O"));
        assert!(c.valid_ticker("H2O"));
        assert!(c.valid_ticker("RAT"));
        assert!(!c.valid_ticker("rat"));
        assert!(!c.valid_ticker("ABCD"));
        assert!(!c.valid_ticker(""));
    }

    #[test]
    fn imports_directory_and_skips_invalid() {
        let dir = scratch_dir("full");
        fs::create_dir_all(dir.join("market")).unwrap();
        fs::write(
            dir.join("market/exchanges.json"),
            r#"[
                {"material_ticker": "RAT", "exchange_code": "IC1", "vwap_daily": null,
                 "vwap_7d": 70.0, "vwap_30d": 75.0, "sum_traded_7d": 10.0, "sum_traded_30d": 40.0},
                {"material_ticker": "bad ticker", "exchange_code": "IC1", "vwap_daily": null,
                 "vwap_7d": null, "vwap_30d": null, "sum_traded_7d": 0.0, "sum_traded_30d": 0.0}
            ]"#,
        )
        .unwrap();
        fs::write(
            dir.join("planets.json"),
            r#"[{"natural_id": "OT-580b", "name": "Montem",
                 "environment": {"surface": true, "gravity": 1.0, "pressure": 1.0, "temperature": 20.0},
                 "resources": [{"ticker": "FEO", "resource_type": "MINERAL", "daily_extraction": 30.0}]}]"#,
        )
        .unwrap();
        fs::write(dir.join("recipes.json"), "not json").unwrap();
        fs::write(dir.join("notes.json"), "[]").unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let stats = import_directory(&conn, &dir).unwrap();

        assert_eq!(stats.files, 2);
        assert_eq!(stats.exchanges, 1);
        assert_eq!(stats.planets, 1);
        assert_eq!(stats.invalid, 1);
        assert_eq!(stats.errors, 1);

        let snapshot = db::load_snapshot(&conn).unwrap();
        assert!(snapshot.exchange_ticker("RAT.IC1").is_ok());
        assert!(snapshot.planet("OT-580b").unwrap().resource("FEO").is_some());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn zero_rate_planet_is_invalid() {
        let dir = scratch_dir("zero-rate");
        fs::write(
            dir.join("planets.json"),
            r#"[{"natural_id": "AB-123c", "name": "Barren",
                 "environment": {"surface": true, "gravity": 1.0, "pressure": 1.0,
                                 "temperature": 20.0},
                 "resources": [{"ticker": "FEO", "resource_type": "MINERAL",
                                "daily_extraction": 0.0}]}]"#,
        )
        .unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let stats = import_directory(&conn, &dir).unwrap();

        assert_eq!(stats.planets, 0);
        assert_eq!(stats.invalid, 1);
        assert!(db::load_snapshot(&conn).unwrap().planet("AB-123c").is_err());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn reimporting_templates_keeps_one_copy() {
        let dir = scratch_dir("templates");
        fs::write(
            dir.join("templates.json"),
            r#"[{"building": "EXT", "amount": 6,
                 "habitation": [{"building": "HB1", "amount": 2}]},
                {"building": "EXT", "amount": 6,
                 "habitation": [{"building": "HB1", "amount": 2}]},
                {"building": "col", "amount": 3}]"#,
        )
        .unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let first = import_directory(&conn, &dir).unwrap();
        let second = import_directory(&conn, &dir).unwrap();

        assert_eq!(first.templates, 2);
        assert_eq!(first.invalid, 1);
        assert_eq!(second.templates, 2);

        let snapshot = db::load_snapshot(&conn).unwrap();
        let templates = snapshot.production_templates();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].key(), "EXT-6+HB1x2");
        assert_eq!(templates[0].habitation.len(), 1);

        let _ = fs::remove_dir_all(&dir);
    }
}
