//! Database schema and operations

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

use crate::models::{
    BuildingTemplate, ExchangePreference, ExchangeTicker, Planet, PlanetEnvironment,
    PlanetResource, Preferences, ProductionTemplate, Recipe, RecipeMaterial, ResourceType,
    TemplateHabitation, TickerPreference,
};
use crate::repository::GameSnapshot;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Market data per material and exchange, keyed by e.g. RAT.IC1
        CREATE TABLE IF NOT EXISTS exchanges (
            ticker_id TEXT PRIMARY KEY,
            material_ticker TEXT NOT NULL,
            exchange_code TEXT NOT NULL,
            vwap_daily REAL,
            vwap_7d REAL,
            vwap_30d REAL,
            sum_traded_7d REAL NOT NULL DEFAULT 0,
            sum_traded_30d REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS recipes (
            id TEXT PRIMARY KEY,
            building_ticker TEXT NOT NULL,
            duration_ms REAL NOT NULL
        );

        -- is_output = 0 for inputs, 1 for outputs
        CREATE TABLE IF NOT EXISTS recipe_materials (
            recipe_id TEXT NOT NULL,
            ticker TEXT NOT NULL,
            amount REAL NOT NULL,
            is_output INTEGER NOT NULL,
            PRIMARY KEY (recipe_id, ticker, is_output)
        );

        CREATE TABLE IF NOT EXISTS buildings (
            ticker TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            area_cost REAL NOT NULL,
            expertise TEXT
        );

        CREATE TABLE IF NOT EXISTS building_costs (
            building_ticker TEXT NOT NULL,
            ticker TEXT NOT NULL,
            amount REAL NOT NULL,
            PRIMARY KEY (building_ticker, ticker)
        );

        CREATE TABLE IF NOT EXISTS planets (
            natural_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            surface INTEGER NOT NULL,
            gravity REAL NOT NULL,
            pressure REAL NOT NULL,
            temperature REAL NOT NULL,
            cogc_program TEXT
        );

        CREATE TABLE IF NOT EXISTS planet_resources (
            planet_id TEXT NOT NULL,
            ticker TEXT NOT NULL,
            resource_type TEXT NOT NULL,
            daily_extraction REAL NOT NULL,
            PRIMARY KEY (planet_id, ticker)
        );

        -- template_key is e.g. EXT-6+HB1x2, one row per distinct layout
        CREATE TABLE IF NOT EXISTS production_templates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            template_key TEXT NOT NULL UNIQUE,
            building TEXT NOT NULL,
            amount INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS template_habitation (
            template_id INTEGER NOT NULL,
            building TEXT NOT NULL,
            amount INTEGER NOT NULL
        );

        -- planet_id NULL means empire scope
        CREATE TABLE IF NOT EXISTS ticker_preferences (
            set_name TEXT NOT NULL,
            planet_id TEXT,
            ticker TEXT NOT NULL,
            direction TEXT NOT NULL,
            value REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS exchange_preferences (
            set_name TEXT NOT NULL,
            planet_id TEXT,
            direction TEXT NOT NULL,
            exchange TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS preference_sets (
            name TEXT PRIMARY KEY
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_materials_recipe ON recipe_materials(recipe_id);
        CREATE INDEX IF NOT EXISTS idx_planet_resources_ticker ON planet_resources(ticker);
        "#,
    )?;
    Ok(())
}

/// Clear all imported game data (for re-import). Preferences are kept.
pub fn clear_game_data(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM template_habitation;
        DELETE FROM production_templates;
        DELETE FROM planet_resources;
        DELETE FROM planets;
        DELETE FROM building_costs;
        DELETE FROM buildings;
        DELETE FROM recipe_materials;
        DELETE FROM recipes;
        DELETE FROM exchanges;
        "#,
    )?;
    Ok(())
}

/// Insert or replace exchange data
pub fn upsert_exchange(conn: &Connection, exchange: &ExchangeTicker) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO exchanges
            (ticker_id, material_ticker, exchange_code, vwap_daily, vwap_7d, vwap_30d, sum_traded_7d, sum_traded_30d)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            exchange.ticker_id(),
            &exchange.material_ticker,
            &exchange.exchange_code,
            exchange.vwap_daily,
            exchange.vwap_7d,
            exchange.vwap_30d,
            exchange.sum_traded_7d,
            exchange.sum_traded_30d,
        ),
    )?;
    Ok(())
}

/// Insert or replace a recipe with its materials
pub fn upsert_recipe(conn: &Connection, recipe: &Recipe) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO recipes (id, building_ticker, duration_ms) VALUES (?1, ?2, ?3)",
        (&recipe.id, &recipe.building_ticker, recipe.duration_ms),
    )?;
    conn.execute("DELETE FROM recipe_materials WHERE recipe_id = ?1", [&recipe.id])?;

    let materials = recipe
        .inputs
        .iter()
        .map(|m| (m, false))
        .chain(recipe.outputs.iter().map(|m| (m, true)));
    for (material, is_output) in materials {
        conn.execute(
            "INSERT OR REPLACE INTO recipe_materials (recipe_id, ticker, amount, is_output)
             VALUES (?1, ?2, ?3, ?4)",
            (&recipe.id, &material.ticker, material.amount, is_output),
        )?;
    }
    Ok(())
}

/// Insert or replace a building with its construction costs
pub fn upsert_building(conn: &Connection, building: &BuildingTemplate) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO buildings (ticker, name, area_cost, expertise) VALUES (?1, ?2, ?3, ?4)",
        (&building.ticker, &building.name, building.area_cost, &building.expertise),
    )?;
    conn.execute(
        "DELETE FROM building_costs WHERE building_ticker = ?1",
        [&building.ticker],
    )?;
    for cost in &building.construction_costs {
        conn.execute(
            "INSERT OR REPLACE INTO building_costs (building_ticker, ticker, amount) VALUES (?1, ?2, ?3)",
            (&building.ticker, &cost.ticker, cost.amount),
        )?;
    }
    Ok(())
}

/// Insert or replace a planet with its resources
pub fn upsert_planet(conn: &Connection, planet: &Planet) -> Result<()> {
    let env = &planet.environment;
    conn.execute(
        "INSERT OR REPLACE INTO planets (natural_id, name, surface, gravity, pressure, temperature, cogc_program)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            &planet.natural_id,
            &planet.name,
            env.surface,
            env.gravity,
            env.pressure,
            env.temperature,
            &planet.cogc_program,
        ),
    )?;
    conn.execute(
        "DELETE FROM planet_resources WHERE planet_id = ?1",
        [&planet.natural_id],
    )?;
    for resource in &planet.resources {
        conn.execute(
            "INSERT OR REPLACE INTO planet_resources (planet_id, ticker, resource_type, daily_extraction)
             VALUES (?1, ?2, ?3, ?4)",
            (
                &planet.natural_id,
                &resource.ticker,
                resource.resource_type.as_str(),
                resource.daily_extraction,
            ),
        )?;
    }
    Ok(())
}

/// Insert or replace a production template, matched on its building layout
pub fn upsert_template(conn: &Connection, template: &ProductionTemplate) -> Result<()> {
    let key = template.key();
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM production_templates WHERE template_key = ?1",
            [&key],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        conn.execute("DELETE FROM template_habitation WHERE template_id = ?1", [id])?;
        conn.execute("DELETE FROM production_templates WHERE id = ?1", [id])?;
    }

    conn.execute(
        "INSERT INTO production_templates (template_key, building, amount) VALUES (?1, ?2, ?3)",
        (&key, &template.building, template.amount),
    )?;
    let template_id = conn.last_insert_rowid();
    for hab in &template.habitation {
        conn.execute(
            "INSERT INTO template_habitation (template_id, building, amount) VALUES (?1, ?2, ?3)",
            (template_id, &hab.building, hab.amount),
        )?;
    }
    Ok(())
}

/// Replace a named preference set
pub fn save_preferences(conn: &Connection, prefs: &Preferences) -> Result<()> {
    conn.execute("DELETE FROM ticker_preferences WHERE set_name = ?1", [&prefs.name])?;
    conn.execute("DELETE FROM exchange_preferences WHERE set_name = ?1", [&prefs.name])?;
    conn.execute(
        "INSERT OR REPLACE INTO preference_sets (name) VALUES (?1)",
        [&prefs.name],
    )?;

    let tickers = prefs
        .empire_tickers
        .iter()
        .map(|p| (None, p))
        .chain(
            prefs
                .planet_tickers
                .iter()
                .flat_map(|(planet, list)| list.iter().map(move |p| (Some(planet), p))),
        );
    for (planet, pref) in tickers {
        conn.execute(
            "INSERT INTO ticker_preferences (set_name, planet_id, ticker, direction, value)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (&prefs.name, planet, &pref.ticker, pref.direction.as_str(), pref.value),
        )?;
    }

    let exchanges = prefs
        .empire_exchanges
        .iter()
        .map(|p| (None, p))
        .chain(
            prefs
                .planet_exchanges
                .iter()
                .flat_map(|(planet, list)| list.iter().map(move |p| (Some(planet), p))),
        );
    for (planet, pref) in exchanges {
        conn.execute(
            "INSERT INTO exchange_preferences (set_name, planet_id, direction, exchange)
             VALUES (?1, ?2, ?3, ?4)",
            (&prefs.name, planet, pref.direction.as_str(), pref.exchange.to_string()),
        )?;
    }
    Ok(())
}

/// Load every table into an in-memory snapshot
pub fn load_snapshot(conn: &Connection) -> Result<GameSnapshot> {
    let mut snapshot = GameSnapshot::new();

    for exchange in load_exchanges(conn)? {
        snapshot.add_exchange(exchange);
    }
    for recipe in load_recipes(conn)? {
        snapshot.add_recipe(recipe);
    }
    for building in load_buildings(conn)? {
        snapshot.add_building(building);
    }
    for planet in load_planets(conn)? {
        snapshot.add_planet(planet);
    }
    for template in load_templates(conn)? {
        snapshot.add_template(template);
    }
    for prefs in load_preferences(conn)? {
        snapshot.add_preferences(prefs);
    }

    Ok(snapshot)
}

fn load_exchanges(conn: &Connection) -> Result<Vec<ExchangeTicker>> {
    let mut stmt = conn.prepare(
        "SELECT material_ticker, exchange_code, vwap_daily, vwap_7d, vwap_30d, sum_traded_7d, sum_traded_30d
         FROM exchanges",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(ExchangeTicker {
            material_ticker: row.get(0)?,
            exchange_code: row.get(1)?,
            vwap_daily: row.get(2)?,
            vwap_7d: row.get(3)?,
            vwap_30d: row.get(4)?,
            sum_traded_7d: row.get(5)?,
            sum_traded_30d: row.get(6)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

fn load_recipes(conn: &Connection) -> Result<Vec<Recipe>> {
    let mut stmt =
        conn.prepare("SELECT id, building_ticker, duration_ms FROM recipes ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(Recipe {
            id: row.get(0)?,
            building_ticker: row.get(1)?,
            duration_ms: row.get(2)?,
            inputs: Vec::new(),
            outputs: Vec::new(),
        })
    })?;

    let mut recipes: Vec<Recipe> = Vec::new();
    for row in rows {
        recipes.push(row?);
    }

    let mut stmt = conn.prepare(
        "SELECT recipe_id, ticker, amount, is_output FROM recipe_materials ORDER BY recipe_id, ticker",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            RecipeMaterial {
                ticker: row.get(1)?,
                amount: row.get(2)?,
            },
            row.get::<_, bool>(3)?,
        ))
    })?;

    let index: HashMap<String, usize> = recipes
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.clone(), i))
        .collect();
    for row in rows {
        let (recipe_id, material, is_output) = row?;
        let Some(&i) = index.get(&recipe_id) else {
            continue;
        };
        if is_output {
            recipes[i].outputs.push(material);
        } else {
            recipes[i].inputs.push(material);
        }
    }

    Ok(recipes)
}

fn load_buildings(conn: &Connection) -> Result<Vec<BuildingTemplate>> {
    let mut stmt =
        conn.prepare("SELECT ticker, name, area_cost, expertise FROM buildings ORDER BY ticker")?;
    let rows = stmt.query_map([], |row| {
        Ok(BuildingTemplate {
            ticker: row.get(0)?,
            name: row.get(1)?,
            area_cost: row.get(2)?,
            expertise: row.get(3)?,
            construction_costs: Vec::new(),
        })
    })?;

    let mut buildings = Vec::new();
    for row in rows {
        buildings.push(row?);
    }

    let mut stmt = conn.prepare(
        "SELECT building_ticker, ticker, amount FROM building_costs ORDER BY ticker",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            RecipeMaterial {
                ticker: row.get(1)?,
                amount: row.get(2)?,
            },
        ))
    })?;
    for row in rows {
        let (building_ticker, cost) = row?;
        if let Some(b) = buildings.iter_mut().find(|b| b.ticker == building_ticker) {
            b.construction_costs.push(cost);
        }
    }

    Ok(buildings)
}

fn load_planets(conn: &Connection) -> Result<Vec<Planet>> {
    let mut stmt = conn.prepare(
        "SELECT natural_id, name, surface, gravity, pressure, temperature, cogc_program
         FROM planets ORDER BY natural_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Planet {
            natural_id: row.get(0)?,
            name: row.get(1)?,
            environment: PlanetEnvironment {
                surface: row.get(2)?,
                gravity: row.get(3)?,
                pressure: row.get(4)?,
                temperature: row.get(5)?,
            },
            cogc_program: row.get(6)?,
            resources: Vec::new(),
        })
    })?;

    let mut planets = Vec::new();
    for row in rows {
        planets.push(row?);
    }

    let mut stmt = conn.prepare(
        "SELECT planet_id, ticker, resource_type, daily_extraction FROM planet_resources ORDER BY ticker",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, f64>(3)?,
        ))
    })?;

    let index: HashMap<String, usize> = planets
        .iter()
        .enumerate()
        .map(|(i, p)| (p.natural_id.clone(), i))
        .collect();
    for row in rows {
        let (planet_id, ticker, resource_type, daily_extraction) = row?;
        let resource_type: ResourceType = resource_type
            .parse()
            .map_err(|e: String| anyhow!(e))
            .with_context(|| format!("planet {} resource {}", planet_id, ticker))?;
        if let Some(&i) = index.get(&planet_id) {
            planets[i].resources.push(PlanetResource {
                ticker,
                resource_type,
                daily_extraction,
            });
        }
    }

    Ok(planets)
}

fn load_templates(conn: &Connection) -> Result<Vec<ProductionTemplate>> {
    let mut stmt =
        conn.prepare("SELECT id, building, amount FROM production_templates ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            ProductionTemplate {
                building: row.get(1)?,
                amount: row.get(2)?,
                habitation: Vec::new(),
            },
        ))
    })?;

    let mut templates = Vec::new();
    for row in rows {
        templates.push(row?);
    }

    let mut stmt = conn.prepare(
        "SELECT template_id, building, amount FROM template_habitation ORDER BY building",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            TemplateHabitation {
                building: row.get(1)?,
                amount: row.get(2)?,
            },
        ))
    })?;
    for row in rows {
        let (template_id, hab) = row?;
        if let Some((_, t)) = templates.iter_mut().find(|(id, _)| *id == template_id) {
            t.habitation.push(hab);
        }
    }

    Ok(templates.into_iter().map(|(_, t)| t).collect())
}

fn load_preferences(conn: &Connection) -> Result<Vec<Preferences>> {
    let mut stmt = conn.prepare("SELECT name FROM preference_sets ORDER BY name")?;
    let names = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut sets: Vec<Preferences> = Vec::new();
    for name in names {
        sets.push(Preferences {
            name: name?,
            ..Default::default()
        });
    }

    let mut stmt = conn.prepare(
        "SELECT set_name, planet_id, ticker, direction, value FROM ticker_preferences ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, f64>(4)?,
        ))
    })?;
    for row in rows {
        let (set_name, planet, ticker, direction, value) = row?;
        let Some(set) = sets.iter_mut().find(|s| s.name == set_name) else {
            continue;
        };
        let pref = TickerPreference {
            ticker,
            direction: direction.parse().map_err(|e: String| anyhow!(e))?,
            value,
        };
        match planet {
            Some(planet) => set.planet_tickers.entry(planet).or_default().push(pref),
            None => set.empire_tickers.push(pref),
        }
    }

    let mut stmt = conn.prepare(
        "SELECT set_name, planet_id, direction, exchange FROM exchange_preferences ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;
    for row in rows {
        let (set_name, planet, direction, exchange) = row?;
        let Some(set) = sets.iter_mut().find(|s| s.name == set_name) else {
            continue;
        };
        let pref = ExchangePreference {
            direction: direction.parse().map_err(|e: String| anyhow!(e))?,
            exchange: exchange.parse()?,
        };
        match planet {
            Some(planet) => set.planet_exchanges.entry(planet).or_default().push(pref),
            None => set.empire_exchanges.push(pref),
        }
    }

    Ok(sets)
}

/// Row counts per table, for status output
pub fn table_counts(conn: &Connection) -> Result<Vec<(&'static str, i64)>> {
    let tables = [
        "exchanges",
        "recipes",
        "buildings",
        "planets",
        "production_templates",
        "preference_sets",
    ];
    let mut counts = Vec::new();
    for table in tables {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        counts.push((table, count));
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PreferenceDirection, Timeframe};
    use crate::repository::GameData;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn snapshot_round_trip() {
        let conn = conn();
        upsert_exchange(
            &conn,
            &ExchangeTicker {
                material_ticker: "RAT".to_string(),
                exchange_code: "IC1".to_string(),
                vwap_daily: None,
                vwap_7d: Some(70.0),
                vwap_30d: Some(75.0),
                sum_traded_7d: 1000.0,
                sum_traded_30d: 5000.0,
            },
        )
        .unwrap();
        upsert_recipe(
            &conn,
            &Recipe {
                id: "FP#RAT".to_string(),
                building_ticker: "FP".to_string(),
                duration_ms: 21_600_000.0,
                inputs: vec![RecipeMaterial { ticker: "ALG".to_string(), amount: 4.0 }],
                outputs: vec![RecipeMaterial { ticker: "RAT".to_string(), amount: 10.0 }],
            },
        )
        .unwrap();
        upsert_planet(
            &conn,
            &Planet {
                natural_id: "OT-580b".to_string(),
                name: "Montem".to_string(),
                environment: PlanetEnvironment {
                    surface: true,
                    gravity: 1.0,
                    pressure: 1.0,
                    temperature: 20.0,
                },
                cogc_program: Some("RESOURCE_EXTRACTION".to_string()),
                resources: vec![PlanetResource {
                    ticker: "FEO".to_string(),
                    resource_type: ResourceType::Mineral,
                    daily_extraction: 30.0,
                }],
            },
        )
        .unwrap();
        upsert_template(
            &conn,
            &ProductionTemplate {
                building: "EXT".to_string(),
                amount: 4,
                habitation: vec![TemplateHabitation { building: "HB1".to_string(), amount: 2 }],
            },
        )
        .unwrap();

        let snapshot = load_snapshot(&conn).unwrap();
        assert_eq!(snapshot.exchange_ticker("RAT.IC1").unwrap().vwap_7d, Some(70.0));
        let recipe = snapshot.recipe("FP#RAT").unwrap();
        assert_eq!(recipe.inputs.len(), 1);
        assert_eq!(recipe.outputs[0].amount, 10.0);
        let planet = snapshot.planet("OT-580b").unwrap();
        assert_eq!(planet.resources[0].resource_type, ResourceType::Mineral);
        assert_eq!(snapshot.production_templates()[0].habitation[0].amount, 2);
    }

    #[test]
    fn preferences_round_trip() {
        let conn = conn();
        let mut prefs = Preferences {
            name: "main".to_string(),
            empire_tickers: vec![TickerPreference {
                ticker: "RAT".to_string(),
                direction: PreferenceDirection::Both,
                value: 120.0,
            }],
            empire_exchanges: vec![ExchangePreference {
                direction: PreferenceDirection::Buy,
                exchange: "NC1_7D".parse().unwrap(),
            }],
            ..Default::default()
        };
        prefs.planet_tickers.insert(
            "OT-580b".to_string(),
            vec![TickerPreference {
                ticker: "DW".to_string(),
                direction: PreferenceDirection::Sell,
                value: 15.0,
            }],
        );
        save_preferences(&conn, &prefs).unwrap();
        // saving twice replaces rather than duplicates
        save_preferences(&conn, &prefs).unwrap();

        let snapshot = load_snapshot(&conn).unwrap();
        let loaded = snapshot.preferences("main").unwrap();
        assert_eq!(loaded, &prefs);
        assert_eq!(loaded.empire_exchanges[0].exchange.timeframe, Timeframe::SevenDays);
    }

    #[test]
    fn clear_keeps_preferences() {
        let conn = conn();
        let prefs = Preferences { name: "p".to_string(), ..Default::default() };
        save_preferences(&conn, &prefs).unwrap();
        upsert_template(
            &conn,
            &ProductionTemplate { building: "EXT".to_string(), amount: 1, habitation: vec![] },
        )
        .unwrap();
        clear_game_data(&conn).unwrap();

        let counts: HashMap<&str, i64> = table_counts(&conn).unwrap().into_iter().collect();
        assert_eq!(counts["production_templates"], 0);
        assert_eq!(counts["preference_sets"], 1);
    }

    #[test]
    fn template_upsert_replaces_same_layout() {
        let conn = conn();
        let template = ProductionTemplate {
            building: "EXT".to_string(),
            amount: 6,
            habitation: vec![
                TemplateHabitation { building: "HB2".to_string(), amount: 1 },
                TemplateHabitation { building: "HB1".to_string(), amount: 2 },
            ],
        };
        upsert_template(&conn, &template).unwrap();
        let mut reordered = template.clone();
        reordered.habitation.reverse();
        upsert_template(&conn, &reordered).unwrap();
        upsert_template(
            &conn,
            &ProductionTemplate { building: "EXT".to_string(), amount: 4, habitation: vec![] },
        )
        .unwrap();

        let counts: HashMap<&str, i64> = table_counts(&conn).unwrap().into_iter().collect();
        assert_eq!(counts["production_templates"], 2);
        let habitation_rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM template_habitation", [], |row| row.get(0))
            .unwrap();
        assert_eq!(habitation_rows, 2);

        let snapshot = load_snapshot(&conn).unwrap();
        let keys: Vec<String> = snapshot.production_templates().iter().map(|t| t.key()).collect();
        // a replaced layout moves behind templates inserted before it
        assert_eq!(keys, vec!["EXT-6+HB1x2+HB2x1".to_string(), "EXT-4".to_string()]);
    }
}
