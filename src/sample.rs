//! Built-in sample data, for trying the tool without game data dumps

use anyhow::Result;
use rusqlite::Connection;

use crate::db;
use crate::models::{
    BuildingTemplate, ExchangePreference, ExchangeRef, ExchangeTicker, Planet, PlanetEnvironment,
    PlanetResource, PreferenceDirection, Preferences, ProductionTemplate, Recipe, RecipeMaterial,
    ResourceType, TemplateHabitation, TickerPreference, Timeframe, UNIVERSE_EXCHANGE,
};

/// Name of the sample preference set
pub const SAMPLE_PREFERENCES: &str = "default";

fn materials(list: &[(&str, f64)]) -> Vec<RecipeMaterial> {
    list.iter()
        .map(|(ticker, amount)| RecipeMaterial {
            ticker: ticker.to_string(),
            amount: *amount,
        })
        .collect()
}

fn building(
    ticker: &str,
    name: &str,
    area_cost: f64,
    expertise: Option<&str>,
    costs: &[(&str, f64)],
) -> BuildingTemplate {
    BuildingTemplate {
        ticker: ticker.to_string(),
        name: name.to_string(),
        area_cost,
        expertise: expertise.map(str::to_string),
        construction_costs: materials(costs),
    }
}

fn resource(ticker: &str, resource_type: ResourceType, daily_extraction: f64) -> PlanetResource {
    PlanetResource {
        ticker: ticker.to_string(),
        resource_type,
        daily_extraction,
    }
}

fn market(ticker: &str, exchange: &str, vwap_7d: f64, vwap_30d: f64) -> ExchangeTicker {
    ExchangeTicker {
        material_ticker: ticker.to_string(),
        exchange_code: exchange.to_string(),
        vwap_daily: None,
        vwap_7d: Some(vwap_7d),
        vwap_30d: Some(vwap_30d),
        sum_traded_7d: 0.0,
        sum_traded_30d: 0.0,
    }
}

fn template(building: &str, amount: u32, habitation: &[(&str, u32)]) -> ProductionTemplate {
    ProductionTemplate {
        building: building.to_string(),
        amount,
        habitation: habitation
            .iter()
            .map(|(b, n)| TemplateHabitation {
                building: b.to_string(),
                amount: *n,
            })
            .collect(),
    }
}

/// Support building made of basic structural parts, amounts of BBH, BDE
/// and BSE. Zero amounts are left out.
fn infrastructure(ticker: &str, name: &str, area_cost: f64, parts: [f64; 3]) -> BuildingTemplate {
    let costs: Vec<(&str, f64)> = ["BBH", "BDE", "BSE"]
        .into_iter()
        .zip(parts)
        .filter(|(_, amount)| *amount > 0.0)
        .collect();
    building(ticker, name, area_cost, None, &costs)
}

pub fn sample_buildings() -> Vec<BuildingTemplate> {
    let extraction = Some("RESOURCE_EXTRACTION");
    let food = Some("FOOD_INDUSTRIES");
    vec![
        building("EXT", "extractor", 25.0, extraction, &[("BBH", 4.0), ("BDE", 4.0), ("BSE", 4.0)]),
        building("COL", "collector", 15.0, extraction, &[("BBH", 4.0), ("BSE", 6.0)]),
        building("RIG", "rig", 10.0, extraction, &[("BBH", 4.0), ("BSE", 4.0)]),
        building("FP", "foodProcessor", 12.0, food, &[("BBH", 3.0), ("BSE", 3.0)]),
        infrastructure("HB1", "habitationPioneer", 10.0, [4.0, 2.0, 2.0]),
        infrastructure("HB2", "habitationSettler", 12.0, [6.0, 2.0, 4.0]),
        infrastructure("HB3", "habitationTechnician", 14.0, [6.0, 4.0, 4.0]),
        infrastructure("HB4", "habitationEngineer", 16.0, [8.0, 4.0, 6.0]),
        infrastructure("HB5", "habitationScientist", 18.0, [8.0, 6.0, 8.0]),
        infrastructure("HBB", "habitationBarracks", 14.0, [8.0, 0.0, 6.0]),
        infrastructure("HBC", "habitationCrew", 17.0, [6.0, 6.0, 6.0]),
        infrastructure("HBM", "habitationManagement", 20.0, [10.0, 6.0, 6.0]),
        infrastructure("HBL", "habitationLuxury", 22.0, [10.0, 8.0, 8.0]),
        infrastructure("STO", "storageFacility", 15.0, [6.0, 0.0, 6.0]),
    ]
}

pub fn sample_recipes() -> Vec<Recipe> {
    vec![
        Recipe {
            id: "FP#RAT".to_string(),
            building_ticker: "FP".to_string(),
            duration_ms: 6.0 * 60.0 * 60.0 * 1000.0,
            inputs: materials(&[("ALG", 1.0), ("GRN", 1.0), ("NUT", 1.0)]),
            outputs: materials(&[("RAT", 10.0)]),
        },
        Recipe {
            id: "FP#DW".to_string(),
            building_ticker: "FP".to_string(),
            duration_ms: 4.0 * 60.0 * 60.0 * 1000.0 + 48.0 * 60.0 * 1000.0,
            inputs: materials(&[("H2O", 10.0), ("PG", 1.0)]),
            outputs: materials(&[("DW", 10.0)]),
        },
    ]
}

pub fn sample_planets() -> Vec<Planet> {
    vec![
        Planet {
            natural_id: "OT-580b".to_string(),
            name: "Montem".to_string(),
            environment: PlanetEnvironment {
                surface: true,
                gravity: 0.98,
                pressure: 0.93,
                temperature: 23.5,
            },
            cogc_program: Some("RESOURCE_EXTRACTION".to_string()),
            resources: vec![
                resource("FEO", ResourceType::Mineral, 35.0),
                resource("H2O", ResourceType::Liquid, 28.0),
            ],
        },
        Planet {
            natural_id: "VH-331a".to_string(),
            name: "Promitor".to_string(),
            environment: PlanetEnvironment {
                surface: true,
                gravity: 2.9,
                pressure: 2.4,
                temperature: 31.0,
            },
            cogc_program: None,
            resources: vec![resource("FEO", ResourceType::Mineral, 50.0)],
        },
        Planet {
            natural_id: "UV-351a".to_string(),
            name: "Harmonia".to_string(),
            environment: PlanetEnvironment {
                surface: true,
                gravity: 0.2,
                pressure: 0.1,
                temperature: -60.0,
            },
            cogc_program: None,
            resources: vec![
                resource("FEO", ResourceType::Mineral, 20.0),
                resource("LST", ResourceType::Mineral, 41.0),
            ],
        },
        Planet {
            natural_id: "ZV-307c".to_string(),
            name: "Etherwind".to_string(),
            environment: PlanetEnvironment {
                surface: false,
                gravity: 1.4,
                pressure: 18.0,
                temperature: 95.0,
            },
            cogc_program: Some("RESOURCE_EXTRACTION".to_string()),
            resources: vec![
                resource("H2O", ResourceType::Gaseous, 40.0),
                resource("NE", ResourceType::Gaseous, 12.0),
            ],
        },
        Planet {
            natural_id: "XK-745b".to_string(),
            name: "Katoa".to_string(),
            environment: PlanetEnvironment {
                surface: true,
                gravity: 1.1,
                pressure: 1.2,
                temperature: 28.0,
            },
            cogc_program: Some("AGRICULTURE".to_string()),
            resources: vec![resource("H2O", ResourceType::Liquid, 60.0)],
        },
    ]
}

pub fn sample_exchanges() -> Vec<ExchangeTicker> {
    let universe = [
        ("FEO", 110.0),
        ("LST", 95.0),
        ("H2O", 40.0),
        ("NE", 900.0),
        ("BBH", 2100.0),
        ("BDE", 1650.0),
        ("BSE", 1500.0),
        ("MCG", 16.0),
        ("AEF", 3100.0),
        ("MGC", 28_000.0),
        ("BL", 31_000.0),
        ("SEA", 6.0),
        ("HSE", 21_000.0),
        ("INS", 45.0),
        ("TSH", 8_500.0),
        ("RAT", 82.0),
        ("DW", 68.0),
        ("ALG", 60.0),
        ("GRN", 55.0),
        ("NUT", 70.0),
        ("PG", 30.0),
    ];

    let mut exchanges: Vec<ExchangeTicker> = universe
        .iter()
        .map(|(ticker, price)| market(ticker, UNIVERSE_EXCHANGE, *price, *price))
        .collect();

    exchanges.push(market("FEO", "IC1", 104.0, 112.0));
    exchanges.push(market("BSE", "IC1", 1420.0, 1460.0));
    exchanges.push(market("RAT", "IC1", 78.0, 80.0));
    exchanges.push(market("FEO", "NC1", 118.0, 121.0));
    exchanges.push(market("DW", "NC1", 72.0, 70.0));
    exchanges
}

pub fn sample_templates() -> Vec<ProductionTemplate> {
    vec![
        template("EXT", 3, &[("HB1", 1)]),
        template("EXT", 6, &[("HB1", 2)]),
        template("COL", 4, &[("HB1", 1)]),
        template("RIG", 5, &[("HB1", 1)]),
        template("RIG", 8, &[("HB2", 1)]),
    ]
}

/// Buy from IC1 on the 7 day average, sell on the 30 day one; Montem ore
/// has a fixed buyer.
pub fn sample_preferences() -> Preferences {
    let mut prefs = Preferences {
        name: SAMPLE_PREFERENCES.to_string(),
        empire_exchanges: vec![
            ExchangePreference {
                direction: PreferenceDirection::Buy,
                exchange: ExchangeRef {
                    exchange_code: "IC1".to_string(),
                    timeframe: Timeframe::SevenDays,
                },
            },
            ExchangePreference {
                direction: PreferenceDirection::Sell,
                exchange: ExchangeRef {
                    exchange_code: "IC1".to_string(),
                    timeframe: Timeframe::ThirtyDays,
                },
            },
        ],
        empire_tickers: vec![TickerPreference {
            ticker: "DW".to_string(),
            direction: PreferenceDirection::Both,
            value: 75.0,
        }],
        ..Default::default()
    };
    prefs.planet_tickers.insert(
        "OT-580b".to_string(),
        vec![TickerPreference {
            ticker: "FEO".to_string(),
            direction: PreferenceDirection::Sell,
            value: 130.0,
        }],
    );
    prefs
}

/// Replace the game data in the database with the sample set
pub fn load_sample_data(conn: &Connection) -> Result<()> {
    db::clear_game_data(conn)?;

    for building in sample_buildings() {
        db::upsert_building(conn, &building)?;
    }
    for recipe in sample_recipes() {
        db::upsert_recipe(conn, &recipe)?;
    }
    for planet in sample_planets() {
        db::upsert_planet(conn, &planet)?;
    }
    for exchange in sample_exchanges() {
        db::upsert_exchange(conn, &exchange)?;
    }
    for template in sample_templates() {
        db::upsert_template(conn, &template)?;
    }
    db::save_preferences(conn, &sample_preferences())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::INFRASTRUCTURE_BUILDINGS;
    use crate::repository::GameData;

    #[test]
    fn loads_and_reloads() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        load_sample_data(&conn).unwrap();
        load_sample_data(&conn).unwrap();

        let snapshot = db::load_snapshot(&conn).unwrap();
        assert_eq!(snapshot.planet_count(), sample_planets().len());
        assert_eq!(snapshot.production_templates().len(), sample_templates().len());
        assert!(snapshot.preferences(SAMPLE_PREFERENCES).is_ok());
        assert!(snapshot.recipe("FP#DW").is_ok());
    }

    #[test]
    fn infrastructure_buildings_exist() {
        let buildings = sample_buildings();
        for ticker in INFRASTRUCTURE_BUILDINGS {
            assert!(buildings.iter().any(|b| b.ticker == ticker), "{} missing", ticker);
        }
    }

    #[test]
    fn every_template_building_exists() {
        let buildings = sample_buildings();
        for t in sample_templates() {
            assert!(buildings.iter().any(|b| b.ticker == t.building));
            for h in &t.habitation {
                assert!(buildings.iter().any(|b| b.ticker == h.building));
            }
        }
    }
}
