//! Read-only access to game data

use std::collections::HashMap;

use crate::error::{LookupError, RecordKind};
use crate::models::{
    BuildingTemplate, ExchangeTicker, Planet, Preferences, ProductionTemplate, Recipe,
};

/// Criteria for the bulk planet search
#[derive(Debug, Clone, Default)]
pub struct PlanetSearch {
    /// Planets must carry every one of these resources
    pub materials: Vec<String>,
    /// Include surface planets
    pub rocky: bool,
    /// Include gas giants
    pub gaseous: bool,
}

impl PlanetSearch {
    pub fn for_material(ticker: &str) -> Self {
        Self {
            materials: vec![ticker.to_string()],
            rocky: true,
            gaseous: true,
        }
    }

    fn accepts(&self, planet: &Planet) -> bool {
        let surface_ok = if planet.environment.surface {
            self.rocky
        } else {
            self.gaseous
        };
        surface_ok
            && self
                .materials
                .iter()
                .all(|ticker| planet.resource(ticker).is_some())
    }
}

/// Game data lookups the calculators depend on.
///
/// Implementations must support concurrent reads; nothing mutates them
/// while a calculation is running.
pub trait GameData: Send + Sync {
    /// Look up market data by compound id, e.g. `RAT.IC1`
    fn exchange_ticker(&self, ticker_id: &str) -> Result<&ExchangeTicker, LookupError>;

    fn recipe(&self, recipe_id: &str) -> Result<&Recipe, LookupError>;

    fn building(&self, ticker: &str) -> Result<&BuildingTemplate, LookupError>;

    fn planet(&self, natural_id: &str) -> Result<&Planet, LookupError>;

    fn preferences(&self, name: &str) -> Result<&Preferences, LookupError>;

    /// Planets matching the search, ordered by natural id
    fn search_planets(&self, criteria: &PlanetSearch) -> Vec<Planet>;

    fn production_templates(&self) -> &[ProductionTemplate];
}

/// In-memory snapshot of all game data and stored preferences
#[derive(Debug, Clone, Default)]
pub struct GameSnapshot {
    exchanges: HashMap<String, ExchangeTicker>,
    recipes: HashMap<String, Recipe>,
    buildings: HashMap<String, BuildingTemplate>,
    planets: HashMap<String, Planet>,
    preferences: HashMap<String, Preferences>,
    templates: Vec<ProductionTemplate>,
}

impl GameSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_exchange(&mut self, ticker: ExchangeTicker) {
        self.exchanges.insert(ticker.ticker_id(), ticker);
    }

    pub fn add_recipe(&mut self, recipe: Recipe) {
        self.recipes.insert(recipe.id.clone(), recipe);
    }

    pub fn add_building(&mut self, building: BuildingTemplate) {
        self.buildings.insert(building.ticker.clone(), building);
    }

    pub fn add_planet(&mut self, planet: Planet) {
        self.planets.insert(planet.natural_id.clone(), planet);
    }

    pub fn add_preferences(&mut self, preferences: Preferences) {
        self.preferences.insert(preferences.name.clone(), preferences);
    }

    pub fn add_template(&mut self, template: ProductionTemplate) {
        self.templates.push(template);
    }

    pub fn planet_count(&self) -> usize {
        self.planets.len()
    }

    pub fn planets(&self) -> Vec<&Planet> {
        let mut planets: Vec<&Planet> = self.planets.values().collect();
        planets.sort_by(|a, b| a.natural_id.cmp(&b.natural_id));
        planets
    }
}

impl GameData for GameSnapshot {
    fn exchange_ticker(&self, ticker_id: &str) -> Result<&ExchangeTicker, LookupError> {
        self.exchanges
            .get(ticker_id)
            .ok_or_else(|| LookupError::not_found(RecordKind::ExchangeTicker, ticker_id))
    }

    fn recipe(&self, recipe_id: &str) -> Result<&Recipe, LookupError> {
        self.recipes
            .get(recipe_id)
            .ok_or_else(|| LookupError::not_found(RecordKind::Recipe, recipe_id))
    }

    fn building(&self, ticker: &str) -> Result<&BuildingTemplate, LookupError> {
        self.buildings
            .get(ticker)
            .ok_or_else(|| LookupError::not_found(RecordKind::Building, ticker))
    }

    fn planet(&self, natural_id: &str) -> Result<&Planet, LookupError> {
        self.planets
            .get(natural_id)
            .ok_or_else(|| LookupError::not_found(RecordKind::Planet, natural_id))
    }

    fn preferences(&self, name: &str) -> Result<&Preferences, LookupError> {
        self.preferences
            .get(name)
            .ok_or_else(|| LookupError::not_found(RecordKind::Preferences, name))
    }

    fn search_planets(&self, criteria: &PlanetSearch) -> Vec<Planet> {
        let mut found: Vec<Planet> = self
            .planets
            .values()
            .filter(|p| criteria.accepts(p))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.natural_id.cmp(&b.natural_id));
        found
    }

    fn production_templates(&self) -> &[ProductionTemplate] {
        &self.templates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlanetEnvironment, PlanetResource, ResourceType};

    fn planet(id: &str, surface: bool, resources: &[&str]) -> Planet {
        Planet {
            natural_id: id.to_string(),
            name: id.to_string(),
            environment: PlanetEnvironment {
                surface,
                gravity: 1.0,
                pressure: 1.0,
                temperature: 20.0,
            },
            cogc_program: None,
            resources: resources
                .iter()
                .map(|t| PlanetResource {
                    ticker: t.to_string(),
                    resource_type: ResourceType::Mineral,
                    daily_extraction: 10.0,
                })
                .collect(),
        }
    }

    #[test]
    fn unknown_records_are_not_found() {
        let snapshot = GameSnapshot::new();
        assert_eq!(
            snapshot.exchange_ticker("RAT.IC1"),
            Err(LookupError::not_found(RecordKind::ExchangeTicker, "RAT.IC1"))
        );
        assert!(snapshot.recipe("x").is_err());
        assert!(snapshot.building("EXT").is_err());
        assert!(snapshot.planet("OT-580b").is_err());
    }

    #[test]
    fn search_filters_by_material_and_surface() {
        let mut snapshot = GameSnapshot::new();
        snapshot.add_planet(planet("B-2", true, &["FEO", "LST"]));
        snapshot.add_planet(planet("A-1", false, &["FEO"]));
        snapshot.add_planet(planet("C-3", true, &["H2O"]));

        let found = snapshot.search_planets(&PlanetSearch::for_material("FEO"));
        let ids: Vec<&str> = found.iter().map(|p| p.natural_id.as_str()).collect();
        assert_eq!(ids, vec!["A-1", "B-2"]);

        let rocky_only = PlanetSearch {
            materials: vec!["FEO".to_string()],
            rocky: true,
            gaseous: false,
        };
        assert_eq!(snapshot.search_planets(&rocky_only).len(), 1);
    }
}
