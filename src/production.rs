//! Daily material flow of production buildings

use serde::{Deserialize, Serialize};

use crate::environment;
use crate::error::LookupError;
use crate::flow::combine;
use crate::models::{
    ActiveRecipe, BuildingTemplate, MS_PER_DAY, MaterialFlowLine, PlanetEnvironment,
    ProductionBuilding,
};
use crate::repository::GameData;

impl ProductionBuilding {
    /// Build from a recipe queue. The batch time is the sum of the active
    /// recipes' durations, each counted once per unit of multiplier.
    pub fn from_recipes(instance_count: u32, active_recipes: Vec<ActiveRecipe>) -> Self {
        let total_batch_time_ms = active_recipes
            .iter()
            .filter(|ar| ar.multiplier > 0.0)
            .map(|ar| ar.recipe.duration_ms * ar.multiplier)
            .sum();

        Self {
            instance_count,
            total_batch_time_ms,
            active_recipes,
        }
    }
}

/// How many times per day the building's whole recipe queue completes,
/// summed over all instances.
pub fn batch_runs(building: &ProductionBuilding) -> f64 {
    (MS_PER_DAY * building.instance_count as f64) / building.total_batch_time_ms
}

/// Daily material input and output of a single building group
pub fn building_material_io(building: &ProductionBuilding) -> Vec<MaterialFlowLine> {
    let runs = batch_runs(building);
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();

    for active in &building.active_recipes {
        // inactive recipes contribute no lines at all
        if active.multiplier == 0.0 {
            continue;
        }

        let factor = active.multiplier * runs;
        inputs.extend(
            active
                .recipe
                .inputs
                .iter()
                .map(|m| MaterialFlowLine::input(m.ticker.clone(), m.amount * factor)),
        );
        outputs.extend(
            active
                .recipe
                .outputs
                .iter()
                .map(|m| MaterialFlowLine::output(m.ticker.clone(), m.amount * factor)),
        );
    }

    combine(&[inputs, outputs])
}

/// Net daily material flow of all buildings
pub fn calculate_material_io(buildings: &[ProductionBuilding]) -> Vec<MaterialFlowLine> {
    let per_building: Vec<Vec<MaterialFlowLine>> =
        buildings.iter().map(building_material_io).collect();
    combine(&per_building)
}

/// Materials to construct one building on a planet: its own construction
/// costs plus whatever the environment demands.
pub fn construction_materials(
    building: &BuildingTemplate,
    env: &PlanetEnvironment,
) -> Vec<MaterialFlowLine> {
    let costs: Vec<MaterialFlowLine> = building
        .construction_costs
        .iter()
        .map(|c| MaterialFlowLine::input(c.ticker.clone(), c.amount))
        .collect();
    let special = environment::special_materials(env, building.area_cost);

    combine(&[costs, special])
}

/// User-facing plan description, as stored in plan files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanDefinition {
    #[serde(default)]
    pub planet: Option<String>,
    pub buildings: Vec<PlanBuilding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanBuilding {
    pub name: String,
    pub amount: u32,
    #[serde(default)]
    pub active_recipes: Vec<PlanRecipe>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecipe {
    pub recipe_id: String,
    pub amount: f64,
}

/// Resolve a plan's recipe ids against game data
pub fn resolve_plan(
    data: &dyn GameData,
    plan: &PlanDefinition,
) -> Result<Vec<ProductionBuilding>, LookupError> {
    let mut buildings = Vec::with_capacity(plan.buildings.len());

    for building in &plan.buildings {
        let mut active = Vec::with_capacity(building.active_recipes.len());
        for r in &building.active_recipes {
            active.push(ActiveRecipe {
                recipe: data.recipe(&r.recipe_id)?.clone(),
                multiplier: r.amount,
            });
        }
        buildings.push(ProductionBuilding::from_recipes(building.amount, active));
    }

    Ok(buildings)
}
