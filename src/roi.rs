//! Resource ROI overview: where is it most worthwhile to extract a material?
//!
//! Every planet carrying the material is paired with each production
//! template for the matching extraction building. Each pair is planned
//! out, valued with planet-scoped prices and ranked by daily yield.

use std::sync::Arc;

use tracing::debug;

use crate::environment::EnvironmentSummary;
use crate::error::{CandidateError, LookupError};
use crate::evaluator::{EvaluationReport, Evaluator, Scored};
use crate::extraction::extraction_recipe;
use crate::flow::{combine, net_delta, scale};
use crate::models::{
    ActiveRecipe, Planet, Preferences, ProductionBuilding, ProductionTemplate, RankedResult,
};
use crate::pricing::PriceResolver;
use crate::production::{calculate_material_io, construction_materials};
use crate::repository::{GameData, PlanetSearch};

/// One planet with one production template
#[derive(Debug, Clone)]
pub struct RoiCandidate {
    pub material: String,
    pub planet: Planet,
    pub template: ProductionTemplate,
}

impl Scored for RankedResult {
    fn score(&self) -> f64 {
        self.daily_yield
    }

    fn identity(&self) -> String {
        format!("{}#{}", self.planet_natural_id, self.template_key)
    }

    fn set_percent_of_max(&mut self, percent: f64) {
        self.percent_max_daily_yield = percent;
    }
}

/// All viable (planet, template) pairs for extracting `material`
pub fn candidates(data: &dyn GameData, material: &str) -> Vec<RoiCandidate> {
    let planets = data.search_planets(&PlanetSearch::for_material(material));
    let mut out = Vec::new();

    for planet in planets {
        let Some(resource) = planet.resource(material) else {
            continue;
        };
        let building = resource.resource_type.extraction_building();

        for template in data
            .production_templates()
            .iter()
            .filter(|t| t.building == building)
        {
            out.push(RoiCandidate {
                material: material.to_string(),
                planet: planet.clone(),
                template: template.clone(),
            });
        }
    }

    out
}

/// Plan and value a single candidate. A resource without a positive
/// extraction rate can't be planned and fails the candidate.
pub fn evaluate_candidate(
    data: &dyn GameData,
    preferences: Option<&Preferences>,
    candidate: &RoiCandidate,
) -> Result<RankedResult, CandidateError> {
    let planet = &candidate.planet;
    let template = &candidate.template;
    let planet_id = Some(planet.natural_id.as_str());

    let resource = planet
        .resource(&candidate.material)
        .ok_or_else(|| LookupError::ResourceNotFound {
            planet: planet.natural_id.clone(),
            ticker: candidate.material.clone(),
        })?;
    if resource.daily_extraction.is_nan() || resource.daily_extraction <= 0.0 {
        return Err(CandidateError::InvalidExtractionRate {
            planet: planet.natural_id.clone(),
            ticker: resource.ticker.clone(),
            rate: resource.daily_extraction,
        });
    }

    let production = ProductionBuilding::from_recipes(
        template.amount,
        vec![ActiveRecipe {
            recipe: extraction_recipe(resource),
            multiplier: 1.0,
        }],
    );
    let material_io = calculate_material_io(&[production]);
    // extraction consumes nothing, so the net delta is the output
    let daily_yield = net_delta(&material_io, &candidate.material);

    let resolver = PriceResolver::new(data, preferences);
    let daily_profit = resolver.value_flow(&material_io, planet_id);

    let building = data.building(&template.building)?;
    let mut materials = vec![scale(
        &construction_materials(building, &planet.environment),
        template.amount as f64,
    )];
    let mut plan_area = building.area_cost * template.amount as f64;

    for hab in &template.habitation {
        let hab_building = data.building(&hab.building)?;
        materials.push(scale(
            &construction_materials(hab_building, &planet.environment),
            hab.amount as f64,
        ));
        plan_area += hab_building.area_cost * hab.amount as f64;
    }

    let plan_cost = resolver.construction_cost(&combine(&materials), planet_id);
    let plan_roi = if daily_profit > 0.0 {
        plan_cost / daily_profit
    } else {
        f64::INFINITY
    };
    let profit_per_area = if plan_area > 0.0 {
        daily_profit / plan_area
    } else {
        0.0
    };

    debug!(
        planet = %planet.natural_id,
        building = %template.building,
        daily_yield,
        daily_profit,
        plan_cost,
        "candidate evaluated"
    );

    Ok(RankedResult {
        planet_natural_id: planet.natural_id.clone(),
        planet_name: planet.display_name(),
        building_ticker: template.building.clone(),
        template_key: template.key(),
        daily_yield,
        percent_max_daily_yield: 0.0,
        daily_profit,
        plan_cost,
        plan_roi,
        plan_area,
        profit_per_area,
        environment: EnvironmentSummary::of(planet).tags(),
        cogc_program: planet.cogc_program.clone(),
    })
}

/// Evaluate every candidate for `material` on the evaluator's worker pool
pub async fn resource_roi(
    evaluator: &Evaluator,
    data: Arc<dyn GameData>,
    preferences: Option<Arc<Preferences>>,
    material: &str,
) -> EvaluationReport<RankedResult> {
    let candidates = candidates(data.as_ref(), material);

    evaluator
        .evaluate(candidates, move |candidate| {
            let data = Arc::clone(&data);
            let preferences = preferences.clone();
            async move { evaluate_candidate(data.as_ref(), preferences.as_deref(), &candidate) }
        })
        .await
}
