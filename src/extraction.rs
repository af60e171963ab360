//! Extraction cycle timing for EXT, COL and RIG buildings

use crate::models::{MS_PER_DAY, PlanetResource, Recipe, RecipeMaterial, ResourceType};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionTiming {
    /// Duration of one extraction cycle
    pub time_ms: f64,
    /// Units produced per cycle
    pub extraction_amount: f64,
}

/// Cycle duration and yield for a resource extracted at `daily_extraction`
/// units per day.
///
/// The amount per cycle is the daily rate's share of the base cycle,
/// rounded up; the cycle time is then stretched to match that whole amount.
/// `daily_extraction` must be positive: at 0 the cycle time is NaN.
pub fn calculate_extraction(
    resource_type: ResourceType,
    daily_extraction: f64,
) -> ExtractionTiming {
    let daily_share = resource_type.base_duration_ms() / MS_PER_DAY;
    let extraction_amount = (daily_extraction * daily_share).ceil().trunc();
    let time_ms = extraction_amount * (MS_PER_DAY / daily_extraction);

    ExtractionTiming {
        time_ms,
        extraction_amount,
    }
}

/// Synthesize the recipe an extraction building runs on a planet resource.
///
/// The recipe id follows the game's `<building>#<ticker>` convention.
pub fn extraction_recipe(resource: &PlanetResource) -> Recipe {
    let building = resource.resource_type.extraction_building();
    let timing = calculate_extraction(resource.resource_type, resource.daily_extraction);

    Recipe {
        id: format!("{}#{}", building, resource.ticker),
        building_ticker: building.to_string(),
        duration_ms: timing.time_ms,
        inputs: Vec::new(),
        outputs: vec![RecipeMaterial {
            ticker: resource.ticker.clone(),
            amount: timing.extraction_amount,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mineral_at_100_per_day() {
        let t = calculate_extraction(ResourceType::Mineral, 100.0);
        assert_eq!(t.extraction_amount, 50.0);
        assert_eq!(t.time_ms, 50.0 * (86_400_000.0 / 100.0));
        assert_eq!(t.time_ms, 43_200_000.0);
    }

    #[test]
    fn fractional_share_rounds_up() {
        // 7 * 0.25 = 1.75 -> 2 units per cycle, 2 / 7 of a day
        let t = calculate_extraction(ResourceType::Gaseous, 7.0);
        assert_eq!(t.extraction_amount, 2.0);
        assert!((t.time_ms - 2.0 * 86_400_000.0 / 7.0).abs() < 1e-6);

        // 10 * 0.2 = 2 exactly
        let t = calculate_extraction(ResourceType::Liquid, 10.0);
        assert_eq!(t.extraction_amount, 2.0);
        assert!((t.time_ms - 17_280_000.0).abs() < 1e-6);
    }

    #[test]
    fn zero_rate_is_undefined() {
        let t = calculate_extraction(ResourceType::Mineral, 0.0);
        assert_eq!(t.extraction_amount, 0.0);
        assert!(t.time_ms.is_nan());
    }

    #[test]
    fn recipe_from_resource() {
        let recipe = extraction_recipe(&PlanetResource {
            ticker: "FEO".to_string(),
            resource_type: ResourceType::Mineral,
            daily_extraction: 100.0,
        });
        assert_eq!(recipe.id, "EXT#FEO");
        assert_eq!(recipe.building_ticker, "EXT");
        assert_eq!(recipe.duration_ms, 43_200_000.0);
        assert_eq!(recipe.outputs.len(), 1);
        assert_eq!(recipe.outputs[0].amount, 50.0);
        assert!(recipe.inputs.is_empty());
    }

    proptest! {
        #[test]
        fn daily_output_never_below_rate(rate in 0.1f64..500.0) {
            let types = [ResourceType::Mineral, ResourceType::Gaseous, ResourceType::Liquid];
            for resource_type in types {
                let t = calculate_extraction(resource_type, rate);
                prop_assert!(t.extraction_amount >= 1.0);
                prop_assert_eq!(t.extraction_amount.fract(), 0.0);
                // cycles per day times amount per cycle recovers the daily rate
                let per_day = MS_PER_DAY / t.time_ms * t.extraction_amount;
                prop_assert!((per_day - rate).abs() < 1e-6 * rate.max(1.0));
            }
        }
    }
}
