//! Planet condition classification and the extra construction materials it implies

use crate::models::{MaterialFlowLine, Planet, PlanetEnvironment};

pub const GRAVITY_LOW: f64 = 0.25;
pub const GRAVITY_HIGH: f64 = 2.5;
pub const PRESSURE_LOW: f64 = 0.25;
pub const PRESSURE_HIGH: f64 = 2.0;
pub const TEMPERATURE_LOW: f64 = -25.0;
pub const TEMPERATURE_HIGH: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Low,
    Normal,
    High,
}

/// Classify a value against a low and a high threshold. Both thresholds are
/// exclusive: a value equal to a threshold is `Normal`.
pub fn classify(value: f64, low: f64, high: f64) -> Boundary {
    if value < low {
        Boundary::Low
    } else if value > high {
        Boundary::High
    } else {
        Boundary::Normal
    }
}

pub fn gravity(env: &PlanetEnvironment) -> Boundary {
    classify(env.gravity, GRAVITY_LOW, GRAVITY_HIGH)
}

pub fn pressure(env: &PlanetEnvironment) -> Boundary {
    classify(env.pressure, PRESSURE_LOW, PRESSURE_HIGH)
}

pub fn temperature(env: &PlanetEnvironment) -> Boundary {
    classify(env.temperature, TEMPERATURE_LOW, TEMPERATURE_HIGH)
}

/// Additional materials every building on this planet needs for construction.
///
/// Lines come out in a fixed order: surface, gravity, pressure, temperature.
pub fn special_materials(env: &PlanetEnvironment, area_cost: f64) -> Vec<MaterialFlowLine> {
    let mut lines = Vec::new();

    if env.surface {
        lines.push(MaterialFlowLine::input("MCG", area_cost * 4.0));
    } else {
        lines.push(MaterialFlowLine::input("AEF", (area_cost / 3.0).ceil()));
    }

    match gravity(env) {
        Boundary::Low => lines.push(MaterialFlowLine::input("MGC", 1.0)),
        Boundary::High => lines.push(MaterialFlowLine::input("BL", 1.0)),
        Boundary::Normal => {}
    }

    match pressure(env) {
        Boundary::Low => lines.push(MaterialFlowLine::input("SEA", area_cost)),
        Boundary::High => lines.push(MaterialFlowLine::input("HSE", 1.0)),
        Boundary::Normal => {}
    }

    match temperature(env) {
        Boundary::Low => lines.push(MaterialFlowLine::input("INS", area_cost * 10.0)),
        Boundary::High => lines.push(MaterialFlowLine::input("TSH", 1.0)),
        Boundary::Normal => {}
    }

    lines
}

/// Short tags describing a planet's conditions, e.g. `["MCG", "MGC"]`.
/// Each tag is the material the condition demands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSummary {
    pub surface: &'static str,
    pub gravity: Option<&'static str>,
    pub pressure: Option<&'static str>,
    pub temperature: Option<&'static str>,
}

impl EnvironmentSummary {
    pub fn of(planet: &Planet) -> Self {
        let env = &planet.environment;
        Self {
            surface: if env.surface { "MCG" } else { "AEF" },
            gravity: match gravity(env) {
                Boundary::Low => Some("MGC"),
                Boundary::High => Some("BL"),
                Boundary::Normal => None,
            },
            pressure: match pressure(env) {
                Boundary::Low => Some("SEA"),
                Boundary::High => Some("HSE"),
                Boundary::Normal => None,
            },
            temperature: match temperature(env) {
                Boundary::Low => Some("INS"),
                Boundary::High => Some("TSH"),
                Boundary::Normal => None,
            },
        }
    }

    pub fn tags(&self) -> Vec<String> {
        std::iter::once(Some(self.surface))
            .chain([self.gravity, self.pressure, self.temperature])
            .flatten()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(surface: bool, gravity: f64, pressure: f64, temperature: f64) -> PlanetEnvironment {
        PlanetEnvironment {
            surface,
            gravity,
            pressure,
            temperature,
        }
    }

    fn normal(surface: bool) -> PlanetEnvironment {
        env(surface, 1.0, 1.0, 25.0)
    }

    #[test]
    fn classify_boundaries() {
        assert_eq!(classify(-10.0, 0.0, 0.0), Boundary::Low);
        assert_eq!(classify(5.0, 0.0, 10.0), Boundary::Normal);
        assert_eq!(classify(10.0, 0.0, 5.0), Boundary::High);
        // thresholds themselves are normal
        assert_eq!(classify(0.25, GRAVITY_LOW, GRAVITY_HIGH), Boundary::Normal);
        assert_eq!(classify(2.5, GRAVITY_LOW, GRAVITY_HIGH), Boundary::Normal);
    }

    #[test]
    fn surface_and_gas_giant() {
        assert_eq!(
            special_materials(&normal(true), 25.0),
            vec![MaterialFlowLine::input("MCG", 100.0)]
        );
        assert_eq!(
            special_materials(&normal(false), 25.0),
            vec![MaterialFlowLine::input("AEF", 9.0)]
        );
    }

    #[test]
    fn low_gravity_on_surface() {
        let lines = special_materials(&env(true, 0.249, 1.0, 25.0), 25.0);
        assert_eq!(
            lines,
            vec![
                MaterialFlowLine::input("MCG", 100.0),
                MaterialFlowLine::input("MGC", 1.0),
            ]
        );
    }

    #[test]
    fn every_extreme() {
        let lines = special_materials(&env(true, 2.51, 0.1, -30.0), 10.0);
        assert_eq!(
            lines,
            vec![
                MaterialFlowLine::input("MCG", 40.0),
                MaterialFlowLine::input("BL", 1.0),
                MaterialFlowLine::input("SEA", 10.0),
                MaterialFlowLine::input("INS", 100.0),
            ]
        );

        let lines = special_materials(&env(false, 1.0, 2.1, 80.0), 10.0);
        assert_eq!(
            lines,
            vec![
                MaterialFlowLine::input("AEF", 4.0),
                MaterialFlowLine::input("HSE", 1.0),
                MaterialFlowLine::input("TSH", 1.0),
            ]
        );
    }

    #[test]
    fn summary_tags() {
        let planet = Planet {
            natural_id: "XK-745b".to_string(),
            name: "Test".to_string(),
            environment: env(false, 0.1, 1.0, 100.0),
            cogc_program: None,
            resources: vec![],
        };
        assert_eq!(EnvironmentSummary::of(&planet).tags(), vec!["AEF", "MGC", "TSH"]);
    }
}
