//! Data models for Prosperous Universe materials, buildings, planets and prices

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExchangeRefError;

/// Milliseconds in one game day
pub const MS_PER_DAY: f64 = 86_400_000.0;

/// Exchange code of the global fallback market
pub const UNIVERSE_EXCHANGE: &str = "UNIVERSE";

/// One material's flow: what is consumed and what is produced.
///
/// Net delta is `output - input`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialFlowLine {
    pub ticker: String,
    pub input: f64,
    pub output: f64,
}

impl MaterialFlowLine {
    pub fn input(ticker: impl Into<String>, amount: f64) -> Self {
        Self {
            ticker: ticker.into(),
            input: amount,
            output: 0.0,
        }
    }

    pub fn output(ticker: impl Into<String>, amount: f64) -> Self {
        Self {
            ticker: ticker.into(),
            input: 0.0,
            output: amount,
        }
    }

    pub fn delta(&self) -> f64 {
        self.output - self.input
    }
}

/// Material amount as listed on a recipe or a building cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeMaterial {
    pub ticker: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub building_ticker: String,
    pub duration_ms: f64,
    pub inputs: Vec<RecipeMaterial>,
    pub outputs: Vec<RecipeMaterial>,
}

/// A recipe queued on a building. A multiplier of 0 marks it inactive.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRecipe {
    pub recipe: Recipe,
    pub multiplier: f64,
}

/// A group of identical buildings running the same recipe queue
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionBuilding {
    pub instance_count: u32,
    pub total_batch_time_ms: f64,
    pub active_recipes: Vec<ActiveRecipe>,
}

/// Building definition from game data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingTemplate {
    pub ticker: String,
    pub name: String,
    pub area_cost: f64,
    #[serde(default)]
    pub expertise: Option<String>,
    #[serde(default)]
    pub construction_costs: Vec<RecipeMaterial>,
}

/// Market data for one material on one exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeTicker {
    pub material_ticker: String,
    pub exchange_code: String,
    #[serde(default)]
    pub vwap_daily: Option<f64>,
    #[serde(default)]
    pub vwap_7d: Option<f64>,
    #[serde(default)]
    pub vwap_30d: Option<f64>,
    #[serde(default)]
    pub sum_traded_7d: f64,
    #[serde(default)]
    pub sum_traded_30d: f64,
}

impl ExchangeTicker {
    /// Compound identifier, e.g. `RAT.IC1`
    pub fn ticker_id(&self) -> String {
        ticker_id(&self.material_ticker, &self.exchange_code)
    }

    pub fn vwap(&self, timeframe: Timeframe) -> Option<f64> {
        match timeframe {
            Timeframe::SevenDays => self.vwap_7d,
            Timeframe::ThirtyDays => self.vwap_30d,
        }
    }
}

pub fn ticker_id(material_ticker: &str, exchange_code: &str) -> String {
    format!("{}.{}", material_ticker, exchange_code)
}

/// Trade direction of a concrete price lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

/// Direction a preference applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PreferenceDirection {
    Buy,
    Sell,
    Both,
}

impl PreferenceDirection {
    pub fn matches(self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (PreferenceDirection::Both, _)
                | (PreferenceDirection::Buy, Direction::Buy)
                | (PreferenceDirection::Sell, Direction::Sell)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceDirection::Buy => "BUY",
            PreferenceDirection::Sell => "SELL",
            PreferenceDirection::Both => "BOTH",
        }
    }
}

impl FromStr for PreferenceDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(PreferenceDirection::Buy),
            "SELL" => Ok(PreferenceDirection::Sell),
            "BOTH" => Ok(PreferenceDirection::Both),
            other => Err(format!("unknown preference direction '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "7D")]
    SevenDays,
    #[serde(rename = "30D")]
    ThirtyDays,
}

/// Exchange option of a preference, written `<exchangeCode>_<timeframe>` (e.g. `IC1_7D`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExchangeRef {
    pub exchange_code: String,
    pub timeframe: Timeframe,
}

impl FromStr for ExchangeRef {
    type Err = ExchangeRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('_').collect();
        if parts.len() != 2 || parts[0].is_empty() {
            return Err(ExchangeRefError(s.to_string()));
        }

        // Anything that isn't 7D reads the 30 day average
        let timeframe = if parts[1] == "7D" {
            Timeframe::SevenDays
        } else {
            Timeframe::ThirtyDays
        };

        Ok(ExchangeRef {
            exchange_code: parts[0].to_string(),
            timeframe,
        })
    }
}

impl TryFrom<String> for ExchangeRef {
    type Error = ExchangeRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExchangeRef> for String {
    fn from(value: ExchangeRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ExchangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timeframe = match self.timeframe {
            Timeframe::SevenDays => "7D",
            Timeframe::ThirtyDays => "30D",
        };
        write!(f, "{}_{}", self.exchange_code, timeframe)
    }
}

/// Fixed price for one material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerPreference {
    pub ticker: String,
    pub direction: PreferenceDirection,
    pub value: f64,
}

/// Exchange to source prices from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangePreference {
    pub direction: PreferenceDirection,
    pub exchange: ExchangeRef,
}

/// A named set of price preferences, at empire scope and per planet.
///
/// At most one BOTH (or one BUY and one SELL) exists per ticker/exchange and
/// scope; whoever writes preferences keeps that invariant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub name: String,
    #[serde(default)]
    pub empire_exchanges: Vec<ExchangePreference>,
    #[serde(default)]
    pub planet_exchanges: BTreeMap<String, Vec<ExchangePreference>>,
    #[serde(default)]
    pub empire_tickers: Vec<TickerPreference>,
    #[serde(default)]
    pub planet_tickers: BTreeMap<String, Vec<TickerPreference>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceType {
    Mineral,
    Gaseous,
    Liquid,
}

impl ResourceType {
    /// Base cycle duration of the extraction building for this resource
    pub fn base_duration_ms(self) -> f64 {
        match self {
            ResourceType::Mineral => 12.0 * 60.0 * 60.0 * 1000.0,
            ResourceType::Gaseous => 6.0 * 60.0 * 60.0 * 1000.0,
            ResourceType::Liquid => (4.0 * 60.0 * 60.0 + 48.0 * 60.0) * 1000.0,
        }
    }

    /// Building that extracts this resource type
    pub fn extraction_building(self) -> &'static str {
        match self {
            ResourceType::Mineral => "EXT",
            ResourceType::Gaseous => "COL",
            ResourceType::Liquid => "RIG",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Mineral => "MINERAL",
            ResourceType::Gaseous => "GASEOUS",
            ResourceType::Liquid => "LIQUID",
        }
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MINERAL" => Ok(ResourceType::Mineral),
            "GASEOUS" => Ok(ResourceType::Gaseous),
            "LIQUID" => Ok(ResourceType::Liquid),
            other => Err(format!("unknown resource type '{}'", other)),
        }
    }
}

/// Environmental conditions that drive extra construction materials
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanetEnvironment {
    pub surface: bool,
    pub gravity: f64,
    pub pressure: f64,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetResource {
    pub ticker: String,
    pub resource_type: ResourceType,
    pub daily_extraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub natural_id: String,
    pub name: String,
    pub environment: PlanetEnvironment,
    #[serde(default)]
    pub cogc_program: Option<String>,
    #[serde(default)]
    pub resources: Vec<PlanetResource>,
}

impl Planet {
    pub fn resource(&self, ticker: &str) -> Option<&PlanetResource> {
        self.resources.iter().find(|r| r.ticker == ticker)
    }

    /// Display name used in tables, e.g. `Montem (OT-580b)`
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.natural_id)
    }
}

/// A buildable base layout: how many production buildings to place and
/// which habitation supports them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionTemplate {
    pub building: String,
    pub amount: u32,
    #[serde(default)]
    pub habitation: Vec<TemplateHabitation>,
}

impl ProductionTemplate {
    /// Natural key of the layout, e.g. `EXT-6+HB1x2`. Habitation is listed
    /// by building ticker, so the key doesn't depend on input order.
    pub fn key(&self) -> String {
        let mut habitation: Vec<&TemplateHabitation> = self.habitation.iter().collect();
        habitation.sort_by(|a, b| a.building.cmp(&b.building).then(a.amount.cmp(&b.amount)));

        let mut key = format!("{}-{}", self.building, self.amount);
        for hab in habitation {
            key.push_str(&format!("+{}x{}", hab.building, hab.amount));
        }
        key
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateHabitation {
    pub building: String,
    pub amount: u32,
}

/// Result of evaluating one (planet, template) candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub planet_natural_id: String,
    pub planet_name: String,
    pub building_ticker: String,
    /// Key of the production template, see [`ProductionTemplate::key`]
    pub template_key: String,
    pub daily_yield: f64,
    pub percent_max_daily_yield: f64,
    pub daily_profit: f64,
    pub plan_cost: f64,
    pub plan_roi: f64,
    pub plan_area: f64,
    pub profit_per_area: f64,
    pub environment: Vec<String>,
    pub cogc_program: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_matches_either_direction() {
        assert!(PreferenceDirection::Both.matches(Direction::Buy));
        assert!(PreferenceDirection::Both.matches(Direction::Sell));
        assert!(PreferenceDirection::Buy.matches(Direction::Buy));
        assert!(!PreferenceDirection::Buy.matches(Direction::Sell));
        assert!(!PreferenceDirection::Sell.matches(Direction::Buy));
    }

    #[test]
    fn template_key_ignores_habitation_order() {
        let hab = |building: &str, amount| TemplateHabitation {
            building: building.to_string(),
            amount,
        };
        let a = ProductionTemplate {
            building: "EXT".to_string(),
            amount: 6,
            habitation: vec![hab("HB2", 1), hab("HB1", 2)],
        };
        let mut b = a.clone();
        b.habitation.reverse();
        assert_eq!(a.key(), "EXT-6+HB1x2+HB2x1");
        assert_eq!(a.key(), b.key());

        b.amount = 3;
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn exchange_ref_parsing() {
        let r: ExchangeRef = "IC1_7D".parse().unwrap();
        assert_eq!(r.exchange_code, "IC1");
        assert_eq!(r.timeframe, Timeframe::SevenDays);

        let r: ExchangeRef = "UNIVERSE_30D".parse().unwrap();
        assert_eq!(r.exchange_code, "UNIVERSE");
        assert_eq!(r.timeframe, Timeframe::ThirtyDays);

        assert!("IC1".parse::<ExchangeRef>().is_err());
        assert!("IC1_7D_X".parse::<ExchangeRef>().is_err());
        assert_eq!(r.to_string(), "UNIVERSE_30D");
    }

    #[test]
    fn exchange_preference_json() {
        let pref: ExchangePreference =
            serde_json::from_str(r#"{"direction":"BOTH","exchange":"NC1_7D"}"#).unwrap();
        assert_eq!(pref.direction, PreferenceDirection::Both);
        assert_eq!(pref.exchange.exchange_code, "NC1");

        let json = r#"{"direction":"BUY","exchange":"NC1"}"#;
        let bad = serde_json::from_str::<ExchangePreference>(json);
        assert!(bad.is_err());
    }

    #[test]
    fn resource_type_durations() {
        assert_eq!(ResourceType::Mineral.base_duration_ms(), 43_200_000.0);
        assert_eq!(ResourceType::Gaseous.base_duration_ms(), 21_600_000.0);
        assert_eq!(ResourceType::Liquid.base_duration_ms(), 17_280_000.0);
        assert_eq!(ResourceType::Liquid.extraction_building(), "RIG");
        assert_eq!("gaseous".parse::<ResourceType>(), Ok(ResourceType::Gaseous));
    }
}
