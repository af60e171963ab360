//! Material price resolution from user preferences and exchange data
//!
//! Prices are looked up through a fixed hierarchy, first match wins:
//!
//! 1. planet ticker preference
//! 2. empire ticker preference
//! 3. planet exchange preference
//! 4. empire exchange preference
//! 5. universe 30 day VWAP
//!
//! A preference with direction BOTH serves buy and sell lookups alike.
//! Without a preference set, prices come straight from the universe average.

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::LookupError;
use crate::flow::{self, PricedFlowLine};
use crate::models::{
    Direction, ExchangePreference, MaterialFlowLine, Preferences, TickerPreference,
    UNIVERSE_EXCHANGE, ticker_id,
};
use crate::production::construction_materials;
use crate::repository::GameData;

/// Habitation and storage buildings that support a base
pub const INFRASTRUCTURE_BUILDINGS: [&str; 10] =
    ["HB1", "HB2", "HB3", "HB4", "HB5", "HBB", "HBC", "HBM", "HBL", "STO"];

/// Which step of the hierarchy produced a price
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    PlanetTicker,
    EmpireTicker,
    PlanetExchange,
    EmpireExchange,
    Universe,
    /// A lookup failed; the value is 0
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub value: f64,
    pub source: PriceSource,
}

impl PriceQuote {
    fn new(value: f64, source: PriceSource) -> Self {
        Self { value, source }
    }
}

pub struct PriceResolver<'a> {
    data: &'a dyn GameData,
    preferences: Option<&'a Preferences>,
}

impl<'a> PriceResolver<'a> {
    pub fn new(data: &'a dyn GameData, preferences: Option<&'a Preferences>) -> Self {
        Self { data, preferences }
    }

    /// Unit price of `ticker` for the given trade direction.
    ///
    /// Never fails: a missing exchange ticker yields 0, so one unknown
    /// material can't abort a whole plan valuation. Use
    /// [`resolve_quote`](Self::resolve_quote) to tell 0 and unpriced apart.
    pub fn resolve_price(&self, ticker: &str, direction: Direction, planet: Option<&str>) -> f64 {
        self.resolve_quote(ticker, direction, planet).value
    }

    pub fn resolve_quote(
        &self,
        ticker: &str,
        direction: Direction,
        planet: Option<&str>,
    ) -> PriceQuote {
        match self.lookup(ticker, direction, planet) {
            Ok(quote) => quote,
            Err(e) => {
                warn!(
                    ticker,
                    ?direction,
                    planet = planet.unwrap_or("-"),
                    error = %e,
                    "price unavailable"
                );
                PriceQuote::new(0.0, PriceSource::Unavailable)
            }
        }
    }

    fn lookup(
        &self,
        ticker: &str,
        direction: Direction,
        planet: Option<&str>,
    ) -> Result<PriceQuote, LookupError> {
        let Some(prefs) = self.preferences else {
            return self.universe(ticker);
        };

        if let Some(pref) = planet.and_then(|p| planet_ticker(prefs, p, ticker, direction)) {
            return Ok(PriceQuote::new(pref.value, PriceSource::PlanetTicker));
        }

        if let Some(pref) = find_ticker(&prefs.empire_tickers, ticker, direction) {
            return Ok(PriceQuote::new(pref.value, PriceSource::EmpireTicker));
        }

        if let Some(pref) = planet.and_then(|p| planet_exchange(prefs, p, direction)) {
            let value = self.exchange_price(ticker, pref)?;
            return Ok(PriceQuote::new(value, PriceSource::PlanetExchange));
        }

        if let Some(pref) = find_exchange(&prefs.empire_exchanges, direction) {
            let value = self.exchange_price(ticker, pref)?;
            return Ok(PriceQuote::new(value, PriceSource::EmpireExchange));
        }

        self.universe(ticker)
    }

    fn exchange_price(&self, ticker: &str, pref: &ExchangePreference) -> Result<f64, LookupError> {
        let id = ticker_id(ticker, &pref.exchange.exchange_code);
        let exchange = self.data.exchange_ticker(&id)?;
        Ok(exchange.vwap(pref.exchange.timeframe).unwrap_or(0.0))
    }

    fn universe(&self, ticker: &str) -> Result<PriceQuote, LookupError> {
        let exchange = self
            .data
            .exchange_ticker(&ticker_id(ticker, UNIVERSE_EXCHANGE))?;
        Ok(PriceQuote::new(
            exchange.vwap_30d.unwrap_or(0.0),
            PriceSource::Universe,
        ))
    }

    /// Value of a net flow as seen from `planet`
    pub fn value_flow(&self, lines: &[MaterialFlowLine], planet: Option<&str>) -> f64 {
        flow::value_flow(lines, |ticker, direction| {
            self.resolve_price(ticker, direction, planet)
        })
    }

    pub fn price_lines(
        &self,
        lines: &[MaterialFlowLine],
        planet: Option<&str>,
    ) -> Vec<PricedFlowLine> {
        flow::price_lines(lines, |ticker, direction| {
            self.resolve_price(ticker, direction, planet)
        })
    }

    pub fn total_price(
        &self,
        lines: &[MaterialFlowLine],
        direction: Direction,
        planet: Option<&str>,
    ) -> f64 {
        flow::total_price(lines, direction, |ticker, direction| {
            self.resolve_price(ticker, direction, planet)
        })
    }

    /// Cost of buying a set of construction materials, as a positive number
    pub fn construction_cost(&self, materials: &[MaterialFlowLine], planet: Option<&str>) -> f64 {
        -self.total_price(materials, Direction::Buy, planet)
    }

    /// Cost of constructing each of [`INFRASTRUCTURE_BUILDINGS`] on `planet`,
    /// environment materials included, keyed by building ticker
    pub fn infrastructure_costs(&self, planet: &str) -> Result<BTreeMap<String, f64>, LookupError> {
        let p = self.data.planet(planet)?;
        let mut costs = BTreeMap::new();
        for ticker in INFRASTRUCTURE_BUILDINGS {
            let building = self.data.building(ticker)?;
            let materials = construction_materials(building, &p.environment);
            costs.insert(ticker.to_string(), self.construction_cost(&materials, Some(planet)));
        }
        Ok(costs)
    }
}

fn find_ticker<'p>(
    prefs: &'p [TickerPreference],
    ticker: &str,
    direction: Direction,
) -> Option<&'p TickerPreference> {
    prefs
        .iter()
        .find(|p| p.ticker == ticker && p.direction.matches(direction))
}

fn find_exchange(
    prefs: &[ExchangePreference],
    direction: Direction,
) -> Option<&ExchangePreference> {
    prefs.iter().find(|p| p.direction.matches(direction))
}

fn planet_ticker<'p>(
    prefs: &'p Preferences,
    planet: &str,
    ticker: &str,
    direction: Direction,
) -> Option<&'p TickerPreference> {
    prefs
        .planet_tickers
        .get(planet)
        .and_then(|list| find_ticker(list, ticker, direction))
}

fn planet_exchange<'p>(
    prefs: &'p Preferences,
    planet: &str,
    direction: Direction,
) -> Option<&'p ExchangePreference> {
    prefs
        .planet_exchanges
        .get(planet)
        .and_then(|list| find_exchange(list, direction))
}
