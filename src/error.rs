//! Error types shared by the calculators

use thiserror::Error;

/// Game data record kinds that can fail to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    ExchangeTicker,
    Recipe,
    Building,
    Planet,
    Preferences,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecordKind::ExchangeTicker => "exchange ticker",
            RecordKind::Recipe => "recipe",
            RecordKind::Building => "building",
            RecordKind::Planet => "planet",
            RecordKind::Preferences => "preferences",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LookupError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: RecordKind, id: String },
    #[error("planet '{planet}' has no resource '{ticker}'")]
    ResourceNotFound { planet: String, ticker: String },
}

impl LookupError {
    pub fn not_found(kind: RecordKind, id: impl Into<String>) -> Self {
        LookupError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Exchange option that isn't `<exchangeCode>_<timeframe>`
#[derive(Debug, Clone, Error, PartialEq)]
#[error("invalid exchange reference '{0}', expected <exchange>_<timeframe>")]
pub struct ExchangeRefError(pub String);

/// Why a ranking candidate couldn't be evaluated
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CandidateError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("planet '{planet}' extracts {ticker} at {rate}/day, expected a positive rate")]
    InvalidExtractionRate {
        planet: String,
        ticker: String,
        rate: f64,
    },
}
