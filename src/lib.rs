//! PrUn Production Calculator
//!
//! Planning calculations for a production-chain game economy: material
//! flow of production buildings, price resolution from user preferences,
//! extraction timing, environment-driven construction materials and a
//! bounded-concurrency ranking of extraction sites.

pub mod config;
pub mod db;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod extraction;
pub mod flow;
pub mod import;
pub mod models;
pub mod pricing;
pub mod production;
pub mod repository;
pub mod roi;
pub mod sample;

pub use error::{CandidateError, ExchangeRefError, LookupError, RecordKind};
pub use evaluator::{EvaluateOptions, EvaluationReport, Evaluator};
pub use pricing::{PriceQuote, PriceResolver, PriceSource};
pub use repository::{GameData, GameSnapshot, PlanetSearch};
