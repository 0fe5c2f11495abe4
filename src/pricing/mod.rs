//! Pricing engine module.
//!
//! Deterministic monetary calculations for dive excursions: tiered boat
//! charter pricing, gas fill pricing, multi-tier price resolution,
//! penny-exact shared-cost allocation, and totals aggregation. Exposed over
//! HTTP via [`routes`] and embeddable through [`engine::PricingEngine`].

pub mod calculators;
pub mod client;
pub mod engine;
pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;
pub mod terms;

// Re-export commonly used items
pub use engine::{LocalBackend, PricingBackend, PricingEngine, RemoteBackend};
pub use routes::router;
pub use services::{BoatCostResult, ComponentPricingResult, GasFillResult, PricingError};
