//! Pricing and cost-allocation engine for dive excursions.
//!
//! The engine computes exact, reproducible monetary results from read-only
//! reference data (vendor agreements, price rules). It runs standalone as an
//! HTTP service and can also delegate to another instance of itself, falling
//! back to local calculation when that instance is unreachable.

pub mod cache;
pub mod config;
pub mod error;
pub mod money;
pub mod pricing;

use std::sync::Arc;

use sqlx::PgPool;

use cache::AppCache;
use pricing::engine::PricingEngine;

/// Shared application state for the HTTP layer.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: AppCache,
    pub engine: Arc<PricingEngine>,
}
