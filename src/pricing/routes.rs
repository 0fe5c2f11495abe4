//! Pricing route handlers
//!
//! Thin axum handlers over the [`PricingEngine`](super::engine::PricingEngine)
//! facade; all policy (validation, delegation, fallback) lives below.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::AppState;

use super::requests::{
    AllocateSharedCostsRequest, CalculateBoatCostRequest, CalculateGasFillsRequest,
    CalculateTotalsRequest, ResolvePricingRequest,
};
use super::responses::{
    AllocationResponse, BoatCostResponse, GasFillResponse, HealthResponse,
    PricingResolutionResponse, PricingTotalsResponse,
};
use super::services::PricingError;

/// Build the pricing API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/boat-cost", post(boat_cost))
        .route("/gas-fills", post(gas_fills))
        .route("/resolve", post(resolve))
        .route("/allocate", post(allocate))
        .route("/totals", post(totals))
        .route("/health", get(health))
}

async fn boat_cost(
    State(state): State<AppState>,
    Json(request): Json<CalculateBoatCostRequest>,
) -> Result<Json<BoatCostResponse>, PricingError> {
    Ok(Json(state.engine.boat_cost(&request).await?))
}

async fn gas_fills(
    State(state): State<AppState>,
    Json(request): Json<CalculateGasFillsRequest>,
) -> Result<Json<GasFillResponse>, PricingError> {
    Ok(Json(state.engine.gas_fills(&request).await?))
}

async fn resolve(
    State(state): State<AppState>,
    Json(request): Json<ResolvePricingRequest>,
) -> Result<Json<PricingResolutionResponse>, PricingError> {
    Ok(Json(state.engine.resolve(&request).await?))
}

async fn allocate(
    State(state): State<AppState>,
    Json(request): Json<AllocateSharedCostsRequest>,
) -> Result<Json<AllocationResponse>, PricingError> {
    Ok(Json(state.engine.allocate(&request).await?))
}

async fn totals(
    State(state): State<AppState>,
    Json(request): Json<CalculateTotalsRequest>,
) -> Result<Json<PricingTotalsResponse>, PricingError> {
    Ok(Json(state.engine.totals(&request).await?))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    // Callers use this to decide whether delegating to this instance is
    // worthwhile; local calculation is always possible, so a responding
    // instance reports ok.
    if state.engine.health().await {
        Json(HealthResponse::ok())
    } else {
        Json(HealthResponse {
            status: "degraded".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::AppCache;
    use crate::pricing::engine::{LocalBackend, PricingEngine};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;

    fn amount_of(money: &serde_json::Value) -> Decimal {
        money["amount"].as_str().unwrap().parse().unwrap()
    }

    /// State over a lazy pool: nothing here touches the store, so the
    /// connection is never established.
    fn test_server() -> TestServer {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://pricing@localhost/pricing_test")
            .expect("lazy pool");
        let cache = AppCache::new();
        let engine = Arc::new(PricingEngine::new(
            Arc::new(LocalBackend::new(pool.clone(), cache.clone())),
            None,
        ));
        let state = AppState {
            db: pool,
            cache,
            engine,
        };

        TestServer::new(router().with_state(state)).expect("test server")
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let server = test_server();

        let response = server.get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["status"], "ok");
    }

    #[tokio::test]
    async fn test_allocate_distributes_remainder() {
        let server = test_server();

        let response = server
            .post("/allocate")
            .json(&json!({
                "shared_total": "100.00",
                "diver_count": 3,
                "currency": "MXN"
            }))
            .await;

        response.assert_status_ok();
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["per_diver"]["amount"], "33.33");
        assert_eq!(body["amounts"][0]["amount"], "33.34");
        assert_eq!(body["amounts"][1]["amount"], "33.33");
        assert_eq!(body["amounts"][2]["amount"], "33.33");
    }

    #[tokio::test]
    async fn test_allocate_zero_divers_is_empty_not_error() {
        let server = test_server();

        let response = server
            .post("/allocate")
            .json(&json!({
                "shared_total": "100.00",
                "diver_count": 0
            }))
            .await;

        response.assert_status_ok();
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["per_diver"]["amount"], "0");
        assert_eq!(body["amounts"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_totals_roundtrip() {
        let server = test_server();

        let response = server
            .post("/totals")
            .json(&json!({
                "lines": [{
                    "key": "boat",
                    "allocation": "shared",
                    "shop_cost_amount": "1000.00",
                    "shop_cost_currency": "MXN",
                    "customer_charge_amount": "1200.00",
                    "customer_charge_currency": "MXN"
                }],
                "diver_count": 4,
                "currency": "MXN",
                "equipment_rentals": [{
                    "unit_cost_amount": "10.00",
                    "unit_charge_amount": "25.00",
                    "quantity": 2
                }]
            }))
            .await;

        response.assert_status_ok();
        let body = response.json::<serde_json::Value>();
        assert_eq!(amount_of(&body["shared_cost_per_diver"]), dec!(250));
        assert_eq!(amount_of(&body["total_cost_per_diver"]), dec!(270));
        assert_eq!(amount_of(&body["total_charge_per_diver"]), dec!(350));
        assert_eq!(amount_of(&body["margin_per_diver"]), dec!(80));
        assert_eq!(body["currency"], "MXN");
    }

    #[tokio::test]
    async fn test_totals_currency_mismatch_is_structured_error() {
        let server = test_server();

        let response = server
            .post("/totals")
            .json(&json!({
                "lines": [{
                    "key": "boat",
                    "allocation": "shared",
                    "shop_cost_amount": "1000.00",
                    "shop_cost_currency": "USD",
                    "customer_charge_amount": "1200.00",
                    "customer_charge_currency": "USD"
                }],
                "diver_count": 4,
                "currency": "MXN"
            }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["error_type"], "currency_mismatch");
        assert_eq!(body["details"]["right"], "USD");
    }

    #[tokio::test]
    async fn test_boat_cost_rejects_non_positive_diver_count() {
        let server = test_server();

        let response = server
            .post("/boat-cost")
            .json(&json!({
                "dive_site_id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
                "diver_count": 0
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["error_type"], "invalid_input");
    }

    #[tokio::test]
    async fn test_gas_fills_rejects_non_positive_fills_count() {
        let server = test_server();

        let response = server
            .post("/gas-fills")
            .json(&json!({
                "dive_shop_id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
                "gas_type": "air",
                "fills_count": -1
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["error_type"], "invalid_input");
    }
}
