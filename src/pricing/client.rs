//! HTTP client for a remote pricing engine.
//!
//! Speaks the same JSON contract this service exposes, so one deployment can
//! delegate its calculations to another. Transport-level failures map to
//! [`PricingError::ServiceUnavailable`] (which the facade turns into a local
//! fallback); structured error bodies are translated back into the exact
//! taxonomy the local implementation raises, so callers cannot tell the
//! back-ends apart by their failures.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::money::CurrencyMismatch;

use super::requests::{
    AllocateSharedCostsRequest, CalculateBoatCostRequest, CalculateGasFillsRequest,
    CalculateTotalsRequest, ResolvePricingRequest,
};
use super::responses::{
    AllocationResponse, BoatCostResponse, GasFillResponse, HealthResponse,
    PricingErrorResponse, PricingResolutionResponse, PricingTotalsResponse,
};
use super::services::PricingError;

/// Client for a remote pricing engine instance.
#[derive(Clone)]
pub struct PricingClient {
    http: reqwest::Client,
    base_url: String,
}

impl PricingClient {
    /// Build a client with bounded request and connect timeouts.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;

        let base_url: String = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn boat_cost(
        &self,
        request: &CalculateBoatCostRequest,
    ) -> Result<BoatCostResponse, PricingError> {
        self.post("/boat-cost", request).await
    }

    pub async fn gas_fills(
        &self,
        request: &CalculateGasFillsRequest,
    ) -> Result<GasFillResponse, PricingError> {
        self.post("/gas-fills", request).await
    }

    pub async fn resolve(
        &self,
        request: &ResolvePricingRequest,
    ) -> Result<PricingResolutionResponse, PricingError> {
        self.post("/resolve", request).await
    }

    pub async fn allocate(
        &self,
        request: &AllocateSharedCostsRequest,
    ) -> Result<AllocationResponse, PricingError> {
        self.post("/allocate", request).await
    }

    pub async fn totals(
        &self,
        request: &CalculateTotalsRequest,
    ) -> Result<PricingTotalsResponse, PricingError> {
        self.post("/totals", request).await
    }

    /// Check whether the remote engine is up and answering.
    pub async fn health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http.get(url).send().await {
            Ok(response) if response.status().is_success() => response
                .json::<HealthResponse>()
                .await
                .map(|h| h.is_ok())
                .unwrap_or(false),
            Ok(_) => false,
            Err(e) => {
                tracing::warn!("Remote pricing engine health check failed: {}", e);
                false
            }
        }
    }

    async fn post<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp, PricingError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| PricingError::ServiceUnavailable {
                reason: e.to_string(),
            })?;

        if response.status().is_success() {
            return response
                .json::<Resp>()
                .await
                .map_err(|e| PricingError::Internal(format!("invalid engine response: {e}")));
        }

        let status = response.status();
        match response.json::<PricingErrorResponse>().await {
            Ok(body) => Err(translate_error(body)),
            Err(_) => Err(PricingError::Internal(format!(
                "engine returned {status} with no structured error"
            ))),
        }
    }
}

/// Map a wire error back into the local taxonomy.
///
/// Unknown `error_type` values are treated as internal failures and
/// propagate; only transport unavailability is fallback-eligible.
fn translate_error(body: PricingErrorResponse) -> PricingError {
    let details = body.details.unwrap_or(serde_json::Value::Null);
    let detail_str = |key: &str| -> String {
        details
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    match body.error_type.as_str() {
        "invalid_input" => PricingError::InvalidInput(body.message),
        "currency_mismatch" => PricingError::CurrencyMismatch(CurrencyMismatch {
            left: detail_str("left"),
            right: detail_str("right"),
        }),
        "missing_vendor_agreement" => PricingError::MissingVendorAgreement {
            scope_type: detail_str("scope_type"),
            scope_ref: detail_str("scope_ref"),
        },
        "missing_price" => PricingError::MissingPrice {
            catalog_item_id: detail_str("catalog_item_id"),
            context: detail_str("context"),
        },
        "configuration_error" => PricingError::ConfigurationError {
            message: body.message,
            errors: details
                .get("errors")
                .and_then(|v| v.as_array())
                .map(|errors| {
                    errors
                        .iter()
                        .filter_map(|e| e.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
        },
        "service_unavailable" => PricingError::ServiceUnavailable {
            reason: body.message,
        },
        _ => PricingError::Internal(body.message),
    }
}
