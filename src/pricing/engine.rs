//! Pricing back-ends and the delegation facade.
//!
//! Two interchangeable implementations sit behind [`PricingEngine`]: the
//! in-process [`LocalBackend`] and a [`RemoteBackend`] reached over HTTP.
//! The facade owns the fallback policy - transport unavailability of the
//! remote engine is absorbed by serving the request locally, while every
//! other error propagates unchanged. Callers observe identical semantics
//! regardless of which back-end answered.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

use crate::cache::AppCache;

use super::calculators;
use super::client::PricingClient;
use super::requests::{
    AllocateSharedCostsRequest, CalculateBoatCostRequest, CalculateGasFillsRequest,
    CalculateTotalsRequest, ResolvePricingRequest,
};
use super::responses::{
    AllocationResponse, BoatCostResponse, GasFillResponse, PricingResolutionResponse,
    PricingTotalsResponse,
};
use super::services::{self, PricingError};

/// One pricing calculation back-end.
///
/// Both implementations are pure over their inputs plus read-only reference
/// data; any number of calculations may run concurrently.
#[async_trait]
pub trait PricingBackend: Send + Sync {
    async fn boat_cost(
        &self,
        request: &CalculateBoatCostRequest,
    ) -> Result<BoatCostResponse, PricingError>;

    async fn gas_fills(
        &self,
        request: &CalculateGasFillsRequest,
    ) -> Result<GasFillResponse, PricingError>;

    async fn resolve(
        &self,
        request: &ResolvePricingRequest,
    ) -> Result<PricingResolutionResponse, PricingError>;

    async fn allocate(
        &self,
        request: &AllocateSharedCostsRequest,
    ) -> Result<AllocationResponse, PricingError>;

    async fn totals(
        &self,
        request: &CalculateTotalsRequest,
    ) -> Result<PricingTotalsResponse, PricingError>;

    async fn health(&self) -> bool;
}

/// In-process back-end working directly against the reference store.
pub struct LocalBackend {
    pool: PgPool,
    cache: AppCache,
}

impl LocalBackend {
    pub fn new(pool: PgPool, cache: AppCache) -> Self {
        Self { pool, cache }
    }
}

#[async_trait]
impl PricingBackend for LocalBackend {
    async fn boat_cost(
        &self,
        request: &CalculateBoatCostRequest,
    ) -> Result<BoatCostResponse, PricingError> {
        services::calculate_boat_cost(
            &self.pool,
            &self.cache,
            request.dive_site_id,
            request.diver_count,
            request.as_of,
        )
        .await
        .map(Into::into)
    }

    async fn gas_fills(
        &self,
        request: &CalculateGasFillsRequest,
    ) -> Result<GasFillResponse, PricingError> {
        services::calculate_gas_fills(
            &self.pool,
            &self.cache,
            request.dive_shop_id,
            &request.gas_type,
            request.fills_count,
            request.customer_charge_override,
            request.as_of,
        )
        .await
        .map(Into::into)
    }

    async fn resolve(
        &self,
        request: &ResolvePricingRequest,
    ) -> Result<PricingResolutionResponse, PricingError> {
        services::resolve_component_pricing(
            &self.pool,
            request.catalog_item_id,
            request.dive_shop_id,
            request.party_id,
            request.agreement_id,
            request.as_of,
        )
        .await
        .map(Into::into)
    }

    async fn allocate(
        &self,
        request: &AllocateSharedCostsRequest,
    ) -> Result<AllocationResponse, PricingError> {
        Ok(calculators::allocate_shared_costs(
            request.shared_total,
            request.diver_count,
            &request.currency,
        )
        .into())
    }

    async fn totals(
        &self,
        request: &CalculateTotalsRequest,
    ) -> Result<PricingTotalsResponse, PricingError> {
        let lines: Vec<_> = request.lines.iter().map(Into::into).collect();
        let rentals: Vec<_> = request
            .equipment_rentals
            .iter()
            .map(|r| r.to_input(&request.currency))
            .collect();

        let result = calculators::calculate_totals(
            &lines,
            request.diver_count,
            &request.currency,
            Some(&rentals),
        )?;

        Ok(result.into())
    }

    async fn health(&self) -> bool {
        true
    }
}

/// Back-end delegating to a remote pricing engine over HTTP.
pub struct RemoteBackend {
    client: PricingClient,
}

impl RemoteBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: PricingClient::new(base_url, timeout)?,
        })
    }
}

#[async_trait]
impl PricingBackend for RemoteBackend {
    async fn boat_cost(
        &self,
        request: &CalculateBoatCostRequest,
    ) -> Result<BoatCostResponse, PricingError> {
        self.client.boat_cost(request).await
    }

    async fn gas_fills(
        &self,
        request: &CalculateGasFillsRequest,
    ) -> Result<GasFillResponse, PricingError> {
        self.client.gas_fills(request).await
    }

    async fn resolve(
        &self,
        request: &ResolvePricingRequest,
    ) -> Result<PricingResolutionResponse, PricingError> {
        self.client.resolve(request).await
    }

    async fn allocate(
        &self,
        request: &AllocateSharedCostsRequest,
    ) -> Result<AllocationResponse, PricingError> {
        self.client.allocate(request).await
    }

    async fn totals(
        &self,
        request: &CalculateTotalsRequest,
    ) -> Result<PricingTotalsResponse, PricingError> {
        self.client.totals(request).await
    }

    async fn health(&self) -> bool {
        self.client.health().await
    }
}

/// Facade selecting between the local and remote back-ends.
///
/// With no remote configured every request is served locally. With a remote
/// configured the remote is tried first; if it cannot be reached the request
/// is transparently served by the local back-end with a warning, never an
/// error. Structured errors from the remote propagate as-is.
pub struct PricingEngine {
    local: Arc<dyn PricingBackend>,
    remote: Option<Arc<dyn PricingBackend>>,
}

impl PricingEngine {
    pub fn new(local: Arc<dyn PricingBackend>, remote: Option<Arc<dyn PricingBackend>>) -> Self {
        Self { local, remote }
    }

    pub async fn boat_cost(
        &self,
        request: &CalculateBoatCostRequest,
    ) -> Result<BoatCostResponse, PricingError> {
        if let Some(remote) = &self.remote {
            match remote.boat_cost(request).await {
                Err(e) if e.is_unavailable() => log_fallback("boat-cost", &e),
                other => return other,
            }
        }
        self.local.boat_cost(request).await
    }

    pub async fn gas_fills(
        &self,
        request: &CalculateGasFillsRequest,
    ) -> Result<GasFillResponse, PricingError> {
        if let Some(remote) = &self.remote {
            match remote.gas_fills(request).await {
                Err(e) if e.is_unavailable() => log_fallback("gas-fills", &e),
                other => return other,
            }
        }
        self.local.gas_fills(request).await
    }

    pub async fn resolve(
        &self,
        request: &ResolvePricingRequest,
    ) -> Result<PricingResolutionResponse, PricingError> {
        if let Some(remote) = &self.remote {
            match remote.resolve(request).await {
                Err(e) if e.is_unavailable() => log_fallback("resolve", &e),
                other => return other,
            }
        }
        self.local.resolve(request).await
    }

    pub async fn allocate(
        &self,
        request: &AllocateSharedCostsRequest,
    ) -> Result<AllocationResponse, PricingError> {
        if let Some(remote) = &self.remote {
            match remote.allocate(request).await {
                Err(e) if e.is_unavailable() => log_fallback("allocate", &e),
                other => return other,
            }
        }
        self.local.allocate(request).await
    }

    pub async fn totals(
        &self,
        request: &CalculateTotalsRequest,
    ) -> Result<PricingTotalsResponse, PricingError> {
        if let Some(remote) = &self.remote {
            match remote.totals(request).await {
                Err(e) if e.is_unavailable() => log_fallback("totals", &e),
                other => return other,
            }
        }
        self.local.totals(request).await
    }

    /// Health of whichever back-end would serve the next request; the
    /// local back-end is always considered available.
    pub async fn health(&self) -> bool {
        self.local.health().await
    }
}

fn log_fallback(operation: &str, err: &PricingError) {
    warn!(
        "Remote pricing engine unavailable for {}, serving locally: {}",
        operation, err
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted back-end for exercising the fallback policy without a store
    /// or a network.
    enum Script {
        Allocate(AllocationResponse),
        Fail(fn() -> PricingError),
    }

    struct ScriptedBackend {
        script: Script,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn allocating(response: AllocationResponse) -> Self {
            Self {
                script: Script::Allocate(response),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(make_error: fn() -> PricingError) -> Self {
            Self {
                script: Script::Fail(make_error),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn answer<T>(&self, ok: impl FnOnce(&AllocationResponse) -> T) -> Result<T, PricingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.script {
                Script::Allocate(response) => Ok(ok(response)),
                Script::Fail(make_error) => Err(make_error()),
            }
        }
    }

    #[async_trait]
    impl PricingBackend for ScriptedBackend {
        async fn boat_cost(
            &self,
            _request: &CalculateBoatCostRequest,
        ) -> Result<BoatCostResponse, PricingError> {
            self.answer(|_| unreachable!("boat_cost not scripted"))
        }

        async fn gas_fills(
            &self,
            _request: &CalculateGasFillsRequest,
        ) -> Result<GasFillResponse, PricingError> {
            self.answer(|_| unreachable!("gas_fills not scripted"))
        }

        async fn resolve(
            &self,
            _request: &ResolvePricingRequest,
        ) -> Result<PricingResolutionResponse, PricingError> {
            self.answer(|_| unreachable!("resolve not scripted"))
        }

        async fn allocate(
            &self,
            _request: &AllocateSharedCostsRequest,
        ) -> Result<AllocationResponse, PricingError> {
            self.answer(Clone::clone)
        }

        async fn totals(
            &self,
            _request: &CalculateTotalsRequest,
        ) -> Result<PricingTotalsResponse, PricingError> {
            self.answer(|_| unreachable!("totals not scripted"))
        }

        async fn health(&self) -> bool {
            !matches!(self.script, Script::Fail(_))
        }
    }

    fn allocation(amount: Decimal) -> AllocationResponse {
        AllocationResponse {
            per_diver: Money::new(amount, "MXN"),
            amounts: vec![Money::new(amount, "MXN")],
        }
    }

    fn allocate_request() -> AllocateSharedCostsRequest {
        AllocateSharedCostsRequest {
            shared_total: dec!(100),
            diver_count: 1,
            currency: "MXN".to_string(),
        }
    }

    fn unavailable() -> PricingError {
        PricingError::ServiceUnavailable {
            reason: "connection refused".to_string(),
        }
    }

    fn missing_agreement() -> PricingError {
        PricingError::MissingVendorAgreement {
            scope_type: "vendor_pricing".to_string(),
            scope_ref: "DiveSite:abc".to_string(),
        }
    }

    #[tokio::test]
    async fn test_no_remote_serves_locally() {
        let local = Arc::new(ScriptedBackend::allocating(allocation(dec!(100))));
        let engine = PricingEngine::new(local.clone(), None);

        let result = engine.allocate(&allocate_request()).await.unwrap();
        assert_eq!(result.per_diver.amount, dec!(100));
        assert_eq!(local.call_count(), 1);
    }

    #[tokio::test]
    async fn test_remote_result_wins_when_reachable() {
        let local = Arc::new(ScriptedBackend::allocating(allocation(dec!(1))));
        let remote = Arc::new(ScriptedBackend::allocating(allocation(dec!(2))));
        let engine = PricingEngine::new(local.clone(), Some(remote.clone()));

        let result = engine.allocate(&allocate_request()).await.unwrap();
        assert_eq!(result.per_diver.amount, dec!(2));
        assert_eq!(remote.call_count(), 1);
        assert_eq!(local.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_remote_falls_back_transparently() {
        let local = Arc::new(ScriptedBackend::allocating(allocation(dec!(100))));
        let remote = Arc::new(ScriptedBackend::failing(unavailable));
        let engine = PricingEngine::new(local.clone(), Some(remote.clone()));

        // The caller sees the correct local result and no error at all.
        let result = engine.allocate(&allocate_request()).await.unwrap();
        assert_eq!(result.per_diver.amount, dec!(100));
        assert_eq!(remote.call_count(), 1);
        assert_eq!(local.call_count(), 1);
    }

    #[tokio::test]
    async fn test_remote_domain_error_propagates_without_fallback() {
        let local = Arc::new(ScriptedBackend::allocating(allocation(dec!(100))));
        let remote = Arc::new(ScriptedBackend::failing(missing_agreement));
        let engine = PricingEngine::new(local.clone(), Some(remote.clone()));

        let err = engine.allocate(&allocate_request()).await.unwrap_err();
        assert_eq!(err.error_type(), "missing_vendor_agreement");
        // A domain outcome from the remote is the answer; local is not consulted.
        assert_eq!(local.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_surfaces_only_when_local_also_fails() {
        let local = Arc::new(ScriptedBackend::failing(unavailable));
        let remote = Arc::new(ScriptedBackend::failing(unavailable));
        let engine = PricingEngine::new(local, Some(remote));

        let err = engine.allocate(&allocate_request()).await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
