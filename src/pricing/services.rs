//! Pricing service functions with store access.
//!
//! These functions fetch reference data (agreements, prices), validate it
//! against the typed terms schemas, and delegate the arithmetic to the pure
//! functions in [`super::calculators`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::AppCache;
use crate::money::{CurrencyMismatch, Money};

use super::calculators::{calculate_boat_tier, calculate_gas_quote};
use super::models::{Agreement, Price, SCOPE_GAS_VENDOR_PRICING, SCOPE_VENDOR_PRICING};
use super::queries;
use super::terms::{BoatCharterTerms, GasFillTerms, TermsError};

/// Result of boat cost calculation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoatCostResult {
    pub total: Money,
    pub per_diver: Money,
    pub base_cost: Money,
    pub overage_count: i32,
    pub overage_per_diver: Money,
    pub included_divers: i32,
    pub diver_count: i32,
    pub agreement_id: Option<Uuid>,
}

/// Result of gas fill pricing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasFillResult {
    pub cost_per_fill: Money,
    pub charge_per_fill: Money,
    pub total_cost: Money,
    pub total_charge: Money,
    pub fills_count: i32,
    pub gas_type: String,
    pub agreement_id: Option<Uuid>,
    pub price_rule_id: Option<Uuid>,
}

/// Result of component pricing resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentPricingResult {
    pub charge_amount: Decimal,
    pub charge_currency: String,
    pub cost_amount: Option<Decimal>,
    pub cost_currency: String,
    pub price_rule_id: Uuid,
    pub has_cost: bool,
}

/// Pricing calculation error taxonomy.
///
/// Everything except `ServiceUnavailable`, `Storage`, and `Internal` is a
/// domain outcome the caller must handle; those three mean the calculation
/// could not run at all. Calculators never suppress errors from deeper
/// layers - only the facade's unavailability fallback intercepts anything.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    CurrencyMismatch(#[from] CurrencyMismatch),

    #[error("no vendor agreement found for {scope_type}:{scope_ref}")]
    MissingVendorAgreement { scope_type: String, scope_ref: String },

    #[error("no price found for catalog item {catalog_item_id} ({context})")]
    MissingPrice {
        catalog_item_id: String,
        context: String,
    },

    #[error("configuration error: {message}")]
    ConfigurationError {
        message: String,
        errors: Vec<String>,
    },

    #[error("pricing engine unavailable: {reason}")]
    ServiceUnavailable { reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// A failure inside a back-end that is not part of the domain taxonomy,
    /// e.g. a storage outage reported by the remote engine.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PricingError {
    /// Wire identifier for the error taxonomy, stable across both back-ends.
    pub fn error_type(&self) -> &'static str {
        match self {
            PricingError::InvalidInput(_) => "invalid_input",
            PricingError::CurrencyMismatch(_) => "currency_mismatch",
            PricingError::MissingVendorAgreement { .. } => "missing_vendor_agreement",
            PricingError::MissingPrice { .. } => "missing_price",
            PricingError::ConfigurationError { .. } => "configuration_error",
            PricingError::ServiceUnavailable { .. } => "service_unavailable",
            PricingError::Storage(_) | PricingError::Internal(_) => "internal_error",
        }
    }

    /// Structured context for the wire error payload.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            PricingError::CurrencyMismatch(e) => Some(serde_json::json!({
                "left": e.left,
                "right": e.right,
            })),
            PricingError::MissingVendorAgreement { scope_type, scope_ref } => {
                Some(serde_json::json!({
                    "scope_type": scope_type,
                    "scope_ref": scope_ref,
                }))
            }
            PricingError::MissingPrice { catalog_item_id, context } => {
                Some(serde_json::json!({
                    "catalog_item_id": catalog_item_id,
                    "context": context,
                }))
            }
            PricingError::ConfigurationError { errors, .. } => {
                Some(serde_json::json!({ "errors": errors }))
            }
            _ => None,
        }
    }

    /// True when the error means the back-end could not be reached at all,
    /// which makes the request eligible for local fallback.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, PricingError::ServiceUnavailable { .. })
    }
}

/// A terms document that exists but fails its schema is a data-entry
/// problem, reported with the offending field path.
fn malformed_terms(agreement_id: Uuid, err: TermsError) -> PricingError {
    PricingError::ConfigurationError {
        message: format!("agreement {agreement_id}: {err}"),
        errors: vec![err.path().to_string()],
    }
}

/// Calculate boat cost using tiered pricing from the site's vendor agreement.
///
/// Looks up the vendor agreement for the given dive site and calculates
/// the total and per-diver boat cost based on the tier structure.
///
/// # Arguments
/// * `pool` - Store connection pool
/// * `cache` - Application cache (for agreement lookup)
/// * `dive_site_id` - UUID of the dive site
/// * `diver_count` - Number of divers on the excursion
/// * `as_of` - Point in time for pricing (default: now)
pub async fn calculate_boat_cost(
    pool: &PgPool,
    cache: &AppCache,
    dive_site_id: Uuid,
    diver_count: i32,
    as_of: Option<DateTime<Utc>>,
) -> Result<BoatCostResult, PricingError> {
    if diver_count <= 0 {
        return Err(PricingError::InvalidInput(
            "diver_count must be positive".to_string(),
        ));
    }

    let agreement = find_site_agreement(pool, cache, dive_site_id, as_of)
        .await?
        .ok_or_else(|| PricingError::MissingVendorAgreement {
            scope_type: SCOPE_VENDOR_PRICING.to_string(),
            scope_ref: format!("DiveSite:{dive_site_id}"),
        })?;

    let terms = BoatCharterTerms::from_terms(&agreement.terms)
        .map_err(|e| malformed_terms(agreement.id, e))?;

    let breakdown = calculate_boat_tier(&terms, diver_count);
    let currency = breakdown.currency;

    Ok(BoatCostResult {
        total: Money::new(breakdown.total, currency.clone()),
        per_diver: Money::new(breakdown.per_diver, currency.clone()),
        base_cost: Money::new(terms.base_cost, currency.clone()),
        overage_count: breakdown.overage_count,
        overage_per_diver: Money::new(terms.overage_per_diver, currency),
        included_divers: terms.included_divers,
        diver_count,
        agreement_id: Some(agreement.id),
    })
}

/// Calculate gas fill costs from the dive shop's gas vendor agreement.
///
/// # Arguments
/// * `pool` - Store connection pool
/// * `cache` - Application cache
/// * `dive_shop_id` - UUID of the dive shop (organization)
/// * `gas_type` - Type of gas (air, ean32, ean36, trimix); case-insensitive
/// * `fills_count` - Number of tank fills
/// * `customer_charge_override` - Optional override for customer charge
/// * `as_of` - Point in time for pricing
pub async fn calculate_gas_fills(
    pool: &PgPool,
    cache: &AppCache,
    dive_shop_id: Uuid,
    gas_type: &str,
    fills_count: i32,
    customer_charge_override: Option<Decimal>,
    as_of: Option<DateTime<Utc>>,
) -> Result<GasFillResult, PricingError> {
    if fills_count <= 0 {
        return Err(PricingError::InvalidInput(
            "fills_count must be positive".to_string(),
        ));
    }

    let agreement = find_shop_gas_agreement(pool, cache, dive_shop_id, as_of)
        .await?
        .ok_or_else(|| PricingError::MissingVendorAgreement {
            scope_type: SCOPE_GAS_VENDOR_PRICING.to_string(),
            scope_ref: format!("Organization:{dive_shop_id}"),
        })?;

    let gas_type_lower = gas_type.to_lowercase();
    let terms = GasFillTerms::for_gas(&agreement.terms, &gas_type_lower)
        .map_err(|e| malformed_terms(agreement.id, e))?;

    let quote = calculate_gas_quote(&terms, fills_count, customer_charge_override);
    let currency = quote.currency;

    Ok(GasFillResult {
        cost_per_fill: Money::new(quote.cost_per_fill, currency.clone()),
        charge_per_fill: Money::new(quote.charge_per_fill, currency.clone()),
        total_cost: Money::new(quote.total_cost, currency.clone()),
        total_charge: Money::new(quote.total_charge, currency),
        fills_count,
        gas_type: gas_type.to_string(),
        agreement_id: Some(agreement.id),
        price_rule_id: None,
    })
}

/// Resolve pricing for a catalog item component.
///
/// Walks the resolution hierarchy, most specific scope first:
/// 1. Agreement-specific
/// 2. Party-specific
/// 3. Organization-specific
/// 4. Global
///
/// The first tier with a match wins; tiers are never merged.
pub async fn resolve_component_pricing(
    pool: &PgPool,
    catalog_item_id: Uuid,
    organization_id: Option<Uuid>,
    party_id: Option<Uuid>,
    agreement_id: Option<Uuid>,
    as_of: Option<DateTime<Utc>>,
) -> Result<ComponentPricingResult, PricingError> {
    let check_time = as_of.unwrap_or_else(Utc::now);

    let mut price: Option<Price> = None;

    // 1. Agreement-specific
    if let Some(agreement) = agreement_id {
        price = queries::find_price_by_agreement(pool, catalog_item_id, agreement, check_time).await?;
    }

    // 2. Party-specific
    if price.is_none() {
        if let Some(party) = party_id {
            price = queries::find_price_by_party(pool, catalog_item_id, party, check_time).await?;
        }
    }

    // 3. Organization-specific
    if price.is_none() {
        if let Some(org) = organization_id {
            price =
                queries::find_price_by_organization(pool, catalog_item_id, org, check_time).await?;
        }
    }

    // 4. Global fallback
    if price.is_none() {
        price = queries::find_global_price(pool, catalog_item_id, check_time).await?;
    }

    let price = match price {
        Some(p) => p,
        None => {
            let context = queries::get_catalog_item(pool, catalog_item_id)
                .await?
                .map(|item| item.display_name)
                .unwrap_or_else(|| "no price found at any scope level".to_string());
            return Err(PricingError::MissingPrice {
                catalog_item_id: catalog_item_id.to_string(),
                context,
            });
        }
    };

    Ok(ComponentPricingResult {
        charge_amount: price.amount,
        charge_currency: price.currency.clone(),
        cost_amount: price.cost_amount,
        // Cost currency defaults to the charge currency when absent
        cost_currency: price.cost_currency.unwrap_or_else(|| price.currency.clone()),
        price_rule_id: price.id,
        has_cost: price.cost_amount.is_some(),
    })
}

/// Agreement lookup for a dive site, cache-first for "now" queries.
///
/// Historical `as_of` queries bypass the cache: the cached entry is the
/// currently-active agreement, which is not necessarily the one that was in
/// force at an arbitrary past instant.
async fn find_site_agreement(
    pool: &PgPool,
    cache: &AppCache,
    dive_site_id: Uuid,
    as_of: Option<DateTime<Utc>>,
) -> Result<Option<Agreement>, PricingError> {
    if let Some(check_time) = as_of {
        return Ok(queries::find_vendor_agreement(
            pool,
            SCOPE_VENDOR_PRICING,
            dive_site_id,
            check_time,
        )
        .await?);
    }

    let now = Utc::now();
    let cache_key = AppCache::agreement_key(SCOPE_VENDOR_PRICING, dive_site_id);

    if let Some(cached) = cache.agreements.get(&cache_key).await {
        if cached.is_valid_at(now) {
            return Ok(Some((*cached).clone()));
        }
    }

    let agreement =
        queries::find_vendor_agreement(pool, SCOPE_VENDOR_PRICING, dive_site_id, now).await?;

    if let Some(found) = &agreement {
        cache
            .agreements
            .insert(cache_key, Arc::new(found.clone()))
            .await;
    }

    Ok(agreement)
}

/// Gas vendor agreement lookup for a dive shop, cache-first for "now" queries.
async fn find_shop_gas_agreement(
    pool: &PgPool,
    cache: &AppCache,
    dive_shop_id: Uuid,
    as_of: Option<DateTime<Utc>>,
) -> Result<Option<Agreement>, PricingError> {
    if let Some(check_time) = as_of {
        return Ok(queries::find_gas_vendor_agreement(pool, dive_shop_id, check_time).await?);
    }

    let now = Utc::now();
    let cache_key = AppCache::agreement_key(SCOPE_GAS_VENDOR_PRICING, dive_shop_id);

    if let Some(cached) = cache.agreements.get(&cache_key).await {
        if cached.is_valid_at(now) {
            return Ok(Some((*cached).clone()));
        }
    }

    let agreement = queries::find_gas_vendor_agreement(pool, dive_shop_id, now).await?;

    if let Some(found) = &agreement {
        cache
            .agreements
            .insert(cache_key, Arc::new(found.clone()))
            .await;
    }

    Ok(agreement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_error_display() {
        let err = PricingError::MissingVendorAgreement {
            scope_type: SCOPE_VENDOR_PRICING.to_string(),
            scope_ref: "DiveSite:abc".to_string(),
        };
        assert!(err.to_string().contains("vendor_pricing"));

        let err = PricingError::MissingPrice {
            catalog_item_id: "123".to_string(),
            context: "test".to_string(),
        };
        assert!(err.to_string().contains("123"));

        let err = PricingError::ConfigurationError {
            message: "test error".to_string(),
            errors: vec![],
        };
        assert!(err.to_string().contains("test error"));
    }

    #[test]
    fn test_error_type_identifiers() {
        assert_eq!(
            PricingError::InvalidInput("x".into()).error_type(),
            "invalid_input"
        );
        assert_eq!(
            PricingError::MissingVendorAgreement {
                scope_type: "vendor_pricing".into(),
                scope_ref: "DiveSite:abc".into(),
            }
            .error_type(),
            "missing_vendor_agreement"
        );
        assert_eq!(
            PricingError::ServiceUnavailable { reason: "down".into() }.error_type(),
            "service_unavailable"
        );
    }

    #[test]
    fn test_missing_agreement_details_carry_scope_context() {
        let err = PricingError::MissingVendorAgreement {
            scope_type: SCOPE_VENDOR_PRICING.to_string(),
            scope_ref: "DiveSite:abc".to_string(),
        };
        let details = err.details().unwrap();
        assert_eq!(details["scope_type"], "vendor_pricing");
        assert_eq!(details["scope_ref"], "DiveSite:abc");
    }

    #[test]
    fn test_malformed_terms_carries_field_path() {
        let id = Uuid::new_v4();
        let err = malformed_terms(
            id,
            TermsError::MissingField {
                path: "boat_charter.base_cost".to_string(),
            },
        );
        match err {
            PricingError::ConfigurationError { message, errors } => {
                assert!(message.contains(&id.to_string()));
                assert_eq!(errors, vec!["boat_charter.base_cost".to_string()]);
            }
            other => panic!("expected ConfigurationError, got {other:?}"),
        }
    }

    #[test]
    fn test_only_unavailable_is_fallback_eligible() {
        assert!(PricingError::ServiceUnavailable { reason: "x".into() }.is_unavailable());
        assert!(!PricingError::InvalidInput("x".into()).is_unavailable());
        assert!(!PricingError::MissingPrice {
            catalog_item_id: "c".into(),
            context: "ctx".into()
        }
        .is_unavailable());
    }
}
