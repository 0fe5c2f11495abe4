//! Response DTOs for the pricing API.
//!
//! Monetary amounts serialize as decimal strings (see [`crate::money::Money`])
//! so nothing is lost crossing the JSON boundary. The remote-engine client
//! deserializes these same shapes back.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;
use crate::pricing::calculators::{AllocationResult, PricingTotalsResult};
use crate::pricing::services::{
    BoatCostResult, ComponentPricingResult, GasFillResult, PricingError,
};

/// Response for boat cost calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoatCostResponse {
    pub total: Money,
    pub per_diver: Money,
    pub base_cost: Money,
    pub overage_count: i32,
    pub overage_per_diver: Money,
    pub included_divers: i32,
    pub diver_count: i32,
    pub agreement_id: Option<Uuid>,
}

impl From<BoatCostResult> for BoatCostResponse {
    fn from(r: BoatCostResult) -> Self {
        Self {
            total: r.total,
            per_diver: r.per_diver,
            base_cost: r.base_cost,
            overage_count: r.overage_count,
            overage_per_diver: r.overage_per_diver,
            included_divers: r.included_divers,
            diver_count: r.diver_count,
            agreement_id: r.agreement_id,
        }
    }
}

/// Response for gas fill calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasFillResponse {
    pub cost_per_fill: Money,
    pub charge_per_fill: Money,
    pub total_cost: Money,
    pub total_charge: Money,
    pub fills_count: i32,
    pub gas_type: String,
    pub agreement_id: Option<Uuid>,
    pub price_rule_id: Option<Uuid>,
}

impl From<GasFillResult> for GasFillResponse {
    fn from(r: GasFillResult) -> Self {
        Self {
            cost_per_fill: r.cost_per_fill,
            charge_per_fill: r.charge_per_fill,
            total_cost: r.total_cost,
            total_charge: r.total_charge,
            fills_count: r.fills_count,
            gas_type: r.gas_type,
            agreement_id: r.agreement_id,
            price_rule_id: r.price_rule_id,
        }
    }
}

/// Response for component pricing resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingResolutionResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub charge_amount: Decimal,
    pub charge_currency: String,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub cost_amount: Option<Decimal>,
    pub cost_currency: String,
    pub price_rule_id: Uuid,
    pub has_cost: bool,
}

impl From<ComponentPricingResult> for PricingResolutionResponse {
    fn from(r: ComponentPricingResult) -> Self {
        Self {
            charge_amount: r.charge_amount,
            charge_currency: r.charge_currency,
            cost_amount: r.cost_amount,
            cost_currency: r.cost_currency,
            price_rule_id: r.price_rule_id,
            has_cost: r.has_cost,
        }
    }
}

/// Response for shared cost allocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationResponse {
    pub per_diver: Money,
    pub amounts: Vec<Money>,
}

impl From<AllocationResult> for AllocationResponse {
    fn from(r: AllocationResult) -> Self {
        Self {
            per_diver: r.per_diver,
            amounts: r.amounts,
        }
    }
}

/// Response for pricing totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingTotalsResponse {
    pub shared_cost: Money,
    pub shared_charge: Money,
    pub per_diver_cost: Money,
    pub per_diver_charge: Money,
    pub shared_cost_per_diver: Money,
    pub shared_charge_per_diver: Money,
    pub total_cost_per_diver: Money,
    pub total_charge_per_diver: Money,
    pub margin_per_diver: Money,
    pub diver_count: i32,
    pub currency: String,
}

impl From<PricingTotalsResult> for PricingTotalsResponse {
    fn from(r: PricingTotalsResult) -> Self {
        Self {
            shared_cost: r.shared_cost,
            shared_charge: r.shared_charge,
            per_diver_cost: r.per_diver_cost,
            per_diver_charge: r.per_diver_charge,
            shared_cost_per_diver: r.shared_cost_per_diver,
            shared_charge_per_diver: r.shared_charge_per_diver,
            total_cost_per_diver: r.total_cost_per_diver,
            total_charge_per_diver: r.total_charge_per_diver,
            margin_per_diver: r.margin_per_diver,
            diver_count: r.diver_count,
            currency: r.currency,
        }
    }
}

/// Health check response; the facade uses it to judge remote availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Wire shape for pricing errors, identical from either back-end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&PricingError> for PricingErrorResponse {
    fn from(err: &PricingError) -> Self {
        Self {
            error_type: err.error_type().to_string(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amounts_serialize_as_strings() {
        let response = AllocationResponse {
            per_diver: Money::new(dec!(33.33), "MXN"),
            amounts: vec![Money::new(dec!(33.34), "MXN")],
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["per_diver"]["amount"], "33.33");
        assert_eq!(json["amounts"][0]["amount"], "33.34");
    }

    #[test]
    fn test_error_response_carries_taxonomy() {
        let err = PricingError::MissingVendorAgreement {
            scope_type: "vendor_pricing".to_string(),
            scope_ref: "DiveSite:abc".to_string(),
        };

        let body = PricingErrorResponse::from(&err);
        assert_eq!(body.error_type, "missing_vendor_agreement");
        assert_eq!(body.details.unwrap()["scope_ref"], "DiveSite:abc");
    }
}
