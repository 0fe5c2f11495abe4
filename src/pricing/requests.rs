//! Request DTOs for the pricing API.
//!
//! The same shapes serve both sides of the facade: the axum handlers
//! deserialize them, and the remote-engine client serializes them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;
use crate::pricing::calculators::{Allocation, EquipmentRentalInput, PricingLineInput};

/// Request to calculate boat cost
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateBoatCostRequest {
    pub dive_site_id: Uuid,
    pub diver_count: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
}

/// Request to calculate gas fills
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateGasFillsRequest {
    pub dive_shop_id: Uuid,
    pub gas_type: String,
    pub fills_count: i32,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub customer_charge_override: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
}

/// Request to resolve component pricing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvePricingRequest {
    pub catalog_item_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dive_shop_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agreement_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
}

/// Request to allocate shared costs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocateSharedCostsRequest {
    #[serde(with = "rust_decimal::serde::str")]
    pub shared_total: Decimal,
    pub diver_count: i32,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "MXN".to_string()
}

/// Request to calculate full pricing totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateTotalsRequest {
    pub lines: Vec<PricingLineRequest>,
    pub diver_count: i32,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub equipment_rentals: Vec<EquipmentRentalRequest>,
}

/// A pricing line in the request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingLineRequest {
    pub key: String,
    pub allocation: Allocation,
    #[serde(with = "rust_decimal::serde::str")]
    pub shop_cost_amount: Decimal,
    pub shop_cost_currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub customer_charge_amount: Decimal,
    pub customer_charge_currency: String,
}

impl From<&PricingLineRequest> for PricingLineInput {
    fn from(line: &PricingLineRequest) -> Self {
        PricingLineInput {
            key: line.key.clone(),
            allocation: line.allocation,
            shop_cost: Money::new(line.shop_cost_amount, line.shop_cost_currency.clone()),
            customer_charge: Money::new(
                line.customer_charge_amount,
                line.customer_charge_currency.clone(),
            ),
        }
    }
}

/// Equipment rental in the request; amounts are in the request currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentRentalRequest {
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_cost_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_charge_amount: Decimal,
    pub quantity: i32,
}

impl EquipmentRentalRequest {
    pub fn to_input(&self, currency: &str) -> EquipmentRentalInput {
        EquipmentRentalInput {
            unit_cost: Money::new(self.unit_cost_amount, currency),
            unit_charge: Money::new(self.unit_charge_amount, currency),
            quantity: self.quantity,
        }
    }
}
