//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no store access. The store-backed
//! entry points in [`super::services`] resolve reference data and then
//! delegate the arithmetic here.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{round_money, CurrencyMismatch, Money};
use crate::pricing::terms::{BoatCharterTerms, GasFillTerms};

/// How a pricing line is split across the excursion roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Allocation {
    /// One amount for the whole excursion, divided across divers.
    Shared,
    /// Charged individually to each diver, no division.
    PerDiver,
}

/// Result of shared cost allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationResult {
    pub per_diver: Money,
    pub amounts: Vec<Money>,
}

/// Allocate shared costs evenly among divers with remainder handling.
///
/// Uses banker's rounding, then distributes any remainder (due to rounding)
/// to the first N divers in 0.01 increments, lowest index first. The returned
/// amounts always sum to exactly `shared_total` - no penny is lost or gained.
///
/// A non-positive `diver_count` yields `(0, [])` rather than an error; there
/// is simply nobody to allocate to.
///
/// # Arguments
/// * `shared_total` - Total amount to allocate
/// * `diver_count` - Number of divers to split among
/// * `currency` - Currency code (e.g., "MXN")
pub fn allocate_shared_costs(
    shared_total: Decimal,
    diver_count: i32,
    currency: &str,
) -> AllocationResult {
    if diver_count <= 0 {
        return AllocationResult {
            per_diver: Money::zero(currency),
            amounts: vec![],
        };
    }

    // Calculate base per-diver amount with banker's rounding
    let per_diver = round_money(shared_total / Decimal::from(diver_count), 2);

    // Calculate actual total after rounding
    let allocated = per_diver * Decimal::from(diver_count);

    // Calculate remainder (can be positive or negative due to rounding)
    let remainder = shared_total - allocated;

    // Build list of per-diver amounts
    let mut amounts: Vec<Money> = (0..diver_count)
        .map(|_| Money::new(per_diver, currency))
        .collect();

    // Distribute remainder in 0.01 increments to first N divers
    if remainder != Decimal::ZERO {
        let increment = if remainder > Decimal::ZERO {
            Decimal::new(1, 2) // 0.01
        } else {
            Decimal::new(-1, 2) // -0.01
        };

        let adjustments_needed = (remainder.abs() / Decimal::new(1, 2))
            .floor()
            .to_i32()
            .unwrap_or(0) as usize;

        for i in 0..adjustments_needed.min(amounts.len()) {
            amounts[i].amount += increment;
        }
    }

    AllocationResult {
        per_diver: Money::new(per_diver, currency),
        amounts,
    }
}

/// Tier math for a boat charter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoatTierBreakdown {
    pub total: Decimal,
    pub per_diver: Decimal,
    pub overage_count: i32,
    pub currency: String,
}

/// Apply tiered boat pricing: the base cost covers up to `included_divers`,
/// each diver beyond that adds `overage_per_diver`.
///
/// `diver_count` must be positive; the store-backed caller validates it.
pub fn calculate_boat_tier(terms: &BoatCharterTerms, diver_count: i32) -> BoatTierBreakdown {
    let (total, overage_count) = if diver_count <= terms.included_divers {
        (terms.base_cost, 0)
    } else {
        let overage = diver_count - terms.included_divers;
        (
            terms.base_cost + Decimal::from(overage) * terms.overage_per_diver,
            overage,
        )
    };

    // Per-diver share (banker's rounding)
    let per_diver = round_money(total / Decimal::from(diver_count), 2);

    BoatTierBreakdown {
        total,
        per_diver,
        overage_count,
        currency: terms.currency.clone(),
    }
}

/// Per-fill and total amounts for a gas fill order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasFillQuote {
    pub cost_per_fill: Decimal,
    pub charge_per_fill: Decimal,
    pub total_cost: Decimal,
    pub total_charge: Decimal,
    pub currency: String,
}

/// Price a gas fill order from agreement terms.
///
/// The customer charge override (e.g. fills bundled into a package price)
/// replaces the agreement's charge per fill when present. Totals are plain
/// multiplication - the per-fill amounts are already at minor-unit precision
/// and `fills_count` is integral, so no rounding is introduced.
pub fn calculate_gas_quote(
    terms: &GasFillTerms,
    fills_count: i32,
    customer_charge_override: Option<Decimal>,
) -> GasFillQuote {
    let charge_per_fill = customer_charge_override.unwrap_or(terms.charge);

    GasFillQuote {
        cost_per_fill: terms.cost,
        charge_per_fill,
        total_cost: terms.cost * Decimal::from(fills_count),
        total_charge: charge_per_fill * Decimal::from(fills_count),
        currency: terms.currency.clone(),
    }
}

/// Input for a pricing line (used in calculate_totals)
#[derive(Debug, Clone)]
pub struct PricingLineInput {
    pub key: String,
    pub allocation: Allocation,
    pub shop_cost: Money,
    pub customer_charge: Money,
}

/// Input for equipment rental (used in calculate_totals)
#[derive(Debug, Clone)]
pub struct EquipmentRentalInput {
    pub unit_cost: Money,
    pub unit_charge: Money,
    pub quantity: i32,
}

/// Result of pricing totals calculation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingTotalsResult {
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

/// Calculate pricing totals from lines.
///
/// Aggregates shared and per-diver costs/charges, calculates per-diver
/// shares, and computes margin. Equipment rentals are always per-diver.
///
/// Every line and rental must be in the requested currency; a mixed-currency
/// input fails with [`CurrencyMismatch`] instead of adding unlike units.
///
/// The per-diver share here is a rate, not a penny-exact split: unlike
/// [`allocate_shared_costs`] no remainder is redistributed, so summing the
/// rate across divers may drift from the shared total by a few cents.
pub fn calculate_totals(
    lines: &[PricingLineInput],
    diver_count: i32,
    currency: &str,
    equipment_rentals: Option<&[EquipmentRentalInput]>,
) -> Result<PricingTotalsResult, CurrencyMismatch> {
    let mut shared_cost = Money::zero(currency);
    let mut shared_charge = Money::zero(currency);
    let mut per_diver_cost = Money::zero(currency);
    let mut per_diver_charge = Money::zero(currency);

    for line in lines {
        match line.allocation {
            Allocation::Shared => {
                shared_cost = shared_cost.checked_add(&line.shop_cost)?;
                shared_charge = shared_charge.checked_add(&line.customer_charge)?;
            }
            Allocation::PerDiver => {
                per_diver_cost = per_diver_cost.checked_add(&line.shop_cost)?;
                per_diver_charge = per_diver_charge.checked_add(&line.customer_charge)?;
            }
        }
    }

    // Add equipment rentals to per-diver totals
    if let Some(rentals) = equipment_rentals {
        for rental in rentals {
            let quantity = Decimal::from(rental.quantity);
            per_diver_cost = per_diver_cost.checked_add(&rental.unit_cost.multiply(quantity))?;
            per_diver_charge =
                per_diver_charge.checked_add(&rental.unit_charge.multiply(quantity))?;
        }
    }

    // Per-diver share of shared costs
    let (shared_cost_per_diver, shared_charge_per_diver) = if diver_count > 0 {
        (
            Money::new(
                round_money(shared_cost.amount / Decimal::from(diver_count), 2),
                currency,
            ),
            Money::new(
                round_money(shared_charge.amount / Decimal::from(diver_count), 2),
                currency,
            ),
        )
    } else {
        (Money::zero(currency), Money::zero(currency))
    };

    // Totals per diver
    let total_cost_per_diver = shared_cost_per_diver.checked_add(&per_diver_cost)?;
    let total_charge_per_diver = shared_charge_per_diver.checked_add(&per_diver_charge)?;
    let margin_per_diver = total_charge_per_diver.checked_sub(&total_cost_per_diver)?;

    Ok(PricingTotalsResult {
        shared_cost,
        shared_charge,
        per_diver_cost,
        per_diver_charge,
        shared_cost_per_diver,
        shared_charge_per_diver,
        total_cost_per_diver,
        total_charge_per_diver,
        margin_per_diver,
        diver_count,
        currency: currency.to_string(),
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Whatever the cent-expressible total and roster size, the
        /// allocated amounts sum back to the total exactly.
        #[test]
        fn allocation_sum_equals_shared_total(
            cents in 0i64..100_000_000i64,
            divers in 1i32..200i32
        ) {
            let shared_total = Decimal::new(cents, 2);
            let result = allocate_shared_costs(shared_total, divers, "MXN");

            prop_assert_eq!(result.amounts.len(), divers as usize);
            let sum: Decimal = result.amounts.iter().map(|m| m.amount).sum();
            prop_assert_eq!(sum, shared_total);
        }

        /// Adjusted entries form a prefix of the list: once an entry equals
        /// the canonical per-diver amount, every later entry does too.
        #[test]
        fn allocation_adjustments_are_prefix_ordered(
            cents in 0i64..10_000_000i64,
            divers in 1i32..100i32
        ) {
            let shared_total = Decimal::new(cents, 2);
            let result = allocate_shared_costs(shared_total, divers, "MXN");

            let mut seen_unadjusted = false;
            for m in &result.amounts {
                if m.amount == result.per_diver.amount {
                    seen_unadjusted = true;
                } else {
                    prop_assert!(!seen_unadjusted);
                }
            }
        }
    }
}
