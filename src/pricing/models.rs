//! Reference-data records for pricing queries.
//!
//! These models use sqlx's FromRow derive for direct row deserialization.
//! The engine only ever reads them; each calculation treats the records it
//! fetched as an immutable snapshot.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Agreement scope for tiered boat charter pricing at a dive site.
pub const SCOPE_VENDOR_PRICING: &str = "vendor_pricing";
/// Agreement scope for gas vendor pricing held by a dive shop.
pub const SCOPE_GAS_VENDOR_PRICING: &str = "gas_vendor_pricing";

/// A scoped, time-bounded vendor contract holding pricing terms.
#[derive(Debug, Clone, FromRow)]
pub struct Agreement {
    pub id: Uuid,
    pub scope_type: String,
    pub scope_ref_id: Uuid,
    pub party_a_id: Option<Uuid>,
    pub party_b_id: Option<Uuid>,
    pub terms: serde_json::Value,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub current_version: i32,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Agreement {
    /// Check if agreement is valid at the given time
    pub fn is_valid_at(&self, check_time: DateTime<Utc>) -> bool {
        if self.deleted_at.is_some() {
            return false;
        }
        if self.valid_from > check_time {
            return false;
        }
        match self.valid_to {
            Some(end) => check_time < end,
            None => true,
        }
    }
}

/// A priced catalog entry at one scope level of the resolution hierarchy.
///
/// Exactly one scope combination applies per tier; the tier queries enforce
/// the mutual exclusivity, not the record itself.
#[derive(Debug, Clone, FromRow)]
pub struct Price {
    pub id: Uuid,
    pub catalog_item_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub cost_amount: Option<Decimal>,
    pub cost_currency: Option<String>,
    pub organization_id: Option<Uuid>,
    pub party_id: Option<Uuid>,
    pub agreement_id: Option<Uuid>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub priority: i32,
}

/// A priceable good or service definition.
#[derive(Debug, Clone, FromRow)]
pub struct CatalogItem {
    pub id: Uuid,
    pub display_name: String,
    pub active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}
