//! Reference-data queries for the pricing engine.
//!
//! Every query is validity-window filtered and soft-delete aware. The price
//! resolution tiers are separate queries so each tier's scope exclusivity is
//! enforced in SQL, never merged in code.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Agreement, CatalogItem, Price, SCOPE_GAS_VENDOR_PRICING, SCOPE_VENDOR_PRICING};

/// Find the vendor agreement scoped to a reference (e.g. a dive site),
/// valid at `check_time`. Latest-starting agreement wins.
pub async fn find_vendor_agreement(
    pool: &PgPool,
    scope_type: &str,
    scope_ref_id: Uuid,
    check_time: DateTime<Utc>,
) -> Result<Option<Agreement>, sqlx::Error> {
    sqlx::query_as::<_, Agreement>(
        r#"
        SELECT
            id, scope_type, scope_ref_id, party_a_id, party_b_id,
            terms, valid_from, valid_to, current_version, deleted_at
        FROM agreements
        WHERE scope_type = $1
          AND scope_ref_id = $2
          AND valid_from <= $3
          AND (valid_to IS NULL OR valid_to > $3)
          AND deleted_at IS NULL
        ORDER BY valid_from DESC
        LIMIT 1
        "#,
    )
    .bind(scope_type)
    .bind(scope_ref_id)
    .bind(check_time)
    .fetch_optional(pool)
    .await
}

/// Find the gas vendor agreement held by a dive shop (as party_a),
/// valid at `check_time`.
pub async fn find_gas_vendor_agreement(
    pool: &PgPool,
    party_a_id: Uuid,
    check_time: DateTime<Utc>,
) -> Result<Option<Agreement>, sqlx::Error> {
    sqlx::query_as::<_, Agreement>(
        r#"
        SELECT
            id, scope_type, scope_ref_id, party_a_id, party_b_id,
            terms, valid_from, valid_to, current_version, deleted_at
        FROM agreements
        WHERE scope_type = $1
          AND party_a_id = $2
          AND valid_from <= $3
          AND (valid_to IS NULL OR valid_to > $3)
          AND deleted_at IS NULL
        ORDER BY valid_from DESC
        LIMIT 1
        "#,
    )
    .bind(SCOPE_GAS_VENDOR_PRICING)
    .bind(party_a_id)
    .bind(check_time)
    .fetch_optional(pool)
    .await
}

/// Find price by agreement scope (highest priority tier)
pub async fn find_price_by_agreement(
    pool: &PgPool,
    catalog_item_id: Uuid,
    agreement_id: Uuid,
    check_time: DateTime<Utc>,
) -> Result<Option<Price>, sqlx::Error> {
    sqlx::query_as::<_, Price>(
        r#"
        SELECT
            id, catalog_item_id, amount, currency,
            cost_amount, cost_currency,
            organization_id, party_id, agreement_id,
            valid_from, valid_to, priority
        FROM prices
        WHERE catalog_item_id = $1
          AND agreement_id = $2
          AND valid_from <= $3
          AND (valid_to IS NULL OR valid_to > $3)
        ORDER BY priority DESC, valid_from DESC
        LIMIT 1
        "#,
    )
    .bind(catalog_item_id)
    .bind(agreement_id)
    .bind(check_time)
    .fetch_optional(pool)
    .await
}

/// Find price by party scope (no agreement)
pub async fn find_price_by_party(
    pool: &PgPool,
    catalog_item_id: Uuid,
    party_id: Uuid,
    check_time: DateTime<Utc>,
) -> Result<Option<Price>, sqlx::Error> {
    sqlx::query_as::<_, Price>(
        r#"
        SELECT
            id, catalog_item_id, amount, currency,
            cost_amount, cost_currency,
            organization_id, party_id, agreement_id,
            valid_from, valid_to, priority
        FROM prices
        WHERE catalog_item_id = $1
          AND party_id = $2
          AND agreement_id IS NULL
          AND valid_from <= $3
          AND (valid_to IS NULL OR valid_to > $3)
        ORDER BY priority DESC, valid_from DESC
        LIMIT 1
        "#,
    )
    .bind(catalog_item_id)
    .bind(party_id)
    .bind(check_time)
    .fetch_optional(pool)
    .await
}

/// Find price by organization scope (no party, no agreement)
pub async fn find_price_by_organization(
    pool: &PgPool,
    catalog_item_id: Uuid,
    organization_id: Uuid,
    check_time: DateTime<Utc>,
) -> Result<Option<Price>, sqlx::Error> {
    sqlx::query_as::<_, Price>(
        r#"
        SELECT
            id, catalog_item_id, amount, currency,
            cost_amount, cost_currency,
            organization_id, party_id, agreement_id,
            valid_from, valid_to, priority
        FROM prices
        WHERE catalog_item_id = $1
          AND organization_id = $2
          AND party_id IS NULL
          AND agreement_id IS NULL
          AND valid_from <= $3
          AND (valid_to IS NULL OR valid_to > $3)
        ORDER BY priority DESC, valid_from DESC
        LIMIT 1
        "#,
    )
    .bind(catalog_item_id)
    .bind(organization_id)
    .bind(check_time)
    .fetch_optional(pool)
    .await
}

/// Find global price (no scope at all)
pub async fn find_global_price(
    pool: &PgPool,
    catalog_item_id: Uuid,
    check_time: DateTime<Utc>,
) -> Result<Option<Price>, sqlx::Error> {
    sqlx::query_as::<_, Price>(
        r#"
        SELECT
            id, catalog_item_id, amount, currency,
            cost_amount, cost_currency,
            organization_id, party_id, agreement_id,
            valid_from, valid_to, priority
        FROM prices
        WHERE catalog_item_id = $1
          AND organization_id IS NULL
          AND party_id IS NULL
          AND agreement_id IS NULL
          AND valid_from <= $2
          AND (valid_to IS NULL OR valid_to > $2)
        ORDER BY priority DESC, valid_from DESC
        LIMIT 1
        "#,
    )
    .bind(catalog_item_id)
    .bind(check_time)
    .fetch_optional(pool)
    .await
}

/// Get a catalog item by id (for error context on resolution misses)
pub async fn get_catalog_item(
    pool: &PgPool,
    catalog_item_id: Uuid,
) -> Result<Option<CatalogItem>, sqlx::Error> {
    sqlx::query_as::<_, CatalogItem>(
        r#"
        SELECT id, display_name, active, deleted_at
        FROM catalog_items
        WHERE id = $1
          AND deleted_at IS NULL
        "#,
    )
    .bind(catalog_item_id)
    .fetch_optional(pool)
    .await
}

/// Get all currently active vendor agreements (for cache warming)
pub async fn get_active_vendor_agreements(pool: &PgPool) -> Result<Vec<Agreement>, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, Agreement>(
        r#"
        SELECT
            id, scope_type, scope_ref_id, party_a_id, party_b_id,
            terms, valid_from, valid_to, current_version, deleted_at
        FROM agreements
        WHERE scope_type IN ($1, $2)
          AND valid_from <= $3
          AND (valid_to IS NULL OR valid_to > $3)
          AND deleted_at IS NULL
        "#,
    )
    .bind(SCOPE_VENDOR_PRICING)
    .bind(SCOPE_GAS_VENDOR_PRICING)
    .bind(now)
    .fetch_all(pool)
    .await
}
