//! In-memory caching using moka
//!
//! Vendor agreements change rarely compared to how often excursion pricing
//! is computed, so currently-active agreements are kept hot. Historical
//! (`as_of`) lookups never go through this cache.

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

use crate::pricing::models::{Agreement, SCOPE_GAS_VENDOR_PRICING, SCOPE_VENDOR_PRICING};
use crate::pricing::queries;
use uuid::Uuid;

/// Application cache holding currently-active vendor agreements
#[derive(Clone)]
pub struct AppCache {
    /// Active agreements (scope key -> Agreement)
    pub agreements: Cache<String, Arc<Agreement>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Agreements: 1000 entries, 5 min TTL, 2 min idle.
            // Pricing edits must show up within minutes, not hours.
            agreements: Cache::builder()
                .max_capacity(1000)
                .time_to_live(Duration::from_secs(5 * 60))
                .time_to_idle(Duration::from_secs(2 * 60))
                .build(),
        }
    }

    /// Cache key for an agreement by scope type and reference
    pub fn agreement_key(scope_type: &str, scope_ref: Uuid) -> String {
        format!("agreement:{scope_type}:{scope_ref}")
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            agreements_size: self.agreements.entry_count(),
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.agreements.invalidate_all();
        info!("Agreement cache invalidated");
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub agreements_size: u64,
}

/// Start background cache warmer
///
/// Warms the cache on startup and refreshes every 5 minutes.
pub async fn start_cache_warmer(cache: AppCache, db: PgPool) {
    // Initial warm-up
    warm_cache(&cache, &db).await;

    // Periodic refresh
    let mut interval = interval(Duration::from_secs(5 * 60));
    loop {
        interval.tick().await;
        warm_cache(&cache, &db).await;
    }
}

/// Warm the cache with all currently-active vendor agreements
async fn warm_cache(cache: &AppCache, db: &PgPool) {
    let agreements = match queries::get_active_vendor_agreements(db).await {
        Ok(agreements) => agreements,
        Err(e) => {
            warn!("Failed to warm agreement cache: {}", e);
            return;
        }
    };

    let mut warmed = 0u64;
    for agreement in agreements {
        // Site-scoped agreements key on the scope reference; gas vendor
        // agreements are looked up by the dive shop holding them.
        let key = match agreement.scope_type.as_str() {
            SCOPE_VENDOR_PRICING => {
                Some(AppCache::agreement_key(SCOPE_VENDOR_PRICING, agreement.scope_ref_id))
            }
            SCOPE_GAS_VENDOR_PRICING => agreement
                .party_a_id
                .map(|shop| AppCache::agreement_key(SCOPE_GAS_VENDOR_PRICING, shop)),
            _ => None,
        };

        if let Some(key) = key {
            cache.agreements.insert(key, Arc::new(agreement)).await;
            warmed += 1;
        }
    }

    info!("Agreement cache warmed with {} entries", warmed);
}
