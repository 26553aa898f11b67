//! # Rate Repository
//!
//! Database operations for the metal rate card.
//!
//! ## Rate Card Rules
//! - Exactly one active rate per (metal_type, purity) pair, enforced by a
//!   unique index. Updates go through `upsert`; there is no rate history
//!   table - bills freeze the rate onto each line item instead.
//! - Rates are per gram, except diamond which is per carat (weights for
//!   diamond lines store milli-carats in the same scalar).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use sona_core::{MetalType, Rate};

/// Bootstrap rate card for a fresh database.
///
/// Sample figures only; every shop overwrites these with the day's bhav
/// before billing. `gst_applicable = false` for exchange-heavy categories
/// is a per-shop decision, so everything defaults to true.
const DEFAULT_RATE_CARD: &[(MetalType, &str, i64)] = &[
    (MetalType::Gold, "24K", 7_250_00),
    (MetalType::Gold, "22K", 6_650_00),
    (MetalType::Gold, "18K", 5_440_00),
    (MetalType::Silver, "99.9", 92_00),
    (MetalType::Silver, "92.5", 85_00),
    (MetalType::Platinum, "95", 3_310_00),
    // Per carat
    (MetalType::Diamond, "SI-IJ", 65_000_00),
];

/// Repository for rate card operations.
#[derive(Debug, Clone)]
pub struct RateRepository {
    pool: SqlitePool,
}

impl RateRepository {
    /// Creates a new RateRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RateRepository { pool }
    }

    /// Gets the current rate for a (metal, purity) pair.
    ///
    /// ## Returns
    /// * `Ok(Some(Rate))` - Rate on record
    /// * `Ok(None)` - Pair never seeded; pricing layers map this to
    ///   their own "no rate on record" error
    pub async fn find(&self, metal_type: MetalType, purity: &str) -> DbResult<Option<Rate>> {
        let rate = sqlx::query_as::<_, Rate>(
            r#"
            SELECT
                id, metal_type, purity, rate_paise, gst_applicable,
                created_at, updated_at
            FROM rates
            WHERE metal_type = ?1 AND purity = ?2
            "#,
        )
        .bind(metal_type)
        .bind(purity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rate)
    }

    /// Creates or updates the rate for a (metal, purity) pair.
    ///
    /// ## Usage
    /// The daily bhav update. Existing pair keeps its id and created_at;
    /// only the rate, GST flag and updated_at move.
    pub async fn upsert(
        &self,
        metal_type: MetalType,
        purity: &str,
        rate_paise: i64,
        gst_applicable: bool,
    ) -> DbResult<Rate> {
        debug!(metal = %metal_type, purity = %purity, rate_paise, "Upserting rate");

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO rates (
                id, metal_type, purity, rate_paise, gst_applicable,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT (metal_type, purity) DO UPDATE SET
                rate_paise = excluded.rate_paise,
                gst_applicable = excluded.gst_applicable,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(metal_type)
        .bind(purity)
        .bind(rate_paise)
        .bind(gst_applicable)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find(metal_type, purity).await?.ok_or_else(|| {
            DbError::not_found("Rate", format!("{}/{}", metal_type, purity))
        })
    }

    /// Lists the full rate card, grouped by metal.
    pub async fn list(&self) -> DbResult<Vec<Rate>> {
        let rates = sqlx::query_as::<_, Rate>(
            r#"
            SELECT
                id, metal_type, purity, rate_paise, gst_applicable,
                created_at, updated_at
            FROM rates
            ORDER BY metal_type, purity
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rates)
    }

    /// Seeds the bootstrap rate card, skipping pairs that already exist.
    ///
    /// ## Returns
    /// Number of pairs newly inserted. Idempotent: a second run returns 0.
    pub async fn seed_defaults(&self) -> DbResult<usize> {
        let now = Utc::now();
        let mut inserted = 0;

        for (metal_type, purity, rate_paise) in DEFAULT_RATE_CARD {
            let result = sqlx::query(
                r#"
                INSERT INTO rates (
                    id, metal_type, purity, rate_paise, gst_applicable,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                ON CONFLICT (metal_type, purity) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(metal_type)
            .bind(purity)
            .bind(rate_paise)
            .bind(true)
            .bind(now)
            .execute(&self.pool)
            .await?;

            inserted += result.rows_affected() as usize;
        }

        debug!(inserted, "Seeded default rate card");
        Ok(inserted)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> (Database, RateRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let rates = db.rates();
        (db, rates)
    }

    #[tokio::test]
    async fn test_find_unknown_pair_is_none() {
        let (_db, rates) = setup().await;
        assert!(rates.find(MetalType::Gold, "22K").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_updates_in_place() {
        let (_db, rates) = setup().await;

        let morning = rates
            .upsert(MetalType::Gold, "22K", 6_500_00, true)
            .await
            .unwrap();
        assert_eq!(morning.rate_paise, 6_500_00);

        // The evening bhav replaces the figure, not the row
        let evening = rates
            .upsert(MetalType::Gold, "22K", 6_580_00, true)
            .await
            .unwrap();
        assert_eq!(evening.id, morning.id);
        assert_eq!(evening.created_at, morning.created_at);
        assert_eq!(evening.rate_paise, 6_580_00);

        let found = rates.find(MetalType::Gold, "22K").await.unwrap().unwrap();
        assert_eq!(found.rate_paise, 6_580_00);
    }

    #[tokio::test]
    async fn test_seed_defaults_is_idempotent() {
        let (_db, rates) = setup().await;

        let first = rates.seed_defaults().await.unwrap();
        assert_eq!(first, DEFAULT_RATE_CARD.len());

        let second = rates.seed_defaults().await.unwrap();
        assert_eq!(second, 0);

        // A manual override survives a re-seed
        rates
            .upsert(MetalType::Gold, "22K", 7_000_00, true)
            .await
            .unwrap();
        rates.seed_defaults().await.unwrap();
        let kept = rates.find(MetalType::Gold, "22K").await.unwrap().unwrap();
        assert_eq!(kept.rate_paise, 7_000_00);
    }

    #[tokio::test]
    async fn test_list_orders_by_metal_then_purity() {
        let (_db, rates) = setup().await;
        rates.seed_defaults().await.unwrap();

        let all = rates.list().await.unwrap();
        assert_eq!(all.len(), DEFAULT_RATE_CARD.len());

        let keys: Vec<(String, String)> = all
            .iter()
            .map(|r| (r.metal_type.to_string(), r.purity.clone()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
