//! # Campaign Repository
//!
//! Loads seller campaigns for pricing. The campaigns table stores the
//! listing/category filter sets as JSON TEXT columns; this module owns the
//! row type and its conversion into the pure `Campaign` domain type.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use bazaar_core::{Campaign, CampaignKind, Category};

/// Raw campaigns row. JSON filter columns stay as TEXT until conversion.
#[derive(Debug, Clone, sqlx::FromRow)]
struct CampaignRow {
    id: String,
    seller_id: String,
    kind: CampaignKind,
    value: i64,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    is_active: bool,
    listing_ids: String,
    categories: String,
    apply_to_future_listings: bool,
    created_at: DateTime<Utc>,
}

impl CampaignRow {
    fn into_campaign(self) -> DbResult<Campaign> {
        let listing_ids: Vec<String> = serde_json::from_str(&self.listing_ids)?;
        let categories: Vec<Category> = serde_json::from_str(&self.categories)?;

        Ok(Campaign {
            id: self.id,
            seller_id: self.seller_id,
            kind: self.kind,
            value: self.value,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            is_active: self.is_active,
            listing_ids,
            categories,
            apply_to_future_listings: self.apply_to_future_listings,
            created_at: self.created_at,
        })
    }
}

/// Repository for campaign database operations.
#[derive(Debug, Clone)]
pub struct CampaignRepository {
    pool: SqlitePool,
}

impl CampaignRepository {
    /// Creates a new CampaignRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CampaignRepository { pool }
    }

    /// Inserts a campaign.
    pub async fn insert(&self, campaign: &Campaign) -> DbResult<()> {
        debug!(campaign_id = %campaign.id, seller_id = %campaign.seller_id, "Inserting campaign");

        sqlx::query(
            r#"
            INSERT INTO campaigns (
                id, seller_id, kind, value, starts_at, ends_at, is_active,
                listing_ids, categories, apply_to_future_listings, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&campaign.id)
        .bind(&campaign.seller_id)
        .bind(campaign.kind)
        .bind(campaign.value)
        .bind(campaign.starts_at)
        .bind(campaign.ends_at)
        .bind(campaign.is_active)
        .bind(serde_json::to_string(&campaign.listing_ids)?)
        .bind(serde_json::to_string(&campaign.categories)?)
        .bind(campaign.apply_to_future_listings)
        .bind(campaign.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a campaign by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Campaign>> {
        let row = sqlx::query_as::<_, CampaignRow>(
            r#"
            SELECT id, seller_id, kind, value, starts_at, ends_at, is_active,
                   listing_ids, categories, apply_to_future_listings, created_at
            FROM campaigns
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CampaignRow::into_campaign).transpose()
    }

    /// Loads the seller's campaigns whose validity window covers `now`.
    ///
    /// Only window and active-flag filtering happens in SQL; per-listing
    /// eligibility and best-discount selection are pure logic applied to
    /// this snapshot.
    pub async fn active_for_seller(
        &self,
        seller_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Campaign>> {
        let rows = sqlx::query_as::<_, CampaignRow>(
            r#"
            SELECT id, seller_id, kind, value, starts_at, ends_at, is_active,
                   listing_ids, categories, apply_to_future_listings, created_at
            FROM campaigns
            WHERE seller_id = ?1
              AND is_active = 1
              AND starts_at <= ?2
              AND ends_at >= ?2
            ORDER BY created_at, id
            "#,
        )
        .bind(seller_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CampaignRow::into_campaign).collect()
    }

    /// Flips the active flag.
    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<bool> {
        let result = sqlx::query("UPDATE campaigns SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(is_active)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
