//! # Coupon Repository
//!
//! Coupon resolution and redemption accounting.
//!
//! Codes are stored uppercase; `find_by_code` trims and uppercases its
//! input so " summer10 " and "SUMMER10" resolve to the same coupon.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use bazaar_core::{Category, Coupon, CouponKind};

/// Raw coupons row; the categories filter stays as JSON TEXT until
/// conversion.
#[derive(Debug, Clone, sqlx::FromRow)]
struct CouponRow {
    id: String,
    code: String,
    kind: CouponKind,
    value: i64,
    min_subtotal_cents: i64,
    max_discount_cents: Option<i64>,
    categories: String,
    usage_limit: Option<i64>,
    used_count: i64,
    per_user_limit: Option<i64>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    is_active: bool,
}

impl CouponRow {
    fn into_coupon(self) -> DbResult<Coupon> {
        let categories: Vec<Category> = serde_json::from_str(&self.categories)?;

        Ok(Coupon {
            id: self.id,
            code: self.code,
            kind: self.kind,
            value: self.value,
            min_subtotal_cents: self.min_subtotal_cents,
            max_discount_cents: self.max_discount_cents,
            categories,
            usage_limit: self.usage_limit,
            used_count: self.used_count,
            per_user_limit: self.per_user_limit,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            is_active: self.is_active,
        })
    }
}

const COUPON_COLUMNS: &str = "id, code, kind, value, min_subtotal_cents, max_discount_cents, \
                              categories, usage_limit, used_count, per_user_limit, \
                              starts_at, ends_at, is_active";

/// Repository for coupon database operations.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Inserts a coupon. The code is normalized to uppercase at write time.
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        debug!(coupon_id = %coupon.id, code = %coupon.code, "Inserting coupon");

        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, kind, value, min_subtotal_cents, max_discount_cents,
                categories, usage_limit, used_count, per_user_limit,
                starts_at, ends_at, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&coupon.id)
        .bind(coupon.code.trim().to_uppercase())
        .bind(coupon.kind)
        .bind(coupon.value)
        .bind(coupon.min_subtotal_cents)
        .bind(coupon.max_discount_cents)
        .bind(serde_json::to_string(&coupon.categories)?)
        .bind(coupon.usage_limit)
        .bind(coupon.used_count)
        .bind(coupon.per_user_limit)
        .bind(coupon.starts_at)
        .bind(coupon.ends_at)
        .bind(coupon.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Resolves a coupon by code, case-insensitively.
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let normalized = code.trim().to_uppercase();

        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = ?1"
        ))
        .bind(&normalized)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CouponRow::into_coupon).transpose()
    }

    /// Gets a coupon by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Coupon>> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CouponRow::into_coupon).transpose()
    }

    /// Counts this buyer's recorded redemptions of the coupon.
    pub async fn redemption_count(&self, coupon_id: &str, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM coupon_redemptions WHERE coupon_id = ?1 AND user_id = ?2",
        )
        .bind(coupon_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Records a redemption and bumps the global used_count.
    ///
    /// The guard `usage_limit IS NULL OR used_count < usage_limit` makes
    /// the bump lose (returning `false`) instead of overshooting the
    /// global limit under concurrent checkouts. The bump and the
    /// redemption row share one transaction; a use is never burned
    /// without its per-user record.
    pub async fn record_redemption(
        &self,
        coupon_id: &str,
        user_id: &str,
        order_id: &str,
    ) -> DbResult<bool> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE coupons SET used_count = used_count + 1
            WHERE id = ?1 AND (usage_limit IS NULL OR used_count < usage_limit)
            "#,
        )
        .bind(coupon_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            debug!(coupon_id = %coupon_id, "Coupon usage limit reached, redemption not recorded");
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO coupon_redemptions (id, coupon_id, user_id, order_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(coupon_id)
        .bind(user_id)
        .bind(order_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(true)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
