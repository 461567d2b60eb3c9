// File: atelier-core/src/repositories/postgres/coupons.rs

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;
use atelier_common::error::Error;
use atelier_common::models::{Coupon, CouponCode, CouponVisibility, DiscountPercent};
use atelier_common::traits::repository_traits::CouponRepository;

const COUPON_COLUMNS: &str = r#"
    coupon_id,
    code,
    discount_amount,
    is_public,
    specific_user_id,
    expiry_date,
    usage_limit,
    used_count,
    created_at
"#;

#[derive(Clone)]
pub struct PostgresCouponRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresCouponRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_coupon(r: &PgRow) -> Result<Coupon, Error> {
    let code: String = r.try_get("code")?;
    let discount: i32 = r.try_get("discount_amount")?;
    let is_public: bool = r.try_get("is_public")?;
    let specific_user_id: Option<Uuid> = r.try_get("specific_user_id")?;

    Ok(Coupon {
        coupon_id: r.try_get("coupon_id")?,
        code: CouponCode::parse(&code)?,
        discount_percent: DiscountPercent::new(discount)?,
        visibility: CouponVisibility::from_columns(is_public, specific_user_id)?,
        expires_at: r.try_get("expiry_date")?,
        usage_limit: r.try_get("usage_limit")?,
        used_count: r.try_get("used_count")?,
        created_at: r.try_get("created_at")?,
    })
}

#[async_trait]
impl CouponRepository for PostgresCouponRepository {
    async fn create_coupon(&self, coupon: &Coupon) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO coupons (
                coupon_id,
                code,
                discount_amount,
                is_public,
                specific_user_id,
                expiry_date,
                usage_limit,
                used_count,
                created_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
            "#,
        )
            .bind(coupon.coupon_id)
            .bind(coupon.code.as_str())
            .bind(i32::from(coupon.discount_percent))
            .bind(coupon.visibility.is_public())
            .bind(coupon.visibility.target())
            .bind(coupon.expires_at)
            .bind(coupon.usage_limit)
            .bind(coupon.used_count)
            .bind(coupon.created_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            // 23505 => unique_violation on coupons_code_unique
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
                Err(Error::DuplicateCode(coupon.code.to_string()))
            }
            Err(e) => Err(Error::Database(e)),
        }
    }

    async fn get_coupon_by_id(&self, coupon_id: Uuid) -> Result<Option<Coupon>, Error> {
        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE coupon_id = $1");
        let row_opt = sqlx::query(&sql)
            .bind(coupon_id)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.as_ref().map(row_to_coupon).transpose()
    }

    async fn find_coupons_by_code(&self, code: &CouponCode) -> Result<Vec<Coupon>, Error> {
        let sql = format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(code.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_coupon).collect()
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>, Error> {
        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons ORDER BY created_at DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut list = Vec::with_capacity(rows.len());
        for r in &rows {
            list.push(row_to_coupon(r)?);
        }
        Ok(list)
    }

    async fn update_coupon(&self, coupon: &Coupon) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE coupons
            SET
              code = $1,
              discount_amount = $2,
              is_public = $3,
              specific_user_id = $4,
              expiry_date = $5,
              usage_limit = $6
            WHERE coupon_id = $7
            "#,
        )
            .bind(coupon.code.as_str())
            .bind(i32::from(coupon.discount_percent))
            .bind(coupon.visibility.is_public())
            .bind(coupon.visibility.target())
            .bind(coupon.expires_at)
            .bind(coupon.usage_limit)
            .bind(coupon.coupon_id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(done.rows_affected()),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
                Err(Error::DuplicateCode(coupon.code.to_string()))
            }
            // 23514 => "check_violation"; a redeem landed after the caller read the counter.
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some("23514")
                    && db_err.constraint() == Some("coupons_used_within_limit") =>
            {
                Err(Error::Validation(
                    "Usage limit cannot be lower than the uses already made.".into(),
                ))
            }
            Err(e) => Err(Error::Database(e)),
        }
    }

    async fn delete_coupon(&self, coupon_id: Uuid) -> Result<u64, Error> {
        let done = sqlx::query("DELETE FROM coupons WHERE coupon_id = $1")
            .bind(coupon_id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    async fn increment_usage_if_available(&self, coupon_id: Uuid) -> Result<Option<i32>, Error> {
        // Check and increment happen in one statement, so two racing redeems
        // on the last remaining use cannot both succeed.
        let used: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE coupons
            SET used_count = used_count + 1
            WHERE coupon_id = $1
              AND used_count < usage_limit
            RETURNING used_count
            "#,
        )
            .bind(coupon_id)
            .fetch_optional(&self.pool)
            .await?;

        debug!("increment_usage_if_available({}) => {:?}", coupon_id, used);
        Ok(used)
    }
}
