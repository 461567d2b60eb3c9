// File: atelier-core/src/repositories/rest/coupons.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;
use atelier_common::error::Error;
use atelier_common::models::{Coupon, CouponCode, CouponVisibility, DiscountPercent};
use atelier_common::traits::repository_traits::CouponRepository;

use super::{eq, RestClient};

const TABLE: &str = "coupons";

/// How many compare-and-swap rounds a redemption gets before giving up.
pub const MAX_CAS_ATTEMPTS: usize = 8;

/// Wire shape of a `coupons` row as created by `migrations/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponRow {
    pub coupon_id: Uuid,
    pub code: String,
    pub discount_amount: i32,
    pub is_public: bool,
    pub specific_user_id: Option<Uuid>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub usage_limit: i32,
    pub used_count: i32,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = Error;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        Ok(Coupon {
            coupon_id: row.coupon_id,
            code: CouponCode::parse(&row.code)?,
            discount_percent: DiscountPercent::new(row.discount_amount)?,
            visibility: CouponVisibility::from_columns(row.is_public, row.specific_user_id)?,
            expires_at: row.expiry_date,
            usage_limit: row.usage_limit,
            used_count: row.used_count,
            created_at: row.created_at,
        })
    }
}

impl From<&Coupon> for CouponRow {
    fn from(c: &Coupon) -> Self {
        CouponRow {
            coupon_id: c.coupon_id,
            code: c.code.to_string(),
            discount_amount: i32::from(c.discount_percent),
            is_public: c.visibility.is_public(),
            specific_user_id: c.visibility.target(),
            expiry_date: c.expires_at,
            usage_limit: c.usage_limit,
            used_count: c.used_count,
            created_at: c.created_at,
        }
    }
}

fn rows_to_coupons(rows: Vec<CouponRow>) -> Result<Vec<Coupon>, Error> {
    rows.into_iter().map(Coupon::try_from).collect()
}

#[derive(Clone)]
pub struct RestCouponRepository {
    client: RestClient,
}

impl RestCouponRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    fn duplicate_as(code: &CouponCode) -> impl FnOnce(Error) -> Error + '_ {
        move |e| match e {
            Error::DuplicateCode(_) => Error::DuplicateCode(code.to_string()),
            other => other,
        }
    }
}

#[async_trait]
impl CouponRepository for RestCouponRepository {
    async fn create_coupon(&self, coupon: &Coupon) -> Result<(), Error> {
        let rb = self
            .client
            .request(Method::POST, TABLE)?
            .header("Prefer", "return=minimal")
            .json(&CouponRow::from(coupon));
        self.client
            .send(rb)
            .await
            .map_err(Self::duplicate_as(&coupon.code))?;
        Ok(())
    }

    async fn get_coupon_by_id(&self, coupon_id: Uuid) -> Result<Option<Coupon>, Error> {
        let rb = self
            .client
            .request(Method::GET, TABLE)?
            .query(&[("select", "*".to_string()), ("coupon_id", eq(coupon_id))]);
        let rows: Vec<CouponRow> = self.client.send_json(rb).await?;
        rows.into_iter().next().map(Coupon::try_from).transpose()
    }

    async fn find_coupons_by_code(&self, code: &CouponCode) -> Result<Vec<Coupon>, Error> {
        let rb = self.client.request(Method::GET, TABLE)?.query(&[
            ("select", "*".to_string()),
            ("code", eq(code)),
            ("order", "created_at.desc".to_string()),
        ]);
        rows_to_coupons(self.client.send_json(rb).await?)
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>, Error> {
        let rb = self
            .client
            .request(Method::GET, TABLE)?
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        rows_to_coupons(self.client.send_json(rb).await?)
    }

    async fn update_coupon(&self, coupon: &Coupon) -> Result<u64, Error> {
        let patch = json!({
            "code": coupon.code.as_str(),
            "discount_amount": i32::from(coupon.discount_percent),
            "is_public": coupon.visibility.is_public(),
            "specific_user_id": coupon.visibility.target(),
            "expiry_date": coupon.expires_at,
            "usage_limit": coupon.usage_limit,
        });
        let rb = self
            .client
            .request(Method::PATCH, TABLE)?
            .query(&[
                ("coupon_id", eq(coupon.coupon_id)),
                ("used_count", format!("lte.{}", coupon.usage_limit)),
            ])
            .header("Prefer", "return=representation")
            .json(&patch);
        let rows: Vec<CouponRow> = self
            .client
            .send_json(rb)
            .await
            .map_err(Self::duplicate_as(&coupon.code))?;
        if !rows.is_empty() {
            return Ok(rows.len() as u64);
        }

        // Nothing matched: either the row is gone or its counter is above the new limit.
        match self.get_coupon_by_id(coupon.coupon_id).await? {
            Some(current) => {
                Coupon::ensure_limit_covers_usage(coupon.usage_limit, current.used_count)?;
                Ok(0)
            }
            None => Ok(0),
        }
    }

    async fn delete_coupon(&self, coupon_id: Uuid) -> Result<u64, Error> {
        let rb = self
            .client
            .request(Method::DELETE, TABLE)?
            .query(&[("coupon_id", eq(coupon_id))])
            .header("Prefer", "return=representation");
        let rows: Vec<CouponRow> = self.client.send_json(rb).await?;
        Ok(rows.len() as u64)
    }

    async fn increment_usage_if_available(&self, coupon_id: Uuid) -> Result<Option<i32>, Error> {
        // The REST API has no column-to-column predicate, so the increment is a
        // compare-and-swap on the observed used_count, guarded by the limit still
        // being above it. A lost swap re-reads.
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let Some(current) = self.get_coupon_by_id(coupon_id).await? else {
                return Ok(None);
            };
            if current.is_exhausted() {
                return Ok(None);
            }

            let rb = self
                .client
                .request(Method::PATCH, TABLE)?
                .query(&[
                    ("coupon_id", eq(coupon_id)),
                    ("used_count", eq(current.used_count)),
                    ("usage_limit", format!("gt.{}", current.used_count)),
                ])
                .header("Prefer", "return=representation")
                .json(&json!({ "used_count": current.used_count + 1 }));
            let rows: Vec<CouponRow> = self.client.send_json(rb).await?;

            if let Some(row) = rows.into_iter().next() {
                return Ok(Some(row.used_count));
            }
            debug!(
                "usage swap for coupon {} lost at used_count={} (attempt {})",
                coupon_id, current.used_count, attempt
            );
        }

        warn!("giving up on coupon {} after {} contended swaps", coupon_id, MAX_CAS_ATTEMPTS);
        Err(Error::StorageUnavailable(
            "coupon usage counter is busy; try again".into(),
        ))
    }
}
