// File: atelier-core/src/services/coupon_admin.rs

use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use atelier_common::models::profile::short_id;
use atelier_common::models::{Coupon, CouponCode, CouponVisibility, DiscountPercent, Profile};
use atelier_common::traits::repository_traits::{CouponRepository, ProfileRepository};
use crate::auth::AppSession;
use crate::Error;

pub const DEFAULT_DISCOUNT_PERCENT: i32 = 10;
pub const DEFAULT_USAGE_LIMIT: i32 = 100;

/// The admin "Generate Offer" form as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouponDraft {
    pub code: String,
    pub discount_percent: i32,
    pub is_public: bool,
    pub target_user_id: Option<Uuid>,
    /// Calendar day; the coupon stays valid until 23:59:59 UTC of that day.
    pub expiry_date: Option<NaiveDate>,
    pub usage_limit: i32,
}

impl Default for CouponDraft {
    fn default() -> Self {
        Self {
            code: String::new(),
            discount_percent: DEFAULT_DISCOUNT_PERCENT,
            is_public: true,
            target_user_id: None,
            expiry_date: None,
            usage_limit: DEFAULT_USAGE_LIMIT,
        }
    }
}

/// A draft that passed field validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCoupon {
    pub code: CouponCode,
    pub discount_percent: DiscountPercent,
    pub visibility: CouponVisibility,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit: i32,
}

impl CouponDraft {
    pub fn validate(&self) -> Result<ValidatedCoupon, Error> {
        let code = CouponCode::parse(&self.code)?;
        let discount_percent = DiscountPercent::new(self.discount_percent)?;

        if self.usage_limit < 1 {
            return Err(Error::Validation("Usage limit must be at least 1.".into()));
        }

        let visibility = if self.is_public {
            CouponVisibility::Public
        } else {
            let requester_id = self.target_user_id.ok_or_else(|| {
                Error::Validation("Please select a user for private coupons.".into())
            })?;
            CouponVisibility::Targeted { requester_id }
        };

        Ok(ValidatedCoupon {
            code,
            discount_percent,
            visibility,
            expires_at: self.expiry_date.map(end_of_day),
            usage_limit: self.usage_limit,
        })
    }
}

pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(23, 59, 59)
        .unwrap_or_else(|| date.and_time(NaiveTime::default()))
        .and_utc()
}

/// One row of the admin coupon grid.
#[derive(Debug, Clone, Serialize)]
pub struct CouponSummary {
    #[serde(flatten)]
    pub coupon: Coupon,
    pub expired: bool,
    pub exhausted: bool,
    pub usage_percent: u8,
    pub remaining_uses: i32,
    /// Display name of the targeted user, if any.
    pub target_name: Option<String>,
}

pub struct CouponAdminService {
    coupon_repo: Arc<dyn CouponRepository + Send + Sync>,
    profile_repo: Arc<dyn ProfileRepository + Send + Sync>,
}

impl CouponAdminService {
    pub fn new(
        coupon_repo: Arc<dyn CouponRepository + Send + Sync>,
        profile_repo: Arc<dyn ProfileRepository + Send + Sync>,
    ) -> Self {
        Self { coupon_repo, profile_repo }
    }

    pub async fn create(
        &self,
        session: &AppSession,
        draft: &CouponDraft,
        now: DateTime<Utc>,
    ) -> Result<Coupon, Error> {
        let admin = session.require_admin()?;
        let valid = draft.validate()?;
        self.check_target_exists(&valid.visibility).await?;
        self.check_code_free(&valid.code, None).await?;

        let coupon = Coupon {
            coupon_id: Uuid::new_v4(),
            code: valid.code,
            discount_percent: valid.discount_percent,
            visibility: valid.visibility,
            expires_at: valid.expires_at,
            usage_limit: valid.usage_limit,
            used_count: 0,
            created_at: now,
        };
        self.coupon_repo.create_coupon(&coupon).await?;

        info!("admin {} created coupon '{}' ({})", admin.id, coupon.code, coupon.coupon_id);
        Ok(coupon)
    }

    pub async fn update(
        &self,
        session: &AppSession,
        coupon_id: Uuid,
        draft: &CouponDraft,
    ) -> Result<Coupon, Error> {
        let admin = session.require_admin()?;
        let valid = draft.validate()?;

        let existing = self
            .coupon_repo
            .get_coupon_by_id(coupon_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("coupon {coupon_id}")))?;

        // Early answer for the form; the store re-checks against the live counter.
        Coupon::ensure_limit_covers_usage(valid.usage_limit, existing.used_count)?;
        self.check_target_exists(&valid.visibility).await?;
        self.check_code_free(&valid.code, Some(coupon_id)).await?;

        let updated = Coupon {
            code: valid.code,
            discount_percent: valid.discount_percent,
            visibility: valid.visibility,
            expires_at: valid.expires_at,
            usage_limit: valid.usage_limit,
            ..existing
        };
        if self.coupon_repo.update_coupon(&updated).await? == 0 {
            return Err(Error::NotFound(format!("coupon {coupon_id}")));
        }

        info!("admin {} updated coupon '{}' ({})", admin.id, updated.code, coupon_id);
        Ok(updated)
    }

    pub async fn delete(&self, session: &AppSession, coupon_id: Uuid) -> Result<(), Error> {
        let admin = session.require_admin()?;
        if self.coupon_repo.delete_coupon(coupon_id).await? == 0 {
            return Err(Error::NotFound(format!("coupon {coupon_id}")));
        }
        info!("admin {} deleted coupon {}", admin.id, coupon_id);
        Ok(())
    }

    pub async fn list(
        &self,
        session: &AppSession,
        now: DateTime<Utc>,
    ) -> Result<Vec<CouponSummary>, Error> {
        session.require_admin()?;
        let coupons = self.coupon_repo.list_coupons().await?;
        let names: HashMap<Uuid, String> = self
            .profile_repo
            .list_profiles()
            .await?
            .into_iter()
            .map(|p| (p.id, p.display_name()))
            .collect();

        Ok(coupons
            .into_iter()
            .map(|coupon| {
                let target_name = coupon
                    .visibility
                    .target()
                    .map(|id| names.get(&id).cloned().unwrap_or_else(|| short_id(id)));
                CouponSummary {
                    expired: coupon.is_expired(now),
                    exhausted: coupon.is_exhausted(),
                    usage_percent: coupon.usage_percent(),
                    remaining_uses: coupon.remaining_uses(),
                    target_name,
                    coupon,
                }
            })
            .collect())
    }

    /// Profiles a targeted coupon can be issued to, for the target picker.
    pub async fn list_target_candidates(&self, session: &AppSession) -> Result<Vec<Profile>, Error> {
        session.require_admin()?;
        self.profile_repo.list_profiles().await
    }

    async fn check_target_exists(&self, visibility: &CouponVisibility) -> Result<(), Error> {
        if let Some(target) = visibility.target() {
            if self.profile_repo.get_profile(target).await?.is_none() {
                return Err(Error::Validation(format!("No user with id {target}.")));
            }
        }
        Ok(())
    }

    async fn check_code_free(&self, code: &CouponCode, except: Option<Uuid>) -> Result<(), Error> {
        let clash = self
            .coupon_repo
            .find_coupons_by_code(code)
            .await?
            .into_iter()
            .any(|c| Some(c.coupon_id) != except);
        if clash {
            return Err(Error::DuplicateCode(code.to_string()));
        }
        Ok(())
    }
}
