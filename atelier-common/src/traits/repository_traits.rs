use async_trait::async_trait;
use uuid::Uuid;
use crate::error::Error;
use crate::models::{Coupon, CouponCode, Profile};

/// Storage for coupon definitions.
///
/// Implementations only move rows around; eligibility rules live in the
/// coupon service. The one exception is `increment_usage_if_available`,
/// which must check `used_count < usage_limit` and bump the counter as a
/// single atomic step in the backing store.
#[async_trait]
pub trait CouponRepository: Send + Sync {
    async fn create_coupon(&self, coupon: &Coupon) -> Result<(), Error>;
    async fn get_coupon_by_id(&self, coupon_id: Uuid) -> Result<Option<Coupon>, Error>;

    /// All coupons whose normalized code equals `code`, newest first.
    async fn find_coupons_by_code(&self, code: &CouponCode) -> Result<Vec<Coupon>, Error>;

    /// Every coupon, newest first.
    async fn list_coupons(&self) -> Result<Vec<Coupon>, Error>;

    /// Overwrites the editable fields. `used_count` and `created_at` are left alone.
    /// Returns the number of rows touched.
    async fn update_coupon(&self, coupon: &Coupon) -> Result<u64, Error>;

    async fn delete_coupon(&self, coupon_id: Uuid) -> Result<u64, Error>;

    /// Adds one use if the coupon exists and is below its limit.
    /// Returns the new `used_count`, or `None` when nothing was updated.
    async fn increment_usage_if_available(&self, coupon_id: Uuid) -> Result<Option<i32>, Error>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, Error>;
    async fn list_profiles(&self) -> Result<Vec<Profile>, Error>;
}
