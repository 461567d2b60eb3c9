// File: atelier-core/src/repositories/memory/coupons.rs

use std::sync::Arc;
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;
use atelier_common::error::Error;
use atelier_common::models::{Coupon, CouponCode};
use atelier_common::traits::repository_traits::CouponRepository;

use super::OutageSwitch;

#[derive(Clone, Default)]
pub struct InMemoryCouponRepository {
    coupons: Arc<DashMap<Uuid, Coupon>>,
    outage: OutageSwitch,
}

impl InMemoryCouponRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `Error::StorageUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.outage.set(unavailable);
    }

    /// Stores a coupon as-is, skipping the code uniqueness check. Lets tests
    /// reproduce legacy data that already holds duplicate codes.
    pub fn insert_raw(&self, coupon: Coupon) {
        self.coupons.insert(coupon.coupon_id, coupon);
    }

    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }

    fn newest_first(mut list: Vec<Coupon>) -> Vec<Coupon> {
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }
}

#[async_trait]
impl CouponRepository for InMemoryCouponRepository {
    async fn create_coupon(&self, coupon: &Coupon) -> Result<(), Error> {
        self.outage.check()?;
        if self.coupons.iter().any(|c| c.code == coupon.code) {
            return Err(Error::DuplicateCode(coupon.code.to_string()));
        }
        self.coupons.insert(coupon.coupon_id, coupon.clone());
        Ok(())
    }

    async fn get_coupon_by_id(&self, coupon_id: Uuid) -> Result<Option<Coupon>, Error> {
        self.outage.check()?;
        Ok(self.coupons.get(&coupon_id).map(|c| c.clone()))
    }

    async fn find_coupons_by_code(&self, code: &CouponCode) -> Result<Vec<Coupon>, Error> {
        self.outage.check()?;
        let found = self
            .coupons
            .iter()
            .filter(|c| &c.code == code)
            .map(|c| c.clone())
            .collect();
        Ok(Self::newest_first(found))
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>, Error> {
        self.outage.check()?;
        let all = self.coupons.iter().map(|c| c.clone()).collect();
        Ok(Self::newest_first(all))
    }

    async fn update_coupon(&self, coupon: &Coupon) -> Result<u64, Error> {
        self.outage.check()?;
        if self
            .coupons
            .iter()
            .any(|c| c.code == coupon.code && c.coupon_id != coupon.coupon_id)
        {
            return Err(Error::DuplicateCode(coupon.code.to_string()));
        }
        match self.coupons.get_mut(&coupon.coupon_id) {
            Some(mut stored) => {
                Coupon::ensure_limit_covers_usage(coupon.usage_limit, stored.used_count)?;
                stored.code = coupon.code.clone();
                stored.discount_percent = coupon.discount_percent;
                stored.visibility = coupon.visibility;
                stored.expires_at = coupon.expires_at;
                stored.usage_limit = coupon.usage_limit;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_coupon(&self, coupon_id: Uuid) -> Result<u64, Error> {
        self.outage.check()?;
        Ok(self.coupons.remove(&coupon_id).map_or(0, |_| 1))
    }

    async fn increment_usage_if_available(&self, coupon_id: Uuid) -> Result<Option<i32>, Error> {
        self.outage.check()?;
        // get_mut holds the shard write lock for the whole check-and-bump.
        let Some(mut coupon) = self.coupons.get_mut(&coupon_id) else {
            return Ok(None);
        };
        if coupon.used_count >= coupon.usage_limit {
            return Ok(None);
        }
        coupon.used_count += 1;
        Ok(Some(coupon.used_count))
    }
}
