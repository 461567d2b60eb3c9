// File: atelier-common/src/models/coupon.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// A coupon code as stored: trimmed and uppercased, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    /// Applies the lookup normalization without checking for emptiness.
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_uppercase()
    }

    pub fn parse(raw: &str) -> Result<Self, Error> {
        let normalized = Self::normalize(raw);
        if normalized.is_empty() {
            return Err(Error::Validation("Coupon code must not be empty".into()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CouponCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CouponCode> for String {
    fn from(code: CouponCode) -> Self {
        code.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whole-number percentage in 1..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct DiscountPercent(u8);

impl DiscountPercent {
    pub fn new(value: i32) -> Result<Self, Error> {
        if !(1..=100).contains(&value) {
            return Err(Error::Validation(format!(
                "Discount must be between 1 and 100 percent, got {value}"
            )));
        }
        Ok(Self(value as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i32> for DiscountPercent {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DiscountPercent> for i32 {
    fn from(p: DiscountPercent) -> Self {
        i32::from(p.0)
    }
}

impl fmt::Display for DiscountPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Who may use a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CouponVisibility {
    Public,
    Targeted { requester_id: Uuid },
}

impl CouponVisibility {
    /// Rebuilds the visibility from the `is_public` / `specific_user_id` column pair.
    pub fn from_columns(is_public: bool, specific_user_id: Option<Uuid>) -> Result<Self, Error> {
        match (is_public, specific_user_id) {
            (true, _) => Ok(CouponVisibility::Public),
            (false, Some(requester_id)) => Ok(CouponVisibility::Targeted { requester_id }),
            (false, None) => Err(Error::Parse(
                "targeted coupon row has no specific_user_id".into(),
            )),
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, CouponVisibility::Public)
    }

    pub fn target(&self) -> Option<Uuid> {
        match self {
            CouponVisibility::Public => None,
            CouponVisibility::Targeted { requester_id } => Some(*requester_id),
        }
    }
}

/// A redeemable discount definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub coupon_id: Uuid,
    pub code: CouponCode,
    pub discount_percent: DiscountPercent,
    pub visibility: CouponVisibility,
    /// `None` means the coupon never expires.
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit: i32,
    pub used_count: i32,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    pub fn is_exhausted(&self) -> bool {
        self.used_count >= self.usage_limit
    }

    pub fn remaining_uses(&self) -> i32 {
        (self.usage_limit - self.used_count).max(0)
    }

    /// Checks that `usage_limit` still covers the uses already recorded.
    pub fn ensure_limit_covers_usage(usage_limit: i32, used_count: i32) -> Result<(), Error> {
        if usage_limit < used_count {
            return Err(Error::Validation(format!(
                "Usage limit cannot be lower than the {used_count} uses already made."
            )));
        }
        Ok(())
    }

    /// Share of the usage limit already consumed, capped at 100.
    pub fn usage_percent(&self) -> u8 {
        if self.usage_limit <= 0 {
            return 100;
        }
        let pct = (i64::from(self.used_count) * 100) / i64::from(self.usage_limit);
        pct.clamp(0, 100) as u8
    }
}
