// File: atelier-core/src/services/coupon_service.rs

use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;
use atelier_common::models::{CouponCode, DiscountPercent};
use atelier_common::traits::repository_traits::CouponRepository;
use crate::Error;
use crate::services::coupon_rules::{evaluate_coupon, select_coupon, CouponDecision, RejectionReason};

/// Result of recording one use of a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RedeemOutcome {
    Redeemed { coupon_id: Uuid, used_count: i32 },
    Rejected { reason: RejectionReason },
}

/// Result of validating and consuming a code in one go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    Applied {
        coupon_id: Uuid,
        discount_percent: DiscountPercent,
        used_count: i32,
    },
    Rejected { reason: RejectionReason },
}

/// Checkout-side coupon operations: evaluation (read-only) and redemption.
pub struct CouponService {
    coupon_repo: Arc<dyn CouponRepository + Send + Sync>,
}

impl CouponService {
    pub fn new(coupon_repo: Arc<dyn CouponRepository + Send + Sync>) -> Self {
        Self { coupon_repo }
    }

    /// Decides whether `code` can be used by `requester` at `now`.
    ///
    /// Business rejections come back as `Ok(CouponDecision::Rejected { .. })`;
    /// only storage failures are returned as `Err`. Never consumes a use.
    pub async fn evaluate(
        &self,
        code: &str,
        now: DateTime<Utc>,
        requester: Option<Uuid>,
    ) -> Result<CouponDecision, Error> {
        let code = match CouponCode::parse(code) {
            Ok(c) => c,
            Err(_) => {
                debug!("empty coupon code submitted");
                return Ok(CouponDecision::rejected(RejectionReason::CodeNotFound));
            }
        };

        let candidates = self.coupon_repo.find_coupons_by_code(&code).await?;
        if candidates.len() > 1 {
            warn!(
                "{} coupons share code '{}'; using the newest",
                candidates.len(),
                code
            );
        }

        let Some(coupon) = select_coupon(candidates) else {
            debug!("coupon '{}' not found", code);
            return Ok(CouponDecision::rejected(RejectionReason::CodeNotFound));
        };

        let decision = evaluate_coupon(&coupon, now, requester);
        debug!("coupon '{}' evaluated => {:?}", code, decision);
        Ok(decision)
    }

    /// Consumes one use of the coupon. The limit check and the increment are a
    /// single conditional update in storage; callers should `evaluate` first.
    pub async fn redeem(&self, coupon_id: Uuid) -> Result<RedeemOutcome, Error> {
        if let Some(used_count) = self.coupon_repo.increment_usage_if_available(coupon_id).await? {
            info!("coupon {} redeemed (used_count={})", coupon_id, used_count);
            return Ok(RedeemOutcome::Redeemed { coupon_id, used_count });
        }

        // Nothing was updated: tell "gone" apart from "full".
        let reason = match self.coupon_repo.get_coupon_by_id(coupon_id).await? {
            None => RejectionReason::CodeNotFound,
            Some(_) => RejectionReason::UsageLimitReached,
        };
        info!("coupon {} not redeemed: {}", coupon_id, reason);
        Ok(RedeemOutcome::Rejected { reason })
    }

    /// Evaluates `code` and, if it passes, consumes one use.
    pub async fn checkout(
        &self,
        code: &str,
        now: DateTime<Utc>,
        requester: Option<Uuid>,
    ) -> Result<CheckoutOutcome, Error> {
        let (coupon_id, discount_percent) = match self.evaluate(code, now, requester).await? {
            CouponDecision::Approved { coupon_id, discount_percent } => (coupon_id, discount_percent),
            CouponDecision::Rejected { reason } => return Ok(CheckoutOutcome::Rejected { reason }),
        };

        match self.redeem(coupon_id).await? {
            RedeemOutcome::Redeemed { used_count, .. } => Ok(CheckoutOutcome::Applied {
                coupon_id,
                discount_percent,
                used_count,
            }),
            RedeemOutcome::Rejected { reason } => Ok(CheckoutOutcome::Rejected { reason }),
        }
    }
}
