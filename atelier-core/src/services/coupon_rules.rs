// File: atelier-core/src/services/coupon_rules.rs
//
// Eligibility rules for a single coupon. Pure: no I/O, no clock.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use atelier_common::models::{Coupon, CouponVisibility, DiscountPercent};

/// Why a coupon cannot be applied. Each maps to a different message in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    CodeNotFound,
    Expired,
    UsageLimitReached,
    AuthenticationRequired,
    NotEligibleForRequester,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::CodeNotFound => "code_not_found",
            RejectionReason::Expired => "expired",
            RejectionReason::UsageLimitReached => "usage_limit_reached",
            RejectionReason::AuthenticationRequired => "authentication_required",
            RejectionReason::NotEligibleForRequester => "not_eligible_for_requester",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            RejectionReason::CodeNotFound => "Invalid coupon code.",
            RejectionReason::Expired => "This coupon has expired.",
            RejectionReason::UsageLimitReached => "This coupon has reached its usage limit.",
            RejectionReason::AuthenticationRequired => "You must be logged in to use this coupon.",
            RejectionReason::NotEligibleForRequester => "This coupon is not valid for your account.",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CouponDecision {
    Approved {
        coupon_id: Uuid,
        discount_percent: DiscountPercent,
    },
    Rejected {
        reason: RejectionReason,
    },
}

impl CouponDecision {
    pub fn rejected(reason: RejectionReason) -> Self {
        CouponDecision::Rejected { reason }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, CouponDecision::Approved { .. })
    }

    pub fn discount(&self) -> Option<DiscountPercent> {
        match self {
            CouponDecision::Approved { discount_percent, .. } => Some(*discount_percent),
            CouponDecision::Rejected { .. } => None,
        }
    }

    pub fn rejection(&self) -> Option<RejectionReason> {
        match self {
            CouponDecision::Approved { .. } => None,
            CouponDecision::Rejected { reason } => Some(*reason),
        }
    }
}

/// Checks run in a fixed order and the first failure wins:
/// expiry, usage limit, then (targeted coupons only) identity.
pub fn evaluate_coupon(
    coupon: &Coupon,
    now: DateTime<Utc>,
    requester: Option<Uuid>,
) -> CouponDecision {
    if coupon.is_expired(now) {
        return CouponDecision::rejected(RejectionReason::Expired);
    }

    if coupon.is_exhausted() {
        return CouponDecision::rejected(RejectionReason::UsageLimitReached);
    }

    if let CouponVisibility::Targeted { requester_id } = coupon.visibility {
        match requester {
            None => return CouponDecision::rejected(RejectionReason::AuthenticationRequired),
            Some(id) if id != requester_id => {
                return CouponDecision::rejected(RejectionReason::NotEligibleForRequester);
            }
            Some(_) => {}
        }
    }

    CouponDecision::Approved {
        coupon_id: coupon.coupon_id,
        discount_percent: coupon.discount_percent,
    }
}

/// Picks the coupon a lookup should use when several share a code: the newest.
pub fn select_coupon(candidates: Vec<Coupon>) -> Option<Coupon> {
    candidates.into_iter().max_by_key(|c| c.created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use atelier_common::models::CouponCode;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn base(visibility: CouponVisibility) -> Coupon {
        Coupon {
            coupon_id: Uuid::new_v4(),
            code: CouponCode::parse("SAVE10").unwrap(),
            discount_percent: DiscountPercent::new(10).unwrap(),
            visibility,
            expires_at: None,
            usage_limit: 100,
            used_count: 0,
            created_at: now() - Duration::days(30),
        }
    }

    #[test]
    fn public_coupon_passes() {
        let c = base(CouponVisibility::Public);
        let d = evaluate_coupon(&c, now(), None);
        assert_eq!(d.discount().map(|p| p.get()), Some(10));
        assert_eq!(
            d,
            CouponDecision::Approved { coupon_id: c.coupon_id, discount_percent: c.discount_percent }
        );
    }

    #[test]
    fn expired_beats_everything_else() {
        let owner = Uuid::new_v4();
        let mut c = base(CouponVisibility::Targeted { requester_id: owner });
        c.expires_at = Some(now() - Duration::seconds(1));
        c.used_count = c.usage_limit;

        assert_eq!(evaluate_coupon(&c, now(), None).rejection(), Some(RejectionReason::Expired));
        assert_eq!(
            evaluate_coupon(&c, now(), Some(Uuid::new_v4())).rejection(),
            Some(RejectionReason::Expired)
        );
    }

    #[test]
    fn expiry_instant_itself_is_still_valid() {
        let mut c = base(CouponVisibility::Public);
        c.expires_at = Some(now());
        assert!(evaluate_coupon(&c, now(), None).is_approved());
    }

    #[test]
    fn limit_checked_before_identity() {
        let owner = Uuid::new_v4();
        let mut c = base(CouponVisibility::Targeted { requester_id: owner });
        c.used_count = c.usage_limit;
        assert_eq!(
            evaluate_coupon(&c, now(), Some(owner)).rejection(),
            Some(RejectionReason::UsageLimitReached)
        );
        assert_eq!(
            evaluate_coupon(&c, now(), None).rejection(),
            Some(RejectionReason::UsageLimitReached)
        );
    }

    #[test]
    fn targeted_coupon_identity_checks() {
        let owner = Uuid::new_v4();
        let c = base(CouponVisibility::Targeted { requester_id: owner });

        assert_eq!(
            evaluate_coupon(&c, now(), None).rejection(),
            Some(RejectionReason::AuthenticationRequired)
        );
        assert_eq!(
            evaluate_coupon(&c, now(), Some(Uuid::new_v4())).rejection(),
            Some(RejectionReason::NotEligibleForRequester)
        );
        assert!(evaluate_coupon(&c, now(), Some(owner)).is_approved());
    }

    #[test]
    fn public_coupon_ignores_identity() {
        let c = base(CouponVisibility::Public);
        for requester in [None, Some(Uuid::new_v4()), Some(Uuid::nil())] {
            assert!(evaluate_coupon(&c, now(), requester).is_approved());
        }
    }

    #[test]
    fn newest_duplicate_wins() {
        let older = base(CouponVisibility::Public);
        let mut newer = base(CouponVisibility::Public);
        newer.created_at = older.created_at + Duration::hours(1);
        newer.discount_percent = DiscountPercent::new(25).unwrap();

        let picked = select_coupon(vec![older.clone(), newer.clone()]).unwrap();
        assert_eq!(picked.coupon_id, newer.coupon_id);
        assert!(select_coupon(Vec::new()).is_none());
    }

    #[test]
    fn decision_serializes_with_status_tag() {
        let v = serde_json::to_value(CouponDecision::rejected(RejectionReason::Expired)).unwrap();
        assert_eq!(v["status"], "rejected");
        assert_eq!(v["reason"], "expired");
    }
}
