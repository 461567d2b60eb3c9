// File: atelier-core/src/test_utils/fixtures.rs
//
// Small builders shared by unit and integration tests.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use atelier_common::models::{Coupon, CouponCode, CouponVisibility, DiscountPercent, Profile, Role};

/// A public coupon with no expiry and a fresh counter.
pub fn public_coupon(code: &str, discount: i32, usage_limit: i32, created_at: DateTime<Utc>) -> Coupon {
    Coupon {
        coupon_id: Uuid::new_v4(),
        code: CouponCode::parse(code).expect("fixture code"),
        discount_percent: DiscountPercent::new(discount).expect("fixture discount"),
        visibility: CouponVisibility::Public,
        expires_at: None,
        usage_limit,
        used_count: 0,
        created_at,
    }
}

pub fn targeted_coupon(
    code: &str,
    discount: i32,
    requester_id: Uuid,
    created_at: DateTime<Utc>,
) -> Coupon {
    Coupon {
        visibility: CouponVisibility::Targeted { requester_id },
        ..public_coupon(code, discount, 5, created_at)
    }
}

pub fn profile(role: Role, full_name: Option<&str>, email: Option<&str>) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        email: email.map(String::from),
        full_name: full_name.map(String::from),
        role,
        created_at: Utc::now(),
    }
}
