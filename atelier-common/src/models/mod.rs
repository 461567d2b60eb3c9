// File: atelier-common/src/models/mod.rs
pub mod coupon;
pub mod profile;

pub use coupon::{Coupon, CouponCode, CouponVisibility, DiscountPercent};
pub use profile::{Profile, Role};
