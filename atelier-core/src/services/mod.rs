// File: src/services/mod.rs

pub mod coupon_admin;
pub mod coupon_rules;
pub mod coupon_service;

pub use coupon_admin::{CouponAdminService, CouponDraft, CouponSummary};
pub use coupon_rules::{CouponDecision, RejectionReason};
pub use coupon_service::{CheckoutOutcome, CouponService, RedeemOutcome};
