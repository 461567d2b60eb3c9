// src/repositories/postgres/mod.rs

pub mod coupons;
pub mod profiles;

pub use coupons::PostgresCouponRepository;
pub use profiles::PostgresProfileRepository;
