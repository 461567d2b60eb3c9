// src/repositories/mod.rs

pub mod memory;
pub mod postgres;
pub mod rest;

pub use atelier_common::traits::repository_traits::{CouponRepository, ProfileRepository};

pub use memory::{InMemoryCouponRepository, InMemoryProfileRepository};
pub use postgres::{PostgresCouponRepository, PostgresProfileRepository};
pub use rest::{RestClient, RestCouponRepository, RestProfileRepository};
