//! In-process repositories backed by `DashMap`.
//!
//! Used by the test-suite and by `--backend memory` for demos. They keep the
//! same contracts as the Postgres and REST repositories, including the atomic
//! conditional increment, and can be switched into a failing mode to exercise
//! the "storage unavailable" path.

pub mod coupons;
pub mod profiles;

pub use coupons::InMemoryCouponRepository;
pub use profiles::InMemoryProfileRepository;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use atelier_common::error::Error;

/// Shared on/off switch for simulated outages.
#[derive(Clone, Default)]
pub struct OutageSwitch(Arc<AtomicBool>);

impl OutageSwitch {
    pub fn set(&self, unavailable: bool) {
        self.0.store(unavailable, Ordering::SeqCst);
    }

    pub fn check(&self) -> Result<(), Error> {
        if self.0.load(Ordering::SeqCst) {
            return Err(Error::StorageUnavailable("in-memory store switched off".into()));
        }
        Ok(())
    }
}
