// =============================================================================
// atelier-core/src/auth/mod.rs
// =============================================================================

pub mod session;

pub use session::{AppSession, SessionLoader};
