pub mod repository_traits;

pub use repository_traits::{CouponRepository, ProfileRepository};
