//! atelier-server/src/context.rs
//!
//! Wires the configured backend into the services the HTTP API and the
//! admin console share.

use std::sync::Arc;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use atelier_common::models::{Profile, Role};
use atelier_core::auth::SessionLoader;
use atelier_core::repositories::{
    CouponRepository, InMemoryCouponRepository, InMemoryProfileRepository,
    PostgresCouponRepository, PostgresProfileRepository, ProfileRepository, RestClient,
    RestCouponRepository, RestProfileRepository,
};
use atelier_core::services::{CouponAdminService, CouponService};
use atelier_core::{AppConfig, BackendKind, Database, Error};

/// Administrator seeded into the memory backend so the console is usable
/// without any external store.
pub const DEMO_ADMIN_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001);

type CouponRepo = Arc<dyn CouponRepository + Send + Sync>;
type ProfileRepo = Arc<dyn ProfileRepository + Send + Sync>;

pub struct ServerContext {
    pub config: AppConfig,
    pub coupon_service: Arc<CouponService>,
    pub admin_service: Arc<CouponAdminService>,
    pub session_loader: Arc<SessionLoader>,
}

impl ServerContext {
    /// Connects to the configured backend (running migrations for Postgres).
    pub async fn new(config: AppConfig) -> Result<Self, Error> {
        config.validate()?;
        info!("Using {} backend", config.backend);

        let (coupons, profiles): (CouponRepo, ProfileRepo) = match config.backend {
            BackendKind::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| Error::Config("DATABASE_URL is not set".into()))?;
                let db = Database::new(url).await?;
                db.migrate().await?;
                (
                    Arc::new(PostgresCouponRepository::new(db.pool().clone())),
                    Arc::new(PostgresProfileRepository::new(db.pool().clone())),
                )
            }
            BackendKind::Rest => {
                let (Some(url), Some(key)) = (config.rest_url.as_deref(), config.rest_key.as_deref()) else {
                    return Err(Error::Config("SUPABASE_URL / SUPABASE_ANON_KEY are not set".into()));
                };
                let client = RestClient::new(url, key)?;
                (
                    Arc::new(RestCouponRepository::new(client.clone())),
                    Arc::new(RestProfileRepository::new(client)),
                )
            }
            BackendKind::Memory => {
                let profiles = InMemoryProfileRepository::new();
                profiles.insert(demo_admin());
                info!("Memory backend: seeded administrator {}", DEMO_ADMIN_ID);
                (Arc::new(InMemoryCouponRepository::new()), Arc::new(profiles))
            }
        };

        Ok(Self::from_repositories(config, coupons, profiles))
    }

    pub fn from_repositories(config: AppConfig, coupons: CouponRepo, profiles: ProfileRepo) -> Self {
        Self {
            config,
            coupon_service: Arc::new(CouponService::new(coupons.clone())),
            admin_service: Arc::new(CouponAdminService::new(coupons, profiles.clone())),
            session_loader: Arc::new(SessionLoader::new(profiles)),
        }
    }
}

fn demo_admin() -> Profile {
    Profile {
        id: DEMO_ADMIN_ID,
        email: Some("admin@localhost".into()),
        full_name: Some("Studio Admin".into()),
        role: Role::Admin,
        created_at: Utc::now(),
    }
}
