// File: atelier-core/src/auth/session.rs
//
// Per-request session context. Built by whoever handles the request and
// passed down explicitly; there is no process-wide "current user".

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use atelier_common::models::Profile;
use atelier_common::traits::repository_traits::ProfileRepository;
use crate::Error;

#[derive(Debug, Clone, Default)]
pub struct AppSession {
    profile: Option<Profile>,
}

impl AppSession {
    pub fn anonymous() -> Self {
        Self { profile: None }
    }

    pub fn for_profile(profile: Profile) -> Self {
        Self { profile: Some(profile) }
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// The identity the coupon rules compare against; `None` when signed out.
    pub fn requester_id(&self) -> Option<Uuid> {
        self.profile.as_ref().map(|p| p.id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(Profile::is_admin)
    }

    pub fn require_admin(&self) -> Result<&Profile, Error> {
        match self.profile.as_ref() {
            Some(p) if p.is_admin() => Ok(p),
            Some(p) => Err(Error::Forbidden(format!("profile {} is not an administrator", p.id))),
            None => Err(Error::Forbidden("sign in as an administrator first".into())),
        }
    }
}

/// Resolves a requester id into a session by looking up its profile.
pub struct SessionLoader {
    profile_repo: Arc<dyn ProfileRepository + Send + Sync>,
}

impl SessionLoader {
    pub fn new(profile_repo: Arc<dyn ProfileRepository + Send + Sync>) -> Self {
        Self { profile_repo }
    }

    /// Unknown ids give an anonymous session; storage errors propagate.
    pub async fn load(&self, requester: Option<Uuid>) -> Result<AppSession, Error> {
        let Some(id) = requester else {
            return Ok(AppSession::anonymous());
        };
        match self.profile_repo.get_profile(id).await? {
            Some(profile) => Ok(AppSession::for_profile(profile)),
            None => {
                debug!("no profile for requester {}; treating as signed out", id);
                Ok(AppSession::anonymous())
            }
        }
    }
}
