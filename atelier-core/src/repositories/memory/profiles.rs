// File: atelier-core/src/repositories/memory/profiles.rs

use std::sync::Arc;
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;
use atelier_common::error::Error;
use atelier_common::models::Profile;
use atelier_common::traits::repository_traits::ProfileRepository;

use super::OutageSwitch;

#[derive(Clone, Default)]
pub struct InMemoryProfileRepository {
    profiles: Arc<DashMap<Uuid, Profile>>,
    outage: OutageSwitch,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.outage.set(unavailable);
    }

    pub fn insert(&self, profile: Profile) {
        self.profiles.insert(profile.id, profile);
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, Error> {
        self.outage.check()?;
        Ok(self.profiles.get(&id).map(|p| p.clone()))
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, Error> {
        self.outage.check()?;
        let mut all: Vec<Profile> = self.profiles.iter().map(|p| p.clone()).collect();
        all.sort_by(|a, b| (a.full_name.is_none(), &a.full_name).cmp(&(b.full_name.is_none(), &b.full_name)));
        Ok(all)
    }
}
