// File: atelier-core/src/repositories/rest/profiles.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use uuid::Uuid;
use atelier_common::error::Error;
use atelier_common::models::{Profile, Role};
use atelier_common::traits::repository_traits::ProfileRepository;

use super::{eq, RestClient};

#[derive(Debug, Deserialize)]
struct ProfileRow {
    id: Uuid,
    email: Option<String>,
    full_name: Option<String>,
    role: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            role: Role::from_db(row.role.as_deref().unwrap_or("user")),
            created_at: row.created_at,
        }
    }
}

#[derive(Clone)]
pub struct RestProfileRepository {
    client: RestClient,
}

impl RestProfileRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProfileRepository for RestProfileRepository {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, Error> {
        let rb = self
            .client
            .request(Method::GET, "profiles")?
            .query(&[("select", "*".to_string()), ("id", eq(id))]);
        let rows: Vec<ProfileRow> = self.client.send_json(rb).await?;
        Ok(rows.into_iter().next().map(Profile::from))
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, Error> {
        let rb = self
            .client
            .request(Method::GET, "profiles")?
            .query(&[("select", "*"), ("order", "full_name.asc")]);
        let rows: Vec<ProfileRow> = self.client.send_json(rb).await?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }
}
