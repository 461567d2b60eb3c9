// File: atelier-core/src/repositories/postgres/profiles.rs

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;
use atelier_common::error::Error;
use atelier_common::models::{Profile, Role};
use atelier_common::traits::repository_traits::ProfileRepository;

#[derive(Clone)]
pub struct PostgresProfileRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresProfileRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Inserts or refreshes a profile row. Used by seeding and tests; the live
    /// site gets its profiles from the auth backend's signup trigger.
    pub async fn upsert_profile(&self, profile: &Profile) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, email, full_name, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
              SET email = EXCLUDED.email,
                  full_name = EXCLUDED.full_name,
                  role = EXCLUDED.role
            "#,
        )
            .bind(profile.id)
            .bind(&profile.email)
            .bind(&profile.full_name)
            .bind(profile.role.as_str())
            .bind(profile.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_profile(r: &PgRow) -> Result<Profile, Error> {
    let role: String = r.try_get("role")?;
    Ok(Profile {
        id: r.try_get("id")?,
        email: r.try_get("email")?,
        full_name: r.try_get("full_name")?,
        role: Role::from_db(&role),
        created_at: r.try_get("created_at")?,
    })
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, Error> {
        let row = sqlx::query(
            r#"
            SELECT id, email, full_name, role, created_at
            FROM profiles
            WHERE id = $1
            "#,
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_profile).transpose()
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, full_name, role, created_at
            FROM profiles
            ORDER BY full_name ASC NULLS LAST
            "#,
        )
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_profile).collect()
    }
}
