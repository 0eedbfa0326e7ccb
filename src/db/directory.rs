use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::Row;

use super::{queries, DbPool};
use crate::models::account::{Boat, User};
use crate::models::claim::{Claim, Role};
use crate::store::{IdentityVerifier, UserDirectory};

/// Users, boats and issued access tokens, all backed by the same pool.
pub struct PgDirectory {
    pool: DbPool,
}

impl PgDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgDirectory {
    async fn find_user(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(queries::SELECT_USER_BY_USERNAME)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_boat_for_user(&self, user: &User, emblem: &str) -> Result<Option<Boat>> {
        let boat = sqlx::query_as::<_, Boat>(queries::SELECT_BOAT_FOR_USER)
            .bind(user.user_id)
            .bind(emblem)
            .fetch_optional(&self.pool)
            .await?;
        Ok(boat)
    }

    async fn get_boat_by_emblem(&self, emblem: &str) -> Result<Option<Boat>> {
        let boat = sqlx::query_as::<_, Boat>(queries::SELECT_BOAT_BY_EMBLEM)
            .bind(emblem)
            .fetch_optional(&self.pool)
            .await?;
        Ok(boat)
    }
}

#[async_trait]
impl IdentityVerifier for PgDirectory {
    async fn verify(&self, token: &str) -> Result<Claim> {
        let row = sqlx::query(queries::SELECT_ACCESS_TOKEN)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| anyhow!("token not issued or expired"))?;

        let kind: String = row.try_get("kind")?;
        let identifier: String = row.try_get("identifier")?;
        let role: Role = kind.parse()?;

        Ok(Claim::new(role, identifier))
    }
}
