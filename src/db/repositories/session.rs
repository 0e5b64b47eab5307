use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use super::user::generate_token;
use crate::db::{format_timestamp, now_timestamp, parse_timestamp};
use crate::entities::sessions;

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user_id: &str, ttl: Duration) -> Result<sessions::Model> {
        let active = sessions::ActiveModel {
            access_token: Set(generate_token()),
            refresh_token: Set(generate_token()),
            user_id: Set(user_id.to_string()),
            expires_at: Set(format_timestamp(Utc::now() + ttl)),
            created_at: Set(now_timestamp()),
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert session")
    }

    pub async fn find_valid(
        &self,
        access_token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<sessions::Model>> {
        let row = sessions::Entity::find_by_id(access_token.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query session")?;

        match row {
            Some(row) if parse_timestamp(&row.expires_at)? > now => Ok(Some(row)),
            _ => Ok(None),
        }
    }

    /// Exchanges a refresh token for a new token pair. The old pair stops working.
    pub async fn rotate(&self, refresh_token: &str, ttl: Duration) -> Result<Option<sessions::Model>> {
        let txn = self.conn.begin().await?;

        let Some(existing) = sessions::Entity::find()
            .filter(sessions::Column::RefreshToken.eq(refresh_token))
            .one(&txn)
            .await?
        else {
            return Ok(None);
        };

        sessions::Entity::delete_by_id(existing.access_token.clone())
            .exec(&txn)
            .await?;

        let active = sessions::ActiveModel {
            access_token: Set(generate_token()),
            refresh_token: Set(generate_token()),
            user_id: Set(existing.user_id),
            expires_at: Set(format_timestamp(Utc::now() + ttl)),
            created_at: Set(now_timestamp()),
        };
        let model = active.insert(&txn).await?;

        txn.commit().await?;
        Ok(Some(model))
    }

    pub async fn delete(&self, access_token: &str) -> Result<bool> {
        let result = sessions::Entity::delete_by_id(access_token.to_string())
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn delete_for_user(&self, user_id: &str) -> Result<u64> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }
}
