use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;
use tracing::info;

use crate::db::{now_timestamp, parse_timestamp, parse_uuid};
use crate::domain::{CollectionId, UserId};
use crate::entities::{collection_animes, collections, prelude::*};
use crate::models::{Collection, CollectionFields};

/// Collections table access. Every method is scoped to an owner id.
pub struct CollectionRepository {
    conn: DatabaseConnection,
}

impl CollectionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    fn map_model(model: collections::Model, animes_count: i64) -> Result<Collection> {
        let preview_images: Vec<String> = serde_json::from_str(&model.preview_images)
            .with_context(|| format!("Corrupt preview_images for collection {}", model.id))?;

        Ok(Collection {
            id: CollectionId::from_uuid(parse_uuid(&model.id)?),
            user_id: UserId::from_uuid(parse_uuid(&model.user_id)?),
            name: model.name,
            description: model.description,
            preview_images,
            animes_count,
            created_at: parse_timestamp(&model.created_at)?,
        })
    }

    async fn counts_for(&self, ids: Vec<String>) -> Result<HashMap<String, i64>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i64)> = CollectionAnimes::find()
            .select_only()
            .column(collection_animes::Column::CollectionId)
            .column_as(Expr::col(collection_animes::Column::Id).count(), "animes_count")
            .filter(collection_animes::Column::CollectionId.is_in(ids))
            .group_by(collection_animes::Column::CollectionId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to count collection entries")?;

        Ok(rows.into_iter().collect())
    }

    // ========================================================================
    // Collection Operations
    // ========================================================================

    /// Owner's collections, newest first, with their entry counts. Rows created
    /// within the same timestamp fall back to insertion order.
    pub async fn list_for_owner(&self, user_id: &str) -> Result<Vec<Collection>> {
        let rows = Collections::find()
            .filter(collections::Column::UserId.eq(user_id))
            .order_by_desc(collections::Column::CreatedAt)
            .order_by_desc(Expr::cust("rowid"))
            .all(&self.conn)
            .await
            .context("Failed to list collections")?;

        let counts = self
            .counts_for(rows.iter().map(|r| r.id.clone()).collect())
            .await?;

        rows.into_iter()
            .map(|row| {
                let count = counts.get(&row.id).copied().unwrap_or(0);
                Self::map_model(row, count)
            })
            .collect()
    }

    pub async fn insert(&self, user_id: &str, fields: &CollectionFields) -> Result<Collection> {
        let now = now_timestamp();
        let active = collections::ActiveModel {
            id: Set(CollectionId::generate().to_string()),
            user_id: Set(user_id.to_string()),
            name: Set(fields.name.clone()),
            description: Set(fields.description.clone()),
            preview_images: Set(serde_json::to_string(&fields.preview_images)?),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert collection")?;

        info!("Created collection {} for user {}", model.id, user_id);
        Self::map_model(model, 0)
    }

    /// Returns the number of rows changed: zero when the collection is missing or not owned.
    pub async fn update(&self, id: &str, user_id: &str, fields: &CollectionFields) -> Result<u64> {
        let result = Collections::update_many()
            .col_expr(collections::Column::Name, Expr::value(fields.name.clone()))
            .col_expr(
                collections::Column::Description,
                Expr::value(fields.description.clone()),
            )
            .col_expr(
                collections::Column::PreviewImages,
                Expr::value(serde_json::to_string(&fields.preview_images)?),
            )
            .col_expr(collections::Column::UpdatedAt, Expr::value(now_timestamp()))
            .filter(collections::Column::Id.eq(id))
            .filter(collections::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to update collection")?;

        Ok(result.rows_affected)
    }

    /// Deletes an owned collection together with its entries.
    pub async fn delete(&self, id: &str, user_id: &str) -> Result<u64> {
        let txn = self.conn.begin().await?;

        let owned = Collections::find()
            .filter(collections::Column::Id.eq(id))
            .filter(collections::Column::UserId.eq(user_id))
            .count(&txn)
            .await?;
        if owned == 0 {
            return Ok(0);
        }

        CollectionAnimes::delete_many()
            .filter(collection_animes::Column::CollectionId.eq(id))
            .exec(&txn)
            .await?;

        let result = Collections::delete_many()
            .filter(collections::Column::Id.eq(id))
            .filter(collections::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(result.rows_affected)
    }

    pub async fn is_owned_by(&self, id: &str, user_id: &str) -> Result<bool> {
        let count = Collections::find()
            .filter(collections::Column::Id.eq(id))
            .filter(collections::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await?;

        Ok(count > 0)
    }
}
