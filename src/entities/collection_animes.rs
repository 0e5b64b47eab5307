use sea_orm::entity::prelude::*;

/// Denormalized copy of an anime plus the owner's tracking fields.
/// No uniqueness constraint on (collection_id, mal_id).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "collection_animes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub collection_id: String,

    pub mal_id: i32,

    pub title: String,

    pub url: String,

    pub image_jpg: String,

    pub image_webp: String,

    /// plan_to_watch | watching | completed
    pub status: String,

    pub anime_type: Option<String>,

    pub episodes: Option<i32>,

    pub progress: i32,

    pub score: i32,

    pub airing: bool,

    pub synopsis: Option<String>,

    pub season: Option<String>,

    pub year: Option<i32>,

    /// JSON array of genre objects
    pub genres: String,

    pub started_at: Option<String>,

    pub finished_at: Option<String>,

    pub notes: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::collections::Entity",
        from = "Column::CollectionId",
        to = "super::collections::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Collections,
}

impl Related<super::collections::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collections.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
