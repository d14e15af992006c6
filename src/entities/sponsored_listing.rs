use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sponsored_listings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub image_url: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub url: String,
    pub feed_url: String,
    /// JSON array of category tags.
    #[sea_orm(column_type = "Text")]
    pub categories: String,
    pub priority: i32,
    pub status: String,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
    pub impression_limit: i64,
    pub click_limit: i64,
    pub total_impressions: i64,
    pub total_clicks: i64,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
