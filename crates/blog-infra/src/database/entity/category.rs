//! Category entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for blog_core::domain::Category {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            slug: model.slug,
            is_published: model.is_published,
            created_at: model.created_at.into(),
        }
    }
}
