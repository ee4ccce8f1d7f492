//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub pub_date: DateTimeWithTimeZone,
    pub author_id: i32,
    pub location_id: Option<i32>,
    pub category_id: Option<i32>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Author,
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Location,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for blog_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            text: model.text,
            pub_date: model.pub_date.into(),
            author_id: model.author_id,
            location_id: model.location_id,
            category_id: model.category_id,
            image: model.image,
            is_published: model.is_published,
            created_at: model.created_at.into(),
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<blog_core::domain::Post> for ActiveModel {
    fn from(post: blog_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            title: Set(post.title),
            text: Set(post.text),
            pub_date: Set(post.pub_date.into()),
            author_id: Set(post.author_id),
            location_id: Set(post.location_id),
            category_id: Set(post.category_id),
            image: Set(post.image),
            is_published: Set(post.is_published),
            created_at: Set(post.created_at.into()),
        }
    }
}
