use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    /// CTFtime catalog id. Immutable once assigned.
    #[sea_orm(primary_key, auto_increment = false)]
    pub ctftime_id: String,

    /// Discord announcement message id, usable as an alternate lookup key.
    #[sea_orm(unique)]
    pub message_id: String,

    pub title: String,
    pub url: String,
    pub description: String,

    // Raw source text, stored verbatim. Normalized only at query time so the
    // parser can improve without a migration.
    pub start: String,
    pub end: String,

    #[sea_orm(has_many)]
    pub participants: HasMany<super::participant::Entity>,

    #[sea_orm(has_many)]
    pub maybe_participants: HasMany<super::maybe_participant::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
