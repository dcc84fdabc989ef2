use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tentative participation edge. A name may appear here and in `participant`
/// for the same event; the two roles are independent.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "maybe_participant")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub ctftime_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,

    #[sea_orm(belongs_to, from = "ctftime_id", to = "ctftime_id")]
    pub event: BelongsTo<super::event::Entity>,

    pub added_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
