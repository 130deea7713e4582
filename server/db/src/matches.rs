use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "finished")]
    Finished,
    #[sea_orm(string_value = "suspended")]
    Suspended,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "matches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(indexed)]
    pub tournament_id: i64,
    #[sea_orm(indexed)]
    pub local_team_id: i64,
    #[sea_orm(indexed)]
    pub away_team_id: i64,
    pub field_id: Option<i64>,
    #[sea_orm(indexed)]
    pub scheduled_time: TimeDateTimeWithTimeZone,
    pub stage: String,
    pub category: String,
    pub match_day: Option<i32>,
    pub status: Status,
    pub local_score: i32,
    pub away_score: i32,
    pub video_url: Option<String>,
    pub creation_time: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tournaments::Entity",
        from = "Column::TournamentId",
        to = "super::tournaments::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Tournaments,
    #[sea_orm(
        belongs_to = "super::fields::Entity",
        from = "Column::FieldId",
        to = "super::fields::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Fields,
    #[sea_orm(has_many = "super::vocalias::Entity")]
    Vocalias,
    #[sea_orm(has_many = "super::goals::Entity")]
    Goals,
    #[sea_orm(has_many = "super::sanctions::Entity")]
    Sanctions,
    #[sea_orm(has_many = "super::substitutions::Entity")]
    Substitutions,
    #[sea_orm(has_many = "super::match_players::Entity")]
    MatchPlayers,
}

impl Related<super::tournaments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tournaments.def()
    }
}

impl Related<super::fields::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fields.def()
    }
}

impl Related<super::vocalias::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vocalias.def()
    }
}

impl Related<super::goals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goals.def()
    }
}

impl Related<super::sanctions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sanctions.def()
    }
}

impl Related<super::substitutions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Substitutions.def()
    }
}

impl Related<super::match_players::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MatchPlayers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
