use sea_orm::prelude::TimeDateTimeWithTimeZone;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;

use crate::crud::{self, PageParams, Pagination};
use crate::engine;
use crate::error::{Error, Result};
use liga_db as db;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInput {
    pub tournament_id: i64,
    pub local_team_id: i64,
    pub away_team_id: i64,
    pub scheduled_time: TimeDateTimeWithTimeZone,
    pub stage: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub match_day: Option<i32>,
    #[serde(default)]
    pub field_id: Option<i64>,
    #[serde(default)]
    pub video_url: Option<String>,
    // A vocal named at scheduling time gets the officiating record created
    // alongside the match.
    #[serde(default)]
    pub vocal_id: Option<i64>,
}

pub async fn create_match<C: ConnectionTrait>(
    db_conn: &C,
    input: MatchInput,
) -> Result<db::matches::Model> {
    if input.local_team_id == input.away_team_id {
        return Err(Error::Validation(format!(
            "a team cannot play itself (team {})",
            input.local_team_id
        )));
    }
    if db::tournaments::Entity::find_by_id(input.tournament_id)
        .one(db_conn)
        .await?
        .is_none()
    {
        return Err(Error::NotFound(format!(
            "no tournament with id {}",
            input.tournament_id
        )));
    }
    let teams = db::teams::Entity::find()
        .filter(db::teams::Column::Id.is_in([input.local_team_id, input.away_team_id]))
        .all(db_conn)
        .await?;
    if teams.len() != 2 {
        return Err(Error::NotFound(format!(
            "teams {} and {} must both exist",
            input.local_team_id, input.away_team_id
        )));
    }
    if let Some(field_id) = input.field_id {
        if db::fields::Entity::find_by_id(field_id)
            .one(db_conn)
            .await?
            .is_none()
        {
            return Err(Error::NotFound(format!("no field with id {field_id}")));
        }
    }
    let row = db::matches::ActiveModel {
        tournament_id: Set(input.tournament_id),
        local_team_id: Set(input.local_team_id),
        away_team_id: Set(input.away_team_id),
        field_id: Set(input.field_id),
        scheduled_time: Set(input.scheduled_time),
        stage: Set(input.stage),
        category: Set(input.category),
        match_day: Set(input.match_day),
        status: Set(db::matches::Status::Scheduled),
        local_score: Set(0),
        away_score: Set(0),
        video_url: Set(input.video_url),
        creation_time: Set(TimeDateTimeWithTimeZone::now_utc()),
        ..Default::default()
    };
    let match_id = db::matches::Entity::insert(row)
        .exec(db_conn)
        .await?
        .last_insert_id;
    if let Some(vocal_id) = input.vocal_id {
        engine::create(db_conn, match_id, vocal_id).await?;
    }
    db::matches::Entity::find_by_id(match_id)
        .one(db_conn)
        .await?
        .ok_or_else(|| Error::Integrity(format!("match {match_id} vanished right after insert")))
}

/// Bulk "programming sheet" import: every match and officiating assignment
/// on the sheet is created, or none of them.
pub async fn create_programming_sheet(
    db_conn: &DatabaseConnection,
    sheet: Vec<MatchInput>,
) -> Result<Vec<i64>> {
    if sheet.is_empty() {
        return Err(Error::Validation("empty programming sheet".to_owned()));
    }
    db_conn
        .transaction(|txn| {
            Box::pin(async move {
                let mut ids = Vec::with_capacity(sheet.len());
                for input in sheet {
                    ids.push(create_match(txn, input).await?.id);
                }
                Ok(ids)
            })
        })
        .await
        .map_err(Error::from)
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchUpdate {
    pub scheduled_time: Option<TimeDateTimeWithTimeZone>,
    pub stage: Option<String>,
    pub category: Option<String>,
    pub match_day: Option<i32>,
    pub field_id: Option<i64>,
    pub status: Option<db::matches::Status>,
    pub local_score: Option<i32>,
    pub away_score: Option<i32>,
    pub video_url: Option<String>,
}

/// Admin correction path. `finished` is terminal: only finalize sets it,
/// and a finished match is immutable here.
pub async fn update_match<C: ConnectionTrait>(
    db_conn: &C,
    match_id: i64,
    update: MatchUpdate,
) -> Result<db::matches::Model> {
    let Some(existing) = db::matches::Entity::find_by_id(match_id).one(db_conn).await? else {
        return Err(Error::NotFound(format!("no match with id {match_id}")));
    };
    if existing.status == db::matches::Status::Finished {
        return Err(Error::Validation(format!(
            "match {match_id} is finished and can no longer be modified"
        )));
    }
    if update.status == Some(db::matches::Status::Finished) {
        return Err(Error::Validation(
            "a match becomes finished through the finalize operation".to_owned(),
        ));
    }
    let mut writeback = db::matches::ActiveModel {
        id: Set(existing.id),
        ..Default::default()
    };
    if let Some(scheduled_time) = update.scheduled_time {
        writeback.scheduled_time = Set(scheduled_time);
    }
    if let Some(stage) = update.stage {
        writeback.stage = Set(stage);
    }
    if let Some(category) = update.category {
        writeback.category = Set(category);
    }
    if let Some(match_day) = update.match_day {
        writeback.match_day = Set(Some(match_day));
    }
    if let Some(field_id) = update.field_id {
        writeback.field_id = Set(Some(field_id));
    }
    if let Some(status) = update.status {
        writeback.status = Set(status);
    }
    if let Some(local_score) = update.local_score {
        crate::validation::validate_score(local_score).map_err(Error::Validation)?;
        writeback.local_score = Set(local_score);
    }
    if let Some(away_score) = update.away_score {
        crate::validation::validate_score(away_score).map_err(Error::Validation)?;
        writeback.away_score = Set(away_score);
    }
    if let Some(video_url) = update.video_url {
        writeback.video_url = Set(Some(video_url));
    }
    Ok(db::matches::Entity::update(writeback).exec(db_conn).await?)
}

pub async fn delete_match<C: ConnectionTrait>(db_conn: &C, match_id: i64) -> Result<()> {
    let result = db::matches::Entity::delete_by_id(match_id)
        .exec(db_conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound(format!("no match with id {match_id}")));
    }
    Ok(())
}

pub async fn get_match<C: ConnectionTrait>(db_conn: &C, match_id: i64) -> Result<db::matches::Model> {
    db::matches::Entity::find_by_id(match_id)
        .one(db_conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("no match with id {match_id}")))
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFilter {
    pub tournament_id: Option<i64>,
    pub team_id: Option<i64>,
    pub status: Option<db::matches::Status>,
    pub from: Option<TimeDateTimeWithTimeZone>,
    pub to: Option<TimeDateTimeWithTimeZone>,
}

pub async fn list_matches<C: ConnectionTrait>(
    db_conn: &C,
    filter: MatchFilter,
    page: PageParams,
) -> Result<(Vec<db::matches::Model>, Pagination)> {
    let mut condition = Condition::all()
        .add(crud::eq_filter(
            db::matches::Column::TournamentId,
            filter.tournament_id,
        ))
        .add(crud::eq_filter(db::matches::Column::Status, filter.status))
        .add(crud::date_range_filter(
            db::matches::Column::ScheduledTime,
            filter.from,
            filter.to,
        ));
    if let Some(team_id) = filter.team_id {
        condition = condition.add(
            Condition::any()
                .add(db::matches::Column::LocalTeamId.eq(team_id))
                .add(db::matches::Column::AwayTeamId.eq(team_id)),
        );
    }
    let select = db::matches::Entity::find()
        .filter(condition)
        .order_by_asc(db::matches::Column::ScheduledTime);
    Ok(crud::paginate(db_conn, select, page).await?)
}
