use sea_orm::prelude::TimeDateTimeWithTimeZone;
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;

use std::collections::HashMap;

use crate::error::{Error, Result};
use liga_db as db;

/// Registers a team into a tournament with a zeroed standings row. The
/// (tournament, team) pair is unique; finalize relies on this row existing.
pub async fn register_team<C: ConnectionTrait>(
    db_conn: &C,
    tournament_id: i64,
    team_id: i64,
) -> Result<db::tournament_teams::Model> {
    if db::tournaments::Entity::find_by_id(tournament_id)
        .one(db_conn)
        .await?
        .is_none()
    {
        return Err(Error::NotFound(format!(
            "no tournament with id {tournament_id}"
        )));
    }
    if db::teams::Entity::find_by_id(team_id)
        .one(db_conn)
        .await?
        .is_none()
    {
        return Err(Error::NotFound(format!("no team with id {team_id}")));
    }
    let existing = db::tournament_teams::Entity::find()
        .filter(
            Condition::all()
                .add(db::tournament_teams::Column::TournamentId.eq(tournament_id))
                .add(db::tournament_teams::Column::TeamId.eq(team_id)),
        )
        .one(db_conn)
        .await?;
    if existing.is_some() {
        return Err(Error::Conflict(format!(
            "team {team_id} is already registered in tournament {tournament_id}"
        )));
    }
    let row = db::tournament_teams::ActiveModel {
        tournament_id: Set(tournament_id),
        team_id: Set(team_id),
        played: Set(0),
        won: Set(0),
        drawn: Set(0),
        lost: Set(0),
        goals_for: Set(0),
        goals_against: Set(0),
        goal_diff: Set(0),
        points: Set(0),
        update_time: Set(TimeDateTimeWithTimeZone::now_utc()),
        ..Default::default()
    };
    let id = db::tournament_teams::Entity::insert(row)
        .exec(db_conn)
        .await?
        .last_insert_id;
    db::tournament_teams::Entity::find_by_id(id)
        .one(db_conn)
        .await?
        .ok_or_else(|| Error::Integrity(format!("standings row {id} vanished right after insert")))
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow {
    pub team_id: i64,
    pub team_name: String,
    pub played: i32,
    pub won: i32,
    pub drawn: i32,
    pub lost: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_diff: i32,
    pub points: i32,
}

/// The table, ordered by points, then goal difference, then goals scored.
pub async fn standings<C: ConnectionTrait>(
    db_conn: &C,
    tournament_id: i64,
) -> Result<Vec<StandingRow>> {
    if db::tournaments::Entity::find_by_id(tournament_id)
        .one(db_conn)
        .await?
        .is_none()
    {
        return Err(Error::NotFound(format!(
            "no tournament with id {tournament_id}"
        )));
    }
    let rows = db::tournament_teams::Entity::find()
        .filter(db::tournament_teams::Column::TournamentId.eq(tournament_id))
        .order_by_desc(db::tournament_teams::Column::Points)
        .order_by_desc(db::tournament_teams::Column::GoalDiff)
        .order_by_desc(db::tournament_teams::Column::GoalsFor)
        .all(db_conn)
        .await?;
    let team_names = db::teams::Entity::find()
        .filter(db::teams::Column::Id.is_in(rows.iter().map(|r| r.team_id)))
        .all(db_conn)
        .await?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect::<HashMap<_, _>>();
    Ok(rows
        .into_iter()
        .map(|r| StandingRow {
            team_id: r.team_id,
            team_name: team_names.get(&r.team_id).cloned().unwrap_or_default(),
            played: r.played,
            won: r.won,
            drawn: r.drawn,
            lost: r.lost,
            goals_for: r.goals_for,
            goals_against: r.goals_against,
            goal_diff: r.goal_diff,
            points: r.points,
        })
        .collect())
}
