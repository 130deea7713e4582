use sea_orm::prelude::TimeDateTimeWithTimeZone;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::stats;
use liga_db as db;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalInput {
    pub match_id: i64,
    pub team_id: i64,
    pub player_id: i64,
    pub minute: i32,
    #[serde(default)]
    pub own_goal: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanctionInput {
    pub match_id: i64,
    pub team_id: i64,
    pub player_id: i64,
    pub minute: i32,
    pub kind: db::sanctions::Kind,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionInput {
    pub match_id: i64,
    pub team_id: i64,
    pub player_in_id: i64,
    pub player_out_id: i64,
    pub minute: i32,
}

async fn event_match<C: ConnectionTrait>(db_conn: &C, match_id: i64) -> Result<db::matches::Model> {
    db::matches::Entity::find_by_id(match_id)
        .one(db_conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("no match with id {match_id}")))
}

async fn check_players<C: ConnectionTrait>(db_conn: &C, ids: &[i64]) -> Result<()> {
    let found = db::players::Entity::find()
        .filter(db::players::Column::Id.is_in(ids.iter().copied()))
        .all(db_conn)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect::<HashSet<_>>();
    for id in ids {
        if !found.contains(id) {
            return Err(Error::NotFound(format!("no player with id {id}")));
        }
    }
    Ok(())
}

pub async fn record_goal<C: ConnectionTrait>(
    db_conn: &C,
    cache: &stats::Cache,
    input: GoalInput,
) -> Result<db::goals::Model> {
    let m = event_match(db_conn, input.match_id).await?;
    let id = record_goal_in_txn(db_conn, input).await?;
    cache.invalidate(m.tournament_id);
    db::goals::Entity::find_by_id(id)
        .one(db_conn)
        .await?
        .ok_or_else(|| Error::Integrity(format!("goal {id} vanished right after insert")))
}

pub async fn record_goals(
    db_conn: &DatabaseConnection,
    cache: &stats::Cache,
    inputs: Vec<GoalInput>,
) -> Result<Vec<i64>> {
    if inputs.is_empty() {
        return Err(Error::Validation("empty goal list".to_owned()));
    }
    let tournaments = tournaments_of(db_conn, inputs.iter().map(|i| i.match_id)).await?;
    let ids = db_conn
        .transaction(|txn| {
            Box::pin(async move {
                let mut ids = Vec::with_capacity(inputs.len());
                for input in inputs {
                    ids.push(record_goal_in_txn(txn, input).await?);
                }
                Ok(ids)
            })
        })
        .await
        .map_err(Error::from)?;
    for t in tournaments {
        cache.invalidate(t);
    }
    Ok(ids)
}

async fn record_goal_in_txn<C: ConnectionTrait>(txn: &C, input: GoalInput) -> Result<i64> {
    crate::validation::validate_minute(input.minute).map_err(Error::Validation)?;
    event_match(txn, input.match_id).await?;
    check_players(txn, &[input.player_id]).await?;
    let row = db::goals::ActiveModel {
        match_id: Set(input.match_id),
        team_id: Set(input.team_id),
        player_id: Set(input.player_id),
        minute: Set(input.minute),
        own_goal: Set(input.own_goal),
        creation_time: Set(TimeDateTimeWithTimeZone::now_utc()),
        ..Default::default()
    };
    Ok(db::goals::Entity::insert(row).exec(txn).await?.last_insert_id)
}

pub async fn delete_goal<C: ConnectionTrait>(
    db_conn: &C,
    cache: &stats::Cache,
    goal_id: i64,
) -> Result<()> {
    let Some(goal) = db::goals::Entity::find_by_id(goal_id).one(db_conn).await? else {
        return Err(Error::NotFound(format!("no goal with id {goal_id}")));
    };
    let m = event_match(db_conn, goal.match_id).await?;
    db::goals::Entity::delete_by_id(goal_id).exec(db_conn).await?;
    cache.invalidate(m.tournament_id);
    Ok(())
}

pub async fn record_sanction<C: ConnectionTrait>(
    db_conn: &C,
    cache: &stats::Cache,
    input: SanctionInput,
) -> Result<db::sanctions::Model> {
    let m = event_match(db_conn, input.match_id).await?;
    let id = record_sanction_in_txn(db_conn, input).await?;
    cache.invalidate(m.tournament_id);
    db::sanctions::Entity::find_by_id(id)
        .one(db_conn)
        .await?
        .ok_or_else(|| Error::Integrity(format!("sanction {id} vanished right after insert")))
}

pub async fn record_sanctions(
    db_conn: &DatabaseConnection,
    cache: &stats::Cache,
    inputs: Vec<SanctionInput>,
) -> Result<Vec<i64>> {
    if inputs.is_empty() {
        return Err(Error::Validation("empty sanction list".to_owned()));
    }
    let tournaments = tournaments_of(db_conn, inputs.iter().map(|i| i.match_id)).await?;
    let ids = db_conn
        .transaction(|txn| {
            Box::pin(async move {
                let mut ids = Vec::with_capacity(inputs.len());
                for input in inputs {
                    ids.push(record_sanction_in_txn(txn, input).await?);
                }
                Ok(ids)
            })
        })
        .await
        .map_err(Error::from)?;
    for t in tournaments {
        cache.invalidate(t);
    }
    Ok(ids)
}

async fn record_sanction_in_txn<C: ConnectionTrait>(txn: &C, input: SanctionInput) -> Result<i64> {
    crate::validation::validate_minute(input.minute).map_err(Error::Validation)?;
    event_match(txn, input.match_id).await?;
    check_players(txn, &[input.player_id]).await?;
    let row = db::sanctions::ActiveModel {
        match_id: Set(input.match_id),
        team_id: Set(input.team_id),
        player_id: Set(input.player_id),
        minute: Set(input.minute),
        kind: Set(input.kind),
        creation_time: Set(TimeDateTimeWithTimeZone::now_utc()),
        ..Default::default()
    };
    Ok(db::sanctions::Entity::insert(row)
        .exec(txn)
        .await?
        .last_insert_id)
}

pub async fn delete_sanction<C: ConnectionTrait>(
    db_conn: &C,
    cache: &stats::Cache,
    sanction_id: i64,
) -> Result<()> {
    let Some(sanction) = db::sanctions::Entity::find_by_id(sanction_id)
        .one(db_conn)
        .await?
    else {
        return Err(Error::NotFound(format!("no sanction with id {sanction_id}")));
    };
    let m = event_match(db_conn, sanction.match_id).await?;
    db::sanctions::Entity::delete_by_id(sanction_id)
        .exec(db_conn)
        .await?;
    cache.invalidate(m.tournament_id);
    Ok(())
}

pub async fn record_substitution<C: ConnectionTrait>(
    db_conn: &C,
    cache: &stats::Cache,
    input: SubstitutionInput,
) -> Result<db::substitutions::Model> {
    let m = event_match(db_conn, input.match_id).await?;
    let id = record_substitution_in_txn(db_conn, input).await?;
    cache.invalidate(m.tournament_id);
    db::substitutions::Entity::find_by_id(id)
        .one(db_conn)
        .await?
        .ok_or_else(|| Error::Integrity(format!("substitution {id} vanished right after insert")))
}

pub async fn record_substitutions(
    db_conn: &DatabaseConnection,
    cache: &stats::Cache,
    inputs: Vec<SubstitutionInput>,
) -> Result<Vec<i64>> {
    if inputs.is_empty() {
        return Err(Error::Validation("empty substitution list".to_owned()));
    }
    let tournaments = tournaments_of(db_conn, inputs.iter().map(|i| i.match_id)).await?;
    let ids = db_conn
        .transaction(|txn| {
            Box::pin(async move {
                let mut ids = Vec::with_capacity(inputs.len());
                for input in inputs {
                    ids.push(record_substitution_in_txn(txn, input).await?);
                }
                Ok(ids)
            })
        })
        .await
        .map_err(Error::from)?;
    for t in tournaments {
        cache.invalidate(t);
    }
    Ok(ids)
}

async fn record_substitution_in_txn<C: ConnectionTrait>(
    txn: &C,
    input: SubstitutionInput,
) -> Result<i64> {
    crate::validation::validate_minute(input.minute).map_err(Error::Validation)?;
    if input.player_in_id == input.player_out_id {
        return Err(Error::Validation(format!(
            "player {} cannot substitute themselves",
            input.player_in_id
        )));
    }
    event_match(txn, input.match_id).await?;
    check_players(txn, &[input.player_in_id, input.player_out_id]).await?;
    let row = db::substitutions::ActiveModel {
        match_id: Set(input.match_id),
        team_id: Set(input.team_id),
        player_in_id: Set(input.player_in_id),
        player_out_id: Set(input.player_out_id),
        minute: Set(input.minute),
        creation_time: Set(TimeDateTimeWithTimeZone::now_utc()),
        ..Default::default()
    };
    Ok(db::substitutions::Entity::insert(row)
        .exec(txn)
        .await?
        .last_insert_id)
}

pub async fn delete_substitution<C: ConnectionTrait>(
    db_conn: &C,
    cache: &stats::Cache,
    substitution_id: i64,
) -> Result<()> {
    let Some(substitution) = db::substitutions::Entity::find_by_id(substitution_id)
        .one(db_conn)
        .await?
    else {
        return Err(Error::NotFound(format!(
            "no substitution with id {substitution_id}"
        )));
    };
    let m = event_match(db_conn, substitution.match_id).await?;
    db::substitutions::Entity::delete_by_id(substitution_id)
        .exec(db_conn)
        .await?;
    cache.invalidate(m.tournament_id);
    Ok(())
}

async fn tournaments_of<C: ConnectionTrait>(
    db_conn: &C,
    match_ids: impl Iterator<Item = i64>,
) -> Result<HashSet<i64>> {
    Ok(db::matches::Entity::find()
        .filter(db::matches::Column::Id.is_in(match_ids))
        .all(db_conn)
        .await?
        .into_iter()
        .map(|m| m.tournament_id)
        .collect())
}
