use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::stats;
use liga_db as db;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub player_id: i64,
    #[serde(default)]
    pub is_starting: bool,
}

/// Replaces a team's roster for one match: the previous entries and the
/// team's recorded events for that match are dropped and the new set is
/// inserted, all in one transaction. Last write wins; rosters are never
/// merged.
pub async fn replace(
    db_conn: &DatabaseConnection,
    cache: &stats::Cache,
    match_id: i64,
    team_id: i64,
    entries: Vec<RosterEntry>,
) -> Result<usize> {
    let mut seen = HashSet::new();
    for e in &entries {
        if !seen.insert(e.player_id) {
            return Err(Error::Validation(format!(
                "player {} appears twice on the roster",
                e.player_id
            )));
        }
    }
    let tournament_id = db_conn
        .transaction(|txn| {
            Box::pin(async move { replace_in_txn(txn, match_id, team_id, entries).await })
        })
        .await
        .map_err(Error::from)?;
    cache.invalidate(tournament_id);
    Ok(seen.len())
}

async fn replace_in_txn<C: ConnectionTrait>(
    txn: &C,
    match_id: i64,
    team_id: i64,
    entries: Vec<RosterEntry>,
) -> Result<i64> {
    let Some(m) = db::matches::Entity::find_by_id(match_id).one(txn).await? else {
        return Err(Error::NotFound(format!("no match with id {match_id}")));
    };
    if team_id != m.local_team_id && team_id != m.away_team_id {
        return Err(Error::Validation(format!(
            "team {team_id} does not play match {match_id}"
        )));
    }
    let player_ids = entries.iter().map(|e| e.player_id).collect::<Vec<_>>();
    let known = db::players::Entity::find()
        .filter(db::players::Column::Id.is_in(player_ids.iter().copied()))
        .all(txn)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect::<HashSet<_>>();
    for id in &player_ids {
        if !known.contains(id) {
            return Err(Error::NotFound(format!("no player with id {id}")));
        }
    }
    let pair = Condition::all()
        .add(db::match_players::Column::MatchId.eq(match_id))
        .add(db::match_players::Column::TeamId.eq(team_id));
    db::match_players::Entity::delete_many()
        .filter(pair)
        .exec(txn)
        .await?;
    // Resetting the roster also drops the team's recorded events for the
    // match; they reference players that may no longer be fielded.
    db::goals::Entity::delete_many()
        .filter(
            Condition::all()
                .add(db::goals::Column::MatchId.eq(match_id))
                .add(db::goals::Column::TeamId.eq(team_id)),
        )
        .exec(txn)
        .await?;
    db::sanctions::Entity::delete_many()
        .filter(
            Condition::all()
                .add(db::sanctions::Column::MatchId.eq(match_id))
                .add(db::sanctions::Column::TeamId.eq(team_id)),
        )
        .exec(txn)
        .await?;
    db::substitutions::Entity::delete_many()
        .filter(
            Condition::all()
                .add(db::substitutions::Column::MatchId.eq(match_id))
                .add(db::substitutions::Column::TeamId.eq(team_id)),
        )
        .exec(txn)
        .await?;
    if !entries.is_empty() {
        let rows = entries.into_iter().map(|e| db::match_players::ActiveModel {
            match_id: Set(match_id),
            player_id: Set(e.player_id),
            team_id: Set(team_id),
            is_starting: Set(e.is_starting),
        });
        db::match_players::Entity::insert_many(rows).exec(txn).await?;
    }
    Ok(m.tournament_id)
}

/// Roster entries of a match, starters first.
pub async fn of_match<C: ConnectionTrait>(
    db_conn: &C,
    match_id: i64,
) -> Result<Vec<db::match_players::Model>> {
    Ok(db::match_players::Entity::find()
        .filter(db::match_players::Column::MatchId.eq(match_id))
        .order_by_desc(db::match_players::Column::IsStarting)
        .order_by_asc(db::match_players::Column::PlayerId)
        .all(db_conn)
        .await?)
}
