use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use serde::{Deserialize, Serialize};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::Result;
use liga_db as db;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub cache_ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300,
            max_entries: 256,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentStats {
    pub tournament_id: i64,
    pub matches_played: u64,
    pub goals: u64,
    pub yellow_cards: u64,
    pub red_cards: u64,
    pub top_scorers: Vec<ScorerRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorerRow {
    pub player_id: i64,
    pub player_name: String,
    pub team_id: i64,
    pub goals: u64,
}

struct Entry {
    created_at: Instant,
    stats: TournamentStats,
}

/// In-process aggregate cache keyed by tournament id. A read inside the TTL
/// window may be stale; every write that affects the aggregates calls
/// `invalidate`.
#[derive(Clone)]
pub struct Cache {
    ttl: Duration,
    max_entries: usize,
    entries: Arc<Mutex<HashMap<i64, Entry>>>,
}

impl Cache {
    pub fn new(config: &Config) -> Self {
        Self {
            ttl: Duration::from_secs(config.cache_ttl_secs),
            max_entries: config.max_entries.max(1),
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn get(&self, tournament_id: i64) -> Option<TournamentStats> {
        let mut entries = self.entries.lock().ok()?;
        entries.retain(|_, e| e.created_at.elapsed() <= self.ttl);
        entries.get(&tournament_id).map(|e| e.stats.clone())
    }

    pub fn insert(&self, tournament_id: i64, stats: TournamentStats) {
        let Ok(mut entries) = self.entries.lock() else {
            log::error!("Stats cache mutex is poisoned, dropping insert");
            return;
        };
        entries.retain(|_, e| e.created_at.elapsed() <= self.ttl);
        if entries.len() >= self.max_entries {
            if let Some(victim) = entries
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| *k)
            {
                entries.remove(&victim);
            }
        }
        entries.insert(
            tournament_id,
            Entry {
                created_at: Instant::now(),
                stats,
            },
        );
    }

    /// Best-effort; a failure here only extends the stale window.
    pub fn invalidate(&self, tournament_id: i64) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.remove(&tournament_id);
            }
            Err(e) => {
                log::error!("Failed to invalidate stats for tournament {tournament_id}: {e}");
            }
        }
    }
}

pub async fn tournament_stats<C: ConnectionTrait>(
    db_conn: &C,
    cache: &Cache,
    tournament_id: i64,
) -> Result<TournamentStats> {
    if let Some(stats) = cache.get(tournament_id) {
        return Ok(stats);
    }
    let stats = compute(db_conn, tournament_id).await?;
    cache.insert(tournament_id, stats.clone());
    Ok(stats)
}

async fn compute<C: ConnectionTrait>(db_conn: &C, tournament_id: i64) -> Result<TournamentStats> {
    let matches_played = db::matches::Entity::find()
        .filter(
            Condition::all()
                .add(db::matches::Column::TournamentId.eq(tournament_id))
                .add(db::matches::Column::Status.eq(db::matches::Status::Finished)),
        )
        .count(db_conn)
        .await?;
    let goals = db::goals::Entity::find()
        .join(JoinType::InnerJoin, db::goals::Relation::Matches.def())
        .filter(db::matches::Column::TournamentId.eq(tournament_id))
        .count(db_conn)
        .await?;
    let yellow_cards = count_sanctions(
        db_conn,
        tournament_id,
        [
            db::sanctions::Kind::Yellow,
            db::sanctions::Kind::SecondYellow,
        ],
    )
    .await?;
    // A second yellow sends the player off, so it counts on both sides.
    let red_cards = count_sanctions(
        db_conn,
        tournament_id,
        [db::sanctions::Kind::Red, db::sanctions::Kind::SecondYellow],
    )
    .await?;
    let top_scorers = top_scorers(db_conn, tournament_id).await?;
    Ok(TournamentStats {
        tournament_id,
        matches_played,
        goals,
        yellow_cards,
        red_cards,
        top_scorers,
    })
}

async fn count_sanctions<C: ConnectionTrait>(
    db_conn: &C,
    tournament_id: i64,
    kinds: [db::sanctions::Kind; 2],
) -> Result<u64> {
    Ok(db::sanctions::Entity::find()
        .join(JoinType::InnerJoin, db::sanctions::Relation::Matches.def())
        .filter(db::matches::Column::TournamentId.eq(tournament_id))
        .filter(db::sanctions::Column::Kind.is_in(kinds))
        .count(db_conn)
        .await?)
}

const TOP_SCORERS: u64 = 5;

async fn top_scorers<C: ConnectionTrait>(
    db_conn: &C,
    tournament_id: i64,
) -> Result<Vec<ScorerRow>> {
    let per_player: Vec<(i64, i64)> = db::goals::Entity::find()
        .join(JoinType::InnerJoin, db::goals::Relation::Matches.def())
        .filter(db::matches::Column::TournamentId.eq(tournament_id))
        .filter(db::goals::Column::OwnGoal.eq(false))
        .select_only()
        .column(db::goals::Column::PlayerId)
        .column_as(db::goals::Column::Id.count(), "scored")
        .group_by(db::goals::Column::PlayerId)
        .order_by_desc(sea_query::Expr::cust("scored"))
        .limit(TOP_SCORERS)
        .into_tuple()
        .all(db_conn)
        .await?;
    let players = db::players::Entity::find()
        .filter(db::players::Column::Id.is_in(per_player.iter().map(|(id, _)| *id)))
        .all(db_conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect::<HashMap<_, _>>();
    Ok(per_player
        .into_iter()
        .map(|(player_id, scored)| {
            let (player_name, team_id) = players.get(&player_id).map_or_else(
                || ("unknown".to_owned(), 0),
                |p| (format!("{} {}", p.first_name, p.last_name), p.team_id),
            );
            ScorerRow {
                player_id,
                player_name,
                team_id,
                goals: scored.max(0) as u64,
            }
        })
        .collect())
}
