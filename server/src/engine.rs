use sea_orm::prelude::TimeDateTimeWithTimeZone;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use sea_query::Expr;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::stats;
use liga_db as db;

/// Who is asking. Admins skip the per-record ownership checks; a vocal may
/// only touch the record of a match assigned to them.
#[derive(Clone, Copy, Debug)]
pub enum Requester {
    Admin,
    Vocal(i64),
}

/// The free-form administrative blob of an officiating record. Known keys
/// are typed; anything else is kept as a scalar for forward compatibility.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocaliaData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arbitrator_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_local_team: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_away_team: Option<f64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub signatures: HashMap<String, String>,
    #[serde(flatten)]
    pub extra: HashMap<String, ScalarValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl VocaliaData {
    /// Reads a stored blob back; a malformed one is logged and treated as
    /// empty rather than poisoning the whole record.
    pub fn from_stored(raw: Option<&str>) -> VocaliaData {
        let Some(raw) = raw else {
            return VocaliaData::default();
        };
        serde_json::from_str(raw).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed stored vocalia data: {e}");
            VocaliaData::default()
        })
    }

    pub fn to_stored(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::Validation(format!("unserializable vocalia data: {e}")))
    }

    pub fn is_empty(&self) -> bool {
        *self == VocaliaData::default()
    }

    /// Field-wise overwrite; keys absent from `incoming` are untouched.
    pub fn merge(&mut self, incoming: VocaliaData) {
        if incoming.arbitrator_name.is_some() {
            self.arbitrator_name = incoming.arbitrator_name;
        }
        if incoming.total_local_team.is_some() {
            self.total_local_team = incoming.total_local_team;
        }
        if incoming.total_away_team.is_some() {
            self.total_away_team = incoming.total_away_team;
        }
        self.signatures.extend(incoming.signatures);
        self.extra.extend(incoming.extra);
    }
}

/// Wire shape of an officiating record.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VocaliaRecord {
    pub id: i64,
    pub match_id: i64,
    pub vocal_id: i64,
    pub local_captain_id: Option<i64>,
    pub away_captain_id: Option<i64>,
    pub observations: String,
    pub vocalia_data: VocaliaData,
    pub creation_time: TimeDateTimeWithTimeZone,
}

impl From<db::vocalias::Model> for VocaliaRecord {
    fn from(m: db::vocalias::Model) -> Self {
        let vocalia_data = VocaliaData::from_stored(m.data.as_deref());
        Self {
            id: m.id,
            match_id: m.match_id,
            vocal_id: m.vocal_id,
            local_captain_id: m.local_captain_id,
            away_captain_id: m.away_captain_id,
            observations: m.observations.unwrap_or_default(),
            vocalia_data,
            creation_time: m.creation_time,
        }
    }
}

/// Officiating record in its match context; `is_virtual` marks the
/// synthesized view served when no record exists yet.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VocaliaView {
    #[serde(flatten)]
    pub record: VocaliaRecord,
    pub tournament_id: i64,
    pub tournament_name: String,
    pub local_team: String,
    pub away_team: String,
    pub field_name: Option<String>,
    pub is_virtual: bool,
}

pub async fn create<C: ConnectionTrait>(
    db_conn: &C,
    match_id: i64,
    vocal_id: i64,
) -> Result<db::vocalias::Model> {
    crate::validation::validate_entity_id(match_id).map_err(Error::Validation)?;
    crate::validation::validate_entity_id(vocal_id).map_err(Error::Validation)?;
    if db::matches::Entity::find_by_id(match_id)
        .one(db_conn)
        .await?
        .is_none()
    {
        return Err(Error::NotFound(format!("no match with id {match_id}")));
    }
    if db::users::Entity::find_by_id(vocal_id)
        .one(db_conn)
        .await?
        .is_none()
    {
        return Err(Error::NotFound(format!("no user with id {vocal_id}")));
    }
    let existing = db::vocalias::Entity::find()
        .filter(db::vocalias::Column::MatchId.eq(match_id))
        .one(db_conn)
        .await?;
    if existing.is_some() {
        return Err(Error::Conflict(format!(
            "match {match_id} already has an assigned vocal"
        )));
    }
    let record = db::vocalias::ActiveModel {
        match_id: Set(match_id),
        vocal_id: Set(vocal_id),
        creation_time: Set(TimeDateTimeWithTimeZone::now_utc()),
        ..Default::default()
    };
    let id = db::vocalias::Entity::insert(record)
        .exec(db_conn)
        .await?
        .last_insert_id;
    db::vocalias::Entity::find_by_id(id)
        .one(db_conn)
        .await?
        .ok_or_else(|| Error::Integrity(format!("vocalia {id} vanished right after insert")))
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocaliaUpdate {
    pub local_captain_id: Option<i64>,
    pub away_captain_id: Option<i64>,
    pub observations: Option<String>,
    pub vocalia_data: Option<VocaliaData>,
}

/// Partial update of the officiating record; omitted fields stay as they
/// are. A vocal can only reach the record of their own match, and gets a
/// permission error rather than not-found when the pair does not match.
pub async fn update<C: ConnectionTrait>(
    db_conn: &C,
    match_id: i64,
    requester: Requester,
    update: VocaliaUpdate,
) -> Result<db::vocalias::Model> {
    let existing = match requester {
        Requester::Admin => db::vocalias::Entity::find()
            .filter(db::vocalias::Column::MatchId.eq(match_id))
            .one(db_conn)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("no officiating record for match {match_id}"))
            })?,
        Requester::Vocal(vocal_id) => db::vocalias::Entity::find()
            .filter(
                Condition::all()
                    .add(db::vocalias::Column::MatchId.eq(match_id))
                    .add(db::vocalias::Column::VocalId.eq(vocal_id)),
            )
            .one(db_conn)
            .await?
            .ok_or_else(|| {
                Error::Permission(format!(
                    "officiating record of match {match_id} is not assigned to this vocal"
                ))
            })?,
    };
    let mut writeback = db::vocalias::ActiveModel {
        id: Set(existing.id),
        ..Default::default()
    };
    if let Some(local_captain_id) = update.local_captain_id {
        writeback.local_captain_id = Set(Some(local_captain_id));
    }
    if let Some(away_captain_id) = update.away_captain_id {
        writeback.away_captain_id = Set(Some(away_captain_id));
    }
    if let Some(observations) = update.observations {
        writeback.observations = Set(Some(observations));
    }
    if let Some(incoming) = update.vocalia_data {
        let mut data = VocaliaData::from_stored(existing.data.as_deref());
        data.merge(incoming);
        writeback.data = Set(Some(data.to_stored()?));
    }
    Ok(db::vocalias::Entity::update(writeback).exec(db_conn).await?)
}

/// Fetches the officiating record of a match together with its context.
/// When none exists an admin gets a synthesized virtual view (never
/// persisted); everyone else gets not-found.
pub async fn get_by_match<C: ConnectionTrait>(
    db_conn: &C,
    match_id: i64,
    requester: Requester,
) -> Result<VocaliaView> {
    crate::validation::validate_entity_id(match_id).map_err(Error::Validation)?;
    let Some(m) = db::matches::Entity::find_by_id(match_id).one(db_conn).await? else {
        return Err(Error::NotFound(format!("no match with id {match_id}")));
    };
    let context = match_context(db_conn, &m).await?;
    let existing = db::vocalias::Entity::find()
        .filter(db::vocalias::Column::MatchId.eq(match_id))
        .one(db_conn)
        .await?;
    let (record, is_virtual) = match existing {
        Some(v) => (VocaliaRecord::from(v), false),
        None => {
            if !matches!(requester, Requester::Admin) {
                return Err(Error::NotFound(format!(
                    "no officiating record for match {match_id}"
                )));
            }
            let virtual_record = VocaliaRecord {
                id: 0,
                match_id,
                vocal_id: 0,
                local_captain_id: None,
                away_captain_id: None,
                observations: String::new(),
                vocalia_data: VocaliaData::default(),
                creation_time: m.creation_time,
            };
            (virtual_record, true)
        }
    };
    Ok(VocaliaView {
        record,
        tournament_id: m.tournament_id,
        tournament_name: context.tournament_name,
        local_team: context.local_team,
        away_team: context.away_team,
        field_name: context.field_name,
        is_virtual,
    })
}

struct MatchContext {
    tournament_name: String,
    local_team: String,
    away_team: String,
    field_name: Option<String>,
}

async fn match_context<C: ConnectionTrait>(
    db_conn: &C,
    m: &db::matches::Model,
) -> Result<MatchContext> {
    let tournament_name = db::tournaments::Entity::find_by_id(m.tournament_id)
        .one(db_conn)
        .await?
        .map(|t| t.name)
        .unwrap_or_default();
    let teams = db::teams::Entity::find()
        .filter(db::teams::Column::Id.is_in([m.local_team_id, m.away_team_id]))
        .all(db_conn)
        .await?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect::<HashMap<_, _>>();
    let field_name = match m.field_id {
        None => None,
        Some(field_id) => db::fields::Entity::find_by_id(field_id)
            .one(db_conn)
            .await?
            .map(|f| f.name),
    };
    Ok(MatchContext {
        tournament_name,
        local_team: teams.get(&m.local_team_id).cloned().unwrap_or_default(),
        away_team: teams.get(&m.away_team_id).cloned().unwrap_or_default(),
        field_name,
    })
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    pub local_score: i32,
    pub away_score: i32,
    #[serde(default)]
    pub vocalia_data: Option<VocaliaData>,
    #[serde(default)]
    pub arbitrator_name: Option<String>,
    #[serde(default)]
    pub signatures: HashMap<String, String>,
}

impl FinalizeRequest {
    /// Folds the top-level convenience fields into the blob.
    fn officiating_data(&self) -> Option<VocaliaData> {
        let mut data = self.vocalia_data.clone().unwrap_or_default();
        if self.arbitrator_name.is_some() {
            data.arbitrator_name = self.arbitrator_name.clone();
        }
        data.signatures
            .extend(self.signatures.iter().map(|(k, v)| (k.clone(), v.clone())));
        if data.is_empty() {
            None
        } else {
            Some(data)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Score {
    pub local: i32,
    pub away: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeOutcome {
    pub match_id: i64,
    pub tournament_id: i64,
    pub status: db::matches::Status,
    pub score: Score,
}

/// Per-team standings increments of one finalized match. `played` is
/// always 1 and goal_diff follows from the goal columns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StandingsDelta {
    pub won: i32,
    pub drawn: i32,
    pub lost: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub points: i32,
}

pub fn score_deltas(local_score: i32, away_score: i32) -> (StandingsDelta, StandingsDelta) {
    let mut local = StandingsDelta {
        goals_for: local_score,
        goals_against: away_score,
        ..Default::default()
    };
    let mut away = StandingsDelta {
        goals_for: away_score,
        goals_against: local_score,
        ..Default::default()
    };
    match local_score.cmp(&away_score) {
        std::cmp::Ordering::Greater => {
            local.won = 1;
            local.points = 3;
            away.lost = 1;
        }
        std::cmp::Ordering::Less => {
            away.won = 1;
            away.points = 3;
            local.lost = 1;
        }
        std::cmp::Ordering::Equal => {
            local.drawn = 1;
            local.points = 1;
            away.drawn = 1;
            away.points = 1;
        }
    }
    (local, away)
}

/// Moves a match to `finished` exactly once: records the final score,
/// merges any supplied officiating data and increments both standings rows,
/// all inside one transaction. The stats cache is invalidated after the
/// commit; that part is best-effort.
pub async fn finalize(
    db_conn: &DatabaseConnection,
    match_id: i64,
    request: FinalizeRequest,
    cache: &stats::Cache,
) -> Result<FinalizeOutcome> {
    crate::validation::validate_scores(request.local_score, request.away_score)
        .map_err(Error::Validation)?;
    let outcome = db_conn
        .transaction(|txn| Box::pin(async move { finalize_in_txn(txn, match_id, request).await }))
        .await
        .map_err(Error::from)?;
    cache.invalidate(outcome.tournament_id);
    Ok(outcome)
}

async fn finalize_in_txn<C: ConnectionTrait>(
    txn: &C,
    match_id: i64,
    request: FinalizeRequest,
) -> Result<FinalizeOutcome> {
    // The status check happens here, inside the transaction, so a
    // concurrent finalize of the same match cannot apply the deltas twice.
    let Some(m) = db::matches::Entity::find_by_id(match_id).one(txn).await? else {
        return Err(Error::NotFound(format!("no match with id {match_id}")));
    };
    if m.status == db::matches::Status::Finished {
        return Err(Error::Conflict(format!(
            "match {match_id} is already finalized"
        )));
    }
    if let Some(data) = request.officiating_data() {
        merge_officiating_data(txn, match_id, data).await?;
    }
    let standings = standings_pair(txn, &m).await?;
    let writeback = db::matches::ActiveModel {
        id: Set(m.id),
        local_score: Set(request.local_score),
        away_score: Set(request.away_score),
        status: Set(db::matches::Status::Finished),
        ..Default::default()
    };
    db::matches::Entity::update(writeback).exec(txn).await?;
    let (local_delta, away_delta) = score_deltas(request.local_score, request.away_score);
    apply_standings_delta(txn, standings.local.id, &local_delta).await?;
    apply_standings_delta(txn, standings.away.id, &away_delta).await?;
    Ok(FinalizeOutcome {
        match_id: m.id,
        tournament_id: m.tournament_id,
        status: db::matches::Status::Finished,
        score: Score {
            local: request.local_score,
            away: request.away_score,
        },
    })
}

/// A match can be finalized without an officiating record; when one exists
/// the supplied data merges onto it.
async fn merge_officiating_data<C: ConnectionTrait>(
    txn: &C,
    match_id: i64,
    incoming: VocaliaData,
) -> Result<()> {
    let Some(existing) = db::vocalias::Entity::find()
        .filter(db::vocalias::Column::MatchId.eq(match_id))
        .one(txn)
        .await?
    else {
        log::info!("Match {match_id} has no officiating record, skipping data merge");
        return Ok(());
    };
    let mut data = VocaliaData::from_stored(existing.data.as_deref());
    data.merge(incoming);
    let writeback = db::vocalias::ActiveModel {
        id: Set(existing.id),
        data: Set(Some(data.to_stored()?)),
        ..Default::default()
    };
    db::vocalias::Entity::update(writeback).exec(txn).await?;
    Ok(())
}

struct StandingsPair {
    local: db::tournament_teams::Model,
    away: db::tournament_teams::Model,
}

async fn standings_pair<C: ConnectionTrait>(
    txn: &C,
    m: &db::matches::Model,
) -> Result<StandingsPair> {
    let rows = db::tournament_teams::Entity::find()
        .filter(
            Condition::all()
                .add(db::tournament_teams::Column::TournamentId.eq(m.tournament_id))
                .add(
                    db::tournament_teams::Column::TeamId
                        .is_in([m.local_team_id, m.away_team_id]),
                ),
        )
        .all(txn)
        .await?;
    let mut by_team = rows
        .into_iter()
        .map(|r| (r.team_id, r))
        .collect::<HashMap<i64, _>>();
    let (Some(local), Some(away)) = (
        by_team.remove(&m.local_team_id),
        by_team.remove(&m.away_team_id),
    ) else {
        return Err(Error::Integrity(format!(
            "teams of match {} are not registered in tournament {}",
            m.id, m.tournament_id
        )));
    };
    Ok(StandingsPair { local, away })
}

/// Increments, not overwrites: concurrent finalizations of different
/// matches sharing a team must not lose each other's updates.
async fn apply_standings_delta<C: ConnectionTrait>(
    txn: &C,
    row_id: i64,
    delta: &StandingsDelta,
) -> Result<()> {
    use db::tournament_teams::Column;
    let result = db::tournament_teams::Entity::update_many()
        .col_expr(Column::Played, Expr::col(Column::Played).add(1))
        .col_expr(Column::Won, Expr::col(Column::Won).add(delta.won))
        .col_expr(Column::Drawn, Expr::col(Column::Drawn).add(delta.drawn))
        .col_expr(Column::Lost, Expr::col(Column::Lost).add(delta.lost))
        .col_expr(
            Column::GoalsFor,
            Expr::col(Column::GoalsFor).add(delta.goals_for),
        )
        .col_expr(
            Column::GoalsAgainst,
            Expr::col(Column::GoalsAgainst).add(delta.goals_against),
        )
        .col_expr(
            Column::GoalDiff,
            Expr::col(Column::GoalDiff).add(delta.goals_for - delta.goals_against),
        )
        .col_expr(Column::Points, Expr::col(Column::Points).add(delta.points))
        .col_expr(
            Column::UpdateTime,
            Expr::value(TimeDateTimeWithTimeZone::now_utc()),
        )
        .filter(Column::Id.eq(row_id))
        .exec(txn)
        .await?;
    if result.rows_affected != 1 {
        return Err(Error::Integrity(format!(
            "standings row {row_id} vanished during finalize"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deltas_local_win() {
        let (local, away) = score_deltas(3, 1);
        assert_eq!(
            local,
            StandingsDelta {
                won: 1,
                points: 3,
                goals_for: 3,
                goals_against: 1,
                ..Default::default()
            }
        );
        assert_eq!(
            away,
            StandingsDelta {
                lost: 1,
                goals_for: 1,
                goals_against: 3,
                ..Default::default()
            }
        );
    }

    #[test]
    fn deltas_away_win() {
        let (local, away) = score_deltas(0, 2);
        assert_eq!(local.lost, 1);
        assert_eq!(local.points, 0);
        assert_eq!(away.won, 1);
        assert_eq!(away.points, 3);
    }

    #[test]
    fn deltas_draw() {
        let (local, away) = score_deltas(2, 2);
        for d in [local, away] {
            assert_eq!(d.drawn, 1);
            assert_eq!(d.won, 0);
            assert_eq!(d.lost, 0);
            assert_eq!(d.points, 1);
        }
    }

    #[test]
    fn deltas_goal_diff_sums_to_zero() {
        for (l, a) in [(0, 0), (4, 1), (2, 5), (10, 10)] {
            let (local, away) = score_deltas(l, a);
            let local_diff = local.goals_for - local.goals_against;
            let away_diff = away.goals_for - away.goals_against;
            assert_eq!(local_diff, l - a);
            assert_eq!(away_diff, a - l);
            assert_eq!(local_diff + away_diff, 0);
        }
    }

    #[test]
    fn data_merge_keeps_omitted_fields() {
        let mut stored = VocaliaData {
            arbitrator_name: Some("J. Paredes".to_owned()),
            total_local_team: Some(25.0),
            ..Default::default()
        };
        stored.merge(VocaliaData {
            total_away_team: Some(30.0),
            ..Default::default()
        });
        assert_eq!(stored.arbitrator_name.as_deref(), Some("J. Paredes"));
        assert_eq!(stored.total_local_team, Some(25.0));
        assert_eq!(stored.total_away_team, Some(30.0));
    }

    #[test]
    fn data_round_trip_with_unknown_keys() {
        let raw = r#"{"arbitratorName":"L. Mera","ballsProvided":3,"wet":true,"notes":"x"}"#;
        let data = VocaliaData::from_stored(Some(raw));
        assert_eq!(data.arbitrator_name.as_deref(), Some("L. Mera"));
        assert_eq!(data.extra.get("ballsProvided"), Some(&ScalarValue::Number(3.0)));
        assert_eq!(data.extra.get("wet"), Some(&ScalarValue::Bool(true)));
        let stored = data.to_stored().unwrap();
        assert_eq!(VocaliaData::from_stored(Some(&stored)), data);
    }

    #[test]
    fn malformed_stored_data_is_ignored() {
        assert_eq!(VocaliaData::from_stored(Some("{oops")), VocaliaData::default());
        assert_eq!(VocaliaData::from_stored(None), VocaliaData::default());
    }
}
