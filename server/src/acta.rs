use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use std::collections::HashMap;

use crate::engine::VocaliaData;
use crate::error::{Error, Result};
use liga_db as db;

/// The consolidated post-match report. Strictly a read model: assembling it
/// never writes anything.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Acta {
    pub match_id: i64,
    pub tournament: String,
    pub stage: String,
    pub category: String,
    pub scheduled_time: String,
    pub venue: Option<String>,
    pub local_team: TeamSection,
    pub away_team: TeamSection,
    pub vocal: Official,
    pub goals: Vec<GoalRow>,
    pub sanctions: Vec<SanctionRow>,
    pub substitutions: Vec<SubstitutionRow>,
    pub arbitrator_name: Option<String>,
    pub total_local_team: Option<f64>,
    pub total_away_team: Option<f64>,
    pub signatures: HashMap<String, String>,
    pub observations: String,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSection {
    pub team_id: i64,
    pub name: String,
    pub score: i32,
    pub captain_id: Option<i64>,
    pub roster: Vec<RosterRow>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterRow {
    pub player_id: i64,
    pub name: String,
    pub jersey_number: Option<i32>,
    pub is_starting: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Official {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRow {
    pub minute: i32,
    pub team_id: i64,
    pub player_id: i64,
    pub player_name: String,
    pub own_goal: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanctionRow {
    pub minute: i32,
    pub team_id: i64,
    pub player_id: i64,
    pub player_name: String,
    pub kind: db::sanctions::Kind,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionRow {
    pub minute: i32,
    pub team_id: i64,
    pub player_in_id: i64,
    pub player_in_name: String,
    pub player_out_id: i64,
    pub player_out_name: String,
}

/// Builds the acta of a finished match. Requires the match to exist, be
/// finished and have an officiating record; the three conditions fail with
/// distinct messages but are all "cannot produce the acta yet" to a caller.
pub async fn by_match<C: ConnectionTrait>(
    db_conn: &C,
    match_id: i64,
    utc_offset_hours: i8,
) -> Result<Acta> {
    crate::validation::validate_entity_id(match_id).map_err(Error::Validation)?;
    let Some(m) = db::matches::Entity::find_by_id(match_id).one(db_conn).await? else {
        return Err(Error::NotFound(format!("no match with id {match_id}")));
    };
    if m.status != db::matches::Status::Finished {
        return Err(Error::NotFound(format!(
            "match {match_id} is not finished yet"
        )));
    }
    let Some(vocalia) = db::vocalias::Entity::find()
        .filter(db::vocalias::Column::MatchId.eq(match_id))
        .one(db_conn)
        .await?
    else {
        return Err(Error::NotFound(format!(
            "no officiating record for match {match_id}"
        )));
    };

    let tournament = db::tournaments::Entity::find_by_id(m.tournament_id)
        .one(db_conn)
        .await?
        .map(|t| t.name)
        .unwrap_or_default();
    let venue = match m.field_id {
        None => None,
        Some(field_id) => db::fields::Entity::find_by_id(field_id)
            .one(db_conn)
            .await?
            .map(|f| f.name),
    };
    let vocal = db::users::Entity::find_by_id(vocalia.vocal_id)
        .one(db_conn)
        .await?
        .map(|u| Official {
            id: u.id,
            name: u.name,
            email: u.email,
        })
        .unwrap_or(Official {
            id: vocalia.vocal_id,
            name: String::new(),
            email: String::new(),
        });
    let team_names = db::teams::Entity::find()
        .filter(db::teams::Column::Id.is_in([m.local_team_id, m.away_team_id]))
        .all(db_conn)
        .await?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect::<HashMap<_, _>>();

    let roster = crate::roster::of_match(db_conn, match_id).await?;
    let goals = db::goals::Entity::find()
        .filter(db::goals::Column::MatchId.eq(match_id))
        .order_by_asc(db::goals::Column::Minute)
        .all(db_conn)
        .await?;
    let sanctions = db::sanctions::Entity::find()
        .filter(db::sanctions::Column::MatchId.eq(match_id))
        .order_by_asc(db::sanctions::Column::Minute)
        .all(db_conn)
        .await?;
    let substitutions = db::substitutions::Entity::find()
        .filter(db::substitutions::Column::MatchId.eq(match_id))
        .order_by_asc(db::substitutions::Column::Minute)
        .all(db_conn)
        .await?;

    let mut player_ids = roster.iter().map(|r| r.player_id).collect::<Vec<_>>();
    player_ids.extend(goals.iter().map(|g| g.player_id));
    player_ids.extend(sanctions.iter().map(|s| s.player_id));
    player_ids.extend(
        substitutions
            .iter()
            .flat_map(|s| [s.player_in_id, s.player_out_id]),
    );
    let players = db::players::Entity::find()
        .filter(db::players::Column::Id.is_in(player_ids))
        .all(db_conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect::<HashMap<_, _>>();
    let player_name = |id: i64| {
        players
            .get(&id)
            .map(|p| format!("{} {}", p.first_name, p.last_name))
            .unwrap_or_default()
    };

    let team_section = |team_id: i64, score: i32, captain_id: Option<i64>| TeamSection {
        team_id,
        name: team_names.get(&team_id).cloned().unwrap_or_default(),
        score,
        captain_id,
        roster: roster
            .iter()
            .filter(|r| r.team_id == team_id)
            .map(|r| RosterRow {
                player_id: r.player_id,
                name: player_name(r.player_id),
                jersey_number: players.get(&r.player_id).and_then(|p| p.jersey_number),
                is_starting: r.is_starting,
            })
            .collect(),
    };

    let data = VocaliaData::from_stored(vocalia.data.as_deref());
    Ok(Acta {
        match_id: m.id,
        tournament,
        stage: m.stage.clone(),
        category: m.category.clone(),
        scheduled_time: format_local(m.scheduled_time, utc_offset_hours)?,
        venue,
        local_team: team_section(m.local_team_id, m.local_score, vocalia.local_captain_id),
        away_team: team_section(m.away_team_id, m.away_score, vocalia.away_captain_id),
        vocal,
        goals: goals
            .into_iter()
            .map(|g| GoalRow {
                minute: g.minute,
                team_id: g.team_id,
                player_id: g.player_id,
                player_name: player_name(g.player_id),
                own_goal: g.own_goal,
            })
            .collect(),
        sanctions: sanctions
            .into_iter()
            .map(|s| SanctionRow {
                minute: s.minute,
                team_id: s.team_id,
                player_id: s.player_id,
                player_name: player_name(s.player_id),
                kind: s.kind,
            })
            .collect(),
        substitutions: substitutions
            .into_iter()
            .map(|s| SubstitutionRow {
                minute: s.minute,
                team_id: s.team_id,
                player_in_id: s.player_in_id,
                player_in_name: player_name(s.player_in_id),
                player_out_id: s.player_out_id,
                player_out_name: player_name(s.player_out_id),
            })
            .collect(),
        arbitrator_name: data.arbitrator_name,
        total_local_team: data.total_local_team,
        total_away_team: data.total_away_team,
        signatures: data.signatures,
        observations: vocalia.observations.unwrap_or_default(),
        created_at: format_local(vocalia.creation_time, utc_offset_hours)?,
    })
}

/// Stored timestamps are UTC; the acta is read by humans on the league's
/// wall clock.
fn format_local(t: time::OffsetDateTime, utc_offset_hours: i8) -> Result<String> {
    let offset = time::UtcOffset::from_hms(utc_offset_hours, 0, 0)
        .map_err(|e| Error::Validation(format!("invalid league UTC offset: {e}")))?;
    let format = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    t.to_offset(offset)
        .format(&format)
        .map_err(|e| Error::Validation(format!("failed to format timestamp: {e}")))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn local_rendering_applies_the_offset() {
        let t = time::macros::datetime!(2025-07-06 20:30:00 UTC);
        assert_eq!(format_local(t, -5).unwrap(), "2025-07-06 15:30:00");
        assert_eq!(format_local(t, 0).unwrap(), "2025-07-06 20:30:00");
        assert_eq!(format_local(t, 2).unwrap(), "2025-07-06 22:30:00");
    }
}
