use sea_orm::prelude::TimeDateTimeWithTimeZone;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set};
use sea_orm_migration::MigratorTrait;

use liga_db as db;

pub async fn setup() -> (tempdir::TempDir, DatabaseConnection) {
    let dir = tempdir::TempDir::new("liga-test").expect("Failed to create test dir");
    let db_url = format!(
        "sqlite://{}/db.sqlite?mode=rwc",
        dir.path().to_str().unwrap()
    );
    let conn = sea_orm::Database::connect(&db_url)
        .await
        .expect("Failed to connect to the database");
    migration::Migrator::up(&conn, None)
        .await
        .expect("Applying initial DB migrations failed");
    (dir, conn)
}

pub fn now() -> TimeDateTimeWithTimeZone {
    TimeDateTimeWithTimeZone::now_utc()
}

pub async fn seed_user(conn: &DatabaseConnection, name: &str, role: db::users::Role) -> i64 {
    db::users::Entity::insert(db::users::ActiveModel {
        name: Set(name.to_owned()),
        email: Set(format!("{}@liga.test", name.to_lowercase())),
        role: Set(role),
        ..Default::default()
    })
    .exec(conn)
    .await
    .expect("Failed to insert user")
    .last_insert_id
}

pub async fn seed_tournament(conn: &DatabaseConnection, name: &str) -> i64 {
    db::tournaments::Entity::insert(db::tournaments::ActiveModel {
        name: Set(name.to_owned()),
        description: Set(String::new()),
        creation_time: Set(now()),
        ..Default::default()
    })
    .exec(conn)
    .await
    .expect("Failed to insert tournament")
    .last_insert_id
}

pub async fn seed_team(conn: &DatabaseConnection, name: &str) -> i64 {
    db::teams::Entity::insert(db::teams::ActiveModel {
        name: Set(name.to_owned()),
        creation_time: Set(now()),
        ..Default::default()
    })
    .exec(conn)
    .await
    .expect("Failed to insert team")
    .last_insert_id
}

pub async fn seed_player(
    conn: &DatabaseConnection,
    team_id: i64,
    first_name: &str,
    last_name: &str,
) -> i64 {
    db::players::Entity::insert(db::players::ActiveModel {
        team_id: Set(team_id),
        first_name: Set(first_name.to_owned()),
        last_name: Set(last_name.to_owned()),
        identity_document: Set(format!("{first_name}-{last_name}-{team_id}")),
        jersey_number: Set(None),
        creation_time: Set(now()),
        ..Default::default()
    })
    .exec(conn)
    .await
    .expect("Failed to insert player")
    .last_insert_id
}

pub async fn seed_field(conn: &DatabaseConnection, name: &str) -> i64 {
    db::fields::Entity::insert(db::fields::ActiveModel {
        name: Set(name.to_owned()),
        ..Default::default()
    })
    .exec(conn)
    .await
    .expect("Failed to insert field")
    .last_insert_id
}

pub async fn seed_match(
    conn: &DatabaseConnection,
    tournament_id: i64,
    local_team_id: i64,
    away_team_id: i64,
    scheduled_time: TimeDateTimeWithTimeZone,
) -> i64 {
    db::matches::Entity::insert(db::matches::ActiveModel {
        tournament_id: Set(tournament_id),
        local_team_id: Set(local_team_id),
        away_team_id: Set(away_team_id),
        scheduled_time: Set(scheduled_time),
        stage: Set("regular".to_owned()),
        category: Set(String::new()),
        status: Set(db::matches::Status::Scheduled),
        local_score: Set(0),
        away_score: Set(0),
        creation_time: Set(now()),
        ..Default::default()
    })
    .exec(conn)
    .await
    .expect("Failed to insert match")
    .last_insert_id
}

pub struct Fixture {
    pub tournament_id: i64,
    pub local_team_id: i64,
    pub away_team_id: i64,
    pub match_id: i64,
    pub vocal_id: i64,
}

/// A tournament with two registered teams, one scheduled match and a vocal
/// user.
pub async fn league_fixture(conn: &DatabaseConnection) -> Fixture {
    let tournament_id = seed_tournament(conn, "Clausura").await;
    let local_team_id = seed_team(conn, "Atletico Norte").await;
    let away_team_id = seed_team(conn, "Deportivo Sur").await;
    liga_server::standings::register_team(conn, tournament_id, local_team_id)
        .await
        .expect("Failed to register local team");
    liga_server::standings::register_team(conn, tournament_id, away_team_id)
        .await
        .expect("Failed to register away team");
    let match_id = seed_match(conn, tournament_id, local_team_id, away_team_id, now()).await;
    let vocal_id = seed_user(conn, "vocal1", db::users::Role::Vocal).await;
    Fixture {
        tournament_id,
        local_team_id,
        away_team_id,
        match_id,
        vocal_id,
    }
}

pub async fn standings_row(
    conn: &DatabaseConnection,
    tournament_id: i64,
    team_id: i64,
) -> db::tournament_teams::Model {
    db::tournament_teams::Entity::find()
        .filter(
            Condition::all()
                .add(db::tournament_teams::Column::TournamentId.eq(tournament_id))
                .add(db::tournament_teams::Column::TeamId.eq(team_id)),
        )
        .one(conn)
        .await
        .expect("Failed to fetch standings row")
        .expect("Standings row does not exist")
}

pub async fn match_row(conn: &DatabaseConnection, match_id: i64) -> db::matches::Model {
    db::matches::Entity::find_by_id(match_id)
        .one(conn)
        .await
        .expect("Failed to fetch match")
        .expect("Match does not exist")
}
