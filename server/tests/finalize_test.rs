mod common;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use liga_db as db;
use liga_server::engine::{self, FinalizeRequest, Requester, VocaliaData, VocaliaUpdate};
use liga_server::error::Error;
use liga_server::stats;

fn cache() -> stats::Cache {
    stats::Cache::new(&stats::Config::default())
}

fn score(local: i32, away: i32) -> FinalizeRequest {
    FinalizeRequest {
        local_score: local,
        away_score: away,
        vocalia_data: None,
        arbitrator_name: None,
        signatures: Default::default(),
    }
}

#[tokio::test]
async fn local_win_awards_three_points() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    let outcome = engine::finalize(&conn, f.match_id, score(2, 1), &cache())
        .await
        .expect("Finalize failed");
    assert_eq!(outcome.match_id, f.match_id);
    assert_eq!(outcome.tournament_id, f.tournament_id);
    assert_eq!(outcome.status, db::matches::Status::Finished);
    assert_eq!((outcome.score.local, outcome.score.away), (2, 1));

    let m = common::match_row(&conn, f.match_id).await;
    assert_eq!(m.status, db::matches::Status::Finished);
    assert_eq!((m.local_score, m.away_score), (2, 1));

    let local = common::standings_row(&conn, f.tournament_id, f.local_team_id).await;
    assert_eq!(
        (local.played, local.won, local.drawn, local.lost),
        (1, 1, 0, 0)
    );
    assert_eq!(
        (local.goals_for, local.goals_against, local.goal_diff),
        (2, 1, 1)
    );
    assert_eq!(local.points, 3);

    let away = common::standings_row(&conn, f.tournament_id, f.away_team_id).await;
    assert_eq!(
        (away.played, away.won, away.drawn, away.lost),
        (1, 0, 0, 1)
    );
    assert_eq!(
        (away.goals_for, away.goals_against, away.goal_diff),
        (1, 2, -1)
    );
    assert_eq!(away.points, 0);
}

#[tokio::test]
async fn away_win_awards_three_points_to_the_visitor() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    engine::finalize(&conn, f.match_id, score(0, 3), &cache())
        .await
        .expect("Finalize failed");
    let local = common::standings_row(&conn, f.tournament_id, f.local_team_id).await;
    let away = common::standings_row(&conn, f.tournament_id, f.away_team_id).await;
    assert_eq!((local.lost, local.points, local.goal_diff), (1, 0, -3));
    assert_eq!((away.won, away.points, away.goal_diff), (1, 3, 3));
}

#[tokio::test]
async fn draw_awards_a_point_each() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    engine::finalize(&conn, f.match_id, score(1, 1), &cache())
        .await
        .expect("Finalize failed");
    for team_id in [f.local_team_id, f.away_team_id] {
        let row = common::standings_row(&conn, f.tournament_id, team_id).await;
        assert_eq!((row.played, row.won, row.drawn, row.lost), (1, 0, 1, 0));
        assert_eq!(row.points, 1);
        assert_eq!(row.goal_diff, 0);
    }
}

#[tokio::test]
async fn second_finalize_is_rejected_and_changes_nothing() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    engine::finalize(&conn, f.match_id, score(2, 0), &cache())
        .await
        .expect("First finalize failed");
    let local_before = common::standings_row(&conn, f.tournament_id, f.local_team_id).await;
    let away_before = common::standings_row(&conn, f.tournament_id, f.away_team_id).await;

    let err = engine::finalize(&conn, f.match_id, score(5, 5), &cache())
        .await
        .expect_err("Second finalize must fail");
    assert!(matches!(err, Error::Conflict(_)), "got {err}");

    let m = common::match_row(&conn, f.match_id).await;
    assert_eq!((m.local_score, m.away_score), (2, 0));
    assert_eq!(
        common::standings_row(&conn, f.tournament_id, f.local_team_id).await,
        local_before
    );
    assert_eq!(
        common::standings_row(&conn, f.tournament_id, f.away_team_id).await,
        away_before
    );
}

#[tokio::test]
async fn negative_scores_never_touch_the_store() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    let err = engine::finalize(&conn, f.match_id, score(-1, 0), &cache())
        .await
        .expect_err("Negative score must be rejected");
    assert!(matches!(err, Error::Validation(_)), "got {err}");
    let m = common::match_row(&conn, f.match_id).await;
    assert_eq!(m.status, db::matches::Status::Scheduled);
    let local = common::standings_row(&conn, f.tournament_id, f.local_team_id).await;
    assert_eq!((local.played, local.points), (0, 0));
}

#[tokio::test]
async fn missing_match_is_not_found() {
    let (_dir, conn) = common::setup().await;
    common::league_fixture(&conn).await;
    let err = engine::finalize(&conn, 999999, score(1, 0), &cache())
        .await
        .expect_err("Finalize of a missing match must fail");
    assert!(matches!(err, Error::NotFound(_)), "got {err}");
}

#[tokio::test]
async fn unregistered_team_rolls_the_whole_transaction_back() {
    let (_dir, conn) = common::setup().await;
    let tournament_id = common::seed_tournament(&conn, "Apertura").await;
    let local_team_id = common::seed_team(&conn, "Union Central").await;
    let away_team_id = common::seed_team(&conn, "Juventud Sur").await;
    // Only the local team gets a standings row.
    liga_server::standings::register_team(&conn, tournament_id, local_team_id)
        .await
        .expect("Failed to register local team");
    let match_id = common::seed_match(
        &conn,
        tournament_id,
        local_team_id,
        away_team_id,
        common::now(),
    )
    .await;
    let vocal_id = common::seed_user(&conn, "vocal2", db::users::Role::Vocal).await;
    engine::create(&conn, match_id, vocal_id)
        .await
        .expect("Failed to assign vocal");

    // The officiating-data merge happens before the standings lookup; a
    // failed finalize must undo it as well.
    let request = FinalizeRequest {
        arbitrator_name: Some("R. Quinteros".to_owned()),
        ..score(2, 1)
    };
    let err = engine::finalize(&conn, match_id, request, &cache())
        .await
        .expect_err("Finalize must fail without standings rows");
    assert!(matches!(err, Error::Integrity(_)), "got {err}");

    let m = common::match_row(&conn, match_id).await;
    assert_eq!(m.status, db::matches::Status::Scheduled);
    assert_eq!((m.local_score, m.away_score), (0, 0));
    let local = common::standings_row(&conn, tournament_id, local_team_id).await;
    assert_eq!((local.played, local.points, local.goals_for), (0, 0, 0));
    let vocalia = db::vocalias::Entity::find()
        .filter(db::vocalias::Column::MatchId.eq(match_id))
        .one(&conn)
        .await
        .expect("Failed to fetch vocalia")
        .expect("Vocalia does not exist");
    assert_eq!(vocalia.data, None);
}

#[tokio::test]
async fn failed_away_increment_rolls_back_the_flip_and_the_local_delta() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    // Fires inside the finalize transaction: after both standings rows were
    // loaded and the match row flipped, but before the away-team increment,
    // the away row disappears and its update matches zero rows.
    conn.execute_unprepared(&format!(
        "CREATE TRIGGER drop_away_standings AFTER UPDATE OF status ON matches \
         WHEN NEW.status = 'finished' \
         BEGIN \
         DELETE FROM tournament_teams \
         WHERE tournament_id = {} AND team_id = {}; \
         END",
        f.tournament_id, f.away_team_id
    ))
    .await
    .expect("Failed to install the failure trigger");

    let err = engine::finalize(&conn, f.match_id, score(2, 1), &cache())
        .await
        .expect_err("The away increment must sink the transaction");
    assert!(matches!(err, Error::Integrity(_)), "got {err}");

    let m = common::match_row(&conn, f.match_id).await;
    assert_eq!(m.status, db::matches::Status::Scheduled);
    assert_eq!((m.local_score, m.away_score), (0, 0));
    let local = common::standings_row(&conn, f.tournament_id, f.local_team_id).await;
    assert_eq!(
        (local.played, local.won, local.points, local.goals_for),
        (0, 0, 0, 0)
    );
    // The trigger's delete rolled back together with everything else.
    let away = common::standings_row(&conn, f.tournament_id, f.away_team_id).await;
    assert_eq!((away.played, away.points), (0, 0));

    conn.execute_unprepared("DROP TRIGGER drop_away_standings")
        .await
        .expect("Failed to drop the failure trigger");
    engine::finalize(&conn, f.match_id, score(2, 1), &cache())
        .await
        .expect("Finalize must succeed once the fault is gone");
    let local = common::standings_row(&conn, f.tournament_id, f.local_team_id).await;
    assert_eq!((local.played, local.won, local.points), (1, 1, 3));
    let away = common::standings_row(&conn, f.tournament_id, f.away_team_id).await;
    assert_eq!((away.played, away.lost, away.points), (1, 1, 0));
}

#[tokio::test]
async fn finalize_works_without_an_officiating_record() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    let request = FinalizeRequest {
        arbitrator_name: Some("dropped on the floor".to_owned()),
        ..score(1, 0)
    };
    engine::finalize(&conn, f.match_id, request, &cache())
        .await
        .expect("Finalize without a vocalia must succeed");
    assert_eq!(
        common::match_row(&conn, f.match_id).await.status,
        db::matches::Status::Finished
    );
}

#[tokio::test]
async fn finalize_merges_supplied_officiating_data() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    engine::create(&conn, f.match_id, f.vocal_id)
        .await
        .expect("Failed to assign vocal");
    engine::update(
        &conn,
        f.match_id,
        Requester::Vocal(f.vocal_id),
        VocaliaUpdate {
            vocalia_data: Some(VocaliaData {
                total_local_team: Some(15.0),
                ..Default::default()
            }),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to record pre-match data");

    let request = FinalizeRequest {
        vocalia_data: Some(VocaliaData {
            total_away_team: Some(20.0),
            ..Default::default()
        }),
        arbitrator_name: Some("L. Mera".to_owned()),
        signatures: [("localCaptain".to_owned(), "base64-sig".to_owned())].into(),
        ..score(3, 3)
    };
    engine::finalize(&conn, f.match_id, request, &cache())
        .await
        .expect("Finalize failed");

    let vocalia = db::vocalias::Entity::find()
        .filter(db::vocalias::Column::MatchId.eq(f.match_id))
        .one(&conn)
        .await
        .expect("Failed to fetch vocalia")
        .expect("Vocalia does not exist");
    let data = VocaliaData::from_stored(vocalia.data.as_deref());
    assert_eq!(data.total_local_team, Some(15.0));
    assert_eq!(data.total_away_team, Some(20.0));
    assert_eq!(data.arbitrator_name.as_deref(), Some("L. Mera"));
    assert_eq!(
        data.signatures.get("localCaptain").map(String::as_str),
        Some("base64-sig")
    );
}
