mod common;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use liga_db as db;
use liga_server::engine::{self, FinalizeRequest};
use liga_server::error::Error;
use liga_server::roster::RosterEntry;
use liga_server::{crud, events, roster, scheduling, standings, stats};

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

fn entries(player_ids: &[i64]) -> Vec<RosterEntry> {
    player_ids
        .iter()
        .map(|&player_id| RosterEntry {
            player_id,
            is_starting: true,
        })
        .collect()
}

async fn team_roster(conn: &sea_orm::DatabaseConnection, match_id: i64, team_id: i64) -> Vec<i64> {
    roster::of_match(conn, match_id)
        .await
        .expect("Failed to fetch roster")
        .into_iter()
        .filter(|r| r.team_id == team_id)
        .map(|r| r.player_id)
        .collect()
}

#[tokio::test]
async fn roster_replace_is_last_write_wins() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    let p1 = common::seed_player(&conn, f.local_team_id, "Angel", "Caicedo").await;
    let p2 = common::seed_player(&conn, f.local_team_id, "Byron", "Delgado").await;
    let p3 = common::seed_player(&conn, f.local_team_id, "Carlos", "Estrada").await;
    let p4 = common::seed_player(&conn, f.local_team_id, "Dario", "Flores").await;

    let c = cache();
    roster::replace(&conn, &c, f.match_id, f.local_team_id, entries(&[p1, p2, p3]))
        .await
        .expect("First roster failed");
    assert_eq!(
        team_roster(&conn, f.match_id, f.local_team_id).await,
        vec![p1, p2, p3]
    );

    roster::replace(&conn, &c, f.match_id, f.local_team_id, entries(&[p4]))
        .await
        .expect("Second roster failed");
    assert_eq!(
        team_roster(&conn, f.match_id, f.local_team_id).await,
        vec![p4]
    );
}

#[tokio::test]
async fn roster_replace_rolls_back_on_an_unknown_player() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    let p1 = common::seed_player(&conn, f.local_team_id, "Angel", "Caicedo").await;

    let c = cache();
    roster::replace(&conn, &c, f.match_id, f.local_team_id, entries(&[p1]))
        .await
        .expect("First roster failed");
    let err = roster::replace(&conn, &c, f.match_id, f.local_team_id, entries(&[p1, 999999]))
        .await
        .expect_err("Unknown player must fail the whole write");
    assert!(matches!(err, Error::NotFound(_)), "got {err}");
    // The previous roster survived the failed replace.
    assert_eq!(
        team_roster(&conn, f.match_id, f.local_team_id).await,
        vec![p1]
    );
}

#[tokio::test]
async fn roster_rejects_duplicates_and_foreign_teams() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    let p1 = common::seed_player(&conn, f.local_team_id, "Angel", "Caicedo").await;

    let c = cache();
    let err = roster::replace(&conn, &c, f.match_id, f.local_team_id, entries(&[p1, p1]))
        .await
        .expect_err("Duplicate player must be rejected");
    assert!(matches!(err, Error::Validation(_)), "got {err}");

    let outsider = common::seed_team(&conn, "Barrio Lindo").await;
    let err = roster::replace(&conn, &c, f.match_id, outsider, entries(&[p1]))
        .await
        .expect_err("A team outside the match cannot roster");
    assert!(matches!(err, Error::Validation(_)), "got {err}");
}

#[tokio::test]
async fn bulk_goals_are_all_or_nothing() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    let p1 = common::seed_player(&conn, f.local_team_id, "Angel", "Caicedo").await;

    let goal = |player_id, minute| events::GoalInput {
        match_id: f.match_id,
        team_id: f.local_team_id,
        player_id,
        minute,
        own_goal: false,
    };
    let err = events::record_goals(&conn, &cache(), vec![goal(p1, 10), goal(999999, 20)])
        .await
        .expect_err("A bad row must fail the whole batch");
    assert!(matches!(err, Error::NotFound(_)), "got {err}");
    let recorded = db::goals::Entity::find()
        .filter(db::goals::Column::MatchId.eq(f.match_id))
        .count(&conn)
        .await
        .expect("Failed to count goals");
    assert_eq!(recorded, 0);

    let ids = events::record_goals(&conn, &cache(), vec![goal(p1, 10), goal(p1, 20)])
        .await
        .expect("A clean batch must land");
    assert_eq!(ids.len(), 2);
}

#[tokio::test]
async fn writes_invalidate_the_stats_cache() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    let p1 = common::seed_player(&conn, f.local_team_id, "Angel", "Caicedo").await;

    let c = cache();
    let before = stats::tournament_stats(&conn, &c, f.tournament_id)
        .await
        .expect("Stats failed");
    assert_eq!((before.matches_played, before.goals), (0, 0));
    assert!(c.get(f.tournament_id).is_some());

    events::record_goal(
        &conn,
        &c,
        events::GoalInput {
            match_id: f.match_id,
            team_id: f.local_team_id,
            player_id: p1,
            minute: 40,
            own_goal: false,
        },
    )
    .await
    .expect("Failed to record goal");
    assert!(c.get(f.tournament_id).is_none());

    let after_goal = stats::tournament_stats(&conn, &c, f.tournament_id)
        .await
        .expect("Stats failed");
    assert_eq!(after_goal.goals, 1);
    assert_eq!(after_goal.top_scorers.len(), 1);
    assert_eq!(after_goal.top_scorers[0].player_id, p1);

    engine::finalize(&conn, f.match_id, score(1, 0), &c)
        .await
        .expect("Finalize failed");
    assert!(c.get(f.tournament_id).is_none());
    let after_final = stats::tournament_stats(&conn, &c, f.tournament_id)
        .await
        .expect("Stats failed");
    assert_eq!(after_final.matches_played, 1);
}

#[tokio::test]
async fn standings_order_by_points_then_goal_difference() {
    let (_dir, conn) = common::setup().await;
    let tournament_id = common::seed_tournament(&conn, "Clausura").await;
    let a = common::seed_team(&conn, "Alianza").await;
    let b = common::seed_team(&conn, "Boca Chica").await;
    let c_team = common::seed_team(&conn, "Cumbaya FC").await;
    for team in [a, b, c_team] {
        standings::register_team(&conn, tournament_id, team)
            .await
            .expect("Registration failed");
    }
    let m1 = common::seed_match(&conn, tournament_id, a, b, common::now()).await;
    let m2 = common::seed_match(&conn, tournament_id, c_team, b, common::now()).await;
    let c = cache();
    engine::finalize(&conn, m1, score(3, 0), &c)
        .await
        .expect("Finalize failed");
    engine::finalize(&conn, m2, score(1, 0), &c)
        .await
        .expect("Finalize failed");

    // A and C both have 3 points; A is ahead on goal difference.
    let table = standings::standings(&conn, tournament_id)
        .await
        .expect("Standings failed");
    let order: Vec<i64> = table.iter().map(|r| r.team_id).collect();
    assert_eq!(order, vec![a, c_team, b]);
    assert_eq!(table[0].points, 3);
    assert_eq!(table[1].points, 3);
    assert_eq!(table[2].points, 0);
    assert!(table[0].goal_diff > table[1].goal_diff);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    let err = standings::register_team(&conn, f.tournament_id, f.local_team_id)
        .await
        .expect_err("Double registration must fail");
    assert!(matches!(err, Error::Conflict(_)), "got {err}");
}

#[tokio::test]
async fn match_listing_defaults_and_empty_pages() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    for _ in 0..11 {
        common::seed_match(
            &conn,
            f.tournament_id,
            f.local_team_id,
            f.away_team_id,
            common::now(),
        )
        .await;
    }

    let (items, pagination) = scheduling::list_matches(
        &conn,
        scheduling::MatchFilter::default(),
        crud::PageParams::default(),
    )
    .await
    .expect("Listing failed");
    assert_eq!(items.len(), 10);
    assert_eq!(
        pagination,
        crud::Pagination {
            total: 12,
            page: 1,
            limit: 10,
            total_pages: 2,
        }
    );

    // Non-positive page and limit fall back to the floor values.
    let (items, pagination) = scheduling::list_matches(
        &conn,
        scheduling::MatchFilter::default(),
        crud::PageParams {
            page: Some(0),
            limit: Some(0),
        },
    )
    .await
    .expect("Listing failed");
    assert_eq!(items.len(), 1);
    assert_eq!((pagination.page, pagination.limit), (1, 1));

    // An empty page is a success, not an error.
    let (items, pagination) = scheduling::list_matches(
        &conn,
        scheduling::MatchFilter {
            tournament_id: Some(999999),
            ..Default::default()
        },
        crud::PageParams::default(),
    )
    .await
    .expect("Listing failed");
    assert!(items.is_empty());
    assert_eq!(pagination.total, 0);
    assert_eq!(pagination.total_pages, 0);
}

#[tokio::test]
async fn programming_sheet_is_all_or_nothing() {
    let (_dir, conn) = common::setup().await;
    let tournament_id = common::seed_tournament(&conn, "Apertura").await;
    let home = common::seed_team(&conn, "Union Central").await;
    let visitors = common::seed_team(&conn, "Juventud Sur").await;
    let vocal_id = common::seed_user(&conn, "vocal1", db::users::Role::Vocal).await;

    let row = |tournament_id, vocal_id| scheduling::MatchInput {
        tournament_id,
        local_team_id: home,
        away_team_id: visitors,
        scheduled_time: common::now(),
        stage: "regular".to_owned(),
        category: String::new(),
        match_day: Some(1),
        field_id: None,
        video_url: None,
        vocal_id,
    };

    let err =
        scheduling::create_programming_sheet(&conn, vec![row(tournament_id, None), row(999999, None)])
            .await
            .expect_err("A bad row must sink the sheet");
    assert!(matches!(err, Error::NotFound(_)), "got {err}");
    let count = db::matches::Entity::find()
        .count(&conn)
        .await
        .expect("Failed to count matches");
    assert_eq!(count, 0);

    let ids = scheduling::create_programming_sheet(
        &conn,
        vec![row(tournament_id, Some(vocal_id)), row(tournament_id, None)],
    )
    .await
    .expect("A clean sheet must land");
    assert_eq!(ids.len(), 2);
    // The vocal named on the sheet got their officiating record.
    let vocalias = db::vocalias::Entity::find()
        .filter(db::vocalias::Column::MatchId.eq(ids[0]))
        .count(&conn)
        .await
        .expect("Failed to count vocalias");
    assert_eq!(vocalias, 1);
}

#[tokio::test]
async fn finished_matches_are_immutable() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    engine::finalize(&conn, f.match_id, score(2, 0), &cache())
        .await
        .expect("Finalize failed");

    // Re-opening the match would let a second finalize double-apply the
    // standings increments.
    let err = scheduling::update_match(
        &conn,
        f.match_id,
        scheduling::MatchUpdate {
            status: Some(db::matches::Status::Scheduled),
            ..Default::default()
        },
    )
    .await
    .expect_err("A finished match cannot be re-opened");
    assert!(matches!(err, Error::Validation(_)), "got {err}");

    // Even a plain score correction is rejected.
    let err = scheduling::update_match(
        &conn,
        f.match_id,
        scheduling::MatchUpdate {
            local_score: Some(3),
            ..Default::default()
        },
    )
    .await
    .expect_err("A finished match cannot be edited");
    assert!(matches!(err, Error::Validation(_)), "got {err}");

    let m = common::match_row(&conn, f.match_id).await;
    assert_eq!(m.status, db::matches::Status::Finished);
    assert_eq!((m.local_score, m.away_score), (2, 0));
    let local = common::standings_row(&conn, f.tournament_id, f.local_team_id).await;
    assert_eq!((local.played, local.points), (1, 3));
}

#[tokio::test]
async fn match_update_cannot_sneak_into_finished() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    let err = scheduling::update_match(
        &conn,
        f.match_id,
        scheduling::MatchUpdate {
            status: Some(db::matches::Status::Finished),
            ..Default::default()
        },
    )
    .await
    .expect_err("Only finalize may finish a match");
    assert!(matches!(err, Error::Validation(_)), "got {err}");

    // Suspending and rescheduling stays an ordinary correction.
    let updated = scheduling::update_match(
        &conn,
        f.match_id,
        scheduling::MatchUpdate {
            status: Some(db::matches::Status::Suspended),
            ..Default::default()
        },
    )
    .await
    .expect("Suspension failed");
    assert_eq!(updated.status, db::matches::Status::Suspended);
}
