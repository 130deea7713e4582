mod common;

use liga_db as db;
use liga_server::engine::{self, Requester, VocaliaUpdate};
use liga_server::error::Error;

#[tokio::test]
async fn one_vocal_per_match() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    let created = engine::create(&conn, f.match_id, f.vocal_id)
        .await
        .expect("First assignment failed");
    assert_eq!(created.match_id, f.match_id);
    assert_eq!(created.vocal_id, f.vocal_id);

    let other = common::seed_user(&conn, "vocal2", db::users::Role::Vocal).await;
    let err = engine::create(&conn, f.match_id, other)
        .await
        .expect_err("Second assignment must fail");
    assert!(matches!(err, Error::Conflict(_)), "got {err}");
}

#[tokio::test]
async fn assignment_requires_match_and_user() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    let err = engine::create(&conn, 999999, f.vocal_id)
        .await
        .expect_err("Missing match must fail");
    assert!(matches!(err, Error::NotFound(_)), "got {err}");
    let err = engine::create(&conn, f.match_id, 999999)
        .await
        .expect_err("Missing user must fail");
    assert!(matches!(err, Error::NotFound(_)), "got {err}");
}

#[tokio::test]
async fn update_is_scoped_to_the_assigned_vocal() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    engine::create(&conn, f.match_id, f.vocal_id)
        .await
        .expect("Assignment failed");
    let intruder = common::seed_user(&conn, "vocal2", db::users::Role::Vocal).await;

    let err = engine::update(
        &conn,
        f.match_id,
        Requester::Vocal(intruder),
        VocaliaUpdate {
            observations: Some("not my match".to_owned()),
            ..Default::default()
        },
    )
    .await
    .expect_err("A foreign vocal must be rejected");
    assert!(matches!(err, Error::Permission(_)), "got {err}");

    let updated = engine::update(
        &conn,
        f.match_id,
        Requester::Vocal(f.vocal_id),
        VocaliaUpdate {
            local_captain_id: Some(11),
            observations: Some("rained through the first half".to_owned()),
            ..Default::default()
        },
    )
    .await
    .expect("The assigned vocal must be able to update");
    assert_eq!(updated.local_captain_id, Some(11));

    // A later partial update leaves omitted fields alone.
    let updated = engine::update(
        &conn,
        f.match_id,
        Requester::Vocal(f.vocal_id),
        VocaliaUpdate {
            away_captain_id: Some(4),
            ..Default::default()
        },
    )
    .await
    .expect("Partial update failed");
    assert_eq!(updated.local_captain_id, Some(11));
    assert_eq!(updated.away_captain_id, Some(4));
    assert_eq!(
        updated.observations.as_deref(),
        Some("rained through the first half")
    );
}

#[tokio::test]
async fn admin_update_without_a_record_is_not_found() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;
    let err = engine::update(
        &conn,
        f.match_id,
        Requester::Admin,
        VocaliaUpdate::default(),
    )
    .await
    .expect_err("There is nothing to update yet");
    assert!(matches!(err, Error::NotFound(_)), "got {err}");
}

#[tokio::test]
async fn virtual_view_is_admin_only_and_never_persisted() {
    let (_dir, conn) = common::setup().await;
    let f = common::league_fixture(&conn).await;

    let err = engine::get_by_match(&conn, f.match_id, Requester::Vocal(f.vocal_id))
        .await
        .expect_err("A vocal gets no virtual view");
    assert!(matches!(err, Error::NotFound(_)), "got {err}");

    let view = engine::get_by_match(&conn, f.match_id, Requester::Admin)
        .await
        .expect("Admins get the synthesized view");
    assert!(view.is_virtual);
    assert_eq!(view.record.id, 0);
    assert_eq!(view.record.vocal_id, 0);
    assert_eq!(view.tournament_name, "Clausura");
    assert_eq!(view.local_team, "Atletico Norte");
    assert_eq!(view.away_team, "Deportivo Sur");

    // Requesting the view must not have created a row.
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
    let stored = db::vocalias::Entity::find()
        .filter(db::vocalias::Column::MatchId.eq(f.match_id))
        .one(&conn)
        .await
        .expect("Failed to query vocalias");
    assert!(stored.is_none());

    engine::create(&conn, f.match_id, f.vocal_id)
        .await
        .expect("Assignment failed");
    let view = engine::get_by_match(&conn, f.match_id, Requester::Vocal(f.vocal_id))
        .await
        .expect("The real record is visible to vocals");
    assert!(!view.is_virtual);
    assert_eq!(view.record.vocal_id, f.vocal_id);
}
