use actix_web::{App, HttpServer};
use anyhow::Context;
use sea_orm::Database;

use crate::config::Config;
use crate::handlers::*;
use crate::server_state::ServerState;
use crate::stats;

pub struct Handle {
    pub server: actix_web::dev::Server,
    pub addrs: Vec<std::net::SocketAddr>,
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let handle = create(config).await?;
    handle.server.await?;
    Ok(())
}

pub async fn create(config: Config) -> anyhow::Result<Handle> {
    let mut db_options = sea_orm::ConnectOptions::new(&config.db_path);
    db_options.max_connections(32);
    let db = Database::connect(db_options)
        .await
        .context("Failed to connect to the database")?;
    let app_state = ServerState {
        stats: stats::Cache::new(&config.stats_config),
        db,
        config: config.server_config,
    };
    let port = app_state.config.port;
    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .service(post_vocalia::post_vocalia)
            .service(put_vocalia::put_vocalia)
            .service(post_finalize::post_finalize)
            .service(get_vocalia::get_vocalia)
            .service(get_acta::get_acta)
            .service(post_match::post_programming_sheet)
            .service(post_match::post_match)
            .service(rosters::put_roster)
            .service(rosters::get_roster)
            .service(get_matches::get_matches)
            .service(get_matches::get_match)
            .service(edit_match::put_match)
            .service(edit_match::delete_match)
            .service(events::post_goals_bulk)
            .service(events::post_goal)
            .service(events::delete_goal)
            .service(events::post_sanctions_bulk)
            .service(events::post_sanction)
            .service(events::delete_sanction)
            .service(events::post_substitutions_bulk)
            .service(events::post_substitution)
            .service(events::delete_substitution)
            .service(post_register_team::post_register_team)
            .service(get_standings::get_standings)
            .service(get_stats::get_stats)
            .service(tournaments::get_tournaments)
            .service(tournaments::get_tournament)
            .service(tournaments::post_tournament)
            .service(tournaments::put_tournament)
            .service(tournaments::delete_tournament)
            .service(teams::get_teams)
            .service(teams::get_team)
            .service(teams::post_team)
            .service(teams::put_team)
            .service(teams::delete_team)
            .service(players::get_players)
            .service(players::get_player)
            .service(players::post_player)
            .service(players::put_player)
            .service(players::delete_player)
            .service(categories::get_categories)
            .service(categories::post_category)
            .service(categories::put_category)
            .service(categories::delete_category)
            .service(fields::get_fields)
            .service(fields::post_field)
            .service(fields::put_field)
            .service(fields::delete_field)
            .service(users::get_users)
            .service(users::get_user)
            .service(users::post_user)
            .service(users::put_user)
            .service(users::delete_user)
            .service(regulations::get_regulations)
            .service(regulations::post_regulation)
            .service(regulations::delete_regulation)
    })
    .workers(8)
    .bind(("::", port))?;
    let addrs = server.addrs();
    let server = server.run(); // Does not actually run the server but creates a future.
    Ok(Handle { server, addrs })
}
