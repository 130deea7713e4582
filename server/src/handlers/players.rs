use sea_orm::prelude::{TimeDate, TimeDateTimeWithTimeZone};
use sea_orm::Set;

use crate::handlers::prelude::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerInput {
    team_id: i64,
    first_name: String,
    last_name: String,
    identity_document: String,
    #[serde(default)]
    birth_date: Option<TimeDate>,
    #[serde(default)]
    jersey_number: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerUpdate {
    team_id: Option<i64>,
    first_name: Option<String>,
    last_name: Option<String>,
    birth_date: Option<TimeDate>,
    jersey_number: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayersQuery {
    search: Option<String>,
    team_id: Option<i64>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[get("/players")]
pub async fn get_players(req: HttpRequest, q: web::Query<PlayersQuery>) -> HttpResult {
    let state = server_state(&req)?;
    let condition = crud::contains_filter(db::players::Column::LastName, q.search.as_deref())
        .add(crud::eq_filter(db::players::Column::TeamId, q.team_id));
    let select = db::players::Entity::find()
        .filter(condition)
        .order_by_asc(db::players::Column::LastName)
        .order_by_asc(db::players::Column::FirstName);
    let page = PageParams {
        page: q.page,
        limit: q.limit,
    };
    let (items, pagination) = crud::paginate(&state.db, select, page)
        .await
        .map_err(log_internal("Failed to list players"))?;
    Ok(ok_json(Page { items, pagination }))
}

#[get("/players/{player_id}")]
pub async fn get_player(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    let player = db::players::Entity::find_by_id(*path)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch player"))?
        .ok_or_else(|| {
            AppHttpError::NotFound(StringError(format!("no player with id {}", *path)))
        })?;
    Ok(ok_json(player))
}

#[post("/players")]
pub async fn post_player(req: HttpRequest, body: web::Json<PlayerInput>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let body = body.into_inner();
    crate::validation::validate_name(&body.first_name)
        .map_err(|e| AppHttpError::BadClientData(StringError(e)))?;
    crate::validation::validate_name(&body.last_name)
        .map_err(|e| AppHttpError::BadClientData(StringError(e)))?;
    if db::teams::Entity::find_by_id(body.team_id)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch team of new player"))?
        .is_none()
    {
        return Err(AppHttpError::NotFound(StringError(format!(
            "no team with id {}",
            body.team_id
        ))));
    }
    let existing = db::players::Entity::find()
        .filter(db::players::Column::IdentityDocument.eq(body.identity_document.as_str()))
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to check for an existing player"))?;
    if existing.is_some() {
        return Err(AppHttpError::Conflict(StringError(format!(
            "a player with document {} is already registered",
            body.identity_document
        ))));
    }
    let row = db::players::ActiveModel {
        team_id: Set(body.team_id),
        first_name: Set(body.first_name),
        last_name: Set(body.last_name),
        identity_document: Set(body.identity_document),
        birth_date: Set(body.birth_date),
        jersey_number: Set(body.jersey_number),
        creation_time: Set(TimeDateTimeWithTimeZone::now_utc()),
        ..Default::default()
    };
    let id = db::players::Entity::insert(row)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to insert player"))?
        .last_insert_id;
    let player = db::players::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch the created player"))?
        .ok_or(AppHttpError::Internal)?;
    Ok(created_json(player))
}

#[put("/players/{player_id}")]
pub async fn put_player(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<PlayerUpdate>,
) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let player_id = *path;
    if db::players::Entity::find_by_id(player_id)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch player"))?
        .is_none()
    {
        return Err(AppHttpError::NotFound(StringError(format!(
            "no player with id {player_id}"
        ))));
    }
    let body = body.into_inner();
    let mut writeback = db::players::ActiveModel {
        id: Set(player_id),
        ..Default::default()
    };
    if let Some(team_id) = body.team_id {
        writeback.team_id = Set(team_id);
    }
    if let Some(first_name) = body.first_name {
        crate::validation::validate_name(&first_name)
            .map_err(|e| AppHttpError::BadClientData(StringError(e)))?;
        writeback.first_name = Set(first_name);
    }
    if let Some(last_name) = body.last_name {
        crate::validation::validate_name(&last_name)
            .map_err(|e| AppHttpError::BadClientData(StringError(e)))?;
        writeback.last_name = Set(last_name);
    }
    if let Some(birth_date) = body.birth_date {
        writeback.birth_date = Set(Some(birth_date));
    }
    if let Some(jersey_number) = body.jersey_number {
        writeback.jersey_number = Set(Some(jersey_number));
    }
    let player = db::players::Entity::update(writeback)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to update player"))?;
    Ok(ok_json(player))
}

#[delete("/players/{player_id}")]
pub async fn delete_player(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let result = db::players::Entity::delete_by_id(*path)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to delete player"))?;
    if result.rows_affected == 0 {
        return Err(AppHttpError::NotFound(StringError(format!(
            "no player with id {}",
            *path
        ))));
    }
    Ok(ok_json(serde_json::json!({ "deleted": *path })))
}
