use sea_orm::prelude::{TimeDate, TimeDateTimeWithTimeZone};
use sea_orm::Set;

use crate::handlers::prelude::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TournamentInput {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category_id: Option<i64>,
    #[serde(default)]
    start_date: Option<TimeDate>,
    #[serde(default)]
    end_date: Option<TimeDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TournamentUpdate {
    name: Option<String>,
    description: Option<String>,
    category_id: Option<i64>,
    start_date: Option<TimeDate>,
    end_date: Option<TimeDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TournamentsQuery {
    search: Option<String>,
    category_id: Option<i64>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[get("/tournaments")]
pub async fn get_tournaments(req: HttpRequest, q: web::Query<TournamentsQuery>) -> HttpResult {
    let state = server_state(&req)?;
    let condition = crud::contains_filter(db::tournaments::Column::Name, q.search.as_deref()).add(
        crud::eq_filter(db::tournaments::Column::CategoryId, q.category_id),
    );
    let select = db::tournaments::Entity::find()
        .filter(condition)
        .order_by_asc(db::tournaments::Column::Name);
    let page = PageParams {
        page: q.page,
        limit: q.limit,
    };
    let (items, pagination) = crud::paginate(&state.db, select, page)
        .await
        .map_err(log_internal("Failed to list tournaments"))?;
    Ok(ok_json(Page { items, pagination }))
}

#[get("/tournaments/{tournament_id}")]
pub async fn get_tournament(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    let tournament = db::tournaments::Entity::find_by_id(*path)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch tournament"))?
        .ok_or_else(|| {
            AppHttpError::NotFound(StringError(format!("no tournament with id {}", *path)))
        })?;
    Ok(ok_json(tournament))
}

#[post("/tournaments")]
pub async fn post_tournament(req: HttpRequest, body: web::Json<TournamentInput>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let body = body.into_inner();
    crate::validation::validate_name(&body.name)
        .map_err(|e| AppHttpError::BadClientData(StringError(e)))?;
    let existing = db::tournaments::Entity::find()
        .filter(db::tournaments::Column::Name.eq(body.name.as_str()))
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to check for an existing tournament"))?;
    if existing.is_some() {
        return Err(AppHttpError::Conflict(StringError(format!(
            "tournament {} already exists",
            body.name
        ))));
    }
    let row = db::tournaments::ActiveModel {
        name: Set(body.name),
        description: Set(body.description),
        category_id: Set(body.category_id),
        start_date: Set(body.start_date),
        end_date: Set(body.end_date),
        creation_time: Set(TimeDateTimeWithTimeZone::now_utc()),
        ..Default::default()
    };
    let id = db::tournaments::Entity::insert(row)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to insert tournament"))?
        .last_insert_id;
    let tournament = db::tournaments::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch the created tournament"))?
        .ok_or(AppHttpError::Internal)?;
    Ok(created_json(tournament))
}

#[put("/tournaments/{tournament_id}")]
pub async fn put_tournament(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<TournamentUpdate>,
) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let tournament_id = *path;
    if db::tournaments::Entity::find_by_id(tournament_id)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch tournament"))?
        .is_none()
    {
        return Err(AppHttpError::NotFound(StringError(format!(
            "no tournament with id {tournament_id}"
        ))));
    }
    let body = body.into_inner();
    let mut writeback = db::tournaments::ActiveModel {
        id: Set(tournament_id),
        ..Default::default()
    };
    if let Some(name) = body.name {
        crate::validation::validate_name(&name)
            .map_err(|e| AppHttpError::BadClientData(StringError(e)))?;
        writeback.name = Set(name);
    }
    if let Some(description) = body.description {
        writeback.description = Set(description);
    }
    if let Some(category_id) = body.category_id {
        writeback.category_id = Set(Some(category_id));
    }
    if let Some(start_date) = body.start_date {
        writeback.start_date = Set(Some(start_date));
    }
    if let Some(end_date) = body.end_date {
        writeback.end_date = Set(Some(end_date));
    }
    let tournament = db::tournaments::Entity::update(writeback)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to update tournament"))?;
    Ok(ok_json(tournament))
}

#[delete("/tournaments/{tournament_id}")]
pub async fn delete_tournament(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let result = db::tournaments::Entity::delete_by_id(*path)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to delete tournament"))?;
    if result.rows_affected == 0 {
        return Err(AppHttpError::NotFound(StringError(format!(
            "no tournament with id {}",
            *path
        ))));
    }
    Ok(ok_json(serde_json::json!({ "deleted": *path })))
}
