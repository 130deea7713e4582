use sea_orm::prelude::TimeDateTimeWithTimeZone;
use sea_orm::Set;

use crate::handlers::prelude::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamInput {
    name: String,
    #[serde(default)]
    category_id: Option<i64>,
    #[serde(default)]
    logo_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamUpdate {
    name: Option<String>,
    category_id: Option<i64>,
    logo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamsQuery {
    search: Option<String>,
    category_id: Option<i64>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[get("/teams")]
pub async fn get_teams(req: HttpRequest, q: web::Query<TeamsQuery>) -> HttpResult {
    let state = server_state(&req)?;
    let condition = crud::contains_filter(db::teams::Column::Name, q.search.as_deref())
        .add(crud::eq_filter(db::teams::Column::CategoryId, q.category_id));
    let select = db::teams::Entity::find()
        .filter(condition)
        .order_by_asc(db::teams::Column::Name);
    let page = PageParams {
        page: q.page,
        limit: q.limit,
    };
    let (items, pagination) = crud::paginate(&state.db, select, page)
        .await
        .map_err(log_internal("Failed to list teams"))?;
    Ok(ok_json(Page { items, pagination }))
}

#[get("/teams/{team_id}")]
pub async fn get_team(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    let team = db::teams::Entity::find_by_id(*path)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch team"))?
        .ok_or_else(|| AppHttpError::NotFound(StringError(format!("no team with id {}", *path))))?;
    Ok(ok_json(team))
}

#[post("/teams")]
pub async fn post_team(req: HttpRequest, body: web::Json<TeamInput>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let body = body.into_inner();
    crate::validation::validate_name(&body.name)
        .map_err(|e| AppHttpError::BadClientData(StringError(e)))?;
    let existing = db::teams::Entity::find()
        .filter(db::teams::Column::Name.eq(body.name.as_str()))
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to check for an existing team"))?;
    if existing.is_some() {
        return Err(AppHttpError::Conflict(StringError(format!(
            "team {} already exists",
            body.name
        ))));
    }
    let row = db::teams::ActiveModel {
        name: Set(body.name),
        category_id: Set(body.category_id),
        logo_url: Set(body.logo_url),
        creation_time: Set(TimeDateTimeWithTimeZone::now_utc()),
        ..Default::default()
    };
    let id = db::teams::Entity::insert(row)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to insert team"))?
        .last_insert_id;
    let team = db::teams::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch the created team"))?
        .ok_or(AppHttpError::Internal)?;
    Ok(created_json(team))
}

#[put("/teams/{team_id}")]
pub async fn put_team(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<TeamUpdate>,
) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let team_id = *path;
    if db::teams::Entity::find_by_id(team_id)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch team"))?
        .is_none()
    {
        return Err(AppHttpError::NotFound(StringError(format!(
            "no team with id {team_id}"
        ))));
    }
    let body = body.into_inner();
    let mut writeback = db::teams::ActiveModel {
        id: Set(team_id),
        ..Default::default()
    };
    if let Some(name) = body.name {
        crate::validation::validate_name(&name)
            .map_err(|e| AppHttpError::BadClientData(StringError(e)))?;
        writeback.name = Set(name);
    }
    if let Some(category_id) = body.category_id {
        writeback.category_id = Set(Some(category_id));
    }
    if let Some(logo_url) = body.logo_url {
        writeback.logo_url = Set(Some(logo_url));
    }
    let team = db::teams::Entity::update(writeback)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to update team"))?;
    Ok(ok_json(team))
}

#[delete("/teams/{team_id}")]
pub async fn delete_team(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let result = db::teams::Entity::delete_by_id(*path)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to delete team"))?;
    if result.rows_affected == 0 {
        return Err(AppHttpError::NotFound(StringError(format!(
            "no team with id {}",
            *path
        ))));
    }
    Ok(ok_json(serde_json::json!({ "deleted": *path })))
}
