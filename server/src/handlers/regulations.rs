use sea_orm::prelude::TimeDateTimeWithTimeZone;
use sea_orm::Set;

use crate::handlers::prelude::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegulationInput {
    tournament_id: i64,
    name: String,
    file_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegulationsQuery {
    tournament_id: Option<i64>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[get("/regulations")]
pub async fn get_regulations(req: HttpRequest, q: web::Query<RegulationsQuery>) -> HttpResult {
    let state = server_state(&req)?;
    let select = db::regulations::Entity::find()
        .filter(crud::eq_filter(
            db::regulations::Column::TournamentId,
            q.tournament_id,
        ))
        .order_by_asc(db::regulations::Column::Name);
    let page = PageParams {
        page: q.page,
        limit: q.limit,
    };
    let (items, pagination) = crud::paginate(&state.db, select, page)
        .await
        .map_err(log_internal("Failed to list regulations"))?;
    Ok(ok_json(Page { items, pagination }))
}

#[post("/regulations")]
pub async fn post_regulation(req: HttpRequest, body: web::Json<RegulationInput>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let body = body.into_inner();
    crate::validation::validate_name(&body.name)
        .map_err(|e| AppHttpError::BadClientData(StringError(e)))?;
    if db::tournaments::Entity::find_by_id(body.tournament_id)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch tournament of new regulation"))?
        .is_none()
    {
        return Err(AppHttpError::NotFound(StringError(format!(
            "no tournament with id {}",
            body.tournament_id
        ))));
    }
    let row = db::regulations::ActiveModel {
        tournament_id: Set(body.tournament_id),
        name: Set(body.name),
        file_url: Set(body.file_url),
        creation_time: Set(TimeDateTimeWithTimeZone::now_utc()),
        ..Default::default()
    };
    let id = db::regulations::Entity::insert(row)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to insert regulation"))?
        .last_insert_id;
    let regulation = db::regulations::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch the created regulation"))?
        .ok_or(AppHttpError::Internal)?;
    Ok(created_json(regulation))
}

#[delete("/regulations/{regulation_id}")]
pub async fn delete_regulation(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let result = db::regulations::Entity::delete_by_id(*path)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to delete regulation"))?;
    if result.rows_affected == 0 {
        return Err(AppHttpError::NotFound(StringError(format!(
            "no regulation with id {}",
            *path
        ))));
    }
    Ok(ok_json(serde_json::json!({ "deleted": *path })))
}
