use sea_orm::Set;

use crate::handlers::prelude::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldInput {
    name: String,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldsQuery {
    search: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[get("/fields")]
pub async fn get_fields(req: HttpRequest, q: web::Query<FieldsQuery>) -> HttpResult {
    let state = server_state(&req)?;
    let select = db::fields::Entity::find()
        .filter(crud::contains_filter(
            db::fields::Column::Name,
            q.search.as_deref(),
        ))
        .order_by_asc(db::fields::Column::Name);
    let page = PageParams {
        page: q.page,
        limit: q.limit,
    };
    let (items, pagination) = crud::paginate(&state.db, select, page)
        .await
        .map_err(log_internal("Failed to list fields"))?;
    Ok(ok_json(Page { items, pagination }))
}

#[post("/fields")]
pub async fn post_field(req: HttpRequest, body: web::Json<FieldInput>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let body = body.into_inner();
    crate::validation::validate_name(&body.name)
        .map_err(|e| AppHttpError::BadClientData(StringError(e)))?;
    let existing = db::fields::Entity::find()
        .filter(db::fields::Column::Name.eq(body.name.as_str()))
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to check for an existing field"))?;
    if existing.is_some() {
        return Err(AppHttpError::Conflict(StringError(format!(
            "field {} already exists",
            body.name
        ))));
    }
    let row = db::fields::ActiveModel {
        name: Set(body.name),
        address: Set(body.address),
        ..Default::default()
    };
    let id = db::fields::Entity::insert(row)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to insert field"))?
        .last_insert_id;
    let field = db::fields::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch the created field"))?
        .ok_or(AppHttpError::Internal)?;
    Ok(created_json(field))
}

#[put("/fields/{field_id}")]
pub async fn put_field(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<FieldInput>,
) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let field_id = *path;
    if db::fields::Entity::find_by_id(field_id)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch field"))?
        .is_none()
    {
        return Err(AppHttpError::NotFound(StringError(format!(
            "no field with id {field_id}"
        ))));
    }
    let body = body.into_inner();
    crate::validation::validate_name(&body.name)
        .map_err(|e| AppHttpError::BadClientData(StringError(e)))?;
    let writeback = db::fields::ActiveModel {
        id: Set(field_id),
        name: Set(body.name),
        address: Set(body.address),
    };
    let field = db::fields::Entity::update(writeback)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to update field"))?;
    Ok(ok_json(field))
}

#[delete("/fields/{field_id}")]
pub async fn delete_field(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let result = db::fields::Entity::delete_by_id(*path)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to delete field"))?;
    if result.rows_affected == 0 {
        return Err(AppHttpError::NotFound(StringError(format!(
            "no field with id {}",
            *path
        ))));
    }
    Ok(ok_json(serde_json::json!({ "deleted": *path })))
}
