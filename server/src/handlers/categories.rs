use sea_orm::Set;

use crate::handlers::prelude::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryInput {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoriesQuery {
    search: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[get("/categories")]
pub async fn get_categories(req: HttpRequest, q: web::Query<CategoriesQuery>) -> HttpResult {
    let state = server_state(&req)?;
    let select = db::categories::Entity::find()
        .filter(crud::contains_filter(
            db::categories::Column::Name,
            q.search.as_deref(),
        ))
        .order_by_asc(db::categories::Column::Name);
    let page = PageParams {
        page: q.page,
        limit: q.limit,
    };
    let (items, pagination) = crud::paginate(&state.db, select, page)
        .await
        .map_err(log_internal("Failed to list categories"))?;
    Ok(ok_json(Page { items, pagination }))
}

#[post("/categories")]
pub async fn post_category(req: HttpRequest, body: web::Json<CategoryInput>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let body = body.into_inner();
    crate::validation::validate_name(&body.name)
        .map_err(|e| AppHttpError::BadClientData(StringError(e)))?;
    let existing = db::categories::Entity::find()
        .filter(db::categories::Column::Name.eq(body.name.as_str()))
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to check for an existing category"))?;
    if existing.is_some() {
        return Err(AppHttpError::Conflict(StringError(format!(
            "category {} already exists",
            body.name
        ))));
    }
    let row = db::categories::ActiveModel {
        name: Set(body.name),
        ..Default::default()
    };
    let id = db::categories::Entity::insert(row)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to insert category"))?
        .last_insert_id;
    let category = db::categories::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch the created category"))?
        .ok_or(AppHttpError::Internal)?;
    Ok(created_json(category))
}

#[put("/categories/{category_id}")]
pub async fn put_category(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<CategoryInput>,
) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let category_id = *path;
    if db::categories::Entity::find_by_id(category_id)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch category"))?
        .is_none()
    {
        return Err(AppHttpError::NotFound(StringError(format!(
            "no category with id {category_id}"
        ))));
    }
    let body = body.into_inner();
    crate::validation::validate_name(&body.name)
        .map_err(|e| AppHttpError::BadClientData(StringError(e)))?;
    let writeback = db::categories::ActiveModel {
        id: Set(category_id),
        name: Set(body.name),
    };
    let category = db::categories::Entity::update(writeback)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to update category"))?;
    Ok(ok_json(category))
}

#[delete("/categories/{category_id}")]
pub async fn delete_category(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let result = db::categories::Entity::delete_by_id(*path)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to delete category"))?;
    if result.rows_affected == 0 {
        return Err(AppHttpError::NotFound(StringError(format!(
            "no category with id {}",
            *path
        ))));
    }
    Ok(ok_json(serde_json::json!({ "deleted": *path })))
}
