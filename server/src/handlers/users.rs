use sea_orm::Set;

use crate::handlers::prelude::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserInput {
    name: String,
    email: String,
    role: Role,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserUpdate {
    name: Option<String>,
    role: Option<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsersQuery {
    search: Option<String>,
    role: Option<Role>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[get("/users")]
pub async fn get_users(req: HttpRequest, q: web::Query<UsersQuery>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let condition = crud::contains_filter(db::users::Column::Name, q.search.as_deref())
        .add(crud::eq_filter(db::users::Column::Role, q.role));
    let select = db::users::Entity::find()
        .filter(condition)
        .order_by_asc(db::users::Column::Name);
    let page = PageParams {
        page: q.page,
        limit: q.limit,
    };
    let (items, pagination) = crud::paginate(&state.db, select, page)
        .await
        .map_err(log_internal("Failed to list users"))?;
    Ok(ok_json(Page { items, pagination }))
}

#[get("/users/{user_id}")]
pub async fn get_user(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let user = db::users::Entity::find_by_id(*path)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch user"))?
        .ok_or_else(|| AppHttpError::NotFound(StringError(format!("no user with id {}", *path))))?;
    Ok(ok_json(user))
}

#[post("/users")]
pub async fn post_user(req: HttpRequest, body: web::Json<UserInput>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let body = body.into_inner();
    crate::validation::validate_name(&body.name)
        .map_err(|e| AppHttpError::BadClientData(StringError(e)))?;
    let email = body.email.to_lowercase();
    let existing = db::users::Entity::find()
        .filter(db::users::Column::Email.eq(email.as_str()))
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to check for an existing user"))?;
    if existing.is_some() {
        return Err(AppHttpError::Conflict(StringError(format!(
            "a user with email {email} already exists"
        ))));
    }
    let row = db::users::ActiveModel {
        name: Set(body.name),
        email: Set(email),
        role: Set(body.role),
        ..Default::default()
    };
    let id = db::users::Entity::insert(row)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to insert user"))?
        .last_insert_id;
    let user = db::users::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch the created user"))?
        .ok_or(AppHttpError::Internal)?;
    Ok(created_json(user))
}

#[put("/users/{user_id}")]
pub async fn put_user(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UserUpdate>,
) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let user_id = *path;
    if db::users::Entity::find_by_id(user_id)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch user"))?
        .is_none()
    {
        return Err(AppHttpError::NotFound(StringError(format!(
            "no user with id {user_id}"
        ))));
    }
    let body = body.into_inner();
    let mut writeback = db::users::ActiveModel {
        id: Set(user_id),
        ..Default::default()
    };
    if let Some(name) = body.name {
        crate::validation::validate_name(&name)
            .map_err(|e| AppHttpError::BadClientData(StringError(e)))?;
        writeback.name = Set(name);
    }
    if let Some(role) = body.role {
        writeback.role = Set(role);
    }
    let user = db::users::Entity::update(writeback)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to update user"))?;
    Ok(ok_json(user))
}

#[delete("/users/{user_id}")]
pub async fn delete_user(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let result = db::users::Entity::delete_by_id(*path)
        .exec(&state.db)
        .await
        .map_err(log_internal("Failed to delete user"))?;
    if result.rows_affected == 0 {
        return Err(AppHttpError::NotFound(StringError(format!(
            "no user with id {}",
            *path
        ))));
    }
    Ok(ok_json(serde_json::json!({ "deleted": *path })))
}
