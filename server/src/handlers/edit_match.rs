use crate::handlers::prelude::*;
use crate::scheduling;

#[put("/matches/{match_id}")]
pub async fn put_match(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<scheduling::MatchUpdate>,
) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let updated = scheduling::update_match(&state.db, *path, body.into_inner()).await?;
    Ok(ok_json(updated))
}

#[delete("/matches/{match_id}")]
pub async fn delete_match(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    scheduling::delete_match(&state.db, *path).await?;
    Ok(ok_json(serde_json::json!({ "deleted": *path })))
}
