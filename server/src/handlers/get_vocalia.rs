use crate::engine;
use crate::handlers::prelude::*;

// Admins get a synthesized virtual view when no record exists yet, so the
// match context can be rendered before a vocal is assigned.
#[get("/vocalias/match/{match_id}")]
pub async fn get_vocalia(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    let auth = require(authenticate(&req).await?, Role::Vocal)?;
    let view = engine::get_by_match(&state.db, *path, requester_of(&auth)).await?;
    Ok(ok_json(view))
}
