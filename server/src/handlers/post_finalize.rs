use crate::engine;
use crate::handlers::prelude::*;

#[post("/vocalias/{match_id}/finalize")]
pub async fn post_finalize(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<engine::FinalizeRequest>,
) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Vocal)?;
    let outcome = engine::finalize(&state.db, *path, body.into_inner(), &state.stats).await?;
    Ok(ok_json(outcome))
}
