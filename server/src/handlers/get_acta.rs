use crate::acta;
use crate::handlers::prelude::*;

#[get("/matches/{match_id}/acta")]
pub async fn get_acta(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Vocal)?;
    let report = acta::by_match(&state.db, *path, state.config.utc_offset_hours).await?;
    Ok(ok_json(report))
}
