use crate::handlers::prelude::*;
use crate::standings;

#[get("/tournaments/{tournament_id}/standings")]
pub async fn get_standings(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    let table = standings::standings(&state.db, *path).await?;
    Ok(ok_json(table))
}
