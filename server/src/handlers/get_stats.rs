use crate::handlers::prelude::*;
use crate::stats;

#[get("/tournaments/{tournament_id}/stats")]
pub async fn get_stats(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    let tournament_id = *path;
    if db::tournaments::Entity::find_by_id(tournament_id)
        .one(&state.db)
        .await
        .map_err(log_internal("Failed to fetch tournament"))?
        .is_none()
    {
        return Err(AppHttpError::NotFound(StringError(format!(
            "no tournament with id {tournament_id}"
        ))));
    }
    let aggregates = stats::tournament_stats(&state.db, &state.stats, tournament_id).await?;
    Ok(ok_json(aggregates))
}
