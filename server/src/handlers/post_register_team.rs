use crate::handlers::prelude::*;
use crate::standings;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterTeamRequest {
    team_id: i64,
}

#[post("/tournaments/{tournament_id}/teams")]
pub async fn post_register_team(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<RegisterTeamRequest>,
) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let row = standings::register_team(&state.db, *path, body.team_id).await?;
    Ok(created_json(row))
}
