use crate::handlers::prelude::*;
use crate::roster;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RosterRequest {
    team_id: i64,
    players: Vec<roster::RosterEntry>,
}

// Last write wins: the previous roster of the (match, team) pair is
// replaced wholesale.
#[put("/matches/{match_id}/roster")]
pub async fn put_roster(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<RosterRequest>,
) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Vocal)?;
    let body = body.into_inner();
    let rostered =
        roster::replace(&state.db, &state.stats, *path, body.team_id, body.players).await?;
    Ok(ok_json(serde_json::json!({ "rostered": rostered })))
}

#[get("/matches/{match_id}/roster")]
pub async fn get_roster(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    let entries = roster::of_match(&state.db, *path).await?;
    Ok(ok_json(entries))
}
