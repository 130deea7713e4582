use crate::events;
use crate::handlers::prelude::*;

#[post("/goals")]
pub async fn post_goal(req: HttpRequest, body: web::Json<events::GoalInput>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Vocal)?;
    let goal = events::record_goal(&state.db, &state.stats, body.into_inner()).await?;
    Ok(created_json(goal))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkGoalsRequest {
    goals: Vec<events::GoalInput>,
}

#[post("/goals/bulk")]
pub async fn post_goals_bulk(req: HttpRequest, body: web::Json<BulkGoalsRequest>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Vocal)?;
    let ids = events::record_goals(&state.db, &state.stats, body.into_inner().goals).await?;
    Ok(created_json(serde_json::json!({ "goalIds": ids })))
}

#[delete("/goals/{goal_id}")]
pub async fn delete_goal(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Vocal)?;
    events::delete_goal(&state.db, &state.stats, *path).await?;
    Ok(ok_json(serde_json::json!({ "deleted": *path })))
}

#[post("/sanctions")]
pub async fn post_sanction(req: HttpRequest, body: web::Json<events::SanctionInput>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Vocal)?;
    let sanction = events::record_sanction(&state.db, &state.stats, body.into_inner()).await?;
    Ok(created_json(sanction))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkSanctionsRequest {
    sanctions: Vec<events::SanctionInput>,
}

#[post("/sanctions/bulk")]
pub async fn post_sanctions_bulk(
    req: HttpRequest,
    body: web::Json<BulkSanctionsRequest>,
) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Vocal)?;
    let ids = events::record_sanctions(&state.db, &state.stats, body.into_inner().sanctions).await?;
    Ok(created_json(serde_json::json!({ "sanctionIds": ids })))
}

#[delete("/sanctions/{sanction_id}")]
pub async fn delete_sanction(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Vocal)?;
    events::delete_sanction(&state.db, &state.stats, *path).await?;
    Ok(ok_json(serde_json::json!({ "deleted": *path })))
}

#[post("/substitutions")]
pub async fn post_substitution(
    req: HttpRequest,
    body: web::Json<events::SubstitutionInput>,
) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Vocal)?;
    let substitution =
        events::record_substitution(&state.db, &state.stats, body.into_inner()).await?;
    Ok(created_json(substitution))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkSubstitutionsRequest {
    substitutions: Vec<events::SubstitutionInput>,
}

#[post("/substitutions/bulk")]
pub async fn post_substitutions_bulk(
    req: HttpRequest,
    body: web::Json<BulkSubstitutionsRequest>,
) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Vocal)?;
    let ids =
        events::record_substitutions(&state.db, &state.stats, body.into_inner().substitutions)
            .await?;
    Ok(created_json(serde_json::json!({ "substitutionIds": ids })))
}

#[delete("/substitutions/{substitution_id}")]
pub async fn delete_substitution(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Vocal)?;
    events::delete_substitution(&state.db, &state.stats, *path).await?;
    Ok(ok_json(serde_json::json!({ "deleted": *path })))
}
