use crate::handlers::prelude::*;
use crate::scheduling;

#[post("/matches")]
pub async fn post_match(req: HttpRequest, body: web::Json<scheduling::MatchInput>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let body = body.into_inner();
    let created = state
        .db
        .transaction(|txn| Box::pin(async move { scheduling::create_match(txn, body).await }))
        .await
        .map_err(Error::from)?;
    Ok(created_json(created))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetRequest {
    matches: Vec<scheduling::MatchInput>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SheetResponse {
    match_ids: Vec<i64>,
}

// Bulk import of a match-day programming sheet; all rows land or none do.
#[post("/matches/sheet")]
pub async fn post_programming_sheet(
    req: HttpRequest,
    body: web::Json<SheetRequest>,
) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let match_ids =
        scheduling::create_programming_sheet(&state.db, body.into_inner().matches).await?;
    Ok(created_json(SheetResponse { match_ids }))
}
