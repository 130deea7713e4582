use crate::engine;
use crate::handlers::prelude::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateVocaliaRequest {
    match_id: i64,
    vocal_user_id: i64,
}

#[post("/vocalias")]
pub async fn post_vocalia(req: HttpRequest, body: web::Json<CreateVocaliaRequest>) -> HttpResult {
    let state = server_state(&req)?;
    require(authenticate(&req).await?, Role::Admin)?;
    let body = body.into_inner();
    let created = state
        .db
        .transaction(|txn| {
            Box::pin(async move { engine::create(txn, body.match_id, body.vocal_user_id).await })
        })
        .await
        .map_err(Error::from)?;
    Ok(created_json(engine::VocaliaRecord::from(created)))
}
