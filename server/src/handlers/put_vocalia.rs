use crate::engine;
use crate::handlers::prelude::*;

#[put("/vocalias/{match_id}")]
pub async fn put_vocalia(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<engine::VocaliaUpdate>,
) -> HttpResult {
    let state = server_state(&req)?;
    let auth = require(authenticate(&req).await?, Role::Vocal)?;
    let requester = requester_of(&auth);
    let match_id = *path;
    let body = body.into_inner();
    let updated = state
        .db
        .transaction(|txn| {
            Box::pin(async move { engine::update(txn, match_id, requester, body).await })
        })
        .await
        .map_err(Error::from)?;
    Ok(ok_json(engine::VocaliaRecord::from(updated)))
}
